//! Market intelligence agent: demand, audience and competition in one call.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{Result, truncate};
use ideaforge_llm::LlmClient;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::AnalysisContext;
use crate::labels;
use crate::traits::Agent;

const SECTIONS: &[&str] = &[
    "MARKET_DEMAND",
    "AUDIENCE_PROFILE",
    "COMPETITION_LANDSCAPE",
    "SUMMARY",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketIntelligence {
    pub market_demand: String,
    pub audience_profile: String,
    pub competition_landscape: String,
    pub summary: String,
    pub full_output: String,
}

/// Section body, or `""` with a warning when the model left it out.
pub(crate) fn section(agent: &str, reply: &str, header: &str, headers: &[&str]) -> String {
    labels::extract_section(reply, header, headers).unwrap_or_else(|| {
        warn!(agent = %agent, section = %header, "Section missing from reply");
        String::new()
    })
}

fn prompt(idea: &str, plan: &str, market_trends: &str, similar_context: &str) -> String {
    format!(
        r#"You analyze startup markets.

Idea: {idea}
Plan: {plan}
Trends: {trends}
{similar}

Return concise sections:
1) MARKET_DEMAND: size, growth, urgent pain points.
2) AUDIENCE_PROFILE: top segments, behavior, buying triggers.
3) COMPETITION_LANDSCAPE: direct/indirect competitors, differentiation gaps.
4) SUMMARY: 4-6 bullets with key opportunities and risks.

Use practical assumptions and avoid filler."#,
        plan = truncate(plan, 1000),
        trends = truncate(market_trends, 1000),
        similar = truncate(similar_context, 1200),
    )
}

pub struct MarketIntelligenceAgent {
    llm: Arc<dyn LlmClient>,
}

impl MarketIntelligenceAgent {
    pub const ID: &'static str = "market_intelligence";
    pub const NAME: &'static str = "Market Intelligence Analyst";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn parse(reply: String) -> MarketIntelligence {
        MarketIntelligence {
            market_demand: section(Self::ID, &reply, "MARKET_DEMAND", SECTIONS),
            audience_profile: section(Self::ID, &reply, "AUDIENCE_PROFILE", SECTIONS),
            competition_landscape: section(Self::ID, &reply, "COMPETITION_LANDSCAPE", SECTIONS),
            summary: section(Self::ID, &reply, "SUMMARY", SECTIONS),
            full_output: reply,
        }
    }
}

#[async_trait]
impl Agent for MarketIntelligenceAgent {
    type Output = MarketIntelligence;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<MarketIntelligence> {
        let planner = context.planner()?;
        let reply = self
            .llm
            .ask(prompt(
                context.idea(),
                &planner.plan,
                &planner.market_trends,
                context.similar_ideas_context(),
            ))
            .await?;

        info!(agent = Self::ID, chars = reply.len(), "Market analysis complete");
        Ok(Self::parse(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let reply = "MARKET_DEMAND: $1B pet care spend in cities.\n\
                     AUDIENCE_PROFILE: Busy professionals with dogs.\n\
                     COMPETITION_LANDSCAPE: Rover and Wag dominate.\n\
                     SUMMARY: - Strong demand\n- Crowded field"
            .to_string();

        let parsed = MarketIntelligenceAgent::parse(reply.clone());
        assert_eq!(parsed.market_demand, "$1B pet care spend in cities.");
        assert_eq!(parsed.audience_profile, "Busy professionals with dogs.");
        assert_eq!(parsed.competition_landscape, "Rover and Wag dominate.");
        assert_eq!(parsed.summary, "- Strong demand\n- Crowded field");
        assert_eq!(parsed.full_output, reply);
    }

    #[test]
    fn missing_sections_are_empty() {
        let parsed = MarketIntelligenceAgent::parse("Just prose, no headers.".to_string());
        assert_eq!(parsed.market_demand, "");
        assert_eq!(parsed.competition_landscape, "");
        assert_eq!(parsed.full_output, "Just prose, no headers.");
    }

    #[test]
    fn prompt_truncates_inputs() {
        let text = prompt("idea", &"p".repeat(2000), "", "");
        assert!(text.contains(&"p".repeat(1000)));
        assert!(!text.contains(&"p".repeat(1001)));
    }
}
