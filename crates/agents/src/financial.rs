//! Financial strategy agent: revenue model and cost structure.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{Result, truncate};
use ideaforge_llm::LlmClient;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::AnalysisContext;
use crate::market::section;
use crate::traits::Agent;

const SECTIONS: &[&str] = &["REVENUE_MODEL", "COST_STRUCTURE", "SUMMARY"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStrategy {
    pub revenue_model: String,
    pub cost_structure: String,
    pub summary: String,
    pub full_output: String,
}

fn prompt(
    idea: &str,
    industry: &str,
    target_market: &str,
    plan: &str,
    market_trends: &str,
    similar_context: &str,
) -> String {
    format!(
        r#"You design startup financial strategy.

Idea: {idea}
Industry: {industry}
Target market: {target_market}
Plan: {plan}
Trends: {trends}
Related context: {similar}

Return concise sections:
1) REVENUE_MODEL: core streams, pricing logic, simple 12-36 month trajectory.
2) COST_STRUCTURE: fixed + variable costs, burn-rate drivers, break-even path.
3) SUMMARY: 3-5 bullets with major financial risks and mitigation.

Keep numbers realistic and concise."#,
        plan = truncate(plan, 700),
        trends = truncate(market_trends, 700),
        similar = truncate(similar_context, 600),
    )
}

pub struct FinancialStrategyAgent {
    llm: Arc<dyn LlmClient>,
}

impl FinancialStrategyAgent {
    pub const ID: &'static str = "financial_strategy";
    pub const NAME: &'static str = "Financial Strategist";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn parse(reply: String) -> FinancialStrategy {
        FinancialStrategy {
            revenue_model: section(Self::ID, &reply, "REVENUE_MODEL", SECTIONS),
            cost_structure: section(Self::ID, &reply, "COST_STRUCTURE", SECTIONS),
            summary: section(Self::ID, &reply, "SUMMARY", SECTIONS),
            full_output: reply,
        }
    }
}

#[async_trait]
impl Agent for FinancialStrategyAgent {
    type Output = FinancialStrategy;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<FinancialStrategy> {
        let planner = context.planner()?;
        let reply = self
            .llm
            .ask(prompt(
                context.idea(),
                &planner.industry,
                &planner.location,
                &planner.plan,
                &planner.market_trends,
                context.similar_ideas_context(),
            ))
            .await?;

        info!(agent = Self::ID, chars = reply.len(), "Financial strategy complete");
        Ok(Self::parse(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_in_any_order() {
        let reply = "COST_STRUCTURE: Walker payouts 70%.\n\
                     REVENUE_MODEL: 20% commission per walk.\n\
                     SUMMARY: Thin margins."
            .to_string();

        let parsed = FinancialStrategyAgent::parse(reply);
        assert_eq!(parsed.revenue_model, "20% commission per walk.");
        assert_eq!(parsed.cost_structure, "Walker payouts 70%.");
        assert_eq!(parsed.summary, "Thin margins.");
    }

    #[test]
    fn missing_revenue_model_is_empty() {
        let parsed = FinancialStrategyAgent::parse("SUMMARY: unclear".to_string());
        assert_eq!(parsed.revenue_model, "");
        assert_eq!(parsed.summary, "unclear");
    }
}
