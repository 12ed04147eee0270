//! Go-to-market agent.
//!
//! Runs alongside the market and financial agents, so it only sees what the
//! planner produced.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{Result, truncate};
use ideaforge_llm::LlmClient;
use tracing::info;

use crate::context::AnalysisContext;
use crate::traits::Agent;

fn prompt(idea: &str, industry: &str, location: &str, plan: &str, market_trends: &str) -> String {
    format!(
        r#"You are a startup GTM expert.

Idea: {idea}
Industry: {industry}
Target location: {location}
Analysis plan: {plan}
Market trends: {trends}

Provide concise GTM plan:
1) Launch sequence (0-3, 3-12, 12-24 months)
2) Acquisition channels + core messaging
3) Sales/partnership motion
4) Key metrics and milestones
5) Biggest GTM risks + mitigations

Keep it actionable and short."#,
        plan = truncate(plan, 900),
        trends = truncate(market_trends, 900),
    )
}

pub struct GtmAgent {
    llm: Arc<dyn LlmClient>,
}

impl GtmAgent {
    pub const ID: &'static str = "gtm_strategy";
    pub const NAME: &'static str = "GTM Strategist";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Agent for GtmAgent {
    type Output = String;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<String> {
        let planner = context.planner()?;
        let reply = self
            .llm
            .ask(prompt(
                context.idea(),
                &planner.industry,
                &planner.location,
                &planner.plan,
                &planner.market_trends,
            ))
            .await?;

        info!(agent = Self::ID, chars = reply.len(), "GTM strategy complete");
        Ok(reply)
    }
}
