//! Success probability and launch location.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{Result, clamp_probability, truncate};
use ideaforge_llm::LlmClient;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::AnalysisContext;
use crate::labels;
use crate::traits::Agent;

pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 50.0;
pub const DEFAULT_BEST_LOCATION: &str = "San Francisco, CA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessAssessment {
    /// Always within `[0, 100]`.
    pub success_probability: f64,
    pub best_location: String,
    pub reasoning: String,
    pub full_output: String,
}

fn prompt(
    idea: &str,
    market_analysis: &str,
    competition: &str,
    revenue_model: &str,
    cost_structure: &str,
    gtm_strategy: &str,
) -> String {
    format!(
        r#"You are a startup success probability expert and location strategist.

Startup Idea: {idea}

Market Analysis:
{market}

Competition:
{competition}

Revenue Model:
{revenue}

Cost Structure:
{cost}

GTM Strategy:
{gtm}

Based on all the analysis, provide:

1. SUCCESS PROBABILITY SCORE (0-100):
Evaluate based on:
- Market opportunity and timing
- Competitive advantage
- Revenue model viability
- Cost efficiency
- GTM strategy strength
- Team requirements and execution complexity

Provide a single numerical score between 0 and 100.

2. BEST LOCATION:
Recommend the best city/region to launch this startup based on:
- Access to target customers
- Talent availability
- Ecosystem and funding
- Cost of operations
- Regulatory environment
- Market maturity

Format your response EXACTLY as:
SUCCESS_PROBABILITY: [number between 0-100]
BEST_LOCATION: [city/region name]
REASONING: [2-3 sentences explaining the score and location choice]"#,
        market = truncate(market_analysis, 1000),
        competition = truncate(competition, 800),
        revenue = truncate(revenue_model, 800),
        cost = truncate(cost_structure, 800),
        gtm = truncate(gtm_strategy, 800),
    )
}

pub struct SuccessProbabilityAgent {
    llm: Arc<dyn LlmClient>,
}

impl SuccessProbabilityAgent {
    pub const ID: &'static str = "success_probability";
    pub const NAME: &'static str = "Success Probability Analyst";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn parse(reply: String) -> SuccessAssessment {
        let probability =
            labels::number(&reply, "SUCCESS_PROBABILITY", DEFAULT_SUCCESS_PROBABILITY)
                .or_warn(Self::ID, "SUCCESS_PROBABILITY");

        SuccessAssessment {
            success_probability: clamp_probability(probability),
            best_location: labels::text(&reply, "BEST_LOCATION", DEFAULT_BEST_LOCATION)
                .or_warn(Self::ID, "BEST_LOCATION"),
            reasoning: labels::text(&reply, "REASONING", "").or_warn(Self::ID, "REASONING"),
            full_output: reply,
        }
    }
}

#[async_trait]
impl Agent for SuccessProbabilityAgent {
    type Output = SuccessAssessment;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<SuccessAssessment> {
        let market = context.market()?;
        let financial = context.financial()?;
        let gtm = context.gtm()?;

        let reply = self
            .llm
            .ask(prompt(
                context.idea(),
                &market.market_demand,
                &market.competition_landscape,
                &financial.revenue_model,
                &financial.cost_structure,
                gtm,
            ))
            .await?;

        let assessment = Self::parse(reply);
        info!(
            agent = Self::ID,
            probability = assessment.success_probability,
            location = %assessment.best_location,
            "Success probability assessed"
        );
        Ok(assessment)
    }
}
