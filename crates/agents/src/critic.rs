//! Critic agent.
//!
//! Two independent reviews (revenue assumptions and competition intensity)
//! each suggest a deduction in percentage points. The deductions are summed,
//! subtracted from the success probability and clamped to `[0, 100]`. A final
//! call writes the narrative critique.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{Result, clamp_probability, truncate};
use ideaforge_llm::LlmClient;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::AnalysisContext;
use crate::labels;
use crate::traits::Agent;

pub const MAX_REVENUE_ADJUSTMENT: u32 = 30;
pub const MAX_COMPETITION_ADJUSTMENT: u32 = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReview {
    pub unrealistic_assumptions: bool,
    pub severity: String,
    pub issues: Vec<String>,
    pub adjustment: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionReview {
    pub competition_level: String,
    pub market_saturation: String,
    pub differentiation_strength: String,
    pub red_flags: Vec<String>,
    pub adjustment: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticOutput {
    pub critique: String,
    pub original_probability: f64,
    /// Always within `[0, 100]`.
    pub adjusted_probability: f64,
    pub total_adjustment: u32,
    pub revenue: RevenueReview,
    pub competition: CompetitionReview,
}

impl CriticOutput {
    pub fn issues_found(&self) -> bool {
        self.revenue.unrealistic_assumptions
            || !self.revenue.issues.is_empty()
            || !self.competition.red_flags.is_empty()
    }

    pub fn adjustment_made(&self) -> bool {
        self.total_adjustment > 0
    }
}

/// Deduction label clamped to `0..=max`. Fractions round to the nearest point.
fn adjustment(reply: &str, agent: &str, max: u32) -> u32 {
    let value = labels::number(reply, "ADJUSTMENT_NEEDED", 0.0).or_warn(agent, "ADJUSTMENT_NEEDED");
    value.clamp(0.0, f64::from(max)).round() as u32
}

/// Apply the summed deductions to a probability.
pub fn adjust_probability(original: f64, total_adjustment: u32) -> f64 {
    clamp_probability(original - f64::from(total_adjustment))
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn revenue_prompt(revenue_model: &str, market_analysis: &str) -> String {
    format!(
        r#"You are a revenue model expert. Analyze this revenue model for unrealistic assumptions.

Revenue Model:
{revenue}

Market Context:
{market}

Identify UNREALISTIC ASSUMPTIONS in these categories:

1. PRICING ASSUMPTIONS: is pricing too optimistic, are conversion rates realistic, is willingness to pay validated?
2. GROWTH ASSUMPTIONS: are growth rates and the customer acquisition timeline achievable?
3. MARKET SIZE ASSUMPTIONS: is TAM/SAM/SOM realistic, are penetration rates achievable?

Respond in this EXACT format:
UNREALISTIC_ASSUMPTIONS: [YES/NO]
SEVERITY: [LOW/MEDIUM/HIGH/CRITICAL]
ISSUES: [comma-separated list of specific issues, or "NONE"]
ADJUSTMENT_NEEDED: [percentage points to reduce success probability, 0-30]
REASONING: [2-3 sentences explaining the issues]"#,
        revenue = truncate(revenue_model, 1500),
        market = truncate(market_analysis, 1000),
    )
}

fn competition_prompt(competition_analysis: &str, market_analysis: &str) -> String {
    format!(
        r#"You are a competitive intelligence expert. Assess the competition intensity.

Competition Analysis:
{competition}

Market Analysis:
{market}

Assess competition intensity based on:

1. NUMBER OF COMPETITORS: how many direct competitors exist, are there dominant players?
2. MARKET SATURATION: is the market crowded, are there clear leaders?
3. BARRIERS TO ENTRY: how easy is it for new entrants?
4. DIFFERENTIATION: is the value proposition unique, can competitors replicate it?

Respond in this EXACT format:
COMPETITION_LEVEL: [LOW/MEDIUM/HIGH/EXTREME]
MARKET_SATURATION: [LOW/MEDIUM/HIGH]
DIFFERENTIATION_STRENGTH: [WEAK/MODERATE/STRONG]
RED_FLAGS: [comma-separated list of major concerns, or "NONE"]
ADJUSTMENT_NEEDED: [percentage points to reduce success probability, 0-25]
REASONING: [2-3 sentences explaining the assessment]"#,
        competition = truncate(competition_analysis, 1500),
        market = truncate(market_analysis, 1000),
    )
}

fn critique_prompt(
    context: &AnalysisContext,
    original: f64,
    adjusted: f64,
    total: u32,
    revenue: &RevenueReview,
    competition: &CompetitionReview,
) -> Result<String> {
    let report = context.report()?;
    Ok(format!(
        r#"You are a critical reviewer of startup feasibility reports with expertise in identifying flaws.

Startup Idea: {idea}

COMPLETE FEASIBILITY REPORT:

Market Analysis:
{market}

Target Audience:
{audience}

Revenue Model:
{revenue_model}

Competition Analysis:
{competition_analysis}

Cost Structure:
{cost}

Go-to-Market Strategy:
{gtm}

Original Success Probability: {original}%
Adjusted Success Probability: {adjusted}%
Adjustment: -{total}%

CRITICAL FINDINGS:

Revenue Assumptions Analysis:
- Issues Found: {revenue_issues}
- Severity: {severity}
- Adjustment: -{revenue_adj}%
- Reasoning: {revenue_reasoning}

Competition Analysis:
- Competition Level: {level}
- Market Saturation: {saturation}
- Differentiation: {differentiation}
- Red Flags: {red_flags}
- Adjustment: -{competition_adj}%
- Reasoning: {competition_reasoning}

Based on this analysis, provide a COMPREHENSIVE CRITIQUE covering:

1. UNREALISTIC REVENUE ASSUMPTIONS
2. HIGH COMPETITION CONCERNS
3. WEAK ASSUMPTIONS (Other)
4. MISSING INFORMATION
5. LOGICAL GAPS
6. RISK FACTORS
7. IMPROVEMENTS
8. ADJUSTED SUCCESS ASSESSMENT: why the probability was adjusted and what would need to change

Be constructive but brutally honest. Focus on actionable insights."#,
        idea = context.idea(),
        market = truncate(report.market_analysis(), 1000),
        audience = truncate(report.target_audience(), 800),
        revenue_model = truncate(report.revenue_model(), 800),
        competition_analysis = truncate(report.competition_analysis(), 800),
        cost = truncate(report.cost_structure(), 800),
        gtm = truncate(report.go_to_market(), 800),
        revenue_issues = join_or(&revenue.issues, "None"),
        severity = revenue.severity,
        revenue_adj = revenue.adjustment,
        revenue_reasoning = revenue.reasoning,
        level = competition.competition_level,
        saturation = competition.market_saturation,
        differentiation = competition.differentiation_strength,
        red_flags = join_or(&competition.red_flags, "None"),
        competition_adj = competition.adjustment,
        competition_reasoning = competition.reasoning,
    ))
}

/// Assemble the returned critique text around the model's narrative.
pub fn format_critique(
    original: f64,
    adjusted: f64,
    total: u32,
    revenue: &RevenueReview,
    competition: &CompetitionReview,
    narrative: &str,
) -> String {
    format!(
        "CRITICAL REVIEW AND ADJUSTMENTS\n\n\
         ADJUSTED SUCCESS PROBABILITY: {adjusted}% (Original: {original}%, Adjustment: -{total}%)\n\n\
         REVENUE ASSUMPTIONS REVIEW:\n\
         - Severity: {severity}\n\
         - Issues: {issues}\n\
         - Impact: -{revenue_adj}% probability adjustment\n\
         - {revenue_reasoning}\n\n\
         COMPETITION INTENSITY REVIEW:\n\
         - Competition Level: {level}\n\
         - Market Saturation: {saturation}\n\
         - Differentiation Strength: {differentiation}\n\
         - Red Flags: {red_flags}\n\
         - Impact: -{competition_adj}% probability adjustment\n\
         - {competition_reasoning}\n\n\
         DETAILED CRITIQUE:\n\
         {narrative}\n",
        severity = revenue.severity,
        issues = join_or(&revenue.issues, "None identified"),
        revenue_adj = revenue.adjustment,
        revenue_reasoning = revenue.reasoning,
        level = competition.competition_level,
        saturation = competition.market_saturation,
        differentiation = competition.differentiation_strength,
        red_flags = join_or(&competition.red_flags, "None identified"),
        competition_adj = competition.adjustment,
        competition_reasoning = competition.reasoning,
    )
}

pub struct CriticAgent {
    llm: Arc<dyn LlmClient>,
}

impl CriticAgent {
    pub const ID: &'static str = "critic";
    pub const NAME: &'static str = "Critic";

    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn parse_revenue_review(reply: &str) -> RevenueReview {
        RevenueReview {
            unrealistic_assumptions: labels::yes_no(reply, "UNREALISTIC_ASSUMPTIONS", false)
                .or_warn(Self::ID, "UNREALISTIC_ASSUMPTIONS"),
            severity: labels::keyword(reply, "SEVERITY", "LOW").or_warn(Self::ID, "SEVERITY"),
            issues: labels::list(reply, "ISSUES").or_warn(Self::ID, "ISSUES"),
            adjustment: adjustment(reply, Self::ID, MAX_REVENUE_ADJUSTMENT),
            reasoning: labels::text(reply, "REASONING", "").or_warn(Self::ID, "REASONING"),
        }
    }

    pub fn parse_competition_review(reply: &str) -> CompetitionReview {
        CompetitionReview {
            competition_level: labels::keyword(reply, "COMPETITION_LEVEL", "MEDIUM")
                .or_warn(Self::ID, "COMPETITION_LEVEL"),
            market_saturation: labels::keyword(reply, "MARKET_SATURATION", "MEDIUM")
                .or_warn(Self::ID, "MARKET_SATURATION"),
            differentiation_strength: labels::keyword(reply, "DIFFERENTIATION_STRENGTH", "MODERATE")
                .or_warn(Self::ID, "DIFFERENTIATION_STRENGTH"),
            red_flags: labels::list(reply, "RED_FLAGS").or_warn(Self::ID, "RED_FLAGS"),
            adjustment: adjustment(reply, Self::ID, MAX_COMPETITION_ADJUSTMENT),
            reasoning: labels::text(reply, "REASONING", "").or_warn(Self::ID, "REASONING"),
        }
    }

    async fn review_revenue(&self, revenue_model: &str, market: &str) -> Result<RevenueReview> {
        let reply = self.llm.ask(revenue_prompt(revenue_model, market)).await?;
        Ok(Self::parse_revenue_review(&reply))
    }

    async fn review_competition(&self, competition: &str, market: &str) -> Result<CompetitionReview> {
        let reply = self.llm.ask(competition_prompt(competition, market)).await?;
        Ok(Self::parse_competition_review(&reply))
    }
}

#[async_trait]
impl Agent for CriticAgent {
    type Output = CriticOutput;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<CriticOutput> {
        let report = context.report()?;
        let original = report.success_probability();

        let (revenue, competition) = tokio::try_join!(
            self.review_revenue(report.revenue_model(), report.market_analysis()),
            self.review_competition(report.competition_analysis(), report.market_analysis()),
        )?;

        let total = revenue.adjustment + competition.adjustment;
        let adjusted = adjust_probability(original, total);
        info!(
            agent = Self::ID,
            original,
            adjusted,
            deduction = total,
            "Success probability adjusted"
        );

        let prompt = critique_prompt(context, original, adjusted, total, &revenue, &competition)?;
        let narrative = self.llm.ask(prompt).await?;
        let critique =
            format_critique(original, adjusted, total, &revenue, &competition, &narrative);

        Ok(CriticOutput {
            critique,
            original_probability: original,
            adjusted_probability: adjusted,
            total_adjustment: total,
            revenue,
            competition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_revenue_review() {
        let review = CriticAgent::parse_revenue_review(
            "UNREALISTIC_ASSUMPTIONS: YES\nSEVERITY: high\nISSUES: CAC too low, churn ignored\n\
             ADJUSTMENT_NEEDED: 12\nREASONING: Optimistic pricing.",
        );
        assert!(review.unrealistic_assumptions);
        assert_eq!(review.severity, "HIGH");
        assert_eq!(review.issues, vec!["CAC too low", "churn ignored"]);
        assert_eq!(review.adjustment, 12);
        assert_eq!(review.reasoning, "Optimistic pricing.");
    }

    #[test]
    fn revenue_review_defaults() {
        let review = CriticAgent::parse_revenue_review("no labels");
        assert!(!review.unrealistic_assumptions);
        assert_eq!(review.severity, "LOW");
        assert!(review.issues.is_empty());
        assert_eq!(review.adjustment, 0);
    }

    #[test]
    fn competition_review_defaults_and_clamps() {
        let review = CriticAgent::parse_competition_review("ADJUSTMENT_NEEDED: 80\nRED_FLAGS: NONE");
        assert_eq!(review.competition_level, "MEDIUM");
        assert_eq!(review.market_saturation, "MEDIUM");
        assert_eq!(review.differentiation_strength, "MODERATE");
        assert!(review.red_flags.is_empty());
        assert_eq!(review.adjustment, 25);
    }

    #[test]
    fn adjustments_clamp_to_range() {
        assert_eq!(adjustment("ADJUSTMENT_NEEDED: -4", "t", 30), 0);
        assert_eq!(adjustment("ADJUSTMENT_NEEDED: 31", "t", 30), 30);
        assert_eq!(adjustment("ADJUSTMENT_NEEDED: 7.6%", "t", 30), 8);
        assert_eq!(adjustment("ADJUSTMENT_NEEDED: lots", "t", 30), 0);
    }

    #[test]
    fn adjusted_probability_never_negative() {
        assert_eq!(adjust_probability(20.0, 45), 0.0);
        assert_eq!(adjust_probability(70.0, 15), 55.0);
        assert_eq!(adjust_probability(70.0, 0), 70.0);
    }

    #[test]
    fn critique_has_fixed_sections() {
        let revenue = CriticAgent::parse_revenue_review("ADJUSTMENT_NEEDED: 5");
        let competition = CriticAgent::parse_competition_review("RED_FLAGS: Rover, Wag");
        let text = format_critique(60.0, 55.0, 5, &revenue, &competition, "Narrative.");

        assert!(text.starts_with("CRITICAL REVIEW AND ADJUSTMENTS"));
        assert!(text.contains("ADJUSTED SUCCESS PROBABILITY: 55% (Original: 60%, Adjustment: -5%)"));
        assert!(text.contains("REVENUE ASSUMPTIONS REVIEW:\n- Severity: LOW\n- Issues: None identified"));
        assert!(text.contains("- Red Flags: Rover, Wag"));
        assert!(text.contains("DETAILED CRITIQUE:\nNarrative."));
    }
}
