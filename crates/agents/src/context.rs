//! Typed accumulator threaded through the analysis pipeline.
//!
//! Every stage output has its own slot. A slot is written exactly once by
//! the stage that owns it, and reading an empty slot is an error rather than
//! an empty default.

use ideaforge_common::{
    FeasibilityReport, IdeaForgeError, ReportSections, Result, SimilarIdea,
};

use crate::critic::CriticOutput;
use crate::financial::FinancialStrategy;
use crate::market::MarketIntelligence;
use crate::planner::PlannerOutput;
use crate::success::SuccessAssessment;

pub const DEFAULT_INDUSTRY: &str = "general";
pub const DEFAULT_TARGET_MARKET: &str = "global";

fn missing(stage: &str) -> IdeaForgeError {
    IdeaForgeError::Agent(format!("{stage} output is not available yet"))
}

fn set_once<T>(slot: &mut Option<T>, value: T, stage: &str) -> Result<()> {
    if slot.is_some() {
        return Err(IdeaForgeError::Agent(format!("{stage} output already recorded")));
    }
    *slot = Some(value);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AnalysisContext {
    idea: String,
    industry: String,
    target_market: String,
    similar_ideas: Vec<SimilarIdea>,
    similar_ideas_context: String,
    planner: Option<PlannerOutput>,
    market: Option<MarketIntelligence>,
    financial: Option<FinancialStrategy>,
    gtm: Option<String>,
    success: Option<SuccessAssessment>,
    report: Option<FeasibilityReport>,
    critic: Option<CriticOutput>,
}

impl AnalysisContext {
    /// Start a context from the request. Missing hints use the generic
    /// `general` / `global` values.
    pub fn new(
        idea: impl Into<String>,
        industry: Option<String>,
        target_market: Option<String>,
    ) -> Self {
        Self {
            idea: idea.into(),
            industry: industry.unwrap_or_else(|| DEFAULT_INDUSTRY.to_string()),
            target_market: target_market.unwrap_or_else(|| DEFAULT_TARGET_MARKET.to_string()),
            similar_ideas: Vec::new(),
            similar_ideas_context: String::new(),
            planner: None,
            market: None,
            financial: None,
            gtm: None,
            success: None,
            report: None,
            critic: None,
        }
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn target_market(&self) -> &str {
        &self.target_market
    }

    pub fn similar_ideas(&self) -> &[SimilarIdea] {
        &self.similar_ideas
    }

    pub fn similar_ideas_context(&self) -> &str {
        &self.similar_ideas_context
    }

    pub fn set_retrieval(&mut self, similar_ideas: Vec<SimilarIdea>, formatted: String) {
        self.similar_ideas = similar_ideas;
        self.similar_ideas_context = formatted;
    }

    pub fn set_planner(&mut self, output: PlannerOutput) -> Result<()> {
        set_once(&mut self.planner, output, "planner")
    }

    pub fn planner(&self) -> Result<&PlannerOutput> {
        self.planner.as_ref().ok_or_else(|| missing("planner"))
    }

    /// Record the three concurrent analysis outputs together.
    pub fn set_analysis(
        &mut self,
        market: MarketIntelligence,
        financial: FinancialStrategy,
        gtm: String,
    ) -> Result<()> {
        set_once(&mut self.market, market, "market intelligence")?;
        set_once(&mut self.financial, financial, "financial strategy")?;
        set_once(&mut self.gtm, gtm, "go-to-market")
    }

    pub fn market(&self) -> Result<&MarketIntelligence> {
        self.market.as_ref().ok_or_else(|| missing("market intelligence"))
    }

    pub fn financial(&self) -> Result<&FinancialStrategy> {
        self.financial.as_ref().ok_or_else(|| missing("financial strategy"))
    }

    pub fn gtm(&self) -> Result<&str> {
        self.gtm.as_deref().ok_or_else(|| missing("go-to-market"))
    }

    pub fn set_success(&mut self, output: SuccessAssessment) -> Result<()> {
        set_once(&mut self.success, output, "success probability")
    }

    pub fn success(&self) -> Result<&SuccessAssessment> {
        self.success.as_ref().ok_or_else(|| missing("success probability"))
    }

    /// Assemble the report from the analysis and success outputs.
    pub fn build_report(&self) -> Result<FeasibilityReport> {
        let market = self.market()?;
        let financial = self.financial()?;
        let success = self.success()?;

        let sections = ReportSections {
            market_analysis: market.market_demand.clone(),
            target_audience: market.audience_profile.clone(),
            revenue_model: financial.revenue_model.clone(),
            competition_analysis: market.competition_landscape.clone(),
            cost_structure: financial.cost_structure.clone(),
            go_to_market: self.gtm()?.to_string(),
        };

        Ok(FeasibilityReport::new(
            sections,
            success.success_probability,
            success.best_location.clone(),
        ))
    }

    pub fn set_report(&mut self, report: FeasibilityReport) -> Result<()> {
        set_once(&mut self.report, report, "report")
    }

    pub fn report(&self) -> Result<&FeasibilityReport> {
        self.report.as_ref().ok_or_else(|| missing("report"))
    }

    pub fn set_critic(&mut self, output: CriticOutput) -> Result<()> {
        set_once(&mut self.critic, output, "critic")
    }

    pub fn critic(&self) -> Result<&CriticOutput> {
        self.critic.as_ref().ok_or_else(|| missing("critic"))
    }

    /// The report with the critic's adjusted probability applied.
    pub fn final_report(&self) -> Result<FeasibilityReport> {
        let report = self.report()?;
        Ok(match &self.critic {
            Some(critic) => report.with_success_probability(critic.adjusted_probability),
            None => report.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(probability: f64) -> SuccessAssessment {
        SuccessAssessment {
            success_probability: probability,
            best_location: "Austin, TX".into(),
            reasoning: String::new(),
            full_output: String::new(),
        }
    }

    fn analysed() -> AnalysisContext {
        let mut ctx = AnalysisContext::new("dog walking", None, None);
        ctx.set_analysis(
            MarketIntelligence {
                market_demand: "demand".into(),
                audience_profile: "audience".into(),
                competition_landscape: "competition".into(),
                ..Default::default()
            },
            FinancialStrategy {
                revenue_model: "revenue".into(),
                cost_structure: "cost".into(),
                ..Default::default()
            },
            "gtm".into(),
        )
        .unwrap();
        ctx
    }

    #[test]
    fn hints_default_to_generic_values() {
        let ctx = AnalysisContext::new("idea", None, Some("Kenya".into()));
        assert_eq!(ctx.industry(), DEFAULT_INDUSTRY);
        assert_eq!(ctx.target_market(), "Kenya");
    }

    #[test]
    fn reading_an_empty_slot_is_an_error() {
        let ctx = AnalysisContext::new("idea", None, None);
        assert!(matches!(ctx.planner(), Err(IdeaForgeError::Agent(_))));
        assert!(ctx.build_report().is_err());
    }

    #[test]
    fn slots_are_written_once() {
        let mut ctx = AnalysisContext::new("idea", None, None);
        ctx.set_success(success(40.0)).unwrap();
        let err = ctx.set_success(success(60.0)).unwrap_err();
        assert!(err.to_string().contains("already recorded"));
        assert_eq!(ctx.success().unwrap().success_probability, 40.0);
    }

    #[test]
    fn report_maps_fields_from_stage_outputs() {
        let mut ctx = analysed();
        ctx.set_success(success(64.0)).unwrap();

        let report = ctx.build_report().unwrap();
        assert_eq!(report.market_analysis(), "demand");
        assert_eq!(report.target_audience(), "audience");
        assert_eq!(report.competition_analysis(), "competition");
        assert_eq!(report.revenue_model(), "revenue");
        assert_eq!(report.cost_structure(), "cost");
        assert_eq!(report.go_to_market(), "gtm");
        assert_eq!(report.success_probability(), 64.0);
        assert_eq!(report.best_location(), "Austin, TX");
    }

    #[test]
    fn final_report_without_critic_is_unchanged() {
        let mut ctx = analysed();
        ctx.set_success(success(64.0)).unwrap();
        ctx.set_report(ctx.build_report().unwrap()).unwrap();
        assert_eq!(ctx.final_report().unwrap().success_probability(), 64.0);
    }
}
