//! The analysis pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use ideaforge_agents::{
    Agent, AnalysisContext, CriticAgent, FinancialStrategyAgent, GtmAgent,
    MarketIntelligenceAgent, PlannerAgent, SearchProvider, SuccessProbabilityAgent,
};
use ideaforge_common::Result;
use ideaforge_evaluation::{
    DataGrounding, EvaluationTracker, analysis_confidence, critic_confidence, estimate_tokens,
    generate_report, planner_confidence,
};
use ideaforge_llm::LlmClient;
use ideaforge_memory::{IdeaRetriever, build_context_from_similar_ideas};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::response::{FeasibilityResponse, SIMILAR_IDEAS_IN_RESPONSE, similar_idea_preview};

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Await a stage and pair its output with the wall time it took.
async fn timed<T>(stage: impl Future<Output = Result<T>>) -> Result<(T, f64)> {
    let started = Instant::now();
    let output = stage.await?;
    Ok((output, elapsed_ms(started)))
}

/// Runs the agents in dependency order over one typed context.
///
/// Collaborators are injected once and shared across requests; all
/// per-request state (context, tracker) lives on the stack of
/// [`Orchestrator::analyze`].
pub struct Orchestrator {
    retriever: Arc<IdeaRetriever>,
    planner: PlannerAgent,
    market: MarketIntelligenceAgent,
    financial: FinancialStrategyAgent,
    gtm: GtmAgent,
    success: SuccessProbabilityAgent,
    critic: CriticAgent,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<IdeaRetriever>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            retriever,
            planner: PlannerAgent::new(llm.clone(), search),
            market: MarketIntelligenceAgent::new(llm.clone()),
            financial: FinancialStrategyAgent::new(llm.clone()),
            gtm: GtmAgent::new(llm.clone()),
            success: SuccessProbabilityAgent::new(llm.clone()),
            critic: CriticAgent::new(llm),
        }
    }

    pub fn retriever(&self) -> &Arc<IdeaRetriever> {
        &self.retriever
    }

    /// Analyse one idea end to end.
    ///
    /// Any stage error aborts the request. Nothing is persisted unless every
    /// stage, the critic included, succeeded.
    #[instrument(
        skip(self, idea, industry, target_market),
        fields(analysis_id = %Uuid::new_v4())
    )]
    pub async fn analyze(
        &self,
        idea: &str,
        industry: Option<String>,
        target_market: Option<String>,
    ) -> Result<FeasibilityResponse> {
        let mut tracker = EvaluationTracker::new();
        tracker.start();
        let mut context = AnalysisContext::new(idea, industry, target_market);
        info!(chars = idea.len(), "Starting analysis");

        // Retrieval
        let (similar, retrieval_ms) = timed(self.retriever.retrieve_similar(idea)).await?;
        tracker.set_retrieval_metrics(similar.iter().map(|s| s.similarity).collect(), retrieval_ms);
        let formatted = build_context_from_similar_ideas(&similar);
        info!(similar_ideas = similar.len(), "Retrieved similar ideas");
        context.set_retrieval(similar, formatted);
        let similar_count = context.similar_ideas().len();

        // Planning
        let (plan, planner_ms) = timed(self.planner.execute(&context)).await?;
        let results_found = plan.results_found();
        tracker.add_agent_metrics(
            self.planner.name(),
            estimate_tokens(&plan.plan),
            planner_ms,
            planner_confidence(
                &plan.plan,
                plan.industry_extracted,
                plan.location_extracted,
                plan.search_decision.needed,
                results_found,
            ),
        );
        tracker.set_search_metrics(
            plan.search_decision.needed,
            plan.search_decision.queries.len(),
            results_found,
            plan.search_time_ms,
        );
        let trends_available = !plan.market_trends.is_empty();
        context.set_planner(plan)?;

        // Analysis fan-out
        let ((market, market_ms), (financial, financial_ms), (gtm, gtm_ms)) = tokio::try_join!(
            timed(self.market.execute(&context)),
            timed(self.financial.execute(&context)),
            timed(self.gtm.execute(&context)),
        )?;
        for (name, text, ms) in [
            (self.market.name(), market.full_output.as_str(), market_ms),
            (self.financial.name(), financial.full_output.as_str(), financial_ms),
            (self.gtm.name(), gtm.as_str(), gtm_ms),
        ] {
            tracker.add_agent_metrics(
                name,
                estimate_tokens(text),
                ms,
                analysis_confidence(text, true, trends_available, similar_count),
            );
        }
        context.set_analysis(market, financial, gtm)?;

        // Success probability
        let (success, success_ms) = timed(self.success.execute(&context)).await?;
        tracker.add_agent_metrics(
            self.success.name(),
            estimate_tokens(&success.full_output),
            success_ms,
            analysis_confidence(&success.full_output, true, trends_available, similar_count),
        );
        context.set_success(success)?;
        let initial_report = context.build_report()?;
        context.set_report(initial_report)?;

        // Critic
        let (critic, critic_ms) = timed(self.critic.execute(&context)).await?;
        tracker.add_agent_metrics(
            self.critic.name(),
            estimate_tokens(&critic.critique),
            critic_ms,
            critic_confidence(&critic.critique, critic.issues_found(), critic.adjustment_made()),
        );
        context.set_critic(critic)?;
        let report = context.final_report()?;

        // Evaluation
        let overall_confidence = tracker.calculate_overall_confidence();
        let risk = tracker.assess_hallucination_risk();
        let planner = context.planner()?;
        let hallucination_report = generate_report(
            DataGrounding {
                search_performed: planner.search_decision.needed,
                search_results_count: planner.results_found(),
                similar_ideas_count: similar_count,
                top_similarity_score: tracker.top_similarity(),
            },
            report.market_analysis(),
            report.competition_analysis(),
            report.revenue_model(),
        );
        tracker.finish();
        tracker.log_summary();
        info!(
            overall_confidence,
            risk = %risk,
            probability = report.success_probability(),
            "Analysis evaluated"
        );

        // Persistence, only once the critic has reviewed the report
        let stored_id = self
            .retriever
            .store_idea_with_report(idea, report.to_json())
            .await?;
        info!(id = stored_id, "Stored analysis");

        let critic = context.critic()?;
        Ok(FeasibilityResponse {
            idea: idea.to_string(),
            similar_ideas: context
                .similar_ideas()
                .iter()
                .take(SIMILAR_IDEAS_IN_RESPONSE)
                .map(|s| similar_idea_preview(&s.idea))
                .collect(),
            sources_used: planner
                .search_results
                .iter()
                .map(|r| r.query.clone())
                .collect(),
            critique: critic.critique.clone(),
            evaluation_metrics: tracker.summary(),
            hallucination_report,
            report,
        })
    }
}
