//! Planner agent: extraction, search decision, web search and analysis plan.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use ideaforge_common::{Result, truncate};
use ideaforge_llm::LlmClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::{AnalysisContext, DEFAULT_INDUSTRY, DEFAULT_TARGET_MARKET};
use crate::labels;
use crate::search::{SearchProvider, SearchResult};
use crate::traits::Agent;

pub const SEARCH_SKIPPED: &str = "Web search skipped - sufficient context from similar ideas.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDecision {
    pub needed: bool,
    pub reason: String,
    pub queries: Vec<String>,
}

impl Default for SearchDecision {
    fn default() -> Self {
        Self {
            needed: true,
            reason: "Market research required".to_string(),
            queries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub plan: String,
    pub industry: String,
    pub location: String,
    pub industry_extracted: bool,
    pub location_extracted: bool,
    pub search_decision: SearchDecision,
    pub search_results: Vec<SearchResult>,
    /// Wall time spent in web search, 0 when skipped.
    pub search_time_ms: f64,
    pub market_trends: String,
}

impl PlannerOutput {
    /// Number of searches that returned any text.
    pub fn results_found(&self) -> usize {
        self.search_results.iter().filter(|r| r.has_results()).count()
    }
}

fn is_specific(hint: &str, generic: &str) -> bool {
    !hint.trim().is_empty() && hint != generic
}

fn extraction_prompt(idea: &str) -> String {
    format!(
        r#"Analyze this startup idea and extract key information:

Startup Idea: {idea}

Extract and provide ONLY the following in this exact format:
INDUSTRY: [specific industry/sector, e.g., "fintech", "healthtech", "e-commerce", "SaaS", "edtech"]
LOCATION: [geographic market, e.g., "United States", "Europe", "Southeast Asia", "Global"]

If the idea doesn't specify a location, infer the most likely target market based on the idea.
If the industry is unclear, categorize it based on the core business model.

Be specific and concise. One or two words for industry, one region for location."#
    )
}

fn search_decision_prompt(idea: &str, industry: &str, has_similar: bool) -> String {
    let similar = if has_similar { "Yes" } else { "No" };
    format!(
        r#"You are a research strategist. Decide if web search is needed for this startup analysis.

Startup Idea: {idea}
Industry: {industry}

Similar Ideas Context Available: {similar}

Decide if live web search is NECESSARY based on:
1. Is this a rapidly evolving industry? (AI, crypto, emerging tech = YES)
2. Are market trends critical to validation? (market-dependent ideas = YES)
3. Is the idea time-sensitive or trend-based? (YES)
4. Do we have sufficient similar context? (If yes = MAYBE NO)

Respond in this EXACT format:
SEARCH_NEEDED: [YES/NO]
REASON: [one sentence explaining why]
SEARCH_QUERIES: [comma-separated list of 2-3 specific search queries, or "NONE"]"#
    )
}

fn plan_prompt(
    idea: &str,
    industry: &str,
    location: &str,
    search_performed: bool,
    similar_context: &str,
    market_trends: &str,
) -> String {
    let web_search = if search_performed { "Yes" } else { "No" };
    let similar = if similar_context.is_empty() {
        "No similar ideas found."
    } else {
        similar_context
    };
    let trends = if market_trends.is_empty() {
        String::new()
    } else {
        format!("LATEST MARKET TRENDS:\n{market_trends}")
    };

    format!(
        r#"You are a strategic planner for startup feasibility analysis.

Startup Idea: {idea}

EXTRACTED CONTEXT:
- Industry: {industry}
- Geographic Location: {location}
- Web Search Performed: {web_search}

{similar}

{trends}

Create a comprehensive analysis plan that provides STRUCTURED GUIDANCE for execution agents:

1. KEY FOCUS AREAS:
   - List 3-5 critical areas that need deep investigation
   - Prioritize based on industry and location

2. CRITICAL SUCCESS FACTORS:
   - What must go right for this startup to succeed?
   - Industry-specific success metrics

3. MAJOR RISKS AND CHALLENGES:
   - Market, competition, execution and location-specific risks

4. DATA POINTS NEEDED:
   - Market size estimates
   - Customer acquisition channels
   - Pricing and cost structure benchmarks

5. AGENT GUIDANCE:
   - Specific instructions for the market intelligence analyst
   - Specific instructions for the financial strategist
   - Specific instructions for the go-to-market strategist

Provide a structured, actionable plan that will guide the specialized agents."#
    )
}

/// Queries used when the model asks for a search but names none.
pub fn default_queries(idea: &str, industry: &str, location: &str) -> Vec<String> {
    vec![
        format!("{industry} market trends {}", Utc::now().year()),
        format!("{} market analysis", truncate(idea, 100)),
        format!("startup opportunities in {location}"),
    ]
}

/// Compile non-empty search results into the market-trends block.
pub fn compile_market_trends(results: &[SearchResult]) -> String {
    results
        .iter()
        .filter(|r| r.has_results())
        .map(|r| format!("Query: {}\nResults: {}", r.query, truncate(&r.results, 500)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First pipeline stage. Runs its model calls and searches sequentially.
pub struct PlannerAgent {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
}

impl PlannerAgent {
    pub const ID: &'static str = "planner";
    pub const NAME: &'static str = "Planner";

    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchProvider>) -> Self {
        Self { llm, search }
    }

    /// Industry and location, each paired with whether it is known rather
    /// than defaulted.
    async fn extract_industry_and_location(
        &self,
        idea: &str,
        industry: &str,
        target_market: &str,
    ) -> Result<((String, bool), (String, bool))> {
        let industry_known = is_specific(industry, DEFAULT_INDUSTRY);
        let market_known = is_specific(target_market, DEFAULT_TARGET_MARKET);

        if industry_known && market_known {
            return Ok((
                (industry.to_string(), true),
                (target_market.to_string(), true),
            ));
        }

        let reply = self.llm.ask(extraction_prompt(idea)).await?;

        let industry_default = if industry_known { industry } else { DEFAULT_INDUSTRY };
        let location_default = if market_known {
            target_market
        } else {
            DEFAULT_TARGET_MARKET
        };

        let industry = labels::text(&reply, "INDUSTRY", industry_default);
        let location = labels::text(&reply, "LOCATION", location_default);
        let industry_found = industry.is_parsed() || industry_known;
        let location_found = location.is_parsed() || market_known;

        Ok((
            (industry.or_warn(Self::ID, "INDUSTRY"), industry_found),
            (location.or_warn(Self::ID, "LOCATION"), location_found),
        ))
    }

    async fn decide_web_search(
        &self,
        idea: &str,
        industry: &str,
        has_similar: bool,
    ) -> Result<SearchDecision> {
        let reply = self
            .llm
            .ask(search_decision_prompt(idea, industry, has_similar))
            .await?;

        let defaults = SearchDecision::default();
        Ok(SearchDecision {
            needed: labels::yes_no(&reply, "SEARCH_NEEDED", defaults.needed)
                .or_warn(Self::ID, "SEARCH_NEEDED"),
            reason: labels::text(&reply, "REASON", &defaults.reason).or_warn(Self::ID, "REASON"),
            queries: labels::list(&reply, "SEARCH_QUERIES").or_warn(Self::ID, "SEARCH_QUERIES"),
        })
    }

    async fn run_searches(&self, queries: &[String]) -> Result<Vec<SearchResult>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.search.search(query).await?);
        }
        Ok(results)
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    type Output = PlannerOutput;

    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, context: &AnalysisContext) -> Result<PlannerOutput> {
        let idea = context.idea();
        let similar_context = context.similar_ideas_context();

        let ((industry, industry_extracted), (location, location_extracted)) = self
            .extract_industry_and_location(idea, context.industry(), context.target_market())
            .await?;
        info!(agent = Self::ID, industry = %industry, location = %location, "Extracted context");

        let mut search_decision = self
            .decide_web_search(idea, &industry, !context.similar_ideas().is_empty())
            .await?;

        let search_started = Instant::now();
        let (search_results, market_trends) = if search_decision.needed {
            if search_decision.queries.is_empty() {
                search_decision.queries = default_queries(idea, &industry, &location);
            }
            info!(
                agent = Self::ID,
                queries = search_decision.queries.len(),
                reason = %search_decision.reason,
                "Running web search"
            );
            let results = self.run_searches(&search_decision.queries).await?;
            let trends = compile_market_trends(&results);
            (results, trends)
        } else {
            info!(agent = Self::ID, reason = %search_decision.reason, "Skipping web search");
            (Vec::new(), SEARCH_SKIPPED.to_string())
        };
        let search_time_ms = if search_decision.needed {
            search_started.elapsed().as_secs_f64() * 1000.0
        } else {
            0.0
        };

        let plan = self
            .llm
            .ask(plan_prompt(
                idea,
                &industry,
                &location,
                search_decision.needed,
                similar_context,
                &market_trends,
            ))
            .await?;
        debug!(agent = Self::ID, chars = plan.len(), "Plan generated");

        Ok(PlannerOutput {
            plan,
            industry,
            location,
            industry_extracted,
            location_extracted,
            search_decision,
            search_results,
            search_time_ms,
            market_trends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_queries_use_year_and_truncated_idea() {
        let idea = "a".repeat(150);
        let queries = default_queries(&idea, "fintech", "Europe");
        assert_eq!(queries.len(), 3);
        assert_eq!(
            queries[0],
            format!("fintech market trends {}", Utc::now().year())
        );
        assert_eq!(queries[1], format!("{} market analysis", "a".repeat(100)));
        assert_eq!(queries[2], "startup opportunities in Europe");
    }

    #[test]
    fn market_trends_skip_empty_results() {
        let results = vec![
            SearchResult {
                query: "one".into(),
                results: "x".repeat(600),
            },
            SearchResult {
                query: "two".into(),
                results: String::new(),
            },
            SearchResult {
                query: "three".into(),
                results: "short".into(),
            },
        ];

        let trends = compile_market_trends(&results);
        assert_eq!(
            trends,
            format!(
                "Query: one\nResults: {}\n\nQuery: three\nResults: short",
                "x".repeat(500)
            )
        );
    }

    #[test]
    fn generic_hints_are_not_specific() {
        assert!(!is_specific("general", DEFAULT_INDUSTRY));
        assert!(!is_specific("", DEFAULT_INDUSTRY));
        assert!(is_specific("fintech", DEFAULT_INDUSTRY));
    }

    #[test]
    fn plan_prompt_mentions_missing_similar_context() {
        let prompt = plan_prompt("idea", "pets", "US", false, "", "");
        assert!(prompt.contains("No similar ideas found."));
        assert!(prompt.contains("Web Search Performed: No"));
        assert!(!prompt.contains("LATEST MARKET TRENDS"));
    }
}
