//! Analysis agents for IdeaForge.
//!
//! Each agent is a role-scoped wrapper around one or more LLM calls:
//!
//! - **Planner**: extracts industry and location, decides on web search,
//!   writes the analysis plan
//! - **Market intelligence**: demand, audience and competition
//! - **Financial strategy**: revenue model and cost structure
//! - **Go-to-market**: launch plan from the planner's context
//! - **Success probability**: score and best launch location
//! - **Critic**: deductions for revenue and competition risk, plus critique
//!
//! # Data flow
//!
//! ```text
//!            ┌─────────┐
//!            │ Planner │──── SearchProvider
//!            └────┬────┘
//!       ┌─────────┼──────────┐
//!       ▼         ▼          ▼
//!   ┌────────┐ ┌─────────┐ ┌─────┐
//!   │ Market │ │Financial│ │ GTM │      (concurrent)
//!   └───┬────┘ └────┬────┘ └──┬──┘
//!       └───────────┼─────────┘
//!                   ▼
//!           ┌──────────────┐     ┌────────┐
//!           │ Success prob │ ──► │ Critic │
//!           └──────────────┘     └────────┘
//! ```
//!
//! Agents only read the [`AnalysisContext`]; recording their outputs is the
//! orchestrator's job.

pub mod context;
pub mod critic;
pub mod financial;
pub mod gtm;
pub mod labels;
pub mod market;
pub mod planner;
pub mod search;
pub mod success;
pub mod traits;

pub use context::{AnalysisContext, DEFAULT_INDUSTRY, DEFAULT_TARGET_MARKET};
pub use critic::{CompetitionReview, CriticAgent, CriticOutput, RevenueReview};
pub use financial::{FinancialStrategy, FinancialStrategyAgent};
pub use gtm::GtmAgent;
pub use labels::LabelValue;
pub use market::{MarketIntelligence, MarketIntelligenceAgent};
pub use planner::{PlannerAgent, PlannerOutput, SearchDecision};
pub use search::{DuckDuckGoSearch, SearchConfig, SearchProvider, SearchResult};
pub use success::{SuccessAssessment, SuccessProbabilityAgent};
pub use traits::Agent;
