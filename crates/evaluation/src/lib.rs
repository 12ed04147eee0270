//! Evaluation layer for IdeaForge analyses.
//!
//! Everything here is bookkeeping over finished agent replies:
//!
//! - [`confidence`]: surface-feature confidence scores per reply
//! - [`metrics`]: the per-request [`EvaluationTracker`]
//! - [`hallucination`]: grounding, consistency and vague-claim checks
//!
//! None of it feeds back into the pipeline's control flow.

pub mod confidence;
pub mod hallucination;
pub mod metrics;

pub use confidence::{
    Grounding, analysis_confidence, critic_confidence, estimate_tokens, planner_confidence,
    response_confidence,
};
pub use hallucination::{
    DataGrounding, HallucinationReport, assess_data_grounding, check_response_consistency,
    detect_vague_claims, generate_report,
};
pub use metrics::{EvaluationSummary, EvaluationTracker, RiskLevel};
