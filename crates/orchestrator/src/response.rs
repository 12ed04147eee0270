use ideaforge_common::{FeasibilityReport, truncate};
use ideaforge_evaluation::{EvaluationSummary, HallucinationReport};
use serde::{Deserialize, Serialize};

/// Similar ideas echoed back in a response.
pub const SIMILAR_IDEAS_IN_RESPONSE: usize = 3;
const SIMILAR_IDEA_PREVIEW_CHARS: usize = 100;

/// Everything returned for one analysed idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityResponse {
    pub idea: String,
    pub report: FeasibilityReport,
    #[serde(default)]
    pub similar_ideas: Vec<String>,
    #[serde(default)]
    pub sources_used: Vec<String>,
    pub critique: String,
    pub evaluation_metrics: EvaluationSummary,
    pub hallucination_report: HallucinationReport,
}

/// Short preview of a retrieved idea.
pub fn similar_idea_preview(idea: &str) -> String {
    format!("{}...", truncate(idea, SIMILAR_IDEA_PREVIEW_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_always_ends_with_ellipsis() {
        assert_eq!(similar_idea_preview("Dog walking"), "Dog walking...");
        let long = "x".repeat(250);
        assert_eq!(similar_idea_preview(&long), format!("{}...", "x".repeat(100)));
    }
}
