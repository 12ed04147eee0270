//! Heuristic confidence scores for agent replies.
//!
//! Scores are in `[0, 1]` and derive only from surface features of the
//! text and from which grounding inputs were available to the agent.

use std::sync::LazyLock;

use regex::Regex;

/// Numeric data points: percentages, dollar amounts, 10K/5M/2B, 1,000.
pub(crate) static DATA_POINT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+%|\$\d+|\d+[KMB]|\d+,\d+").unwrap());

static LIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*[-*•]\s+|\n\s*\d+\.\s+").unwrap());

const UNCERTAINTY_MARKERS: &[&str] = &[
    "might",
    "could",
    "possibly",
    "perhaps",
    "maybe",
    "uncertain",
    "unclear",
    "estimated",
    "approximately",
    "roughly",
    "around",
    "about",
];

const CERTAINTY_MARKERS: &[&str] = &[
    "clearly",
    "definitely",
    "certainly",
    "proven",
    "established",
    "confirmed",
    "validated",
    "verified",
];

/// Rough token estimate, one token per four bytes.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Count substring occurrences of every marker in lowercased text.
fn count_markers(lower: &str, markers: &[&str]) -> usize {
    markers.iter().map(|m| lower.matches(m).count()).sum()
}

/// Inputs that were available when a reply was produced.
#[derive(Debug, Clone, Copy)]
pub struct Grounding {
    pub context_available: bool,
    pub search_data_available: bool,
    pub similar_ideas_count: usize,
}

impl Default for Grounding {
    fn default() -> Self {
        Self {
            context_available: true,
            search_data_available: true,
            similar_ideas_count: 0,
        }
    }
}

pub fn response_confidence(response: &str, grounding: Grounding) -> f64 {
    let mut confidence: f64 = 0.5;

    confidence += match response.len() {
        n if n > 1000 => 0.15,
        n if n > 500 => 0.10,
        n if n > 200 => 0.05,
        _ => -0.10,
    };

    let data_points = DATA_POINT_PATTERN.find_iter(response).count();
    if data_points >= 5 {
        confidence += 0.10;
    } else if data_points >= 3 {
        confidence += 0.05;
    }

    confidence += if grounding.context_available { 0.10 } else { -0.15 };
    confidence += if grounding.search_data_available { 0.10 } else { -0.10 };

    confidence += match grounding.similar_ideas_count {
        n if n >= 3 => 0.10,
        n if n >= 1 => 0.05,
        _ => -0.05,
    };

    let lower = response.to_lowercase();

    let hedges = count_markers(&lower, UNCERTAINTY_MARKERS);
    if hedges > 5 {
        confidence -= 0.10;
    } else if hedges > 3 {
        confidence -= 0.05;
    }

    if count_markers(&lower, CERTAINTY_MARKERS) >= 3 {
        confidence += 0.05;
    }

    if LIST_PATTERN.is_match(response) {
        confidence += 0.05;
    }

    confidence.clamp(0.0, 1.0)
}

/// Confidence of the planning stage.
pub fn planner_confidence(
    plan: &str,
    industry_extracted: bool,
    location_extracted: bool,
    search_performed: bool,
    search_results_count: usize,
) -> f64 {
    let mut confidence = response_confidence(
        plan,
        Grounding {
            context_available: true,
            search_data_available: search_performed && search_results_count > 0,
            similar_ideas_count: 0,
        },
    );

    if industry_extracted {
        confidence += 0.05;
    }
    if location_extracted {
        confidence += 0.05;
    }
    if search_performed && search_results_count >= 2 {
        confidence += 0.05;
    }

    confidence.min(1.0)
}

/// Confidence of an analysis agent working from the plan.
pub fn analysis_confidence(
    analysis: &str,
    plan_available: bool,
    market_trends_available: bool,
    similar_ideas_count: usize,
) -> f64 {
    response_confidence(
        analysis,
        Grounding {
            context_available: plan_available,
            search_data_available: market_trends_available,
            similar_ideas_count,
        },
    )
}

/// Confidence of the critic stage.
pub fn critic_confidence(critique: &str, issues_found: bool, adjustment_made: bool) -> f64 {
    let mut confidence = response_confidence(critique, Grounding::default());
    if issues_found {
        confidence += 0.05;
    }
    if adjustment_made {
        confidence += 0.05;
    }
    confidence.min(1.0)
}
