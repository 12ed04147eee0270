//! The feasibility report assembled from the analysis agents.

use serde::{Deserialize, Deserializer, Serialize};

/// Lower and upper bound of every success probability the system emits.
pub const PROBABILITY_RANGE: (f64, f64) = (0.0, 100.0);

/// Clamp a success probability into `[0, 100]`.
///
/// NaN collapses to the lower bound so a report can never carry a value
/// outside the range.
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return PROBABILITY_RANGE.0;
    }
    value.clamp(PROBABILITY_RANGE.0, PROBABILITY_RANGE.1)
}

fn deserialize_probability<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_probability)
}

/// Narrative sections of a report, one per analysis concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSections {
    pub market_analysis: String,
    pub target_audience: String,
    pub revenue_model: String,
    pub competition_analysis: String,
    pub cost_structure: String,
    pub go_to_market: String,
}

/// Structured output of one feasibility analysis.
///
/// Immutable once built. The critic stage produces a second report through
/// [`FeasibilityReport::with_success_probability`] rather than mutating the
/// first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    #[serde(flatten)]
    sections: ReportSections,
    #[serde(deserialize_with = "deserialize_probability")]
    success_probability: f64,
    best_location: String,
}

impl FeasibilityReport {
    pub fn new(
        sections: ReportSections,
        success_probability: f64,
        best_location: impl Into<String>,
    ) -> Self {
        Self {
            sections,
            success_probability: clamp_probability(success_probability),
            best_location: best_location.into(),
        }
    }

    /// Rebuild the report with a replaced success probability.
    pub fn with_success_probability(&self, success_probability: f64) -> Self {
        Self::new(
            self.sections.clone(),
            success_probability,
            self.best_location.clone(),
        )
    }

    pub fn sections(&self) -> &ReportSections {
        &self.sections
    }

    pub fn market_analysis(&self) -> &str {
        &self.sections.market_analysis
    }

    pub fn target_audience(&self) -> &str {
        &self.sections.target_audience
    }

    pub fn revenue_model(&self) -> &str {
        &self.sections.revenue_model
    }

    pub fn competition_analysis(&self) -> &str {
        &self.sections.competition_analysis
    }

    pub fn cost_structure(&self) -> &str {
        &self.sections.cost_structure
    }

    pub fn go_to_market(&self) -> &str {
        &self.sections.go_to_market
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    pub fn best_location(&self) -> &str {
        &self.best_location
    }

    /// JSON blob persisted alongside the idea embedding.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "market_analysis": self.sections.market_analysis,
            "target_audience": self.sections.target_audience,
            "revenue_model": self.sections.revenue_model,
            "competition_analysis": self.sections.competition_analysis,
            "cost_structure": self.sections.cost_structure,
            "go_to_market": self.sections.go_to_market,
            "success_probability": self.success_probability,
            "best_location": self.best_location,
        })
    }
}
