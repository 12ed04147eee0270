//! Heuristic hallucination risk checks over the assembled report.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confidence::DATA_POINT_PATTERN;
use crate::metrics::RiskLevel;

const SMALL_MARKET: &[&str] = &["small market", "niche market", "limited market", "narrow market"];
const HIGH_REVENUE: &[&str] = &["billion", "millions of users", "rapid growth", "exponential"];
const HIGH_COMPETITION: &[&str] = &[
    "high competition",
    "many competitors",
    "saturated market",
    "crowded market",
];
const EASY_ENTRY: &[&str] = &["low barriers", "easy to enter", "simple to start"];
const VAGUE_CLAIMS: &[&str] = &[
    "many users",
    "significant growth",
    "large market",
    "substantial revenue",
    "considerable opportunity",
    "numerous customers",
];

fn mentions_any(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

/// Grounding signals the report was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataGrounding {
    pub search_performed: bool,
    pub search_results_count: usize,
    pub similar_ideas_count: usize,
    pub top_similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub risk_level: RiskLevel,
    pub flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub data_grounding: DataGrounding,
}

/// Score how well the analysis is backed by search results and prior ideas.
pub fn assess_data_grounding(grounding: &DataGrounding) -> (RiskLevel, Vec<String>) {
    let mut flags = Vec::new();
    let mut score = 0;

    if !grounding.search_performed {
        flags.push("No web search performed, analysis may lack current market data".to_string());
        score += 2;
    } else if grounding.search_results_count == 0 {
        flags.push("Web search returned no results, high risk of hallucination".to_string());
        score += 3;
    } else if grounding.search_results_count < 2 {
        flags.push("Limited web search results, analysis may be speculative".to_string());
        score += 1;
    }

    let top = grounding.top_similarity_score;
    if grounding.similar_ideas_count == 0 {
        flags.push("No similar ideas in database, no historical context available".to_string());
        score += 2;
    } else if top < 0.2 {
        flags.push(format!(
            "Very low similarity to existing ideas (max: {:.1}%)",
            top * 100.0
        ));
        score += 2;
    } else if top < 0.4 {
        flags.push(format!(
            "Low similarity to existing ideas (max: {:.1}%)",
            top * 100.0
        ));
        score += 1;
    }

    (RiskLevel::from_score(score), flags)
}

/// Flag contradictions between the market, competition and revenue sections.
pub fn check_response_consistency(
    market_analysis: &str,
    competition_analysis: &str,
    revenue_model: &str,
) -> Vec<String> {
    let market = market_analysis.to_lowercase();
    let competition = competition_analysis.to_lowercase();
    let revenue = revenue_model.to_lowercase();
    let mut warnings = Vec::new();

    if mentions_any(&market, SMALL_MARKET) && mentions_any(&revenue, HIGH_REVENUE) {
        warnings.push("Inconsistency: small market size but high revenue projections".to_string());
    }

    let easy_entry = mentions_any(&market, EASY_ENTRY) || mentions_any(&revenue, EASY_ENTRY);
    if mentions_any(&competition, HIGH_COMPETITION) && easy_entry {
        warnings.push(
            "Inconsistency: high competition but low barriers to entry mentioned".to_string(),
        );
    }

    warnings
}

/// Warn on unquantified claims.
pub fn detect_vague_claims(response: &str) -> Vec<String> {
    let lower = response.to_lowercase();
    let mut warnings = Vec::new();

    let vague = VAGUE_CLAIMS.iter().filter(|p| lower.contains(*p)).count();
    if vague >= 3 {
        warnings.push(format!(
            "Multiple vague claims detected ({vague}), lacks specific data points"
        ));
    }

    if response.len() > 500 && !DATA_POINT_PATTERN.is_match(response) {
        warnings.push("Long response with no specific numbers or data points".to_string());
    }

    warnings
}

/// Combine grounding, consistency and vague-claim checks.
pub fn generate_report(
    grounding: DataGrounding,
    market_analysis: &str,
    competition_analysis: &str,
    revenue_model: &str,
) -> HallucinationReport {
    let (risk_level, mut flags) = assess_data_grounding(&grounding);

    let consistency = if market_analysis.is_empty()
        || competition_analysis.is_empty()
        || revenue_model.is_empty()
    {
        Vec::new()
    } else {
        check_response_consistency(market_analysis, competition_analysis, revenue_model)
    };

    let vague = if market_analysis.is_empty() {
        Vec::new()
    } else {
        detect_vague_claims(market_analysis)
    };

    let mut recommendations = Vec::new();
    if matches!(risk_level, RiskLevel::High | RiskLevel::Critical) {
        recommendations.push("Manually verify all claims and data points".to_string());
        recommendations.push("Seek additional data sources before making decisions".to_string());
    }
    if !grounding.search_performed || grounding.search_results_count == 0 {
        recommendations.push("Perform manual web research to validate findings".to_string());
    }
    if grounding.similar_ideas_count == 0 {
        recommendations
            .push("Build up database with more similar ideas for better context".to_string());
    }
    if !consistency.is_empty() {
        recommendations.push("Review and resolve inconsistencies between sections".to_string());
    }
    if !vague.is_empty() {
        recommendations.push("Request specific data points and quantitative analysis".to_string());
    }

    debug!(
        risk = %risk_level,
        consistency = consistency.len(),
        vague = vague.len(),
        "Hallucination report"
    );

    flags.extend(consistency);
    flags.extend(vague);

    HallucinationReport {
        risk_level,
        flags,
        recommendations,
        data_grounding: DataGrounding {
            top_similarity_score: (grounding.top_similarity_score * 1000.0).round() / 1000.0,
            ..grounding
        },
    }
}
