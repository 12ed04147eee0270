//! Per-request evaluation tracking.
//!
//! One [`EvaluationTracker`] is created per analysis. It only records; the
//! pipeline never branches on anything it computes.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Categorical hallucination risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map an additive risk score to a level.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 5 => Self::Critical,
            s if s >= 3 => Self::High,
            s if s >= 1 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        })
    }
}

#[derive(Debug, Clone)]
pub struct AgentMetrics {
    pub agent_name: String,
    pub tokens_used: usize,
    pub execution_time_ms: f64,
    pub confidence_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalMetrics {
    pub similar_ideas_count: usize,
    pub top_similarity_score: f64,
    pub avg_similarity_score: f64,
    pub similarity_scores: Vec<f64>,
    pub retrieval_time_ms: f64,
}

impl RetrievalMetrics {
    pub fn from_scores(similarity_scores: Vec<f64>, retrieval_time_ms: f64) -> Self {
        let count = similarity_scores.len();
        let top = similarity_scores.iter().copied().fold(0.0, f64::max);
        let avg = if count == 0 {
            0.0
        } else {
            similarity_scores.iter().sum::<f64>() / count as f64
        };
        Self {
            similar_ideas_count: count,
            top_similarity_score: top,
            avg_similarity_score: avg,
            similarity_scores,
            retrieval_time_ms,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    pub search_performed: bool,
    pub queries_count: usize,
    pub results_found: usize,
    pub search_time_ms: f64,
}

/// Relative weight of each agent in the overall confidence.
fn agent_weight(agent_name: &str) -> f64 {
    match agent_name {
        "Planner" => 0.10,
        "Market Intelligence Analyst" => 0.40,
        "Financial Strategist" => 0.25,
        "GTM Strategist" => 0.10,
        "Success Probability Analyst" => 0.10,
        "Critic" => 0.05,
        _ => 0.10,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMetricsSummary {
    pub agent: String,
    pub tokens: usize,
    pub execution_time_ms: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSummary {
    pub similar_ideas_count: usize,
    pub top_similarity: f64,
    pub avg_similarity: f64,
    pub retrieval_time_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSummary {
    pub search_performed: bool,
    pub queries_count: usize,
    pub results_found: usize,
    pub search_time_ms: f64,
}

/// Serializable per-run aggregate returned with the analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSummary {
    pub total_tokens: usize,
    pub total_execution_time_ms: f64,
    pub overall_confidence: f64,
    pub hallucination_risk: RiskLevel,
    pub hallucination_flags: Vec<String>,
    pub agent_metrics: Vec<AgentMetricsSummary>,
    pub retrieval_metrics: Option<RetrievalSummary>,
    pub search_metrics: Option<SearchSummary>,
}

/// Collects timing, token and confidence figures for one analysis.
#[derive(Debug)]
pub struct EvaluationTracker {
    started: Option<Instant>,
    total_tokens: usize,
    total_execution_time_ms: f64,
    agent_metrics: Vec<AgentMetrics>,
    retrieval_metrics: Option<RetrievalMetrics>,
    search_metrics: Option<SearchMetrics>,
    overall_confidence: f64,
    hallucination_risk: RiskLevel,
    hallucination_flags: Vec<String>,
}

impl Default for EvaluationTracker {
    fn default() -> Self {
        Self {
            started: None,
            total_tokens: 0,
            total_execution_time_ms: 0.0,
            agent_metrics: Vec::new(),
            retrieval_metrics: None,
            search_metrics: None,
            overall_confidence: 0.0,
            hallucination_risk: RiskLevel::Low,
            hallucination_flags: Vec::new(),
        }
    }
}

impl EvaluationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(started) = self.started {
            self.total_execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        }
    }

    pub fn add_agent_metrics(
        &mut self,
        agent_name: impl Into<String>,
        tokens: usize,
        execution_time_ms: f64,
        confidence: f64,
    ) {
        self.total_tokens += tokens;
        self.agent_metrics.push(AgentMetrics {
            agent_name: agent_name.into(),
            tokens_used: tokens,
            execution_time_ms,
            confidence_score: confidence,
            timestamp: Utc::now(),
        });
    }

    pub fn set_retrieval_metrics(&mut self, similarity_scores: Vec<f64>, retrieval_time_ms: f64) {
        self.retrieval_metrics = Some(RetrievalMetrics::from_scores(
            similarity_scores,
            retrieval_time_ms,
        ));
    }

    pub fn set_search_metrics(
        &mut self,
        search_performed: bool,
        queries_count: usize,
        results_found: usize,
        search_time_ms: f64,
    ) {
        self.search_metrics = Some(SearchMetrics {
            search_performed,
            queries_count,
            results_found,
            search_time_ms,
        });
    }

    pub fn agent_metrics(&self) -> &[AgentMetrics] {
        &self.agent_metrics
    }

    pub fn retrieval_metrics(&self) -> Option<&RetrievalMetrics> {
        self.retrieval_metrics.as_ref()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Highest similarity seen during retrieval, 0.0 when nothing was retrieved.
    pub fn top_similarity(&self) -> f64 {
        self.retrieval_metrics
            .as_ref()
            .map_or(0.0, |r| r.top_similarity_score)
    }

    /// Weighted mean of the recorded agent confidences.
    pub fn calculate_overall_confidence(&mut self) -> f64 {
        let (weighted, total) = self
            .agent_metrics
            .iter()
            .fold((0.0, 0.0), |(sum, total), m| {
                let w = agent_weight(&m.agent_name);
                (sum + m.confidence_score * w, total + w)
            });

        self.overall_confidence = if total > 0.0 { weighted / total } else { 0.0 };
        self.overall_confidence
    }

    /// Score the available grounding signals and record the resulting flags.
    pub fn assess_hallucination_risk(&mut self) -> RiskLevel {
        let mut flags = Vec::new();
        let mut score = 0;

        if let Some(ref search) = self.search_metrics {
            if !search.search_performed {
                flags.push("No web search performed".to_string());
                score += 2;
            } else if search.results_found == 0 {
                flags.push("Web search returned no results".to_string());
                score += 3;
            }
        }

        if let Some(ref retrieval) = self.retrieval_metrics {
            if retrieval.similar_ideas_count == 0 {
                flags.push("No similar ideas found in database".to_string());
                score += 2;
            } else if retrieval.top_similarity_score < 0.3 {
                flags.push(format!(
                    "Low similarity to existing ideas (max: {:.2})",
                    retrieval.top_similarity_score
                ));
                score += 1;
            }
        }

        if self.overall_confidence < 0.5 {
            flags.push(format!(
                "Low overall confidence ({:.2})",
                self.overall_confidence
            ));
            score += 1;
        }

        self.hallucination_risk = RiskLevel::from_score(score);
        self.hallucination_flags = flags;
        self.hallucination_risk
    }

    pub fn summary(&self) -> EvaluationSummary {
        EvaluationSummary {
            total_tokens: self.total_tokens,
            total_execution_time_ms: round_to(self.total_execution_time_ms, 2),
            overall_confidence: round_to(self.overall_confidence, 3),
            hallucination_risk: self.hallucination_risk,
            hallucination_flags: self.hallucination_flags.clone(),
            agent_metrics: self
                .agent_metrics
                .iter()
                .map(|m| AgentMetricsSummary {
                    agent: m.agent_name.clone(),
                    tokens: m.tokens_used,
                    execution_time_ms: round_to(m.execution_time_ms, 2),
                    confidence: round_to(m.confidence_score, 3),
                })
                .collect(),
            retrieval_metrics: self.retrieval_metrics.as_ref().map(|r| RetrievalSummary {
                similar_ideas_count: r.similar_ideas_count,
                top_similarity: round_to(r.top_similarity_score, 3),
                avg_similarity: round_to(r.avg_similarity_score, 3),
                retrieval_time_ms: round_to(r.retrieval_time_ms, 2),
            }),
            search_metrics: self.search_metrics.as_ref().map(|s| SearchSummary {
                search_performed: s.search_performed,
                queries_count: s.queries_count,
                results_found: s.results_found,
                search_time_ms: round_to(s.search_time_ms, 2),
            }),
        }
    }

    /// Emit the summary as structured log events.
    pub fn log_summary(&self) {
        info!(
            total_tokens = self.total_tokens,
            total_ms = format!("{:.0}", self.total_execution_time_ms),
            overall_confidence = format!("{:.3}", self.overall_confidence),
            risk = %self.hallucination_risk,
            flags = self.hallucination_flags.len(),
            "Evaluation summary"
        );
        for m in &self.agent_metrics {
            info!(
                agent = %m.agent_name,
                tokens = m.tokens_used,
                ms = format!("{:.0}", m.execution_time_ms),
                confidence = format!("{:.3}", m.confidence_score),
                "Agent metrics"
            );
        }
    }
}
