//! HTTP route handlers for the API.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ideaforge_common::{IdeaForgeError, SimilarIdea, StoredIdea};
use ideaforge_orchestrator::FeasibilityResponse;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::AppState;

/// Shortest idea the analysis endpoint accepts, in characters.
pub const MIN_IDEA_CHARS: usize = 10;

/// Largest neighbour count the lookup endpoint serves.
pub const MAX_SIMILAR_TOP_K: usize = 50;

/// Service info returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub health: &'static str,
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} API", state.server.app_name),
        version: state.server.app_version.clone(),
        health: "/health",
    })
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database_connected: bool,
    pub uptime_seconds: u64,
}

/// Healthy iff the idea store answers; otherwise degraded, never an error.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database_connected = state.retriever.health_check().await;
    if !database_connected {
        debug!("Idea store unreachable, reporting degraded");
    }

    Json(HealthResponse {
        status: (if database_connected { "healthy" } else { "degraded" }).into(),
        version: state.server.app_version.clone(),
        database_connected,
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            status,
        }
    }

    /// Map a pipeline or store error. Validation and lookup misses keep
    /// their own status; anything else is a 500 under `code`.
    fn from_error(err: IdeaForgeError, code: &'static str, context: &str) -> Self {
        match err {
            IdeaForgeError::Validation(msg) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg)
            }
            IdeaForgeError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            other => {
                error!(error = %other, external = other.is_external(), "{context}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    format!("{context}: {other}"),
                )
            }
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Analysis request body.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub idea: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub target_market: Option<String>,
}

impl AnalyzeRequest {
    fn validate(&self) -> ideaforge_common::Result<()> {
        let chars = self.idea.trim().chars().count();
        if chars < MIN_IDEA_CHARS {
            return Err(IdeaForgeError::Validation(format!(
                "idea must be at least {MIN_IDEA_CHARS} characters (got {chars})"
            )));
        }
        Ok(())
    }
}

/// Run the full analysis pipeline for one idea.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<FeasibilityResponse>, ErrorResponse> {
    let Json(request) = payload.map_err(|rejection| {
        // Syntax errors stay 400; everything else is a 422
        let status = match rejection.status() {
            StatusCode::BAD_REQUEST => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ErrorResponse::new(status, "VALIDATION_ERROR", rejection.body_text())
    })?;
    request
        .validate()
        .map_err(|e| ErrorResponse::from_error(e, "VALIDATION_ERROR", "Invalid request"))?;

    info!(
        idea_preview = %request.idea.chars().take(50).collect::<String>(),
        industry = ?request.industry,
        target_market = ?request.target_market,
        "Received analysis request"
    );

    let response = state
        .orchestrator
        .analyze(&request.idea, request.industry, request.target_market)
        .await
        .map_err(|e| ErrorResponse::from_error(e, "ANALYSIS_ERROR", "Analysis failed"))?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl SimilarQuery {
    fn validate(&self) -> ideaforge_common::Result<()> {
        if self.top_k > MAX_SIMILAR_TOP_K {
            return Err(IdeaForgeError::Validation(format!(
                "top_k must be at most {MAX_SIMILAR_TOP_K} (got {})",
                self.top_k
            )));
        }
        Ok(())
    }
}

/// A stored idea with its nearest neighbours.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarIdeasResponse {
    pub idea: StoredIdea,
    pub similar_ideas: Vec<SimilarIdea>,
}

/// Look up a stored idea and the ideas closest to it, excluding itself.
pub async fn similar_ideas(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<SimilarIdeasResponse>, ErrorResponse> {
    debug!(id, top_k = query.top_k, "Looking up similar ideas");

    lookup_similar(&state, id, &query)
        .await
        .map(Json)
        .map_err(|e| {
            ErrorResponse::from_error(e, "RETRIEVAL_ERROR", "Failed to retrieve similar ideas")
        })
}

async fn lookup_similar(
    state: &AppState,
    id: i64,
    query: &SimilarQuery,
) -> ideaforge_common::Result<SimilarIdeasResponse> {
    query.validate()?;

    let stored = state
        .retriever
        .get_idea(id)
        .await?
        .ok_or_else(|| IdeaForgeError::NotFound(format!("Idea with ID {id} not found")))?;

    // One extra neighbour since the stored idea matches itself
    let similar = state
        .retriever
        .retrieve_similar_k(&stored.idea, query.top_k.saturating_add(1))
        .await?
        .into_iter()
        .filter(|s| s.id != stored.id)
        .take(query.top_k)
        .collect();

    Ok(SimilarIdeasResponse {
        idea: stored,
        similar_ideas: similar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(idea: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            idea: idea.into(),
            industry: None,
            target_market: None,
        }
    }

    #[test]
    fn test_short_idea_is_rejected() {
        let err = request("dog app").validate().unwrap_err();
        let response = ErrorResponse::from_error(err, "ANALYSIS_ERROR", "Analysis failed");
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.code, "VALIDATION_ERROR");
        assert!(response.error.starts_with("idea must be at least 10"));
    }

    #[test]
    fn test_top_k_is_capped() {
        assert!(SimilarQuery { top_k: MAX_SIMILAR_TOP_K }.validate().is_ok());
        assert!(SimilarQuery { top_k: usize::MAX }.validate().is_err());
    }

    #[test]
    fn test_error_mapping_by_kind() {
        let missing = ErrorResponse::from_error(
            IdeaForgeError::NotFound("Idea with ID 9 not found".into()),
            "RETRIEVAL_ERROR",
            "Failed to retrieve similar ideas",
        );
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.code, "NOT_FOUND");
        assert_eq!(missing.error, "Idea with ID 9 not found");

        let store = ErrorResponse::from_error(
            IdeaForgeError::Store("connection refused".into()),
            "RETRIEVAL_ERROR",
            "Failed to retrieve similar ideas",
        );
        assert_eq!(store.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.code, "RETRIEVAL_ERROR");
        assert_eq!(
            store.error,
            "Failed to retrieve similar ideas: Store error: connection refused"
        );
    }

    #[test]
    fn test_padding_does_not_count_towards_length() {
        assert!(request("   dog app    ").validate().is_err());
        assert!(request("dog walking app").validate().is_ok());
    }

    #[test]
    fn test_analyze_request_hints_are_optional() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"idea": "on-demand dog walking app"}"#).unwrap();
        assert!(request.industry.is_none());
        assert!(request.target_market.is_none());
    }

    #[test]
    fn test_error_body_omits_status() {
        let err = ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "ANALYSIS_ERROR", "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom", "code": "ANALYSIS_ERROR"}));
    }
}
