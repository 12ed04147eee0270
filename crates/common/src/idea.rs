//! Persisted ideas and retrieval results.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An idea with its report as persisted in the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIdea {
    pub id: i64,
    pub idea: String,
    /// Report blob. Older rows may predate the current report shape, so it
    /// stays untyped here.
    pub report: serde_json::Value,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 as well as the offset-less form PostgREST emits for
/// `TIMESTAMP` columns, which is read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

/// A prior analysis returned by nearest-neighbour search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarIdea {
    pub id: i64,
    pub idea: String,
    #[serde(default)]
    pub report: serde_json::Value,
    /// Cosine similarity in `[0, 1]`.
    pub similarity: f64,
}

impl SimilarIdea {
    /// Read a string field out of the report blob.
    pub fn report_str(&self, field: &str) -> Option<&str> {
        self.report.get(field).and_then(|v| v.as_str())
    }

    /// Success probability recorded in the report blob, if any.
    pub fn report_probability(&self) -> Option<f64> {
        self.report.get("success_probability").and_then(|v| v.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_accessors_tolerate_missing_fields() {
        let idea = SimilarIdea {
            id: 7,
            idea: "Meal kits for students".into(),
            report: json!({"market_analysis": "Large campus market", "success_probability": 61.0}),
            similarity: 0.82,
        };

        assert_eq!(idea.report_str("market_analysis"), Some("Large campus market"));
        assert_eq!(idea.report_str("revenue_model"), None);
        assert_eq!(idea.report_probability(), Some(61.0));
    }

    #[test]
    fn similar_idea_deserializes_without_report() {
        let idea: SimilarIdea =
            serde_json::from_value(json!({"id": 1, "idea": "x", "similarity": 0.5})).unwrap();
        assert!(idea.report.is_null());
    }

    #[test]
    fn stored_idea_parses_postgrest_timestamp() {
        let idea: StoredIdea = serde_json::from_value(json!({
            "id": 3,
            "idea": "Drone delivery for pharmacies",
            "report": {},
            "created_at": "2025-01-14T09:30:00Z"
        }))
        .unwrap();
        assert!(idea.created_at.is_some());
    }

    #[test]
    fn stored_idea_reads_timestamp_without_offset_as_utc() {
        let idea: StoredIdea = serde_json::from_value(json!({
            "id": 3,
            "idea": "Drone delivery",
            "report": {},
            "created_at": "2025-01-14T09:30:00.123456"
        }))
        .unwrap();
        let created = idea.created_at.unwrap();
        assert_eq!(
            created.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            "2025-01-14 09:30:00.123456"
        );
    }

    #[test]
    fn stored_idea_timestamp_may_be_null_or_absent() {
        let null: StoredIdea = serde_json::from_value(
            json!({"id": 1, "idea": "x", "report": {}, "created_at": null}),
        )
        .unwrap();
        assert!(null.created_at.is_none());

        let absent: StoredIdea =
            serde_json::from_value(json!({"id": 1, "idea": "x", "report": {}})).unwrap();
        assert!(absent.created_at.is_none());
    }

    #[test]
    fn stored_idea_rejects_garbage_timestamp() {
        let parsed = serde_json::from_value::<StoredIdea>(
            json!({"id": 1, "idea": "x", "report": {}, "created_at": "yesterday"}),
        );
        assert!(parsed.is_err());
    }
}
