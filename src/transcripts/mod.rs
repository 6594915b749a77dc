//! Call transcripts: upload, browse and AI analysis.

pub mod handlers;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::state::AppState;
use crate::insights::{InsightEnvelope, TranscriptAnalysis};

use storage::DbCallTranscript;

/// Uploads larger than this are rejected.
pub const MAX_TRANSCRIPT_BYTES: usize = 2 * 1024 * 1024;

/// Request body cap for the transcript routes: the largest transcript plus
/// room for JSON escaping and metadata.
pub const MAX_UPLOAD_BODY_BYTES: usize = 2 * MAX_TRANSCRIPT_BYTES + 64 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTranscript {
    pub id: Uuid,
    pub company_id: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub participants: Vec<String>,
    pub call_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub analysis: Option<InsightEnvelope<TranscriptAnalysis>>,
    pub sales_score: Option<i32>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CallTranscript {
    pub fn from_db(row: DbCallTranscript, include_content: bool) -> Self {
        let analysis = row.analysis_envelope();
        Self {
            id: row.id,
            company_id: row.company_id,
            file_name: row.file_name,
            file_type: row.file_type,
            file_size: row.file_size,
            participants: row.participants,
            call_date: row.call_date,
            content: include_content.then_some(row.content),
            analysis,
            sales_score: row.sales_score,
            analyzed_at: row.analyzed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadTranscriptRequest {
    pub company_id: String,
    pub file_name: String,
    pub file_type: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    pub call_date: Option<DateTime<Utc>>,
    pub content: String,
}

impl UploadTranscriptRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.company_id.trim().is_empty() {
            return Err("company_id is required".to_string());
        }
        if self.file_name.trim().is_empty() {
            return Err("file_name is required".to_string());
        }
        if self.content.trim().is_empty() {
            return Err("transcript content is empty".to_string());
        }
        if self.content.len() > MAX_TRANSCRIPT_BYTES {
            return Err(format!(
                "transcript exceeds {} bytes",
                MAX_TRANSCRIPT_BYTES
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTranscriptsQuery {
    pub company_id: Option<String>,
    pub limit: Option<i64>,
}

pub fn configure_transcripts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/transcripts",
            get(handlers::handle_list_transcripts).post(handlers::handle_upload_transcript),
        )
        .route(
            "/api/transcripts/{id}",
            get(handlers::handle_get_transcript).delete(handlers::handle_delete_transcript),
        )
        .route(
            "/api/transcripts/{id}/analyze",
            post(handlers::handle_analyze_transcript),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str) -> UploadTranscriptRequest {
        UploadTranscriptRequest {
            company_id: "realm-1".into(),
            file_name: "discovery.txt".into(),
            file_type: Some("text/plain".into()),
            participants: vec!["Dana".into(), "Sam".into()],
            call_date: None,
            content: content.into(),
        }
    }

    #[test]
    fn test_upload_validation() {
        assert!(request("Dana: our close takes three weeks.").validate().is_ok());
        assert!(request("   ").validate().is_err());

        let mut missing_company = request("hello");
        missing_company.company_id.clear();
        assert_eq!(
            missing_company.validate().unwrap_err(),
            "company_id is required"
        );

        let oversized = request(&"x".repeat(MAX_TRANSCRIPT_BYTES + 1));
        assert!(oversized.validate().is_err());
    }

    #[tokio::test]
    async fn test_oversized_transcript_reaches_validation() {
        use crate::core::shared::test_utils::test_app_state;
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let body = serde_json::json!({
            "company_id": "realm-1",
            "file_name": "all-hands.txt",
            "content": "x".repeat(MAX_TRANSCRIPT_BYTES + 1),
        })
        .to_string();
        assert!(body.len() > MAX_TRANSCRIPT_BYTES);

        let app = configure_transcripts_routes().with_state(test_app_state());
        let response = app
            .oneshot(
                Request::post("/api/transcripts")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value["error"],
            format!("transcript exceeds {MAX_TRANSCRIPT_BYTES} bytes")
        );
    }

    #[test]
    fn test_list_view_omits_content() {
        let row = DbCallTranscript {
            id: Uuid::new_v4(),
            company_id: "realm-1".into(),
            file_name: "call.txt".into(),
            file_type: None,
            file_size: Some(5),
            participants: vec![],
            call_date: None,
            content: "hello".into(),
            analysis: Some(serde_json::json!({"unexpected": true})),
            sales_score: None,
            analyzed_at: None,
            created_at: Utc::now(),
        };
        let summary = CallTranscript::from_db(row.clone(), false);
        assert!(summary.content.is_none());
        assert!(summary.analysis.is_none());

        let full = CallTranscript::from_db(row, true);
        assert_eq!(full.content.as_deref(), Some("hello"));
    }
}
