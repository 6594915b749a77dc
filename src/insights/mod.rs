//! AI insights engine
//!
//! Turns transcripts, financial snapshots and company metadata into structured
//! sales and audit intelligence by prompting an LLM in JSON mode. Every
//! operation is single-shot. A failed or unusable completion yields the
//! hardcoded fallback for that shape, wrapped in [`Insight::Fallback`] so
//! callers can tell placeholder content from real inference.

pub mod engine;
pub mod fallback;
pub mod handlers;
pub mod prompts;
pub mod storage;
pub mod types;
pub mod validate;

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use engine::{FullAnalysis, InsightsEngine};
pub use types::*;
pub use validate::{
    validate_audit_deck_intelligence, validate_business_insights, validate_closing_strategies,
    validate_financial_intelligence, validate_talking_points, validate_transcript_analysis,
};

/// Why a live analysis was replaced by its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The provider call failed (network, HTTP status, missing key).
    Provider(String),
    /// The completion was not parseable JSON.
    MalformedJson(String),
    /// The completion parsed but was not a JSON object.
    NotAnObject,
    /// Reloaded from a stored envelope; carries the original message.
    Stored(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(msg) => write!(f, "provider error: {msg}"),
            Self::MalformedJson(msg) => write!(f, "malformed JSON: {msg}"),
            Self::NotAnObject => write!(f, "response was not a JSON object"),
            Self::Stored(msg) => f.write_str(msg),
        }
    }
}

/// Outcome of one engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Insight<T> {
    Inferred(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Insight<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Inferred(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Inferred(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Self::Inferred(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn source(&self) -> InsightSource {
        if self.is_fallback() {
            InsightSource::Fallback
        } else {
            InsightSource::Inferred
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Inferred,
    Fallback,
}

impl InsightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inferred => "inferred",
            Self::Fallback => "fallback",
        }
    }
}

/// Wire shape of an [`Insight`]: `{"source", "fallback_reason", "data"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightEnvelope<T> {
    pub source: InsightSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub data: T,
}

impl<T> From<Insight<T>> for InsightEnvelope<T> {
    fn from(insight: Insight<T>) -> Self {
        let source = insight.source();
        let fallback_reason = insight.fallback_reason().map(ToString::to_string);
        Self {
            source,
            fallback_reason,
            data: insight.into_value(),
        }
    }
}

impl<T> From<InsightEnvelope<T>> for Insight<T> {
    fn from(envelope: InsightEnvelope<T>) -> Self {
        match envelope.source {
            InsightSource::Inferred => Self::Inferred(envelope.data),
            InsightSource::Fallback => Self::Fallback {
                value: envelope.data,
                reason: FallbackReason::Stored(envelope.fallback_reason.unwrap_or_default()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    TranscriptAnalysis,
    FinancialIntelligence,
    BusinessInsights,
    AuditDeckIntelligence,
    TalkingPoints,
    ClosingStrategies,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TranscriptAnalysis => "transcript_analysis",
            Self::FinancialIntelligence => "financial_intelligence",
            Self::BusinessInsights => "business_insights",
            Self::AuditDeckIntelligence => "audit_deck_intelligence",
            Self::TalkingPoints => "talking_points",
            Self::ClosingStrategies => "closing_strategies",
        }
    }

    /// Sampling temperature used for each kind of prompt.
    pub fn temperature(&self) -> f32 {
        match self {
            Self::FinancialIntelligence => 0.2,
            Self::TranscriptAnalysis | Self::AuditDeckIntelligence => 0.3,
            Self::BusinessInsights => 0.4,
            Self::TalkingPoints => 0.5,
            Self::ClosingStrategies => 0.6,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn configure_insights_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/insights/{company_id}", post(handlers::handle_generate_insights))
        .route(
            "/api/insights/{company_id}/history",
            get(handlers::handle_list_analyses),
        )
}
