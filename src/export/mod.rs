//! Audit deck exports
//!
//! Every format is rendered from the same slide outline, and the output is a
//! pure function of the deck: identical decks export to identical bytes. The
//! PDF takes its dates and trailer ids from the deck.

pub mod handlers;
pub mod html;
pub mod outline;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pptx;

use axum::{routing::post, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::sanitize_filename;
use crate::reports::AuditDeck;

pub use html::render_html;
pub use outline::{deck_outline, Block, DeckSlide};
#[cfg(feature = "pdf")]
pub use pdf::render_pdf;
pub use pptx::render_pptx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Pptx,
    Html,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Html => "text/html; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
            Self::Html => "html",
        }
    }

    pub fn file_name(self, deck: &AuditDeck) -> String {
        let stem = sanitize_filename(&deck.title);
        let stem = if stem.is_empty() { "audit_deck".to_string() } else { stem };
        format!("{stem}.{}", self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("{0} export is not enabled in this build")]
    Unsupported(&'static str),
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Unsupported(_) => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub fn render(deck: &AuditDeck, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        #[cfg(feature = "pdf")]
        ExportFormat::Pdf => render_pdf(deck),
        #[cfg(not(feature = "pdf"))]
        ExportFormat::Pdf => Err(ExportError::Unsupported("pdf")),
        ExportFormat::Pptx => render_pptx(deck),
        ExportFormat::Html => Ok(render_html(deck).into_bytes()),
    }
}

pub fn configure_export_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/export/audit-deck",
        post(handlers::handle_export_audit_deck),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::sample_deck;

    #[test]
    fn test_format_parsing() {
        let format: ExportFormat = serde_json::from_str("\"pptx\"").unwrap();
        assert_eq!(format, ExportFormat::Pptx);
        assert!(serde_json::from_str::<ExportFormat>("\"docx\"").is_err());
    }

    #[test]
    fn test_file_name() {
        let mut deck = sample_deck();
        deck.title = "Acme Builders Financial Audit".into();
        assert_eq!(
            ExportFormat::Pdf.file_name(&deck),
            "Acme_Builders_Financial_Audit.pdf"
        );
        deck.title = "***".into();
        assert_eq!(ExportFormat::Html.file_name(&deck), "audit_deck.html");
    }

    #[test]
    fn test_html_render_is_utf8() {
        let deck = sample_deck();
        let bytes = render(&deck, ExportFormat::Html).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), render_html(&deck));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_unsupported_without_feature() {
        let err = render(&sample_deck(), ExportFormat::Pdf).unwrap_err();
        assert_eq!(ApiError::from(err).status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
