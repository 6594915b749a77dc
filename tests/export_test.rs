use chrono::{TimeZone, Utc};
use std::io::{Cursor, Read};
use uuid::Uuid;

use ledgr::export::{render, render_html, render_pptx, ExportFormat};
use ledgr::financials::FinancialSnapshot;
use ledgr::insights::{fallback, CompanyProfile, FallbackReason, Insight};
use ledgr::reports::{build_audit_deck, AuditDeck};

fn deck(intelligence_failed: bool) -> AuditDeck {
    let generated_at = Utc.with_ymd_and_hms(2026, 5, 14, 9, 0, 0).unwrap();
    let snapshot = FinancialSnapshot {
        id: Uuid::nil(),
        company_id: "realm-7".to_string(),
        revenue: 2_400_000.0,
        expenses: 2_310_000.0,
        net_income: 90_000.0,
        total_assets: 1_100_000.0,
        total_liabilities: 700_000.0,
        total_equity: 400_000.0,
        profit_margin: 3.75,
        debt_to_equity: 1.75,
        raw_reports: serde_json::Value::Null,
        created_at: generated_at,
    };
    let profile = CompanyProfile {
        company_id: Some("realm-7".to_string()),
        ..CompanyProfile::named("Northwind & Daughters")
    };
    let intel = fallback::audit_deck_intelligence("Northwind & Daughters");
    let intelligence = if intelligence_failed {
        Insight::Fallback {
            value: intel,
            reason: FallbackReason::NotAnObject,
        }
    } else {
        Insight::Inferred(intel)
    };
    let transcript = fallback::transcript_analysis("Northwind & Daughters");

    build_audit_deck(&profile, &snapshot, Some(&transcript), &intelligence, generated_at)
}

#[test]
fn test_pptx_is_byte_identical_for_identical_decks() {
    let first = render_pptx(&deck(false)).unwrap();
    let second = render_pptx(&deck(false)).unwrap();
    assert_eq!(first, second);

    let mut archive = zip::ZipArchive::new(Cursor::new(first)).unwrap();
    let mut core = String::new();
    archive
        .by_name("docProps/core.xml")
        .unwrap()
        .read_to_string(&mut core)
        .unwrap();
    assert!(core.contains("<dc:title>Northwind &amp; Daughters Financial Audit</dc:title>"));
    assert!(core.contains("2026-05-14T09:00:00Z"));
}

#[test]
fn test_html_is_byte_identical_for_identical_decks() {
    assert_eq!(render_html(&deck(false)), render_html(&deck(false)));
    assert_eq!(
        render(&deck(true), ExportFormat::Html).unwrap(),
        render(&deck(true), ExportFormat::Html).unwrap()
    );
}

#[test]
fn test_fallback_deck_differs_from_inferred() {
    assert_ne!(render_html(&deck(false)), render_html(&deck(true)));
    assert_ne!(
        render_pptx(&deck(false)).unwrap(),
        render_pptx(&deck(true)).unwrap()
    );
}

#[cfg(feature = "pdf")]
#[test]
fn test_pdf_is_identical_for_identical_decks() {
    let first = render(&deck(false), ExportFormat::Pdf).unwrap();
    let second = render(&deck(false), ExportFormat::Pdf).unwrap();
    assert!(first.starts_with(b"%PDF-"));
    assert_eq!(first, second);
    assert_ne!(first, render(&deck(true), ExportFormat::Pdf).unwrap());
}

#[test]
fn test_content_types() {
    assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
    assert_eq!(
        ExportFormat::Pptx.content_type(),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
    assert_eq!(ExportFormat::Html.extension(), "html");
}
