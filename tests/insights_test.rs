use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use ledgr::financials::FinancialSnapshot;
use ledgr::insights::{fallback, CompanyProfile, FallbackReason, InsightSource, InsightsEngine};
use ledgr::llm::OpenAIClient;

fn snapshot() -> FinancialSnapshot {
    FinancialSnapshot {
        id: Uuid::new_v4(),
        company_id: "realm-42".to_string(),
        revenue: 1_200_000.0,
        expenses: 1_110_000.0,
        net_income: 90_000.0,
        total_assets: 900_000.0,
        total_liabilities: 300_000.0,
        total_equity: 600_000.0,
        profit_margin: 7.5,
        debt_to_equity: 0.5,
        raw_reports: serde_json::Value::Null,
        created_at: Utc::now(),
    }
}

fn completion(content: &serde_json::Value) -> String {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content.to_string() } }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 80 }
    })
    .to_string()
}

fn engine_for(url: String, key: &str) -> InsightsEngine {
    InsightsEngine::new(Arc::new(OpenAIClient::new(key.to_string(), Some(url))))
}

#[tokio::test]
async fn test_financial_analysis_through_openai_client() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJson(json!({
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(&json!({
            "health_score": 142,
            "summary": "Thin margins, healthy leverage",
            "opportunities": ["Tighten job costing"]
        })))
        .expect(1)
        .create_async()
        .await;

    let engine = engine_for(server.url(), "sk-test");
    let insight = engine
        .analyze_financial_data(&snapshot(), &CompanyProfile::named("Harbor Freight Co"))
        .await;

    assert!(!insight.is_fallback());
    assert_eq!(insight.value().health_score, 100);
    assert_eq!(insight.value().summary, "Thin margins, healthy leverage");
    assert!(insight.value().risk_areas.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_yields_flagged_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .expect(1)
        .create_async()
        .await;

    let engine = engine_for(server.url(), "sk-test");
    let insight = engine
        .analyze_call_transcript("Rep: how do you close the month?", "Harbor Freight Co")
        .await;

    assert!(insight.is_fallback());
    assert!(matches!(insight.fallback_reason(), Some(FallbackReason::Provider(_))));
    assert_eq!(
        insight.value(),
        &fallback::transcript_analysis("Harbor Freight Co")
    );
}

#[tokio::test]
async fn test_missing_api_key_never_calls_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let engine = engine_for(server.url(), "");
    let analysis = engine
        .run_full_analysis(None, &snapshot(), &CompanyProfile::named("Harbor Freight Co"))
        .await;

    assert_eq!(analysis.financial_intelligence.source, InsightSource::Fallback);
    assert_eq!(analysis.closing_strategies.source, InsightSource::Fallback);
    assert!(analysis
        .business_insights
        .fallback_reason
        .as_deref()
        .is_some_and(|r| r.contains("not configured")));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_prose_response_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            json!({ "choices": [{ "message": { "content": "Sorry, I can't do that." } }] })
                .to_string(),
        )
        .create_async()
        .await;

    let engine = engine_for(server.url(), "sk-test");
    let insight = engine
        .analyze_financial_data(&snapshot(), &CompanyProfile::named("Harbor Freight Co"))
        .await;

    assert!(matches!(
        insight.fallback_reason(),
        Some(FallbackReason::MalformedJson(_))
    ));
}
