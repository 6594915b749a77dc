//! HTTP server initialization and routing

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;

use super::{health_check, health_check_simple, shutdown_signal};

fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Every API route, bound to the shared state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check_simple))
        .merge(crate::prospects::configure_prospects_routes())
        .merge(crate::quickbooks::configure_quickbooks_routes())
        .merge(crate::financials::configure_financials_routes())
        .merge(crate::transcripts::configure_transcripts_routes())
        .merge(crate::insights::configure_insights_routes())
        .merge(crate::reports::configure_reports_routes())
        .merge(crate::export::configure_export_routes())
        .merge(crate::activities::configure_activities_routes())
        .merge(crate::benchmarks::configure_benchmarks_routes());

    let cors = create_cors_layer(&app_state.config.server.cors_origins);

    api_router.with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let server = &app_state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let app = build_router(app_state.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {addr}: {e} - is another instance running?");
            return Err(e);
        }
    };
    info!("HTTP server listening on {addr}");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::test_app_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz_route() {
        let app = build_router(test_app_state());
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "ledgr");
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let app = build_router(test_app_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["database"], false);
        assert_eq!(value["llm_model"], "mock");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_app_state());
        let response = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_requires_deck_or_report() {
        let app = build_router(test_app_state());
        let response = app
            .oneshot(
                Request::post("/api/export/audit-deck")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"format":"html"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_inline_deck_as_html() {
        let deck = crate::core::shared::test_utils::sample_deck();
        let body = serde_json::json!({ "deck": deck, "format": "html" }).to_string();
        let app = build_router(test_app_state());
        let response = app
            .oneshot(
                Request::post("/api/export/audit-deck")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"Acme_Builders_Financial_Audit.html\""
        );
    }
}
