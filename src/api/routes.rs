//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health, index, metrics, opportunities, ready, status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(index))
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Data endpoints
        .route("/api/v1/status", get(status))
        .route("/api/v1/opportunities", get(opportunities))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, filter_and_rank, Category, FilterConfig, NormalizedMarket};
    use crate::market::SAMPLE_COUNT;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn ready_state() -> AppState {
        let state = AppState::new();
        let opps = (0..60)
            .map(|i| {
                analyze(NormalizedMarket {
                    id: format!("m{i}"),
                    question: format!("Question {i}"),
                    slug: None,
                    event_slug: None,
                    category: if i % 3 == 0 { Category::Sports } else { Category::Crypto },
                    yes_price: dec!(0.45),
                    no_price: dec!(0.55),
                    volume: dec!(100000),
                    liquidity: dec!(0),
                    updated_at: None,
                    time_left_ms: 0,
                    market_url: format!("https://polymarket.com/market/m{i}"),
                })
            })
            .collect();
        state
            .publish(filter_and_rank(opps, &FilterConfig::default()).unwrap())
            .await;
        state
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = create_router(AppState::new());

        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_when_not_ready() {
        let app = create_router(AppState::new());

        let (status, _) = get(app, "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_after_publish() {
        let app = create_router(ready_state().await);

        let (status, body) = get_json(app, "/ready").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert!(body["generatedAt"].is_string());
    }

    #[tokio::test]
    async fn status_reports_snapshot() {
        let state = AppState::new();
        state
            .publish(filter_and_rank(Vec::new(), &FilterConfig::default()).unwrap())
            .await;

        let (status, body) = get_json(create_router(state), "/api/v1/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["totalCount"], SAMPLE_COUNT);
        assert_eq!(body["tier"], "synthetic");
        assert!(body["lastError"].is_null());
    }

    #[tokio::test]
    async fn index_is_unavailable_before_first_snapshot() {
        let (status, body) = get(create_router(AppState::new()), "/").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(String::from_utf8(body).unwrap().contains("Loading"));
    }

    #[tokio::test]
    async fn index_renders_dashboard() {
        let (status, body) = get(create_router(ready_state().await), "/").await;

        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("All Categories (60)"));
        assert_eq!(html.matches("<article class=\"card\"").count(), 60);
    }

    #[tokio::test]
    async fn opportunities_are_paged() {
        let app = create_router(ready_state().await);

        let (status, body) = get_json(app, "/api/v1/opportunities?page=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["totalItems"], 60);
        assert_eq!(body["items"].as_array().unwrap().len(), 10);
        assert_eq!(body["categories"]["all"], 60);
        assert_eq!(body["filters"]["minVolume"], serde_json::json!(50000.0));
    }

    #[tokio::test]
    async fn opportunities_filter_by_category() {
        let app = create_router(ready_state().await);

        let (status, body) =
            get_json(app, "/api/v1/opportunities?category=Sports&pageSize=5&page=9").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalItems"], 20);
        assert_eq!(body["page"], 4);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|o| o["category"] == "Sports"));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = create_router(ready_state().await);

        let (status, body) = get_json(app, "/api/v1/opportunities?category=Astrology").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown category");
    }

    #[tokio::test]
    async fn opportunities_unavailable_before_first_snapshot() {
        let (status, _) = get(create_router(AppState::new()), "/api/v1/opportunities").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let (status, _) = get(create_router(AppState::new()), "/metrics").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
