//! Chatroom HTTP API
//!
//! HTTP layer in front of the chat core, built with Axum. It validates
//! requests, resolves rooms through the registry and upgrades connections;
//! everything concurrent lives in [`crate::chat`].
//!
//! # Endpoints
//!
//! ## Rooms
//! - `GET /api/v1/rooms` - List all rooms
//! - `POST /api/v1/rooms` - Create a room
//! - `GET /api/v1/rooms/:name` - Get a room and its members
//! - `DELETE /api/v1/rooms/:name` - Close a room
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws?room=<name>&nick=<nickname>` - Join a room
//!
//! # Example
//!
//! ```rust,ignore
//! use chatroom::api::{serve, AppState};
//! use chatroom::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::initialize(Config::default()).await?;
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    let api_routes = Router::new()
        .route("/rooms", get(routes::rooms::list_rooms))
        .route("/rooms", post(routes::rooms::create_room))
        .route("/rooms/:name", get(routes::rooms::get_room))
        .route("/rooms/:name", delete(routes::rooms::delete_room));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Start the API server
///
/// On Ctrl+C or SIGTERM every room is closed, which ends all sessions, and
/// the server then drains remaining HTTP connections.
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.server.addr();
    let registry = Arc::clone(&state.registry);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Chatroom API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            registry.shutdown().await;
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Chatroom API shut down gracefully");
    Ok(())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, closing rooms");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn create_test_app() -> (Router, Arc<crate::chat::RoomRegistry>) {
        let state = AppState::initialize(Config::default()).await.unwrap();
        let registry = Arc::clone(&state.registry);
        (build_router(state), registry)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_room_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/rooms")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["rooms"], 1);
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_list_rooms_has_default() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(get("/api/v1/rooms")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["default_room"], "general");
        assert_eq!(body["total"], 1);
        assert_eq!(body["rooms"][0]["name"], "general");
        assert_eq!(body["rooms"][0]["capacity"], 100);
        assert_eq!(body["rooms"][0]["members"], 0);
    }

    #[tokio::test]
    async fn test_create_room() {
        let (app, registry) = create_test_app().await;
        let response = app
            .oneshot(create_room_request(r#"{"name": "  rust ", "capacity": 5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "rust");
        assert_eq!(registry.lookup_room("rust").await.unwrap().capacity(), 5);
    }

    #[tokio::test]
    async fn test_create_duplicate_room_conflict() {
        let (app, _registry) = create_test_app().await;
        let response = app
            .oneshot(create_room_request(r#"{"name": "general", "capacity": 5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_create_room_validation() {
        let (app, _registry) = create_test_app().await;

        for body in [
            r#"{"name": "   ", "capacity": 5}"#,
            r#"{"name": "rust", "capacity": 0}"#,
            r#"{"name": "rust", "capacity": -3}"#,
            r#"{"name": "a/../rust", "capacity": 5}"#,
            r#"{"name": "..", "capacity": 5}"#,
        ] {
            let response = app
                .clone()
                .oneshot(create_room_request(body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_room_name_with_reserved_characters() {
        let (app, registry) = create_test_app().await;
        let response = app
            .clone()
            .oneshot(create_room_request(r#"{"name": "c#", "capacity": 5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(registry.lookup_room("c#").await.is_ok());

        let response = app.oneshot(get("/api/v1/rooms/c%23")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "c#");
    }

    #[tokio::test]
    async fn test_create_room_invalid_json() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(create_room_request("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_room() {
        let (app, _registry) = create_test_app().await;

        let response = app.clone().oneshot(get("/api/v1/rooms/general")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["members"], serde_json::json!([]));

        let response = app.oneshot(get("/api/v1/rooms/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_room() {
        let (app, registry) = create_test_app().await;
        let room = registry.create_room("rust", 5).await.unwrap();

        let delete_request = |uri: &str| {
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(delete_request("/api/v1/rooms/rust")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(room.is_closed());

        let response = app.clone().oneshot(delete_request("/api/v1/rooms/rust")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(delete_request("/api/v1/rooms/general")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_unknown_room_rejected() {
        let (app, _registry) = create_test_app().await;
        let response = app
            .oneshot(get("/ws?room=missing&nick=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let (app, _registry) = create_test_app().await;
        let response = app.oneshot(get("/ws?nick=alice")).await.unwrap();

        // Room resolves to the default; the plain GET fails the upgrade instead.
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.status().is_client_error());
    }
}
