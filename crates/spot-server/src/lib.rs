//! HTTP server for Spot.
//!
//! Exposes the garage catalog as a REST API, accepts occupancy batches from
//! spot sensors, and serves a control endpoint for graceful shutdown.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{RegistrySettings, ServerConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use server::SpotServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use spot_registry::{GarageRegistry, RegistryConfig};
    use spot_store::InMemoryGarageStore;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn server() -> (SpotServer, Arc<InMemoryGarageStore>) {
        let store = Arc::new(InMemoryGarageStore::new());
        let registry = Arc::new(GarageRegistry::new(store.clone(), RegistryConfig::default()));
        (SpotServer::with_registry(ServerConfig::default(), registry), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn create_garage(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/v1/garages",
            Some(json!({"name": "Central", "city": "Belgrade", "address": "Main 1",
                        "geolocation": {"longitude": 20.46, "latitude": 44.81}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json_body(&body)["id"].as_str().unwrap().to_string()
    }

    async fn create_section(app: &Router, id: &str, name: &str, total: u32) {
        let (status, _) = send(
            app,
            Method::POST,
            &format!("/v1/garages/{id}/sections"),
            Some(json!({"name": name, "level": "-1", "total_spots": total})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (server, _) = server();
        let (status, body) = send(&server.router(), Method::GET, "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["status"], "ok");
    }

    #[tokio::test]
    async fn garage_lifecycle() {
        let (server, _) = server();
        let app = server.router();
        let id = create_garage(&app).await;
        assert_eq!(id.len(), 8);

        let (status, body) = send(&app, Method::GET, "/v1/garages", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = json_body(&body);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["free_spots"], 0);

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/v1/garages/{id}"),
            Some(json!({"city": "Novi Sad"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let view = json_body(&body);
        assert_eq!(view["city"], "Novi Sad");
        assert_eq!(view["name"], "Central");

        let (status, _) = send(&app, Method::DELETE, &format!("/v1/garages/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &format!("/v1/garages/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let (server, _) = server();
        let (status, _) = send(&server.router(), Method::GET, "/v1/garages/not-an-id", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request() {
        let (server, _) = server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/garages")
                    .body(Body::from("{oops"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn section_validation_and_conflicts() {
        let (server, _) = server();
        let app = server.router();
        let id = create_garage(&app).await;
        create_section(&app, &id, "A1", 10).await;

        let uri = format!("/v1/garages/{id}/sections");
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({"name": "A-1", "total_spots": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({"name": "B1", "total_spots": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({"name": "A1", "total_spots": 3}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn actions_update_and_disconnect() {
        let (server, _) = server();
        let app = server.router();
        let id = create_garage(&app).await;
        create_section(&app, &id, "A1", 10).await;
        let actions = format!("/v1/garages/{id}/sections/A1/actions");

        let params: Vec<Value> = (1..=10)
            .map(|n| json!({"number": n, "label": format!("S{n}"), "taken": false}))
            .collect();
        let (status, _) = send(&app, Method::POST, &actions, Some(json!({"action": "update", "params": params}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, &format!("/v1/garages/{id}/sections/A1"), None).await;
        assert_eq!(json_body(&body)["free_spots"], 10);
        let (_, body) = send(&app, Method::GET, &format!("/v1/garages/{id}"), None).await;
        assert_eq!(json_body(&body)["free_spots"], 10);

        let params: Vec<Value> = (1..=10).map(|n| json!({"number": n})).collect();
        let (status, _) = send(&app, Method::POST, &actions, Some(json!({"action": "disconnect", "params": params}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, &format!("/v1/garages/{id}/sections/A1/spots"), None).await;
        let spots = json_body(&body);
        assert_eq!(spots.as_array().unwrap().len(), 10);
        assert!(spots.as_array().unwrap().iter().all(|s| s["online"] == false));
    }

    #[tokio::test]
    async fn invalid_positions_are_reported_but_valid_ones_apply() {
        let (server, _) = server();
        let app = server.router();
        let id = create_garage(&app).await;
        create_section(&app, &id, "A1", 10).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/garages/{id}/sections/A1/actions"),
            Some(json!({"action": "update", "params": [
                {"number": 3, "taken": false},
                {"number": 999, "taken": false}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("999 is not a valid spot number for section 'A1', garage 'Central'"));

        let (_, body) = send(&app, Method::GET, &format!("/v1/garages/{id}/sections/A1"), None).await;
        assert_eq!(json_body(&body)["free_spots"], 1);
    }

    #[tokio::test]
    async fn unknown_action_is_not_found() {
        let (server, _) = server();
        let app = server.router();
        let id = create_garage(&app).await;
        create_section(&app, &id, "A1", 2).await;
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/v1/garages/{id}/sections/A1/actions"),
            Some(json!({"action": "reboot"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let (server, store) = server();
        store.set_failing(true);
        let (status, body) = send(&server.router(), Method::POST, "/v1/garages", Some(json!({"name": "X"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Internal Server Error");
    }

    #[tokio::test]
    async fn control_shutdown() {
        let (server, _) = server();
        let app = server.router();
        let state = server.state();
        assert!(!state.shutdown_requested());

        let (status, _) = send(&app, Method::POST, "/v1/control", Some(json!({"action": "restart"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!state.shutdown_requested());

        let (status, _) = send(&app, Method::POST, "/v1/control", Some(json!({"action": "shutdown"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.shutdown_requested());
    }

    #[tokio::test]
    async fn cors_header_on_lists() {
        let (server, _) = server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/v1/garages")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
