//! HTTP routes.

mod chats;
mod knowledge;
mod proxy;
mod search;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        // Ollama passthrough
        .route("/ollama/api/chat", post(proxy::chat))
        .route("/ollama/api/tags", get(proxy::tags))
        // Web search
        .route("/api/search", get(search::search_get))
        .route("/api/web-search", post(search::search_post))
        // Knowledge
        .route("/api/knowledge/search", get(knowledge::search))
        .route("/api/knowledge/learn", post(knowledge::learn))
        // Chats
        .route("/api/chats", get(chats::list))
        .route("/api/chats/:id", get(chats::get_one).delete(chats::delete))
        .route("/api/chats/:id/stop", post(chats::stop))
        .route("/api/chat", post(chats::turn))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (status, body) = send(router(test_state()), get_request("/api/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], "Query parameter \"q\" is required");
    }

    #[tokio::test]
    async fn test_search_get_and_post() {
        let app = router(test_state());
        let (status, body) = send(app.clone(), get_request("/api/search?q=rust")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["results"][0]["title"], "About rust");

        let (status, body) = send(
            app,
            json_request(Method::POST, "/api/web-search", json!({ "query": "tokio" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["results"][0]["snippet"], "tokio explained");
    }

    #[tokio::test]
    async fn test_learn_then_recall() {
        let app = router(test_state());
        let (status, body) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/api/knowledge/learn",
                json!({ "question": "capital of australia", "answer": "Canberra" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["entry"]["answer"], "Canberra");

        let (_, body) = send(
            app,
            get_request("/api/knowledge/search?query=capital%20of%20australia"),
        )
        .await;
        let hits: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(hits[0]["answer"], "Canberra");
    }

    #[tokio::test]
    async fn test_learn_rejects_blank_entry() {
        let (status, _) = send(
            router(test_state()),
            json_request(
                Method::POST,
                "/api/knowledge/learn",
                json!({ "question": " ", "answer": "x" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_proxy_reports_unreachable_ollama() {
        let (status, body) = send(
            router(test_state()),
            json_request(Method::POST, "/ollama/api/chat", json!({ "model": "m" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], "Failed to connect to Ollama");
    }

    #[tokio::test]
    async fn test_turn_streams_events_and_stores_chat() {
        let app = router(test_state());
        let (status, body) = send(
            app.clone(),
            json_request(Method::POST, "/api/chat", json!({ "text": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("event: chat"));
        assert!(body.contains("event: token"));
        assert!(body.contains("event: done"));
        assert!(body.contains("Hello there"));

        let (_, body) = send(app, get_request("/api/chats")).await;
        let groups: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(groups.as_array().unwrap().len(), 4);
        assert_eq!(groups[0]["label"], "Today");
        let chat = &groups[0]["chats"][0];
        assert_eq!(chat["messages"][1]["content"], "Hello there");
    }

    #[tokio::test]
    async fn test_turn_rejects_bad_requests() {
        let app = router(test_state());
        let (status, _) = send(
            app.clone(),
            json_request(Method::POST, "/api/chat", json!({ "text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/api/chat",
                json!({ "chatId": "chat_missing", "text": "hi" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app,
            json_request(
                Method::POST,
                "/api/chat",
                json!({ "text": "hi", "settings": { "temperature": 9.0 } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_chat_routes() {
        let app = router(test_state());
        let (status, _) = send(app.clone(), get_request("/api/chats/chat_nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/api/chats/chat_nope")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), delete).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            app,
            json_request(Method::POST, "/api/chats/chat_nope/stop", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"stopped\":false"));
    }
}
