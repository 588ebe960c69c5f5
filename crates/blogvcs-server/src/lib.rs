//! HTTP server for blogvcs.
//!
//! Serves the JSON API used by the editor: save a version, list a post's
//! history, fetch a single version, compare two versions as inline markup,
//! revert, and list posts. Every response carries an `ok` flag; failures add
//! a stable `code` and a human-readable `error`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::{AppState, HealthResponse};
pub use server::BlogServer;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use blogvcs_service::VersionControl;
    use blogvcs_store::InMemoryVersionStore;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        let service = VersionControl::new(Arc::new(InMemoryVersionStore::new()));
        router::build_router(AppState::new(service))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    fn str_field<'a>(body: &'a Value, pointer: &str) -> &'a str {
        body.pointer(pointer).and_then(Value::as_str).unwrap()
    }

    // -----------------------------------------------------------------------
    // Service endpoints
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = get(&app(), "/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (status, body) = get(&app(), "/v1/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "blogvcs-server");
        assert_eq!(body["diff"]["granularity"], "char");
    }

    // -----------------------------------------------------------------------
    // Version API
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_compare_revert_flow() {
        let app = app();

        let (status, first) = post(
            &app,
            "/api/save-version",
            json!({ "title": "T1", "content": "<p>A</p>" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["ok"], true);
        let blog_id = str_field(&first, "/blog/id").to_string();
        let v1 = str_field(&first, "/version/id").to_string();

        let (status, second) = post(
            &app,
            "/api/save-version",
            json!({ "blogId": blog_id, "title": "T1", "content": "<p>B</p>" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["blog"]["currentContent"], "<p>B</p>");
        let v2 = str_field(&second, "/version/id").to_string();

        let (status, cmp) = get(&app, &format!("/api/compare-versions?a={v1}&b={v2}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            cmp["diffHtml"],
            "&lt;p&gt;<del class=\"vcs-del\">A</del><ins class=\"vcs-ins\">B</ins>&lt;/p&gt;"
        );
        assert_eq!(cmp["stats"]["editDistance"], 1);

        let (status, reverted) = post(
            &app,
            "/api/revert-version",
            json!({ "blogId": blog_id, "versionId": v1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reverted["blog"]["currentContent"], "<p>A</p>");
        let v3 = str_field(&reverted, "/version/id").to_string();

        let (status, list) = get(&app, &format!("/api/get-versions?blogId={blog_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = list["versions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![v3.as_str(), v2.as_str(), v1.as_str()]);

        let (status, one) = get(&app, &format!("/api/get-version?id={v1}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["version"]["content"], "<p>A</p>");

        let (status, content) = get(&app, "/api/content").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content["posts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_revision_is_conflict() {
        let app = app();
        let (_, first) = post(&app, "/api/save-version", json!({ "title": "t", "content": "a" })).await;
        let blog_id = str_field(&first, "/blog/id").to_string();

        let body = json!({ "blogId": blog_id, "title": "t", "content": "b", "expectedRevision": 1 });
        let (status, _) = post(&app, "/api/save-version", body.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, err) = post(&app, "/api/save-version", body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["ok"], false);
        assert_eq!(err["code"], "conflict");
    }

    #[tokio::test]
    async fn slow_compare_does_not_stall_other_requests() {
        let service = VersionControl::new(Arc::new(InMemoryVersionStore::new()));
        let source: String = (0..200_000).map(|i| char::from(b'a' + (i * 7 % 26) as u8)).collect();
        let target: String = (0..200_000).map(|i| char::from(b'a' + (i * 11 % 26) as u8)).collect();
        let first = service.save_version(None, "big", &source).unwrap();
        let second = service
            .save_version(Some(&first.document.id), "big", &target)
            .unwrap();
        let app = router::build_router(AppState::new(service));

        let uri = format!(
            "/api/compare-versions?a={}&b={}",
            first.version.id, second.version.id
        );
        let compare = tokio::spawn({
            let app = app.clone();
            async move { get(&app, &uri).await.0 }
        });
        // Single-threaded runtime: the compare task runs until it yields.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (status, _) = get(&app, "/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!compare.is_finished());
        assert_eq!(compare.await.unwrap(), StatusCode::OK);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_query_parameters_are_bad_requests() {
        let app = app();
        for uri in ["/api/get-versions", "/api/get-version", "/api/compare-versions?a=x"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["ok"], false);
            assert_eq!(body["code"], "invalid_input");
        }
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let (status, body) = get(&app(), "/api/get-version?id=not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let uri = format!("/api/get-version?id={}", blogvcs_types::VersionId::new());
        let (status, body) = get(&app(), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn save_to_unknown_blog_is_not_found() {
        let body = json!({
            "blogId": blogvcs_types::DocumentId::new().to_string(),
            "title": "t",
            "content": "c",
        });
        let (status, _) = post(&app(), "/api/save-version", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_title_is_bad_request() {
        let (status, body) = post(&app(), "/api/save-version", json!({ "content": "c" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");
    }

    #[tokio::test]
    async fn malformed_json_keeps_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/save-version")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn revert_requires_both_ids() {
        let (status, body) = post(&app(), "/api/revert-version", json!({ "blogId": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");
    }
}
