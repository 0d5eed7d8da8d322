use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{
    app, app_with, canonical_string, compute_signature, content_hash, AppAuthorization, Event,
    CONTENT_HASH_HEADER, DEFAULT_SECRET_KEY,
};
use tower::ServiceExt;

const DATE: &str = "Mon, 15 Jan 2024 10:30:00 GMT";
const FORM: &str = "application/x-www-form-urlencoded";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authorization(secret: &str, method: &str, content_type: &str, hash: &str, uri: &str) -> String {
    let canonical = canonical_string(method, content_type, hash, uri, DATE);
    let signature = compute_signature(secret, &canonical).unwrap();
    format!("APIAuth-HMAC-SHA256 test_tenant:{signature}")
}

fn signed(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::DATE, DATE)
        .header(
            http::header::AUTHORIZATION,
            authorization(DEFAULT_SECRET_KEY, method, "", "", uri),
        )
        .body(String::new())
        .unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    let hash = content_hash(body.as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::DATE, DATE)
        .header(http::header::CONTENT_TYPE, FORM)
        .header(CONTENT_HASH_HEADER, &hash)
        .header(
            http::header::AUTHORIZATION,
            authorization(DEFAULT_SECRET_KEY, method, FORM, &hash, uri),
        )
        .body(body.to_string())
        .unwrap()
}

// --- signature ---

#[tokio::test]
async fn unsigned_request_returns_401_json() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/events/1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn other_tenant_is_rejected() {
    let resp = app_with("someone_else", DEFAULT_SECRET_KEY)
        .oneshot(signed("GET", "/api/v1/users/1/events"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_secret_is_rejected() {
    let resp = app_with("test_tenant", "54321")
        .oneshot(signed("GET", "/api/v1/users/1/events"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_signature_is_rejected() {
    let req = Request::builder()
        .uri("/api/v1/users/1/events")
        .header(http::header::AUTHORIZATION, "APIAuth-HMAC-SHA256 test_tenant:")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signature_covers_full_path_and_query() {
    // Signed for one event, sent to another.
    let mut req = signed("GET", "/api/v1/events/1");
    *req.uri_mut() = "/api/v1/events/2".parse().unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut req = signed("GET", "/api/v1/users/1/events");
    *req.uri_mut() = "/api/v1/users/1/events?date=2024-01-15".parse().unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app()
        .oneshot(signed("GET", "/api/v1/users/1/events?date=2024-01-15"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let mut req = form_request("POST", "/api/v1/users/1/events", "title=test");
    *req.body_mut() = "title=other".to_string();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn body_without_content_hash_is_rejected() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users/1/events")
        .header(http::header::DATE, DATE)
        .header(http::header::CONTENT_TYPE, FORM)
        .header(
            http::header::AUTHORIZATION,
            authorization(DEFAULT_SECRET_KEY, "POST", FORM, "", "/api/v1/users/1/events"),
        )
        .body("title=test".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- authorize ---

#[tokio::test]
async fn authorize_returns_tenant() {
    let resp = app()
        .oneshot(form_request("POST", "/api/v1/app_authorization_requests", "user_id=1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AppAuthorization = body_json(resp).await;
    assert_eq!(auth.user_id, "1");
    assert_eq!(auth.tenant_id, "test_tenant");
}

#[tokio::test]
async fn authorize_without_user_id_returns_422() {
    let resp = app()
        .oneshot(form_request("POST", "/api/v1/app_authorization_requests", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- list ---

#[tokio::test]
async fn list_events_empty() {
    let resp = app()
        .oneshot(signed("GET", "/api/v1/users/1/events"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let events: Vec<Event> = body_json(resp).await;
    assert!(events.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_event_returns_201() {
    let resp = app()
        .oneshot(form_request(
            "POST",
            "/api/v1/users/1/events",
            "title=Team+sync&date=2024-01-15",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let event: Event = body_json(resp).await;
    assert_eq!(event.title, "Team sync");
    assert_eq!(event.user_id, "1");
    assert_eq!(event.date.as_deref(), Some("2024-01-15"));
}

#[tokio::test]
async fn create_event_without_title_returns_422() {
    let resp = app()
        .oneshot(form_request("POST", "/api/v1/users/1/events", "date=2024-01-15"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "title is required");
}

// --- get / update / delete on missing events ---

#[tokio::test]
async fn get_event_not_found() {
    let resp = app().oneshot(signed("GET", "/api/v1/events/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "event not found");
}

#[tokio::test]
async fn update_event_not_found() {
    let resp = app()
        .oneshot(form_request("PUT", "/api/v1/events/missing", "title=Nope"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_event_not_found() {
    let resp = app().oneshot(signed("DELETE", "/api/v1/events/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn event_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create two events for user 1 on different days
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "POST",
            "/api/v1/users/1/events",
            "title=Standup&date=2024-01-15&description=daily",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Event = body_json(resp).await;
    let id = created.event_id.clone();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "POST",
            "/api/v1/users/1/events",
            "title=Retro&date=2024-01-16",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list filtered by date
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(signed("GET", "/api/v1/users/1/events?date=2024-01-15"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let events: Vec<Event> = body_json(resp).await;
    assert_eq!(events, vec![created.clone()]);

    // other users see nothing
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(signed("GET", "/api/v1/users/2/events"))
        .await
        .unwrap();
    let events: Vec<Event> = body_json(resp).await;
    assert!(events.is_empty());

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(signed("GET", &format!("/api/v1/events/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Event = body_json(resp).await;
    assert_eq!(fetched, created);

    // update replaces every field, dropping the description
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "PUT",
            &format!("/api/v1/events/{id}"),
            "title=Standup+v2&date=2024-01-15",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Event = body_json(resp).await;
    assert_eq!(updated.title, "Standup v2");
    assert_eq!(updated.description, None);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(signed("DELETE", &format!("/api/v1/events/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // get after delete: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(signed("GET", &format!("/api/v1/events/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
