use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    extract::{OriginalUri, Path, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ACCESS_ID: &str = "test_tenant";
pub const DEFAULT_SECRET_KEY: &str = "12345";
pub const SIGNATURE_SCHEME: &str = "APIAuth-HMAC-SHA256";
pub const CONTENT_HASH_HEADER: &str = "x-authorization-content-sha256";

/// Largest request body the signature check will buffer.
const MAX_SIGNED_BODY: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppAuthorization {
    pub user_id: String,
    pub tenant_id: String,
}

#[derive(Deserialize)]
pub struct AuthorizeForm {
    pub user_id: Option<String>,
}

/// Form body for create and update. Unknown fields are ignored.
#[derive(Deserialize)]
pub struct EventForm {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
}

pub struct AppState {
    access_id: String,
    secret_key: String,
    events: RwLock<HashMap<String, Event>>,
}

pub type Db = Arc<AppState>;

/// Error response with a JSON body `{"error": "..."}`.
struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

pub fn app() -> Router {
    app_with(DEFAULT_ACCESS_ID, DEFAULT_SECRET_KEY)
}

/// Router accepting requests signed for `access_id` with `secret_key`.
pub fn app_with(access_id: &str, secret_key: &str) -> Router {
    let db: Db = Arc::new(AppState {
        access_id: access_id.to_string(),
        secret_key: secret_key.to_string(),
        events: RwLock::new(HashMap::new()),
    });
    let api = Router::new()
        .route("/app_authorization_requests", post(authorize))
        .route("/users/{user_id}/events", get(list_events).post(create_event))
        .route(
            "/events/{event_id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route_layer(middleware::from_fn_with_state(db.clone(), require_signature))
        .with_state(db);
    Router::new().nest("/api/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(
    listener: TcpListener,
    access_id: &str,
    secret_key: &str,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(access_id, secret_key)).await
}

/// Base64 SHA-256 of a request body, as sent in `X-Authorization-Content-SHA256`.
pub fn content_hash(body: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(body))
}

/// `METHOD,content-type,content-hash,request-uri,date`
pub fn canonical_string(
    method: &str,
    content_type: &str,
    content_hash: &str,
    request_uri: &str,
    date: &str,
) -> String {
    format!("{method},{content_type},{content_hash},{request_uri},{date}")
}

/// Base64 HMAC-SHA256 of `canonical` keyed with `secret_key`.
pub fn compute_signature(secret_key: &str, canonical: &str) -> Option<String> {
    let mut mac = keyed_mac(secret_key)?;
    mac.update(canonical.as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

fn keyed_mac(secret_key: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret_key.as_bytes()).ok()
}

fn header_str<'a>(parts: &'a Parts, name: impl header::AsHeaderName) -> &'a str {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Recomputes the APIAuth signature over the full request URI and the
/// buffered body. The body hash header, when sent, must match the body.
fn verify_signature(db: &AppState, parts: &Parts, request_uri: &str, body: &[u8]) -> bool {
    let prefix = format!("{SIGNATURE_SCHEME} {}:", db.access_id);
    let Some(signature) = header_str(parts, header::AUTHORIZATION).strip_prefix(prefix.as_str())
    else {
        return false;
    };
    let Ok(signature) = STANDARD.decode(signature) else {
        return false;
    };

    let hash = header_str(parts, CONTENT_HASH_HEADER);
    let body_matches = if hash.is_empty() {
        body.is_empty()
    } else {
        hash == content_hash(body)
    };
    if !body_matches {
        return false;
    }

    let canonical = canonical_string(
        parts.method.as_str(),
        header_str(parts, header::CONTENT_TYPE),
        hash,
        request_uri,
        header_str(parts, header::DATE),
    );
    let Some(mut mac) = keyed_mac(&db.secret_key) else {
        return false;
    };
    mac.update(canonical.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

async fn require_signature(State(db): State<Db>, request: Request, next: Next) -> Response {
    // Nested routers see the URI with `/api/v1` stripped; the client signs the full one.
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let request_uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let (parts, body) = request.into_parts();
    let Ok(body) = axum::body::to_bytes(body, MAX_SIGNED_BODY).await else {
        return Failure(StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
    };
    if !verify_signature(&db, &parts, &request_uri, &body) {
        debug!(uri = %request_uri, "rejected request with invalid signature");
        return Failure(StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    next.run(Request::from_parts(parts, Body::from(body))).await
}

async fn authorize(
    State(db): State<Db>,
    Form(input): Form<AuthorizeForm>,
) -> Result<Json<AppAuthorization>, Failure> {
    let user_id = input
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or(Failure(StatusCode::UNPROCESSABLE_ENTITY, "user_id is required"))?;
    Ok(Json(AppAuthorization {
        user_id,
        tenant_id: db.access_id.clone(),
    }))
}

async fn list_events(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Event>> {
    let events = db.events.read().await;
    let mut matching: Vec<Event> = events
        .values()
        .filter(|e| e.user_id == user_id)
        .filter(|e| query.date.is_none() || e.date == query.date)
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.title.cmp(&b.title));
    Json(matching)
}

async fn create_event(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Form(input): Form<EventForm>,
) -> Result<(StatusCode, Json<Event>), Failure> {
    let title = required_title(input.title)?;
    let event = Event {
        event_id: Uuid::new_v4().to_string(),
        user_id,
        title,
        date: input.date,
        description: input.description,
    };
    debug!(event_id = %event.event_id, "created event");
    db.events.write().await.insert(event.event_id.clone(), event.clone());
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_event(
    State(db): State<Db>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, Failure> {
    let events = db.events.read().await;
    events.get(&event_id).cloned().map(Json).ok_or_else(not_found)
}

/// Replaces every field with the submitted form; there is no partial update.
async fn update_event(
    State(db): State<Db>,
    Path(event_id): Path<String>,
    Form(input): Form<EventForm>,
) -> Result<Json<Event>, Failure> {
    let mut events = db.events.write().await;
    let event = events.get_mut(&event_id).ok_or_else(not_found)?;
    event.title = required_title(input.title)?;
    event.date = input.date;
    event.description = input.description;
    Ok(Json(event.clone()))
}

async fn delete_event(
    State(db): State<Db>,
    Path(event_id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut events = db.events.write().await;
    events
        .remove(&event_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

fn required_title(title: Option<String>) -> Result<String, Failure> {
    title
        .filter(|t| !t.trim().is_empty())
        .ok_or(Failure(StatusCode::UNPROCESSABLE_ENTITY, "title is required"))
}

fn not_found() -> Failure {
    Failure(StatusCode::NOT_FOUND, "event not found")
}
