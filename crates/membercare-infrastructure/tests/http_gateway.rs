//! HttpGateway against an in-process fake API.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use membercare_core::config::ApiConfig;
use membercare_core::envelope::EnvelopeShape;
use membercare_core::error::{GENERIC_REMOTE_MESSAGE, MembercareError, NETWORK_REMOTE_MESSAGE};
use membercare_core::gateway::{AuthGateway, Credentials, RecordGateway, UploadForm};
use membercare_core::record::{Record, RecordId};
use membercare_core::resource::Resource;
use membercare_core::session::{MemorySessionStore, Session, SessionContext, SessionUser};
use membercare_infrastructure::HttpGateway;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeApi {
    hits: AtomicUsize,
    last_auth: Mutex<Option<String>>,
    last_body: Mutex<Option<String>>,
    last_content_type: Mutex<Option<String>>,
}

impl FakeApi {
    fn record(&self, headers: &HeaderMap, body: Option<&[u8]>) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last_auth.lock().unwrap() = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_content_type.lock().unwrap() = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(body) = body {
            *self.last_body.lock().unwrap() = Some(String::from_utf8_lossy(body).into_owned());
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last_auth(&self) -> Option<String> {
        self.last_auth.lock().unwrap().clone()
    }
}

type Api = State<Arc<FakeApi>>;

async fn list_downloads(State(api): Api, headers: HeaderMap) -> Json<Value> {
    api.record(&headers, None);
    Json(json!([
        {"id": 1, "category": "Legal", "title": "Terms"},
        {"id": 2, "category": "Forms", "title": "Onboarding"}
    ]))
}

async fn list_family(State(api): Api, headers: HeaderMap) -> Json<Value> {
    api.record(&headers, None);
    Json(json!({"data": {"data": [{"_id": "m1", "full_name": "Meera"}], "total": 1}}))
}

async fn create_member(State(api): Api, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    api.record(&headers, Some(&body));
    let mut sent: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    sent["id"] = json!(101);
    (StatusCode::CREATED, Json(json!({"data": {"data": sent}})))
}

async fn update_member(
    State(api): Api,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    api.record(&headers, Some(&body));
    assert_eq!(id, "m1");
    StatusCode::NO_CONTENT
}

async fn delete_member(State(api): Api, Path(_id): Path<String>, headers: HeaderMap) -> StatusCode {
    api.record(&headers, None);
    StatusCode::NO_CONTENT
}

async fn create_ticket(State(api): Api, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    api.record(&headers, Some(&body));
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}

async fn upload_document(State(api): Api, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    api.record(&headers, Some(&body));
    (StatusCode::CREATED, Json(json!({"data": {"id": "doc-9", "title": "Lab report"}})))
}

async fn login(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    api.record(&headers, None);
    if body["password"] == "correct horse" {
        (
            StatusCode::OK,
            Json(json!({"data": {"token": "fresh-token", "user": {"id": 5, "name": "Asha"}}})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid email or password"})))
    }
}

async fn not_found(State(api): Api, headers: HeaderMap) -> impl IntoResponse {
    api.record(&headers, None);
    (StatusCode::NOT_FOUND, Json(json!({"message": "Resource not found"})))
}

async fn spawn_api() -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi::default());
    let app = Router::new()
        .route("/downloads", get(list_downloads))
        .route("/members/family", get(list_family).post(create_member))
        .route("/members/family/:id", put(update_member).delete(delete_member))
        .route("/support/tickets", post(create_ticket))
        .route("/documents", post(upload_document))
        .route("/auth/login", post(login))
        .fallback(not_found)
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), api)
}

fn signed_in() -> SessionContext {
    let session = Session::new("tok-42", SessionUser::new("42"));
    SessionContext::new(Arc::new(MemorySessionStore::with_session(session)))
}

fn signed_out() -> SessionContext {
    SessionContext::new(Arc::new(MemorySessionStore::new()))
}

fn gateway(base_url: &str, session: SessionContext) -> HttpGateway {
    let config = ApiConfig {
        base_url: format!("{}/", base_url),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    HttpGateway::new(&config, session).unwrap()
}

fn family() -> Resource {
    Resource::new("family members", "members/family").with_envelope(EnvelopeShape::NestedData)
}

fn downloads() -> Resource {
    Resource::new("downloads", "downloads").with_envelope(EnvelopeShape::Bare)
}

#[tokio::test]
async fn list_attaches_bearer_and_normalizes_envelope() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_in());

    let members = gw.list(&family()).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id(), Some(&RecordId::new("m1")));
    assert_eq!(api.last_auth().as_deref(), Some("Bearer tok-42"));
}

#[tokio::test]
async fn every_call_without_session_fails_before_the_network() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_out());
    let resource = family();
    let id = RecordId::new("m1");
    let record = Record::new().with("full_name", "Meera");

    let results = vec![
        gw.list(&resource).await.map(|_| ()),
        gw.create(&resource, &record).await.map(|_| ()),
        gw.update(&resource, &id, &record).await.map(|_| ()),
        gw.remove(&resource, &id).await,
        gw.upload(&resource, UploadForm::new().text("a", "b")).await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(MembercareError::Auth(_))));
    }
    assert_eq!(api.hits(), 0);
}

#[tokio::test]
async fn public_resource_works_signed_out_without_header() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_out());

    let items = gw.list(&downloads().public()).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].text("title"), Some("Terms"));
    assert_eq!(api.last_auth(), None);
}

#[tokio::test]
async fn public_resource_still_sends_token_when_signed_in() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    gw.list(&downloads().public()).await.unwrap();
    assert_eq!(api.last_auth().as_deref(), Some("Bearer tok-42"));
}

#[tokio::test]
async fn create_returns_server_record_with_id() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    let record = Record::new().with("full_name", "Ravi").with("relation", "Child");

    let created = gw.create(&family(), &record).await.unwrap();
    assert_eq!(created.id(), Some(&RecordId::new("101")));
    assert_eq!(created.text("full_name"), Some("Ravi"));

    let sent: Value = serde_json::from_str(api.last_body.lock().unwrap().as_deref().unwrap()).unwrap();
    assert_eq!(sent, json!({"full_name": "Ravi", "relation": "Child"}));
}

#[tokio::test]
async fn update_without_body_echoes_patch_with_id() {
    let (base, _api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    let patch = Record::new().with("phone", "9876543210");

    let updated = gw.update(&family(), &RecordId::new("m1"), &patch).await.unwrap();
    assert_eq!(updated.id(), Some(&RecordId::new("m1")));
    assert_eq!(updated.text("phone"), Some("9876543210"));
}

#[tokio::test]
async fn remove_succeeds_on_no_content() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    gw.remove(&family(), &RecordId::new("m1")).await.unwrap();
    assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn not_found_uses_body_message() {
    let (base, _api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    let resource = Resource::new("hospital partners", "partners/onboarding");

    let err = gw.create(&resource, &Record::new().with("name", "City Care")).await.unwrap_err();
    assert_eq!(
        err,
        MembercareError::Remote {
            status: Some(404),
            message: "Resource not found".to_string()
        }
    );
}

#[tokio::test]
async fn server_error_without_body_uses_fallback() {
    let (base, _api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    let resource = Resource::new("tickets", "support/tickets");

    let err = gw.create(&resource, &Record::new().with("subject", "Card")).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), GENERIC_REMOTE_MESSAGE);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let gw = gateway("http://127.0.0.1:1", signed_in());
    let err = gw.list(&downloads()).await.unwrap_err();
    assert_eq!(
        err,
        MembercareError::Remote {
            status: None,
            message: NETWORK_REMOTE_MESSAGE.to_string()
        }
    );
}

#[tokio::test]
async fn upload_sends_multipart() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_in());
    let resource = Resource::new("documents", "documents");
    let form = UploadForm::new()
        .text("title", "Lab report")
        .file("document", "report.pdf", b"%PDF-1.4".to_vec());

    let created = gw.upload(&resource, form).await.unwrap();
    assert_eq!(created.id(), Some(&RecordId::new("doc-9")));

    let content_type = api.last_content_type.lock().unwrap().clone().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = api.last_body.lock().unwrap().clone().unwrap();
    assert!(body.contains("filename=\"report.pdf\""));
    assert!(body.contains("application/pdf"));
    assert!(body.contains("Lab report"));
}

#[tokio::test]
async fn sign_in_returns_session_without_auth_header() {
    let (base, api) = spawn_api().await;
    let gw = gateway(&base, signed_out());

    let session = gw
        .sign_in(&Credentials::new("asha@example.com", "correct horse"))
        .await
        .unwrap();
    assert_eq!(session.token, "fresh-token");
    assert_eq!(session.user.id.as_str(), "5");
    assert_eq!(api.last_auth(), None);
}

#[tokio::test]
async fn sign_in_rejection_is_remote_error() {
    let (base, _api) = spawn_api().await;
    let gw = gateway(&base, signed_out());

    let err = gw
        .sign_in(&Credentials::new("asha@example.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid email or password");
}
