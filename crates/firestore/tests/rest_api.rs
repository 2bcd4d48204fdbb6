//! Firestore store and Firebase auth against an in-process fake server

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use taskdash_core::auth::AuthService;
use taskdash_core::controller::{Outcome, ViewState};
use taskdash_core::dashboard::Dashboard;
use taskdash_core::task::{TaskPatch, TaskRepository};
use taskdash_core::testing::RecordingNavigator;
use taskdash_core::Error;
use taskdash_firestore::{Document, FirebaseAuth, FirestoreTaskStore, ListDocumentsResponse};

const PAGE: usize = 2;
const COLLECTION: &str = "/v1/projects/{project}/databases/(default)/documents/users/{uid}/tasks";

#[derive(Default)]
struct FakeBackend {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    next_id: AtomicUsize,
    bearer_tokens: Mutex<Vec<Option<String>>>,
}

type Shared = Arc<FakeBackend>;
type Failure = (StatusCode, Json<Value>);

impl FakeBackend {
    fn record_auth(&self, headers: &HeaderMap) {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.bearer_tokens.lock().unwrap().push(token);
    }
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": { "code": status.as_u16(), "message": message } })))
}

fn query_value<'a>(query: &'a Option<String>, key: &str) -> Option<&'a str> {
    query
        .as_deref()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

async fn list_documents(
    State(fake): State<Shared>,
    Path((_project, uid)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<ListDocumentsResponse> {
    fake.record_auth(&headers);
    let start: usize = query_value(&query, "pageToken")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let docs = fake
        .collections
        .lock()
        .unwrap()
        .get(&uid)
        .cloned()
        .unwrap_or_default();

    let end = (start + PAGE).min(docs.len());
    Json(ListDocumentsResponse {
        documents: docs.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
        next_page_token: (end < docs.len()).then(|| end.to_string()),
    })
}

async fn create_document(
    State(fake): State<Shared>,
    Path((project, uid)): Path<(String, String)>,
    headers: HeaderMap,
    Json(mut doc): Json<Document>,
) -> Json<Document> {
    fake.record_auth(&headers);
    let n = fake.next_id.fetch_add(1, Ordering::SeqCst);
    doc.name = format!(
        "projects/{}/databases/(default)/documents/users/{}/tasks/doc-{}",
        project, uid, n
    );
    fake.collections
        .lock()
        .unwrap()
        .entry(uid)
        .or_default()
        .push(doc.clone());
    Json(doc)
}

async fn patch_document(
    State(fake): State<Shared>,
    Path((_project, uid, id)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Document>,
) -> Result<Json<Document>, Failure> {
    fake.record_auth(&headers);
    if query_value(&query, "currentDocument.exists") != Some("true") {
        return Err(failure(StatusCode::BAD_REQUEST, "missing precondition"));
    }
    let mut collections = fake.collections.lock().unwrap();
    let doc = collections
        .get_mut(&uid)
        .and_then(|docs| docs.iter_mut().find(|d| d.id() == id))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "No document to update"))?;
    doc.fields.extend(body.fields);
    Ok(Json(doc.clone()))
}

async fn delete_document(
    State(fake): State<Shared>,
    Path((_project, uid, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.record_auth(&headers);
    if let Some(docs) = fake.collections.lock().unwrap().get_mut(&uid) {
        docs.retain(|d| d.id() != id);
    }
    Json(json!({}))
}

async fn sign_in(RawQuery(query): RawQuery, Json(req): Json<Value>) -> Result<Json<Value>, Failure> {
    if query_value(&query, "key") != Some("test-key") {
        return Err(failure(StatusCode::BAD_REQUEST, "API_KEY_INVALID"));
    }
    if req["password"] != "hunter2" || req["returnSecureToken"] != true {
        return Err(failure(StatusCode::BAD_REQUEST, "INVALID_PASSWORD"));
    }
    Ok(Json(json!({
        "localId": "uid-1",
        "email": req["email"],
        "idToken": "token-1",
        "refreshToken": "refresh-1",
        "expiresIn": "3600"
    })))
}

fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_fake() -> (String, Shared) {
    let fake = Shared::default();
    let app = Router::new()
        .route(COLLECTION, get(list_documents).post(create_document))
        .route(
            &format!("{}/{{id}}", COLLECTION),
            patch(patch_document).delete(delete_document),
        )
        .route("/v1/accounts:signInWithPassword", post(sign_in))
        .with_state(Arc::clone(&fake));
    (serve(app).await, fake)
}

#[tokio::test]
async fn test_sign_in_rejects_wrong_password() {
    let (base, _fake) = spawn_fake().await;
    let auth = FirebaseAuth::new(&base, "test-key").with_client(local_client());

    match auth.sign_in("sam@example.com", "wrong").await {
        Err(Error::Unauthenticated(reason)) => assert_eq!(reason, "INVALID_PASSWORD"),
        other => panic!("Expected Unauthenticated error, got: {:?}", other),
    }
    assert!(auth.current().is_none());
}

#[tokio::test]
async fn test_sign_in_publishes_session() {
    let (base, _fake) = spawn_fake().await;
    let auth = FirebaseAuth::new(&base, "test-key").with_client(local_client());
    let sessions = auth.sessions();

    let session = auth.sign_in("sam@example.com", "hunter2").await.unwrap();
    assert_eq!(session.user_id, "uid-1");
    assert_eq!(session.display_name, "sam");
    assert_eq!(session.id_token.as_deref(), Some("token-1"));
    assert_eq!(sessions.borrow().as_ref().map(|s| s.user_id.as_str()), Some("uid-1"));

    auth.sign_out().await.unwrap();
    assert!(sessions.borrow().is_none());
}

#[tokio::test]
async fn test_crud_round_trip() {
    let (base, fake) = spawn_fake().await;
    let auth = FirebaseAuth::new(&base, "test-key").with_client(local_client());
    auth.sign_in("sam@example.com", "hunter2").await.unwrap();
    let store =
        FirestoreTaskStore::new(&base, "demo", auth.sessions()).with_client(local_client());

    for text in ["one", "two", "three"] {
        store.create("uid-1", text).await.unwrap();
    }

    // Three documents with a page size of two needs a second page
    let tasks = store.list("uid-1").await.unwrap();
    let texts: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(tasks[0].id, "doc-0");
    assert!(tasks.iter().all(|t| !t.completed));

    store
        .update("uid-1", "doc-1", TaskPatch::completed(true))
        .await
        .unwrap();
    let tasks = store.list("uid-1").await.unwrap();
    assert!(tasks[1].completed);
    assert_eq!(tasks[1].text, "two");

    match store.update("uid-1", "missing", TaskPatch::text("x")).await {
        Err(Error::TaskNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("Expected TaskNotFound error, got: {:?}", other),
    }

    store.delete("uid-1", "doc-0").await.unwrap();
    let ids: Vec<String> = store
        .list("uid-1")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["doc-1", "doc-2"]);

    assert!(store.list("someone-else").await.unwrap().is_empty());

    let tokens = fake.bearer_tokens.lock().unwrap();
    assert!(!tokens.is_empty());
    assert!(tokens.iter().all(|t| t.as_deref() == Some("Bearer token-1")));
}

#[tokio::test]
async fn test_blank_create_sends_nothing() {
    let (base, fake) = spawn_fake().await;
    let auth = FirebaseAuth::new(&base, "test-key").with_client(local_client());
    let store =
        FirestoreTaskStore::new(&base, "demo", auth.sessions()).with_client(local_client());

    assert!(matches!(
        store.create("uid-1", "   ").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(fake.bearer_tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_over_firestore() {
    let (base, _fake) = spawn_fake().await;
    let auth = Arc::new(FirebaseAuth::new(&base, "test-key").with_client(local_client()));
    let store = Arc::new(
        FirestoreTaskStore::new(&base, "demo", auth.sessions()).with_client(local_client()),
    );
    let navigator = Arc::new(RecordingNavigator::new());
    let dashboard = Dashboard::start(store, auth.clone(), navigator.clone());

    // No session yet: redirected once
    dashboard.gate().settled(1).await;
    assert_eq!(navigator.redirects(), 1);

    auth.sign_in("sam@example.com", "hunter2").await.unwrap();
    dashboard.gate().settled(2).await;
    assert_eq!(dashboard.snapshot().await.view, ViewState::Empty);

    assert_eq!(dashboard.submit("Write report").await, Outcome::Applied);
    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.display_name.as_deref(), Some("sam"));
    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.tasks[0].text, "Write report");
    assert_eq!((snapshot.summary.completed, snapshot.summary.pending), (0, 1));

    let id = snapshot.tasks[0].id.clone();
    assert_eq!(dashboard.toggle(&id).await, Outcome::Applied);
    let snapshot = dashboard.snapshot().await;
    assert!(snapshot.tasks[0].completed);
    assert_eq!((snapshot.summary.completed, snapshot.summary.pending), (1, 0));
}

async fn stalled_list() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(json!({}))
}

#[tokio::test]
async fn test_stalled_request_times_out() {
    let base = serve(Router::new().route(COLLECTION, get(stalled_list))).await;
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let auth = Arc::new(FirebaseAuth::new(&base, "test-key"));
    let store = Arc::new(FirestoreTaskStore::new(&base, "demo", auth.sessions()).with_client(client));

    match store.list("uid-1").await {
        Err(Error::Timeout(_)) => {}
        other => panic!("Expected Timeout error, got: {:?}", other),
    }

    // A dashboard on the stalled backend keeps answering
    let navigator = Arc::new(RecordingNavigator::new());
    let dashboard = Dashboard::start(store, auth.clone(), navigator);
    dashboard.gate().settled(1).await;
    let snapshot = tokio::time::timeout(Duration::from_secs(5), dashboard.snapshot())
        .await
        .unwrap();
    assert!(!snapshot.signed_in());
    assert_eq!(dashboard.refresh().await, Outcome::Ignored);
}
