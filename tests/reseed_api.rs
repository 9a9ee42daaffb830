use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use taskboard_seed::api::{create_router, AppState};
use taskboard_seed::config::SeedSettings;
use taskboard_seed::model::{Record, SeedTable};
use taskboard_seed::seed::{parse_seed_date, ProjectStatus};
use taskboard_seed::store::{MemoryStore, SeedStore};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower::ServiceExt;

// Test client wrapper for making API calls against a bound server
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

fn write_fixtures(dir: &Path, files: &[(SeedTable, Value)]) {
    for table in SeedTable::ALL {
        let body = files
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| "[]".to_string());
        std::fs::write(dir.join(table.fixture_file()), body).unwrap();
    }
}

fn taskboard_fixtures() -> Vec<(SeedTable, Value)> {
    vec![
        (
            SeedTable::Team,
            json!([{"teamName": "Quantum Innovations", "productOwnerUserId": 1}]),
        ),
        (
            SeedTable::User,
            json!([
                {"cognitoId": "c1", "username": "AliceJones", "profilePictureUrl": "p1.jpg", "teamId": 1},
                {"cognitoId": "c2", "username": "BobSmith", "profilePictureUrl": "p2.jpg", "teamId": 1}
            ]),
        ),
        (
            SeedTable::Project,
            json!([
                {"id": 1, "name": "Apollo", "description": "Space", "startDate": "2023-01-01T00:00:00", "endDate": "2023-05-01T00:00:00"},
                {"id": 2, "name": "Beacon", "description": "Lights", "startDate": "2023-02-01T00:00:00", "endDate": "2023-06-01T00:00:00"},
                {"id": 3, "name": "Cascade", "description": "Water", "startDate": "2023-03-01T00:00:00", "endDate": "2023-07-01T00:00:00"}
            ]),
        ),
        (
            SeedTable::ProjectTeam,
            json!([{"id": 1, "teamId": 1, "projectId": 1}, {"id": 2, "teamId": 1, "projectId": 3}]),
        ),
        (
            SeedTable::Task,
            json!([
                {"id": 1, "title": "Plan", "status": "To Do", "projectId": 1, "authorUserId": 1, "assignedUserId": 2, "startDate": "2023-01-05 09:00:00", "dueDate": "2023-01-10 17:00:00"},
                {"id": 2, "title": "Build", "status": "Work In Progress", "projectId": 2, "authorUserId": 2, "dueDate": "2023-02-20"}
            ]),
        ),
        (
            SeedTable::Attachment,
            json!([{"id": 1, "fileURL": "brief.pdf", "fileName": "brief.pdf", "taskId": 1, "uploadedById": 1}]),
        ),
        (
            SeedTable::Comment,
            json!([{"id": 1, "text": "On it", "taskId": 1, "userId": 2}]),
        ),
        (
            SeedTable::TaskAssignment,
            json!([{"id": 1, "userId": 2, "taskId": 1}]),
        ),
    ]
}

fn app_for<S: SeedStore + 'static>(store: Arc<S>, fixtures: &TempDir) -> Router {
    let settings = SeedSettings {
        seed_dir: fixtures.path().to_path_buf(),
        ..SeedSettings::default()
    };
    create_router().with_state(Arc::new(AppState::new(store, settings)))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn done_projects(store: &MemoryStore) -> usize {
    let today = chrono::Local::now().date_naive();
    store
        .rows(SeedTable::Project)
        .iter()
        .filter(|p: &&Record| ProjectStatus::of(p, today) == Some(ProjectStatus::Done))
        .count()
}

#[tokio::test]
async fn test_reseed_without_body_infers_delta() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let (status, body) = call(&app, "POST", "/reseed", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert!(body["deltaDays"].as_i64().unwrap() > 0);

    assert_eq!(store.count_rows(SeedTable::Team).await.unwrap(), 1);
    assert_eq!(store.count_rows(SeedTable::TaskAssignment).await.unwrap(), 1);
    // round(3 * 0.6) = 2
    assert_eq!(done_projects(&store), 2);
}

#[tokio::test]
async fn test_reseed_with_explicit_delta() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let (status, body) = call(&app, "POST", "/reseed", Some(json!({"deltaDays": 7}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "deltaDays": 7}));

    let tasks = store.rows(SeedTable::Task);
    assert_eq!(
        parse_seed_date(tasks[0]["dueDate"].as_str().unwrap()),
        parse_seed_date("2023-01-17 17:00:00")
    );
}

#[tokio::test]
async fn test_reseed_twice_restarts_identities() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    for _ in 0..2 {
        let (status, _) = call(&app, "POST", "/reseed", Some(json!({"deltaDays": 0}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let users = store.rows(SeedTable::User);
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["userId"], json!(1));
    assert_eq!(users[1]["userId"], json!(2));
    assert_eq!(store.truncations(), 2);
}

#[tokio::test]
async fn test_empty_fixtures_zero_delta() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &[]);
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let (status, body) = call(&app, "POST", "/reseed", Some(json!({"deltaDays": 0}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "deltaDays": 0}));

    let (status, body) = call(&app, "GET", "/reseed/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reseeding"], json!(false));
    for table in SeedTable::ALL {
        assert_eq!(body["tables"][table.name()], json!(0));
    }
}

#[tokio::test]
async fn test_missing_fixture_reports_500() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    std::fs::remove_file(fixtures.path().join("attachment.json")).unwrap();
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let (status, body) = call(&app, "POST", "/reseed", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("attachment.json"));
    assert_eq!(store.truncations(), 0);
}

#[tokio::test]
async fn test_constraint_violation_reports_500() {
    let fixtures = tempfile::tempdir().unwrap();
    let mut files = taskboard_fixtures();
    files.retain(|(table, _)| *table != SeedTable::ProjectTeam);
    files.push((
        SeedTable::ProjectTeam,
        json!([{"id": 1, "teamId": 1, "projectId": 1}, {"id": 1, "teamId": 1, "projectId": 2}]),
    ));
    write_fixtures(fixtures.path(), &files);
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let (status, body) = call(&app, "POST", "/reseed", Some(json!({"deltaDays": 0}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("ProjectTeam"));
    assert!(error.contains("duplicate key"));
    // Everything before the failing table is in, nothing after
    assert_eq!(store.count_rows(SeedTable::Project).await.unwrap(), 3);
    assert_eq!(store.count_rows(SeedTable::Task).await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &[]);
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let request = Request::builder()
        .method("POST")
        .uri("/reseed")
        .header("content-type", "application/json")
        .body(Body::from("{\"deltaDays\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.truncations(), 0);
}

/// Holds the first truncation until released, so a second request can
/// arrive while a reseed is in flight.
struct GatedStore {
    inner: MemoryStore,
    entered: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl SeedStore for GatedStore {
    async fn truncate_all(&self, tables: &[SeedTable]) -> anyhow::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.truncate_all(tables).await
    }

    async fn insert_record(&self, table: SeedTable, record: &Record) -> anyhow::Result<()> {
        self.inner.insert_record(table, record).await
    }

    async fn count_rows(&self, table: SeedTable) -> anyhow::Result<i64> {
        self.inner.count_rows(table).await
    }
}

#[tokio::test]
async fn test_overlapping_reseed_is_rejected() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(GatedStore {
        inner: MemoryStore::new(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let app = app_for(store.clone(), &fixtures);

    let first = {
        let app = app.clone();
        tokio::spawn(async move { call(&app, "POST", "/reseed", Some(json!({"deltaDays": 0}))).await })
    };
    store.entered.notified().await;

    let (status, body) = call(&app, "POST", "/reseed", Some(json!({"deltaDays": 0}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["ok"], json!(false));

    let (_, status_body) = call(&app, "GET", "/reseed/status", None).await;
    assert_eq!(status_body["reseeding"], json!(true));

    store.release.notify_one();
    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deltaDays"], json!(0));
    assert_eq!(store.inner.truncations(), 1);
}

#[tokio::test]
async fn test_reseed_over_http() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = TestClient::new(format!("http://{}", address));

    let health: Value = client.get("/health").await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], json!("healthy"));

    let response = client
        .post("/reseed", json!({"anchorDaysAgo": 30}))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));

    // Earliest project date sat 4 days before the first task, and now sits 30 days back
    let today = chrono::Local::now().date_naive();
    let earliest = store
        .rows(SeedTable::Task)
        .iter()
        .filter_map(|task| task["startDate"].as_str().and_then(parse_seed_date))
        .min()
        .unwrap();
    let days_ago = today
        .signed_duration_since(earliest.with_timezone(&chrono::Local).date_naive())
        .num_days();
    assert_eq!(days_ago, 26);

    let status: Value = client.get("/reseed/status").await.unwrap().json().await.unwrap();
    assert_eq!(status["tables"]["Comment"], json!(1));
}

#[tokio::test]
async fn test_out_of_range_offsets_fail_before_truncation() {
    let fixtures = tempfile::tempdir().unwrap();
    write_fixtures(fixtures.path(), &taskboard_fixtures());
    let store = Arc::new(MemoryStore::new());
    let app = app_for(store.clone(), &fixtures);

    for body in [
        json!({"anchorDaysAgo": i64::MIN}),
        json!({"anchorDaysAgo": 1_000_000_000_000_i64}),
        json!({"deltaDays": 1_000_000_000_000_i64}),
    ] {
        let (status, response) = call(&app, "POST", "/reseed", Some(body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["ok"], json!(false));
        assert!(response["error"].as_str().unwrap().contains("calendar range"));
    }

    assert_eq!(store.truncations(), 0);
    let (_, status) = call(&app, "GET", "/reseed/status", None).await;
    assert_eq!(status["reseeding"], json!(false));
}
