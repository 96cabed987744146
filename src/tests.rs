//! Integration tests for the Harmony backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_password(Some("pastor-pass".to_string())).await
    }

    async fn with_password(password: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));

        // Create config
        let config = Config {
            admin_password: password.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(pass) = password {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-admin-password", pass.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a sermon and replace its fields, returning its id.
    async fn seed_sermon(&self, title: &str) -> i64 {
        let create_body: Value = self
            .client
            .post(self.url("/api/sermons"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = create_body["data"]["id"].as_i64().unwrap();

        self.client
            .put(self.url(&format!("/api/sermons/{}", id)))
            .json(&json!({
                "title": title,
                "passage": "John 4:43-54",
                "date": "18 January",
                "mainPoint": "Trust the Word before the work.",
                "points": [
                    { "title": "Saving Faith", "verses": "John 4:50b", "reveal": "BELIEVED" }
                ],
                "questions": ["What does it mean to trust Jesus' words?"]
            }))
            .send()
            .await
            .unwrap();

        id
    }

    /// Write a raw value directly under a storage key, bypassing the API.
    async fn write_raw_storage(&self, key: &str, value: &str) {
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_missing_password() {
    let fixture = TestFixture::new().await;

    // Plain client without the credential header
    let client = Client::new();
    let resp = client
        .post(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_admin_wrong_password() {
    let fixture = TestFixture::new().await;

    let client = Client::new();
    let resp = client
        .post(fixture.url("/api/sermons"))
        .header("x-admin-password", "wrong-pass")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_admin_disabled_when_not_configured() {
    let fixture = TestFixture::with_password(None).await;

    // Admin routes refuse with the disabled-login code
    let resp = fixture
        .client
        .post(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ADMIN_DISABLED");

    // Reader routes keep serving
    let resp = fixture
        .client
        .get(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_login_check() {
    let fixture = TestFixture::new().await;

    let ok_resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "password": "pastor-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok_resp.status(), 200);
    let ok_body: Value = ok_resp.json().await.unwrap();
    assert_eq!(ok_body["data"]["admin"], true);

    let bad_resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "password": "incorrect" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_resp.status(), 401);
    let bad_body: Value = bad_resp.json().await.unwrap();
    assert_eq!(bad_body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_sermon_allocates_increasing_ids() {
    let fixture = TestFixture::new().await;

    let first: Value = fixture
        .client
        .post(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["id"], 1);
    assert_eq!(first["data"]["live"], false);
    assert_eq!(first["data"]["title"], "");
    assert!(first["data"]["points"].as_array().unwrap().is_empty());

    let second: Value = fixture
        .client
        .post(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["data"]["id"], 2);
    assert_eq!(second["data"]["live"], false);

    // Newest first
    let list: Value = fixture
        .client
        .get(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sermons = list["data"].as_array().unwrap();
    assert_eq!(sermons.len(), 2);
    assert_eq!(sermons[0]["id"], 2);
    assert_eq!(sermons[1]["id"], 1);
}

#[tokio::test]
async fn test_set_live_moves_designation() {
    let fixture = TestFixture::new().await;

    let id1 = fixture.seed_sermon("First").await;
    let id2 = fixture.seed_sermon("Second").await;
    let id3 = fixture.seed_sermon("Third").await;

    // Sermon 2 live, then move to 3
    fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id2)))
        .send()
        .await
        .unwrap();

    let resp: Value = fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id3)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["data"]["applied"], true);

    let list: Value = fixture
        .client
        .get(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sermons = list["data"].as_array().unwrap();
    assert_eq!(sermons.len(), 3);
    let live_ids: Vec<i64> = sermons
        .iter()
        .filter(|s| s["live"] == true)
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(live_ids, vec![id3]);

    for sermon in sermons {
        let sermon_id = sermon["id"].as_i64().unwrap();
        if sermon_id == id1 || sermon_id == id2 {
            assert_eq!(sermon["live"], false);
        }
    }

    // Live endpoint agrees
    let live: Value = fixture
        .client
        .get(fixture.url("/api/sermons/live"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(live["data"]["id"], id3);
}

#[tokio::test]
async fn test_set_live_unknown_id_is_noop() {
    let fixture = TestFixture::new().await;

    let id = fixture.seed_sermon("Only").await;
    fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id)))
        .send()
        .await
        .unwrap();

    let revision_before: Value = fixture
        .client
        .get(fixture.url("/api/library/revision"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/sermons/999/live"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["applied"], false);

    // Live designation and revision unchanged
    let live: Value = fixture
        .client
        .get(fixture.url("/api/sermons/live"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(live["data"]["id"], id);

    let revision_after: Value = fixture
        .client
        .get(fixture.url("/api/library/revision"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        revision_after["data"]["revisionId"],
        revision_before["data"]["revisionId"]
    );
}

#[tokio::test]
async fn test_no_live_sermon_is_null_not_error() {
    let fixture = TestFixture::new().await;

    fixture.seed_sermon("Not live").await;

    let resp = fixture
        .client
        .get(fixture.url("/api/sermons/live"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_update_sermon_replaces_only_that_record() {
    let fixture = TestFixture::new().await;

    let id1 = fixture.seed_sermon("First").await;
    let id2 = fixture.seed_sermon("Second").await;
    fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id2)))
        .send()
        .await
        .unwrap();

    let resp: Value = fixture
        .client
        .put(fixture.url(&format!("/api/sermons/{}", id2)))
        .json(&json!({
            "title": "New Title",
            "passage": "John 4:43-54",
            "date": "18 January",
            "mainPoint": "Trust the Word before the work.",
            "points": [
                { "title": "Saving Faith", "verses": "John 4:50b", "reveal": "BELIEVED" }
            ],
            "questions": ["What does it mean to trust Jesus' words?"]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["data"]["title"], "New Title");
    // The live designation is not part of the editor payload
    assert_eq!(resp["data"]["live"], true);

    let get1: Value = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}", id1)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(get1["data"]["title"], "First");
}

#[tokio::test]
async fn test_update_sermon_unknown_id_is_noop() {
    let fixture = TestFixture::new().await;

    let revision_before: Value = fixture
        .client
        .get(fixture.url("/api/library/revision"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = fixture
        .client
        .put(fixture.url("/api/sermons/42"))
        .json(&json!({ "title": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());

    let revision_after: Value = fixture
        .client
        .get(fixture.url("/api/library/revision"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        revision_after["data"]["revisionId"],
        revision_before["data"]["revisionId"]
    );
}

#[tokio::test]
async fn test_annotations_round_trip() {
    let fixture = TestFixture::new().await;
    let id = fixture.seed_sermon("Noted").await;

    let record = json!({
        "notes": { "0": "take this home" },
        "general": "the big idea",
        "answers": { "0": "to rest on His word" }
    });

    let put_resp = fixture
        .client
        .put(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .json(&record)
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status(), 200);

    let get_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(get_body["data"], record);
}

#[tokio::test]
async fn test_annotations_default_when_absent() {
    let fixture = TestFixture::new().await;
    let id = fixture.seed_sermon("Unannotated").await;

    let body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["general"], "");
    assert!(body["data"]["notes"].as_object().unwrap().is_empty());
    assert!(body["data"]["answers"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_annotations_legacy_format() {
    let fixture = TestFixture::new().await;
    let id = fixture.seed_sermon("Legacy").await;

    fixture
        .write_raw_storage(
            &format!("harmony-notes-{}", id),
            r#"{"0":"note a","2":"note b"}"#,
        )
        .await;

    let body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["notes"]["0"], "note a");
    assert_eq!(body["data"]["notes"]["2"], "note b");
    assert_eq!(body["data"]["general"], "");
    assert!(body["data"]["answers"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_annotations_malformed_recovers_to_default() {
    let fixture = TestFixture::new().await;
    let id = fixture.seed_sermon("Corrupt").await;

    fixture
        .write_raw_storage(&format!("harmony-notes-{}", id), "{{{ not json")
        .await;

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["general"], "");
    assert!(body["data"]["notes"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_notes_export() {
    let fixture = TestFixture::new().await;
    let id = fixture.seed_sermon("Believing the Word").await;

    fixture
        .client
        .put(fixture.url(&format!("/api/sermons/{}/notes", id)))
        .json(&json!({
            "notes": { "0": "take this home" },
            "general": "",
            "answers": {}
        }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/sermons/{}/notes/export", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = resp.text().await.unwrap();
    assert!(text.contains("Believing the Word"));
    assert!(text.contains("1. Saving Faith (John 4:50b) - BELIEVED"));
    assert!(text.contains("Notes: take this home"));

    // Export of an unknown sermon is a 404, not a blank page
    let missing = fixture
        .client
        .get(fixture.url("/api/sermons/999/notes/export"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_logo_lifecycle() {
    let fixture = TestFixture::new().await;

    // Nothing uploaded yet
    let empty: Value = fixture
        .client
        .get(fixture.url("/api/logo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty["data"].is_null());

    // Upload
    let put_resp = fixture
        .client
        .put(fixture.url("/api/logo"))
        .json(&json!({ "dataUri": "data:image/png;base64,iVBORw0KGgo=" }))
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status(), 200);

    let got: Value = fixture
        .client
        .get(fixture.url("/api/logo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(got["data"]["dataUri"], "data:image/png;base64,iVBORw0KGgo=");

    // Remove
    let delete_resp = fixture
        .client
        .delete(fixture.url("/api/logo"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let gone: Value = fixture
        .client
        .get(fixture.url("/api/logo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(gone["data"].is_null());
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;

    let initial: Value = fixture
        .client
        .get(fixture.url("/api/library/revision"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let initial_revision = initial["data"]["revisionId"].as_i64().unwrap();

    // Create
    let create_body: Value = fixture
        .client
        .post(fixture.url("/api/sermons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let after_create = create_body["revisionId"].as_i64().unwrap();
    assert_eq!(after_create, initial_revision + 1);
    let id = create_body["data"]["id"].as_i64().unwrap();

    // Update
    let update_body: Value = fixture
        .client
        .put(fixture.url(&format!("/api/sermons/{}", id)))
        .json(&json!({ "title": "Revised" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let after_update = update_body["revisionId"].as_i64().unwrap();
    assert_eq!(after_update, initial_revision + 2);

    // Set live
    let live_body: Value = fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let after_live = live_body["revisionId"].as_i64().unwrap();
    assert_eq!(after_live, initial_revision + 3);
}

#[tokio::test]
async fn test_library_snapshot() {
    let fixture = TestFixture::new().await;

    let id = fixture.seed_sermon("In the library").await;
    fixture
        .client
        .post(fixture.url(&format!("/api/sermons/{}/live", id)))
        .send()
        .await
        .unwrap();

    let body: Value = fixture
        .client
        .get(fixture.url("/api/library"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"]["schemaVersion"].is_number());
    assert!(body["data"]["revisionId"].is_number());
    let sermons = body["data"]["sermons"].as_array().unwrap();
    assert_eq!(sermons.len(), 1);
    assert_eq!(sermons[0]["title"], "In the library");
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/sermons/404"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
