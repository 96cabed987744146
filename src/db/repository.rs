//! Database repository for the sermon store and annotation persistence.
//!
//! Uses prepared statements and transactions for data integrity. The
//! live-sermon invariant (at most one `live = true`) is maintained here:
//! set-live rewrites the flag across the whole collection in a single
//! transaction.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    annotation_key, AnnotationRecord, Library, OutlinePoint, RevisionInfo, Sermon,
    UpdateSermonRequest, LOGO_KEY,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Get the full library snapshot for the browser's initial load.
    pub async fn get_library(&self) -> Result<Library, AppError> {
        let meta =
            sqlx::query("SELECT schema_version, revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;

        let sermons = self.list_sermons().await?;
        let logo = self.get_logo().await?;

        Ok(Library {
            schema_version: meta.get("schema_version"),
            revision_id: meta.get("revision_id"),
            generated_at: meta.get("generated_at"),
            sermons,
            logo,
        })
    }

    // ==================== SERMON OPERATIONS ====================

    /// List all sermons, newest first.
    pub async fn list_sermons(&self) -> Result<Vec<Sermon>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, passage, date, main_point, points, questions, live FROM sermons ORDER BY id DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(sermon_from_row).collect())
    }

    /// Get a sermon by ID.
    pub async fn get_sermon(&self, id: i64) -> Result<Option<Sermon>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, passage, date, main_point, points, questions, live FROM sermons WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(sermon_from_row))
    }

    /// Get the sermon currently designated live, if any.
    pub async fn get_live(&self) -> Result<Option<Sermon>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, passage, date, main_point, points, questions, live FROM sermons WHERE live = 1"
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(sermon_from_row))
    }

    /// Move the live designation to the given sermon.
    ///
    /// The whole collection's flags are rewritten in one transaction so
    /// that exactly one sermon ends live. An unknown id is a tolerated
    /// no-op: the collection (and revision) stay unchanged and `false`
    /// is returned.
    pub async fn set_live(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM sermons WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if !exists {
            tracing::debug!("set_live: sermon {} does not exist, ignoring", id);
            return Ok(false);
        }

        sqlx::query("UPDATE sermons SET live = (id = ?)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Create a blank sermon and return it for immediate editing.
    ///
    /// The id is `max(existing) + 1`, or 1 when the collection is empty.
    pub async fn create_sermon(&self) -> Result<Sermon, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT COALESCE(MAX(id), 0) + 1 AS next_id FROM sermons")
            .fetch_one(&mut *tx)
            .await?;
        let id: i64 = row.get("next_id");

        let sermon = Sermon::blank(id);
        sqlx::query(
            "INSERT INTO sermons (id, title, passage, date, main_point, points, questions, live) VALUES (?, '', '', '', '', '[]', '[]', 0)"
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(sermon)
    }

    /// Replace a sermon wholesale. No field merging: the stored record
    /// becomes exactly the request fields (the live flag is untouched;
    /// it belongs to set-live). An unknown id is a tolerated no-op and
    /// returns `None`.
    pub async fn update_sermon(
        &self,
        id: i64,
        request: &UpdateSermonRequest,
    ) -> Result<Option<Sermon>, AppError> {
        let points_json = serde_json::to_string(&request.points)?;
        let questions_json = serde_json::to_string(&request.questions)?;

        let mut tx = self.pool.begin().await?;

        let live_row = sqlx::query("SELECT live FROM sermons WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(live_row) = live_row else {
            tracing::debug!("update_sermon: sermon {} does not exist, ignoring", id);
            return Ok(None);
        };
        let live: i64 = live_row.get("live");

        sqlx::query(
            "UPDATE sermons SET title = ?, passage = ?, date = ?, main_point = ?, points = ?, questions = ? WHERE id = ?"
        )
        .bind(&request.title)
        .bind(&request.passage)
        .bind(&request.date)
        .bind(&request.main_point)
        .bind(&points_json)
        .bind(&questions_json)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(Sermon {
            id,
            title: request.title.clone(),
            passage: request.passage.clone(),
            date: request.date.clone(),
            main_point: request.main_point.clone(),
            points: request.points.clone(),
            questions: request.questions.clone(),
            live: live != 0,
        }))
    }

    // ==================== ANNOTATION OPERATIONS ====================

    /// Load the annotation record for a sermon.
    ///
    /// Missing key, malformed JSON, and the legacy flat-map shape all
    /// resolve to a usable record; this never surfaces a parse error.
    pub async fn load_annotations(&self, sermon_id: i64) -> Result<AnnotationRecord, AppError> {
        let row = sqlx::query("SELECT value FROM storage WHERE key = ?")
            .bind(annotation_key(sermon_id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => {
                let raw: String = row.get("value");
                AnnotationRecord::decode(&raw)
            }
            None => AnnotationRecord::default(),
        })
    }

    /// Write the full annotation record back under the sermon's key.
    /// Write-through: every save replaces the stored value.
    pub async fn save_annotations(
        &self,
        sermon_id: i64,
        record: &AnnotationRecord,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        )
        .bind(annotation_key(sermon_id))
        .bind(record.encode())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== LOGO OPERATIONS ====================

    /// Get the uploaded logo as a data-URI string, if one exists.
    pub async fn get_logo(&self) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM storage WHERE key = ?")
            .bind(LOGO_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Store the logo data-URI string.
    pub async fn set_logo(&self, data_uri: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        )
        .bind(LOGO_KEY)
        .bind(data_uri)
        .execute(&self.pool)
        .await?;
        self.increment_revision().await?;
        Ok(())
    }

    /// Remove the logo.
    pub async fn remove_logo(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM storage WHERE key = ?")
            .bind(LOGO_KEY)
            .execute(&self.pool)
            .await?;
        self.increment_revision().await?;
        Ok(())
    }
}

// Helper functions for row conversion

fn sermon_from_row(row: &sqlx::sqlite::SqliteRow) -> Sermon {
    let live: i64 = row.get("live");
    let points_str: String = row.get("points");
    let questions_str: String = row.get("questions");

    // Older records may carry malformed or missing sequences; they
    // resolve to empty once, here, rather than at each use site.
    let points: Vec<OutlinePoint> = serde_json::from_str(&points_str).unwrap_or_default();
    let questions: Vec<String> = serde_json::from_str(&questions_str).unwrap_or_default();

    Sermon {
        id: row.get("id"),
        title: row.get("title"),
        passage: row.get("passage"),
        date: row.get("date"),
        main_point: row.get("main_point"),
        points,
        questions,
        live: live != 0,
    }
}
