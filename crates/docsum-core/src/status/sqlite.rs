//! Document status persistence using SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{StatusFields, StatusSink};
use crate::error::{DocsumError, DocsumResult};
use crate::types::{Document, DocumentStatus, LastError, LengthMode};

/// One row of a document's status history.
#[derive(Debug, Clone, Serialize)]
pub struct StatusHistoryRecord {
    pub id: String,
    pub document_id: String,
    pub status: String,
    pub created_at: String,
}

/// SQLite-based document store.
///
/// Holds the current record of every uploaded document plus an append-only
/// log of status transitions.
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) a store. `":memory:"` opens a private in-memory database.
    pub fn new(db_path: impl AsRef<Path>) -> DocsumResult<Self> {
        let in_memory = db_path.as_ref().to_str() == Some(":memory:");

        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = db_path.as_ref().parent() {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(db_path.as_ref())?
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.create_tables()?;

        Ok(store)
    }

    fn lock(&self) -> DocsumResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DocsumError::database("document store lock poisoned"))
    }

    fn create_tables(&self) -> DocsumResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id             TEXT PRIMARY KEY,
                locator        TEXT NOT NULL,
                filename       TEXT NOT NULL,
                extension      TEXT NOT NULL,
                status         TEXT NOT NULL,
                extracted_text TEXT,
                summary        TEXT,
                length_mode    TEXT,
                created_at     DATETIME NOT NULL,
                processed_at   DATETIME,
                error_class    TEXT,
                error_stage    TEXT,
                error_detail   TEXT
            );

            CREATE TABLE IF NOT EXISTS status_history (
                id          TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                status      TEXT NOT NULL,
                created_at  DATETIME NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_status_history_document_id
                ON status_history(document_id);
            "#,
        )?;

        Ok(())
    }

    /// Check that the database answers queries.
    pub fn ping(&self) -> DocsumResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Insert a freshly uploaded document.
    pub fn create(&self, document: &Document) -> DocsumResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO documents (
                id, locator, filename, extension, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                document.id,
                document.locator,
                document.filename,
                document.extension,
                document.status.as_ref(),
                document.created_at.to_rfc3339(),
            ],
        )?;
        Self::append_history(&conn, &document.id, document.status)?;

        Ok(())
    }

    /// Fetch a document by id.
    pub fn get(&self, document_id: &str) -> DocsumResult<Option<Document>> {
        let conn = self.lock()?;
        let document = conn
            .query_row(
                r#"
                SELECT id, locator, filename, extension, status, extracted_text,
                       summary, length_mode, created_at, processed_at,
                       error_class, error_stage, error_detail
                FROM documents
                WHERE id = ?1
                "#,
                [document_id],
                Self::row_to_document,
            )
            .optional()?;

        Ok(document)
    }

    /// Status transitions for a document, oldest first.
    pub fn history(&self, document_id: &str) -> DocsumResult<Vec<StatusHistoryRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, status, created_at
            FROM status_history
            WHERE document_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;

        let records = stmt.query_map([document_id], |row| {
            Ok(StatusHistoryRecord {
                id: row.get(0)?,
                document_id: row.get(1)?,
                status: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        records
            .collect::<Result<Vec<_>, _>>()
            .map_err(DocsumError::from)
    }

    fn append_history(
        conn: &Connection,
        document_id: &str,
        status: DocumentStatus,
    ) -> DocsumResult<()> {
        conn.execute(
            "INSERT INTO status_history (id, document_id, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                document_id,
                status.as_ref(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let status: String = row.get(4)?;
        let length_mode: Option<String> = row.get(7)?;
        let created_at: String = row.get(8)?;
        let processed_at: Option<String> = row.get(9)?;
        let error_class: Option<String> = row.get(10)?;
        let error_stage: Option<String> = row.get(11)?;
        let error_detail: Option<String> = row.get(12)?;

        let last_error = match (error_class, error_stage) {
            (Some(class), Some(stage)) => Some(LastError {
                class,
                stage: parse_column(11, &stage)?,
                detail: error_detail.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Document {
            id: row.get(0)?,
            locator: row.get(1)?,
            filename: row.get(2)?,
            extension: row.get(3)?,
            status: parse_column(4, &status)?,
            extracted_text: row.get(5)?,
            summary: row.get(6)?,
            length_mode: length_mode.as_deref().map(LengthMode::from_selector),
            created_at: parse_timestamp(8, &created_at)?,
            processed_at: processed_at
                .as_deref()
                .map(|ts| parse_timestamp(9, ts))
                .transpose()?,
            last_error,
        })
    }
}

fn parse_column<T>(index: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[async_trait]
impl StatusSink for SqliteDocumentStore {
    async fn record_transition(
        &self,
        document_id: &str,
        status: DocumentStatus,
        fields: StatusFields,
    ) -> DocsumResult<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT status FROM documents WHERE id = ?1",
                [document_id],
                |row| row.get(0),
            )
            .optional()?;
        let current: DocumentStatus = match stored {
            Some(value) => value
                .parse()
                .map_err(|_| DocsumError::database(format!("unknown stored status '{}'", value)))?,
            None => return Err(DocsumError::not_found(document_id)),
        };
        if !current.can_transition_to(status) {
            return Err(DocsumError::InvalidTransition {
                document_id: document_id.to_string(),
                from: current,
                to: status,
            });
        }

        let (error_class, error_stage, error_detail) = match &fields.error {
            Some(e) => (
                Some(e.class.clone()),
                Some(e.stage.as_ref().to_string()),
                Some(e.detail.clone()),
            ),
            None => (None, None, None),
        };

        tx.execute(
            r#"
            UPDATE documents SET
                status         = ?2,
                extracted_text = COALESCE(?3, extracted_text),
                summary        = COALESCE(?4, summary),
                length_mode    = COALESCE(?5, length_mode),
                processed_at   = COALESCE(?6, processed_at),
                error_class    = COALESCE(?7, error_class),
                error_stage    = COALESCE(?8, error_stage),
                error_detail   = COALESCE(?9, error_detail)
            WHERE id = ?1
            "#,
            params![
                document_id,
                status.as_ref(),
                fields.extracted_text,
                fields.summary,
                fields.length_mode.map(|m| m.as_ref().to_string()),
                fields.processed_at.map(|ts| ts.to_rfc3339()),
                error_class,
                error_stage,
                error_detail,
            ],
        )?;
        Self::append_history(&tx, document_id, status)?;
        tx.commit()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusTracker;

    fn uploaded(store: &SqliteDocumentStore) -> Document {
        let doc = Document::uploaded("raw_documents/1_ab_notes.txt", "notes.txt", "txt");
        store.create(&doc).unwrap();
        doc
    }

    #[test]
    fn test_create_and_get() {
        let store = SqliteDocumentStore::new(":memory:").unwrap();
        let doc = uploaded(&store);

        let loaded = store.get(&doc.id).unwrap().unwrap();
        assert_eq!(loaded.locator, doc.locator);
        assert_eq!(loaded.status, DocumentStatus::Uploaded);
        assert!(loaded.summary.is_none());
        assert!(store.get("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tracker_writes_through() {
        let store = Arc::new(SqliteDocumentStore::new(":memory:").unwrap());
        let doc = uploaded(&store);

        let mut tracker = StatusTracker::new(doc.id.clone(), store.clone());
        tracker.advance(DocumentStatus::Extracting).await.unwrap();
        tracker.advance(DocumentStatus::Summarizing).await.unwrap();
        tracker.complete("the gist", LengthMode::Long).await.unwrap();

        let loaded = store.get(&doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Completed);
        assert_eq!(loaded.summary.as_deref(), Some("the gist"));
        assert_eq!(loaded.length_mode, Some(LengthMode::Long));
        assert!(loaded.processed_at.is_some());

        let statuses: Vec<String> = store
            .history(&doc.id)
            .unwrap()
            .into_iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(
            statuses,
            vec!["uploaded", "extracting", "summarizing", "completed"]
        );
    }

    #[tokio::test]
    async fn test_failed_document_cannot_be_rerun() {
        let store = Arc::new(SqliteDocumentStore::new(":memory:").unwrap());
        let doc = uploaded(&store);

        let mut tracker = StatusTracker::new(doc.id.clone(), store.clone());
        tracker.advance(DocumentStatus::Extracting).await.unwrap();
        tracker
            .fail(&DocsumError::no_text("nothing found"))
            .await
            .unwrap();

        let failed = store.get(&doc.id).unwrap().unwrap();
        assert_eq!(failed.status, DocumentStatus::Failed);
        let error = failed.last_error.unwrap();
        assert_eq!(error.class, "ExtractionFailed");
        assert_eq!(error.stage, DocumentStatus::Extracting);

        let mut rerun = StatusTracker::new(doc.id.clone(), store.clone());
        let err = rerun.advance(DocumentStatus::Extracting).await.unwrap_err();
        assert!(matches!(
            err,
            DocsumError::InvalidTransition {
                from: DocumentStatus::Failed,
                to: DocumentStatus::Extracting,
                ..
            }
        ));

        let still = store.get(&doc.id).unwrap().unwrap();
        assert_eq!(still.status, DocumentStatus::Failed);
        assert_eq!(still.last_error.unwrap().class, "ExtractionFailed");
        assert_eq!(store.history(&doc.id).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stale_writes_are_refused() {
        let store = SqliteDocumentStore::new(":memory:").unwrap();
        let doc = uploaded(&store);

        store
            .record_transition(&doc.id, DocumentStatus::Extracting, StatusFields::default())
            .await
            .unwrap();
        // a second run still believing the document is uploaded
        let err = store
            .record_transition(&doc.id, DocumentStatus::Extracting, StatusFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocsumError::InvalidTransition { .. }));
        assert_eq!(
            store.get(&doc.id).unwrap().unwrap().status,
            DocumentStatus::Extracting
        );
    }

    #[tokio::test]
    async fn test_unknown_document_is_an_error() {
        let store = SqliteDocumentStore::new(":memory:").unwrap();
        let err = store
            .record_transition("nope", DocumentStatus::Extracting, StatusFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocsumError::DocumentNotFound { .. }));
    }

    #[test]
    fn test_file_backed_store_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.db");
        let store = SqliteDocumentStore::new(&path).unwrap();
        uploaded(&store);
        assert!(path.exists());
    }
}
