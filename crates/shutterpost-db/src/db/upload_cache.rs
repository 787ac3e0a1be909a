//! Upload cache repository: fingerprint → prior upload record.

use chrono::{DateTime, Utc};
use shutterpost_core::models::{FileFingerprint, UploadRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::schema::SCHEMA_STATEMENTS;
use crate::error::{StorageError, StorageResult};

const BUSY_TIMEOUT_SECS: u64 = 5;

const SELECT_COLUMNS: &str =
    "fingerprint, service, remote_id, page_url, image_url, uploaded_at, filename, size";

/// Row type for the uploads table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct UploadRow {
    pub fingerprint: String,
    pub service: String,
    pub remote_id: String,
    pub page_url: String,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub filename: String,
    pub size: i64,
}

impl UploadRow {
    pub fn to_upload_record(self) -> StorageResult<UploadRecord> {
        let fingerprint: FileFingerprint = self
            .fingerprint
            .parse()
            .map_err(|e| StorageError::InvalidRow(format!("{}", e)))?;
        let size = u64::try_from(self.size).map_err(|_| {
            StorageError::InvalidRow(format!("negative size {} for {}", self.size, fingerprint))
        })?;

        Ok(UploadRecord {
            fingerprint,
            service: self.service,
            remote_id: self.remote_id,
            page_url: self.page_url,
            image_url: self.image_url,
            uploaded_at: self.uploaded_at,
            filename: self.filename,
            size,
        })
    }
}

/// Repository for the uploads table.
///
/// Cloning shares the pool and the write lock. Reads may run concurrently;
/// writes go through one transaction at a time.
#[derive(Clone)]
pub struct UploadCacheRepository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    path: PathBuf,
}

impl UploadCacheRepository {
    /// Open the cache file at `path`, creating parent directories, the file
    /// and the schema as needed.
    #[tracing::instrument(skip(path), fields(db.path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|source| StorageError::Open {
                path: path.clone(),
                source,
            })?;

        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(StorageError::Schema)?;
        }

        tracing::debug!("Upload cache ready");

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the pool. Further calls fail with a query error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Point lookup by fingerprint.
    #[tracing::instrument(skip(self, fingerprint), fields(db.table = "uploads", fingerprint = %fingerprint))]
    pub async fn lookup(&self, fingerprint: &FileFingerprint) -> StorageResult<Option<UploadRecord>> {
        let row: Option<UploadRow> = sqlx::query_as::<Sqlite, UploadRow>(&format!(
            "SELECT {} FROM uploads WHERE fingerprint = ?1",
            SELECT_COLUMNS
        ))
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UploadRow::to_upload_record).transpose()
    }

    /// Insert or fully replace the record for `record.fingerprint`.
    #[tracing::instrument(
        skip(self, record),
        fields(db.table = "uploads", fingerprint = %record.fingerprint, remote_id = %record.remote_id)
    )]
    pub async fn record(&self, record: &UploadRecord) -> StorageResult<()> {
        let size = i64::try_from(record.size).map_err(|_| {
            StorageError::InvalidRow(format!("size {} does not fit the cache", record.size))
        })?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO uploads (fingerprint, service, remote_id, page_url, image_url, uploaded_at, filename, size)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (fingerprint) DO UPDATE SET
                service = excluded.service,
                remote_id = excluded.remote_id,
                page_url = excluded.page_url,
                image_url = excluded.image_url,
                uploaded_at = excluded.uploaded_at,
                filename = excluded.filename,
                size = excluded.size
            "#,
        )
        .bind(record.fingerprint.as_str())
        .bind(&record.service)
        .bind(&record.remote_id)
        .bind(&record.page_url)
        .bind(&record.image_url)
        .bind(record.uploaded_at)
        .bind(&record.filename)
        .bind(size)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Newest record for a remote asset.
    #[tracing::instrument(skip(self), fields(db.table = "uploads"))]
    pub async fn find_by_remote_id(
        &self,
        service: &str,
        remote_id: &str,
    ) -> StorageResult<Option<UploadRecord>> {
        let row: Option<UploadRow> = sqlx::query_as::<Sqlite, UploadRow>(&format!(
            "SELECT {} FROM uploads WHERE service = ?1 AND remote_id = ?2 \
             ORDER BY uploaded_at DESC, rowid DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(service)
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UploadRow::to_upload_record).transpose()
    }

    /// All records with this filename, newest first.
    ///
    /// Only a hint for metadata searches; never a duplicate decision.
    #[tracing::instrument(skip(self), fields(db.table = "uploads"))]
    pub async fn find_by_filename(&self, filename: &str) -> StorageResult<Vec<UploadRecord>> {
        let rows: Vec<UploadRow> = sqlx::query_as::<Sqlite, UploadRow>(&format!(
            "SELECT {} FROM uploads WHERE filename = ?1 ORDER BY uploaded_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(filename)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UploadRow::to_upload_record).collect()
    }

    /// Remove the record for `fingerprint`. Returns whether a row existed.
    #[tracing::instrument(skip(self, fingerprint), fields(db.table = "uploads", fingerprint = %fingerprint))]
    pub async fn forget(&self, fingerprint: &FileFingerprint) -> StorageResult<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM uploads WHERE fingerprint = ?1")
            .bind(fingerprint.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of cached records.
    pub async fn count(&self) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
