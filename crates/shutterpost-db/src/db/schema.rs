//! Schema of the upload cache file.

/// Statements run, in order, every time the cache is opened.
pub(crate) const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS uploads (
        fingerprint TEXT PRIMARY KEY NOT NULL,
        service     TEXT NOT NULL,
        remote_id   TEXT NOT NULL,
        page_url    TEXT NOT NULL,
        image_url   TEXT NOT NULL,
        uploaded_at TEXT NOT NULL,
        filename    TEXT NOT NULL,
        size        INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_uploads_service_remote_id ON uploads (service, remote_id)",
    "CREATE INDEX IF NOT EXISTS idx_uploads_filename ON uploads (filename)",
];
