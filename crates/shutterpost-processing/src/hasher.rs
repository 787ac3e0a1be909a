//! Content hashing
//!
//! The fingerprint is the MD5 of the raw file bytes, read in fixed-size
//! chunks so large images never sit in memory whole. It depends on content
//! only: renaming, moving or touching a file leaves it unchanged.

use md5::{Digest, Md5};
use std::path::Path;
use tokio::io::AsyncReadExt;

use shutterpost_core::{FileError, FileFingerprint, FileInfo};

const CHUNK_SIZE: usize = 64 * 1024;

/// Fingerprint of the bytes at `path`.
pub async fn fingerprint(path: &Path) -> Result<FileFingerprint, FileError> {
    Ok(file_info(path).await?.fingerprint)
}

/// Fingerprint, byte size and filename of the file at `path`.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub async fn file_info(path: &Path) -> Result<FileInfo, FileError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;

    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut size: u64 = 0;
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| FileError::from_io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size += read as u64;
    }

    let fingerprint = FileFingerprint::from_digest(&hasher.finalize());
    tracing::debug!(fingerprint = %fingerprint, size, "Fingerprinted file");
    Ok(FileInfo::new(path, fingerprint, size))
}
