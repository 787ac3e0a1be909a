use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::CHECKSUM_PREDICATE;

/// Length of a hex-encoded MD5 digest.
const FINGERPRINT_HEX_LEN: usize = 32;

/// Content hash (MD5, lowercase hex) of a file's bytes.
///
/// Identical bytes always produce an identical fingerprint, regardless of the
/// file's name, location or modification time. It is the primary key of the
/// local upload cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileFingerprint(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid fingerprint '{0}': expected 32 hexadecimal characters")]
pub struct FingerprintParseError(pub String);

impl FileFingerprint {
    /// Build a fingerprint from a raw digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileFingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != FINGERPRINT_HEX_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(FingerprintParseError(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for FileFingerprint {
    type Error = FingerprintParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileFingerprint> for String {
    fn from(value: FileFingerprint) -> Self {
        value.0
    }
}

impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call description of a local file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub fingerprint: FileFingerprint,
    pub size: u64,
    pub filename: String,
}

impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, fingerprint: FileFingerprint, size: u64) -> Self {
        let path = path.into();
        let filename = filename_of(&path);
        Self {
            path,
            fingerprint,
            size,
            filename,
        }
    }

    /// Filename with its last extension removed, used as free-text search input.
    pub fn stem(&self) -> &str {
        match self.filename.rfind('.') {
            Some(idx) if idx > 0 => &self.filename[..idx],
            _ => &self.filename,
        }
    }
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Machine tag stored on an uploaded asset: `namespace:checksum=<fingerprint>`.
pub fn checksum_machine_tag(namespace: &str, fingerprint: &FileFingerprint) -> String {
    format!("{}:{}={}", namespace, CHECKSUM_PREDICATE, fingerprint)
}

/// Extract the fingerprint from a checksum machine tag in `namespace`.
///
/// Services may normalise tag case, so the namespace and predicate compare
/// case-insensitively. Tags that are not checksum tags, or whose value is not
/// a valid fingerprint, yield `None`.
pub fn parse_checksum_machine_tag(namespace: &str, tag: &str) -> Option<FileFingerprint> {
    let (key, value) = tag.trim().trim_matches('"').split_once('=')?;
    let (ns, predicate) = key.split_once(':')?;
    if !ns.eq_ignore_ascii_case(namespace) || !predicate.eq_ignore_ascii_case(CHECKSUM_PREDICATE) {
        return None;
    }
    value.parse().ok()
}
