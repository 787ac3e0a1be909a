use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fingerprint::{FileFingerprint, FileInfo};

/// A prior upload of one file's bytes to one remote service.
///
/// Keyed by fingerprint. Recording the same fingerprint again replaces the
/// whole record; nothing is merged. Records are a performance hint: a remote
/// asset deleted out-of-band leaves its record behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub fingerprint: FileFingerprint,
    pub service: String,
    pub remote_id: String,
    pub page_url: String,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub filename: String,
    pub size: u64,
}

impl UploadRecord {
    /// Build the record persisted after a successful upload of `info`.
    pub fn from_outcome(info: &FileInfo, service: &str, outcome: &UploadOutcome) -> Self {
        Self {
            fingerprint: info.fingerprint.clone(),
            service: service.to_string(),
            remote_id: outcome.remote_id.clone(),
            page_url: outcome.page_url.clone(),
            image_url: outcome.image_url.clone(),
            uploaded_at: Utc::now(),
            filename: info.filename.clone(),
            size: info.size,
        }
    }
}

/// Remote step an [`UploadWarning`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStep {
    UploadBytes,
    SetFields,
    AddTags,
    SetVisibility,
    RecordCache,
}

impl UploadStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStep::UploadBytes => "upload-bytes",
            UploadStep::SetFields => "set-fields",
            UploadStep::AddTags => "add-tags",
            UploadStep::SetVisibility => "set-visibility",
            UploadStep::RecordCache => "record-cache",
        }
    }
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal step failure attached to one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadWarning {
    pub step: UploadStep,
    pub error: String,
}

impl UploadWarning {
    pub fn new(step: UploadStep, error: impl fmt::Display) -> Self {
        Self {
            step,
            error: error.to_string(),
        }
    }
}

/// Result of making sure a file is represented on a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub remote_id: String,
    pub page_url: String,
    pub image_url: String,
    #[serde(default)]
    pub warnings: Vec<UploadWarning>,
    /// True when the outcome comes from an existing record and nothing was uploaded.
    #[serde(default)]
    pub duplicate: bool,
}

impl UploadOutcome {
    /// Outcome for a file that was already present on the service.
    pub fn from_record(record: &UploadRecord) -> Self {
        Self {
            remote_id: record.remote_id.clone(),
            page_url: record.page_url.clone(),
            image_url: record.image_url.clone(),
            warnings: Vec::new(),
            duplicate: true,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Caller-supplied parameters for one `ensure_uploaded` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub force_upload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> UploadRecord {
        UploadRecord {
            fingerprint: "5eb63bbbe01eeed093cb22bb8f5acdc3".parse().unwrap(),
            service: "flickr".to_string(),
            remote_id: "123".to_string(),
            page_url: "https://svc/x/123".to_string(),
            image_url: "https://svc/img/123_o.jpg".to_string(),
            uploaded_at: Utc::now(),
            filename: "IMG_0001.jpg".to_string(),
            size: 2048,
        }
    }

    #[test]
    fn test_outcome_from_record_has_no_warnings() {
        let record = sample_record();
        let outcome = UploadOutcome::from_record(&record);
        assert_eq!(outcome.remote_id, "123");
        assert_eq!(outcome.page_url, "https://svc/x/123");
        assert!(!outcome.has_warnings());
        assert!(outcome.duplicate);
    }

    #[test]
    fn test_record_from_outcome() {
        let record = sample_record();
        let info = FileInfo::new("/photos/IMG_0001.jpg", record.fingerprint.clone(), 2048);
        let outcome = UploadOutcome {
            remote_id: "456".to_string(),
            page_url: "https://svc/x/456".to_string(),
            image_url: "https://svc/img/456.jpg".to_string(),
            warnings: vec![UploadWarning::new(UploadStep::AddTags, "rate limited")],
            duplicate: false,
        };

        let built = UploadRecord::from_outcome(&info, "flickr", &outcome);
        assert_eq!(built.fingerprint, record.fingerprint);
        assert_eq!(built.remote_id, "456");
        assert_eq!(built.filename, "IMG_0001.jpg");
        assert_eq!(built.size, 2048);
        assert_eq!(built.service, "flickr");
    }

    #[test]
    fn test_step_serialization() {
        let warning = UploadWarning::new(UploadStep::SetVisibility, "denied");
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["step"], "set-visibility");
        assert_eq!(json["error"], "denied");
        assert_eq!(UploadStep::SetFields.to_string(), "set-fields");
    }
}
