//! Object-storage references
//!
//! Documents only ever hold references; the bytes live in object storage.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reference to a stored object (photo or document)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Durable object-storage key
    #[validate(length(min = 1))]
    pub s3_key: String,

    /// Original file name as uploaded
    pub file_name: String,

    /// MIME type
    pub file_type: String,

    /// Retrieval link; may be time-limited and regenerated by the storage backend
    #[serde(default)]
    pub url: String,
}

/// Progress and blockage photos share the file reference shape
pub type PhotoRef = FileRef;

impl FileRef {
    pub fn new(
        s3_key: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            s3_key: s3_key.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            url: url.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}
