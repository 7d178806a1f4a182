//! # sb-attachments
//!
//! Object storage for site photos and documents.
//!
//! - `Storage` abstraction with local filesystem and in-memory backends
//! - `PhotoUploader`: size and type checks, key generation, `PhotoRef` creation
//!
//! Removing a reference from a project never deletes the stored object.

pub mod storage;
pub mod upload;

pub use storage::{
    content_type_for, generate_key, sanitize_file_name, LocalStorage, MemoryStorage, Storage,
    StorageError, StorageResult, StoredObject,
};
pub use upload::{PhotoUpload, PhotoUploader, UploadConfig, UploadError, UploadResult};
