use std::sync::Arc;

use service::file::uploads::UploadLimit;
use service::repo::{FileMetadataRepository, StringDataRepository};

/// Shared state for the string data routes.
#[derive(Clone)]
pub struct StringDataState {
    pub store: Arc<dyn StringDataRepository>,
}

/// Shared state for the upload routes.
#[derive(Clone)]
pub struct UploadState {
    pub store: Arc<dyn FileMetadataRepository>,
    pub limit: UploadLimit,
}

impl UploadState {
    /// Request body cap for `/upload/`. Leaves room above the upload limit so
    /// oversize payloads are measured in full and rejected by the size check.
    pub fn body_limit(&self) -> usize {
        let max = self.limit.max_bytes();
        let cap = max.saturating_mul(2).saturating_add(64 * 1024);
        usize::try_from(cap).unwrap_or(usize::MAX)
    }
}
