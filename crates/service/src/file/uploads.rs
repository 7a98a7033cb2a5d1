use std::{path::PathBuf, sync::Arc};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;
use crate::errors::ServiceError;
use crate::repo::FileMetadataRepository;
use crate::storage::{Identified, JsonListStore};

const MIB: u64 = 1024 * 1024;

/// Upload size threshold: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * MIB;

/// Content type recorded when the client does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata kept for every accepted upload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileMetadata {
    pub id: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub file_size: u64,
    pub upload_time: DateTime<Utc>,
}

impl Identified for FileMetadata {
    fn id(&self) -> &str { &self.id }
}

/// A fully received upload, before any checks.
#[derive(Clone, Debug)]
pub struct UploadInput {
    pub original_filename: String,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

/// Accept/reject classification on the measured payload size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimit {
    max_bytes: u64,
}

impl UploadLimit {
    pub fn new(max_bytes: u64) -> Self { Self { max_bytes } }

    pub fn max_bytes(&self) -> u64 { self.max_bytes }

    /// `size <= max` passes, zero included.
    pub fn check(&self, size: u64) -> Result<(), ServiceError> {
        if size > self.max_bytes {
            return Err(self.exceeded());
        }
        Ok(())
    }

    /// The error reported for any payload over the limit.
    pub fn exceeded(&self) -> ServiceError {
        ServiceError::PayloadTooLarge(format!("File size exceeds {} limit", human_size(self.max_bytes)))
    }
}

impl Default for UploadLimit {
    fn default() -> Self { Self::new(MAX_UPLOAD_BYTES) }
}

fn human_size(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// File-backed upload store: payloads under `upload_dir/<id>`, metadata in a JSON list.
#[derive(Clone)]
pub struct FileUploadStore {
    store: Arc<JsonListStore<FileMetadata>>,
    upload_dir: PathBuf,
    limit: UploadLimit,
}

impl FileUploadStore {
    /// Initialize the metadata file and the payload directory.
    pub async fn new<P, D>(metadata_path: P, upload_dir: D, limit: UploadLimit) -> Result<Arc<Self>, ServiceError>
    where
        P: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        let store = JsonListStore::<FileMetadata>::new(metadata_path).await?;
        let upload_dir = upload_dir.into();
        fs::create_dir_all(&upload_dir).await.map_err(ServiceError::write_failed)?;
        Ok(Arc::new(Self { store, upload_dir, limit }))
    }

    pub fn limit(&self) -> UploadLimit { self.limit }

    /// Check the size, keep the payload, then append its metadata.
    pub async fn upload(&self, input: UploadInput) -> Result<FileMetadata, ServiceError> {
        let file_size = input.payload.len() as u64;
        if let Err(e) = self.limit.check(file_size) {
            warn!(file_size, max = self.limit.max_bytes(), filename = %input.original_filename, "upload rejected");
            return Err(e);
        }

        let meta = FileMetadata {
            id: Uuid::new_v4().to_string(),
            original_filename: input.original_filename,
            content_type: input
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            file_size,
            upload_time: Utc::now(),
        };

        let blob = self.upload_dir.join(&meta.id);
        fs::write(&blob, &input.payload).await.map_err(ServiceError::write_failed)?;

        match self.store.append(meta).await {
            Ok(meta) => {
                info!(id = %meta.id, file_size, content_type = %meta.content_type, "stored upload");
                Ok(meta)
            }
            Err(e) => {
                // metadata never landed; drop the orphaned payload
                let _ = fs::remove_file(&blob).await;
                Err(e)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<FileMetadata>, ServiceError> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> Result<FileMetadata, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("File"))
    }
}

#[async_trait::async_trait]
impl FileMetadataRepository for FileUploadStore {
    async fn upload(&self, input: UploadInput) -> Result<FileMetadata, ServiceError> { self.upload(input).await }
    async fn list(&self) -> Result<Vec<FileMetadata>, ServiceError> { self.list().await }
    async fn get(&self, id: &str) -> Result<FileMetadata, ServiceError> { self.get(id).await }
}
