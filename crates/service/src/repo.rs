//! Trait seams between the HTTP layer and the stores.
//! Implementations can be file-backed or anything else that honours the
//! append/list/get contract.

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::file::string_data::{StringDataInput, StringRecord};
use crate::file::uploads::{FileMetadata, UploadInput};

#[async_trait]
pub trait StringDataRepository: Send + Sync {
    async fn save(&self, input: StringDataInput) -> Result<StringRecord, ServiceError>;
    async fn list(&self) -> Result<Vec<StringRecord>, ServiceError>;
    async fn get(&self, id: &str) -> Result<StringRecord, ServiceError>;
}

#[async_trait]
pub trait FileMetadataRepository: Send + Sync {
    async fn upload(&self, input: UploadInput) -> Result<FileMetadata, ServiceError>;
    async fn list(&self) -> Result<Vec<FileMetadata>, ServiceError>;
    async fn get(&self, id: &str) -> Result<FileMetadata, ServiceError>;
}
