use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::errors::ServiceError;
use crate::repo::StringDataRepository;
use crate::storage::{Identified, JsonListStore};

/// One persisted string pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StringRecord {
    pub id: String,
    #[serde(default)]
    pub string1: String,
    #[serde(default)]
    pub string2: String,
    pub timestamp: DateTime<Utc>,
}

impl Identified for StringRecord {
    fn id(&self) -> &str { &self.id }
}

/// Input model: id and timestamp are assigned by the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StringDataInput {
    pub string1: String,
    pub string2: String,
}

/// File-backed store for string pairs.
#[derive(Clone)]
pub struct StringDataStore {
    store: Arc<JsonListStore<StringRecord>>,
}

impl StringDataStore {
    /// Initialize the store, creating an empty file if it does not exist.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::<StringRecord>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Append a new record with a fresh id and the current time.
    pub async fn save(&self, input: StringDataInput) -> Result<StringRecord, ServiceError> {
        let rec = StringRecord {
            id: Uuid::new_v4().to_string(),
            string1: input.string1,
            string2: input.string2,
            timestamp: Utc::now(),
        };
        self.store.append(rec).await
    }

    pub async fn list(&self) -> Result<Vec<StringRecord>, ServiceError> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> Result<StringRecord, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Data entry"))
    }
}

#[async_trait::async_trait]
impl StringDataRepository for StringDataStore {
    async fn save(&self, input: StringDataInput) -> Result<StringRecord, ServiceError> { self.save(input).await }
    async fn list(&self) -> Result<Vec<StringRecord>, ServiceError> { self.list().await }
    async fn get(&self, id: &str) -> Result<StringRecord, ServiceError> { self.get(id).await }
}
