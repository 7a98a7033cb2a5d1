use std::{
    ffi::OsString,
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

use crate::errors::ServiceError;

/// Anything stored in a [`JsonListStore`] must expose its identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Generic append-only JSON file store.
///
/// Persists a `Vec<T>` as a JSON array. The file is the only source of truth:
/// every call re-reads it, and every append rewrites it in full. A missing
/// file reads as an empty list.
///
/// Appends on one instance are serialized by an internal lock; reads never
/// wait on it. The rewrite goes through a sibling temp file and a rename, so
/// a failed write leaves the previous contents in place.
pub struct JsonListStore<T> {
    file_path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonListStore<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Clone + Identified + Send + Sync,
{
    /// Initialize the store from a path. Creates the file with an empty array if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::write_failed)?;
            }
        }

        let store = Self { file_path, write_lock: Mutex::new(()), _marker: PhantomData };
        if fs::metadata(&store.file_path).await.is_err() {
            store.save(&[]).await?;
            debug!(path = %store.file_path.display(), "initialized empty store file");
        }
        Ok(Arc::new(store))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load(&self) -> Result<Vec<T>, ServiceError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServiceError::read_failed(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(ServiceError::read_failed)
    }

    async fn save(&self, items: &[T]) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(items).map_err(ServiceError::write_failed)?;
        let tmp = self.tmp_path();
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::write_failed(e));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::write_failed(e));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.file_path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// All entries in insertion order.
    pub async fn list(&self) -> Result<Vec<T>, ServiceError> {
        self.load().await
    }

    /// Entry whose id matches exactly, if any.
    pub async fn find(&self, id: &str) -> Result<Option<T>, ServiceError> {
        let items = self.load().await?;
        Ok(items.into_iter().find(|item| item.id() == id))
    }

    /// Append an entry and rewrite the whole file. Returns the stored entry.
    pub async fn append(&self, item: T) -> Result<T, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(ServiceError::Persistence(format!(
                "Failed to save data: duplicate id {}",
                item.id()
            )));
        }
        items.push(item.clone());
        self.save(&items).await?;
        info!(path = %self.file_path.display(), id = item.id(), total = items.len(), "appended entry");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        #[serde(default)]
        body: String,
    }

    impl Identified for Note {
        fn id(&self) -> &str { &self.id }
    }

    fn note(id: &str, body: &str) -> Note {
        Note { id: id.into(), body: body.into() }
    }

    fn tmp_file(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.json", prefix, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_list_store_appends_in_order_and_persists() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store");
        let store = JsonListStore::<Note>::new(&tmp).await?;

        // file exists and reads as empty
        assert!(fs::metadata(&tmp).await.is_ok());
        assert!(store.list().await?.is_empty());

        store.append(note("a", "first")).await?;
        store.append(note("b", "second")).await?;
        store.append(note("c", "third")).await?;

        let ids: Vec<String> = store.list().await?.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.find("b").await?, Some(note("b", "second")));
        assert_eq!(store.find("zzz").await?, None);

        // a fresh instance sees the same data
        let reloaded = JsonListStore::<Note>::new(&tmp).await?;
        assert_eq!(reloaded.list().await?.len(), 3);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn removed_file_reads_as_empty() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store_removed");
        let store = JsonListStore::<Note>::new(&tmp).await?;
        store.append(note("a", "x")).await?;

        fs::remove_file(&tmp).await?;
        assert!(store.list().await?.is_empty());
        assert_eq!(store.find("a").await?, None);

        // append recreates the file
        store.append(note("b", "y")).await?;
        assert_eq!(store.list().await?, vec![note("b", "y")]);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_error_and_is_not_overwritten() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store_corrupt");
        fs::write(&tmp, b"{not json").await?;
        let store = JsonListStore::<Note>::new(&tmp).await?;

        assert!(matches!(store.list().await, Err(ServiceError::Persistence(_))));
        assert!(matches!(store.append(note("a", "x")).await, Err(ServiceError::Persistence(_))));
        assert_eq!(fs::read(&tmp).await?, b"{not json");

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_load_as_default() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store_defaults");
        fs::write(&tmp, br#"[{"id":"old"}]"#).await?;
        let store = JsonListStore::<Note>::new(&tmp).await?;
        assert_eq!(store.find("old").await?, Some(note("old", "")));

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store_dup");
        let store = JsonListStore::<Note>::new(&tmp).await?;
        store.append(note("a", "x")).await?;
        assert!(matches!(store.append(note("a", "y")).await, Err(ServiceError::Persistence(_))));
        assert_eq!(store.list().await?.len(), 1);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("json_list_store_concurrent");
        let store = JsonListStore::<Note>::new(&tmp).await?;

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.append(note(&format!("n{i}"), "v")).await }));
        }
        for h in handles {
            h.await??;
        }
        assert_eq!(store.list().await?.len(), 20);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }
}
