//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the data directory (and any extra directories) exist before a
/// store touches them.
pub async fn ensure_data_dirs<P: AsRef<Path>>(data_dir: P, extra: &[P]) -> anyhow::Result<()> {
    let data_dir = data_dir.as_ref();
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    debug!(path = %data_dir.display(), "data directory ready");

    for dir in extra {
        let dir = dir.as_ref();
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(path = %dir.display(), error = %e, "cannot create directory; writes into it will fail");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_dirs() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("common_env_{}", uuid::Uuid::new_v4()));
        let data = root.join("data");
        let uploads = root.join("data").join("uploads");
        ensure_data_dirs(&data, &[&uploads]).await?;
        assert!(tokio::fs::metadata(&data).await?.is_dir());
        assert!(tokio::fs::metadata(&uploads).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
