use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

/// Upload size threshold: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_string_data_port")]
    pub string_data_port: u16,
    #[serde(default = "default_file_upload_port")]
    pub file_upload_port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            string_data_port: default_string_data_port(),
            file_upload_port: default_file_upload_port(),
            worker_threads: Some(4),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Defaults to `<data_dir>/data.json`.
    #[serde(default)]
    pub records_file: Option<PathBuf>,
    /// Defaults to `<data_dir>/files.json`.
    #[serde(default)]
    pub files_file: Option<PathBuf>,
    /// Defaults to `<data_dir>/uploads`.
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            records_file: None,
            files_file: None,
            upload_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_string_data_port() -> u16 { 8000 }
fn default_file_upload_port() -> u16 { 8001 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_max_upload_bytes() -> u64 { DEFAULT_MAX_UPLOAD_BYTES }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Load `path`, or build the config from the environment when the file does
/// not exist. A file that exists but cannot be read or parsed is an error.
pub fn load_file_or_env(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => load_from_str(&content).map_err(|e| anyhow!("cannot parse {path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => from_env(),
        Err(e) => Err(anyhow!("cannot read {path}: {e}")),
    }
}

/// Build a config purely from environment variables, falling back to defaults.
pub fn from_env() -> Result<AppConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from `lookup`; a set but unparseable value is an error.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
        raw.trim()
            .parse::<T>()
            .map_err(|_| anyhow!("{key}={raw:?} is not a valid value"))
    }

    let mut cfg = AppConfig::default();
    if let Some(host) = var("SERVER_HOST") { cfg.server.host = host; }
    if let Some(v) = var("STRING_DATA_PORT") { cfg.server.string_data_port = parse("STRING_DATA_PORT", &v)?; }
    if let Some(v) = var("FILE_UPLOAD_PORT") { cfg.server.file_upload_port = parse("FILE_UPLOAD_PORT", &v)?; }
    if let Some(v) = var("TOKIO_WORKER_THREADS") { cfg.server.worker_threads = Some(parse("TOKIO_WORKER_THREADS", &v)?); }
    if let Some(v) = var("DATA_DIR") { cfg.storage.data_dir = PathBuf::from(v); }
    if let Some(v) = var("MAX_UPLOAD_BYTES") { cfg.storage.max_upload_bytes = parse("MAX_UPLOAD_BYTES", &v)?; }
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); use the environment when the file is absent.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_file_or_env(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.string_data_port == 0 || self.file_upload_port == 0 {
            return Err(anyhow!("server ports must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("storage.max_upload_bytes must be >= 1"));
        }
        Ok(())
    }

    pub fn records_path(&self) -> PathBuf {
        self.records_file.clone().unwrap_or_else(|| self.data_dir.join("data.json"))
    }

    pub fn files_path(&self) -> PathBuf {
        self.files_file.clone().unwrap_or_else(|| self.data_dir.join("files.json"))
    }

    pub fn upload_path(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(|| self.data_dir.join("uploads"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let mut cfg = load_from_str("")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.string_data_port, 8000);
        assert_eq!(cfg.server.file_upload_port, 8001);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.max_upload_bytes, 5_242_880);
        assert_eq!(cfg.storage.records_path(), PathBuf::from("data/data.json"));
        assert_eq!(cfg.storage.files_path(), PathBuf::from("data/files.json"));
        assert_eq!(cfg.storage.upload_path(), PathBuf::from("data/uploads"));
        Ok(())
    }

    #[test]
    fn explicit_paths_override_data_dir() -> Result<()> {
        let cfg = load_from_str(
            r#"
            [storage]
            data_dir = "/var/lib/app"
            records_file = "/tmp/records.json"
            "#,
        )?;
        assert_eq!(cfg.storage.records_path(), PathBuf::from("/tmp/records.json"));
        assert_eq!(cfg.storage.files_path(), PathBuf::from("/var/lib/app/files.json"));
        Ok(())
    }

    #[test]
    fn rejects_zero_port_and_zero_limit() -> Result<()> {
        let mut cfg = load_from_str("[server]\nstring_data_port = 0\n")?;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[storage]\nmax_upload_bytes = 0\n")?;
        assert!(cfg.normalize_and_validate().is_err());
        Ok(())
    }

    #[test]
    fn blank_host_and_zero_threads_are_normalized() -> Result<()> {
        let mut cfg = load_from_str("[server]\nhost = \"  \"\nworker_threads = 0\n")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        Ok(())
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    fn tmp_config(content: &str) -> Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("configs_{}_{}.toml", std::process::id(), unique()));
        std::fs::write(&path, content)?;
        Ok(path)
    }

    fn unique() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let path = tmp_config("[server\nstring_data_port = 9000")?;
        let res = load_file_or_env(&path.to_string_lossy());
        let _ = std::fs::remove_file(&path);
        assert!(res.is_err());
        Ok(())
    }

    #[test]
    fn existing_file_is_used() -> Result<()> {
        let path = tmp_config("[server]\nstring_data_port = 9000\n")?;
        let res = load_file_or_env(&path.to_string_lossy());
        let _ = std::fs::remove_file(&path);
        assert_eq!(res?.server.string_data_port, 9000);
        Ok(())
    }

    #[test]
    fn lookup_values_override_defaults() -> Result<()> {
        let vars = [
            ("SERVER_HOST", "0.0.0.0"),
            ("STRING_DATA_PORT", "9100"),
            ("FILE_UPLOAD_PORT", "9101"),
            ("TOKIO_WORKER_THREADS", "2"),
            ("DATA_DIR", "/srv/data"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ];
        let cfg = from_lookup(lookup(&vars))?;
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.string_data_port, 9100);
        assert_eq!(cfg.server.file_upload_port, 9101);
        assert_eq!(cfg.server.worker_threads, Some(2));
        assert_eq!(cfg.storage.records_path(), PathBuf::from("/srv/data/data.json"));
        assert_eq!(cfg.storage.max_upload_bytes, 1024);
        Ok(())
    }

    #[test]
    fn empty_lookup_gives_defaults() -> Result<()> {
        let cfg = from_lookup(|_| None)?;
        assert_eq!(cfg.server.string_data_port, 8000);
        assert_eq!(cfg.storage.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        Ok(())
    }

    #[test]
    fn unparseable_lookup_value_is_an_error() {
        let vars = [("STRING_DATA_PORT", "abc")];
        let err = from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("STRING_DATA_PORT"));
    }
}
