//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The RapidAPI key is loaded from the RAPIDAPI_KEY env var or `key_file`,
//! never stored in the TOML directly.

use common::Secret;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rapidapi: RapidApiConfig,
}

/// Backend origin and request settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the token file lives
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

/// Flight provider headers forwarded on searches
#[derive(Debug, Deserialize)]
pub struct RapidApiConfig {
    #[serde(default = "default_rapidapi_host")]
    pub host: String,
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(skip)]
    pub key: Option<Secret<String>>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

impl Default for RapidApiConfig {
    fn default() -> Self {
        Self {
            host: default_rapidapi_host(),
            key_file: None,
            key: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_token_file() -> PathBuf {
    PathBuf::from("tokens.json")
}

fn default_rapidapi_host() -> String {
    travel_api::flights::DEFAULT_RAPIDAPI_HOST.to_string()
}

impl Config {
    /// Load configuration from a TOML file, then resolve the RapidAPI key
    /// (RAPIDAPI_KEY env var first, then `key_file`).
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }
        Url::parse(&config.api.base_url).map_err(|e| {
            common::Error::Config(format!("base_url {} is invalid: {e}", config.api.base_url))
        })?;

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        config.rapidapi.key =
            Secret::resolve("RAPIDAPI_KEY", config.rapidapi.key_file.as_deref())?;

        Ok(config)
    }

    /// Parsed API origin. `load` has already validated it.
    pub fn origin(&self) -> common::Result<Url> {
        Url::parse(&self.api.base_url)
            .map_err(|e| common::Error::Config(format!("base_url: {e}")))
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("travel.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch RAPIDAPI_KEY / CONFIG_PATH.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("travel.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    const MINIMAL: &str = r#"
[api]
base_url = "http://localhost:8000"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("RAPIDAPI_KEY") };
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load(&write_config(&dir, MINIMAL)).unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.token_file, PathBuf::from("tokens.json"));
        assert_eq!(config.rapidapi.host, "booking-com15.p.rapidapi.com");
        assert!(config.rapidapi.key.is_none());
        assert_eq!(config.origin().unwrap().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("RAPIDAPI_KEY") };
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("rapidapi_key");
        std::fs::write(&key_path, "file-key\n").unwrap();

        let body = format!(
            r#"
[api]
base_url = "https://travel.example.com"
timeout_secs = 5

[storage]
token_file = "/var/lib/travel/tokens.json"

[rapidapi]
host = "sky.example.com"
key_file = "{}"
"#,
            key_path.display()
        );
        let config = Config::load(&write_config(&dir, &body)).unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(
            config.storage.token_file,
            PathBuf::from("/var/lib/travel/tokens.json")
        );
        assert_eq!(config.rapidapi.host, "sky.example.com");
        assert_eq!(config.rapidapi.key.as_ref().unwrap().expose(), "file-key");
    }

    #[test]
    fn env_key_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let body = r#"
[api]
base_url = "http://localhost:8000"

[rapidapi]
key_file = "/nonexistent/rapidapi_key"
"#;
        unsafe { set_env("RAPIDAPI_KEY", "env-key") };
        let config = Config::load(&write_config(&dir, body));
        unsafe { remove_env("RAPIDAPI_KEY") };

        assert_eq!(config.unwrap().rapidapi.key.unwrap().expose(), "env-key");
    }

    #[test]
    fn missing_key_file_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("RAPIDAPI_KEY") };
        let dir = tempfile::tempdir().unwrap();
        let body = r#"
[api]
base_url = "http://localhost:8000"

[rapidapi]
key_file = "/nonexistent/rapidapi_key"
"#;
        assert!(Config::load(&write_config(&dir, body)).is_err());
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"
[api]
base_url = "localhost:8000"
"#;
        let err = Config::load(&write_config(&dir, body)).unwrap_err();
        assert!(
            err.to_string().contains("base_url must start with http"),
            "got: {err}"
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"
[api]
base_url = "http://localhost:8000"
timeout_secs = 0
"#;
        assert!(Config::load(&write_config(&dir, body)).is_err());
    }

    #[test]
    fn missing_api_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&write_config(&dir, "[storage]\n")).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/travel.toml")).is_err());
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();

        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("travel.toml"));

        unsafe { set_env("CONFIG_PATH", "/env/travel.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/env/travel.toml"));
        assert_eq!(
            Config::resolve_path(Some("/cli/travel.toml")),
            PathBuf::from("/cli/travel.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
