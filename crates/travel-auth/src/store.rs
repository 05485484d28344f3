//! Persistent key-value token storage
//!
//! A flat JSON object on disk, `{"access_token": "...", "refresh_token": "..."}`.
//! Every write goes through a temp file + rename so a crash never leaves a
//! half-written file, and a tokio Mutex serializes writers (login, refresh
//! and logout can race).
//!
//! No expiry logic lives here: a stale access token stays until the server
//! rejects it and the session replaces or clears it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File-backed string map scoped to one client profile.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<BTreeMap<String, String>>,
}

impl TokenStore {
    /// Load the store from `path`, creating `{}` there on cold start.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading token file: {e}")))?;
            let entries: BTreeMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::StoreParse(format!("parsing token file: {e}")))?;
            info!(path = %path.display(), keys = entries.len(), "loaded token store");
            entries
        } else {
            info!(path = %path.display(), "token file not found, starting empty");
            let entries = BTreeMap::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Read a value.
    pub async fn get(&self, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.get(name).cloned()
    }

    /// Whether a key is present.
    pub async fn contains(&self, name: &str) -> bool {
        self.state.lock().await.contains_key(name)
    }

    /// Insert or replace a value and persist.
    pub async fn set(&self, name: &str, value: String) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(name.to_string(), value);
        debug!(key = name, "stored value");
        write_atomic(&self.path, &state).await
    }

    /// Remove a value and persist. Absent keys are a no-op.
    pub async fn remove(&self, name: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(name);
        if removed.is_some() {
            debug!(key = name, "removed value");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    /// Snapshot of stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.state.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write the map to `path` via temp file + rename, mode 0600 on unix.
async fn write_atomic(path: &Path, data: &BTreeMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::StoreParse(format!("serializing token file: {e}")))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => return Err(Error::Io("token path has no parent directory".into())),
    };

    let tmp_path = dir.join(format!(".tokens.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), "persisted token store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use std::sync::Arc;

    #[tokio::test]
    async fn values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = TokenStore::load(path.clone()).await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "T1".into()).await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1".into()).await.unwrap();

        let reloaded = TokenStore::load(path).await.unwrap();
        assert_eq!(reloaded.get(ACCESS_TOKEN_KEY).await.as_deref(), Some("T1"));
        assert_eq!(reloaded.get(REFRESH_TOKEN_KEY).await.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn cold_start_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        assert!(!path.exists());

        let store = TokenStore::load(path.clone()).await.unwrap();
        assert!(store.is_empty().await);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn set_replaces_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap();

        store.set(ACCESS_TOKEN_KEY, "T1".into()).await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "T2".into()).await.unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.as_deref(), Some("T2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn removing_absent_key_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap();
        store.set(ACCESS_TOKEN_KEY, "T1".into()).await.unwrap();

        assert_eq!(
            store.remove(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("T1")
        );
        assert!(store.remove(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        assert!(store.remove(REFRESH_TOKEN_KEY).await.unwrap().is_none());
        assert!(!store.contains(ACCESS_TOKEN_KEY).await);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "not json").unwrap();

        let result = TokenStore::load(path).await;
        assert!(matches!(result, Err(Error::StoreParse(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = TokenStore::load(path.clone()).await.unwrap();
        store.set(ACCESS_TOKEN_KEY, "T1".into()).await.unwrap();

        let mode = tokio::fs::metadata(&path)
            .await
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "token file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn concurrent_writers_keep_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = Arc::new(TokenStore::load(path.clone()).await.unwrap());

        let mut handles = vec![];
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set(&format!("key-{i}"), format!("v{i}")).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.len().await, 10);
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 10);
        assert_eq!(store.keys().await.first().map(String::as_str), Some("key-0"));
    }
}
