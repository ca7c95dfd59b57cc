use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};
use crate::queue::FilePendingQueue;
use crate::store::BUGS_COLLECTION;
use crate::util::{expand_tilde, write_atomic};

fn default_collection() -> String {
    BUGS_COLLECTION.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugdeskConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_path: Option<String>,
}

impl Default for BugdeskConfig {
    fn default() -> Self {
        Self {
            version: 1,
            store_url: None,
            api_key: None,
            collection: default_collection(),
            queue_path: None,
        }
    }
}

impl BugdeskConfig {
    /// Where unsent reports are kept: the configured path, else the per-user data dir.
    pub fn resolved_queue_path(&self) -> Result<PathBuf> {
        match self.queue_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(p) => Ok(PathBuf::from(expand_tilde(p))),
            None => FilePendingQueue::default_path()
                .ok_or_else(|| ReportError::Custom("Cannot find local data directory".into())),
        }
    }
}

/// `~/.bugdesk/config.json`
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".bugdesk").join("config.json"))
}

pub async fn load_config() -> Result<Option<BugdeskConfig>> {
    match config_path() {
        Some(path) => load_config_from(&path).await,
        None => Ok(None),
    }
}

/// `Ok(None)` when the file doesn't exist. A file that doesn't parse is an error.
pub async fn load_config_from(path: &Path) -> Result<Option<BugdeskConfig>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content).map(Some).map_err(|e| {
        ReportError::Custom(format!("Config {} is corrupt: {e}", path.display()))
    })
}

pub async fn save_store_settings(
    store_url: Option<String>,
    api_key: Option<String>,
    queue_path: Option<String>,
) -> Result<BugdeskConfig> {
    let path = config_path()
        .ok_or_else(|| ReportError::Custom("Cannot find home directory".into()))?;
    save_store_settings_to(&path, store_url, api_key, queue_path).await
}

/// Merge the given fields into the config at `path`. `None` leaves a field unchanged.
/// Refuses to touch a config file it can't parse.
pub async fn save_store_settings_to(
    path: &Path,
    store_url: Option<String>,
    api_key: Option<String>,
    queue_path: Option<String>,
) -> Result<BugdeskConfig> {
    let mut config = load_config_from(path).await?.unwrap_or_default();

    if let Some(url) = store_url {
        config.store_url = Some(url.trim_end_matches('/').to_string());
    }
    if api_key.is_some() {
        config.api_key = api_key;
    }
    if let Some(queue_path) = queue_path {
        // Store absolute so the queue doesn't move with the working directory
        config.queue_path = Some(expand_tilde(&queue_path));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&config)?;
    write_atomic(path, json.as_bytes()).await?;

    Ok(config)
}
