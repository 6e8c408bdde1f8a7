//! Store connection settings.
//!
//! Loaded from an optional TOML file; `SUPABASE_URL` overrides the file's
//! `url`. The API key itself never lives in the file, only the name of the
//! environment variable that holds it.

use crate::error::StoreError;
use crate::fetch::{DEFAULT_BATCH_SIZE, FetchLimits};
use crate::store::STORE_ROW_CAP;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const DEFAULT_API_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub url: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub page_size: usize,
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: STORE_ROW_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Resolve the effective configuration: file (if any), then environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, StoreError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(URL_ENV)
            && !url.trim().is_empty()
        {
            config.url = url;
        }
        if config.url.trim().is_empty() {
            return Err(StoreError::Config(format!(
                "store url missing (set `url` or {URL_ENV})"
            )));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.page_size == 0 {
            return Err(StoreError::Config("page_size must be positive".to_string()));
        }
        if self.page_size > STORE_ROW_CAP {
            return Err(StoreError::Config(format!(
                "page_size {} exceeds the store row cap of {STORE_ROW_CAP}",
                self.page_size
            )));
        }
        if self.batch_size == 0 {
            return Err(StoreError::Config("batch_size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn api_key(&self) -> Result<String, StoreError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                StoreError::Config(format!(
                    "api key not found in environment variable {}",
                    self.api_key_env
                ))
            })
    }

    pub fn limits(&self) -> FetchLimits {
        FetchLimits {
            page_size: self.page_size,
            batch_size: self.batch_size,
        }
    }
}
