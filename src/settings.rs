//! Lead-time settings
//!
//! Three integer lead times live in a simple key-value store owned outside
//! the workflow engine. The engine only consumes their sum, the number of
//! days of inventory a shipment has to cover.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PRODUCTION_DAYS_KEY: &str = "production_lead_days";
pub const TRANSIT_DAYS_KEY: &str = "transit_lead_days";
pub const SAFETY_STOCK_DAYS_KEY: &str = "safety_stock_days";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Settings file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Integer key-value persistence for process-wide settings.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<i64>, SettingsError>;
    fn set(&mut self, key: &str, value: i64) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, i64>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<i64>, SettingsError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings kept as top-level integer keys in a TOML file.
///
/// Non-integer entries in the file are ignored. Every `set` rewrites the file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl TomlSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let table: toml::Table =
                    toml::from_str(&content).map_err(|source| SettingsError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                table
                    .into_iter()
                    .filter_map(|(key, value)| value.as_integer().map(|v| (key, v)))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(SettingsError::Read { path, source });
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let content = toml::to_string(&self.values)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        std::fs::write(&self.path, content).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get(&self, key: &str) -> Result<Option<i64>, SettingsError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }
}

/// The three lead-time settings, in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadTimeSettings {
    pub production_days: u32,
    pub transit_days: u32,
    pub safety_stock_days: u32,
}

fn read_days(store: &dyn SettingsStore, key: &str) -> Result<u32, SettingsError> {
    let value = store.get(key)?.unwrap_or(0);
    if value < 0 {
        tracing::warn!(key, value, "Negative lead time, using 0");
    }
    Ok(value.clamp(0, u32::MAX as i64) as u32)
}

impl LeadTimeSettings {
    /// Missing keys read as 0; negative values clamp to 0.
    pub fn load(store: &dyn SettingsStore) -> Result<Self, SettingsError> {
        Ok(Self {
            production_days: read_days(store, PRODUCTION_DAYS_KEY)?,
            transit_days: read_days(store, TRANSIT_DAYS_KEY)?,
            safety_stock_days: read_days(store, SAFETY_STOCK_DAYS_KEY)?,
        })
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), SettingsError> {
        store.set(PRODUCTION_DAYS_KEY, i64::from(self.production_days))?;
        store.set(TRANSIT_DAYS_KEY, i64::from(self.transit_days))?;
        store.set(SAFETY_STOCK_DAYS_KEY, i64::from(self.safety_stock_days))
    }

    /// Days of inventory required to cover all three lead times.
    pub fn required_inventory_days(&self) -> u64 {
        u64::from(self.production_days) + u64::from(self.transit_days) + u64::from(self.safety_stock_days)
    }
}
