// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! User preferences read and written by the map
//!
//! The map only sees the [`PreferencesStore`] trait. [`TomlPreferences`]
//! keeps values in a TOML file and writes them back on
//! [`flush`](PreferencesStore::flush) or drop; [`MemoryPreferences`] keeps
//! them in memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

/// Key-value preferences backend
pub trait PreferencesStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    /// Persist pending changes
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
    }
}

// ===== In Memory =====

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl PreferencesStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

// ===== TOML File =====

/// Preferences stored in a TOML file
#[derive(Debug)]
pub struct TomlPreferences {
    path: PathBuf,
    values: BTreeMap<String, Value>,
    dirty: bool,
}

impl TomlPreferences {
    /// Load preferences from `path`. A missing file gives empty preferences.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse preferences: {}", path.display()))?
        } else {
            tracing::debug!("No preferences at {}, starting empty", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        // TOML has no null
        let values: BTreeMap<&String, &Value> =
            self.values.iter().filter(|(_, v)| !v.is_null()).collect();
        let text = toml::to_string(&values).context("Failed to serialize preferences")?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to save preferences: {}", self.path.display()))
    }
}

impl PreferencesStore for TomlPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.save()?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for TomlPreferences {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("{e:#}");
        }
    }
}
