// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persisted instance name state
//!
//! The publisher reads the device name and the last successfully published
//! instance name from here, and writes back the new name after a collision was
//! resolved. Storage is pluggable through [`NameStore`].

use crate::DnsSdError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// DNS-SD name state, durable across restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameState {
    /// Device name, as reported by the device
    pub dnssd_name: String,

    /// Last published instance name. Equals `dnssd_name` until the first
    /// successful publication.
    pub dnssd_override: String,
}

impl NameState {
    /// Fresh state for a device name that was never published
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dnssd_override: name.clone(),
            dnssd_name: name,
        }
    }

    /// Load state from the store, or initialize it for `name`
    ///
    /// If the device reports a different name than the stored one, the saved
    /// override no longer applies and is reset.
    ///
    /// # Errors
    ///
    /// Returns the store's error if loading fails.
    pub fn load_or_init(store: &dyn NameStore, name: &str) -> Result<Self, DnsSdError> {
        match store.load()? {
            Some(state) if state.dnssd_name == name => Ok(state),
            Some(state) => {
                tracing::info!(
                    "DNS-SD: device name changed {:?} -> {:?}, resetting saved name",
                    state.dnssd_name,
                    name
                );
                Ok(Self::new(name))
            }
            None => Ok(Self::new(name)),
        }
    }
}

/// Storage for [`NameState`]
pub trait NameStore: Send {
    /// Load the saved state
    ///
    /// Returns `Ok(None)` if nothing was saved yet.
    fn load(&self) -> Result<Option<NameState>, DnsSdError>;

    /// Durably save the state
    fn save(&self, state: &NameState) -> Result<(), DnsSdError>;
}

/// TOML file based implementation of [`NameStore`]
pub struct FileNameStore {
    path: PathBuf,
}

impl FileNameStore {
    /// Store state in the TOML file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NameStore for FileNameStore {
    fn load(&self) -> Result<Option<NameState>, DnsSdError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&self.path)?;
        let state = toml::from_str(&text)
            .map_err(|e| DnsSdError::Store(format!("{}: {e}", self.path.display())))?;

        Ok(Some(state))
    }

    fn save(&self, state: &NameState) -> Result<(), DnsSdError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let text = toml::to_string(state).map_err(|e| DnsSdError::Store(e.to_string()))?;

        // Write-then-rename so the old file survives a crash mid-write
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
