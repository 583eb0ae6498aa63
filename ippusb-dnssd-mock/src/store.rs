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

//! In-memory name store

use ippusb_dnssd::{DnsSdError, NameState, NameStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// [`NameStore`] keeping state in memory and recording every save
#[derive(Clone)]
pub struct MemoryNameStore {
    inner: Arc<Mutex<Inner>>,
    saves: Arc<watch::Sender<usize>>,
}

#[derive(Default)]
struct Inner {
    current: Option<NameState>,
    history: Vec<NameState>,
    fail_saves: bool,
}

impl MemoryNameStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            saves: Arc::new(watch::channel(0).0),
        }
    }

    /// Create a store that already holds `state`
    pub fn with_state(state: NameState) -> Self {
        let store = Self::new();
        store.lock().current = Some(state);
        store
    }

    /// Make subsequent saves fail (they are still counted)
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Currently stored state
    pub fn current(&self) -> Option<NameState> {
        self.lock().current.clone()
    }

    /// Every state passed to `save`, in order
    pub fn history(&self) -> Vec<NameState> {
        self.lock().history.clone()
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }

    /// Wait until `save` was called at least `count` times
    pub async fn wait_for_saves(&self, count: usize) {
        let mut rx = self.saves.subscribe();
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryNameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NameStore for MemoryNameStore {
    fn load(&self) -> Result<Option<NameState>, DnsSdError> {
        Ok(self.current())
    }

    fn save(&self, state: &NameState) -> Result<(), DnsSdError> {
        let result = {
            let mut inner = self.lock();
            inner.history.push(state.clone());
            if inner.fail_saves {
                Err(DnsSdError::Store("save disabled".to_string()))
            } else {
                inner.current = Some(state.clone());
                Ok(())
            }
        };
        self.saves.send_modify(|n| *n += 1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let store = MemoryNameStore::new();
        assert_eq!(store.load().unwrap(), None);

        let state = NameState::new("Printer");
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), Some(state.clone()));
        assert_eq!(store.history(), [state]);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_failing_save() {
        let store = MemoryNameStore::with_state(NameState::new("Printer"));
        store.fail_saves(true);

        let mut changed = NameState::new("Printer");
        changed.dnssd_override = "Printer (USB)".to_string();
        assert!(store.save(&changed).is_err());

        assert_eq!(store.current(), Some(NameState::new("Printer")));
        assert_eq!(store.save_count(), 1);
    }
}
