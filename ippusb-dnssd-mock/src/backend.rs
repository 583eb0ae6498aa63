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

//! Scripted in-memory registration backend

use ippusb_dnssd::{
    event_channel, BackendHandle, DnsSdError, PublishStatus, RegistrationBackend, ServiceSet,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};

/// What happens on one `start` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// Start succeeds and the registration reports these statuses right away
    Report(Vec<PublishStatus>),
    /// Start succeeds, nothing is reported until [`MockBackend::send`]
    Silent,
    /// Start fails with the given message
    StartError(String),
    /// Start panics
    Panic,
}

/// Scripted registration backend
///
/// Clones share state, so a test keeps one clone for inspection and gives the
/// other to the publisher. Each `start` consumes the next scripted
/// [`Attempt`]; once the script runs out, attempts are [`Attempt::Silent`].
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
    starts: Arc<watch::Sender<usize>>,
    halts: Arc<watch::Sender<usize>>,
}

struct Inner {
    script: VecDeque<Attempt>,
    instances: Vec<String>,
    services: Vec<ServiceSet>,
    current: Option<mpsc::Sender<PublishStatus>>,
}

impl MockBackend {
    /// Create a new mock backend with an empty script
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                script: VecDeque::new(),
                instances: Vec::new(),
                services: Vec::new(),
                current: None,
            })),
            starts: Arc::new(watch::channel(0).0),
            halts: Arc::new(watch::channel(0).0),
        }
    }

    /// Queue the behavior of the next unscripted `start` call
    pub fn script(&self, attempt: Attempt) {
        self.lock().script.push_back(attempt);
    }

    /// Deliver a status on the most recently started registration
    ///
    /// Returns `false` if there is no live registration.
    pub fn send(&self, status: PublishStatus) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|tx| tx.try_send(status).is_ok())
    }

    /// Instance names of all `start` calls so far, in order
    pub fn instances(&self) -> Vec<String> {
        self.lock().instances.clone()
    }

    /// Service sets of all `start` calls so far, in order
    pub fn services(&self) -> Vec<ServiceSet> {
        self.lock().services.clone()
    }

    /// Number of `start` calls so far
    pub fn start_count(&self) -> usize {
        *self.starts.borrow()
    }

    /// Number of registrations halted so far
    pub fn halt_count(&self) -> usize {
        *self.halts.borrow()
    }

    /// Wait until `start` was called at least `count` times
    pub async fn wait_for_starts(&self, count: usize) {
        let mut rx = self.starts.subscribe();
        // The sender lives in self, so the channel cannot close
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    /// Wait until at least `count` registrations were halted
    pub async fn wait_for_halts(&self, count: usize) {
        let mut rx = self.halts.subscribe();
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationBackend for MockBackend {
    type Handle = MockHandle;

    fn start(&mut self, instance: &str, services: &ServiceSet) -> Result<MockHandle, DnsSdError> {
        let (tx, rx) = event_channel();
        let attempt = {
            let mut inner = self.lock();
            inner.instances.push(instance.to_string());
            inner.services.push(services.clone());
            inner.current = Some(tx.clone());
            inner.script.pop_front().unwrap_or(Attempt::Silent)
        };

        match attempt {
            Attempt::Report(statuses) => {
                for status in statuses {
                    let _ = tx.try_send(status);
                }
            }
            Attempt::Silent => {}
            Attempt::StartError(msg) => {
                self.lock().current = None;
                self.starts.send_modify(|n| *n += 1);
                return Err(DnsSdError::StartFailed(msg));
            }
            Attempt::Panic => {
                self.starts.send_modify(|n| *n += 1);
                panic!("mock backend: scripted panic in start");
            }
        }

        self.starts.send_modify(|n| *n += 1);

        Ok(MockHandle {
            rx,
            halted: false,
            halts: self.halts.clone(),
        })
    }
}

/// Registration started by [`MockBackend`]
pub struct MockHandle {
    rx: mpsc::Receiver<PublishStatus>,
    halted: bool,
    halts: Arc<watch::Sender<usize>>,
}

impl BackendHandle for MockHandle {
    fn events(&mut self) -> &mut mpsc::Receiver<PublishStatus> {
        &mut self.rx
    }

    fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;

        // Drop anything still queued; nothing new gets in after close()
        self.rx.close();
        while self.rx.try_recv().is_ok() {}

        self.halts.send_modify(|n| *n += 1);
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.halt();
    }
}
