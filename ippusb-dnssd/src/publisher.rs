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

//! DNS-SD publisher
//!
//! Publishes a [`ServiceSet`] under one service instance name and keeps it
//! published: name collisions are resolved by appending a numeric suffix,
//! failures are retried after a fixed delay, and the name that finally made it
//! onto the network is saved so the device keeps it across restarts.
//!
//! ## Event loop
//!
//! ```text
//! publish() -> start backend
//!                 |
//!   +-------------+--------------+-------------------+
//!   | unpublish   | Success      | Collision/Failure | retry timer
//!   v             v              v                   v
//! halt, exit    save name     halt, arm timer     start new backend
//! ```
//!
//! All backend calls and all state mutation happen on the single loop task.

use crate::backend::{BackendHandle, RegistrationBackend};
use crate::{
    instance_name, DnsSdError, NameState, NameStore, PublishStatus, PublisherConfig, ServiceSet,
};
use core::any::Any;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument, Span};

/// Publishes a set of services under a common, collision-free instance name
///
/// Lifecycle: [`Publisher::publish`] once, then [`Publisher::unpublish`] once.
/// Dropping a running publisher also stops it, but without waiting for the
/// loop to finish.
pub struct Publisher<B: RegistrationBackend> {
    span: Span,
    pending: Option<PublisherLoop<B>>,
    running: Option<Running>,
}

struct Running {
    fin: oneshot::Sender<()>,
    done: JoinHandle<()>,
}

impl<B: RegistrationBackend> Publisher<B> {
    /// Create a publisher
    ///
    /// `state` is the loaded name state; after a collision was resolved it is
    /// updated and written back through `store`. No other writer of the same
    /// state should exist while the publisher runs.
    pub fn new(
        backend: B,
        state: NameState,
        store: Box<dyn NameStore>,
        services: ServiceSet,
    ) -> Self {
        let span = tracing::info_span!("dnssd", device = %state.dnssd_name);
        Self {
            span,
            pending: Some(PublisherLoop {
                backend,
                services,
                state,
                store,
                config: PublisherConfig::default(),
            }),
            running: None,
        }
    }

    /// Use a custom configuration
    #[must_use]
    pub fn with_config(mut self, config: PublisherConfig) -> Self {
        if let Some(pending) = self.pending.as_mut() {
            pending.config = config;
        }
        self
    }

    /// Log within the given span instead of the default `dnssd` span
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether the publisher loop has been started and not yet unpublished
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.done.is_finished())
    }

    /// Start publishing
    ///
    /// Returns as soon as the publisher loop is started; the outcome of the
    /// publication is only visible in the logs and the saved name state.
    ///
    /// # Errors
    ///
    /// - `DnsSdError::NoRuntime` if called outside of a tokio runtime
    /// - `DnsSdError::AlreadyPublished` if called more than once
    pub fn publish(&mut self) -> Result<(), DnsSdError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DnsSdError::NoRuntime)?;
        let publisher = self.pending.take().ok_or(DnsSdError::AlreadyPublished)?;

        self.span.in_scope(|| {
            info!(
                "DNS-SD: {}: publishing requested",
                instance_name(&publisher.state, 0)
            );
        });

        let (fin, fin_rx) = oneshot::channel();
        let done = runtime.spawn(
            async move {
                let run = AssertUnwindSafe(publisher.run(fin_rx));
                if let Err(panic) = run.catch_unwind().await {
                    error!("DNS-SD: publisher panicked: {}", panic_message(&*panic));
                }
            }
            .instrument(self.span.clone()),
        );

        self.running = Some(Running { fin, done });
        Ok(())
    }

    /// Stop publishing
    ///
    /// Waits until the publisher loop has exited and the backend was halted,
    /// so no backend calls happen after this returns.
    pub async fn unpublish(mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // Fails only if the loop is already gone
        let _ = running.fin.send(());

        if let Err(e) = running.done.await {
            self.span
                .in_scope(|| error!("DNS-SD: publisher task failed: {e}"));
        }
    }
}

/// State owned by the publisher loop task
struct PublisherLoop<B: RegistrationBackend> {
    backend: B,
    services: ServiceSet,
    state: NameState,
    store: Box<dyn NameStore>,
    config: PublisherConfig,
}

impl<B: RegistrationBackend> PublisherLoop<B> {
    async fn run(mut self, mut fin: oneshot::Receiver<()>) {
        let mut suffix: u32 = 0;
        let mut instance = instance_name(&self.state, suffix);

        let retry = tokio::time::sleep(self.config.retry_interval);
        tokio::pin!(retry);
        let mut retry_armed = false;

        let mut registration = match self.backend.start(&instance, &self.services) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("DNS-SD: {instance}: {e}");
                retry.as_mut().reset(Instant::now() + self.config.retry_interval);
                retry_armed = true;
                None
            }
        };

        loop {
            let mut fail = false;

            tokio::select! {
                biased;

                _ = &mut fin => break,

                event = next_event(&mut registration) => {
                    let status = event.unwrap_or_else(|| {
                        warn!("DNS-SD: {instance}: backend went away");
                        PublishStatus::Failure
                    });

                    match status {
                        PublishStatus::Success => {
                            info!("DNS-SD: {instance}: published");
                            self.remember(&instance);
                        }

                        PublishStatus::Collision | PublishStatus::Failure => {
                            if status == PublishStatus::Collision {
                                warn!("DNS-SD: {instance}: name collision");
                                suffix += 1;
                            }
                            error!("DNS-SD: {instance}: publishing failed");

                            if let Some(mut handle) = registration.take() {
                                handle.halt();
                            }
                            fail = true;
                        }

                        PublishStatus::Unknown => {
                            error!("DNS-SD: {instance}: unknown event {status}");
                        }
                    }
                }

                () = &mut retry, if retry_armed => {
                    retry_armed = false;
                    instance = instance_name(&self.state, suffix);
                    debug!("DNS-SD: {instance}: retrying");

                    match self.backend.start(&instance, &self.services) {
                        Ok(handle) => registration = Some(handle),
                        Err(e) => {
                            error!("DNS-SD: {instance}: {e}");
                            fail = true;
                        }
                    }
                }
            }

            if fail {
                retry.as_mut().reset(Instant::now() + self.config.retry_interval);
                retry_armed = true;
            }
        }

        if let Some(mut handle) = registration.take() {
            handle.halt();
        }
        info!("DNS-SD: {instance}: removed");
    }

    /// Save `instance` as the device's published name, if it changed
    ///
    /// The in-memory state only follows once the save went through, so a
    /// failed save is attempted again on the next success.
    fn remember(&mut self, instance: &str) {
        if self.state.dnssd_override == instance {
            return;
        }

        let state = NameState {
            dnssd_override: instance.to_string(),
            ..self.state.clone()
        };
        match self.store.save(&state) {
            Ok(()) => self.state = state,
            Err(e) => error!("DNS-SD: {instance}: failed to save name: {e}"),
        }
    }
}

/// Next event of the current registration; pending forever if there is none
async fn next_event<H: BackendHandle>(registration: &mut Option<H>) -> Option<PublishStatus> {
    match registration {
        Some(handle) => handle.events().recv().await,
        None => std::future::pending().await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
