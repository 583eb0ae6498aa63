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

//! Registration backend traits
//!
//! A backend performs the actual service registration with the local
//! service-discovery daemon. Each [`RegistrationBackend::start`] call creates a
//! new, independent registration represented by a [`BackendHandle`]; outcomes
//! are reported asynchronously over the handle's event channel.

use crate::{DnsSdError, PublishStatus, ServiceSet};
use tokio::sync::mpsc;

/// Depth of the per-registration event queue
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Starts registrations of a [`ServiceSet`] under a given instance name
pub trait RegistrationBackend: Send + 'static {
    type Handle: BackendHandle;

    /// Begin registering `services` under `instance`
    ///
    /// Must not block: the outcome is delivered later on the handle's event
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns `DnsSdError::StartFailed` if the registration cannot even be
    /// attempted.
    fn start(&mut self, instance: &str, services: &ServiceSet)
        -> Result<Self::Handle, DnsSdError>;
}

/// A running registration
pub trait BackendHandle: Send + 'static {
    /// Outcome events, in the order they occurred
    fn events(&mut self) -> &mut mpsc::Receiver<PublishStatus>;

    /// Stop the registration and withdraw the services
    ///
    /// Idempotent. No further events are delivered once this returns.
    fn halt(&mut self);
}

/// Create the event channel for a new registration
pub fn event_channel() -> (mpsc::Sender<PublishStatus>, mpsc::Receiver<PublishStatus>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}
