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

//! DNS-SD service publisher
//!
//! This crate advertises a device's network services (for example the IPP
//! endpoint of a USB printer) under a single, stable service instance name.
//!
//! ## Architecture
//!
//! - **TXT records**: [`TxtRecord`] builds records under the 255-byte item limit
//! - **Services**: [`ServiceSet`] of [`ServiceDescriptor`]s, published together
//! - **Naming**: [`instance_name`] derives the advertised name from the saved
//!   [`NameState`] and a collision counter
//! - **Publisher**: [`Publisher`] runs the retry/rename event loop on a tokio task
//! - **Pluggable backends**: the actual registration is done by a
//!   [`RegistrationBackend`] (e.g. `ippusb-dnssd-mdns`)
//!
//! ```text
//! NameState + ServiceSet -> instance_name() -> backend.start()
//!     -> PublishStatus -> Success: save name | Collision/Failure: retry later
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod instance;
pub mod publisher;
pub mod service;
pub mod state;
pub mod status;
pub mod txt;

pub use backend::{event_channel, BackendHandle, RegistrationBackend, EVENT_QUEUE_DEPTH};
pub use config::{PublisherConfig, DEFAULT_RETRY_INTERVAL};
pub use error::DnsSdError;
pub use instance::{instance_name, MAX_INSTANCE_NAME_LEN};
pub use publisher::Publisher;
pub use service::{ServiceDescriptor, ServiceSet};
pub use state::{FileNameStore, NameState, NameStore};
pub use status::PublishStatus;
pub use txt::{TxtItem, TxtRecord, MAX_TXT_ITEM_LEN};
