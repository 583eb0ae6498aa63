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

//! Mock registration backend for testing the DNS-SD publisher
//!
//! This crate provides an in-memory [`RegistrationBackend`] driven by a script
//! of per-attempt outcomes, and an in-memory [`NameStore`]. Together they let
//! tests drive the real publisher loop without any networking.
//!
//! # Example
//!
//! ```
//! use ippusb_dnssd::{NameState, PublishStatus, Publisher, ServiceSet};
//! use ippusb_dnssd_mock::{Attempt, MemoryNameStore, MockBackend};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let backend = MockBackend::new();
//! backend.script(Attempt::Report(vec![PublishStatus::Collision]));
//! backend.script(Attempt::Report(vec![PublishStatus::Success]));
//!
//! let store = MemoryNameStore::new();
//! let mut publisher = Publisher::new(
//!     backend.clone(),
//!     NameState::new("Printer"),
//!     Box::new(store.clone()),
//!     ServiceSet::new(),
//! );
//! publisher.publish().unwrap();
//!
//! store.wait_for_saves(1).await;
//! assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB 1)");
//!
//! publisher.unpublish().await;
//! # }
//! ```
//!
//! [`RegistrationBackend`]: ippusb_dnssd::RegistrationBackend
//! [`NameStore`]: ippusb_dnssd::NameStore

mod backend;
mod store;

pub use backend::{Attempt, MockBackend, MockHandle};
pub use store::MemoryNameStore;
