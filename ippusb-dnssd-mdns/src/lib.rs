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

//! mDNS registration backend using mdns-sd
//!
//! This crate provides the production [`RegistrationBackend`] for the DNS-SD
//! publisher, built on the `mdns-sd` multicast DNS responder.
//!
//! # Example
//!
//! ```no_run
//! use ippusb_dnssd::{FileNameStore, NameState, Publisher, ServiceDescriptor, ServiceSet};
//! use ippusb_dnssd_mdns::MdnsBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileNameStore::new("/var/lib/ippusb/printer.toml");
//! let state = NameState::load_or_init(&store, "Printer")?;
//!
//! let mut services = ServiceSet::new();
//! services.add(ServiceDescriptor::new("_ipp._tcp", 60000));
//!
//! let mut publisher = Publisher::new(MdnsBackend::new()?, state, Box::new(store), services);
//! publisher.publish()?;
//! // ...
//! publisher.unpublish().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`RegistrationBackend`]: ippusb_dnssd::RegistrationBackend

mod backend;
mod utils;

pub use backend::{MdnsBackend, MdnsHandle};
