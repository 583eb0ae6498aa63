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

//! Service descriptors

use crate::TxtRecord;

/// A DNS-SD service to be published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// If set, overrides the common instance name for this service
    pub instance: Option<String>,

    /// Service type, e.g. `_ipp._tcp`
    pub service_type: String,

    /// Service subtypes, e.g. `_universal`
    pub sub_types: Vec<String>,

    /// TCP port
    pub port: u16,

    /// TXT record
    pub txt: TxtRecord,

    /// Advertise only on the loopback interface
    pub loopback: bool,
}

impl ServiceDescriptor {
    /// Create a descriptor for the given service type and port
    pub fn new(service_type: impl Into<String>, port: u16) -> Self {
        Self {
            service_type: service_type.into(),
            port,
            ..Self::default()
        }
    }

    /// Add a subtype
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_types.push(sub_type.into());
        self
    }

    /// Replace the TXT record
    #[must_use]
    pub fn with_txt(mut self, txt: TxtRecord) -> Self {
        self.txt = txt;
        self
    }

    /// Restrict advertising to loopback
    #[must_use]
    pub fn loopback_only(mut self) -> Self {
        self.loopback = true;
        self
    }

    /// Instance name this service is published under
    pub fn instance_name<'a>(&'a self, common: &'a str) -> &'a str {
        self.instance.as_deref().unwrap_or(common)
    }
}

/// Services published together under one instance name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet {
    services: Vec<ServiceDescriptor>,
}

impl ServiceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a service
    pub fn add(&mut self, service: ServiceDescriptor) {
        self.services.push(service);
    }

    /// Iterate over services in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the set has no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl FromIterator<ServiceDescriptor> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = ServiceDescriptor>>(iter: I) -> Self {
        Self {
            services: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ServiceSet {
    type Item = &'a ServiceDescriptor;
    type IntoIter = core::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}
