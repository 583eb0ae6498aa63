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

//! mDNS registration backend

use crate::utils::{build_txt_properties, local_host_name, service_domain};
use ippusb_dnssd::{
    event_channel, BackendHandle, DnsSdError, PublishStatus, RegistrationBackend,
    ServiceDescriptor, ServiceSet,
};
use mdns_sd::DaemonEvent;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// mdns-sd based implementation of [`RegistrationBackend`]
///
/// Every `start` registers each service of the set with the shared mDNS
/// daemon and watches the daemon's monitor channel for the outcome:
///
/// - all services announced: [`PublishStatus::Success`]
/// - the daemon renamed one of our services: [`PublishStatus::Collision`]
/// - daemon error: [`PublishStatus::Failure`]
pub struct MdnsBackend {
    mdns: mdns_sd::ServiceDaemon,
    host_name: String,
}

impl MdnsBackend {
    /// Create a new mDNS backend using the default port (5353).
    ///
    /// # Errors
    ///
    /// Returns an error if the mDNS daemon cannot be started or the local host
    /// name cannot be determined.
    pub fn new() -> Result<Self, DnsSdError> {
        Self::new_with_port(mdns_sd::MDNS_PORT)
    }

    /// Create a new mDNS backend using a custom port.
    ///
    /// # Arguments
    ///
    /// * `port` - The UDP port to bind for mDNS communication.
    ///   - In production, this should be 5353 per RFC 6762.
    ///   - For development/testing, a non-standard port (e.g., 5454) avoids
    ///     conflicts with the system mDNS responder.
    ///
    /// # Errors
    ///
    /// Returns an error if the mDNS daemon cannot be started or the local host
    /// name cannot be determined.
    pub fn new_with_port(port: u16) -> Result<Self, DnsSdError> {
        let host_name = local_host_name().map_err(|e| DnsSdError::Other(e.to_string()))?;
        let mdns = mdns_sd::ServiceDaemon::new_with_port(port).map_err(|e| {
            DnsSdError::StartFailed(format!("Failed to create mDNS daemon: {e}"))
        })?;

        Ok(Self { mdns, host_name })
    }

    /// Advertise services on the given host name instead of the system one
    #[must_use]
    pub fn with_host_name(mut self, host_name: &str) -> Self {
        self.host_name = crate::utils::mdns_host_name(host_name);
        self
    }

    /// Host name services are advertised on
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    fn service_info(
        &self,
        service: &ServiceDescriptor,
        instance: &str,
    ) -> Result<mdns_sd::ServiceInfo, DnsSdError> {
        // mdns-sd carries a single subtype per registration
        let ty_domain = service_domain(
            &service.service_type,
            service.sub_types.first().map(String::as_str),
        );
        let name = service.instance_name(instance);

        let info = if service.loopback {
            let properties = build_txt_properties(&service.txt, None);
            mdns_sd::ServiceInfo::new(
                &ty_domain,
                name,
                &self.host_name,
                "127.0.0.1",
                service.port,
                properties,
            )
        } else {
            let properties = build_txt_properties(&service.txt, Some(&self.host_name));
            mdns_sd::ServiceInfo::new(
                &ty_domain,
                name,
                &self.host_name,
                (),
                service.port,
                properties,
            )
            .map(mdns_sd::ServiceInfo::enable_addr_auto)
        };

        info.map_err(|e| {
            DnsSdError::StartFailed(format!("Invalid service {name}.{ty_domain}: {e}"))
        })
    }
}

impl RegistrationBackend for MdnsBackend {
    type Handle = MdnsHandle;

    fn start(&mut self, instance: &str, services: &ServiceSet) -> Result<MdnsHandle, DnsSdError> {
        let monitor = self.mdns.monitor().map_err(|e| {
            DnsSdError::StartFailed(format!("Failed to monitor mDNS daemon: {e}"))
        })?;

        let mut fullnames = Vec::with_capacity(services.len());
        for service in services {
            let registered = self.service_info(service, instance).and_then(|info| {
                let fullname = info.get_fullname().to_string();
                self.mdns
                    .register(info)
                    .map(|()| fullname)
                    .map_err(|e| {
                        DnsSdError::StartFailed(format!("Failed to register service: {e}"))
                    })
            });

            match registered {
                Ok(fullname) => {
                    log::debug!("Registered mDNS service: {fullname}");
                    fullnames.push(fullname);
                }
                Err(e) => {
                    unregister_all(&self.mdns, &fullnames);
                    return Err(e);
                }
            }
        }

        let (tx, rx) = event_channel();
        let task = tokio::spawn(forward_events(monitor, fullnames.clone(), tx));

        Ok(MdnsHandle {
            mdns: self.mdns.clone(),
            fullnames,
            rx,
            task,
            halted: false,
        })
    }
}

/// A set of services registered with the mDNS daemon
pub struct MdnsHandle {
    mdns: mdns_sd::ServiceDaemon,
    fullnames: Vec<String>,
    rx: mpsc::Receiver<PublishStatus>,
    task: JoinHandle<()>,
    halted: bool,
}

impl BackendHandle for MdnsHandle {
    fn events(&mut self) -> &mut mpsc::Receiver<PublishStatus> {
        &mut self.rx
    }

    fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;

        self.task.abort();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}

        unregister_all(&self.mdns, &self.fullnames);
    }
}

impl Drop for MdnsHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

fn unregister_all(mdns: &mdns_sd::ServiceDaemon, fullnames: &[String]) {
    for fullname in fullnames {
        match mdns.unregister(fullname) {
            Ok(_) => log::info!("Unpublished mDNS service: {fullname}"),
            Err(e) => log::warn!("Failed to unregister {fullname}: {e}"),
        }
    }
}

/// Daemon monitor event, reduced to what matters for our registrations
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonitorEvent {
    /// A service was announced on one interface
    Announced(String),
    /// The daemon renamed a service after a conflict
    Renamed { original: String, new_name: String },
    /// Daemon error
    Error(String),
    Other,
}

impl From<DaemonEvent> for MonitorEvent {
    fn from(event: DaemonEvent) -> Self {
        match event {
            DaemonEvent::Announce(fullname, addrs) => {
                log::trace!("Announced {fullname} on {addrs}");
                Self::Announced(fullname)
            }
            DaemonEvent::NameChange(change) => Self::Renamed {
                original: change.original,
                new_name: change.new_name,
            },
            DaemonEvent::Error(e) => Self::Error(e.to_string()),
            _ => Self::Other,
        }
    }
}

/// Tracks the outcome of one registration from daemon monitor events
struct Outcome<'a> {
    fullnames: &'a [String],
    unannounced: HashSet<&'a str>,
}

impl<'a> Outcome<'a> {
    fn new(fullnames: &'a [String]) -> Self {
        Self {
            fullnames,
            unannounced: fullnames.iter().map(String::as_str).collect(),
        }
    }

    /// Status to report before any event arrives
    ///
    /// An empty set has nothing to announce, so it is published right away.
    fn initial(&self) -> Option<PublishStatus> {
        self.fullnames.is_empty().then_some(PublishStatus::Success)
    }

    /// Status to report for `event`, if any
    ///
    /// `Success` is reported once, when the last of our services was
    /// announced; repeated announcements on other interfaces are ignored.
    fn classify(&mut self, event: MonitorEvent) -> Option<PublishStatus> {
        match event {
            MonitorEvent::Announced(fullname) => {
                let ours = self.unannounced.remove(fullname.as_str());
                (ours && self.unannounced.is_empty()).then_some(PublishStatus::Success)
            }
            MonitorEvent::Renamed { original, new_name }
                if self.fullnames.contains(&original) =>
            {
                log::info!("mDNS name conflict: {original} renamed to {new_name}");
                Some(PublishStatus::Collision)
            }
            MonitorEvent::Error(e) => {
                log::warn!("mDNS daemon error: {e}");
                Some(PublishStatus::Failure)
            }
            MonitorEvent::Renamed { .. } | MonitorEvent::Other => None,
        }
    }
}

/// Translate daemon monitor events about our services into publish statuses
async fn forward_events(
    monitor: mdns_sd::Receiver<DaemonEvent>,
    fullnames: Vec<String>,
    tx: mpsc::Sender<PublishStatus>,
) {
    let mut outcome = Outcome::new(&fullnames);

    if let Some(status) = outcome.initial() {
        if tx.send(status).await.is_err() {
            return;
        }
    }

    while let Ok(event) = monitor.recv_async().await {
        if let Some(status) = outcome.classify(event.into()) {
            if tx.send(status).await.is_err() {
                break;
            }
        }
    }
}
