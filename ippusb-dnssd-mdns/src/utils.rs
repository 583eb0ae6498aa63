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

//! Helpers for converting service descriptors to mdns-sd types

use ippusb_dnssd::TxtRecord;

/// Full mdns-sd service type for `service_type`, optionally with a subtype
///
/// `"_ipp._tcp"` becomes `"_ipp._tcp.local."`, with subtype `"_print"` it
/// becomes `"_print._sub._ipp._tcp.local."`.
pub fn service_domain(service_type: &str, sub_type: Option<&str>) -> String {
    let base = service_type.trim_end_matches('.');
    let base = base.strip_suffix(".local").unwrap_or(base);

    match sub_type {
        Some(sub) => format!("{sub}._sub.{base}.local."),
        None => format!("{base}.local."),
    }
}

/// Host name in the form mdns-sd expects, i.e. ending with `.local.`
pub fn mdns_host_name(host: &str) -> String {
    let host = host.trim_end_matches('.');
    if host.to_lowercase().ends_with(".local") {
        format!("{host}.")
    } else {
        format!("{host}.local.")
    }
}

/// Replace a loopback host in `url` with `host`
///
/// URLs in TXT records are built against `localhost`; remote clients need the
/// advertised host name instead. Other hosts are left untouched.
pub fn rewrite_url_host(url: &str, host: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];

    let url_host = if rest.starts_with('[') {
        rest.find(']').map_or(rest, |end| &rest[..=end])
    } else {
        let end = rest.find([':', '/', '?', '#']).unwrap_or(rest.len());
        &rest[..end]
    };

    if !matches!(url_host, "localhost" | "127.0.0.1" | "[::1]") {
        return url.to_string();
    }

    format!(
        "{}{}{}",
        &url[..authority_start],
        host.trim_end_matches('.'),
        &rest[url_host.len()..]
    )
}

/// Build TXT properties for mdns-sd
///
/// Properties come out in [`TxtRecord::export_order`]. URL values are
/// rewritten to `host` unless `host` is `None` (loopback-only services).
pub fn build_txt_properties(txt: &TxtRecord, host: Option<&str>) -> Vec<mdns_sd::TxtProperty> {
    txt.export_order()
        .map(|item| {
            let value = match host {
                Some(host) if item.is_url => rewrite_url_host(&item.value, host),
                _ => item.value.clone(),
            };
            (item.key.as_str(), value.as_str()).into()
        })
        .collect()
}

/// Errors that can occur when determining the local host name
#[derive(Debug, thiserror::Error)]
pub enum HostNameError {
    #[error("Failed to get host name: {0}")]
    Io(#[from] std::io::Error),

    #[error("Host name is not valid UTF-8")]
    NotUtf8,
}

/// Local host name, as mdns-sd expects it
pub fn local_host_name() -> Result<String, HostNameError> {
    let name = hostname::get()?
        .into_string()
        .map_err(|_| HostNameError::NotUtf8)?;
    Ok(mdns_host_name(&name))
}
