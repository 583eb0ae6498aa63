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

//! Service instance name resolution

use crate::NameState;

/// Maximum length of a DNS-SD service instance name, in bytes
pub const MAX_INSTANCE_NAME_LEN: usize = 63;

/// Build the service instance name with an optional collision-resolution suffix
///
/// - `suffix != 0`: we are resolving a name collision, `"<name> (USB <suffix>)"`
/// - no saved override yet: first run, `"<name> (USB)"`, since the bare device
///   name is likely already advertised by the device itself
/// - otherwise the saved, previously published name is reused as is
///
/// The result never exceeds [`MAX_INSTANCE_NAME_LEN`] bytes. When it would,
/// the name part is shortened and the suffix is kept intact.
///
/// # Example
///
/// ```
/// use ippusb_dnssd::{instance_name, NameState};
///
/// let state = NameState::new("Printer");
/// assert_eq!(instance_name(&state, 0), "Printer (USB)");
/// assert_eq!(instance_name(&state, 2), "Printer (USB 2)");
/// ```
pub fn instance_name(state: &NameState, suffix: u32) -> String {
    let (name, suffix) = match suffix {
        0 if state.dnssd_override == state.dnssd_name => {
            (state.dnssd_name.as_str(), " (USB)".to_string())
        }
        0 => (state.dnssd_override.as_str(), String::new()),
        n => (state.dnssd_name.as_str(), format!(" (USB {n})")),
    };

    let room = MAX_INSTANCE_NAME_LEN.saturating_sub(suffix.len());
    format!("{}{suffix}", truncate_at_char_boundary(name, room))
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
