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

//! TXT record builder
//!
//! A DNS-SD TXT record is an ordered list of `key=value` strings. Each encoded
//! item must fit into 255 bytes, so the builder offers a truncating variant for
//! long comma-separated lists (see [`TxtRecord::add_pdl`]).

use core::fmt;

/// Maximum length of a single encoded `key=value` item
pub const MAX_TXT_ITEM_LEN: usize = 255;

/// A single TXT record item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtItem {
    /// Item key
    pub key: String,

    /// Item value
    pub value: String,

    /// The value is an URL; the backend may need to adjust its host part
    pub is_url: bool,
}

impl TxtItem {
    /// Encoded length of the item, in bytes
    pub fn encoded_len(&self) -> usize {
        self.key.len() + 1 + self.value.len()
    }
}

impl fmt::Display for TxtItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// TXT record: items in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtRecord {
    items: Vec<TxtItem>,
}

impl TxtRecord {
    /// Create an empty TXT record
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a regular (non-URL) item
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push(key.into(), value.into(), false);
    }

    /// Append an URL item
    pub fn add_url(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push(key.into(), value.into(), true);
    }

    /// Append a regular item if `value` is not empty
    ///
    /// Returns `true` if the item was actually added.
    pub fn add_if_not_empty(&mut self, key: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.add(key, value);
        true
    }

    /// Same as [`TxtRecord::add_if_not_empty`], but for URLs
    pub fn add_url_if_not_empty(&mut self, key: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.add_url(key, value);
        true
    }

    /// Append a PDL (page description language) list
    ///
    /// Device-reported PDL lists can be too long for a single TXT item. In that
    /// case only as many leading list entries as fit are kept, assuming the
    /// firmware lists the common formats first. A partial trailing entry is never
    /// emitted: if not even the first entry fits, the item is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use ippusb_dnssd::TxtRecord;
    ///
    /// let mut txt = TxtRecord::new();
    /// txt.add_pdl("pdl", "application/pdf,image/urf");
    /// assert_eq!(txt.get("pdl"), Some("application/pdf,image/urf"));
    /// ```
    pub fn add_pdl(&mut self, key: &str, value: &str) {
        if key.len() + 1 + value.len() <= MAX_TXT_ITEM_LEN {
            self.add(key, value);
            return;
        }

        // Space left for the value once `key=` is accounted for
        let max = MAX_TXT_ITEM_LEN.saturating_sub(key.len() + 1);
        if max == 0 {
            return;
        }

        // Keep max+1 bytes so that a comma right at the boundary still counts
        let window = &value.as_bytes()[..=max];
        let Some(comma) = window.iter().rposition(|&b| b == b',') else {
            return;
        };

        // A comma is ASCII, so this is always a char boundary
        self.add(key, &value[..comma]);
    }

    /// Look up the value of the first item with the given key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }

    /// Iterate over items in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TxtItem> {
        self.items.iter()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the record has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over items in the order they are handed to the registration
    /// daemon
    ///
    /// This is reverse insertion order: the daemon publishes TXT items
    /// back-to-front, so this restores the logical order on the wire.
    pub fn export_order(&self) -> impl Iterator<Item = &TxtItem> {
        self.items.iter().rev()
    }

    /// Export items as wire-ready `key=value` byte strings, in
    /// [`TxtRecord::export_order`]
    pub fn export(&self) -> Vec<Vec<u8>> {
        self.export_order()
            .map(|item| item.to_string().into_bytes())
            .collect()
    }

    fn push(&mut self, key: String, value: String, is_url: bool) {
        debug_assert!(!key.is_empty(), "TXT item key must not be empty");
        self.items.push(TxtItem { key, value, is_url });
    }
}

impl<'a> IntoIterator for &'a TxtRecord {
    type Item = &'a TxtItem;
    type IntoIter = core::slice::Iter<'a, TxtItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
