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

//! Publisher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay before a failed publication is retried
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Publisher tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Fixed delay between a failure and the next attempt
    #[serde(rename = "retry_interval_ms", with = "millis")]
    pub retry_interval: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_interval() {
        assert_eq!(PublisherConfig::default().retry_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_toml() {
        let config: PublisherConfig = toml::from_str("retry_interval_ms = 2500").unwrap();
        assert_eq!(config.retry_interval, Duration::from_millis(2500));

        let text = toml::to_string(&config).unwrap();
        assert_eq!(text.trim(), "retry_interval_ms = 2500");
    }
}
