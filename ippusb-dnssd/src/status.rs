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

//! Publication outcome reported by registration backends

use core::fmt;

/// Outcome of a publication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishStatus {
    /// Status is not known (yet)
    #[default]
    Unknown,

    /// Instance name collision
    Collision,

    /// Publication failed for any other reason
    Failure,

    /// All services were published
    Success,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Collision => "collision",
            Self::Failure => "failure",
            Self::Success => "success",
        };
        f.write_str(s)
    }
}
