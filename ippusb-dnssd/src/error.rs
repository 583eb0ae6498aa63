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

//! DNS-SD publisher error types

/// Errors that can occur in the DNS-SD publisher and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum DnsSdError {
    /// `publish` was called on a publisher that is already running
    #[error("Publisher is already running")]
    AlreadyPublished,

    /// `publish` was called outside of a tokio runtime
    #[error("No tokio runtime to run the publisher on")]
    NoRuntime,

    /// The registration backend could not be started
    #[error("Failed to start registration: {0}")]
    StartFailed(String),

    /// Name state could not be loaded or saved
    #[error("Name state storage error: {0}")]
    Store(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}
