// Copyright 2025 dispatchd contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use derive_more::{Debug, Display};
use uuid::Uuid;

/// Opaque 128-bit identifier for a `Handler`, stable for its whole process
/// lifetime.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[debug("HandlerId({_0})")]
#[display("{_0}")]
pub struct HandlerId(Uuid);

impl HandlerId {
    pub(crate) fn new() -> Self { Self(Uuid::new_v4()) }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

/// Opaque 128-bit identifier for a `JobWrapper`, generated fresh at enqueue
/// time. Two wrappers never share a `JobId`, including across retries of
/// the same logical unit of work — a requeued job keeps its original id.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[debug("JobId({_0})")]
#[display("{_0}")]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self { Self(Uuid::new_v4()) }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

/// Opaque identifier supplied by a worker client when leasing and returning
/// jobs. The core never interprets this beyond equality comparison.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct ClientId(String);

impl ClientId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_ids_are_unique() {
        assert_ne!(HandlerId::new(), HandlerId::new());
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn client_id_from_str_and_string_agree() {
        assert_eq!(ClientId::from("a"), ClientId::from("a".to_string()));
    }
}
