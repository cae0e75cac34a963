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

use chrono::{DateTime, Utc};

use crate::id::{ClientId, HandlerId, JobId};

/// Core's internal bookkeeping record around one unit of work. Lives in
/// exactly one of the available, pending, or finished queues at any instant.
#[derive(Debug, Clone)]
pub struct JobWrapper {
    pub job_id: JobId,
    pub handler_id: HandlerId,
    pub job_input: Vec<u8>,
    /// Opaque payload carried through but never inspected by core.
    pub additional_data: Vec<u8>,
    pub enqueue_time: DateTime<Utc>,
    pub assigned_time: Option<DateTime<Utc>>,
    pub assigned_client_id: Option<ClientId>,
    pub result_time: Option<DateTime<Utc>>,
    pub result_string: Option<String>,
    /// Count of error results accepted for this wrapper so far. Tracked for
    /// a future bounded-retry policy; nothing in this crate consults it to
    /// cap retries (retries are unbounded by design, see the design notes).
    pub failure_count: u64,
}

impl JobWrapper {
    pub(crate) fn new(handler_id: HandlerId, job_input: Vec<u8>, additional_data: Vec<u8>) -> Self {
        Self {
            job_id: JobId::new(),
            handler_id,
            job_input,
            additional_data,
            enqueue_time: Utc::now(),
            assigned_time: None,
            assigned_client_id: None,
            result_time: None,
            result_string: None,
            failure_count: 0,
        }
    }

    /// Clear assignment fields, the `Reset()` of the specification, run
    /// whenever a wrapper returns to available after a failure or timeout.
    pub(crate) fn reset(&mut self) {
        self.assigned_time = None;
        self.assigned_client_id = None;
    }
}

/// The projection of a `JobWrapper` handed to a worker client by
/// `GetNextJob` — identity and input only, no wrapper internals such as
/// timestamps or assignment bookkeeping.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: JobId,
    pub job_input: Vec<u8>,
    pub additional_data: Vec<u8>,
}

impl From<&JobWrapper> for Job {
    fn from(wrapper: &JobWrapper) -> Self {
        Self {
            job_id: wrapper.job_id,
            job_input: wrapper.job_input.clone(),
            additional_data: wrapper.additional_data.clone(),
        }
    }
}

/// A result submitted by a worker client via `SubmitResult`.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: JobId,
    pub client_id: ClientId,
    pub outcome: JobOutcome,
}

/// Either a successful payload or an error descriptor.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Ok(String),
    Error(String),
}

impl JobOutcome {
    #[must_use]
    pub fn has_error(&self) -> bool { matches!(self, Self::Error(_)) }
}
