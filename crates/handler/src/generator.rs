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

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    id::HandlerId,
    job::JobWrapper,
    queues::Queues,
};

/// The explicit back-edge a `JobGenerator` uses to insert new wrappers into
/// the available queue. Handed to `create_more_jobs` as an argument rather
/// than stored by the generator, so the callback wiring stays an explicit
/// handle instead of shared mutable state.
pub struct EnqueueHandle {
    handler_id: HandlerId,
    full_name: String,
    queues: Arc<Queues>,
}

impl EnqueueHandle {
    pub(crate) fn new(handler_id: HandlerId, full_name: String, queues: Arc<Queues>) -> Self {
        Self { handler_id, full_name, queues }
    }

    /// Insert a wrapper into the available queue with a freshly generated
    /// `JobId` and the current time as `EnqueueTime`.
    pub fn enqueue(&self, job_input: Vec<u8>, additional_data: Vec<u8>) {
        let wrapper = JobWrapper::new(self.handler_id, job_input, additional_data);
        crate::metrics::JOBS_ENQUEUED.with_label_values(&[&self.full_name]).inc();
        self.queues.enqueue_available(wrapper);
    }
}

/// Capability set a user-supplied plugin exposes to the control loop.
///
/// Only `create_more_jobs`, `process_result`, and `is_finished` are
/// required; the lifecycle hooks default to no-ops, the same shape the
/// underlying worker trait this is modeled on uses for its own optional
/// `on_start`/`on_shutdown` hooks.
#[async_trait]
pub trait JobGenerator: Send + Sync + 'static {
    /// Called exactly once per transition into `Running`.
    async fn on_start(&self) {}

    /// Called exactly once per transition into `Stopped`.
    async fn on_stop(&self) {}

    /// Called exactly once per transition into `Finished`.
    async fn on_finished(&self) {}

    /// Populate the available queue via `handle`. May enqueue zero or more
    /// jobs and may block/await arbitrarily.
    async fn create_more_jobs(&self, handle: &EnqueueHandle);

    /// Consume one finished job's input and result payload.
    async fn process_result(&self, job_input: &[u8], result_string: &str);

    /// Polled after each control loop iteration; once true the handler
    /// transitions to `Finished`.
    fn is_finished(&self) -> bool;

    /// For reporting; a negative value (represented here as `None`) means
    /// "unknown".
    fn total_job_count(&self) -> Option<i64> { None }
}
