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

//! Client-facing operations: `GetNextJob`, `SubmitResult`, and the read-only
//! reporting accessors. None of these suspend — they only ever touch the
//! lock-free available/finished queues, the pending `std::sync::Mutex`, and
//! atomics, so a Transport can call them from a synchronous request handler.

use std::sync::atomic::Ordering;

use chrono::Utc;
use tracing::warn;

use crate::{
    id::ClientId,
    job::{Job, JobOutcome, JobResult},
    lifecycle::{Handler, STATE_STOPPED},
    report::{HandlerInfo, HandlerJobInfo, HandlerState},
};

impl Handler {
    /// Try-dequeue from available. Leases the wrapper to `client_id`,
    /// records it in pending, and returns its dispatch projection. Returns
    /// `None` without touching pending if available is empty.
    #[must_use]
    pub fn get_next_job(&self, client_id: ClientId) -> Option<Job> {
        let inner = &self.0;
        let mut wrapper = inner.queues.try_lease()?;
        wrapper.assigned_time = Some(Utc::now());
        wrapper.assigned_client_id = Some(client_id);
        let job = Job::from(&wrapper);

        {
            let mut pending = inner.queues.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            pending.insert(job.job_id, wrapper);
        }

        crate::metrics::JOBS_LEASED.with_label_values(&[&inner.full_name]).inc();
        if inner.queues.is_available_empty() {
            inner.queues.available_drained.notify_one();
        }
        Some(job)
    }

    /// Accept or reject a client's result. See the module doc and
    /// `DESIGN.md`'s Open Question decisions for the unknown-`JobId` and
    /// client-mismatch policies: both are logged and rejected, never a typed
    /// error, since from the caller's side they are operationally identical.
    pub fn submit_result(&self, result: JobResult) -> bool {
        let inner = &self.0;
        let mut pending = inner.queues.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if inner.state_flag.load(Ordering::Acquire) == STATE_STOPPED {
            warn!(handler = %inner.full_name, job_id = %result.job_id, "result submitted for a stopped handler");
            crate::metrics::RESULTS_REJECTED.with_label_values(&[&inner.full_name, "stopped"]).inc();
            return false;
        }

        let Some(wrapper) = pending.get(&result.job_id) else {
            warn!(handler = %inner.full_name, job_id = %result.job_id, "result submitted for an unknown job id");
            crate::metrics::RESULTS_REJECTED.with_label_values(&[&inner.full_name, "unknown_job"]).inc();
            return false;
        };

        if wrapper.assigned_client_id.as_ref() != Some(&result.client_id) {
            warn!(
                handler = %inner.full_name,
                job_id = %result.job_id,
                client_id = %result.client_id,
                "result submitted by a client other than the assignee"
            );
            crate::metrics::RESULTS_REJECTED.with_label_values(&[&inner.full_name, "client_mismatch"]).inc();
            return false;
        }

        match result.outcome {
            JobOutcome::Error(_) => {
                let mut wrapper = pending.remove(&result.job_id).expect("looked up above");
                drop(pending);
                wrapper.failure_count += 1;
                wrapper.reset();
                inner.counters.record_failed();
                crate::metrics::JOBS_FAILED.with_label_values(&[&inner.full_name]).inc();
                inner.queues.enqueue_available(wrapper);
                false
            }
            JobOutcome::Ok(payload) => {
                let mut wrapper = pending.remove(&result.job_id).expect("looked up above");
                drop(pending);
                wrapper.result_time = Some(Utc::now());
                wrapper.result_string = Some(payload);
                inner.counters.record_processed();
                crate::metrics::JOBS_COMPLETED.with_label_values(&[&inner.full_name]).inc();
                inner.queues.finished.push(wrapper);
                inner.queues.result_ready.notify_one();
                true
            }
        }
    }

    /// Snapshot of counts, state, and times. Briefly takes the state lock
    /// for `last_start_time`/`next_start_time`; everything else is a
    /// lock-free read.
    #[must_use]
    pub async fn get_info(&self) -> HandlerInfo {
        let inner = &self.0;
        let state = match inner.state_flag.load(Ordering::Acquire) {
            crate::lifecycle::STATE_RUNNING => HandlerState::Running,
            crate::lifecycle::STATE_FINISHED => HandlerState::Finished,
            _ => HandlerState::Stopped,
        };
        let (last_start_time, next_start_time) = {
            let guard = inner.state.lock().await;
            (guard.last_start_time, guard.next_start_time)
        };
        HandlerInfo {
            id: inner.id,
            full_name: inner.full_name.clone(),
            state,
            available_count: inner.queues.available_len(),
            pending_count: inner.queues.pending_len(),
            total_processed: inner.counters.processed(),
            total_failed: inner.counters.failed(),
            total_job_count: inner.generator.total_job_count(),
            last_start_time,
            next_start_time,
        }
    }

    /// Snapshot for a deploying worker client.
    #[must_use]
    pub fn get_job_info(&self) -> HandlerJobInfo {
        let inner = &self.0;
        HandlerJobInfo {
            full_name: inner.full_name.clone(),
            assembly_file_name: inner.descriptor.assembly_file_name(),
            dependencies: inner.descriptor.worker_dependencies.clone(),
        }
    }

    /// Read a file from the package folder. Returns `None` for a missing
    /// path or one that resolves outside `base_folder` after
    /// canonicalization — a rejected path is not exceptional here, so no
    /// error is raised, only a warning logged.
    #[must_use]
    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        let inner = &self.0;
        let base = inner.descriptor.base_folder.canonicalize().ok()?;
        let resolved = inner.descriptor.base_folder.join(path).canonicalize().ok()?;
        if !resolved.starts_with(&base) {
            warn!(handler = %inner.full_name, path, "rejected GetFile path outside the package folder");
            return None;
        }
        std::fs::read(resolved).ok()
    }
}
