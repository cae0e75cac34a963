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

//! Prometheus metrics for handler lifecycle and job flow.
//!
//! Every series is labeled by `handler` (the full `"Package/Handler/Job"`
//! name) so a Host scraping many handlers can distinguish them. Registration
//! happens lazily on first access, same as the corpus's worker metrics.

use lazy_static::lazy_static;
use prometheus::{
    HistogramVec, IntCounterVec, IntGaugeVec, register_histogram_vec, register_int_counter_vec,
    register_int_gauge_vec,
};

lazy_static! {
    pub static ref JOBS_ENQUEUED: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_jobs_enqueued_total",
        "Jobs inserted into the available queue",
        &["handler"]
    )
    .unwrap();

    pub static ref JOBS_LEASED: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_jobs_leased_total",
        "Jobs moved from available to pending via GetNextJob",
        &["handler"]
    )
    .unwrap();

    pub static ref JOBS_COMPLETED: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_jobs_completed_total",
        "Jobs accepted as successful results",
        &["handler"]
    )
    .unwrap();

    pub static ref JOBS_FAILED: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_jobs_failed_total",
        "Jobs accepted as error results and requeued",
        &["handler"]
    )
    .unwrap();

    pub static ref JOBS_TIMED_OUT: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_jobs_timed_out_total",
        "Pending jobs requeued by the timeout sweep",
        &["handler"]
    )
    .unwrap();

    pub static ref RESULTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_results_rejected_total",
        "SubmitResult calls rejected (stopped, unknown job, client-id mismatch)",
        &["handler", "reason"]
    )
    .unwrap();

    pub static ref HANDLER_STATE: IntGaugeVec = register_int_gauge_vec!(
        "dispatchd_handler_state",
        "Current handler state: 0=Stopped, 1=Running, 2=Finished",
        &["handler"]
    )
    .unwrap();

    pub static ref CONTROL_LOOP_ITERATION_SECONDS: HistogramVec = register_histogram_vec!(
        "dispatchd_handler_control_loop_iteration_seconds",
        "Wall time spent in one control loop iteration",
        &["handler"]
    )
    .unwrap();

    pub static ref CRON_STARTS: IntCounterVec = register_int_counter_vec!(
        "dispatchd_handler_cron_starts_total",
        "Starts triggered autonomously by the cron scheduler",
        &["handler"]
    )
    .unwrap();
}
