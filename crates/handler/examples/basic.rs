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

//! Example demonstrating the `Handler` API end to end, without a Host or a
//! Transport: a toy `JobGenerator` hands out a fixed batch of jobs, a
//! simulated worker client leases and completes them, and the example
//! exits once the generator reports finished.
//!
//! Run with `cargo run -p dispatchd-handler --example basic`.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use dispatchd_handler::{ClientId, EnqueueHandle, Handler, HandlerDescriptor, HandlerSettings, HandlerState, JobGenerator, JobOutcome, JobResult};

/// Hands out `total` index-carrying jobs and reports finished once each one
/// has come back through `process_result`.
struct CountingGenerator {
    total: i64,
    next_index: AtomicI64,
    completed: AtomicI64,
}

impl CountingGenerator {
    fn new(total: i64) -> Self { Self { total, next_index: AtomicI64::new(0), completed: AtomicI64::new(0) } }
}

#[async_trait]
impl JobGenerator for CountingGenerator {
    async fn create_more_jobs(&self, handle: &EnqueueHandle) {
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        if index >= self.total {
            self.next_index.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        handle.enqueue(index.to_string().into_bytes(), vec![]);
    }

    async fn process_result(&self, job_input: &[u8], result_string: &str) {
        let index = String::from_utf8_lossy(job_input);
        tracing::info!(index = %index, result = result_string, "job completed");
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool { self.completed.load(Ordering::SeqCst) >= self.total }

    fn total_job_count(&self) -> Option<i64> { Some(self.total) }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = HandlerSettings::builder().handler_name("Echo").job_name("basic-example").auto_start(true).build();
    let descriptor = HandlerDescriptor::builder().package_name("demo").base_folder(".").build();
    let generator = Arc::new(CountingGenerator::new(5));

    let (handler, outcome) = Handler::initialize(settings, descriptor, generator, None)
        .await
        .expect("handler settings in this example are always valid");
    tracing::info!(handler_id = %outcome.handler_id, full_name = %outcome.full_name, "handler initialized");

    let client_id = ClientId::new("basic-example-worker");
    loop {
        let Some(job) = handler.get_next_job(client_id.clone()) else {
            if handler.get_info().await.state == HandlerState::Finished {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            continue;
        };

        let payload = String::from_utf8_lossy(&job.job_input).into_owned();
        let result = JobResult { job_id: job.job_id, client_id: client_id.clone(), outcome: JobOutcome::Ok(payload) };
        handler.submit_result(result);
    }

    let summary = handler.get_info().await;
    tracing::info!(processed = summary.total_processed, failed = summary.total_failed, "example finished");

    handler.stop().await;
    handler.shutdown().await;
}
