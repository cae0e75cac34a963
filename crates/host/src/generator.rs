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

//! A toy `JobGenerator` that counts off a fixed number of jobs, each
//! carrying its own index as input, and reports finished once every one of
//! them has come back with a successful result.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dispatchd_handler::{EnqueueHandle, JobGenerator};
use tracing::info;

pub struct CountingGenerator {
    total: i64,
    next_index: AtomicI64,
    completed: AtomicI64,
}

impl CountingGenerator {
    pub fn new(total: i64) -> Self { Self { total, next_index: AtomicI64::new(0), completed: AtomicI64::new(0) } }
}

#[async_trait]
impl JobGenerator for CountingGenerator {
    async fn on_start(&self) { info!(total = self.total, "counting generator starting"); }

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
        info!(index = %index, result = result_string, "job completed");
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool { self.completed.load(Ordering::SeqCst) >= self.total }

    fn total_job_count(&self) -> Option<i64> { Some(self.total) }
}
