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

use std::sync::atomic::{AtomicI64, Ordering};

/// `TotalProcessedJobs`/`TotalFailedJobs`, lock-free so `GetInfo` readers
/// never contend with `SubmitResult`. Reset to zero only by `Stop`.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    processed: AtomicI64,
    failed: AtomicI64,
}

impl Counters {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn record_processed(&self) { self.processed.fetch_add(1, Ordering::Relaxed); }

    pub(crate) fn record_failed(&self) { self.failed.fetch_add(1, Ordering::Relaxed); }

    pub(crate) fn processed(&self) -> i64 { self.processed.load(Ordering::Relaxed) }

    pub(crate) fn failed(&self) -> i64 { self.failed.load(Ordering::Relaxed) }

    pub(crate) fn reset(&self) {
        self.processed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}
