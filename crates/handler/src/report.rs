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

//! Read-only reporting structures returned by `GetInfo`/`GetJobInfo`.

use chrono::{DateTime, Utc};

use crate::id::HandlerId;

/// One of `{Stopped, Running, Finished}`. Initial state is `Stopped`;
/// `Finished` is terminal for the current run and requires an explicit
/// `Start` to re-enter `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum HandlerState {
    Stopped,
    Running,
    Finished,
}

/// Snapshot of counts, state, and times for a `Handler`, returned by
/// `GetInfo`. Transport is responsible for serializing this for a remote
/// caller; this crate only produces the value.
#[derive(Debug, Clone)]
pub struct HandlerInfo {
    pub id: HandlerId,
    pub full_name: String,
    pub state: HandlerState,
    pub available_count: usize,
    pub pending_count: usize,
    pub total_processed: i64,
    pub total_failed: i64,
    /// `GetTotalJobCount()` from the generator; `None` means "unknown".
    pub total_job_count: Option<i64>,
    pub last_start_time: Option<DateTime<Utc>>,
    pub next_start_time: Option<DateTime<Utc>>,
}

/// Snapshot for a deploying worker client: the full name, the assembly it
/// needs to fetch via `GetFile`, and its declared dependencies.
#[derive(Debug, Clone)]
pub struct HandlerJobInfo {
    pub full_name: String,
    pub assembly_file_name: String,
    pub dependencies: Vec<String>,
}
