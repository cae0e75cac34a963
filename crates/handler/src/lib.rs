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

//! The Loaded Handler: the in-process engine that owns the lifecycle and
//! distribution of a single job stream.
//!
//! A `Handler` generates units of work through a user-supplied
//! [`JobGenerator`], dispatches them to remote worker clients on demand via
//! [`Handler::get_next_job`], tracks their progress, collects results
//! through [`Handler::submit_result`], and recycles failed or timed-out
//! work back into the available queue. It does not implement a network
//! transport, plugin compilation, or a multi-handler server — those are a
//! Host's concern; this crate takes an already-resolved `JobGenerator` and
//! drives it.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use dispatchd_handler::{EnqueueHandle, HandlerDescriptor, HandlerSettings, JobGenerator, Handler};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl JobGenerator for Echo {
//!     async fn create_more_jobs(&self, handle: &EnqueueHandle) {
//!         handle.enqueue(b"ping".to_vec(), vec![]);
//!     }
//!
//!     async fn process_result(&self, _job_input: &[u8], result_string: &str) {
//!         println!("got back: {result_string}");
//!     }
//!
//!     fn is_finished(&self) -> bool { false }
//! }
//!
//! # async fn run() -> dispatchd_handler::Result<()> {
//! let settings = HandlerSettings::builder().handler_name("Echo").job_name("echo-job").build();
//! let descriptor = HandlerDescriptor::builder().package_name("demo").base_folder("/tmp/demo").build();
//! let (handler, _outcome) = Handler::initialize(settings, descriptor, Arc::new(Echo), None).await?;
//! handler.start().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod control;
mod counters;
mod cron;
mod descriptor;
mod dispatch;
mod err;
mod generator;
mod id;
mod job;
mod lifecycle;
pub mod metrics;
mod queues;
mod report;

pub use config::HandlerSettings;
pub use descriptor::HandlerDescriptor;
pub use err::{HandlerError, Result};
pub use generator::{EnqueueHandle, JobGenerator};
pub use id::{ClientId, HandlerId, JobId};
pub use job::{Job, JobOutcome, JobResult};
pub use lifecycle::{Handler, InitializeOutcome};
pub use report::{HandlerInfo, HandlerJobInfo, HandlerState};
