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

//! A minimal demo binary exercising one `Handler` end to end: it plays both
//! sides, hosting the handler and driving a simulated worker client loop
//! against it, so the crate is runnable without a real Transport or Package
//! Loader. Not a multi-handler server — that component is out of scope for
//! `dispatchd-handler` itself.

mod generator;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use dispatchd_handler::{ClientId, Handler, HandlerDescriptor, HandlerSettings, HandlerState, JobOutcome, JobResult};
use dispatchd_runtime::RuntimeOptions;
use snafu::{ResultExt, Whatever};
use tracing::info;

use crate::generator::CountingGenerator;

#[derive(Debug, Parser)]
#[command(name = "dispatchd-host", about = "Demo host for the Loaded Handler", version)]
struct Cli {
    /// Package name, the first segment of the handler's full name.
    #[arg(long, default_value = "demo")]
    package_name: String,

    /// Handler type name, the second segment of the full name.
    #[arg(long, default_value = "Echo")]
    handler_name: String,

    /// Job name, the third segment of the full name.
    #[arg(long, default_value = "echo-job")]
    job_name: String,

    /// Cron expression gating autonomous starts; omit to start immediately.
    #[arg(long)]
    schedule: Option<String>,

    /// Seconds a leased job may stay pending before it is requeued.
    #[arg(long)]
    job_timeout_secs: Option<u64>,

    /// Total jobs the demo generator produces before reporting finished.
    #[arg(long, default_value_t = 10)]
    job_count: i64,

    /// Base folder `GetFile` reads are resolved against.
    #[arg(long, default_value = ".")]
    base_folder: std::path::PathBuf,

    /// `RUST_LOG`-style filter; falls back to the environment, then "info".
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    let cli = Cli::parse();
    let _guards = dispatchd_telemetry::init(
        "dispatchd-host",
        &dispatchd_telemetry::LoggingOptions::builder().maybe_level(cli.log_level.clone()).build(),
    );

    run(cli).await
}

async fn run(cli: Cli) -> Result<(), Whatever> {
    let handler_runtime = Arc::new(
        RuntimeOptions::builder()
            .thread_name("dispatchd-handler".to_string())
            .build()
            .create()
            .whatever_context("failed to build the handler's dedicated runtime")?,
    );

    let settings = HandlerSettings::builder()
        .handler_name(cli.handler_name)
        .job_name(cli.job_name)
        .maybe_schedule(cli.schedule)
        .maybe_job_timeout(cli.job_timeout_secs.map(Duration::from_secs))
        .auto_start(true)
        .build();

    let descriptor = HandlerDescriptor::builder().package_name(cli.package_name).base_folder(cli.base_folder).build();

    let generator = Arc::new(CountingGenerator::new(cli.job_count));

    let (handler, outcome) = Handler::initialize(settings, descriptor, generator, Some(handler_runtime))
        .await
        .whatever_context("failed to initialize the demo handler")?;
    info!(handler_id = %outcome.handler_id, full_name = %outcome.full_name, "demo handler initialized");

    let worker = tokio::spawn(simulate_worker_client(handler.clone()));

    tokio::select! {
        () = wait_until_finished(&handler) => {
            info!(handler = %handler.full_name(), "generator reports finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
        }
    }

    worker.abort();
    handler.stop().await;
    handler.shutdown().await;

    let summary = handler.get_info().await;
    info!(
        handler = %summary.full_name,
        processed = summary.total_processed,
        failed = summary.total_failed,
        "demo host exiting"
    );
    Ok(())
}

/// Polls `GetInfo` until the handler reports `Finished`, the only way a
/// client-side observer learns a run completed (there is no completion
/// channel on the public API).
async fn wait_until_finished(handler: &Handler) {
    let mut interval = tokio::time::interval(Duration::from_millis(200));
    loop {
        interval.tick().await;
        if handler.get_info().await.state == HandlerState::Finished {
            return;
        }
    }
}

/// Stands in for a remote worker client: leases jobs and echoes their input
/// back as the result payload. Runs until aborted by `run`.
async fn simulate_worker_client(handler: Handler) {
    let client_id = ClientId::new("demo-worker-1");
    loop {
        let Some(job) = handler.get_next_job(client_id.clone()) else {
            tokio::time::sleep(Duration::from_millis(100)).await;
            continue;
        };

        let payload = String::from_utf8_lossy(&job.job_input).into_owned();
        let result = JobResult { job_id: job.job_id, client_id: client_id.clone(), outcome: JobOutcome::Ok(payload) };
        handler.submit_result(result);
    }
}
