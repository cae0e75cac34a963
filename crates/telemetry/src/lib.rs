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

//! Logging setup for anything in this workspace with a `main()`.
//!
//! A handler itself never initializes logging — it only emits `tracing`
//! events — so that embedding it inside an existing service doesn't clobber
//! that service's own subscriber. This crate is for the demo host binary
//! (and tests) to call once at startup.

use std::io::IsTerminal;

use bon::Builder;
use smart_default::SmartDefault;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, prelude::*};

const DEFAULT_LOG_TARGETS: &str = "info";

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, SmartDefault, derive_more::Display)]
pub enum LogFormat {
    /// Structured JSON, one object per line.
    Json,
    /// Human-readable text, the default for local development.
    #[default]
    Text,
}

/// Configuration for [`init`].
#[derive(Clone, Debug, SmartDefault, Builder)]
#[builder(finish_fn = build)]
pub struct LoggingOptions {
    /// Directory to write rotating log files into. Empty disables file
    /// logging; stdout is always available independently via
    /// `append_stdout`.
    #[default("".to_string())]
    #[builder(default = "".to_string())]
    pub dir: String,

    /// Filter string, e.g. `"info,dispatchd_handler=debug"`. Falls back to
    /// `RUST_LOG`, then `"info"`.
    pub level: Option<String>,

    #[default(LogFormat::Text)]
    #[builder(default = LogFormat::Text)]
    pub log_format: LogFormat,

    #[default(true)]
    #[builder(default = true)]
    pub append_stdout: bool,
}

/// Initialize a global `tracing` subscriber from `opts`.
///
/// Returns the [`WorkerGuard`]s that must stay alive for the lifetime of the
/// process — dropping one flushes and stops its writer.
///
/// Safe to call from a test harness more than once per process only if each
/// call happens on a fresh `tracing::subscriber::set_default` scope; like the
/// teacher's own logging init, a second *global* `init()` in the same
/// process will panic.
#[must_use]
pub fn init(app_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    let _ = LogTracer::init();
    let mut guards = Vec::new();

    let stdout_layer = opts.append_stdout.then(|| {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        let ansi = std::io::stdout().is_terminal();
        match opts.log_format {
            LogFormat::Json => tracing_subscriber::fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            LogFormat::Text => tracing_subscriber::fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(ansi)
                .boxed(),
        }
    });

    let file_layer = (!opts.dir.is_empty()).then(|| {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::HOURLY)
            .filename_prefix(app_name.to_string())
            .build(&opts.dir)
            .unwrap_or_else(|e| panic!("initializing rolling file appender at {} failed: {e}", opts.dir));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        match opts.log_format {
            LogFormat::Json => tracing_subscriber::fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            LogFormat::Text => tracing_subscriber::fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
        }
    });

    let filter = opts
        .level
        .clone()
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LOG_TARGETS.to_string());

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(stdout_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber).expect("logging already initialized");
    guards
}

/// Convenience wrapper over [`init`] with defaults: stdout only, text
/// format, level from `RUST_LOG` or `"info"`.
#[must_use]
pub fn init_default(app_name: &str) -> Vec<WorkerGuard> { init(app_name, &LoggingOptions::default()) }
