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

//! The `Handler` state machine: `Initialize` / `Start` / `Stop` / `Shutdown`.

use std::{
    future::Future,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use chrono::{DateTime, Utc};
use dispatchd_runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    config::HandlerSettings,
    counters::Counters,
    descriptor::HandlerDescriptor,
    err::{self, Result},
    generator::JobGenerator,
    id::HandlerId,
    queues::Queues,
    report::HandlerState,
};

pub(crate) const STATE_STOPPED: u8 = 0;
pub(crate) const STATE_RUNNING: u8 = 1;
pub(crate) const STATE_FINISHED: u8 = 2;

/// The live control task's cancellation token and the supervisor join
/// handle that awaits it (see `control.rs` and the fault-handling notes in
/// `lifecycle::start_locked`).
pub(crate) struct ControlTask {
    pub(crate) cancel: CancellationToken,
    pub(crate) join: JoinHandle<()>,
}

/// Everything the specification's "state lock" guards: `HandlerState`,
/// `LastStartTime`/`NextStartTime`, and the control-task reference.
pub(crate) struct StateInner {
    pub(crate) state: HandlerState,
    pub(crate) control: Option<ControlTask>,
    pub(crate) last_start_time: Option<DateTime<Utc>>,
    pub(crate) next_start_time: Option<DateTime<Utc>>,
}

/// Shared state behind the `Handler` handle. `Handler` itself is a thin
/// `Arc<Inner>` wrapper so the cron task, the control loop, and every
/// cloned client-facing handle all observe the same queues and counters.
pub(crate) struct Inner {
    pub(crate) id: HandlerId,
    pub(crate) full_name: String,
    pub(crate) settings: HandlerSettings,
    pub(crate) descriptor: HandlerDescriptor,
    pub(crate) generator: Arc<dyn JobGenerator>,
    pub(crate) queues: Arc<Queues>,
    pub(crate) counters: Counters,
    pub(crate) state: tokio::sync::Mutex<StateInner>,
    /// Lock-free mirror of `state.state`, kept in sync every time the state
    /// lock changes it, so `GetNextJob`/`SubmitResult` never need to await
    /// the async state lock on their hot path (see `dispatch.rs`).
    pub(crate) state_flag: AtomicU8,
    pub(crate) cron: Option<Arc<croner::Cron>>,
    pub(crate) cron_cancel: CancellationToken,
    pub(crate) cron_join: std::sync::Mutex<Option<JoinHandle<()>>>,
    pub(crate) runtime: Option<Arc<Runtime>>,
}

/// An in-process engine owning the lifecycle and distribution of one job
/// stream. Cheap to clone — every clone shares the same underlying state.
#[derive(Clone)]
pub struct Handler(pub(crate) Arc<Inner>);

/// Successful outcome of `Handler::initialize`.
#[derive(Debug, Clone)]
pub struct InitializeOutcome {
    pub handler_id: HandlerId,
    pub full_name: String,
    pub assembly_path: std::path::PathBuf,
}

fn spawn_on<F>(runtime: &Option<Arc<Runtime>>, fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match runtime {
        Some(rt) => rt.spawn(fut),
        None => tokio::spawn(fut),
    }
}

impl Handler {
    /// Validate `settings`, parse its cron expression if any, assign a
    /// fresh `HandlerId`, and spawn the cron scheduler task if parsing
    /// succeeded. Performs a `Start` before returning if `settings.auto_start`.
    pub async fn initialize(
        settings: HandlerSettings,
        descriptor: HandlerDescriptor,
        generator: Arc<dyn JobGenerator>,
        runtime: Option<Arc<Runtime>>,
    ) -> Result<(Self, InitializeOutcome)> {
        snafu::ensure!(
            !settings.handler_name.is_empty() && !settings.job_name.is_empty(),
            err::InvalidSettingsSnafu {
                reason: "handler_name and job_name must both be non-empty",
            }
        );

        let id = HandlerId::new();
        let full_name = settings.full_name(&descriptor.package_name);
        let assembly_path = descriptor.assembly_path();

        let (cron, next_start_time) = match settings.schedule.as_deref() {
            Some(expr) if !expr.is_empty() => match croner::Cron::from_str(expr) {
                Ok(cron) => {
                    let next = cron.find_next_occurrence(&Utc::now(), false).ok();
                    (Some(Arc::new(cron)), next)
                }
                Err(source) => {
                    tracing::warn!(handler = %full_name, expr, error = %source, "failed to parse cron expression; disabling scheduler");
                    (None, None)
                }
            },
            _ => (None, None),
        };

        let inner = Arc::new(Inner {
            id,
            full_name: full_name.clone(),
            settings: settings.clone(),
            descriptor,
            generator,
            queues: Arc::new(Queues::new()),
            counters: Counters::new(),
            state: tokio::sync::Mutex::new(StateInner {
                state: HandlerState::Stopped,
                control: None,
                last_start_time: None,
                next_start_time,
            }),
            state_flag: AtomicU8::new(STATE_STOPPED),
            cron,
            cron_cancel: CancellationToken::new(),
            cron_join: std::sync::Mutex::new(None),
            runtime,
        });

        if inner.cron.is_some() {
            let cron_token = inner.cron_cancel.clone();
            let cron_inner = inner.clone();
            let join = spawn_on(&inner.runtime, crate::cron::run(cron_inner, cron_token));
            *inner.cron_join.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(join);
        }

        let handler = Self(inner);
        if settings.auto_start {
            handler.start().await;
        }

        Ok((handler, InitializeOutcome { handler_id: id, full_name, assembly_path }))
    }

    /// Idempotent: if a control task already exists, returns without
    /// effect.
    pub async fn start(&self) -> bool {
        let mut guard = self.0.state.lock().await;
        start_locked(&self.0, &mut guard).await
    }

    /// Idempotent: returns `false` if no control task exists.
    pub async fn stop(&self) -> bool {
        let mut guard = self.0.state.lock().await;
        let Some(control) = guard.control.take() else { return false };
        control.cancel.cancel();
        drop(guard);

        if let Err(join_error) = control.join.await {
            error!(handler = %self.0.full_name, error = ?join_error, "control task supervisor panicked");
        }

        finalize_stop(&self.0).await;
        true
    }

    /// Cancels the cron scheduler task and waits for it. Does not stop a
    /// running handler — call `stop` first if that is desired.
    pub async fn shutdown(&self) {
        self.0.cron_cancel.cancel();
        let join = self.0.cron_join.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take();
        if let Some(join) = join {
            let _ = join.await;
        }
    }

    #[must_use]
    pub fn id(&self) -> HandlerId { self.0.id }

    #[must_use]
    pub fn full_name(&self) -> &str { &self.0.full_name }
}

/// Shared by manual `Start` and the cron scheduler, both of which already
/// hold the state lock when they decide to start.
pub(crate) async fn start_locked(inner: &Arc<Inner>, guard: &mut StateInner) -> bool {
    if guard.control.is_some() {
        return false;
    }

    let token = CancellationToken::new();
    let control_inner = inner.clone();
    let control_token = token.clone();
    let control_join = spawn_on(&inner.runtime, crate::control::run(control_inner, control_token));

    let supervisor_inner = inner.clone();
    let full_name = inner.full_name.clone();
    let supervisor_join = spawn_on(&inner.runtime, async move {
        if let Err(join_error) = control_join.await {
            error!(handler = %full_name, error = ?join_error, "control loop faulted; stopping handler");
            handle_fault(&supervisor_inner).await;
        }
    });

    guard.control = Some(ControlTask { cancel: token, join: supervisor_join });
    guard.state = HandlerState::Running;
    guard.last_start_time = Some(Utc::now());
    inner.state_flag.store(STATE_RUNNING, Ordering::Release);
    crate::metrics::HANDLER_STATE.with_label_values(&[&inner.full_name]).set(1);
    info!(handler = %inner.full_name, "handler started");
    true
}

/// Invoked by the supervisor task spawned in `start_locked` when the
/// control loop's `JoinHandle` resolves to an error (an unhandled panic in
/// an adapter callback). If an explicit `Stop` already raced ahead and
/// cleared `control`, this is a no-op — that `Stop` call owns finalization.
async fn handle_fault(inner: &Arc<Inner>) {
    let mut guard = inner.state.lock().await;
    if guard.control.is_none() {
        return;
    }
    guard.control = None;
    finalize_stop_locked(inner, &mut guard);
    drop(guard);
    inner.generator.on_stop().await;
}

async fn finalize_stop(inner: &Arc<Inner>) {
    let mut guard = inner.state.lock().await;
    finalize_stop_locked(inner, &mut guard);
    drop(guard);
    inner.generator.on_stop().await;
}

fn finalize_stop_locked(inner: &Arc<Inner>, guard: &mut StateInner) {
    guard.state = HandlerState::Stopped;
    guard.control = None;
    inner.state_flag.store(STATE_STOPPED, Ordering::Release);
    inner.queues.clear();
    inner.counters.reset();
    crate::metrics::HANDLER_STATE.with_label_values(&[&inner.full_name]).set(0);
    info!(handler = %inner.full_name, "handler stopped");
}
