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

//! The periodic "should-start-now?" evaluator. Disabled entirely when a
//! handler has no (or an unparseable) cron expression — see
//! `lifecycle::Handler::initialize`, which is the only place a `cron::run`
//! task gets spawned.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{lifecycle::Inner, report::HandlerState};

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One task for the handler's whole lifetime. Wakes every five seconds
/// (cron resolution is one minute, so polling at this cadence never misses
/// an occurrence) and, under the state lock, starts the handler if
/// `next_start_time` has passed and it isn't already `Running`.
pub(crate) async fn run(inner: std::sync::Arc<Inner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = cancel.cancelled() => return,
        }

        let Some(cron) = inner.cron.as_ref() else { return };

        let mut guard = inner.state.lock().await;
        let now = Utc::now();
        let due = guard.next_start_time.is_some_and(|next| next < now) && guard.state != HandlerState::Running;
        if !due {
            continue;
        }

        info!(handler = %inner.full_name, "cron scheduler starting handler");
        crate::metrics::CRON_STARTS.with_label_values(&[&inner.full_name]).inc();
        crate::lifecycle::start_locked(&inner, &mut guard).await;
        guard.next_start_time = cron.find_next_occurrence(&now, false).ok();
    }
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, sync::atomic::AtomicU8, time::Duration as StdDuration};

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::{
        config::HandlerSettings,
        counters::Counters,
        descriptor::HandlerDescriptor,
        generator::{EnqueueHandle, JobGenerator},
        id::HandlerId,
        lifecycle::{STATE_STOPPED, StateInner},
        queues::Queues,
    };

    struct Noop;

    #[async_trait]
    impl JobGenerator for Noop {
        async fn create_more_jobs(&self, _handle: &EnqueueHandle) {}

        async fn process_result(&self, _job_input: &[u8], _result_string: &str) {}

        fn is_finished(&self) -> bool { false }
    }

    fn inner_with_next_start_time(next_start_time: Option<chrono::DateTime<Utc>>) -> std::sync::Arc<Inner> {
        std::sync::Arc::new(Inner {
            id: HandlerId::new(),
            full_name: "demo/Test/cron".to_string(),
            settings: HandlerSettings::builder().handler_name("Test").job_name("cron").build(),
            descriptor: HandlerDescriptor::builder().package_name("demo").base_folder(".").build(),
            generator: std::sync::Arc::new(Noop),
            queues: std::sync::Arc::new(Queues::new()),
            counters: Counters::new(),
            state: tokio::sync::Mutex::new(StateInner {
                state: HandlerState::Stopped,
                control: None,
                last_start_time: None,
                next_start_time,
            }),
            state_flag: AtomicU8::new(STATE_STOPPED),
            cron: Some(std::sync::Arc::new(croner::Cron::from_str("* * * * *").unwrap())),
            cron_cancel: CancellationToken::new(),
            cron_join: std::sync::Mutex::new(None),
            runtime: None,
        })
    }

    /// `next_start_time` is backdated before the task is even spawned, so the
    /// "is it due" comparison against the real clock is already true the
    /// moment the scheduler's first (immediate) tick evaluates it — no real
    /// wall-clock wait is needed for this to pass, only a paused-clock
    /// advance so the ticker's own timer fires deterministically.
    #[tokio::test(start_paused = true)]
    async fn starts_handler_once_next_start_time_has_passed() {
        let inner = inner_with_next_start_time(Some(Utc::now() - ChronoDuration::seconds(1)));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(inner.clone(), cancel.clone()));

        tokio::time::advance(StdDuration::from_secs(6)).await;
        tokio::task::yield_now().await;

        let guard = inner.state.lock().await;
        assert_eq!(guard.state, HandlerState::Running);
        assert!(guard.next_start_time.is_some_and(|next| next > Utc::now()));
        drop(guard);

        cancel.cancel();
        let _ = task.await;
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_start_before_next_start_time() {
        let inner = inner_with_next_start_time(Some(Utc::now() + ChronoDuration::seconds(120)));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(inner.clone(), cancel.clone()));

        tokio::time::advance(StdDuration::from_secs(6)).await;
        tokio::task::yield_now().await;

        let guard = inner.state.lock().await;
        assert_eq!(guard.state, HandlerState::Stopped);
        drop(guard);

        cancel.cancel();
        let _ = task.await;
    }
}
