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

//! The control loop: the single task driving one `Running` handler.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{generator::EnqueueHandle, lifecycle::Inner, report::HandlerState};

const WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runs until cancelled or until the generator reports `is_finished`. Spawned
/// fresh on every `Start`; see `lifecycle::start_locked`.
pub(crate) async fn run(inner: Arc<Inner>, cancel: CancellationToken) {
    inner.generator.on_start().await;

    loop {
        let iteration_start = std::time::Instant::now();

        drain_finished(&inner).await;
        sweep_timeouts(&inner);

        if inner.queues.is_available_empty() {
            let handle = EnqueueHandle::new(inner.id, inner.full_name.clone(), inner.queues.clone());
            inner.generator.create_more_jobs(&handle).await;
        }

        crate::metrics::CONTROL_LOOP_ITERATION_SECONDS
            .with_label_values(&[&inner.full_name])
            .observe(iteration_start.elapsed().as_secs_f64());

        if inner.generator.is_finished() {
            finish(&inner).await;
            return;
        }

        tokio::select! {
            () = cancel.cancelled() => return,
            () = inner.queues.available_drained.notified() => {}
            () = inner.queues.result_ready.notified() => {}
            () = tokio::time::sleep(WAIT_TIMEOUT) => {}
        }
    }
}

async fn drain_finished(inner: &Arc<Inner>) {
    while let Some(wrapper) = inner.queues.finished.pop() {
        let result_string = wrapper.result_string.as_deref().unwrap_or_default();
        inner.generator.process_result(&wrapper.job_input, result_string).await;
    }
}

fn sweep_timeouts(inner: &Arc<Inner>) {
    let Some(timeout) = inner.settings.job_timeout else { return };
    if timeout.is_zero() {
        return;
    }

    let now = Utc::now();
    let mut expired = Vec::new();
    {
        let mut pending = inner.queues.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.retain(|_, wrapper| {
            let is_expired = wrapper
                .assigned_time
                .is_some_and(|assigned| now.signed_duration_since(assigned).to_std().is_ok_and(|age| age > timeout));
            if is_expired {
                wrapper.reset();
                expired.push(wrapper.clone());
            }
            !is_expired
        });
    }

    for wrapper in expired {
        warn!(handler = %inner.full_name, job_id = %wrapper.job_id, "job exceeded its timeout; requeuing");
        crate::metrics::JOBS_TIMED_OUT.with_label_values(&[&inner.full_name]).inc();
        inner.queues.enqueue_available(wrapper);
    }
}

async fn finish(inner: &Arc<Inner>) {
    let mut guard = inner.state.lock().await;
    inner.generator.on_finished().await;
    guard.state = HandlerState::Finished;
    guard.control = None;
    inner.state_flag.store(crate::lifecycle::STATE_FINISHED, std::sync::atomic::Ordering::Release);
    crate::metrics::HANDLER_STATE.with_label_values(&[&inner.full_name]).set(2);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU8;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::{
        config::HandlerSettings,
        counters::Counters,
        descriptor::HandlerDescriptor,
        generator::JobGenerator,
        id::{ClientId, HandlerId},
        job::JobWrapper,
        lifecycle::{STATE_RUNNING, StateInner},
        queues::Queues,
    };

    struct Noop;

    #[async_trait]
    impl JobGenerator for Noop {
        async fn create_more_jobs(&self, _handle: &EnqueueHandle) {}

        async fn process_result(&self, _job_input: &[u8], _result_string: &str) {}

        fn is_finished(&self) -> bool { false }
    }

    /// Builds an `Inner` with one wrapper already leased and backdated in
    /// pending, the same trick `cron.rs`'s own tests use for
    /// `next_start_time`: backdating the real `chrono` timestamp before the
    /// task is even spawned makes the expiry check true immediately, so the
    /// test never needs a real wall-clock wait.
    fn inner_with_expired_lease(job_timeout: Duration, lease_age: ChronoDuration) -> (Arc<Inner>, crate::id::JobId) {
        let handler_id = HandlerId::new();
        let queues = Arc::new(Queues::new());

        let mut wrapper = JobWrapper::new(handler_id, b"stale-job".to_vec(), vec![]);
        wrapper.assigned_time = Some(Utc::now() - lease_age);
        wrapper.assigned_client_id = Some(ClientId::new("client-a"));
        let job_id = wrapper.job_id;
        queues.pending.lock().unwrap().insert(job_id, wrapper);

        let inner = Arc::new(Inner {
            id: handler_id,
            full_name: "demo/Test/timeout".to_string(),
            settings: HandlerSettings::builder().handler_name("Test").job_name("timeout").job_timeout(job_timeout).build(),
            descriptor: HandlerDescriptor::builder().package_name("demo").base_folder(".").build(),
            generator: Arc::new(Noop),
            queues,
            counters: Counters::new(),
            state: tokio::sync::Mutex::new(StateInner {
                state: HandlerState::Running,
                control: None,
                last_start_time: None,
                next_start_time: None,
            }),
            state_flag: AtomicU8::new(STATE_RUNNING),
            cron: None,
            cron_cancel: CancellationToken::new(),
            cron_join: std::sync::Mutex::new(None),
            runtime: None,
        });
        (inner, job_id)
    }

    #[test]
    fn sweep_timeouts_requeues_a_lease_older_than_job_timeout() {
        let (inner, job_id) = inner_with_expired_lease(Duration::from_secs(1), ChronoDuration::seconds(5));

        sweep_timeouts(&inner);

        assert_eq!(inner.queues.pending_len(), 0);
        let requeued = inner.queues.try_lease().expect("expired job should be back in available");
        assert_eq!(requeued.job_id, job_id);
        assert!(requeued.assigned_time.is_none());
        assert!(requeued.assigned_client_id.is_none());
    }

    #[test]
    fn sweep_timeouts_leaves_a_lease_younger_than_job_timeout_alone() {
        let (inner, job_id) = inner_with_expired_lease(Duration::from_secs(3600), ChronoDuration::seconds(5));

        sweep_timeouts(&inner);

        assert!(inner.queues.try_lease().is_none());
        let pending = inner.queues.pending.lock().unwrap();
        assert!(pending.contains_key(&job_id));
    }

    #[test]
    fn sweep_timeouts_is_a_no_op_when_job_timeout_is_disabled() {
        let (inner, job_id) = inner_with_expired_lease(Duration::ZERO, ChronoDuration::seconds(5));

        sweep_timeouts(&inner);

        assert!(inner.queues.try_lease().is_none());
        let pending = inner.queues.pending.lock().unwrap();
        assert!(pending.contains_key(&job_id));
    }

    /// End-to-end version of the scenario above, driven through the actual
    /// control loop rather than calling `sweep_timeouts` directly: a lease
    /// already older than `JobTimeout` before `run` is even spawned is
    /// requeued on the very first iteration, before the loop ever reaches
    /// its `tokio::select!` wait.
    #[tokio::test]
    async fn control_loop_requeues_an_expired_lease_on_its_first_iteration() {
        let (inner, job_id) = inner_with_expired_lease(Duration::from_secs(1), ChronoDuration::seconds(5));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(inner.clone(), cancel.clone()));

        let requeued = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Some(wrapper) = inner.queues.try_lease() {
                    return wrapper;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("expired lease should be requeued promptly");

        assert_eq!(requeued.job_id, job_id);
        assert!(requeued.assigned_client_id.is_none());
        assert_eq!(inner.queues.pending_len(), 0);

        cancel.cancel();
        let _ = task.await;
    }
}
