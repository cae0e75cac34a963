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

//! The three job queues and the edge-triggered signals that wake the
//! control loop.

use std::{collections::HashMap, sync::Mutex};

use crossbeam::queue::SegQueue;
use tokio::sync::Notify;

use crate::{
    id::JobId,
    job::JobWrapper,
};

/// Holds the available, pending, and finished collections plus the two
/// signals the control loop waits on. A `Handler` replaces this wholesale on
/// `Stop` rather than draining each field, so "reset all three queues" is one
/// assignment.
pub(crate) struct Queues {
    pub(crate) available: SegQueue<JobWrapper>,
    pub(crate) pending: Mutex<HashMap<JobId, JobWrapper>>,
    pub(crate) finished: SegQueue<JobWrapper>,
    pub(crate) available_drained: Notify,
    pub(crate) result_ready: Notify,
}

impl Queues {
    pub(crate) fn new() -> Self {
        Self {
            available: SegQueue::new(),
            pending: Mutex::new(HashMap::new()),
            finished: SegQueue::new(),
            available_drained: Notify::new(),
            result_ready: Notify::new(),
        }
    }

    /// Push a wrapper into available and, if it was empty beforehand, note
    /// that callers waiting on new work should be able to proceed. The
    /// control loop only actually needs `AvailableDrained` (raised by
    /// `GetNextJob`, see `dispatch.rs`); this just keeps the queue's own
    /// bookkeeping in one place.
    pub(crate) fn enqueue_available(&self, wrapper: JobWrapper) { self.available.push(wrapper); }

    pub(crate) fn try_lease(&self) -> Option<JobWrapper> { self.available.pop() }

    pub(crate) fn is_available_empty(&self) -> bool { self.available.is_empty() }

    pub(crate) fn available_len(&self) -> usize { self.available.len() }

    pub(crate) fn finished_len(&self) -> usize { self.finished.len() }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Drain all three queues in place. Used by `Stop`, which the
    /// specification describes as "replaces all three queues with empty
    /// instances" — emptying in place reaches the same observable state
    /// without needing interior mutability around the `Arc<Queues>` itself.
    pub(crate) fn clear(&self) {
        while self.available.pop().is_some() {}
        while self.finished.pop().is_some() {}
        self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::HandlerId;

    #[test]
    fn lease_drains_available_in_fifo_order() {
        let queues = Queues::new();
        let handler_id = HandlerId::new();
        let first = JobWrapper::new(handler_id, b"a".to_vec(), vec![]);
        let second = JobWrapper::new(handler_id, b"b".to_vec(), vec![]);
        let first_id = first.job_id;
        queues.enqueue_available(first);
        queues.enqueue_available(second);

        let leased = queues.try_lease().expect("queue should not be empty");
        assert_eq!(leased.job_id, first_id);
        assert!(!queues.is_available_empty());
    }

    #[test]
    fn try_lease_on_empty_returns_none() {
        let queues = Queues::new();
        assert!(queues.try_lease().is_none());
    }
}
