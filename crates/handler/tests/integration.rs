use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use dispatchd_handler::{
    ClientId, EnqueueHandle, Handler, HandlerDescriptor, HandlerSettings, HandlerState, JobGenerator, JobOutcome,
    JobResult,
};
use tokio::time::sleep;

/// Hands out `total` jobs (each input is its index as ASCII) and reports
/// finished once that many results have come back through `process_result`.
struct CountingGenerator {
    total: i64,
    handed_out: AtomicI64,
    processed: AtomicUsize,
    on_stop_calls: AtomicUsize,
}

impl CountingGenerator {
    fn new(total: i64) -> Self {
        Self { total, handed_out: AtomicI64::new(0), processed: AtomicUsize::new(0), on_stop_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl JobGenerator for CountingGenerator {
    async fn on_stop(&self) { self.on_stop_calls.fetch_add(1, Ordering::SeqCst); }

    async fn create_more_jobs(&self, handle: &EnqueueHandle) {
        let index = self.handed_out.fetch_add(1, Ordering::SeqCst);
        if index >= self.total {
            self.handed_out.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        handle.enqueue(index.to_string().into_bytes(), vec![]);
    }

    async fn process_result(&self, _job_input: &[u8], _result_string: &str) {
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool { self.processed.load(Ordering::SeqCst) as i64 >= self.total }
}

/// Hands out exactly one job and never reports finished; used by scenarios
/// that drive the job through `GetNextJob`/`SubmitResult` by hand.
struct SingleJobGenerator {
    handed_out: std::sync::atomic::AtomicBool,
}

impl SingleJobGenerator {
    fn new() -> Self { Self { handed_out: std::sync::atomic::AtomicBool::new(false) } }
}

#[async_trait]
impl JobGenerator for SingleJobGenerator {
    async fn create_more_jobs(&self, handle: &EnqueueHandle) {
        if !self.handed_out.swap(true, Ordering::SeqCst) {
            handle.enqueue(b"only-job".to_vec(), vec![]);
        }
    }

    async fn process_result(&self, _job_input: &[u8], _result_string: &str) {}

    fn is_finished(&self) -> bool { false }
}

fn demo_descriptor(base: &str) -> HandlerDescriptor {
    HandlerDescriptor::builder().package_name("demo").base_folder(base).build()
}

async fn lease_with_retry(handler: &Handler, client_id: &ClientId) -> dispatchd_handler::Job {
    for _ in 0..50 {
        if let Some(job) = handler.get_next_job(client_id.clone()) {
            return job;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("no job became available in time");
}

async fn wait_for_state(handler: &Handler, state: HandlerState) {
    for _ in 0..100 {
        if handler.get_info().await.state == state {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("handler never reached {state:?}");
}

#[tokio::test]
async fn happy_path_processes_both_jobs_and_finishes() {
    let settings = HandlerSettings::builder().handler_name("Happy").job_name("two-jobs").auto_start(true).build();
    let generator = Arc::new(CountingGenerator::new(2));
    let (handler, _outcome) =
        Handler::initialize(settings, demo_descriptor("."), generator.clone(), None).await.unwrap();

    let client = ClientId::new("client-a");
    for _ in 0..2 {
        let job = lease_with_retry(&handler, &client).await;
        let outcome = JobOutcome::Ok(String::from_utf8_lossy(&job.job_input).into_owned());
        assert!(handler.submit_result(JobResult { job_id: job.job_id, client_id: client.clone(), outcome }));
    }

    wait_for_state(&handler, HandlerState::Finished).await;

    let info = handler.get_info().await;
    assert_eq!(info.total_processed, 2);
    assert_eq!(info.total_failed, 0);
    assert_eq!(generator.processed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_result_returns_job_to_available_for_a_different_client() {
    let settings = HandlerSettings::builder().handler_name("Retry").job_name("one-job").auto_start(true).build();
    let generator = Arc::new(SingleJobGenerator::new());
    let (handler, _outcome) = Handler::initialize(settings, demo_descriptor("."), generator, None).await.unwrap();

    let client_a = ClientId::new("client-a");
    let first_lease = lease_with_retry(&handler, &client_a).await;

    let rejected = JobOutcome::Error("boom".to_string());
    assert!(handler.submit_result(JobResult { job_id: first_lease.job_id, client_id: client_a, outcome: rejected }));
    assert_eq!(handler.get_info().await.total_failed, 1);

    let client_b = ClientId::new("client-b");
    let second_lease = lease_with_retry(&handler, &client_b).await;
    assert_eq!(second_lease.job_id, first_lease.job_id);

    let accepted = JobOutcome::Ok("done".to_string());
    assert!(handler.submit_result(JobResult { job_id: second_lease.job_id, client_id: client_b, outcome: accepted }));
    assert_eq!(handler.get_info().await.total_processed, 1);
}

#[tokio::test]
async fn result_from_a_client_other_than_the_assignee_is_rejected() {
    let settings = HandlerSettings::builder().handler_name("Mismatch").job_name("one-job").auto_start(true).build();
    let generator = Arc::new(SingleJobGenerator::new());
    let (handler, _outcome) = Handler::initialize(settings, demo_descriptor("."), generator, None).await.unwrap();

    let client_a = ClientId::new("client-a");
    let leased = lease_with_retry(&handler, &client_a).await;

    let client_b = ClientId::new("client-b");
    let outcome = JobOutcome::Ok("hijacked".to_string());
    let accepted =
        handler.submit_result(JobResult { job_id: leased.job_id, client_id: client_b, outcome });
    assert!(!accepted);

    let info = handler.get_info().await;
    assert_eq!(info.total_processed, 0);
    assert_eq!(info.total_failed, 0);
    assert_eq!(info.pending_count, 1);

    let outcome = JobOutcome::Ok("legitimate".to_string());
    assert!(handler.submit_result(JobResult { job_id: leased.job_id, client_id: client_a, outcome }));
}

#[tokio::test]
async fn stop_resets_counters_and_queues_and_rejects_further_results() {
    let settings = HandlerSettings::builder().handler_name("Stoppable").job_name("one-job").auto_start(true).build();
    let generator = Arc::new(SingleJobGenerator::new());
    let (handler, _outcome) = Handler::initialize(settings, demo_descriptor("."), generator, None).await.unwrap();

    let client = ClientId::new("client-a");
    let leased = lease_with_retry(&handler, &client).await;
    let outcome = JobOutcome::Ok("done".to_string());
    assert!(handler.submit_result(JobResult { job_id: leased.job_id, client_id: client.clone(), outcome }));

    assert!(handler.stop().await);

    let info = handler.get_info().await;
    assert_eq!(info.state, HandlerState::Stopped);
    assert_eq!(info.total_processed, 0);
    assert_eq!(info.total_failed, 0);
    assert_eq!(info.available_count, 0);
    assert_eq!(info.pending_count, 0);

    let outcome = JobOutcome::Ok("late".to_string());
    assert!(!handler.submit_result(JobResult { job_id: leased.job_id, client_id: client, outcome }));

    assert!(!handler.stop().await);
}

#[tokio::test]
async fn get_next_job_on_empty_available_returns_none_without_touching_pending() {
    let settings = HandlerSettings::builder().handler_name("Idle").job_name("no-jobs").auto_start(false).build();
    struct NeverGenerator;
    #[async_trait]
    impl JobGenerator for NeverGenerator {
        async fn create_more_jobs(&self, _handle: &EnqueueHandle) {}
        async fn process_result(&self, _job_input: &[u8], _result_string: &str) {}
        fn is_finished(&self) -> bool { false }
    }
    let (handler, _outcome) =
        Handler::initialize(settings, demo_descriptor("."), Arc::new(NeverGenerator), None).await.unwrap();

    assert!(handler.get_next_job(ClientId::new("client-a")).is_none());
    let info = handler.get_info().await;
    assert_eq!(info.available_count, 0);
    assert_eq!(info.pending_count, 0);
}
