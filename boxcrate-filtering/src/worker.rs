//! Background execution of region filters
//!
//! Each filter runs as a one-shot, stateless task. The task gets its own
//! copy of the flattened point arrays and reports back over a channel, so
//! nothing is shared mutably with the interactive thread. Requests are not
//! deduplicated and cannot be cancelled: every submitted request eventually
//! resolves, and callers compare [`RequestToken`]s to drop stale results.

use boxcrate_core::{BoxId, BoxPadding, Error, OrientedBox, PointBuffer, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::region::{process_request, FilterRequest, FilterResponse};

/// Thread pool configuration for background filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of threads to use (None = automatic)
    pub num_threads: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "boxcrate-filter".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

/// A unit of work handed to an executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run filter jobs to completion
pub trait FilterExecutor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs jobs immediately on the submitting thread
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl FilterExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Runs jobs on a dedicated rayon thread pool
pub struct PoolExecutor {
    pool: ThreadPool,
}

impl PoolExecutor {
    /// Build the pool described by `config`
    pub fn new(config: &WorkerConfig) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new();

        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }

        if !config.thread_name_prefix.is_empty() {
            let prefix = config.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        let pool = builder.build().map_err(|e| {
            Error::BackgroundTask(format!("Failed to create thread pool: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Number of threads in the pool
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl FilterExecutor for PoolExecutor {
    fn execute(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Identifies one submitted request; later requests get larger tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

/// A finished filter request
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCompletion {
    pub token: RequestToken,
    pub box_id: BoxId,
    pub response: FilterResponse,
}

/// The eventual result of a submitted request
#[derive(Debug)]
pub struct PendingFilter {
    pub token: RequestToken,
    pub box_id: BoxId,
    receiver: flume::Receiver<Result<FilterResponse>>,
}

impl PendingFilter {
    /// Wait for the result asynchronously
    pub async fn wait(self) -> Result<FilterCompletion> {
        let result = self
            .receiver
            .recv_async()
            .await
            .map_err(|_| Error::BackgroundTask("filter channel closed before a result arrived".to_string()))?;
        self.complete(result)
    }

    /// Block the current thread until the result arrives
    pub fn wait_blocking(self) -> Result<FilterCompletion> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| Error::BackgroundTask("filter channel closed before a result arrived".to_string()))?;
        self.complete(result)
    }

    fn complete(&self, result: Result<FilterResponse>) -> Result<FilterCompletion> {
        Ok(FilterCompletion {
            token: self.token,
            box_id: self.box_id,
            response: result?,
        })
    }
}

/// Dispatches region filters to an executor
pub struct FilterWorker<E: FilterExecutor = PoolExecutor> {
    executor: E,
    next_token: AtomicU64,
}

impl FilterWorker<PoolExecutor> {
    /// A worker backed by a fresh thread pool
    pub fn with_pool(config: &WorkerConfig) -> Result<Self> {
        Ok(Self::new(PoolExecutor::new(config)?))
    }
}

impl FilterWorker<InlineExecutor> {
    /// A worker that filters on the submitting thread
    pub fn inline() -> Self {
        Self::new(InlineExecutor)
    }
}

impl<E: FilterExecutor> FilterWorker<E> {
    /// Create a worker that runs filter jobs on `executor`
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            next_token: AtomicU64::new(0),
        }
    }

    /// Filter `buffer` against the padded box in the background
    pub fn submit(&self, bbox: &OrientedBox, padding: &BoxPadding, buffer: &PointBuffer) -> PendingFilter {
        self.submit_request(bbox.id, FilterRequest::new(bbox, padding, buffer))
    }

    /// Submit a prepared request
    pub fn submit_request(&self, box_id: BoxId, request: FilterRequest) -> PendingFilter {
        let token = RequestToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = flume::bounded(1);

        log::debug!(
            "dispatching filter request {:?} for box {} ({} points)",
            token,
            box_id,
            request.position.len() / 3
        );

        self.executor.execute(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| process_request(&request)))
                .unwrap_or_else(|_| Err(Error::BackgroundTask("filter task panicked".to_string())));
            if let Ok(response) = &result {
                log::trace!("filter request {:?} kept {} points", token, response.count);
            }
            // the caller may have dropped the pending handle
            let _ = sender.send(result);
        }));

        PendingFilter {
            token,
            box_id,
            receiver,
        }
    }
}

/// Tracks the newest request per box so stale completions can be dropped
#[derive(Debug, Clone, Default)]
pub struct LatestResults {
    latest: HashMap<BoxId, RequestToken>,
}

impl LatestResults {
    /// Create a tracker with no outstanding requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `pending` as the newest request for its box
    pub fn record(&mut self, pending: &PendingFilter) {
        let entry = self.latest.entry(pending.box_id).or_insert(pending.token);
        if pending.token > *entry {
            *entry = pending.token;
        }
    }

    /// Whether a completion belongs to the newest request for its box
    pub fn is_current(&self, completion: &FilterCompletion) -> bool {
        self.latest.get(&completion.box_id) == Some(&completion.token)
    }

    /// Forget a box, e.g. after it was deleted
    pub fn forget(&mut self, box_id: BoxId) {
        self.latest.remove(&box_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxcrate_core::Point3f;

    fn cube_points() -> PointBuffer {
        PointBuffer::new(
            vec![0.0, 0.0, 0.0, 0.4, 0.4, 0.4, 3.0, 0.0, 0.0],
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
        )
        .unwrap()
    }

    fn unit_box(id: BoxId) -> OrientedBox {
        OrientedBox::new(id, Point3f::origin(), 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_inline_worker() {
        let worker = FilterWorker::inline();
        let pending = worker.submit(&unit_box(4), &BoxPadding::default(), &cube_points());
        let completion = pending.wait_blocking().unwrap();
        assert_eq!(completion.box_id, 4);
        assert_eq!(completion.response.count, 2);
        assert_eq!(completion.response.color, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_pool_worker_async() {
        let worker = FilterWorker::with_pool(&WorkerConfig::default().with_threads(2)).unwrap();
        let pending = worker.submit(&unit_box(1), &BoxPadding::uniform(6.0), &cube_points());
        let completion = pollster::block_on(pending.wait()).unwrap();
        assert_eq!(completion.response.count, 3);
    }

    #[test]
    fn test_tokens_increase_and_stale_results_are_detected() {
        let worker = FilterWorker::with_pool(&WorkerConfig::default().with_threads(2)).unwrap();
        let buffer = cube_points();
        let mut latest = LatestResults::new();

        let first = worker.submit(&unit_box(9), &BoxPadding::default(), &buffer);
        latest.record(&first);
        let second = worker.submit(&unit_box(9), &BoxPadding::uniform(6.0), &buffer);
        latest.record(&second);
        assert!(second.token > first.token);

        // both requests complete; only the newer one is current
        let first = first.wait_blocking().unwrap();
        let second = second.wait_blocking().unwrap();
        assert!(!latest.is_current(&first));
        assert!(latest.is_current(&second));
        assert_eq!(second.response.count, 3);

        latest.forget(9);
        assert!(!latest.is_current(&second));
    }

    #[test]
    fn test_malformed_request_fails_future() {
        let worker = FilterWorker::inline();
        let mut request = FilterRequest::new(&unit_box(0), &BoxPadding::default(), &cube_points());
        request.color.pop();
        let result = worker.submit_request(0, request).wait_blocking();
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    struct DroppingExecutor;

    impl FilterExecutor for DroppingExecutor {
        fn execute(&self, job: Job) {
            drop(job);
        }
    }

    #[test]
    fn test_closed_channel_is_background_task_failure() {
        let worker = FilterWorker::new(DroppingExecutor);
        let pending = worker.submit(&unit_box(0), &BoxPadding::default(), &cube_points());
        let result = pollster::block_on(pending.wait());
        assert!(matches!(result, Err(Error::BackgroundTask(_))));
    }
}
