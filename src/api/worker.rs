//! A background thread that processes requests off the caller's thread.
//!
//! Interactive callers submit a new request for every parameter change.
//! Only the newest request matters, so the worker skips requests that were superseded
//! before it got to them, and [`Worker::recv`] drops results of superseded requests.
//! A superseded request that is already running is not interrupted;
//! its result is simply discarded.

use super::pipeline::{Pipeline, ProcessingRequest, ProcessingResult};
use crate::{Error, PixelBuffer, ProcessingConfig};
use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::trace;

/// Hands out increasing request ids and remembers the latest one.
///
/// # Examples
/// ```
/// # use ditherlab::RequestTracker;
/// let tracker = RequestTracker::new();
/// let first = tracker.next_id();
/// let second = tracker.next_id();
/// assert!(second > first);
/// assert!(tracker.is_current(second));
/// assert!(!tracker.is_current(first));
/// ```
#[derive(Debug, Default)]
pub struct RequestTracker {
    /// The most recently issued id, or `0` if none was issued yet.
    latest: AtomicU64,
}

impl RequestTracker {
    /// Creates a new [`RequestTracker`]. The first id it hands out is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { latest: AtomicU64::new(0) }
    }

    /// Issues a new id, superseding all previous ones.
    pub fn next_id(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The most recently issued id.
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Whether `id` is the most recently issued id.
    #[must_use]
    pub fn is_current(&self, id: u64) -> bool {
        id == self.latest()
    }
}

/// Owns a background thread that runs [`Pipeline::run`] on submitted requests.
///
/// Dropping the worker stops the thread after the request in progress (if any) finishes.
///
/// # Examples
/// ```
/// # use ditherlab::{PixelBuffer, ProcessingConfig, Worker};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let worker = Worker::spawn()?;
/// let image = PixelBuffer::filled(16, 16, [90, 90, 90, 255]);
///
/// worker.submit(image.clone(), ProcessingConfig::new().contrast(0.5))?;
/// let id = worker.submit(image, ProcessingConfig::new().contrast(1.5))?;
///
/// // only the result of the newest request is delivered
/// let result = worker.recv().unwrap();
/// assert_eq!(result.id, id);
/// assert!(result.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Worker {
    /// Issues request ids and decides which results are still wanted.
    tracker: Arc<RequestTracker>,
    /// Sends requests to the thread. `None` once shut down.
    requests: Option<Sender<ProcessingRequest>>,
    /// Receives results from the thread.
    results: Receiver<ProcessingResult>,
    /// The background thread. `None` once joined.
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts a new worker thread.
    ///
    /// # Errors
    /// Returns an error if the operating system fails to create the thread.
    pub fn spawn() -> io::Result<Self> {
        #[cfg(feature = "threads")]
        let process = Pipeline::run_par;
        #[cfg(not(feature = "threads"))]
        let process = Pipeline::run;
        Self::spawn_with(process)
    }

    /// Starts a new worker thread that handles requests with `process`.
    fn spawn_with<F>(process: F) -> io::Result<Self>
    where
        F: Fn(ProcessingRequest) -> ProcessingResult + Send + 'static,
    {
        let tracker = Arc::new(RequestTracker::new());
        let (request_sender, request_receiver) = mpsc::channel();
        let (result_sender, result_receiver) = mpsc::channel();

        let handle = thread::Builder::new().name("ditherlab-worker".to_owned()).spawn({
            let tracker = Arc::clone(&tracker);
            move || serve(&tracker, &request_receiver, &result_sender, process)
        })?;

        Ok(Self {
            tracker,
            requests: Some(request_sender),
            results: result_receiver,
            handle: Some(handle),
        })
    }

    /// The tracker deciding which request is the latest.
    #[must_use]
    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Validates `config` and queues a request, superseding all earlier ones.
    /// Returns the id of the new request.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] without queueing anything if `config` is invalid,
    /// or [`Error::ComputationFailure`] if the worker thread is no longer running.
    pub fn submit(&self, buffer: PixelBuffer, config: ProcessingConfig) -> Result<u64, Error> {
        config.validate()?;

        let id = self.tracker.next_id();
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|requests| requests.send(ProcessingRequest { id, buffer, config }).is_ok());

        if sent {
            Ok(id)
        } else {
            Err(Error::ComputationFailure("worker thread has stopped".to_owned()))
        }
    }

    /// Returns a result that arrived already, if it belongs to the latest request.
    /// Results of superseded requests are dropped.
    pub fn try_recv(&self) -> Option<ProcessingResult> {
        self.results.try_iter().find(|result| self.tracker.is_current(result.id))
    }

    /// Waits for the result of the latest request, dropping results of superseded requests.
    ///
    /// Returns `None` if the worker thread has stopped.
    pub fn recv(&self) -> Option<ProcessingResult> {
        self.results.iter().find(|result| self.tracker.is_current(result.id))
    }

    /// Like [`Worker::recv`], but gives up and returns `None` after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ProcessingResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(result) if self.tracker.is_current(result.id) => return Some(result),
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing the channel ends the loop in `serve`
        drop(self.requests.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// The loop of the worker thread.
fn serve<F>(
    tracker: &RequestTracker,
    requests: &Receiver<ProcessingRequest>,
    results: &Sender<ProcessingResult>,
    process: F,
) where
    F: Fn(ProcessingRequest) -> ProcessingResult,
{
    while let Ok(mut request) = requests.recv() {
        for newer in requests.try_iter() {
            trace!(dropped = request.id, newer = newer.id, "coalesced request");
            request = newer;
        }

        if !tracker.is_current(request.id) {
            // superseded by a request that is not queued yet
            trace!(dropped = request.id, "stale request");
            continue;
        }

        if results.send(process(request)).is_err() {
            break;
        }
    }
}
