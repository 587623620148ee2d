//! Queues that run the classifier and hand results back to the store.
//!
//! # Invariants
//! - `submit` never blocks on a slow classifier in `ThreadedQueue`.
//! - Results are only applied when the store drains them, on the store's
//!   own thread.
//! - There is no cancellation: a request for a task deleted meanwhile still
//!   runs, and its result is dropped by the store.
//! - Dropping a `ThreadedQueue` never waits on the worker. Requests the
//!   worker has not started yet are discarded; the one in flight finishes
//!   on the detached thread and its result goes nowhere.

use log::{error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{run_classifier, ClassificationRequest, ClassificationResult, Classifier};

pub trait ClassificationQueue: Send {
    fn submit(&mut self, request: ClassificationRequest);

    /// Returns every finished result without blocking.
    fn drain_completed(&mut self) -> Vec<ClassificationResult>;

    /// Number of submitted requests not yet drained.
    fn pending(&self) -> usize;

    /// Blocks up to `timeout` for pending requests to finish.
    fn wait_completed(&mut self, timeout: Duration) -> Vec<ClassificationResult> {
        let _ = timeout;
        self.drain_completed()
    }
}

/// Classifies synchronously on submit and buffers the result until drained.
pub struct InlineQueue<C: Classifier> {
    classifier: C,
    completed: Vec<ClassificationResult>,
}

impl<C: Classifier> InlineQueue<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            completed: Vec::new(),
        }
    }
}

impl<C: Classifier> ClassificationQueue for InlineQueue<C> {
    fn submit(&mut self, request: ClassificationRequest) {
        let result = run_classifier(&self.classifier, request);
        self.completed.push(result);
    }

    fn drain_completed(&mut self) -> Vec<ClassificationResult> {
        std::mem::take(&mut self.completed)
    }

    fn pending(&self) -> usize {
        self.completed.len()
    }
}

/// Runs the classifier on one background worker thread.
pub struct ThreadedQueue {
    requests: Option<Sender<ClassificationRequest>>,
    results: Receiver<ClassificationResult>,
    worker: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    in_flight: usize,
}

impl ThreadedQueue {
    pub fn spawn(classifier: Arc<dyn Classifier>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ClassificationRequest>();
        let (result_tx, result_rx) = mpsc::channel::<ClassificationResult>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_shutdown = Arc::clone(&shutdown);

        let spawned = thread::Builder::new()
            .name("quadrant-classifier".to_string())
            .spawn(move || {
                for request in request_rx {
                    if worker_shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    let result = run_classifier(classifier.as_ref(), request);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });

        let worker = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(
                    "event=classifier_worker module=classify status=error error_code=spawn_failed error={err}"
                );
                None
            }
        };

        Self {
            requests: worker.as_ref().map(|_| request_tx),
            results: result_rx,
            worker,
            shutdown,
            in_flight: 0,
        }
    }
}

impl ClassificationQueue for ThreadedQueue {
    fn submit(&mut self, request: ClassificationRequest) {
        let task_id = request.task_id;
        let sent = self
            .requests
            .as_ref()
            .map(|tx| tx.send(request).is_ok())
            .unwrap_or(false);
        if sent {
            self.in_flight += 1;
        } else {
            warn!("event=classify module=classify status=skip task_id={task_id} reason=worker_unavailable");
        }
    }

    fn drain_completed(&mut self) -> Vec<ClassificationResult> {
        let completed: Vec<_> = self.results.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(completed.len());
        completed
    }

    fn pending(&self) -> usize {
        self.in_flight
    }

    fn wait_completed(&mut self, timeout: Duration) -> Vec<ClassificationResult> {
        let deadline = Instant::now() + timeout;
        let mut completed = Vec::new();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.results.recv_timeout(remaining) {
                Ok(result) => {
                    self.in_flight -= 1;
                    completed.push(result);
                }
                Err(_) => break,
            }
        }
        completed
    }
}

impl Drop for ThreadedQueue {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.requests.take();
        // Detach instead of joining; the in-flight call may run for seconds.
        self.worker.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifierReply;
    use crate::model::task::Category;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use uuid::Uuid;

    struct Fixed(Category);

    impl Classifier for Fixed {
        fn classify(&self, _title: &str, _description: Option<&str>) -> ClassifierReply {
            ClassifierReply::suggest(self.0, None)
        }
    }

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            task_id: Uuid::new_v4(),
            revision: 0,
            title: "pay invoice".to_string(),
            description: None,
            keep_duration: false,
        }
    }

    #[test]
    fn inline_queue_buffers_until_drained() {
        let mut queue = InlineQueue::new(Fixed(Category::Q2));
        queue.submit(request());
        assert_eq!(queue.pending(), 1);
        let results = queue.drain_completed();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reply.category, Category::Q2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn threaded_queue_delivers_results() {
        let mut queue = ThreadedQueue::spawn(Arc::new(Fixed(Category::Q4)));
        let first = request();
        queue.submit(first.clone());
        queue.submit(request());

        let results = queue.wait_completed(Duration::from_secs(5));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].request, first);
        assert!(results.iter().all(|r| r.reply.category == Category::Q4));
        assert_eq!(queue.pending(), 0);
    }

    struct Slow {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl Classifier for Slow {
        fn classify(&self, _title: &str, _description: Option<&str>) -> ClassifierReply {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            thread::sleep(self.delay);
            ClassifierReply::suggest(Category::Q1, None)
        }
    }

    #[test]
    fn dropping_threaded_queue_skips_queued_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut queue = ThreadedQueue::spawn(Arc::new(Slow {
            calls: Arc::clone(&calls),
            delay: Duration::from_millis(200),
        }));
        for _ in 0..5 {
            queue.submit(request());
        }

        let started = Instant::now();
        drop(queue);
        assert!(started.elapsed() < Duration::from_millis(150));

        thread::sleep(Duration::from_millis(700));
        assert!(calls.load(AtomicOrdering::SeqCst) <= 1);
    }
}
