// Periodic background worker - the one concurrency primitive in the app
//
// Each cache with a finite expiration and each local sampler owns one of
// these. There is no global scheduler; workers sleep independently and the
// render loop never blocks on them. Shutdown is explicit: stop() signals the
// thread and joins it, so no worker outlives the process teardown.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

/// A named thread that runs a job every `interval`, until stopped.
#[derive(Debug)]
pub struct PeriodicWorker {
    name: String,
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicWorker {
    /// Spawn a worker that sleeps `interval`, runs `job`, and repeats.
    ///
    /// The first run happens one full interval after spawn; callers that need
    /// an immediate run (cache priming) perform it synchronously before
    /// spawning, so its errors propagate to them instead of being swallowed
    /// here.
    pub fn spawn<F>(name: &str, interval: Duration, mut job: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread_name = format!("homeboard-{}", name);
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    // No stop signal within the interval: time to run the job
                    Err(RecvTimeoutError::Timeout) => job(),
                    // Stop signal, or the owner was dropped without stop()
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn worker thread");

        tracing::debug!("worker '{}' started (interval {:?})", name, interval);

        Self {
            name: name.to_string(),
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker to stop and wait for the thread to exit.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("worker '{}' panicked", self.name);
            } else {
                tracing::debug!("worker '{}' stopped", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_worker_runs_job_periodically() {
        let count = Arc::new(AtomicUsize::new(0));
        let job_count = count.clone();
        let worker = PeriodicWorker::spawn("test", Duration::from_millis(5), move || {
            job_count.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(40));
        worker.stop();

        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_joins_and_halts_job() {
        let count = Arc::new(AtomicUsize::new(0));
        let job_count = count.clone();
        let worker = PeriodicWorker::spawn("test-stop", Duration::from_millis(5), move || {
            job_count.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(20));
        worker.stop();
        let after_stop = count.load(Ordering::SeqCst);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }
}
