//! Progress reporting and cooperative cancellation shared by the sampling stages.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{Result, SamplingError};

/// Receiver of progress notifications.
///
/// Implementations typically drive a progress bar. All methods have empty default
/// implementations so that a reporter may only listen to what it needs.
pub trait Progress: Send + Sync {
    /// A new stage starts, `total` units of work are expected
    fn start(&self, _title: &str, _total: usize) {}
    /// `done` units of work of the current stage are completed so far
    fn advance(&self, _done: usize) {}
    /// The current stage is over
    fn finish(&self) {}
}

/// A progress reporter forwarding notifications to the `log` facade
#[derive(Clone, Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn start(&self, title: &str, total: usize) {
        log::info!("{title} ({total} steps)");
    }

    fn advance(&self, done: usize) {
        log::trace!("step {done}");
    }
}

/// Cancellation flag and progress reporter handed to every stage of a generation.
///
/// Cloning a monitor shares both the flag and the reporter, so an external
/// controller keeping a clone (or the flag itself) may cancel at any time.
#[derive(Clone, Default)]
pub struct Monitor {
    cancelled: Arc<AtomicBool>,
    progress: Option<Arc<dyn Progress>>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("cancelled", &self.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Monitor {
    /// A monitor without progress reporting, never cancelled unless requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the progress reporter
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Uses an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// The shared cancellation flag
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Requests the cancellation of the running generation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation request
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`SamplingError::Cancelled`] when cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SamplingError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Notifies the start of a stage of `total` units
    pub fn start(&self, title: &str, total: usize) {
        if let Some(p) = &self.progress {
            p.start(title, total);
        }
    }

    /// Notifies the number of completed units of the current stage
    pub fn advance(&self, done: usize) {
        if let Some(p) = &self.progress {
            p.advance(done);
        }
    }

    /// Notifies the end of the current stage
    pub fn finish(&self) {
        if let Some(p) = &self.progress {
            p.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Progress for Recorder {
        fn start(&self, title: &str, total: usize) {
            self.0.lock().unwrap().push(format!("{title}:{total}"));
        }
        fn advance(&self, done: usize) {
            self.0.lock().unwrap().push(format!("{done}"));
        }
        fn finish(&self) {
            self.0.lock().unwrap().push("end".to_string());
        }
    }

    #[test]
    fn test_cancel_shared_between_clones() {
        let monitor = Monitor::new();
        let other = monitor.clone();
        assert!(monitor.check().is_ok());
        other.cancel();
        assert!(monitor.is_cancelled());
        assert!(matches!(monitor.check(), Err(SamplingError::Cancelled)));
        monitor.reset();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_external_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let monitor = Monitor::new().with_cancel_flag(Arc::clone(&flag));
        flag.store(true, Ordering::SeqCst);
        assert!(monitor.is_cancelled());
    }

    #[test]
    fn test_progress_forwarded() {
        let recorder = Arc::new(Recorder::default());
        let monitor = Monitor::new().with_progress(recorder.clone());
        monitor.start("Trajectory", 2);
        monitor.advance(1);
        monitor.advance(2);
        monitor.finish();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["Trajectory:2", "1", "2", "end"]
        );
    }
}
