//! Exactly-once completion detection for a fan-out of independent tasks.
//!
//! Every finished task calls [`CompletionTracker::report_one`]. The counter is
//! advanced with a single compare-and-swap that refuses to pass `total`, so
//! exactly one caller observes `completed == total`. That caller resets the
//! counters, takes the stored callback out of its slot, and hands it to the
//! coordination thread through a channel.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::Sender;

use crate::error::HeightmapError;

/// The one-shot handler invoked when every task of a run has finished.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of a run as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunPhase {
    /// No run is active.
    Idle = 0,
    /// Tasks are being dispatched or executed.
    Running = 1,
    /// Every task finished; the callback is waiting on the coordination thread.
    Complete = 2,
}

impl RunPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Complete,
            _ => Self::Idle,
        }
    }
}

/// Snapshot returned to the task that reported a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Completed tasks including the reporting one.
    pub completed: usize,
    /// Total tasks in the run.
    pub total: usize,
}

impl Progress {
    /// `completed / total`, or 0 for an empty run.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    /// Returns `true` for the report that finished the run.
    pub fn is_last(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Shared completion counters and the single callback slot.
pub struct CompletionTracker {
    total: AtomicUsize,
    completed: AtomicUsize,
    verbose: AtomicBool,
    phase: AtomicU8,
    callback: Mutex<Option<CompletionCallback>>,
    completions: Sender<CompletionCallback>,
}

impl CompletionTracker {
    /// Create an idle tracker that delivers callbacks into `completions`.
    pub fn new(completions: Sender<CompletionCallback>) -> Self {
        Self {
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            verbose: AtomicBool::new(false),
            phase: AtomicU8::new(RunPhase::Idle as u8),
            callback: Mutex::new(None),
            completions,
        }
    }

    /// Arm the tracker for a run of `total` tasks.
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::RunInProgress`] unless the tracker is idle.
    pub fn begin(
        &self,
        total: usize,
        verbose: bool,
        callback: CompletionCallback,
    ) -> Result<(), HeightmapError> {
        self.phase
            .compare_exchange(
                RunPhase::Idle as u8,
                RunPhase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| HeightmapError::RunInProgress)?;

        self.completed.store(0, Ordering::Release);
        self.verbose.store(verbose, Ordering::Relaxed);
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
        self.total.store(total, Ordering::Release);
        Ok(())
    }

    /// Record one finished task.
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::CompletionOverflow`] if every task of the
    /// run has already been reported. The counters are left untouched.
    pub fn report_one(&self) -> Result<Progress, HeightmapError> {
        let total = self.total.load(Ordering::Acquire);
        let previous = self
            .completed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |completed| {
                (completed < total).then_some(completed + 1)
            })
            .map_err(|completed| HeightmapError::CompletionOverflow { completed, total })?;

        let progress = Progress {
            completed: previous + 1,
            total,
        };
        if progress.is_last() {
            self.finish();
        }
        Ok(progress)
    }

    /// Terminal transition, performed only by the task that completed the run.
    fn finish(&self) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        self.total.store(0, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        self.phase.store(RunPhase::Complete as u8, Ordering::Release);

        tracing::info!("Heightmap is complete");

        if let Some(callback) = callback
            && self.completions.send(callback).is_err()
        {
            tracing::warn!("Completion receiver dropped; heightmap callback discarded");
        }
    }

    /// Return to idle after the coordination thread picked up the callback.
    pub fn acknowledge(&self) {
        let _ = self.phase.compare_exchange(
            RunPhase::Complete as u8,
            RunPhase::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Abandon a run that could not be fully dispatched.
    pub fn abort(&self) {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.total.store(0, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        self.phase.store(RunPhase::Idle as u8, Ordering::Release);
    }

    /// `completed / total`, or 0 when no run is counting.
    pub fn completion_fraction(&self) -> f32 {
        self.progress().fraction()
    }

    /// Current counters without reporting anything.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }

    /// Whether per-cell completion logging is enabled for this run.
    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use crossbeam_channel::unbounded;

    use super::*;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> CompletionCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_last_report_schedules_callback() {
        let (tx, rx) = unbounded();
        let tracker = CompletionTracker::new(tx);
        let fired = Arc::new(AtomicUsize::new(0));
        tracker.begin(3, true, counting_callback(&fired)).unwrap();

        assert!(!tracker.report_one().unwrap().is_last());
        assert!(!tracker.report_one().unwrap().is_last());
        assert!(rx.try_recv().is_err());
        assert!(tracker.report_one().unwrap().is_last());

        assert_eq!(tracker.phase(), RunPhase::Complete);
        assert_eq!(tracker.progress(), Progress { completed: 0, total: 0 });
        let callback = rx.try_recv().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        callback();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_overflow_is_detected() {
        let (tx, _rx) = unbounded();
        let tracker = CompletionTracker::new(tx);
        tracker.begin(1, false, Box::new(|| {})).unwrap();
        tracker.report_one().unwrap();

        let err = tracker.report_one().unwrap_err();
        assert!(matches!(
            err,
            HeightmapError::CompletionOverflow { completed: 0, total: 0 }
        ));
    }

    #[test]
    fn test_begin_rejects_active_run() {
        let (tx, rx) = unbounded();
        let tracker = CompletionTracker::new(tx);
        tracker.begin(1, false, Box::new(|| {})).unwrap();
        assert!(matches!(
            tracker.begin(1, false, Box::new(|| {})),
            Err(HeightmapError::RunInProgress)
        ));

        tracker.report_one().unwrap();
        // Still complete until the callback has been picked up.
        assert!(tracker.begin(1, false, Box::new(|| {})).is_err());

        rx.try_recv().unwrap()();
        tracker.acknowledge();
        assert_eq!(tracker.phase(), RunPhase::Idle);
        assert!(tracker.begin(1, false, Box::new(|| {})).is_ok());
    }

    #[test]
    fn test_fraction_is_idempotent() {
        let (tx, _rx) = unbounded();
        let tracker = CompletionTracker::new(tx);
        assert_eq!(tracker.completion_fraction(), 0.0);

        tracker.begin(4, false, Box::new(|| {})).unwrap();
        tracker.report_one().unwrap();
        let first = tracker.completion_fraction();
        let second = tracker.completion_fraction();
        assert_eq!(first, 0.25);
        assert_eq!(first, second);
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let (tx, rx) = unbounded();
        let tracker = CompletionTracker::new(tx);
        tracker.begin(10, true, Box::new(|| {})).unwrap();
        tracker.abort();
        assert_eq!(tracker.phase(), RunPhase::Idle);
        assert_eq!(tracker.completion_fraction(), 0.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_reports_fire_once() {
        let (tx, rx) = unbounded();
        let tracker = Arc::new(CompletionTracker::new(tx));
        let fired = Arc::new(AtomicUsize::new(0));
        let total = 8 * 1000;
        tracker.begin(total, false, counting_callback(&fired)).unwrap();

        let lasts = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let lasts = Arc::clone(&lasts);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if tracker.report_one().unwrap().is_last() {
                            lasts.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(lasts.load(Ordering::SeqCst), 1);
        let callbacks: Vec<_> = rx.try_iter().collect();
        assert_eq!(callbacks.len(), 1);
        for callback in callbacks {
            callback();
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
