use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

/// Fixed UTC-3 reference offset, year-round. Instants are composed against
/// this offset textually; nothing here consults the host timezone.
pub fn reference_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("static offset")
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_local(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&reference_offset())
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock: starts at a fixed instant and only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Handle to a scheduled one-shot task. Cancellation is cooperative: the
/// task checks the flag right before running.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub trait TimerScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle;
}

pub struct TokioScheduler;

impl TimerScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let task_handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !task_handle.is_cancelled() {
                task();
            }
        });
        handle
    }
}

/// Test scheduler: collects tasks and fires them on demand, so expiry logic
/// runs without wall-clock waits.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(Duration, TimerHandle, Box<dyn FnOnce() + Send>)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Runs every scheduled task that was not cancelled. Tasks fire in
    /// delay order, matching the order a real clock would run them.
    pub fn fire_all(&self) {
        let mut tasks: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        tasks.sort_by_key(|(delay, _, _)| *delay);
        for (_, handle, task) in tasks {
            if !handle.is_cancelled() {
                task();
            }
        }
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        self.pending
            .lock()
            .unwrap()
            .push((delay, handle.clone(), task));
        handle
    }
}
