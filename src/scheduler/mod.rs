//! # Tick Scheduler
//!
//! The engine advances state through periodic full-collection passes. The
//! scheduler makes the tick rates and their independence explicit: each
//! task has its own period, and firing one never touches another's
//! deadline. Everything runs on the caller's thread; stopping the pipeline
//! is dropping the scheduler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Time source for the engine. All timestamps are unix seconds.
pub trait Clock: Send + Sync {
    /// Current time, unix seconds.
    fn now_unix(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock starting at the given unix-seconds instant.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the clock forward.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

struct Task {
    name:        String,
    period_secs: u64,
    next_due:    u64,
    action:      Box<dyn FnMut() + Send>,
}

/// Cooperative scheduler for the engine's periodic tasks.
pub struct TickScheduler {
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
}

impl TickScheduler {
    /// Creates a scheduler over the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, tasks: Vec::new() }
    }

    /// Registers a named periodic task. The first firing is one full period
    /// after registration.
    pub fn register(
        &mut self, name: impl Into<String>, period_secs: u64, action: impl FnMut() + Send + 'static,
    ) {
        let period_secs = period_secs.max(1);
        let next_due = self.clock.now_unix().saturating_add(period_secs);
        self.tasks.push(Task {
            name: name.into(),
            period_secs,
            next_due,
            action: Box::new(action),
        });
    }

    /// Runs every task whose deadline has passed, each at most once: a late
    /// wakeup fires a single catch-up tick, not one per missed period,
    /// since each tick is a full-collection pass over current state.
    /// Returns the number of tasks fired.
    pub fn run_pending(&mut self) -> usize {
        let now = self.clock.now_unix();
        let mut fired = 0;

        for task in &mut self.tasks {
            if now >= task.next_due {
                debug!(task = %task.name, "tick");
                (task.action)();
                task.next_due = now.saturating_add(task.period_secs);
                fired += 1;
            }
        }

        fired
    }

    /// Drives the scheduler against real time for roughly the given span,
    /// polling once per second.
    pub fn run_for(&mut self, span: Duration) {
        let deadline = self.clock.now_unix().saturating_add(span.as_secs());
        while self.clock.now_unix() < deadline {
            self.run_pending();
            std::thread::sleep(Duration::from_secs(1));
        }
        self.run_pending();
    }

    /// Registered task names, in registration order.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }
}
