//! Cancellable timers for the card presenter.
//!
//! The presenter never sleeps itself. It asks a [`Scheduler`] for a timer and
//! is later told, through `CardPresenter::on_timer`, that a handle fired. Two
//! implementations exist:
//!
//! - [`ManualScheduler`]: a fake clock moved forward by hand, used in tests.
//! - [`TokioScheduler`]: `tokio::time::sleep` tasks that deliver fired handles
//!   over an unbounded channel, for the interactive CLI.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{RecallError, Result};

/// Identifies one scheduled timer. Unique per scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw identifier, for logging.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Issues one-shot timers that can be cancelled before they fire.
pub trait Scheduler {
    /// Schedules a timer that fires once after `delay`.
    fn schedule(&self, delay: Duration) -> Result<TimerHandle>;

    /// Cancels a pending timer.
    ///
    /// Returns `Ok(false)` if the handle already fired, was already cancelled,
    /// or was never issued by this scheduler.
    fn cancel(&self, handle: TimerHandle) -> Result<bool>;
}

// ============================================================================
// ManualScheduler
// ============================================================================

#[derive(Debug, Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerHandle, Duration>,
}

/// A scheduler driven by an explicit fake clock.
///
/// Clones share the same clock and timer table, so several presenters can be
/// driven from one clock and a timer leaked by one of them is visible to all.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    clock: Rc<RefCell<ManualClock>>,
}

impl ManualScheduler {
    /// Creates a scheduler with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward and returns the timers that fired, earliest first.
    ///
    /// Must not be called from inside [`Scheduler::schedule`] or
    /// [`Scheduler::cancel`] on a clone sharing this clock.
    pub fn advance(&self, by: Duration) -> Vec<TimerHandle> {
        let mut clock = self.clock.borrow_mut();
        clock.now += by;
        let now = clock.now;

        let mut fired: Vec<(Duration, TimerHandle)> = clock
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect();
        fired.sort();
        for (_, handle) in &fired {
            clock.pending.remove(handle);
        }
        fired.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Current reading of the fake clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Number of timers scheduled but neither fired nor cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.clock.borrow().pending.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration) -> Result<TimerHandle> {
        let mut clock = self
            .clock
            .try_borrow_mut()
            .map_err(|e| RecallError::service("scheduler", e.to_string()))?;
        clock.next_id += 1;
        let handle = TimerHandle(clock.next_id);
        let deadline = clock.now + delay;
        clock.pending.insert(handle, deadline);
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> Result<bool> {
        let mut clock = self
            .clock
            .try_borrow_mut()
            .map_err(|e| RecallError::service("scheduler", e.to_string()))?;
        Ok(clock.pending.remove(&handle).is_some())
    }
}

// ============================================================================
// TokioScheduler
// ============================================================================

type TaskTable = Arc<Mutex<HashMap<TimerHandle, JoinHandle<()>>>>;

/// A scheduler backed by tokio sleep tasks.
///
/// Fired handles arrive on the receiver returned by [`TokioScheduler::new`].
/// Dropping the scheduler aborts every pending timer.
#[derive(Debug)]
pub struct TokioScheduler {
    next_id: AtomicU64,
    tasks: TaskTable,
    fired_tx: mpsc::UnboundedSender<TimerHandle>,
}

impl TokioScheduler {
    /// Creates a scheduler and the channel on which fired timers are delivered.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().map_or(0, |tasks| tasks.len())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration) -> Result<TimerHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RecallError::service("scheduler", e.to_string()))?;
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut tasks = self
            .tasks
            .lock()
            .map_err(|e| RecallError::service("scheduler", e.to_string()))?;

        let table = Arc::clone(&self.tasks);
        let fired_tx = self.fired_tx.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = table
                .lock()
                .map(|mut tasks| tasks.remove(&handle).is_some())
                .unwrap_or(false);
            if still_pending && fired_tx.send(handle).is_err() {
                debug!(%handle, "Timer fired after its receiver was dropped");
            }
        });
        tasks.insert(handle, task);
        drop(tasks);

        debug!(%handle, delay_ms = delay.as_millis(), "Timer scheduled");
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> Result<bool> {
        let task = self
            .tasks
            .lock()
            .map_err(|e| RecallError::service("scheduler", e.to_string()))?
            .remove(&handle);
        match task {
            Some(task) => {
                task.abort();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}
