//! Cooperative timer queue for the simulation's timed waits.
//!
//! Every suspension point in the combat loop (spawn cadence, reload ticks,
//! ranged firing, damage-flash restore) is a task with a deadline on
//! simulation time. The variable-rate phase advances the clock and drains
//! due tasks in deadline order. A task rescheduled while being handled is
//! timed from its own deadline, so long frames do not stretch loop cadence.

use ahash::AHashMap;
use onslaught_common::PoolHandle;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Smallest delay a task can be scheduled with, in seconds.
pub const MIN_TASK_DELAY: f32 = 1.0e-3;

/// Identifies a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work resumed when a timed wait elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedTask {
    /// Spawn director attempts the next spawn.
    Spawn,
    /// Next step of the active weapon's reload loop.
    ReloadTick,
    /// Ranged enemy fires its next shot.
    EnemyFire {
        /// Enemy owning the firing loop
        enemy: PoolHandle,
    },
    /// Enemy tint returns to its base colour.
    FlashRestore {
        /// Enemy that was flashed
        enemy: PoolHandle,
    },
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: f64,
    id: TaskId,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.total_cmp(&other.at).then(self.id.cmp(&other.id))
    }
}

/// Deadline-ordered queue of cancellable timed tasks.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Current simulation time in seconds
    now: f64,
    /// Time the current advance runs up to
    horizon: f64,
    /// Next task id to hand out
    next_id: u64,
    /// Min-heap of deadlines (cancelled entries are skipped lazily)
    deadlines: BinaryHeap<Reverse<Deadline>>,
    /// Live tasks by id
    pending: AHashMap<TaskId, TimedTask>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of tasks still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `id` is still waiting to run.
    #[must_use]
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Schedules `task` to run `delay` seconds from now.
    pub fn schedule(&mut self, delay: f32, task: TimedTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let at = self.now + f64::from(delay.max(MIN_TASK_DELAY));
        self.deadlines.push(Reverse(Deadline { at, id }));
        self.pending.insert(id, task);
        id
    }

    /// Cancels a waiting task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Moves the horizon `dt` seconds ahead; call [`Self::pop_due`] until it
    /// returns `None` to run everything that elapsed.
    pub fn advance(&mut self, dt: f32) {
        self.horizon = self.now + f64::from(dt.max(0.0));
    }

    /// Pops the earliest task due before the horizon.
    ///
    /// While a task is handed out the clock reads its deadline; once nothing
    /// else is due the clock settles on the horizon.
    pub fn pop_due(&mut self) -> Option<(TaskId, TimedTask)> {
        while let Some(Reverse(next)) = self.deadlines.peek().copied() {
            if next.at > self.horizon {
                break;
            }
            self.deadlines.pop();
            if let Some(task) = self.pending.remove(&next.id) {
                self.now = self.now.max(next.at);
                return Some((next.id, task));
            }
        }
        self.now = self.now.max(self.horizon);
        None
    }

    /// Drops every waiting task. The clock keeps running.
    pub fn clear(&mut self) {
        self.deadlines.clear();
        self.pending.clear();
    }
}
