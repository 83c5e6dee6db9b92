use std::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use tqs_core::{Operation, Task};

/// Marker stored in the op slot when the last claim fell past the queue.
const NO_TASK: u8 = u8::MAX;

/// Group-local scratch holding the most recent claim (`next`) and the task
/// being executed.
///
/// Written only by the group's designated lane, read by every lane after the
/// group barrier. The barrier provides the happens-before edge, so the
/// fields themselves use relaxed atomics.
#[derive(Debug)]
pub struct GroupCache {
    next: AtomicUsize,
    task_id: AtomicU32,
    task_op: AtomicU8,
}

impl Default for GroupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupCache {
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(usize::MAX),
            task_id: AtomicU32::new(0),
            task_op: AtomicU8::new(NO_TASK),
        }
    }

    /// Store a claimed index and the task it resolved to. `task` is `None`
    /// when the index lies past the end of the queue.
    pub fn publish(&self, next: usize, task: Option<Task>) {
        self.next.store(next, Ordering::Relaxed);
        match task {
            Some(t) => {
                self.task_id.store(t.id, Ordering::Relaxed);
                self.task_op.store(t.op.as_u8(), Ordering::Relaxed);
            }
            None => self.task_op.store(NO_TASK, Ordering::Relaxed),
        }
    }

    /// Index of the most recent claim.
    pub fn next(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }

    /// Task to execute, or `None` once the group's last claim is at or past
    /// `queue_size`.
    pub fn current(&self, queue_size: usize) -> Option<Task> {
        if self.next() >= queue_size {
            return None;
        }
        let op = Operation::from_u8(self.task_op.load(Ordering::Relaxed))?;
        Some(Task {
            id: self.task_id.load(Ordering::Relaxed),
            op,
        })
    }
}
