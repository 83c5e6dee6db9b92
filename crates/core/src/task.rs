use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TqsError};

/// Cost class of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Compute-bound: runs the run-level iteration count.
    Heavy,
    /// Near-zero cost: always a single iteration.
    Light,
}

impl Operation {
    /// Inner iteration count for this class given the run-level setting.
    pub fn inner_iterations(self, iterations: u32) -> u32 {
        match self {
            Operation::Heavy => iterations,
            Operation::Light => 1,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Operation::Heavy => 0,
            Operation::Light => 1,
        }
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Operation::Heavy),
            1 => Some(Operation::Light),
            _ => None,
        }
    }
}

/// Immutable task descriptor: identity plus cost class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub op: Operation,
}

impl Task {
    pub fn heavy(id: u32) -> Self {
        Self { id, op: Operation::Heavy }
    }

    pub fn light(id: u32) -> Self {
        Self { id, op: Operation::Light }
    }
}

/// How a generated task pool mixes HEAVY and LIGHT tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPattern {
    /// HEAVY at even positions, LIGHT at odd ones.
    #[default]
    Alternating,
    AllHeavy,
    AllLight,
    /// One HEAVY task every `n` positions, starting with the first.
    HeavyEvery(u32),
}

impl TaskPattern {
    /// Operation for the task at `position` within the pool.
    pub fn op_at(self, position: usize) -> Operation {
        let heavy = match self {
            TaskPattern::Alternating => position % 2 == 0,
            TaskPattern::AllHeavy => true,
            TaskPattern::AllLight => false,
            TaskPattern::HeavyEvery(0) => false,
            TaskPattern::HeavyEvery(n) => position % n as usize == 0,
        };
        if heavy {
            Operation::Heavy
        } else {
            Operation::Light
        }
    }
}

impl fmt::Display for TaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPattern::Alternating => f.write_str("alternating"),
            TaskPattern::AllHeavy => f.write_str("all_heavy"),
            TaskPattern::AllLight => f.write_str("all_light"),
            TaskPattern::HeavyEvery(n) => write!(f, "heavy_every:{}", n),
        }
    }
}

impl FromStr for TaskPattern {
    type Err = String;

    /// Accepts the serde names `alternating`, `all_heavy`, `all_light`, and
    /// `heavy_every:N` (N >= 1), the same spelling `Display` writes.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alternating" => Ok(TaskPattern::Alternating),
            "all_heavy" => Ok(TaskPattern::AllHeavy),
            "all_light" => Ok(TaskPattern::AllLight),
            other => {
                let n = other
                    .strip_prefix("heavy_every:")
                    .ok_or_else(|| format!("unknown task pattern '{}'", s))?;
                match n.parse::<u32>() {
                    Ok(n) if n >= 1 => Ok(TaskPattern::HeavyEvery(n)),
                    _ => Err(format!("invalid heavy interval in '{}'", s)),
                }
            }
        }
    }
}

/// Ordered, immutable sequence of task descriptors.
///
/// `offset` translates task ids into output regions: a task with id `x`
/// writes region `x - offset`. The queue is built once by the caller and
/// only read while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQueue {
    offset: u32,
    tasks: Vec<Task>,
}

impl TaskQueue {
    pub fn new(offset: u32, tasks: Vec<Task>) -> Self {
        Self { offset, tasks }
    }

    /// Build `len` tasks with dense ids `offset..offset + len`. Fails if the
    /// last id would not fit in `u32`.
    pub fn generate(offset: u32, len: usize, pattern: TaskPattern) -> Result<Self> {
        if let Some(last) = len.checked_sub(1) {
            u32::try_from(last)
                .ok()
                .and_then(|l| offset.checked_add(l))
                .ok_or_else(|| {
                    TqsError::InvalidConfig(format!(
                        "{} tasks starting at id {} overflow the task id space",
                        len, offset
                    ))
                })?;
        }
        // Every id below is at most the last id checked above.
        let tasks = (0..len)
            .map(|i| Task {
                id: offset + i as u32,
                op: pattern.op_at(i),
            })
            .collect();
        Ok(Self { offset, tasks })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Output region for `task`, or an error if its id lies below the offset.
    pub fn region_of(&self, task: &Task) -> Result<usize> {
        task.id
            .checked_sub(self.offset)
            .map(|r| r as usize)
            .ok_or(TqsError::IdBelowOffset { id: task.id, offset: self.offset })
    }

    /// Number of output regions needed to hold the first `queue_size` tasks.
    pub fn regions_needed(&self, queue_size: usize) -> Result<usize> {
        let mut needed = 0;
        for task in self.tasks.iter().take(queue_size) {
            needed = needed.max(self.region_of(task)? + 1);
        }
        Ok(needed)
    }

    /// Check that the first `queue_size` tasks exist and map inside `regions`.
    pub fn validate(&self, queue_size: usize, regions: usize) -> Result<()> {
        if queue_size > self.tasks.len() {
            return Err(TqsError::QueueTooShort {
                queue_size,
                available: self.tasks.len(),
            });
        }
        for task in &self.tasks[..queue_size] {
            let region = self.region_of(task)?;
            if region >= regions {
                return Err(TqsError::IdOutOfRange { id: task.id, region, regions });
            }
        }
        Ok(())
    }

    /// Whether the task at position `i` has id `offset + i` for every `i`.
    pub fn is_dense(&self) -> bool {
        self.tasks
            .iter()
            .enumerate()
            .all(|(i, t)| t.id.checked_sub(self.offset) == Some(i as u32))
    }

    /// Sub-queue over positions `start..start + len`, with offset
    /// `self.offset + start`. For a dense queue, region `r` of the window is
    /// region `start + r` of the whole queue.
    pub fn window(&self, start: usize, len: usize) -> Result<Self> {
        let end = start.saturating_add(len).min(self.tasks.len());
        let start = start.min(end);
        let offset = u32::try_from(start)
            .ok()
            .and_then(|s| self.offset.checked_add(s))
            .ok_or_else(|| {
                TqsError::InvalidConfig(format!(
                    "window start {} overflows the task id space at offset {}",
                    start, self.offset
                ))
            })?;
        Ok(Self {
            offset,
            tasks: self.tasks[start..end].to_vec(),
        })
    }

    pub fn count(&self, op: Operation) -> usize {
        self.tasks.iter().filter(|t| t.op == op).count()
    }
}
