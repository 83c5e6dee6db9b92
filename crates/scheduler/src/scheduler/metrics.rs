use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tqs_core::{Operation, Task};
use uuid::Uuid;

/// What one group did during a run. Filled in by the group's designated lane.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupReport {
    pub group: usize,
    /// Queue indices this group executed, in claim order.
    pub claimed: Vec<usize>,
    /// Claim attempts, including the final one past the end of the queue.
    pub claims: usize,
    pub heavy: usize,
    pub light: usize,
    /// Time from the group's first claim to observing exhaustion.
    pub busy: Duration,
}

impl GroupReport {
    pub fn new(group: usize) -> Self {
        Self {
            group,
            ..Self::default()
        }
    }

    /// Record one claim. `task` is `None` for a claim past the queue end.
    pub fn record_claim(&mut self, index: usize, task: Option<&Task>) {
        self.claims += 1;
        if let Some(task) = task {
            self.claimed.push(index);
            match task.op {
                Operation::Heavy => self.heavy += 1,
                Operation::Light => self.light += 1,
            }
        }
    }

    pub fn tasks_executed(&self) -> usize {
        self.claimed.len()
    }
}

/// Outcome of one scheduling run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Wall time from launch until every group reached DONE.
    pub elapsed: Duration,
    pub queue_size: usize,
    pub group_size: usize,
    /// Final cursor value: every claim made, successful or not.
    pub total_claims: usize,
    /// One entry per group, ordered by group index.
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Every executed queue index, sorted.
    pub fn claimed_indices(&self) -> Vec<usize> {
        let mut all: Vec<usize> = self
            .groups
            .iter()
            .flat_map(|g| g.claimed.iter().copied())
            .collect();
        all.sort_unstable();
        all
    }

    pub fn tasks_executed(&self) -> usize {
        self.groups.iter().map(GroupReport::tasks_executed).sum()
    }

    /// Claims that landed past the end of the queue and were dropped.
    pub fn discarded_claims(&self) -> usize {
        self.total_claims.saturating_sub(self.queue_size)
    }

    /// Mean group busy time.
    pub fn mean_busy(&self) -> Duration {
        if self.groups.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.groups.iter().map(|g| g.busy).sum();
        total / self.groups.len() as u32
    }

    /// Ratio of the slowest group's busy time to the mean. 1.0 is perfectly
    /// balanced; also 1.0 when nothing measurable ran.
    pub fn imbalance(&self) -> f64 {
        let mean = self.mean_busy().as_nanos() as f64;
        if mean == 0.0 {
            return 1.0;
        }
        let max = self
            .groups
            .iter()
            .map(|g| g.busy.as_nanos())
            .max()
            .unwrap_or(0) as f64;
        max / mean
    }

    /// Group with the longest busy time.
    pub fn slowest_group(&self) -> Option<&GroupReport> {
        self.groups.iter().max_by_key(|g| g.busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(groups: Vec<GroupReport>, queue_size: usize, total_claims: usize) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            queue_size,
            group_size: 1,
            total_claims,
            groups,
        }
    }

    #[test]
    fn record_claims() {
        let mut g = GroupReport::new(3);
        g.record_claim(0, Some(&Task::heavy(0)));
        g.record_claim(2, Some(&Task::light(2)));
        g.record_claim(5, None);

        assert_eq!(g.group, 3);
        assert_eq!(g.claimed, vec![0, 2]);
        assert_eq!(g.claims, 3);
        assert_eq!(g.heavy, 1);
        assert_eq!(g.light, 1);
        assert_eq!(g.tasks_executed(), 2);
    }

    #[test]
    fn claimed_indices_are_merged_and_sorted() {
        let mut a = GroupReport::new(0);
        a.record_claim(1, Some(&Task::light(1)));
        a.record_claim(3, None);
        let mut b = GroupReport::new(1);
        b.record_claim(0, Some(&Task::light(0)));
        b.record_claim(2, Some(&Task::light(2)));
        b.record_claim(4, None);

        let r = report(vec![a, b], 3, 5);
        assert_eq!(r.claimed_indices(), vec![0, 1, 2]);
        assert_eq!(r.tasks_executed(), 3);
        assert_eq!(r.discarded_claims(), 2);
    }

    #[test]
    fn imbalance_ratio() {
        let mut fast = GroupReport::new(0);
        fast.busy = Duration::from_millis(100);
        let mut slow = GroupReport::new(1);
        slow.busy = Duration::from_millis(300);

        let r = report(vec![fast, slow], 0, 2);
        assert_eq!(r.mean_busy(), Duration::from_millis(200));
        assert!((r.imbalance() - 1.5).abs() < 1e-9);
        assert_eq!(r.slowest_group().map(|g| g.group), Some(1));
    }

    #[test]
    fn idle_run_is_balanced() {
        let r = report(vec![GroupReport::new(0), GroupReport::new(1)], 0, 2);
        assert_eq!(r.imbalance(), 1.0);
        assert_eq!(report(Vec::new(), 0, 0).mean_busy(), Duration::ZERO);
    }
}
