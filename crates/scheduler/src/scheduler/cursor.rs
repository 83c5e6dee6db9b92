use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide claim counter for one scheduling run.
///
/// Starts at 0 and only ever grows. Every call to [`SharedCursor::claim`]
/// returns a distinct value, so each queue index is handed to exactly one
/// group. Relaxed ordering is enough: callers only rely on uniqueness, and
/// task data is published to the rest of a group by its barrier.
#[derive(Debug, Default)]
pub struct SharedCursor {
    consumed: AtomicUsize,
}

impl SharedCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next index, returning the pre-increment value.
    #[inline]
    pub fn claim(&self) -> usize {
        self.consumed.fetch_add(1, Ordering::Relaxed)
    }

    /// Total claims made so far, including ones past the end of the queue.
    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};

    #[test]
    fn claims_are_sequential_on_one_thread() {
        let cursor = SharedCursor::new();
        assert_eq!(cursor.claim(), 0);
        assert_eq!(cursor.claim(), 1);
        assert_eq!(cursor.claim(), 2);
        assert_eq!(cursor.consumed(), 3);
    }

    #[test]
    fn concurrent_claims_are_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1000;

        let cursor = Arc::new(SharedCursor::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cursor = Arc::clone(&cursor);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD).map(|_| cursor.claim()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(seen.insert(index), "index {} claimed twice", index);
            }
        }

        assert_eq!(seen.len(), THREADS * PER_THREAD);
        assert!(seen.iter().all(|&i| i < THREADS * PER_THREAD));
        assert_eq!(cursor.consumed(), THREADS * PER_THREAD);
    }
}
