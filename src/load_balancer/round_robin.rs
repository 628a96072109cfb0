//! Round-robin rotation with failover.

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    /// Index into the backend list.
    pub index: usize,
    /// True when no candidate was eligible and plain rotation was used.
    pub fallback: bool,
}

/// Round-robin selector.
/// Stores a monotonically increasing cursor shared by all callers.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start rotating from an arbitrary cursor value.
    pub fn starting_at(cursor: u64) -> Self {
        Self {
            cursor: AtomicU64::new(cursor),
        }
    }

    /// Current cursor value.
    pub fn position(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Advance the cursor once and pick an index out of `len`.
    ///
    /// Scans from the pre-advance cursor position for the first index accepted
    /// by `eligible`. When nothing is eligible the pre-advance position itself
    /// is returned. Returns `None` (without advancing) only when `len == 0`.
    pub fn next_index(&self, len: usize, eligible: impl Fn(usize) -> bool) -> Option<Pick> {
        if len == 0 {
            return None;
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let offset = (start % len as u64) as usize;

        for i in 0..len {
            let index = (offset + i) % len;
            if eligible(index) {
                return Some(Pick { index, fallback: false });
            }
        }

        Some(Pick {
            index: offset,
            fallback: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let rr = RoundRobin::new();

        let picks: Vec<usize> = (0..6)
            .map(|_| rr.next_index(3, |_| true).unwrap().index)
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(rr.position(), 6);
    }

    #[test]
    fn skips_ineligible() {
        let rr = RoundRobin::new();

        // Index 1 is never eligible: rotation continues past it.
        let picks: Vec<usize> = (0..4)
            .map(|_| rr.next_index(3, |i| i != 1).unwrap().index)
            .collect();
        assert_eq!(picks, vec![0, 2, 2, 0]);
    }

    #[test]
    fn falls_back_to_plain_rotation() {
        let rr = RoundRobin::starting_at(4);

        let pick = rr.next_index(3, |_| false).unwrap();
        assert_eq!(pick, Pick { index: 1, fallback: true });
        assert_eq!(rr.position(), 5);
    }

    #[test]
    fn empty_does_not_advance() {
        let rr = RoundRobin::new();
        assert_eq!(rr.next_index(0, |_| true), None);
        assert_eq!(rr.position(), 0);
    }

    #[test]
    fn cursor_advances_once_per_pick_under_contention() {
        let rr = std::sync::Arc::new(RoundRobin::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rr = rr.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        rr.next_index(5, |i| i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(rr.position(), 8000);
    }
}
