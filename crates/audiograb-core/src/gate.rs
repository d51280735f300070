//! Process-wide admission control for acquisition work.
//!
//! The gate replaces an unguarded module-level counter with an atomic
//! check-and-increment plus an RAII permit, so every successful admission is
//! matched by exactly one release no matter which path the request takes out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counting gate with a fixed ceiling.
///
/// Rejection is a capacity signal, not an error: callers map it to a
/// "retry later" response. The count is advisory and resets with the process.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    in_flight: AtomicUsize,
    max_concurrent: usize,
}

impl ConcurrencyGate {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(GateInner {
                in_flight: AtomicUsize::new(0),
                max_concurrent,
            }),
        }
    }

    /// Admits one operation if the gate is below its ceiling.
    ///
    /// The compare-exchange loop guarantees no over-admission under
    /// concurrent callers. A rejected call has no side effect.
    pub fn try_admit(&self) -> Option<GatePermit> {
        let mut observed = self.inner.in_flight.load(Ordering::Acquire);
        loop {
            if observed >= self.inner.max_concurrent {
                return None;
            }
            match self.inner.in_flight.compare_exchange_weak(
                observed,
                observed + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(GatePermit {
                        inner: Arc::clone(&self.inner),
                    })
                }
                Err(current) => observed = current,
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }
}

/// Scoped admission. Dropping the permit releases the gate.
#[derive(Debug)]
pub struct GatePermit {
    inner: Arc<GateInner>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_ceiling() {
        let gate = ConcurrencyGate::new(3);
        let permits: Vec<_> = (0..3)
            .map(|_| gate.try_admit().expect("below ceiling"))
            .collect();

        assert_eq!(gate.in_flight(), 3);
        assert!(gate.try_admit().is_none());
        drop(permits);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn one_release_reopens_the_gate() {
        let gate = ConcurrencyGate::new(1);
        let permit = gate.try_admit().expect("gate is empty");
        assert!(gate.try_admit().is_none());

        drop(permit);
        assert!(gate.try_admit().is_some());
    }

    #[test]
    fn rejection_has_no_side_effect() {
        let gate = ConcurrencyGate::new(1);
        let _permit = gate.try_admit().expect("gate is empty");

        for _ in 0..10 {
            assert!(gate.try_admit().is_none());
        }
        assert_eq!(gate.in_flight(), 1);
    }

    #[test]
    fn no_over_admission_under_contention() {
        let gate = ConcurrencyGate::new(5);
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if let Some(permit) = gate.try_admit() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        drop(permit);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread completes");
        }

        assert!(admitted.load(Ordering::SeqCst) <= 16);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn count_restores_after_panic_path() {
        let gate = ConcurrencyGate::new(2);
        let cloned = gate.clone();

        let result = std::thread::spawn(move || {
            let _permit = cloned.try_admit().expect("gate is empty");
            panic!("simulated handler failure");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(gate.in_flight(), 0);
    }
}
