use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct State {
    outstanding: usize,
    /// Bumped on every transition to zero outstanding sections.
    epoch: u64,
}

/// Readiness barrier over the controller's outstanding set.
///
/// Cloneable; other threads block on it while the controller thread pumps.
/// A waiter returns at once when nothing is outstanding, otherwise at the next
/// transition to empty. Checking and subscribing happen under one lock, so a
/// mark racing with the check cannot be missed.
#[derive(Clone, Default)]
pub struct Settle {
    inner: Arc<(Mutex<State>, Condvar)>,
}

impl Settle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn update(&self, outstanding: usize) {
        let mut s = self.lock();
        let was = s.outstanding;
        s.outstanding = outstanding;
        if outstanding == 0 && was > 0 {
            s.epoch = s.epoch.wrapping_add(1);
            self.inner.1.notify_all();
        }
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding() == 0
    }

    /// Blocks until settled. Returns `false` if `timeout` elapses first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut s = self.lock();
        if s.outstanding == 0 {
            return true;
        }
        let epoch = s.epoch;
        while s.epoch == epoch {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            s = match self.inner.1.wait_timeout(s, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn empty_resolves_immediately() {
        let s = Settle::new();
        assert!(s.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn waiters_resolve_on_next_empty_transition() {
        let s = Settle::new();
        s.update(3);
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let s = s.clone();
                thread::spawn(move || s.wait_timeout(Duration::from_secs(5)))
            })
            .collect();
        thread::sleep(Duration::from_millis(20));
        s.update(1);
        s.update(0);
        for w in waiters {
            assert!(w.join().unwrap());
        }
        s.update(2);
        assert!(!s.wait_timeout(Duration::from_millis(10)));
    }
}
