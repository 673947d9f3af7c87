use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, select, tick, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use strata_mesh::SectionMesher;
use strata_world::SectionKey;

use crate::messages::{FromWorker, ToWorker};
use crate::worker::WorkerUnit;

#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    pub tick: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            tick: Duration::from_millis(50),
        }
    }
}

/// Owning worker for a section: additive hash of its section grid coordinates.
/// Depends only on the key and `workers`, never on load.
#[inline]
pub fn route_section(key: SectionKey, workers: usize) -> usize {
    let (gx, gy, gz) = key.grid();
    let sum = i64::from(gx) + i64::from(gy) + i64::from(gz);
    sum.rem_euclid(workers.max(1) as i64) as usize
}

/// Fixed set of worker loops hosted on a dedicated rayon pool.
///
/// Each worker owns an inbox; results from every worker arrive on one channel.
/// Dropping the pool disconnects the inboxes and the loops exit.
pub struct WorkerPool {
    inboxes: Vec<Sender<ToWorker>>,
    results: Receiver<FromWorker>,
    _pool: Arc<ThreadPool>,
}

impl WorkerPool {
    pub fn new(cfg: PoolConfig, mesher: Arc<dyn SectionMesher>) -> Result<Self, ThreadPoolBuildError> {
        let workers = cfg.workers.max(1);
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("strata-mesh-{i}"))
                .build()?,
        );
        let (res_tx, res_rx) = unbounded::<FromWorker>();
        let mut inboxes = Vec::with_capacity(workers);
        for id in 0..workers {
            let (tx, rx) = unbounded::<ToWorker>();
            inboxes.push(tx);
            let unit = WorkerUnit::new(id, Arc::clone(&mesher), res_tx.clone());
            let interval = cfg.tick;
            pool.spawn(move || run_worker(unit, rx, interval));
        }
        log::info!(
            target: "dispatch",
            "started {} mesh workers (tick {:?})",
            workers,
            cfg.tick
        );
        Ok(Self {
            inboxes,
            results: res_rx,
            _pool: pool,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }

    #[inline]
    pub fn route(&self, key: SectionKey) -> usize {
        route_section(key, self.inboxes.len())
    }

    pub fn broadcast(&self, msg: ToWorker) {
        let Some((last, rest)) = self.inboxes.split_last() else {
            return;
        };
        for tx in rest {
            let _ = tx.send(msg.clone());
        }
        let _ = last.send(msg);
    }

    /// Sends a dirty mark (or clear) to the worker owning `key`.
    pub fn send_dirty(&self, key: SectionKey, active: bool) {
        let idx = self.route(key);
        let _ = self.inboxes[idx].send(ToWorker::Dirty { key, active });
    }

    pub fn drain_results(&self) -> Vec<FromWorker> {
        self.results.try_iter().collect()
    }

    /// Blocks up to `timeout` for the next result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FromWorker> {
        match self.results.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn run_worker(mut unit: WorkerUnit, inbox: Receiver<ToWorker>, interval: Duration) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(inbox) -> msg => match msg {
                Ok(msg) => unit.handle(msg),
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                unit.tick();
            }
        }
    }
    log::debug!(target: "worker", "worker {} stopped", unit.id());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_matches_additive_hash() {
        assert_eq!(route_section(SectionKey::new(0, 0, 0), 4), 0);
        assert_eq!(route_section(SectionKey::new(16, 0, 0), 4), 1);
        assert_eq!(route_section(SectionKey::new(0, 16, 16), 4), 2);
        assert_eq!(route_section(SectionKey::new(-16, 0, 0), 4), 3);
        assert_eq!(route_section(SectionKey::new(-16, -16, 0), 3), 1);
        assert_eq!(route_section(SectionKey::new(48, 0, 0), 1), 0);
    }
}
