//! Execution dispatcher.
//!
//! RUN commands are long-running and must not block unrelated keyspace
//! operations, so they execute on a bounded background worker set while the
//! issuing caller blocks on the result. Ordering and isolation contract:
//!
//! - the job closure commits outputs and stats itself, so a caller that
//!   drops its result receiver does not abort the run or its effects;
//! - runs against one key from one caller stay ordered because the caller
//!   blocks until completion;
//! - a backend that cannot execute concurrently on a device takes that
//!   device's lock inside the job; independent devices parallelize freely.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tensordb_core::{Device, Error, Result};
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded worker pool with per-device mutual exclusion.
pub struct Dispatcher {
    tx: Option<mpsc::SyncSender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
    device_locks: DashMap<Device, Arc<Mutex<()>>>,
}

impl Dispatcher {
    /// Default worker count for a fresh database.
    pub const DEFAULT_WORKERS: usize = 4;

    /// Spawn `workers` background threads servicing a bounded queue.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::sync_channel::<Job>(workers * 16);
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers)
            .map(|index| {
                let rx = Arc::clone(&rx);
                thread::Builder::new()
                    .name(format!("tensordb-run-{}", index))
                    .spawn(move || loop {
                        let job = rx.lock().recv();
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    })
                    .expect("worker thread spawn")
            })
            .collect();
        Dispatcher {
            tx: Some(tx),
            workers: handles,
            device_locks: DashMap::new(),
        }
    }

    fn device_lock(&self, device: Device) -> Arc<Mutex<()>> {
        self.device_locks
            .entry(device)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `job` on the pool and wait for its result.
    ///
    /// When `serialize_device` is set, the job holds `device`'s lock for
    /// its duration. The job itself is responsible for committing its
    /// effects; the returned value is only the caller's view of them.
    pub fn execute<T, F>(&self, device: Device, serialize_device: bool, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let lock = serialize_device.then(|| self.device_lock(device));
        let (done_tx, done_rx) = mpsc::channel();
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::Internal("dispatcher is shut down".into()))?;
        debug!(device = %device, serialized = serialize_device, "dispatching run");
        tx.send(Box::new(move || {
            let _guard = lock.as_ref().map(|l| l.lock());
            let result = job();
            // The caller may have gone away; the run's effects stand.
            let _ = done_tx.send(result);
        }))
        .map_err(|_| Error::Internal("dispatcher workers are gone".into()))?;
        done_rx
            .recv()
            .map_err(|_| Error::Internal("run worker dropped its result".into()))
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers.len())
            .finish()
    }
}
