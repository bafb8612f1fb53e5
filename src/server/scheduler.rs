//! Periodic reindexing
//!
//! A background thread calls [`ReindexTarget::reindex`] once per interval.
//! Stopping wakes the thread through a condvar, so `stop()` returns without
//! waiting out the interval. A rebuild already in progress is not
//! interrupted.

use crate::engine::{ReindexOutcome, SearchEngine};
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Something that can be rebuilt on a timer.
pub trait ReindexTarget: Send + Sync + 'static {
    fn reindex(&self);
}

impl ReindexTarget for SearchEngine {
    fn reindex(&self) {
        match self.reindex_now() {
            Ok(ReindexOutcome::Completed(summary)) => {
                debug!("scheduled reindex finished: {} paths", summary.paths)
            }
            Ok(ReindexOutcome::AlreadyRunning) => {
                info!("scheduled reindex skipped: a rebuild is already running")
            }
            Err(e) => warn!("scheduled reindex failed: {:#}", e),
        }
    }
}

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle to a running scheduler thread
pub struct ReindexScheduler {
    signal: Arc<Signal>,
    /// Thread handle (wrapped in Option to allow taking on shutdown)
    thread: Option<JoinHandle<()>>,
    interval: Duration,
}

impl ReindexScheduler {
    /// Spawn a thread that reindexes `target` every `interval`. The first run
    /// happens one interval after starting.
    pub fn start<T: ReindexTarget>(target: Arc<T>, interval: Duration) -> Self {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let thread = {
            let signal = Arc::clone(&signal);
            thread::Builder::new()
                .name("pathfinder-reindex".to_string())
                .spawn(move || run(&*target, &signal, interval))
                .ok()
        };
        if thread.is_none() {
            warn!("failed to spawn reindex scheduler thread");
        }

        info!("reindexing every {}s", interval.as_secs());
        Self {
            signal,
            thread,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signal the thread to stop and wait for it.
    pub fn stop(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Check if the scheduler is still running
    pub fn is_running(&self) -> bool {
        !*self.signal.stopped.lock()
            && self
                .thread
                .as_ref()
                .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ReindexScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<T: ReindexTarget + ?Sized>(target: &T, signal: &Signal, interval: Duration) {
    loop {
        let deadline = Instant::now() + interval;
        {
            let mut stopped = signal.stopped.lock();
            while !*stopped {
                if signal.wake.wait_until(&mut stopped, deadline).timed_out() {
                    break;
                }
            }
            if *stopped {
                return;
            }
        }
        target.reindex();
    }
}
