use std::{
    fmt,
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use tracing::{debug, warn};

use crate::{
    callback::store::CallbackStore,
    foundation::{
        clock::Clock,
        error::{VeneerError, VeneerResult},
    },
};

const THREAD_NAME: &str = "veneer-callback-sweeper";

/// Start a background thread that calls [`CallbackStore::sweep`] every `interval`.
///
/// The thread stops when the returned handle is stopped or dropped.
pub fn spawn_sweeper<X, C>(
    store: Arc<CallbackStore<X, C>>,
    interval: Duration,
) -> VeneerResult<SweeperHandle>
where
    X: 'static,
    C: Clock + 'static,
    CallbackStore<X, C>: Send + Sync,
{
    if interval.is_zero() {
        return Err(VeneerError::config("sweep interval must be non-zero"));
    }

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let thread = thread::Builder::new()
        .name(THREAD_NAME.to_owned())
        .spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed = store.sweep();
                        if removed > 0 {
                            debug!(removed, remaining = store.len(), "swept callbacks");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .context("spawn callback sweeper thread")?;

    Ok(SweeperHandle {
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}

/// Owner of a running sweeper thread.
pub struct SweeperHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("callback sweeper thread panicked");
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for SweeperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweeperHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/callback/sweeper.rs"]
mod tests;
