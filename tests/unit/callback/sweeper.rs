use std::time::Instant;

use super::*;
use crate::{
    callback::options::CallbackOptions,
    foundation::{clock::ManualClock, opts::CallbackStoreOpts},
};

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn sweeps_expired_registrations_in_background() {
    let clock = ManualClock::new();
    let store: Arc<CallbackStore<(), ManualClock>> = Arc::new(CallbackStore::with_clock(
        CallbackStoreOpts::default(),
        clock.clone(),
    ));
    store.register(|_| {}, CallbackOptions::new().lifetime(Duration::from_secs(1)));
    let keep = store.register(|_| {}, CallbackOptions::new());

    let handle = spawn_sweeper(Arc::clone(&store), Duration::from_millis(10)).unwrap();
    assert!(handle.is_running());
    clock.advance(Duration::from_secs(2));

    assert!(wait_until(Duration::from_secs(5), || store.len() == 1));
    assert!(store.contains(keep));
    handle.stop();
}

#[test]
fn drop_stops_thread() {
    let store: Arc<CallbackStore<()>> = Arc::new(CallbackStore::new(CallbackStoreOpts::default()));
    let handle = spawn_sweeper(Arc::clone(&store), Duration::from_secs(3600)).unwrap();
    drop(handle);
    // The thread held the only other reference.
    assert!(wait_until(Duration::from_secs(5), || Arc::strong_count(&store) == 1));
}

#[test]
fn zero_interval_is_rejected() {
    let store: Arc<CallbackStore<()>> = Arc::new(CallbackStore::new(CallbackStoreOpts::default()));
    let err = spawn_sweeper(store, Duration::ZERO).unwrap_err();
    assert!(matches!(err, VeneerError::Config(_)));
}
