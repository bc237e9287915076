use std::{
    num::NonZeroU32,
    sync::atomic::AtomicUsize,
    time::Duration,
};

use super::*;
use crate::foundation::clock::ManualClock;

fn uses(n: u32) -> Uses {
    Uses::Limited(NonZeroU32::new(n).unwrap())
}

fn store(clock: &ManualClock) -> CallbackStore<String, ManualClock> {
    CallbackStore::with_clock(CallbackStoreOpts::default(), clock.clone())
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&String) + Send + Sync + 'static) {
    let runs = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&runs);
    (runs, move |_: &String| {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn single_use_runs_once() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (runs, action) = counter();
    let token = store.register(
        action,
        CallbackOptions::new()
            .uses(Uses::ONCE)
            .lifetime(Duration::from_secs(24 * 60 * 60)),
    );

    assert_eq!(store.invoke(token, &"a".into()), InvokeOutcome::Executed);
    assert_eq!(store.invoke(token, &"a".into()), InvokeOutcome::NotFound);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(store.is_empty());
}

#[test]
fn limited_uses_allow_exactly_n() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (runs, action) = counter();
    let token = store.register(action, CallbackOptions::new().uses(uses(3)));

    for _ in 0..3 {
        assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::Executed);
    }
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::NotFound);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn expired_registration_does_not_run() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (runs, action) = counter();
    let token = store.register(
        action,
        CallbackOptions::new()
            .unlimited()
            .lifetime(Duration::from_secs(60)),
    );

    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::Executed);
    clock.advance(Duration::from_secs(61));
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::Expired);
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::NotFound);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn expiry_is_strictly_after_deadline() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (_, action) = counter();
    let token = store.register(action, CallbackOptions::new().lifetime(Duration::from_secs(10)));

    clock.advance(Duration::from_secs(10));
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::Executed);
}

#[test]
fn lifetime_is_capped_by_store() {
    let clock = ManualClock::new();
    let store: CallbackStore<String, ManualClock> = CallbackStore::with_clock(
        CallbackStoreOpts {
            max_lifetime: Duration::from_secs(5),
            ..CallbackStoreOpts::default()
        },
        clock.clone(),
    );
    let (_, action) = counter();
    let token = store.register(action, CallbackOptions::new());

    clock.advance(Duration::from_secs(6));
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::Expired);
}

#[test]
fn unknown_token_is_not_found() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let token = CallbackToken::from_uuid(Uuid::nil());
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::NotFound);
}

#[test]
fn action_receives_context() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let token = store.register(
        move |who: &String| sink.lock().push(who.clone()),
        CallbackOptions::new().unlimited(),
    );

    store.invoke(token, &"alice".to_string());
    store.invoke(token, &"bob".to_string());
    assert_eq!(*seen.lock(), vec!["alice".to_string(), "bob".to_string()]);
}

#[test]
fn sweep_removes_expired_and_exhausted_once() {
    let clock = ManualClock::new();
    let store = store(&clock);

    let (_, a) = counter();
    let short = store.register(a, CallbackOptions::new().lifetime(Duration::from_secs(1)));
    let (_, b) = counter();
    let used = store.register(b, CallbackOptions::new().unlimited());
    let (_, c) = counter();
    let live = store.register(c, CallbackOptions::new().uses(uses(2)));

    store.invoke(live, &String::new());
    clock.advance(Duration::from_secs(2));

    assert_eq!(store.sweep(), 1);
    assert_eq!(store.sweep(), 0);
    assert!(!store.contains(short));
    assert!(store.contains(used));
    assert!(store.contains(live));
}

#[test]
fn sweep_catches_exhausted_entries_left_behind() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (_, action) = counter();
    let token = store.register(action, CallbackOptions::new().uses(uses(1)));

    // Simulate a use whose removal has not been observed yet.
    let reg = store.registrations.read().get(&token).cloned().unwrap();
    reg.use_count.store(1, Ordering::SeqCst);

    assert_eq!(store.sweep(), 1);
    assert!(store.is_empty());
}

#[test]
fn late_caller_leaves_removal_to_the_last_user() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (runs, action) = counter();
    let token = store.register(action, CallbackOptions::new().uses(uses(2)));

    // Both uses claimed, the second action still running.
    let reg = store.registrations.read().get(&token).cloned().unwrap();
    reg.use_count.store(2, Ordering::SeqCst);

    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::NotFound);
    assert!(store.contains(token));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn capacity_evicts_oldest_first() {
    let clock = ManualClock::new();
    let store: CallbackStore<String, ManualClock> = CallbackStore::with_clock(
        CallbackStoreOpts {
            capacity: 2,
            ..CallbackStoreOpts::default()
        },
        clock,
    );
    let (_, a) = counter();
    let first = store.register(a, CallbackOptions::new());
    let (_, b) = counter();
    let second = store.register(b, CallbackOptions::new());
    let (_, c) = counter();
    let third = store.register(c, CallbackOptions::new());

    assert_eq!(store.len(), 2);
    assert!(!store.contains(first));
    assert!(store.contains(second));
    assert!(store.contains(third));
}

#[test]
fn explicit_remove() {
    let clock = ManualClock::new();
    let store = store(&clock);
    let (_, action) = counter();
    let token = store.register(action, CallbackOptions::new());
    assert!(store.remove(token));
    assert!(!store.remove(token));
    assert_eq!(store.invoke(token, &String::new()), InvokeOutcome::NotFound);
}

#[test]
#[should_panic(expected = "callback token collision")]
fn token_collision_is_fatal() {
    let clock = ManualClock::new();
    let store = store(&clock).with_token_source(Uuid::nil);
    let (_, a) = counter();
    store.register(a, CallbackOptions::new());
    let (_, b) = counter();
    store.register(b, CallbackOptions::new());
}

#[test]
fn token_text_round_trip() {
    let token = CallbackToken::from_uuid(Uuid::new_v4());
    let parsed: CallbackToken = token.to_string().parse().unwrap();
    assert_eq!(parsed, token);
    assert!("not-a-token".parse::<CallbackToken>().is_err());

    let json = serde_json::to_string(&token).unwrap();
    assert_eq!(json, format!("\"{token}\""));
}
