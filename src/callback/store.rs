use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Instant,
};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    callback::options::{CallbackOptions, Uses},
    foundation::{
        clock::{Clock, SystemClock},
        error::VeneerError,
        opts::CallbackStoreOpts,
    },
};

/// Side-effecting action run on invocation.
pub type CallbackAction<X> = Arc<dyn Fn(&X) + Send + Sync>;

type TokenSource = Box<dyn Fn() -> Uuid + Send + Sync>;

/// Opaque handle to a registered callback. Safe to hand to untrusted peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackToken(Uuid);

impl CallbackToken {
    /// Wrap a raw UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Raw UUID.
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for CallbackToken {
    type Err = VeneerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| VeneerError::serde(format!("invalid callback token {s:?}: {e}")))
    }
}

/// Result of [`CallbackStore::invoke`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// The action ran.
    Executed,
    /// No live registration for the token (never registered, used up, evicted or removed).
    NotFound,
    /// The registration outlived its lifetime; the action did not run.
    Expired,
}

/// Why a registration left the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalCause {
    /// Lifetime elapsed.
    Expired,
    /// Use limit reached.
    Exhausted,
    /// Pushed out by the capacity bound.
    Evicted,
    /// Removed by the caller.
    Explicit,
}

struct Registration<X> {
    options: CallbackOptions,
    action: CallbackAction<X>,
    expires_at: Instant,
    use_count: AtomicU32,
}

impl<X> Registration<X> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    fn is_exhausted(&self) -> bool {
        match self.options.max_uses() {
            Uses::Unlimited => false,
            Uses::Limited(n) => self.use_count.load(Ordering::Acquire) >= n.get(),
        }
    }
}

/// Token-keyed store of ephemeral callbacks.
///
/// Registrations expire by wall-clock lifetime and by use count. Expiry is
/// checked lazily on [`invoke`](Self::invoke) and in bulk by [`sweep`](Self::sweep),
/// which the host is expected to call periodically. A capacity bound evicts the
/// oldest registration when the store is full.
pub struct CallbackStore<X, C = SystemClock> {
    opts: CallbackStoreOpts,
    clock: C,
    token_source: TokenSource,
    registrations: RwLock<IndexMap<CallbackToken, Arc<Registration<X>>>>,
}

impl<X> CallbackStore<X, SystemClock> {
    /// Store driven by the system clock.
    pub fn new(opts: CallbackStoreOpts) -> Self {
        Self::with_clock(opts, SystemClock)
    }
}

impl<X, C: Clock> CallbackStore<X, C> {
    /// Store driven by `clock`.
    pub fn with_clock(opts: CallbackStoreOpts, clock: C) -> Self {
        Self {
            opts,
            clock,
            token_source: Box::new(Uuid::new_v4),
            registrations: RwLock::new(IndexMap::new()),
        }
    }

    /// Replace the token generator. Generated values must practically never repeat.
    pub fn with_token_source(mut self, source: impl Fn() -> Uuid + Send + Sync + 'static) -> Self {
        self.token_source = Box::new(source);
        self
    }

    /// Store limits.
    pub fn opts(&self) -> &CallbackStoreOpts {
        &self.opts
    }

    /// Register `action` and return its token.
    ///
    /// The lifetime is capped at [`CallbackStoreOpts::max_lifetime`].
    ///
    /// # Panics
    ///
    /// Panics if the token source yields a token that is already registered.
    pub fn register(
        &self,
        action: impl Fn(&X) + Send + Sync + 'static,
        options: CallbackOptions,
    ) -> CallbackToken {
        let token = CallbackToken((self.token_source)());
        let now = self.clock.now();
        let lifetime = options.ttl().min(self.opts.max_lifetime);
        let expires_at = now
            .checked_add(lifetime)
            .unwrap_or_else(|| now + CallbackStoreOpts::DEFAULT_MAX_LIFETIME);
        let reg = Arc::new(Registration {
            options,
            action: Arc::new(action),
            expires_at,
            use_count: AtomicU32::new(0),
        });

        let capacity = self.opts.capacity.max(1);
        let mut regs = self.registrations.write();
        if regs.contains_key(&token) {
            drop(regs);
            panic!("callback token collision: {token} is already registered");
        }
        while regs.len() >= capacity {
            match regs.shift_remove_index(0) {
                Some((old, _)) => log_removal(old, RemovalCause::Evicted),
                None => break,
            }
        }
        regs.insert(token, reg);
        token
    }

    /// Run the callback behind `token` with `ctx`, honoring expiry and use limits.
    ///
    /// The invocation that reaches the use limit still runs and removes the
    /// registration afterwards; later invocations see [`InvokeOutcome::NotFound`].
    /// The action runs with no store lock held.
    pub fn invoke(&self, token: CallbackToken, ctx: &X) -> InvokeOutcome {
        let reg = self.registrations.read().get(&token).cloned();
        let Some(reg) = reg else {
            return InvokeOutcome::NotFound;
        };

        if reg.is_expired(self.clock.now()) {
            self.remove_registration(token, &reg, RemovalCause::Expired);
            return InvokeOutcome::Expired;
        }

        let mut last_use = false;
        if let Uses::Limited(limit) = reg.options.max_uses() {
            let count = reg.use_count.fetch_add(1, Ordering::AcqRel).saturating_add(1);
            if count > limit.get() {
                // Lost the race for the final use; the winner removes the entry
                // once its action has returned.
                return InvokeOutcome::NotFound;
            }
            last_use = count == limit.get();
        }

        (reg.action)(ctx);

        if last_use {
            self.remove_registration(token, &reg, RemovalCause::Exhausted);
        }
        InvokeOutcome::Executed
    }

    /// Remove every expired or used-up registration. Returns how many were removed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut regs = self.registrations.write();
        let before = regs.len();
        regs.retain(|token, reg| {
            let cause = if reg.is_expired(now) {
                RemovalCause::Expired
            } else if reg.is_exhausted() {
                RemovalCause::Exhausted
            } else {
                return true;
            };
            log_removal(*token, cause);
            false
        });
        before - regs.len()
    }

    /// Drop the registration behind `token`. Returns whether one existed.
    pub fn remove(&self, token: CallbackToken) -> bool {
        let removed = self.registrations.write().shift_remove(&token).is_some();
        if removed {
            log_removal(token, RemovalCause::Explicit);
        }
        removed
    }

    /// Whether `token` currently has a registration (expired or not).
    pub fn contains(&self, token: CallbackToken) -> bool {
        self.registrations.read().contains_key(&token)
    }

    /// Number of stored registrations.
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    fn remove_registration(
        &self,
        token: CallbackToken,
        reg: &Arc<Registration<X>>,
        cause: RemovalCause,
    ) {
        let mut regs = self.registrations.write();
        if regs.get(&token).is_some_and(|cur| Arc::ptr_eq(cur, reg)) {
            regs.shift_remove(&token);
            log_removal(token, cause);
        }
    }
}

impl<X, C> fmt::Debug for CallbackStore<X, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackStore")
            .field("opts", &self.opts)
            .field("len", &self.registrations.read().len())
            .finish_non_exhaustive()
    }
}

fn log_removal(token: CallbackToken, cause: RemovalCause) {
    debug!(%token, ?cause, "removing callback");
}

#[cfg(test)]
#[path = "../../tests/unit/callback/store.rs"]
mod tests;
