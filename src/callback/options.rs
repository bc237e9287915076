use std::{num::NonZeroU32, time::Duration};

/// How many times a callback may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uses {
    /// No use limit; only the lifetime applies.
    Unlimited,
    /// At most this many runs.
    Limited(NonZeroU32),
}

impl Uses {
    /// A single run.
    pub const ONCE: Self = Self::Limited(NonZeroU32::MIN);

    /// Limit, if bounded.
    pub fn limit(self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(n) => Some(n.get()),
        }
    }
}

/// Per-registration options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackOptions {
    uses: Uses,
    lifetime: Duration,
}

impl CallbackOptions {
    /// Default lifetime (12 hours).
    pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

    /// Single use, default lifetime.
    pub fn new() -> Self {
        Self {
            uses: Uses::ONCE,
            lifetime: Self::DEFAULT_LIFETIME,
        }
    }

    /// Set the use limit.
    pub fn uses(mut self, uses: Uses) -> Self {
        self.uses = uses;
        self
    }

    /// Remove the use limit.
    pub fn unlimited(self) -> Self {
        self.uses(Uses::Unlimited)
    }

    /// Set the lifetime.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Use limit.
    pub fn max_uses(&self) -> Uses {
        self.uses
    }

    /// Requested lifetime.
    pub fn ttl(&self) -> Duration {
        self.lifetime
    }
}

impl Default for CallbackOptions {
    fn default() -> Self {
        Self::new()
    }
}
