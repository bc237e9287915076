use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{VeneerError, VeneerResult};

/// Sizing and lifetime limits for a [`CallbackStore`](crate::CallbackStore).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackStoreOpts {
    /// Maximum number of live registrations. The oldest one is evicted when full.
    pub capacity: usize,
    /// Hard upper bound on any registration's lifetime.
    pub max_lifetime: Duration,
    /// Interval hosts pass to [`spawn_sweeper`](crate::spawn_sweeper).
    pub sweep_interval: Duration,
}

impl CallbackStoreOpts {
    /// Default capacity bound.
    pub const DEFAULT_CAPACITY: usize = 1024;
    /// Default hard lifetime cap (24 hours).
    pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
    /// Default sweep interval (30 seconds).
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

    /// Reject values the store cannot operate with.
    pub fn validate(&self) -> VeneerResult<()> {
        if self.capacity == 0 {
            return Err(VeneerError::config("callback store capacity must be > 0"));
        }
        if self.max_lifetime.is_zero() {
            return Err(VeneerError::config(
                "callback store max_lifetime must be non-zero",
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(VeneerError::config(
                "callback store sweep_interval must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for CallbackStoreOpts {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            max_lifetime: Self::DEFAULT_MAX_LIFETIME,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Tuning for a [`ViewerMirror`](crate::ViewerMirror).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorOpts {
    /// Progress changes smaller than this are recorded but not pushed.
    pub min_progress_delta: f32,
}

impl MirrorOpts {
    /// Default minimum progress delta.
    pub const DEFAULT_MIN_PROGRESS_DELTA: f32 = 5e-4;

    /// Reject values the mirror cannot operate with.
    pub fn validate(&self) -> VeneerResult<()> {
        if !self.min_progress_delta.is_finite() || self.min_progress_delta < 0.0 {
            return Err(VeneerError::config(format!(
                "min_progress_delta must be finite and >= 0, got {}",
                self.min_progress_delta
            )));
        }
        Ok(())
    }
}

impl Default for MirrorOpts {
    fn default() -> Self {
        Self {
            min_progress_delta: Self::DEFAULT_MIN_PROGRESS_DELTA,
        }
    }
}

/// Aggregated configuration, usually loaded once from the host's config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VeneerConfig {
    /// Callback store limits.
    pub callbacks: CallbackStoreOpts,
    /// Mirror tuning.
    pub mirror: MirrorOpts,
}

impl VeneerConfig {
    /// Parse and validate a JSON document. Missing keys fall back to defaults.
    pub fn from_json_str(s: &str) -> VeneerResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    pub fn validate(&self) -> VeneerResult<()> {
        self.callbacks.validate()?;
        self.mirror.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/opts.rs"]
mod tests;
