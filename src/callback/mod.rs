//! Ephemeral, use-limited and time-limited callbacks addressed by opaque tokens.

/// Registration options.
pub mod options;
/// Periodic sweeping on a background thread.
pub mod sweeper;
/// The token-keyed callback store.
pub mod store;
