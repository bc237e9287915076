//! Keeps per-viewer native replicas of an observable bar in sync with it.

/// Reference observable bar and its listener contract.
pub mod bar;
/// Host primitives a mirror drives.
pub mod host;
/// The multi-viewer mirror.
pub mod listener;
