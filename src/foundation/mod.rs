//! Shared building blocks: errors, clocks and configuration.

pub(crate) mod clock;
pub(crate) mod error;
pub(crate) mod opts;
