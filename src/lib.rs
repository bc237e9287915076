//! Veneer lets an abstract, immutable rich-text model stand in for a host
//! application's native text and object model without redundant conversion or
//! redundant update traffic.
//!
//! Three stateful pieces do the work:
//!
//! 1. [`WrappedNode`]: wraps an abstract [`Component`], converts it to the
//!    native form lazily and memoizes both the plain conversion and the last
//!    context-dependent render (for instance per-viewer localization) behind a
//!    single-slot cache keyed by a partition value.
//! 2. [`CallbackStore`]: ephemeral callbacks addressed by an opaque
//!    [`CallbackToken`], limited by use count and lifetime, with an optional
//!    background [sweeper](spawn_sweeper).
//! 3. [`ViewerMirror`]: keeps one host-native replica per observable [`Bar`] in
//!    sync with it and tracks which viewers see which replica.
//!
//! The host plugs in through small traits: [`NativeConverter`] for text,
//! [`MirrorHost`] for bars and [`Clock`] for time.
//!
//! Everything is safe to share between threads. No `unsafe` is used.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod callback;
mod component;
mod foundation;
mod mirror;

pub use callback::options::{CallbackOptions, Uses};
pub use callback::store::{
    CallbackAction, CallbackStore, CallbackToken, InvokeOutcome, RemovalCause,
};
pub use callback::sweeper::{SweeperHandle, spawn_sweeper};
pub use component::convert::{AbstractText, NativeConverter, TreeConverter};
pub use component::model::{Component, Content, Style, TextColor};
pub use component::native::{HostText, NativeComponent, NativeContents, NativeStyle};
pub use component::wrapped::{PartitionFn, RenderFn, WrappedNode};
pub use foundation::clock::{Clock, ManualClock, SystemClock};
pub use foundation::error::{VeneerError, VeneerResult};
pub use foundation::opts::{CallbackStoreOpts, MirrorOpts, VeneerConfig};
pub use mirror::bar::{Bar, BarColor, BarFlags, BarId, BarListener, BarOverlay, BarSnapshot};
pub use mirror::host::{BarUpdate, MirrorHost};
pub use mirror::listener::{NativeMirror, ViewerMirror};
