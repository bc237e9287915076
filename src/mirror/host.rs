use std::{fmt, hash::Hash};

use crate::{
    component::model::Component,
    mirror::bar::{BarColor, BarFlags, BarId, BarOverlay, BarSnapshot},
};

/// One field change pushed to a native bar.
#[derive(Clone, Debug, PartialEq)]
pub enum BarUpdate {
    /// New title.
    Name(Component),
    /// New fill fraction.
    Progress(f32),
    /// New tint.
    Color(BarColor),
    /// New segmentation.
    Overlay(BarOverlay),
    /// New complete flag set.
    Flags(BarFlags),
}

/// Host side of a mirror: owns the native bar type and knows how to reach viewers.
///
/// Every method is called while the mirror's lock is held, so implementations
/// must not call back into the [`ViewerMirror`](crate::ViewerMirror)
/// that drives them.
pub trait MirrorHost: Send + Sync + 'static {
    /// Host-native bar.
    type Native: Send + 'static;
    /// Identity of one recipient.
    type Viewer: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Build a native bar from the abstract bar's current state.
    fn create(&self, id: BarId, state: &BarSnapshot) -> Self::Native;

    /// Apply `update` to `native` and send it to `viewers`.
    fn push(&self, native: &mut Self::Native, update: &BarUpdate, viewers: &[Self::Viewer]);

    /// Make `native` visible to `viewers`, sending its full state.
    fn show(&self, native: &Self::Native, viewers: &[Self::Viewer]);

    /// Stop showing `native` to `viewers`.
    fn hide(&self, native: &Self::Native, viewers: &[Self::Viewer]);

    /// Dispose of a native bar nobody sees any more.
    fn release(&self, native: Self::Native) {
        drop(native);
    }
}
