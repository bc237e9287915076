use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use bitflags::bitflags;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::component::model::Component;

static NEXT_BAR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Bar`]. Two bars with equal state still have
/// different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BarId(u64);

impl BarId {
    fn next() -> Self {
        Self(NEXT_BAR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bar#{}", self.0)
    }
}

/// Bar tint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum BarColor {
    #[default]
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    White,
}

/// Bar segmentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarOverlay {
    /// One continuous bar.
    #[default]
    Progress,
    /// Six notches.
    Notched6,
    /// Ten notches.
    Notched10,
    /// Twelve notches.
    Notched12,
    /// Twenty notches.
    Notched20,
}

bitflags! {
    /// Extra effects attached to a bar.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BarFlags: u8 {
        /// Darken the sky.
        const DARKEN_SCREEN = 1 << 0;
        /// Play boss music.
        const PLAY_BOSS_MUSIC = 1 << 1;
        /// Create fog.
        const CREATE_WORLD_FOG = 1 << 2;
    }
}

/// Point-in-time copy of every bar field.
#[derive(Clone, Debug, PartialEq)]
pub struct BarSnapshot {
    /// Title.
    pub name: Component,
    /// Fill fraction in `0.0..=1.0`.
    pub progress: f32,
    /// Tint.
    pub color: BarColor,
    /// Segmentation.
    pub overlay: BarOverlay,
    /// Effects.
    pub flags: BarFlags,
}

/// Receives synchronous change notifications from a [`Bar`].
///
/// Callbacks run on the mutating thread with none of the bar's locks held.
/// Every method defaults to a no-op.
pub trait BarListener: Send + Sync {
    /// The title changed.
    fn name_changed(&self, _bar: &Bar, _old: &Component, _new: &Component) {}
    /// The fill fraction changed.
    fn progress_changed(&self, _bar: &Bar, _old: f32, _new: f32) {}
    /// The tint changed.
    fn color_changed(&self, _bar: &Bar, _old: BarColor, _new: BarColor) {}
    /// The segmentation changed.
    fn overlay_changed(&self, _bar: &Bar, _old: BarOverlay, _new: BarOverlay) {}
    /// Flags were removed and/or added.
    fn flags_changed(&self, _bar: &Bar, _removed: BarFlags, _added: BarFlags) {}
}

/// Mutable, observable bar shared between its owner and any number of mirrors.
pub struct Bar {
    id: BarId,
    state: RwLock<BarSnapshot>,
    listeners: RwLock<Vec<Arc<dyn BarListener>>>,
}

impl Bar {
    /// New bar with no flags. `progress` is clamped to `0.0..=1.0`.
    pub fn new(name: Component, progress: f32, color: BarColor, overlay: BarOverlay) -> Self {
        Self {
            id: BarId::next(),
            state: RwLock::new(BarSnapshot {
                name,
                progress: clamp_progress(progress),
                color,
                overlay,
                flags: BarFlags::empty(),
            }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Set the initial flags.
    pub fn with_flags(mut self, flags: BarFlags) -> Self {
        self.state.get_mut().flags = flags;
        self
    }

    /// Identity of this bar.
    pub fn id(&self) -> BarId {
        self.id
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> BarSnapshot {
        self.state.read().clone()
    }

    /// Current title.
    pub fn name(&self) -> Component {
        self.state.read().name.clone()
    }

    /// Current fill fraction.
    pub fn progress(&self) -> f32 {
        self.state.read().progress
    }

    /// Current tint.
    pub fn color(&self) -> BarColor {
        self.state.read().color
    }

    /// Current segmentation.
    pub fn overlay(&self) -> BarOverlay {
        self.state.read().overlay
    }

    /// Current flags.
    pub fn flags(&self) -> BarFlags {
        self.state.read().flags
    }

    /// Replace the title.
    pub fn set_name(&self, name: Component) {
        let old = {
            let mut state = self.state.write();
            if state.name == name {
                return;
            }
            std::mem::replace(&mut state.name, name.clone())
        };
        self.notify(|l| l.name_changed(self, &old, &name));
    }

    /// Replace the fill fraction. Values are clamped to `0.0..=1.0`; NaN becomes `0.0`.
    pub fn set_progress(&self, progress: f32) {
        let new = clamp_progress(progress);
        let old = {
            let mut state = self.state.write();
            if state.progress == new {
                return;
            }
            std::mem::replace(&mut state.progress, new)
        };
        self.notify(|l| l.progress_changed(self, old, new));
    }

    /// Replace the tint.
    pub fn set_color(&self, color: BarColor) {
        let old = {
            let mut state = self.state.write();
            if state.color == color {
                return;
            }
            std::mem::replace(&mut state.color, color)
        };
        self.notify(|l| l.color_changed(self, old, color));
    }

    /// Replace the segmentation.
    pub fn set_overlay(&self, overlay: BarOverlay) {
        let old = {
            let mut state = self.state.write();
            if state.overlay == overlay {
                return;
            }
            std::mem::replace(&mut state.overlay, overlay)
        };
        self.notify(|l| l.overlay_changed(self, old, overlay));
    }

    /// Replace the whole flag set.
    pub fn set_flags(&self, flags: BarFlags) {
        self.update_flags(|_| flags);
    }

    /// Add flags.
    pub fn add_flags(&self, flags: BarFlags) {
        self.update_flags(|current| current | flags);
    }

    /// Remove flags.
    pub fn remove_flags(&self, flags: BarFlags) {
        self.update_flags(|current| current - flags);
    }

    fn update_flags(&self, f: impl FnOnce(BarFlags) -> BarFlags) {
        let (removed, added) = {
            let mut state = self.state.write();
            let old = state.flags;
            let new = f(old);
            state.flags = new;
            (old - new, new - old)
        };
        if !removed.is_empty() || !added.is_empty() {
            self.notify(|l| l.flags_changed(self, removed, added));
        }
    }

    /// Register `listener`. The same listener may be added more than once.
    pub fn add_listener(&self, listener: Arc<dyn BarListener>) {
        self.listeners.write().push(listener);
    }

    /// Unregister one registration of `listener`, compared by identity.
    pub fn remove_listener(&self, listener: &Arc<dyn BarListener>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let mut listeners = self.listeners.write();
        match listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
        {
            Some(idx) => {
                listeners.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn notify(&self, f: impl Fn(&dyn BarListener)) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

impl fmt::Debug for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bar")
            .field("id", &self.id)
            .field("state", &*self.state.read())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

fn clamp_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mirror/bar.rs"]
mod tests;
