use std::{fmt, slice, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    component::model::Component,
    foundation::opts::MirrorOpts,
    mirror::{
        bar::{Bar, BarColor, BarFlags, BarId, BarListener, BarOverlay, BarSnapshot},
        host::{BarUpdate, MirrorHost},
    },
};

/// Native replica of one [`Bar`] and the viewers it is shown to.
pub struct NativeMirror<H: MirrorHost> {
    bar: Arc<Bar>,
    native: H::Native,
    viewers: IndexSet<H::Viewer>,
    applied: BarSnapshot,
    pushed_progress: f32,
}

impl<H: MirrorHost> NativeMirror<H> {
    /// The mirrored bar.
    pub fn bar(&self) -> &Arc<Bar> {
        &self.bar
    }

    /// The host-native bar.
    pub fn native(&self) -> &H::Native {
        &self.native
    }

    /// Subscribed viewers in subscription order.
    pub fn viewers(&self) -> impl Iterator<Item = &H::Viewer> {
        self.viewers.iter()
    }

    /// Whether `viewer` is subscribed.
    pub fn contains(&self, viewer: &H::Viewer) -> bool {
        self.viewers.contains(viewer)
    }

    /// Number of subscribed viewers.
    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Last state observed from the bar. Progress may be ahead of what was pushed.
    pub fn applied(&self) -> &BarSnapshot {
        &self.applied
    }

    /// Progress value the native bar last received.
    pub fn pushed_progress(&self) -> f32 {
        self.pushed_progress
    }

    fn viewer_list(&self) -> Vec<H::Viewer> {
        self.viewers.iter().cloned().collect()
    }
}

impl<H: MirrorHost> fmt::Debug for NativeMirror<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMirror")
            .field("bar", &self.bar.id())
            .field("viewers", &self.viewers)
            .field("applied", &self.applied)
            .field("pushed_progress", &self.pushed_progress)
            .finish_non_exhaustive()
    }
}

struct MirrorShared<H: MirrorHost> {
    host: Arc<H>,
    opts: MirrorOpts,
    mirrors: Mutex<IndexMap<BarId, NativeMirror<H>>>,
}

impl<H: MirrorHost> MirrorShared<H> {
    fn apply(&self, id: BarId, f: impl FnOnce(&mut NativeMirror<H>) -> Option<BarUpdate>) {
        let mut mirrors = self.mirrors.lock();
        let Some(mirror) = mirrors.get_mut(&id) else {
            return;
        };
        if let Some(update) = f(mirror) {
            let viewers = mirror.viewer_list();
            self.host.push(&mut mirror.native, &update, &viewers);
        }
    }
}

// Handlers read the bar's current value under the mirror lock. Notifications from
// concurrent mutators may arrive out of order; the last one delivered sees the
// latest state.
impl<H: MirrorHost> BarListener for MirrorShared<H> {
    fn name_changed(&self, bar: &Bar, _old: &Component, _new: &Component) {
        self.apply(bar.id(), |m| {
            let name = bar.name();
            if m.applied.name == name {
                return None;
            }
            m.applied.name = name.clone();
            Some(BarUpdate::Name(name))
        });
    }

    fn progress_changed(&self, bar: &Bar, _old: f32, _new: f32) {
        let min_delta = self.opts.min_progress_delta;
        self.apply(bar.id(), |m| {
            let progress = bar.progress();
            if m.applied.progress == progress {
                return None;
            }
            m.applied.progress = progress;
            if (progress - m.pushed_progress).abs() < min_delta {
                trace!(bar = %m.bar.id(), pushed = m.pushed_progress, progress, "progress change below threshold");
                return None;
            }
            m.pushed_progress = progress;
            Some(BarUpdate::Progress(progress))
        });
    }

    fn color_changed(&self, bar: &Bar, _old: BarColor, _new: BarColor) {
        self.apply(bar.id(), |m| {
            let color = bar.color();
            if m.applied.color == color {
                return None;
            }
            m.applied.color = color;
            Some(BarUpdate::Color(color))
        });
    }

    fn overlay_changed(&self, bar: &Bar, _old: BarOverlay, _new: BarOverlay) {
        self.apply(bar.id(), |m| {
            let overlay = bar.overlay();
            if m.applied.overlay == overlay {
                return None;
            }
            m.applied.overlay = overlay;
            Some(BarUpdate::Overlay(overlay))
        });
    }

    fn flags_changed(&self, bar: &Bar, _removed: BarFlags, _added: BarFlags) {
        self.apply(bar.id(), |m| {
            let flags = bar.flags();
            if m.applied.flags == flags {
                return None;
            }
            m.applied.flags = flags;
            Some(BarUpdate::Flags(flags))
        });
    }
}

/// Mirrors abstract [`Bar`]s onto host-native bars, one per bar, and tracks which
/// viewers see each of them.
///
/// A mirror is created by [`ensure_mirror`](Self::ensure_mirror), registers itself
/// as a listener on the bar and forwards each effective field change to the host
/// exactly once. It is discarded as soon as its last viewer leaves. Several
/// `ViewerMirror`s may mirror the same bar independently.
///
/// Dropping a `ViewerMirror` tears down every mirror it owns.
pub struct ViewerMirror<H: MirrorHost> {
    shared: Arc<MirrorShared<H>>,
}

impl<H: MirrorHost> ViewerMirror<H> {
    /// Empty mirror driven by `host`.
    pub fn new(host: Arc<H>, opts: MirrorOpts) -> Self {
        Self {
            shared: Arc::new(MirrorShared {
                host,
                opts,
                mirrors: Mutex::new(IndexMap::new()),
            }),
        }
    }

    /// Host driving this mirror.
    pub fn host(&self) -> &Arc<H> {
        &self.shared.host
    }

    /// Options in effect.
    pub fn opts(&self) -> &MirrorOpts {
        &self.shared.opts
    }

    /// Create the native mirror for `bar` unless one exists. Returns `true` when created.
    ///
    /// A mirror created here holds its native bar and its listener registration
    /// even with no viewers, until a removal empties it or [`clear`](Self::clear)
    /// runs. Prefer [`ensure_and_subscribe`](Self::ensure_and_subscribe), which
    /// never leaves an unwatched mirror behind and cannot race with a concurrent
    /// last unsubscribe.
    pub fn ensure_mirror(&self, bar: &Arc<Bar>) -> bool {
        let mut mirrors = self.shared.mirrors.lock();
        self.create_locked(&mut mirrors, bar)
    }

    /// Show `bar` to `viewer`, creating its mirror first if needed.
    pub fn ensure_and_subscribe(&self, viewer: H::Viewer, bar: &Arc<Bar>) {
        self.ensure_and_subscribe_all([viewer], bar);
    }

    /// Show `bar` to every viewer in `viewers` with a single host call, creating
    /// its mirror first if needed. Creation and subscription happen under one lock.
    pub fn ensure_and_subscribe_all(
        &self,
        viewers: impl IntoIterator<Item = H::Viewer>,
        bar: &Arc<Bar>,
    ) {
        let mut mirrors = self.shared.mirrors.lock();
        let created = self.create_locked(&mut mirrors, bar);
        let shown = self.show_locked(&mut mirrors, viewers, bar);
        if created && shown == 0 {
            self.discard(&mut mirrors, bar.id());
        }
    }

    /// Show `bar` to `viewer`. Subscribing twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `bar` has no mirror.
    pub fn subscribe(&self, viewer: H::Viewer, bar: &Bar) {
        self.subscribe_all([viewer], bar);
    }

    /// Show `bar` to every viewer in `viewers` with a single host call.
    ///
    /// # Panics
    ///
    /// Panics if `bar` has no mirror.
    pub fn subscribe_all(&self, viewers: impl IntoIterator<Item = H::Viewer>, bar: &Bar) {
        let mut mirrors = self.shared.mirrors.lock();
        self.show_locked(&mut mirrors, viewers, bar);
    }

    /// Hide `bar` from `viewer`. Returns whether the viewer was subscribed.
    ///
    /// The mirror is discarded when its last viewer leaves. Unknown bars are ignored.
    pub fn unsubscribe(&self, viewer: &H::Viewer, bar: &Bar) -> bool {
        self.unsubscribe_all(slice::from_ref(viewer), bar) == 1
    }

    /// Hide `bar` from every viewer in `viewers` with a single host call.
    /// Returns how many were subscribed.
    pub fn unsubscribe_all<'a>(
        &self,
        viewers: impl IntoIterator<Item = &'a H::Viewer>,
        bar: &Bar,
    ) -> usize {
        let mut mirrors = self.shared.mirrors.lock();
        let Some(mirror) = mirrors.get_mut(&bar.id()) else {
            return 0;
        };
        let removed: Vec<H::Viewer> = viewers
            .into_iter()
            .filter(|v| mirror.viewers.shift_remove(*v))
            .cloned()
            .collect();
        if removed.is_empty() {
            return 0;
        }
        self.shared.host.hide(&mirror.native, &removed);
        if mirror.viewers.is_empty() {
            self.discard(&mut mirrors, bar.id());
        }
        removed.len()
    }

    /// Hide every bar `viewer` sees. Returns how many bars it left.
    pub fn unsubscribe_from_all(&self, viewer: &H::Viewer) -> usize {
        let mut mirrors = self.shared.mirrors.lock();
        let mut left = 0;
        let mut emptied = Vec::new();
        for (id, mirror) in mirrors.iter_mut() {
            if mirror.viewers.shift_remove(viewer) {
                left += 1;
                self.shared
                    .host
                    .hide(&mirror.native, slice::from_ref(viewer));
                if mirror.viewers.is_empty() {
                    emptied.push(*id);
                }
            }
        }
        for id in emptied {
            self.discard(&mut mirrors, id);
        }
        left
    }

    /// Put `new` in place of `old` in every viewer set without telling the host.
    /// Returns how many mirrors were touched.
    pub fn replace_viewer(&self, old: &H::Viewer, new: H::Viewer) -> usize {
        let mut mirrors = self.shared.mirrors.lock();
        let mut replaced = 0;
        for mirror in mirrors.values_mut() {
            let Some(idx) = mirror.viewers.get_index_of(old) else {
                continue;
            };
            mirror.viewers.shift_remove_index(idx);
            if !mirror.viewers.contains(&new) {
                mirror.viewers.shift_insert(idx, new.clone());
            }
            replaced += 1;
        }
        replaced
    }

    /// Resend the current title of every bar `viewer` sees, to that viewer only.
    /// Returns how many bars were refreshed.
    pub fn refresh_names(&self, viewer: &H::Viewer) -> usize {
        let mut mirrors = self.shared.mirrors.lock();
        let mut refreshed = 0;
        for mirror in mirrors.values_mut() {
            if mirror.viewers.contains(viewer) {
                let update = BarUpdate::Name(mirror.applied.name.clone());
                self.shared
                    .host
                    .push(&mut mirror.native, &update, slice::from_ref(viewer));
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Run `f` against the mirror of `bar`.
    ///
    /// # Panics
    ///
    /// Panics if `bar` has no mirror.
    pub fn with_mirror<R>(&self, bar: &Bar, f: impl FnOnce(&NativeMirror<H>) -> R) -> R {
        let mirrors = self.shared.mirrors.lock();
        match mirrors.get(&bar.id()) {
            Some(mirror) => f(mirror),
            None => unknown_bar(bar.id()),
        }
    }

    /// Whether `bar` currently has a mirror.
    pub fn is_mirrored(&self, bar: &Bar) -> bool {
        self.shared.mirrors.lock().contains_key(&bar.id())
    }

    /// Viewers of `bar`, empty when it has no mirror.
    pub fn viewers(&self, bar: &Bar) -> Vec<H::Viewer> {
        self.shared
            .mirrors
            .lock()
            .get(&bar.id())
            .map(NativeMirror::viewer_list)
            .unwrap_or_default()
    }

    /// Bars `viewer` is subscribed to, in mirror creation order.
    pub fn active_bars(&self, viewer: &H::Viewer) -> Vec<BarId> {
        self.shared
            .mirrors
            .lock()
            .iter()
            .filter(|(_, m)| m.viewers.contains(viewer))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of live mirrors.
    pub fn len(&self) -> usize {
        self.shared.mirrors.lock().len()
    }

    /// `true` when no bar is mirrored.
    pub fn is_empty(&self) -> bool {
        self.shared.mirrors.lock().is_empty()
    }

    /// Hide every mirror from its viewers, unregister from every bar and
    /// release every native bar.
    pub fn clear(&self) {
        let listener = self.listener();
        let mut mirrors = self.shared.mirrors.lock();
        for (id, mirror) in mirrors.drain(..) {
            let viewers = mirror.viewer_list();
            if !viewers.is_empty() {
                self.shared.host.hide(&mirror.native, &viewers);
            }
            mirror.bar.remove_listener(&listener);
            self.shared.host.release(mirror.native);
            debug!(bar = %id, "released native mirror");
        }
    }

    fn listener(&self) -> Arc<dyn BarListener> {
        self.shared.clone()
    }

    #[tracing::instrument(level = "debug", skip(self, mirrors, bar), fields(bar = %bar.id()))]
    fn create_locked(
        &self,
        mirrors: &mut IndexMap<BarId, NativeMirror<H>>,
        bar: &Arc<Bar>,
    ) -> bool {
        if mirrors.contains_key(&bar.id()) {
            return false;
        }
        // Listen before snapshotting so no change falls between the two.
        bar.add_listener(self.listener());
        let applied = bar.snapshot();
        let native = self.shared.host.create(bar.id(), &applied);
        mirrors.insert(
            bar.id(),
            NativeMirror {
                bar: Arc::clone(bar),
                native,
                viewers: IndexSet::new(),
                pushed_progress: applied.progress,
                applied,
            },
        );
        debug!("created native mirror");
        true
    }

    /// Adds `viewers` to the existing mirror of `bar` and shows it to the new ones.
    /// Returns how many were added. Panics for an unknown bar.
    fn show_locked(
        &self,
        mirrors: &mut IndexMap<BarId, NativeMirror<H>>,
        viewers: impl IntoIterator<Item = H::Viewer>,
        bar: &Bar,
    ) -> usize {
        let Some(mirror) = mirrors.get_mut(&bar.id()) else {
            unknown_bar(bar.id());
        };
        let added: Vec<H::Viewer> = viewers
            .into_iter()
            .filter(|v| mirror.viewers.insert(v.clone()))
            .collect();
        if !added.is_empty() {
            self.shared.host.show(&mirror.native, &added);
        }
        added.len()
    }

    fn discard(&self, mirrors: &mut IndexMap<BarId, NativeMirror<H>>, id: BarId) {
        if let Some(mirror) = mirrors.shift_remove(&id) {
            mirror.bar.remove_listener(&self.listener());
            self.shared.host.release(mirror.native);
            debug!(bar = %id, "discarded native mirror without viewers");
        }
    }
}

impl<H: MirrorHost> Drop for ViewerMirror<H> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<H: MirrorHost> fmt::Debug for ViewerMirror<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerMirror")
            .field("opts", &self.shared.opts)
            .field("mirrors", &self.shared.mirrors.lock().len())
            .finish()
    }
}

fn unknown_bar(id: BarId) -> ! {
    panic!("unknown bar instance {id}: no mirror was created for it")
}

#[cfg(test)]
#[path = "../../tests/unit/mirror/listener.rs"]
mod tests;
