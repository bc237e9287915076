use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use crate::{
    component::{
        convert::{AbstractText, NativeConverter},
        model::{Component, Content},
        native::{HostText, NativeComponent, NativeContents, NativeStyle},
    },
    foundation::error::VeneerResult,
};

/// Derives a cache key from a rendering context (for example a viewer's locale).
pub type PartitionFn<X, K> = Arc<dyn Fn(&X) -> VeneerResult<K> + Send + Sync>;

/// Context-sensitive transform of an abstract component (for example translation).
pub type RenderFn<A, X> = Arc<dyn Fn(&A, &X) -> VeneerResult<A> + Send + Sync>;

struct RenderMemo<C: NativeConverter, X, K> {
    key: K,
    rendered: Arc<WrappedNode<C, X, K>>,
}

/// Conversion slot. A plain conversion and a localized one never stand in for
/// each other.
enum Converted<N, K> {
    Empty,
    Plain(Arc<N>),
    Localized { key: K, native: Arc<N> },
}

/// An abstract component dressed up as a native one.
///
/// The node owns one immutable abstract component and caches two things:
///
/// - its conversion to the native shape, computed at most once per slot state;
/// - the most recent context-dependent re-render, in a single slot keyed by the
///   partition key derived from the context.
///
/// Both caches are guarded by locks owned by this node, so unrelated nodes never
/// contend. Re-rendered nodes are terminal: they carry no partition or render
/// function and are never rendered again.
pub struct WrappedNode<C, X = (), K = String>
where
    C: NativeConverter,
{
    wrapped: C::Abstract,
    converter: Arc<C>,
    partition: Option<PartitionFn<X, K>>,
    renderer: Option<RenderFn<C::Abstract, X>>,
    converted: Mutex<Converted<C::Native, K>>,
    memo: Mutex<Option<RenderMemo<C, X, K>>>,
}

impl<C, X, K> WrappedNode<C, X, K>
where
    C: NativeConverter,
    K: PartialEq + Clone,
{
    /// Wrap `wrapped` without any context-dependent rendering.
    pub fn new(wrapped: C::Abstract, converter: Arc<C>) -> Self {
        Self::with_renderer(wrapped, converter, None, None)
    }

    /// Wrap `wrapped` with optional partition and render functions.
    pub fn with_renderer(
        wrapped: C::Abstract,
        converter: Arc<C>,
        partition: Option<PartitionFn<X, K>>,
        renderer: Option<RenderFn<C::Abstract, X>>,
    ) -> Self {
        Self {
            wrapped,
            converter,
            partition,
            renderer,
            converted: Mutex::new(Converted::Empty),
            memo: Mutex::new(None),
        }
    }

    /// The wrapped abstract component.
    pub fn wrapped(&self) -> &C::Abstract {
        &self.wrapped
    }

    /// Converter used for native views.
    pub fn converter(&self) -> &Arc<C> {
        &self.converter
    }

    /// `true` when this node has no render function and therefore renders to itself.
    pub fn is_terminal(&self) -> bool {
        self.renderer.is_none()
    }

    /// Node rendered for `ctx`.
    ///
    /// Returns `self` when there is no render function. When the partition key for
    /// `ctx` equals the memoized key, the memoized node is returned as is. Otherwise
    /// the component is rendered, wrapped as a terminal node and memoized in place
    /// of the previous entry. Without a partition function nothing is memoized.
    ///
    /// Errors from the partition or render function propagate and leave the memo
    /// untouched.
    pub fn render_for(self: &Arc<Self>, ctx: &X) -> VeneerResult<Arc<Self>> {
        if self.renderer.is_none() {
            return Ok(Arc::clone(self));
        }
        let key = self.partition_key(ctx)?;
        Ok(self
            .render_memoized(ctx, key)?
            .unwrap_or_else(|| Arc::clone(self)))
    }

    /// Native view of the wrapped component, converted at most once.
    ///
    /// A plain literal leaf bypasses full tree conversion.
    pub fn native(&self) -> Arc<C::Native> {
        let mut slot = self.converted.lock();
        if let Converted::Plain(native) = &*slot {
            return Arc::clone(native);
        }
        let native = Arc::new(self.convert());
        *slot = Converted::Plain(Arc::clone(&native));
        native
    }

    /// Native view of the node rendered for `ctx`.
    ///
    /// Cached in the same slot as [`native`](Self::native), tagged with the
    /// partition key, so switching between plain and localized views recomputes.
    pub fn localized_native(self: &Arc<Self>, ctx: &X) -> VeneerResult<Arc<C::Native>> {
        if self.renderer.is_none() {
            return Ok(self.native());
        }
        let key = self.partition_key(ctx)?;
        if let Some(key) = &key
            && let Converted::Localized { key: cached, native } = &*self.converted.lock()
            && cached == key
        {
            return Ok(Arc::clone(native));
        }

        let rendered = self
            .render_memoized(ctx, key.clone())?
            .unwrap_or_else(|| Arc::clone(self));
        let native = rendered.native();
        if let Some(key) = key {
            *self.converted.lock() = Converted::Localized {
                key,
                native: Arc::clone(&native),
            };
        }
        Ok(native)
    }

    /// Cached native view, if one has been computed.
    pub fn native_if_present(&self) -> Option<Arc<C::Native>> {
        match &*self.converted.lock() {
            Converted::Empty => None,
            Converted::Plain(native) | Converted::Localized { native, .. } => {
                Some(Arc::clone(native))
            }
        }
    }

    fn partition_key(&self, ctx: &X) -> VeneerResult<Option<K>> {
        self.partition.as_ref().map(|p| p(ctx)).transpose()
    }

    /// `Ok(None)` when there is no render function.
    fn render_memoized(&self, ctx: &X, key: Option<K>) -> VeneerResult<Option<Arc<Self>>> {
        let Some(renderer) = &self.renderer else {
            return Ok(None);
        };

        let mut memo = self.memo.lock();
        if let (Some(key), Some(hit)) = (&key, memo.as_ref())
            && hit.key == *key
        {
            return Ok(Some(Arc::clone(&hit.rendered)));
        }

        let rendered = renderer(&self.wrapped, ctx)?;
        let node = Arc::new(Self::new(rendered, Arc::clone(&self.converter)));
        if let Some(key) = key {
            *memo = Some(RenderMemo {
                key,
                rendered: Arc::clone(&node),
            });
        }
        Ok(Some(node))
    }

    fn convert(&self) -> C::Native {
        match self.wrapped.as_plain_literal() {
            Some(text) => self.converter.literal(text),
            None => self.converter.to_native(&self.wrapped),
        }
    }
}

impl<C, X, K> fmt::Debug for WrappedNode<C, X, K>
where
    C: NativeConverter,
    C::Abstract: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedNode")
            .field("wrapped", &self.wrapped)
            .field("has_partition", &self.partition.is_some())
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl<C, X, K> HostText for WrappedNode<C, X, K>
where
    C: NativeConverter<Abstract = Component, Native = NativeComponent>,
    X: Default,
    K: PartialEq + Clone,
{
    fn style(&self) -> NativeStyle {
        self.native().style.clone()
    }

    fn contents(&self) -> NativeContents {
        match self.wrapped.content() {
            Content::Text { text } => NativeContents::Literal(text.clone()),
            _ => self.native().contents.clone(),
        }
    }

    fn siblings(&self) -> Vec<NativeComponent> {
        self.native().siblings.clone()
    }

    fn string(&self) -> String {
        let ctx = X::default();
        let rendered = self
            .partition_key(&ctx)
            .and_then(|key| self.render_memoized(&ctx, key));
        match rendered {
            Ok(Some(node)) => node.wrapped.plain_text(),
            Ok(None) => self.wrapped.plain_text(),
            Err(err) => {
                tracing::warn!(%err, "render for default context failed, using unrendered text");
                self.wrapped.plain_text()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/wrapped.rs"]
mod tests;
