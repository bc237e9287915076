//! Abstract component model, the host-native tree, and the render cache that
//! lets the former stand in for the latter.

/// Converter contract between abstract and native trees.
pub mod convert;
/// Reference abstract component tree.
pub mod model;
/// Reference host-native tree and the host text contract.
pub mod native;
/// Wrapped-component render cache.
pub mod wrapped;
