use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// String-keyed map that remembers insertion order.
///
/// Overwriting a key keeps its position. Removal must go through
/// `shift_remove` so the surviving keys stay in insertion order.
pub type OrderedMap<V> = IndexMap<String, V, FxBuildHasher>;
