//! Hashing collections used throughout the crate.
//!
//! Keys are small ids (pids, window ids, arena keys), so the fx hasher is a
//! better fit than siphash.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
