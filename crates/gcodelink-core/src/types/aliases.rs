//! Type aliases for commonly used shared-state types.
//!
//! The session, streamer and event bus hand state across threads; these
//! aliases give the nested `Arc<Mutex<..>>` forms readable names. All locks
//! are `parking_lot` locks.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe vector, e.g. a transcript recorded by a test device.
pub type ThreadSafeVec<T> = Arc<Mutex<Vec<T>>>;

/// A thread-safe reader-writer hash map for read-heavy registries.
pub type ThreadSafeRwMap<K, V> = Arc<RwLock<HashMap<K, V>>>;

/// A shareable callback that receives a single parameter.
pub type DataCallback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new empty `ThreadSafeVec<T>`.
#[inline]
pub fn thread_safe_vec<T>() -> ThreadSafeVec<T> {
    Arc::new(Mutex::new(Vec::new()))
}
