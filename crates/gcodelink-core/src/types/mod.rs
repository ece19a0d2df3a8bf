//! Type aliases for shared state used across crates.

pub mod aliases;

pub use aliases::*;
