//! # gcodelink Core
//!
//! Core types, errors, and events shared by the gcodelink crates.
//! Provides the position model used by path extraction, the printer status
//! snapshot reported while streaming, and the application event bus.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{PartialPosition, Position, PrinterStatus};

pub use error::{ConnectionError, ControllerError, Error, GcodeError, Result};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, AppEvent, ConnectionEvent, DisconnectReason, EventBus, EventCategory, EventFilter,
    FileEvent, StreamEvent, SubscriptionId,
};

pub use types::{
    thread_safe, thread_safe_vec, DataCallback, ThreadSafe, ThreadSafeRwMap, ThreadSafeVec,
};
