//! # Event Bus Module
//!
//! Publish/subscribe distribution of connection, streaming and file events.
//!
//! ```rust,ignore
//! use gcodelink_core::event_bus::{event_bus, AppEvent, EventCategory, EventFilter};
//!
//! let subscription = event_bus().subscribe(
//!     EventFilter::Categories(vec![EventCategory::Stream]),
//!     |event| println!("{}", event.description()),
//! );
//!
//! event_bus().unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
