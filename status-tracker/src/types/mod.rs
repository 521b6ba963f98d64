//! Common types used throughout the tracker.
//!
//! Re-exports stream identifiers, inbound replication events and the status values shared between
//! the tracker and the status API.

mod event;
mod status;
mod stream;

pub use event::*;
pub use status::*;
pub use stream::*;
