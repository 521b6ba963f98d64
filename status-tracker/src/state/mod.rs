//! Per-stream status bookkeeping kept by the tracker.

mod stream;

pub use stream::{CurrentStreamStatus, OriginStatus};
