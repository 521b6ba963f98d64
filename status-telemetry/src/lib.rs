//! Tracing setup shared by the stream status services and their tests.

mod tracing;

pub use crate::tracing::*;
