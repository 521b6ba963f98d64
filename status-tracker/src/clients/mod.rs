//! Stream status API abstractions and implementations.
//!
//! Provides the [`StreamStatusClient`] trait through which the tracker records stream status
//! transitions, the request and response bodies it exchanges, and an in-memory implementation.

mod base;
pub mod memory;

pub use base::{
    StreamStatusClient, StreamStatusCreateRequest, StreamStatusRead, StreamStatusUpdateRequest,
};
