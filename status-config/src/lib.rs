//! Configuration management for the stream status services.
//!
//! Provides environment detection, configuration loading from YAML files and
//! environment variables, and the shared configuration types used by the replayer.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
