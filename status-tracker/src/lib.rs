pub mod clients;
pub mod error;
mod macros;
pub mod state;
pub mod tracker;
pub mod types;
