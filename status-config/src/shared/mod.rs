mod base;
mod replay;

pub use base::*;
pub use replay::*;
