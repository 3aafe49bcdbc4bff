//! Sources: nodes without audio inputs.

mod constant;

pub use constant::*;
