//! Effects: nodes that transform their inputs.

mod gain;
mod mixer;
mod thru;

pub use gain::*;
pub use mixer::*;
pub use thru::*;
