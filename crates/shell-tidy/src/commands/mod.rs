mod formatting;
mod general;

pub use formatting::*;
pub use general::*;
