mod installer;
mod path_utils;
mod resolver;

pub use installer::*;
pub use path_utils::*;
pub use resolver::*;
