mod logging;
mod stdin_reader;
mod url;

pub use logging::*;
pub use stdin_reader::*;
pub use url::*;
