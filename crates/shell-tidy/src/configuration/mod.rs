mod resolve_settings;

pub use resolve_settings::*;
