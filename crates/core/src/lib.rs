pub mod args;
pub mod editorconfig;
pub mod eol;
pub mod platform;
pub mod settings;
