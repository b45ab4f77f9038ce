use std::io;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use futures::future::LocalBoxFuture;
use shell_tidy_core::editorconfig::RawEditorConfig;
use tokio_util::sync::CancellationToken;

use crate::process_runner::RunError;
use crate::process_runner::ShfmtRunRequest;
use crate::process_runner::ShfmtRunResult;
use crate::utils::DownloadError;
use crate::utils::LogLevel;

pub trait Environment: Clone + Send + Sync + 'static {
  fn is_real(&self) -> bool;
  /// The operating system name in the form of `std::env::consts::OS`.
  fn os(&self) -> String;
  /// The cpu architecture in the form of `std::env::consts::ARCH`.
  fn cpu_arch(&self) -> String;
  fn env_var(&self, name: &str) -> Option<String>;
  fn cwd(&self) -> io::Result<PathBuf>;
  /// Directory where managed binaries are stored.
  fn storage_dir(&self) -> io::Result<PathBuf>;
  fn read_file(&self, file_path: &Path) -> io::Result<String>;
  fn write_file_bytes(&self, file_path: &Path, bytes: &[u8]) -> io::Result<()>;
  fn remove_file(&self, file_path: &Path) -> io::Result<()>;
  fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
  fn mk_dir_all(&self, path: &Path) -> io::Result<()>;
  fn is_file(&self, path: &Path) -> bool;
  /// A regular file the current user may execute. On Windows, any
  /// regular file counts.
  fn is_executable_file(&self, path: &Path) -> bool;
  fn set_executable(&self, file_path: &Path) -> io::Result<()>;
  fn search_paths(&self) -> Vec<PathBuf> {
    match self.env_var("PATH") {
      Some(path) => std::env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()).collect(),
      None => Vec::new(),
    }
  }
  fn download_file(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, DownloadError>>;
  /// Gets the raw EditorConfig properties that apply to the file.
  fn editorconfig_properties(&self, file_path: &Path) -> Result<RawEditorConfig>;
  fn run_shfmt(&self, request: ShfmtRunRequest, token: Option<CancellationToken>) -> LocalBoxFuture<'static, Result<ShfmtRunResult, RunError>>;
  fn log(&self, text: &str);
  fn log_stderr(&self, text: &str);
  /// Writes text to stdout without any modification.
  fn write_stdout(&self, text: &str);
  fn log_level(&self) -> LogLevel;
  fn set_log_level(&self, log_level: LogLevel);
}

// use macros here so the expression provided is only evaluated when the level is enabled
macro_rules! log_debug {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level().is_debug() {
      let mut text = String::from("[DEBUG] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_info {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level().is_info() {
      $environment.log_stderr(&format!($($arg)*));
    }
  }
}

macro_rules! log_warn {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level().is_warn() {
      let mut text = String::from("[WARN] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_error {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level().is_error() {
      let mut text = String::from("[ERROR] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}
