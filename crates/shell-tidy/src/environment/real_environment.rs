use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use shell_tidy_core::editorconfig::RawEditorConfig;
use shell_tidy_core::editorconfig::parse_raw_value;
use tokio_util::sync::CancellationToken;

use super::Environment;
use crate::process_runner::RunError;
use crate::process_runner::ShfmtRunRequest;
use crate::process_runner::ShfmtRunResult;
use crate::process_runner::run_shfmt;
use crate::utils::DownloadError;
use crate::utils::LogLevel;
use crate::utils::Logger;
use crate::utils::LoggerOptions;
use crate::utils::RealUrlDownloader;

pub const STORAGE_DIR_ENV_VAR: &str = "SHELL_TIDY_STORAGE_DIR";

pub struct RealEnvironmentOptions {
  pub log_level: LogLevel,
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct RealEnvironment {
  logger: Logger,
  downloader: Arc<RealUrlDownloader>,
}

impl RealEnvironment {
  pub fn new(options: RealEnvironmentOptions) -> RealEnvironment {
    Self::new_with_proxy_env(options, |name| std::env::var(name).ok())
  }

  /// Creates the environment with the proxy environment variables read
  /// from the provided function.
  fn new_with_proxy_env(options: RealEnvironmentOptions, read_env_var: impl Fn(&str) -> Option<String>) -> RealEnvironment {
    let logger = Logger::new(&LoggerOptions {
      log_level: options.log_level,
      is_stdout_machine_readable: options.is_stdout_machine_readable,
    });
    let downloader = RealUrlDownloader::new(logger.clone(), read_env_var);
    RealEnvironment {
      logger,
      downloader: Arc::new(downloader),
    }
  }
}

impl Environment for RealEnvironment {
  fn is_real(&self) -> bool {
    true
  }

  fn os(&self) -> String {
    std::env::consts::OS.to_string()
  }

  fn cpu_arch(&self) -> String {
    std::env::consts::ARCH.to_string()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }

  fn cwd(&self) -> io::Result<PathBuf> {
    std::env::current_dir()
  }

  fn storage_dir(&self) -> io::Result<PathBuf> {
    if let Some(dir) = self.env_var(STORAGE_DIR_ENV_VAR).filter(|d| !d.trim().is_empty()) {
      return Ok(PathBuf::from(dir));
    }
    match dirs::data_local_dir() {
      Some(dir) => Ok(dir.join("shell-tidy")),
      None => Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Could not find the local data directory. Set the {} environment variable.", STORAGE_DIR_ENV_VAR),
      )),
    }
  }

  fn read_file(&self, file_path: &Path) -> io::Result<String> {
    log_debug!(self, "Reading file: {}", file_path.display());
    fs::read_to_string(file_path)
  }

  fn write_file_bytes(&self, file_path: &Path, bytes: &[u8]) -> io::Result<()> {
    log_debug!(self, "Writing file: {}", file_path.display());
    fs::write(file_path, bytes)
  }

  fn remove_file(&self, file_path: &Path) -> io::Result<()> {
    log_debug!(self, "Deleting file: {}", file_path.display());
    fs::remove_file(file_path)
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    log_debug!(self, "Renaming {} -> {}", from.display(), to.display());
    fs::rename(from, to)
  }

  fn mk_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn is_executable_file(&self, path: &Path) -> bool {
    is_executable_file(path)
  }

  #[cfg(unix)]
  fn set_executable(&self, file_path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(file_path, fs::Permissions::from_mode(0o755))
  }

  #[cfg(not(unix))]
  fn set_executable(&self, _file_path: &Path) -> io::Result<()> {
    Ok(())
  }

  fn download_file(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, DownloadError>> {
    let downloader = self.downloader.clone();
    let url = url.to_string();
    async move {
      // ureq is blocking
      let result = tokio::task::spawn_blocking({
        let url = url.clone();
        move || downloader.download(&url)
      })
      .await;
      match result {
        Ok(result) => result,
        Err(err) => Err(DownloadError::Network {
          url,
          message: err.to_string(),
        }),
      }
    }
    .boxed_local()
  }

  fn editorconfig_properties(&self, file_path: &Path) -> Result<RawEditorConfig> {
    let properties = ec4rs::properties_of(file_path)?;
    Ok(
      properties
        .iter()
        .map(|(key, value)| (key.to_string(), parse_raw_value(value.into_str())))
        .collect(),
    )
  }

  fn run_shfmt(&self, request: ShfmtRunRequest, token: Option<CancellationToken>) -> LocalBoxFuture<'static, Result<ShfmtRunResult, RunError>> {
    run_shfmt(request, token).boxed_local()
  }

  fn log(&self, text: &str) {
    self.logger.log(text);
  }

  fn log_stderr(&self, text: &str) {
    self.logger.log_stderr(text);
  }

  fn write_stdout(&self, text: &str) {
    self.logger.write_stdout(text);
  }

  fn log_level(&self) -> LogLevel {
    self.logger.log_level()
  }

  fn set_log_level(&self, log_level: LogLevel) {
    self.logger.set_log_level(log_level);
  }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
  use std::ffi::CString;
  use std::os::unix::ffi::OsStrExt;

  if !path.is_file() {
    return false;
  }
  let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
    return false;
  };
  // SAFETY: c_path is a valid nul terminated string that outlives the call
  unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
  path.is_file()
}
