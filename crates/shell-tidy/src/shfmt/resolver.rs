use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::future::Shared;
use parking_lot::Mutex;
use shell_tidy_core::platform::ReleaseAsset;
use shell_tidy_core::platform::SHFMT_DOWNLOAD_BASE_URL;
use shell_tidy_core::platform::UnsupportedPlatformError;
use shell_tidy_core::platform::executable_extension_for_os;
use thiserror::Error;

use super::InstallError;
use super::find_executable_on_path;
use super::install_managed_binary;
use super::substitute_variables;
use crate::environment::Environment;

pub const DOWNLOAD_BASE_URL_ENV_VAR: &str = "SHELL_TIDY_DOWNLOAD_BASE_URL";

const SHFMT_TOOL_NAME: &str = "shfmt";

/// Where the shfmt executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShfmtSource {
  /// The configured `executablePath`.
  User,
  Path,
  /// Downloaded and cached by version.
  Managed,
}

impl fmt::Display for ShfmtSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ShfmtSource::User => "user",
      ShfmtSource::Path => "path",
      ShfmtSource::Managed => "managed",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShfmt {
  pub source: ShfmtSource,
  pub executable_path: PathBuf,
  pub version: String,
}

pub struct ResolveOptions<'a> {
  pub version: &'a str,
  pub executable_path_setting: Option<&'a str>,
  pub auto_download: bool,
  pub workspace_folder: &'a Path,
}

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("Configured \"executablePath\" is not executable or does not exist: {}", path.display())]
  UserPathNotExecutable { path: PathBuf },
  #[error("shfmt is not available. Enable \"autoDownload\" or configure \"executablePath\".")]
  NotAvailable,
  #[error("Could not resolve the directory to store shfmt in")]
  StorageDir(#[source] io::Error),
  #[error(transparent)]
  UnsupportedPlatform(#[from] UnsupportedPlatformError),
  /// The details were already logged at error level, so the install
  /// error is kept out of the source chain.
  #[error("Failed to install shfmt {version}. See the log output above for details.")]
  Install { version: String, error: Arc<InstallError> },
}

type InstallFuture = Shared<LocalBoxFuture<'static, Result<(), Arc<InstallError>>>>;

pub struct ShfmtResolver<TEnvironment: Environment> {
  environment: TEnvironment,
  download_base_url: String,
  in_flight_installs: Mutex<HashMap<String, InstallFuture>>,
}

impl<TEnvironment: Environment> ShfmtResolver<TEnvironment> {
  pub fn new(environment: TEnvironment) -> Self {
    let download_base_url = environment
      .env_var(DOWNLOAD_BASE_URL_ENV_VAR)
      .filter(|url| !url.trim().is_empty())
      .unwrap_or_else(|| SHFMT_DOWNLOAD_BASE_URL.to_string());
    ShfmtResolver {
      environment,
      download_base_url,
      in_flight_installs: Default::default(),
    }
  }

  pub fn managed_executable_path(&self, version: &str) -> Result<PathBuf, ResolveError> {
    let storage_dir = self.environment.storage_dir().map_err(ResolveError::StorageDir)?;
    let file_name = format!("{}{}", SHFMT_TOOL_NAME, executable_extension_for_os(&self.environment.os()));
    Ok(storage_dir.join("shfmt").join(version).join(file_name))
  }

  /// Resolves the executable from the configured path, then PATH, then the
  /// managed binary, installing it when allowed.
  pub async fn resolve(&self, options: &ResolveOptions<'_>) -> Result<ResolvedShfmt, ResolveError> {
    let resolved = |source: ShfmtSource, executable_path: PathBuf| ResolvedShfmt {
      source,
      executable_path,
      version: options.version.to_string(),
    };

    if let Some(setting) = options.executable_path_setting {
      let path = PathBuf::from(substitute_variables(setting, options.workspace_folder));
      if !self.environment.is_executable_file(&path) {
        return Err(ResolveError::UserPathNotExecutable { path });
      }
      return Ok(resolved(ShfmtSource::User, path));
    }

    if let Some(path) = find_executable_on_path(&self.environment, SHFMT_TOOL_NAME) {
      return Ok(resolved(ShfmtSource::Path, path));
    }

    let managed_path = self.managed_executable_path(options.version)?;
    if !self.environment.is_executable_file(&managed_path) {
      if !options.auto_download {
        return Err(ResolveError::NotAvailable);
      }
      self.ensure_managed_binary_installed(options.version).await?;
    }
    Ok(resolved(ShfmtSource::Managed, managed_path))
  }

  /// Installs the managed binary for the version. Concurrent callers for
  /// the same version share a single install.
  pub async fn ensure_managed_binary_installed(&self, version: &str) -> Result<PathBuf, ResolveError> {
    let managed_path = self.managed_executable_path(version)?;
    let asset = ReleaseAsset::for_host(&self.download_base_url, version, &self.environment.os(), &self.environment.cpu_arch())?;

    let install = {
      let mut in_flight_installs = self.in_flight_installs.lock();
      in_flight_installs
        .entry(version.to_string())
        .or_insert_with(|| {
          let environment = self.environment.clone();
          let managed_path = managed_path.clone();
          async move {
            install_managed_binary(&environment, &asset, &managed_path).await.map_err(|err| {
              log_error!(environment, "{}", err.to_detailed_string());
              Arc::new(err)
            })
          }
          .boxed_local()
          .shared()
        })
        .clone()
    };

    let result = install.clone().await;

    {
      // allow retrying after a failure, but leave any newer install alone
      let mut in_flight_installs = self.in_flight_installs.lock();
      if in_flight_installs.get(version).is_some_and(|current| current.ptr_eq(&install)) {
        in_flight_installs.remove(version);
      }
    }

    match result {
      Ok(()) => Ok(managed_path),
      Err(error) => Err(ResolveError::Install {
        version: version.to_string(),
        error,
      }),
    }
  }

  /// Installs the managed binary ahead of time when it will be needed.
  /// Failures are only logged.
  pub async fn prewarm_if_needed(&self, options: &ResolveOptions<'_>) {
    if !options.auto_download || options.executable_path_setting.is_some() {
      return;
    }
    if find_executable_on_path(&self.environment, SHFMT_TOOL_NAME).is_some() {
      return;
    }
    if let Err(err) = self.ensure_managed_binary_installed(options.version).await {
      log_warn!(self.environment, "Prewarm shfmt failed: {}", err);
    }
  }
}
