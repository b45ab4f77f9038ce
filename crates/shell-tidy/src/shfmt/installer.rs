use std::io;
use std::path::Path;
use std::path::PathBuf;

use shell_tidy_core::platform::ReleaseAsset;
use shell_tidy_core::platform::ShfmtArch;
use shell_tidy_core::platform::ShfmtPlatform;
use thiserror::Error;

use crate::environment::Environment;
use crate::utils::DownloadError;

/// What was being installed when an install failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
  pub version: String,
  pub url: String,
  pub platform: ShfmtPlatform,
  pub arch: ShfmtArch,
}

impl InstallContext {
  fn from_asset(asset: &ReleaseAsset) -> Self {
    InstallContext {
      version: asset.version.clone(),
      url: asset.url.clone(),
      platform: asset.platform,
      arch: asset.arch,
    }
  }
}

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("Failed to download shfmt {}", context.version)]
  Download {
    context: InstallContext,
    #[source]
    source: DownloadError,
  },
  #[error("Failed to install shfmt {} to {}", context.version, path.display())]
  Write {
    context: InstallContext,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl InstallError {
  pub fn context(&self) -> &InstallContext {
    match self {
      InstallError::Download { context, .. } | InstallError::Write { context, .. } => context,
    }
  }

  pub fn status_code(&self) -> Option<u16> {
    match self {
      InstallError::Download { source, .. } => source.status_code(),
      InstallError::Write { .. } => None,
    }
  }

  /// The message followed by one line for each piece of known context.
  pub fn to_detailed_string(&self) -> String {
    let context = self.context();
    let url = match self {
      // report where the request ended up after redirects
      InstallError::Download { source, .. } => source.url(),
      InstallError::Write { .. } => context.url.as_str(),
    };
    let mut lines = vec![
      self.to_string(),
      format!("Version: {}", context.version),
      format!("Platform: {}", context.platform),
      format!("Architecture: {}", context.arch),
      format!("URL: {}", url),
    ];
    if let Some(status_code) = self.status_code() {
      lines.push(format!("HTTP Status: {}", status_code));
    }
    let cause = match self {
      InstallError::Download { source, .. } => source.to_string(),
      InstallError::Write { source, .. } => source.to_string(),
    };
    lines.push(format!("Cause: {}", cause));
    lines.join("\n")
  }
}

/// Downloads the release asset and atomically moves it into place.
///
/// The asset is written next to the destination with a `.tmp` suffix,
/// made executable, then renamed over any existing binary.
pub async fn install_managed_binary(environment: &impl Environment, asset: &ReleaseAsset, managed_path: &Path) -> Result<(), InstallError> {
  let context = InstallContext::from_asset(asset);
  let write_error = |path: &Path, source: io::Error| InstallError::Write {
    context: context.clone(),
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = managed_path.parent() {
    environment.mk_dir_all(parent).map_err(|err| write_error(parent, err))?;
  }
  if environment.is_executable_file(managed_path) {
    return Ok(());
  }

  let tmp_path = tmp_path_for(managed_path);
  remove_file_if_exists(environment, &tmp_path).map_err(|err| write_error(&tmp_path, err))?;

  log_info!(environment, "Downloading shfmt {} from: {}", asset.version, asset.url);
  log_info!(environment, "Platform: {}, Architecture: {}", asset.platform, asset.arch);
  log_info!(environment, "Installing to: {}", managed_path.display());

  let bytes = environment.download_file(&asset.url).await.map_err(|source| InstallError::Download {
    context: context.clone(),
    source,
  })?;

  if let Err(err) = move_into_place(environment, &bytes, &tmp_path, managed_path, write_error) {
    // the partial download is useless on its own
    if let Err(remove_err) = remove_file_if_exists(environment, &tmp_path) {
      log_debug!(environment, "Failed to remove {}: {}", tmp_path.display(), remove_err);
    }
    return Err(err);
  }

  log_info!(environment, "Successfully installed shfmt {}", asset.version);
  Ok(())
}

fn move_into_place(
  environment: &impl Environment,
  bytes: &[u8],
  tmp_path: &Path,
  managed_path: &Path,
  write_error: impl Fn(&Path, io::Error) -> InstallError,
) -> Result<(), InstallError> {
  environment.write_file_bytes(tmp_path, bytes).map_err(|err| write_error(tmp_path, err))?;
  environment.set_executable(tmp_path).map_err(|err| write_error(tmp_path, err))?;
  remove_file_if_exists(environment, managed_path).map_err(|err| write_error(managed_path, err))?;
  environment.rename(tmp_path, managed_path).map_err(|err| write_error(managed_path, err))?;
  Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
  let mut text = path.as_os_str().to_owned();
  text.push(".tmp");
  PathBuf::from(text)
}

fn remove_file_if_exists(environment: &impl Environment, path: &Path) -> io::Result<()> {
  match environment.remove_file(path) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(err) => Err(err),
  }
}
