use std::fmt;

use thiserror::Error;

pub const SHFMT_DOWNLOAD_BASE_URL: &str = "https://github.com/mvdan/sh/releases/download";

/// Operating system names used by the shfmt release assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShfmtPlatform {
  Darwin,
  Linux,
  FreeBsd,
  NetBsd,
  OpenBsd,
  Windows,
}

impl ShfmtPlatform {
  pub fn as_str(&self) -> &'static str {
    match self {
      ShfmtPlatform::Darwin => "darwin",
      ShfmtPlatform::Linux => "linux",
      ShfmtPlatform::FreeBsd => "freebsd",
      ShfmtPlatform::NetBsd => "netbsd",
      ShfmtPlatform::OpenBsd => "openbsd",
      ShfmtPlatform::Windows => "windows",
    }
  }
}

impl fmt::Display for ShfmtPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// CPU architecture names used by the shfmt release assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShfmtArch {
  Amd64,
  Arm64,
  Arm,
  X86,
}

impl ShfmtArch {
  pub fn as_str(&self) -> &'static str {
    match self {
      ShfmtArch::Amd64 => "amd64",
      ShfmtArch::Arm64 => "arm64",
      ShfmtArch::Arm => "arm",
      ShfmtArch::X86 => "386",
    }
  }
}

impl fmt::Display for ShfmtArch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedPlatformError {
  #[error("Unsupported platform \"{0}\". Configure \"executablePath\" to use a custom shfmt.")]
  Os(String),
  #[error("Unsupported architecture \"{0}\". Configure \"executablePath\" to use a custom shfmt.")]
  Arch(String),
}

/// Maps a Rust operating system name (`std::env::consts::OS`) to the
/// name shfmt uses in its release assets.
pub fn resolve_platform_tag(os: &str) -> Result<ShfmtPlatform, UnsupportedPlatformError> {
  match os {
    "macos" => Ok(ShfmtPlatform::Darwin),
    "linux" => Ok(ShfmtPlatform::Linux),
    "freebsd" => Ok(ShfmtPlatform::FreeBsd),
    "netbsd" => Ok(ShfmtPlatform::NetBsd),
    "openbsd" => Ok(ShfmtPlatform::OpenBsd),
    "windows" => Ok(ShfmtPlatform::Windows),
    _ => Err(UnsupportedPlatformError::Os(os.to_string())),
  }
}

/// Maps a Rust CPU architecture name (`std::env::consts::ARCH`) to the
/// name shfmt uses in its release assets.
pub fn resolve_arch_tag(arch: &str) -> Result<ShfmtArch, UnsupportedPlatformError> {
  match arch {
    "x86_64" => Ok(ShfmtArch::Amd64),
    "aarch64" => Ok(ShfmtArch::Arm64),
    "arm" => Ok(ShfmtArch::Arm),
    "x86" => Ok(ShfmtArch::X86),
    _ => Err(UnsupportedPlatformError::Arch(arch.to_string())),
  }
}

pub fn resolve_executable_extension(platform: ShfmtPlatform) -> &'static str {
  match platform {
    ShfmtPlatform::Windows => ".exe",
    _ => "",
  }
}

/// Gets the executable extension from a raw operating system name without
/// requiring the platform to be one shfmt publishes releases for.
pub fn executable_extension_for_os(os: &str) -> &'static str {
  if os == "windows" { ".exe" } else { "" }
}

/// A release asset for a specific shfmt version, platform, and architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
  pub version: String,
  pub platform: ShfmtPlatform,
  pub arch: ShfmtArch,
  pub file_name: String,
  pub url: String,
}

impl ReleaseAsset {
  pub fn new(base_url: &str, version: &str, platform: ShfmtPlatform, arch: ShfmtArch) -> Self {
    let file_name = release_file_name(version, platform, arch);
    let url = format!("{}/{}/{}", base_url.trim_end_matches('/'), version_tag(version), file_name);
    ReleaseAsset {
      version: version.to_string(),
      platform,
      arch,
      file_name,
      url,
    }
  }

  /// Resolves the asset for the provided Rust OS and arch names.
  pub fn for_host(base_url: &str, version: &str, os: &str, arch: &str) -> Result<Self, UnsupportedPlatformError> {
    let platform = resolve_platform_tag(os)?;
    let arch = resolve_arch_tag(arch)?;
    Ok(ReleaseAsset::new(base_url, version, platform, arch))
  }
}

/// Versions may be configured with or without the leading "v".
pub fn version_tag(version: &str) -> String {
  if version.starts_with('v') {
    version.to_string()
  } else {
    format!("v{}", version)
  }
}

pub fn release_file_name(version: &str, platform: ShfmtPlatform, arch: ShfmtArch) -> String {
  format!(
    "shfmt_{}_{}_{}{}",
    version_tag(version),
    platform,
    arch,
    resolve_executable_extension(platform)
  )
}
