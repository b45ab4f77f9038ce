use std::path::Path;
use std::path::PathBuf;

use shell_tidy_core::platform::ReleaseAsset;
use shell_tidy_core::platform::SHFMT_DOWNLOAD_BASE_URL;

use super::Environment;
use super::TestEnvironment;
use crate::process_runner::RunError;
use crate::process_runner::ShfmtRunRequest;
use crate::process_runner::ShfmtRunResult;

pub const TEST_SHFMT_BYTES: &[u8] = b"test-shfmt-binary";

pub struct TestEnvironmentBuilder {
  environment: TestEnvironment,
}

impl TestEnvironmentBuilder {
  pub fn new() -> Self {
    Self {
      environment: TestEnvironment::new(),
    }
  }

  /// An environment where the release asset for the version can be downloaded.
  pub fn with_remote_shfmt(version: &str) -> TestEnvironmentBuilder {
    let mut builder = TestEnvironmentBuilder::new();
    builder.add_remote_shfmt(version);
    builder
  }

  pub fn build(&mut self) -> TestEnvironment {
    self.environment.clone()
  }

  pub fn add_remote_shfmt(&mut self, version: &str) -> &mut Self {
    let os = self.environment.os();
    let arch = self.environment.cpu_arch();
    let asset = ReleaseAsset::for_host(SHFMT_DOWNLOAD_BASE_URL, version, &os, &arch).unwrap();
    self.environment.add_remote_file_bytes(&asset.url, TEST_SHFMT_BYTES.to_vec());
    self
  }

  pub fn set_cwd(&mut self, dir_path: &str) -> &mut Self {
    self.environment.set_cwd(dir_path);
    self
  }

  pub fn set_env_var(&mut self, name: &str, value: &str) -> &mut Self {
    self.environment.set_env_var(name, value);
    self
  }

  /// Sets the PATH environment variable to the provided directories.
  pub fn set_path_dirs(&mut self, dirs: &[&str]) -> &mut Self {
    let path = std::env::join_paths(dirs.iter().map(PathBuf::from)).unwrap();
    self.environment.set_env_var("PATH", &path.to_string_lossy());
    self
  }

  pub fn write_file(&mut self, file_path: impl AsRef<Path>, text: &str) -> &mut Self {
    self.environment.write_file(file_path, text);
    self
  }

  pub fn write_executable_file(&mut self, file_path: impl AsRef<Path>) -> &mut Self {
    self.environment.write_executable_file(file_path);
    self
  }

  pub fn write_settings(&mut self, file_path: impl AsRef<Path>, settings: serde_json::Value) -> &mut Self {
    self.environment.write_file(file_path, &serde_json::to_string_pretty(&settings).unwrap());
    self
  }

  pub fn set_editorconfig(&mut self, file_path: impl AsRef<Path>, properties: serde_json::Value) -> &mut Self {
    self.environment.set_editorconfig(file_path, properties);
    self
  }

  pub fn set_shfmt_handler(&mut self, handler: impl Fn(&ShfmtRunRequest) -> Result<ShfmtRunResult, RunError> + Send + Sync + 'static) -> &mut Self {
    self.environment.set_shfmt_handler(handler);
    self
  }
}
