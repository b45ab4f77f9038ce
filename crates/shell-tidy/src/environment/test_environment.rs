use std::collections::HashMap;
use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use anyhow::bail;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use shell_tidy_core::editorconfig::RawEditorConfig;
use tokio_util::sync::CancellationToken;

use super::Environment;
use crate::process_runner::RunError;
use crate::process_runner::ShfmtRunRequest;
use crate::process_runner::ShfmtRunResult;
use crate::utils::DownloadError;
use crate::utils::LogLevel;

pub type ShfmtHandler = Arc<dyn Fn(&ShfmtRunRequest) -> Result<ShfmtRunResult, RunError> + Send + Sync>;

#[derive(Clone)]
struct TestFile {
  bytes: Vec<u8>,
  is_executable: bool,
}

#[derive(Clone)]
pub struct TestEnvironment {
  is_stdout_machine_readable: Arc<Mutex<bool>>,
  log_level: Arc<Mutex<LogLevel>>,
  cwd: Arc<Mutex<PathBuf>>,
  os: Arc<Mutex<String>>,
  cpu_arch: Arc<Mutex<String>>,
  env_vars: Arc<Mutex<HashMap<String, String>>>,
  files: Arc<Mutex<HashMap<PathBuf, TestFile>>>,
  unwritable_paths: Arc<Mutex<HashSet<PathBuf>>>,
  dirs: Arc<Mutex<HashSet<PathBuf>>>,
  remote_files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
  downloaded_urls: Arc<Mutex<Vec<String>>>,
  editorconfigs: Arc<Mutex<HashMap<PathBuf, Result<RawEditorConfig, String>>>>,
  shfmt_handler: Arc<Mutex<ShfmtHandler>>,
  shfmt_requests: Arc<Mutex<Vec<ShfmtRunRequest>>>,
  stdout_messages: Arc<Mutex<Vec<String>>>,
  stderr_messages: Arc<Mutex<Vec<String>>>,
}

impl Default for TestEnvironment {
  fn default() -> Self {
    Self::new()
  }
}

impl TestEnvironment {
  pub fn new() -> TestEnvironment {
    TestEnvironment {
      is_stdout_machine_readable: Default::default(),
      log_level: Default::default(),
      cwd: Arc::new(Mutex::new(PathBuf::from("/"))),
      os: Arc::new(Mutex::new("linux".to_string())),
      cpu_arch: Arc::new(Mutex::new("x86_64".to_string())),
      env_vars: Default::default(),
      files: Default::default(),
      unwritable_paths: Default::default(),
      dirs: Default::default(),
      remote_files: Default::default(),
      downloaded_urls: Default::default(),
      editorconfigs: Default::default(),
      shfmt_handler: Arc::new(Mutex::new(Arc::new(|request: &ShfmtRunRequest| {
        Ok(ShfmtRunResult {
          stdout: request.input.clone(),
          stderr: String::new(),
          exit_code: Some(0),
        })
      }))),
      shfmt_requests: Default::default(),
      stdout_messages: Default::default(),
      stderr_messages: Default::default(),
    }
  }

  pub fn run_in_runtime<T>(&self, future: impl Future<Output = T>) -> T {
    let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    rt.block_on(future)
  }

  pub fn set_stdout_machine_readable(&self, value: bool) {
    *self.is_stdout_machine_readable.lock() = value;
  }

  pub fn set_cwd(&self, dir: impl AsRef<Path>) {
    *self.cwd.lock() = dir.as_ref().to_path_buf();
  }

  pub fn set_os(&self, os: &str) {
    *self.os.lock() = os.to_string();
  }

  pub fn set_cpu_arch(&self, arch: &str) {
    *self.cpu_arch.lock() = arch.to_string();
  }

  pub fn set_env_var(&self, name: &str, value: &str) {
    self.env_vars.lock().insert(name.to_string(), value.to_string());
  }

  pub fn write_file(&self, file_path: impl AsRef<Path>, text: &str) {
    self.files.lock().insert(
      file_path.as_ref().to_path_buf(),
      TestFile {
        bytes: text.as_bytes().to_vec(),
        is_executable: false,
      },
    );
  }

  pub fn write_executable_file(&self, file_path: impl AsRef<Path>) {
    self.files.lock().insert(
      file_path.as_ref().to_path_buf(),
      TestFile {
        bytes: Vec::new(),
        is_executable: true,
      },
    );
  }

  /// Makes writing or renaming to the path fail with a permission error.
  pub fn set_unwritable(&self, path: impl AsRef<Path>) {
    self.unwritable_paths.lock().insert(path.as_ref().to_path_buf());
  }

  pub fn path_exists(&self, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    self.files.lock().contains_key(path) || self.dirs.lock().contains(path)
  }

  fn ensure_writable(&self, path: &Path) -> io::Result<()> {
    if self.unwritable_paths.lock().contains(path) {
      Err(io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"))
    } else {
      Ok(())
    }
  }

  pub fn read_file_bytes(&self, file_path: impl AsRef<Path>) -> Option<Vec<u8>> {
    self.files.lock().get(file_path.as_ref()).map(|f| f.bytes.clone())
  }

  pub fn file_paths_in_dir(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    let mut paths = self
      .files
      .lock()
      .keys()
      .filter(|p| p.parent() == Some(dir))
      .cloned()
      .collect::<Vec<_>>();
    paths.sort();
    paths
  }

  pub fn add_remote_file_bytes(&self, url: &str, bytes: Vec<u8>) {
    self.remote_files.lock().insert(url.to_string(), bytes);
  }

  pub fn downloaded_urls(&self) -> Vec<String> {
    self.downloaded_urls.lock().clone()
  }

  pub fn set_editorconfig(&self, file_path: impl AsRef<Path>, properties: serde_json::Value) {
    let properties = match properties {
      serde_json::Value::Object(properties) => properties,
      _ => panic!("Expected an object."),
    };
    self.editorconfigs.lock().insert(file_path.as_ref().to_path_buf(), Ok(properties));
  }

  pub fn set_editorconfig_error(&self, file_path: impl AsRef<Path>, message: &str) {
    self.editorconfigs.lock().insert(file_path.as_ref().to_path_buf(), Err(message.to_string()));
  }

  pub fn set_shfmt_handler(&self, handler: impl Fn(&ShfmtRunRequest) -> Result<ShfmtRunResult, RunError> + Send + Sync + 'static) {
    *self.shfmt_handler.lock() = Arc::new(handler);
  }

  pub fn take_shfmt_requests(&self) -> Vec<ShfmtRunRequest> {
    self.shfmt_requests.lock().drain(..).collect()
  }

  pub fn take_stdout_messages(&self) -> Vec<String> {
    self.stdout_messages.lock().drain(..).collect()
  }

  pub fn take_stderr_messages(&self) -> Vec<String> {
    self.stderr_messages.lock().drain(..).collect()
  }
}

impl Environment for TestEnvironment {
  fn is_real(&self) -> bool {
    false
  }

  fn os(&self) -> String {
    self.os.lock().clone()
  }

  fn cpu_arch(&self) -> String {
    self.cpu_arch.lock().clone()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    self.env_vars.lock().get(name).cloned()
  }

  fn cwd(&self) -> io::Result<PathBuf> {
    Ok(self.cwd.lock().clone())
  }

  fn storage_dir(&self) -> io::Result<PathBuf> {
    Ok(PathBuf::from("/storage/shell-tidy"))
  }

  fn read_file(&self, file_path: &Path) -> io::Result<String> {
    match self.files.lock().get(file_path) {
      Some(file) => String::from_utf8(file.bytes.clone()).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
      None => Err(not_found(file_path)),
    }
  }

  fn write_file_bytes(&self, file_path: &Path, bytes: &[u8]) -> io::Result<()> {
    self.ensure_writable(file_path)?;
    self.files.lock().insert(
      file_path.to_path_buf(),
      TestFile {
        bytes: bytes.to_vec(),
        is_executable: false,
      },
    );
    Ok(())
  }

  fn remove_file(&self, file_path: &Path) -> io::Result<()> {
    match self.files.lock().remove(file_path) {
      Some(_) => Ok(()),
      None => Err(not_found(file_path)),
    }
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    self.ensure_writable(to)?;
    let mut files = self.files.lock();
    match files.remove(from) {
      Some(file) => {
        files.insert(to.to_path_buf(), file);
        Ok(())
      }
      None => Err(not_found(from)),
    }
  }

  fn mk_dir_all(&self, path: &Path) -> io::Result<()> {
    let mut dirs = self.dirs.lock();
    for ancestor in path.ancestors() {
      dirs.insert(ancestor.to_path_buf());
    }
    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    self.files.lock().contains_key(path)
  }

  fn is_executable_file(&self, path: &Path) -> bool {
    self.files.lock().get(path).is_some_and(|f| f.is_executable)
  }

  fn set_executable(&self, file_path: &Path) -> io::Result<()> {
    match self.files.lock().get_mut(file_path) {
      Some(file) => {
        file.is_executable = true;
        Ok(())
      }
      None => Err(not_found(file_path)),
    }
  }

  fn download_file(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, DownloadError>> {
    let environment = self.clone();
    let url = url.to_string();
    async move {
      // let other tasks run in the meantime like a real download would
      tokio::task::yield_now().await;
      environment.downloaded_urls.lock().push(url.clone());
      let bytes = environment.remote_files.lock().get(&url).cloned();
      match bytes {
        Some(bytes) => Ok(bytes),
        None => Err(DownloadError::Status {
          url,
          status: 404,
          status_text: "Not Found".to_string(),
        }),
      }
    }
    .boxed_local()
  }

  fn editorconfig_properties(&self, file_path: &Path) -> Result<RawEditorConfig> {
    match self.editorconfigs.lock().get(file_path) {
      Some(Ok(properties)) => Ok(properties.clone()),
      Some(Err(message)) => bail!("{}", message),
      None => Ok(RawEditorConfig::new()),
    }
  }

  fn run_shfmt(&self, request: ShfmtRunRequest, _token: Option<CancellationToken>) -> LocalBoxFuture<'static, Result<ShfmtRunResult, RunError>> {
    let handler = self.shfmt_handler.lock().clone();
    let result = handler(&request);
    self.shfmt_requests.lock().push(request);
    async move { result }.boxed_local()
  }

  fn log(&self, text: &str) {
    if *self.is_stdout_machine_readable.lock() || !self.log_level().is_info() {
      return;
    }
    self.stdout_messages.lock().push(text.to_string());
  }

  fn log_stderr(&self, text: &str) {
    self.stderr_messages.lock().push(text.to_string());
  }

  fn write_stdout(&self, text: &str) {
    self.stdout_messages.lock().push(text.to_string());
  }

  fn log_level(&self) -> LogLevel {
    *self.log_level.lock()
  }

  fn set_log_level(&self, log_level: LogLevel) {
    *self.log_level.lock() = log_level;
  }
}

fn not_found(path: &Path) -> io::Error {
  io::Error::new(io::ErrorKind::NotFound, format!("Could not find file at path {}", path.display()))
}
