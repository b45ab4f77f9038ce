use parking_lot::Mutex;
use shell_tidy_core::settings::SettingsLogLevel;
use std::io::Stderr;
use std::io::Stdout;
use std::io::Write;
use std::io::stderr;
use std::io::stdout;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
  Debug,
  #[default]
  Info,
  Warn,
  Error,
  Silent,
}

impl LogLevel {
  pub fn is_debug(&self) -> bool {
    *self <= LogLevel::Debug
  }

  pub fn is_info(&self) -> bool {
    *self <= LogLevel::Info
  }

  pub fn is_warn(&self) -> bool {
    *self <= LogLevel::Warn
  }

  pub fn is_error(&self) -> bool {
    *self <= LogLevel::Error
  }
}

impl From<SettingsLogLevel> for LogLevel {
  fn from(value: SettingsLogLevel) -> Self {
    match value {
      SettingsLogLevel::Info => LogLevel::Info,
      SettingsLogLevel::Debug => LogLevel::Debug,
    }
  }
}

#[derive(Clone)]
pub struct LoggerOptions {
  pub log_level: LogLevel,
  /// Whether stdout will be read by a program.
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct Logger {
  output_lock: Arc<Mutex<LoggerState>>,
  is_stdout_machine_readable: bool,
}

struct LoggerState {
  log_level: LogLevel,
  std_out: Stdout,
  std_err: Stderr,
}

impl Logger {
  pub fn new(options: &LoggerOptions) -> Self {
    Logger {
      output_lock: Arc::new(Mutex::new(LoggerState {
        log_level: options.log_level,
        std_out: stdout(),
        std_err: stderr(),
      })),
      is_stdout_machine_readable: options.is_stdout_machine_readable,
    }
  }

  pub fn log_level(&self) -> LogLevel {
    self.output_lock.lock().log_level
  }

  pub fn set_log_level(&self, log_level: LogLevel) {
    self.output_lock.lock().log_level = log_level;
  }

  /// Logs a line of informational text to stdout.
  pub fn log(&self, text: &str) {
    if self.is_stdout_machine_readable {
      return;
    }
    let mut state = self.output_lock.lock();
    if !state.log_level.is_info() {
      return;
    }
    let text = with_trailing_newline(text);
    // a closed pipe shouldn't take down the process
    let _ = write!(state.std_out, "{}", text);
    let _ = state.std_out.flush();
  }

  pub fn log_stderr(&self, text: &str) {
    let mut state = self.output_lock.lock();
    let text = with_trailing_newline(text);
    let _ = write!(state.std_err, "{}", text);
    let _ = state.std_err.flush();
  }

  /// Writes the text to stdout exactly as provided.
  pub fn write_stdout(&self, text: &str) {
    let mut state = self.output_lock.lock();
    let _ = state.std_out.write_all(text.as_bytes());
    let _ = state.std_out.flush();
  }
}

fn with_trailing_newline(text: &str) -> String {
  let mut text = text.to_string();
  if !text.ends_with('\n') {
    text.push('\n');
  }
  text
}
