use std::cell::RefCell;

use anyhow::Result;
use thiserror::Error;

use crate::arg_parser::parse_args;
use crate::environment::Environment;
use crate::environment::TestEnvironment;
use crate::run_cli::AppError;
use crate::run_cli::run_cli;
use crate::shfmt::ShfmtResolver;
use crate::utils::TestStdInReader;

#[derive(Debug, Error)]
#[error("{inner:#}")]
pub struct TestAppError {
  asserted_exit_code: RefCell<bool>,
  inner: AppError,
}

impl TestAppError {
  #[track_caller]
  pub fn assert_exit_code(&self, exit_code: i32) {
    self.asserted_exit_code.replace(true);
    assert_eq!(self.inner.exit_code, exit_code);
  }
}

impl From<AppError> for TestAppError {
  fn from(inner: AppError) -> Self {
    Self {
      asserted_exit_code: Default::default(),
      inner,
    }
  }
}

impl From<anyhow::Error> for TestAppError {
  fn from(inner: anyhow::Error) -> Self {
    Self {
      asserted_exit_code: Default::default(),
      inner: inner.into(),
    }
  }
}

impl Drop for TestAppError {
  fn drop(&mut self) {
    if std::thread::panicking() || self.inner.exit_code <= 1 {
      return;
    }
    if !*self.asserted_exit_code.borrow() {
      panic!("Exit code must be asserted. Was: {}", self.inner.exit_code);
    }
  }
}

pub fn run_test_cli(args: Vec<&str>, environment: &TestEnvironment) -> Result<(), TestAppError> {
  run_test_cli_with_stdin(args, environment, TestStdInReader::default())
}

pub fn run_test_cli_with_stdin(args: Vec<&str>, environment: &TestEnvironment, stdin_reader: TestStdInReader) -> Result<(), TestAppError> {
  let mut args: Vec<String> = args.into_iter().map(String::from).collect();
  args.insert(0, String::from(""));
  let args = parse_args(args, stdin_reader).map_err(Into::<AppError>::into)?;
  environment.set_stdout_machine_readable(args.is_stdout_machine_readable());
  if let Some(log_level) = args.log_level {
    environment.set_log_level(log_level);
  }
  let resolver = ShfmtResolver::new(environment.clone());

  environment.run_in_runtime(async {
    run_cli(&args, environment, &resolver).await?;
    Ok(())
  })
}
