use std::fmt;

use anyhow::Result;

use crate::arg_parser::CliArgs;
use crate::arg_parser::ParseArgsError;
use crate::arg_parser::SubCommand;
use crate::commands;
use crate::commands::FormatError;
use crate::environment::Environment;
use crate::shfmt::ResolveError;
use crate::shfmt::ShfmtResolver;

pub struct AppError {
  pub inner: anyhow::Error,
  pub exit_code: i32,
}

impl fmt::Debug for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.inner, f)
  }
}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.inner, f)
  }
}

impl From<anyhow::Error> for AppError {
  fn from(inner: anyhow::Error) -> Self {
    let exit_code = if inner.downcast_ref::<ParseArgsError>().is_some() {
      10
    } else if inner.downcast_ref::<FormatError>().is_some() {
      11
    } else if inner.downcast_ref::<ResolveError>().is_some() {
      12
    } else {
      1
    };
    AppError { inner, exit_code }
  }
}

impl From<ParseArgsError> for AppError {
  fn from(inner: ParseArgsError) -> Self {
    AppError {
      inner: inner.into(),
      exit_code: 10,
    }
  }
}

pub async fn run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, resolver: &ShfmtResolver<TEnvironment>) -> Result<()> {
  match &args.sub_command {
    SubCommand::Help(help_text) => commands::output_help(environment, help_text),
    SubCommand::Version => commands::output_version(environment),
    SubCommand::Fmt(cmd) => commands::format_stdin(cmd, args, environment, resolver).await,
    SubCommand::Download => commands::download(args, environment, resolver).await,
    SubCommand::Info => commands::output_info(args, environment, resolver).await,
    SubCommand::Prewarm => commands::prewarm(args, environment, resolver).await,
  }
}
