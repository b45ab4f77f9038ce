#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]

#[macro_use]
mod environment;

use anyhow::Result;
use environment::Environment;
use environment::RealEnvironment;
use environment::RealEnvironmentOptions;
use run_cli::AppError;
use shfmt::ShfmtResolver;
use utils::LogLevel;
use utils::RealStdInReader;

mod arg_parser;
mod commands;
mod configuration;
mod editorconfig;
mod process_runner;
mod run_cli;
mod shfmt;
mod utils;

#[cfg(test)]
mod test_helpers;

fn main() {
  let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
  rt.block_on(async move {
    match run().await {
      Ok(_) => {}
      Err((err, log_level)) => {
        if log_level != LogLevel::Silent {
          let result = format!("{:#}", err.inner);
          #[allow(clippy::print_stderr)]
          if !result.is_empty() {
            eprintln!("{}", result);
          }
        }
        std::process::exit(err.exit_code);
      }
    }
  });
}

async fn run() -> Result<(), (AppError, LogLevel)> {
  let args = arg_parser::parse_args(std::env::args().collect(), RealStdInReader).map_err(|err| (err.into(), LogLevel::Info))?;

  let environment = RealEnvironment::new(RealEnvironmentOptions {
    log_level: args.log_level.unwrap_or_default(),
    is_stdout_machine_readable: args.is_stdout_machine_readable(),
  });
  let resolver = ShfmtResolver::new(environment.clone());

  run_cli::run_cli(&args, &environment, &resolver)
    .await
    .map_err(|err| (err.into(), environment.log_level()))
}
