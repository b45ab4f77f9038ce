use std::path::PathBuf;

use anyhow::Result;
use shell_tidy_core::args::BuildArgsOptions;
use shell_tidy_core::args::DocumentInfo;
use shell_tidy_core::args::FormattingOptions;
use shell_tidy_core::args::build_shfmt_args;
use shell_tidy_core::eol::match_line_endings;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::load_settings;
use super::resolve_options;
use crate::arg_parser::CliArgs;
use crate::arg_parser::FmtSubCommand;
use crate::editorconfig::EditorConfigRequest;
use crate::editorconfig::resolve_editor_config;
use crate::environment::Environment;
use crate::process_runner::ShfmtRunRequest;
use crate::process_runner::ShfmtRunResult;
use crate::shfmt::ShfmtResolver;

#[derive(Debug, Error)]
#[error("shfmt failed to format {file_path}: {message}")]
pub struct FormatError {
  pub file_path: String,
  pub message: String,
}

impl FormatError {
  fn from_result(file_path: &str, result: &ShfmtRunResult) -> Self {
    let stderr = result.stderr.trim();
    let message = if !stderr.is_empty() {
      stderr.to_string()
    } else {
      match result.exit_code {
        Some(code) => format!("exited with code {}", code),
        None => "the process was terminated".to_string(),
      }
    };
    FormatError {
      file_path: file_path.to_string(),
      message,
    }
  }
}

pub async fn format_stdin<TEnvironment: Environment>(
  cmd: &FmtSubCommand,
  args: &CliArgs,
  environment: &TEnvironment,
  resolver: &ShfmtResolver<TEnvironment>,
) -> Result<()> {
  let resolved = load_settings(args, environment)?;
  let settings = &resolved.settings;
  if !settings.is_language_enabled(&cmd.language_id) {
    log_debug!(environment, "Formatting is not enabled for {}. Outputting the text unchanged.", cmd.language_id);
    environment.write_stdout(&cmd.file_text);
    return Ok(());
  }

  let shfmt = resolver.resolve(&resolve_options(&resolved)).await?;
  log_debug!(environment, "Using shfmt from {}: {}", shfmt.source, shfmt.executable_path.display());

  let file_path = if cmd.uri_scheme == "file" {
    environment.cwd()?.join(&cmd.file_path)
  } else {
    PathBuf::from(&cmd.file_path)
  };
  let file_name = file_path.to_string_lossy();
  let editor_config = resolve_editor_config(
    environment,
    &EditorConfigRequest {
      enabled: settings.respect_editor_config,
      file_path: &file_path,
      uri_scheme: &cmd.uri_scheme,
    },
  );
  let on_warning = |message: &str| log_warn!(environment, "{}", message);
  let shfmt_args = build_shfmt_args(&BuildArgsOptions {
    base_args: &settings.args,
    document: DocumentInfo {
      language_id: &cmd.language_id,
      file_name: &file_name,
      uri_scheme: Some(cmd.uri_scheme.as_str()),
    },
    formatting: FormattingOptions {
      insert_spaces: cmd.insert_spaces,
      tab_size: cmd.tab_size,
    },
    respect_editor_config: settings.respect_editor_config,
    editor_config_apply_ignore: settings.editor_config_apply_ignore,
    editor_config: editor_config.as_ref(),
    on_warning: Some(&on_warning),
  });
  log_debug!(environment, "Running: {} {}", shfmt.executable_path.display(), shfmt_args.join(" "));

  let token = CancellationToken::new();
  // kill shfmt rather than leaving it running when interrupted
  let ctrl_c_handle = environment.is_real().then(|| {
    let token = token.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        token.cancel();
      }
    })
  });
  let result = environment
    .run_shfmt(
      ShfmtRunRequest {
        executable_path: shfmt.executable_path.clone(),
        args: shfmt_args,
        input: cmd.file_text.clone(),
      },
      Some(token),
    )
    .await;
  if let Some(handle) = ctrl_c_handle {
    handle.abort();
  }

  let result = result?;
  if result.exit_code != Some(0) {
    return Err(FormatError::from_result(&cmd.file_path, &result).into());
  }
  if !result.stderr.trim().is_empty() {
    log_debug!(environment, "shfmt stderr: {}", result.stderr.trim());
  }
  environment.write_stdout(&match_line_endings(&cmd.file_text, &result.stdout));
  Ok(())
}
