use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use shell_tidy_core::settings::RawSettings;
use shell_tidy_core::settings::Settings;
use shell_tidy_core::settings::normalize_settings;

use crate::arg_parser::CliArgs;
use crate::environment::Environment;

pub const SETTINGS_FILE_NAME: &str = "shell-tidy.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
  pub settings: Settings,
  pub workspace_folder: PathBuf,
  /// The settings file that was read, if any.
  pub config_path: Option<PathBuf>,
}

/// Reads the settings file from `--config` or the workspace folder.
///
/// A missing settings file in the workspace folder means the defaults are
/// used. A missing file that was explicitly provided is an error.
pub fn resolve_settings(args: &CliArgs, environment: &impl Environment) -> Result<ResolvedSettings> {
  let cwd = environment.cwd().context("Could not get the current working directory.")?;
  let workspace_folder = match &args.workspace_folder {
    Some(folder) => cwd.join(folder),
    None => cwd.clone(),
  };

  let config_path = match &args.config {
    Some(config) => {
      let config_path = cwd.join(config);
      if !environment.is_file(&config_path) {
        bail!("No settings file found at {}.", config_path.display());
      }
      Some(config_path)
    }
    None => Some(workspace_folder.join(SETTINGS_FILE_NAME)).filter(|path| environment.is_file(path)),
  };

  let settings = match &config_path {
    Some(config_path) => {
      log_debug!(environment, "Reading settings from {}", config_path.display());
      let text = environment
        .read_file(config_path)
        .with_context(|| format!("Failed reading settings file at {}.", config_path.display()))?;
      let raw_settings = serde_json::from_str::<RawSettings>(&text).with_context(|| format!("Failed parsing settings file at {}.", config_path.display()))?;
      normalize_settings(raw_settings)
    }
    None => Settings::default(),
  };

  Ok(ResolvedSettings {
    settings,
    workspace_folder,
    config_path,
  })
}
