use anyhow::Result;

use crate::arg_parser::CliArgs;
use crate::configuration::ResolvedSettings;
use crate::configuration::resolve_settings;
use crate::environment::Environment;
use crate::shfmt::ResolveOptions;
use crate::shfmt::ShfmtResolver;
use crate::utils::LogLevel;

pub fn output_version<TEnvironment: Environment>(environment: &TEnvironment) -> Result<()> {
  environment.log(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
  Ok(())
}

pub fn output_help<TEnvironment: Environment>(environment: &TEnvironment, help_text: &str) -> Result<()> {
  environment.log(help_text);
  Ok(())
}

/// Resolves the settings and applies their log level unless the args
/// provided one.
pub fn load_settings<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment) -> Result<ResolvedSettings> {
  let resolved = resolve_settings(args, environment)?;
  environment.set_log_level(args.log_level.unwrap_or_else(|| LogLevel::from(resolved.settings.log_level)));
  Ok(resolved)
}

pub(crate) fn resolve_options(resolved: &ResolvedSettings) -> ResolveOptions<'_> {
  ResolveOptions {
    version: resolved.settings.shfmt_version(),
    executable_path_setting: resolved.settings.executable_path.as_deref(),
    auto_download: resolved.settings.auto_download,
    workspace_folder: &resolved.workspace_folder,
  }
}

pub async fn download<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, resolver: &ShfmtResolver<TEnvironment>) -> Result<()> {
  let resolved = load_settings(args, environment)?;
  let version = resolved.settings.shfmt_version();
  environment.log(&format!("Ensuring managed shfmt {} is installed...", version));
  let managed_path = resolver.ensure_managed_binary_installed(version).await?;
  log_debug!(environment, "Managed shfmt path: {}", managed_path.display());
  environment.log("Managed shfmt is installed.");
  Ok(())
}

pub async fn output_info<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, resolver: &ShfmtResolver<TEnvironment>) -> Result<()> {
  let resolved = load_settings(args, environment)?;
  let shfmt = resolver.resolve(&resolve_options(&resolved)).await?;
  environment.log(&format!("shfmt version (requested): {}", shfmt.version));
  environment.log(&format!("shfmt source: {}", shfmt.source));
  environment.log(&format!("shfmt path: {}", shfmt.executable_path.display()));
  Ok(())
}

/// Installs the managed binary in the background when it would be used.
/// This never fails.
pub async fn prewarm<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, resolver: &ShfmtResolver<TEnvironment>) -> Result<()> {
  let resolved = match load_settings(args, environment) {
    Ok(resolved) => resolved,
    Err(err) => {
      log_warn!(environment, "Prewarm shfmt failed: {:#}", err);
      return Ok(());
    }
  };
  resolver.prewarm_if_needed(&resolve_options(&resolved)).await;
  Ok(())
}
