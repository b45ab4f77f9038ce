use std::path::Path;

use serde_json::Value;
use shell_tidy_core::editorconfig::NormalizedEditorConfig;
use shell_tidy_core::editorconfig::normalize_editor_config;

use crate::environment::Environment;

pub struct EditorConfigRequest<'a> {
  pub enabled: bool,
  pub file_path: &'a Path,
  pub uri_scheme: &'a str,
}

/// Resolves the EditorConfig settings shfmt understands for a file.
///
/// This never fails. Lookup errors are logged and treated as if there was
/// no EditorConfig.
pub fn resolve_editor_config(environment: &impl Environment, request: &EditorConfigRequest) -> Option<NormalizedEditorConfig> {
  if !request.enabled || request.uri_scheme != "file" {
    return None;
  }

  let raw = match environment.editorconfig_properties(request.file_path) {
    Ok(raw) => raw,
    Err(err) => {
      log_warn!(
        environment,
        "Failed to resolve .editorconfig for {}: {:#}",
        request.file_path.display(),
        err
      );
      return None;
    }
  };
  let normalized = normalize_editor_config(&raw)?;
  log_debug!(environment, "Resolved .editorconfig: {}", log_text(request.file_path, &normalized));
  Some(normalized)
}

fn log_text(file_path: &Path, normalized: &NormalizedEditorConfig) -> String {
  let mut map = serde_json::Map::new();
  map.insert("file".to_string(), Value::String(file_path.to_string_lossy().to_string()));
  if let Ok(Value::Object(properties)) = serde_json::to_value(normalized) {
    map.extend(properties);
  }
  Value::Object(map).to_string()
}
