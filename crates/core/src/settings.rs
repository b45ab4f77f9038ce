use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_SHFMT_VERSION: &str = "3.12.0";

pub const DEFAULT_ENABLED_LANGUAGES: [&str; 10] = [
  "shellscript",
  "dockerfile",
  "dotenv",
  "ignore",
  "hosts",
  "jvmoptions",
  "properties",
  "spring-boot-properties",
  "azcli",
  "bats",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsLogLevel {
  #[default]
  Info,
  Debug,
}

/// Settings exactly as they appear in the settings file.
///
/// Each value is kept loose so that a wrongly typed entry falls back to
/// its default instead of failing the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
  pub executable_path: Option<Value>,
  pub args: Option<Value>,
  pub enabled_languages: Option<Value>,
  pub auto_download: Option<Value>,
  #[serde(rename = "shfmt.version")]
  pub shfmt_version: Option<Value>,
  pub respect_editor_config: Option<Value>,
  pub editor_config_apply_ignore: Option<Value>,
  pub log_level: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub executable_path: Option<String>,
  pub args: Vec<String>,
  pub enabled_languages: Vec<String>,
  pub auto_download: bool,
  pub shfmt_version_override: Option<String>,
  pub respect_editor_config: bool,
  pub editor_config_apply_ignore: bool,
  pub log_level: SettingsLogLevel,
}

impl Default for Settings {
  fn default() -> Self {
    normalize_settings(RawSettings::default())
  }
}

impl Settings {
  pub fn shfmt_version(&self) -> &str {
    self.shfmt_version_override.as_deref().unwrap_or(DEFAULT_SHFMT_VERSION)
  }

  pub fn is_language_enabled(&self, language_id: &str) -> bool {
    self.enabled_languages.iter().any(|l| l == language_id)
  }
}

pub fn normalize_settings(raw: RawSettings) -> Settings {
  Settings {
    executable_path: normalize_optional_string(raw.executable_path.as_ref()),
    args: match raw.args {
      Some(Value::Array(values)) => values
        .into_iter()
        .filter_map(|value| match value {
          Value::String(text) => Some(text),
          _ => None,
        })
        .collect(),
      _ => Vec::new(),
    },
    enabled_languages: match raw.enabled_languages {
      Some(Value::Array(values)) => values
        .iter()
        .filter_map(|value| value.as_str())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(|value| value.to_string())
        .collect(),
      _ => DEFAULT_ENABLED_LANGUAGES.iter().map(|l| l.to_string()).collect(),
    },
    auto_download: bool_or(raw.auto_download.as_ref(), true),
    shfmt_version_override: normalize_optional_string(raw.shfmt_version.as_ref()),
    respect_editor_config: bool_or(raw.respect_editor_config.as_ref(), false),
    editor_config_apply_ignore: bool_or(raw.editor_config_apply_ignore.as_ref(), false),
    log_level: match raw.log_level.as_ref().and_then(|v| v.as_str()) {
      Some("debug") => SettingsLogLevel::Debug,
      _ => SettingsLogLevel::Info,
    },
  }
}

fn normalize_optional_string(value: Option<&Value>) -> Option<String> {
  let trimmed = value?.as_str()?.trim();
  if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn bool_or(value: Option<&Value>, default: bool) -> bool {
  value.and_then(|v| v.as_bool()).unwrap_or(default)
}
