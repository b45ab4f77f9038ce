use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

pub type RawEditorConfig = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
  Tab,
  Space,
}

/// EditorConfig properties shfmt understands.
///
/// Every field is only set when the raw value was recognized. Values that
/// could not be parsed (or were `unset`) stay `None` rather than falling
/// back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEditorConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub indent_style: Option<IndentStyle>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub indent_size: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub shell_variant: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binary_next_line: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub switch_case_indent: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub space_redirects: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub keep_padding: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub function_next_line: Option<bool>,
}

impl NormalizedEditorConfig {
  pub fn from_raw(raw: &RawEditorConfig) -> Self {
    NormalizedEditorConfig {
      indent_style: normalize_indent_style(raw.get("indent_style")),
      indent_size: normalize_indent_size(raw.get("indent_size")),
      shell_variant: normalize_optional_string(raw.get("shell_variant")),
      binary_next_line: normalize_bool(raw.get("binary_next_line")),
      switch_case_indent: normalize_bool(raw.get("switch_case_indent")),
      space_redirects: normalize_bool(raw.get("space_redirects")),
      keep_padding: normalize_bool(raw.get("keep_padding")),
      function_next_line: normalize_bool(raw.get("function_next_line")),
    }
  }

  pub fn is_empty(&self) -> bool {
    self == &NormalizedEditorConfig::default()
  }
}

/// Normalizes the raw properties, returning `None` when nothing relevant
/// to shfmt was resolved.
pub fn normalize_editor_config(raw: &RawEditorConfig) -> Option<NormalizedEditorConfig> {
  let normalized = NormalizedEditorConfig::from_raw(raw);
  if normalized.is_empty() { None } else { Some(normalized) }
}

/// Types a raw `.editorconfig` string value the way the reference
/// EditorConfig parsers do: booleans and integers become typed values and
/// everything else is left as a string.
pub fn parse_raw_value(text: &str) -> Value {
  let trimmed = text.trim();
  if trimmed.eq_ignore_ascii_case("true") {
    Value::Bool(true)
  } else if trimmed.eq_ignore_ascii_case("false") {
    Value::Bool(false)
  } else if is_digits(trimmed) {
    match trimmed.parse::<u64>() {
      Ok(value) => Value::from(value),
      Err(_) => Value::String(trimmed.to_string()),
    }
  } else {
    Value::String(trimmed.to_string())
  }
}

pub fn normalize_indent_style(value: Option<&Value>) -> Option<IndentStyle> {
  match value?.as_str()? {
    "tab" => Some(IndentStyle::Tab),
    "space" => Some(IndentStyle::Space),
    _ => None,
  }
}

pub fn normalize_indent_size(value: Option<&Value>) -> Option<u32> {
  match value? {
    Value::Number(number) => {
      if let Some(value) = number.as_u64() {
        return u32::try_from(value).ok();
      }
      let value = number.as_f64()?;
      if !value.is_finite() || value < 0.0 {
        return None;
      }
      let value = value.trunc();
      if value > u32::MAX as f64 { None } else { Some(value as u32) }
    }
    Value::String(text) => {
      let trimmed = text.trim();
      if !is_digits(trimmed) {
        return None;
      }
      trimmed.parse::<u32>().ok()
    }
    _ => None,
  }
}

pub fn normalize_optional_string(value: Option<&Value>) -> Option<String> {
  let trimmed = value?.as_str()?.trim();
  if trimmed.is_empty() || trimmed == "unset" {
    None
  } else {
    Some(trimmed.to_string())
  }
}

pub fn normalize_bool(value: Option<&Value>) -> Option<bool> {
  match value? {
    Value::Bool(value) => Some(*value),
    Value::Number(number) => match number.as_f64() {
      Some(value) if value == 1.0 => Some(true),
      Some(value) if value == 0.0 => Some(false),
      _ => None,
    },
    Value::String(text) => match text.trim().to_lowercase().as_str() {
      "true" | "1" | "on" => Some(true),
      "false" | "0" | "off" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

fn is_digits(text: &str) -> bool {
  !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
