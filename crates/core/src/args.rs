use crate::editorconfig::IndentStyle;
use crate::editorconfig::NormalizedEditorConfig;

pub struct DocumentInfo<'a> {
  pub language_id: &'a str,
  pub file_name: &'a str,
  /// The document's URI scheme. `None` is treated as a local file.
  pub uri_scheme: Option<&'a str>,
}

impl DocumentInfo<'_> {
  pub fn is_local_file(&self) -> bool {
    self.uri_scheme.unwrap_or("file") == "file"
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingOptions {
  pub insert_spaces: bool,
  pub tab_size: u32,
}

pub struct BuildArgsOptions<'a> {
  pub base_args: &'a [String],
  pub document: DocumentInfo<'a>,
  pub formatting: FormattingOptions,
  pub respect_editor_config: bool,
  pub editor_config_apply_ignore: bool,
  pub editor_config: Option<&'a NormalizedEditorConfig>,
  pub on_warning: Option<&'a dyn Fn(&str)>,
}

/// Builds the arguments to run shfmt with.
///
/// Precedence, highest first:
///
/// 1. The configured base args (always emitted first and verbatim).
/// 2. EditorConfig derived flags, when enabled for a local file.
/// 3. The editor's formatting options.
///
/// A lower tier never adds a flag a higher tier already provided.
pub fn build_shfmt_args(options: &BuildArgsOptions) -> Vec<String> {
  let mut args = options.base_args.to_vec();
  let is_file_document = options.document.is_local_file();
  let respect_editor_config = options.respect_editor_config && is_file_document;

  if respect_editor_config && !has_filename_flag(&args) {
    args.push(format!("--filename={}", options.document.file_name));
  }
  if respect_editor_config && options.editor_config_apply_ignore && !has_apply_ignore_flag(&args) {
    args.push("--apply-ignore".to_string());
  }

  if respect_editor_config && let Some(editor_config) = options.editor_config {
    let mut builder = EditorConfigArgs {
      args: &mut args,
      base_args: options.base_args,
      on_warning: options.on_warning,
    };
    builder.apply(editor_config);
  }

  // bats files need an explicit dialect
  if (options.document.language_id == "bats" || options.document.file_name.ends_with(".bats")) && !has_lang_flag(&args) {
    args.push("--ln=bats".to_string());
  }

  // respect the editor's indentation if nothing explicitly set shfmt's indent
  if options.formatting.insert_spaces && !has_indent_flag(&args) {
    args.push(format!("-i={}", options.formatting.tab_size));
  }

  args.retain(|arg| !arg.is_empty());
  args
}

struct BooleanFlag {
  key: &'static str,
  short_flag: &'static str,
  long_flag: &'static str,
}

const BINARY_NEXT_LINE: BooleanFlag = BooleanFlag {
  key: "binary_next_line",
  short_flag: "-bn",
  long_flag: "--binary-next-line",
};
const SWITCH_CASE_INDENT: BooleanFlag = BooleanFlag {
  key: "switch_case_indent",
  short_flag: "-ci",
  long_flag: "--case-indent",
};
const SPACE_REDIRECTS: BooleanFlag = BooleanFlag {
  key: "space_redirects",
  short_flag: "-sr",
  long_flag: "--space-redirects",
};
const KEEP_PADDING: BooleanFlag = BooleanFlag {
  key: "keep_padding",
  short_flag: "-kp",
  long_flag: "--keep-padding",
};
const FUNCTION_NEXT_LINE: BooleanFlag = BooleanFlag {
  key: "function_next_line",
  short_flag: "-fn",
  long_flag: "--func-next-line",
};

struct EditorConfigArgs<'a> {
  args: &'a mut Vec<String>,
  base_args: &'a [String],
  on_warning: Option<&'a dyn Fn(&str)>,
}

impl EditorConfigArgs<'_> {
  fn apply(&mut self, editor_config: &NormalizedEditorConfig) {
    let indent_arg = match (editor_config.indent_style, editor_config.indent_size) {
      (Some(IndentStyle::Tab), _) => Some("-i=0".to_string()),
      (Some(IndentStyle::Space), Some(size)) => Some(format!("-i={}", size)),
      _ => None,
    };
    if let Some(indent_arg) = indent_arg {
      if has_indent_flag(self.args) {
        if has_indent_flag(self.base_args) {
          self.warn("EditorConfig indent settings were ignored because the configured args already set an indent flag.");
        }
      } else {
        self.args.push(indent_arg);
      }
    }

    if let Some(shell_variant) = &editor_config.shell_variant {
      if has_lang_flag(self.args) {
        if has_lang_flag(self.base_args) {
          self.warn("EditorConfig shell_variant was ignored because the configured args already set -ln/--ln.");
        }
      } else {
        self.args.push(format!("-ln={}", shell_variant));
      }
    }

    self.push_boolean_flag(editor_config.binary_next_line, &BINARY_NEXT_LINE);
    self.push_boolean_flag(editor_config.switch_case_indent, &SWITCH_CASE_INDENT);
    self.push_boolean_flag(editor_config.space_redirects, &SPACE_REDIRECTS);
    self.push_boolean_flag(editor_config.keep_padding, &KEEP_PADDING);
    self.push_boolean_flag(editor_config.function_next_line, &FUNCTION_NEXT_LINE);
  }

  fn push_boolean_flag(&mut self, value: Option<bool>, flag: &BooleanFlag) {
    if value != Some(true) {
      return;
    }
    if has_flag(self.args, flag) {
      if has_flag(self.base_args, flag) {
        self.warn(&format!(
          "EditorConfig {} was ignored because the configured args already set {}.",
          flag.key, flag.short_flag
        ));
      }
      return;
    }
    self.args.push(flag.short_flag.to_string());
  }

  fn warn(&self, message: &str) {
    if let Some(on_warning) = self.on_warning {
      on_warning(message);
    }
  }
}

fn has_indent_flag(args: &[String]) -> bool {
  args.iter().any(|arg| arg.starts_with("-i"))
}

fn has_filename_flag(args: &[String]) -> bool {
  args
    .iter()
    .enumerate()
    .any(|(i, arg)| (arg == "--filename" && i + 1 < args.len()) || arg.starts_with("--filename="))
}

fn has_apply_ignore_flag(args: &[String]) -> bool {
  args.iter().any(|arg| arg == "--apply-ignore")
}

fn has_lang_flag(args: &[String]) -> bool {
  args
    .iter()
    .any(|arg| arg == "-ln" || arg.starts_with("-ln=") || arg == "--ln" || arg.starts_with("--ln="))
}

fn has_flag(args: &[String], flag: &BooleanFlag) -> bool {
  args.iter().any(|arg| arg == flag.short_flag || arg == flag.long_flag)
}
