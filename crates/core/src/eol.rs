/// Whether the text's first line break is `\r\n`.
pub fn uses_crlf(text: &str) -> bool {
  match text.find('\n') {
    Some(index) => text[..index].ends_with('\r'),
    None => false,
  }
}

/// Converts every line break in the text to `\r\n` or `\n`.
pub fn normalize_line_endings(text: &str, crlf: bool) -> String {
  let lf_text = text.replace("\r\n", "\n");
  if crlf { lf_text.replace('\n', "\r\n") } else { lf_text }
}

/// Makes the formatted text use the same line breaks as the original.
pub fn match_line_endings(original: &str, formatted: &str) -> String {
  normalize_line_endings(formatted, uses_crlf(original))
}
