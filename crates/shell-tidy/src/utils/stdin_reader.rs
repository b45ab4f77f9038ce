use std::io::Read;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;

#[cfg(test)]
pub use test_reader::TestStdInReader;

/// Source of the document text for `fmt`.
pub trait StdInReader: Clone + Send + Sync {
  fn read(&self) -> Result<String>;
}

#[derive(Default, Clone, Copy)]
pub struct RealStdInReader;

impl StdInReader for RealStdInReader {
  fn read(&self) -> Result<String> {
    let mut bytes = Vec::new();
    std::io::stdin().lock().read_to_end(&mut bytes).context("Failed reading stdin.")?;
    decode_document_text(bytes)
  }
}

fn decode_document_text(bytes: Vec<u8>) -> Result<String> {
  match String::from_utf8(bytes) {
    Ok(text) => Ok(text),
    Err(err) => bail!("The text provided on stdin was not valid UTF-8 (byte {}).", err.utf8_error().valid_up_to()),
  }
}
