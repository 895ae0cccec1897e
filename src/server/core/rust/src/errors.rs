/* src/server/core/rust/src/errors.rs */

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicError {
  code: String,
  message: String,
  status: u16,
}

fn default_status(code: &str) -> u16 {
  match code {
    "VALIDATION_ERROR" => 400,
    "NOT_FOUND" => 404,
    "CONFLICT" => 409,
    "TRANSLATION_FAILED" => 502,
    "CONTENT_UNAVAILABLE" => 503,
    _ => 500,
  }
}

impl MosaicError {
  pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
    Self { code: code.into(), message: message.into(), status }
  }

  pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
    let code = code.into();
    let status = default_status(&code);
    Self { code, message: message.into(), status }
  }

  /// Rows or registry could not be fetched; the page must not partially render.
  pub fn content_unavailable(msg: impl Into<String>) -> Self {
    Self::with_code("CONTENT_UNAVAILABLE", msg)
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::with_code("VALIDATION_ERROR", msg)
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::with_code("NOT_FOUND", msg)
  }

  /// Compare-and-swap guard did not match the stored row.
  pub fn conflict(msg: impl Into<String>) -> Self {
    Self::with_code("CONFLICT", msg)
  }

  pub fn translation_failed(msg: impl Into<String>) -> Self {
    Self::with_code("TRANSLATION_FAILED", msg)
  }

  pub fn store(msg: impl Into<String>) -> Self {
    Self::with_code("STORE_ERROR", msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::with_code("INTERNAL_ERROR", msg)
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.status
  }

  pub fn is_conflict(&self) -> bool {
    self.code == "CONFLICT"
  }
}

impl fmt::Display for MosaicError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code, self.message)
  }
}

impl std::error::Error for MosaicError {}

impl From<serde_json::Error> for MosaicError {
  fn from(e: serde_json::Error) -> Self {
    Self::internal(format!("json: {e}"))
  }
}
