use thiserror::Error;

/// The crate-wide error taxonomy.
///
/// Each variant corresponds to one of the error kinds in the core design:
/// bad user input is distinguished from runtime validation failures, from
/// subprocess/API transport failures, from plain IO. Propagation policy:
/// nothing in this crate catches and converts another component's error —
/// errors bubble to the caller.
#[derive(Debug, Error)]
pub enum CopybaraError {
   /// Bad pattern, non-relative path, empty string, unknown template group,
   /// unreversible composition declared reversible.
   #[error("invalid configuration in {component}: {detail}")]
   UserConfig { component: &'static str, detail: String },

   /// A precondition checked at runtime failed.
   #[error("validation failed for {path}: {detail}")]
   Validation { path: String, detail: String },

   /// A transformation was asked to reverse but its inputs forbid it.
   #[error("{what} is not reversible: {reason}")]
   NonReversible { what: String, reason: String },

   /// A transformation under `FAIL_IF_ANY_NOOP` did nothing.
   #[error("{what} did nothing and FAIL_IF_ANY_NOOP was set")]
   VoidOperation { what: String },

   /// External tool exited non-zero.
   #[error("{tool} failed (exit {exit_code}): {stderr}")]
   Subprocess { tool: &'static str, exit_code: i32, stderr: String },

   /// Remote HTTP failure.
   #[error("{method} {url} failed: HTTP {status}: {body}")]
   Api { method: String, url: String, status: u16, body: String },

   /// Invariant violation in a response (link header unparseable, next URL
   /// doesn't share base, etc).
   #[error("response verification failed for {url}: {detail}")]
   Verify { url: String, detail: String },

   /// Filesystem or network transport failure.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   Json(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   Http(#[from] reqwest::Error),

   #[error("TOML error: {0}")]
   Toml(#[from] toml::de::Error),

   #[error("{0}")]
   Other(String),
}

impl CopybaraError {
   pub fn user_config(component: &'static str, detail: impl Into<String>) -> Self {
      Self::UserConfig { component, detail: detail.into() }
   }

   pub fn validation(path: impl Into<String>, detail: impl Into<String>) -> Self {
      Self::Validation { path: path.into(), detail: detail.into() }
   }

   pub fn non_reversible(what: impl Into<String>, reason: impl Into<String>) -> Self {
      Self::NonReversible { what: what.into(), reason: reason.into() }
   }

   pub fn void_operation(what: impl Into<String>) -> Self {
      Self::VoidOperation { what: what.into() }
   }

   pub fn subprocess(tool: &'static str, exit_code: i32, stderr: impl Into<String>) -> Self {
      Self::Subprocess { tool, exit_code, stderr: stderr.into() }
   }
}

pub type Result<T> = std::result::Result<T, CopybaraError>;
