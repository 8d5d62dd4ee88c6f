use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CopybaraError, Result};

/// Host configuration: subprocess binaries, timeouts, and the output-size
/// cap used by the stdout/stderr limiter (§5). This is deliberately *not*
/// the declarative workflow/DSL surface — that evaluator lives outside this
/// crate and produces the Glob/Transformation values directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CopybaraConfig {
   /// Path or bare name used to invoke `git` (resolved via `PATH` if bare).
   pub git_bin: String,
   /// Path or bare name used to invoke GNU `patch`.
   pub patch_bin: String,
   /// Path or bare name used to invoke `diff3`.
   pub diff3_bin: String,

   /// Base URL for the API transport client.
   pub api_base_url: String,
   /// Bearer token, if the configured `CredentialIssuer` is a static one.
   pub api_token: Option<String>,

   /// Per-subprocess timeout in seconds.
   pub subprocess_timeout_secs: u64,
   /// Per-HTTP-call timeout in seconds.
   pub http_timeout_secs: u64,
   /// Connect timeout in seconds, for the HTTP client.
   pub http_connect_timeout_secs: u64,

   /// Byte cap for `LimitFilterOutputStream` before truncation.
   pub output_stream_cap_bytes: usize,

   /// GNU patch version below which the selection policy prefers `git apply`
   /// (§4.3.2). Parsed as `major * 100 + minor`, e.g. `2.7` -> `207`.
   pub min_gnu_patch_version: u32,

   /// Skip the GNU patch version probe entirely and always prefer GNU patch
   /// when no excludes are present.
   #[serde(default)]
   pub skip_version_check: bool,

   /// Default pagination page size used when a caller doesn't specify one.
   pub default_per_page: u32,
}

impl Default for CopybaraConfig {
   fn default() -> Self {
      Self {
         git_bin: "git".to_string(),
         patch_bin: "patch".to_string(),
         diff3_bin: "diff3".to_string(),
         api_base_url: String::new(),
         api_token: None,
         subprocess_timeout_secs: 120,
         http_timeout_secs: 60,
         http_connect_timeout_secs: 15,
         output_stream_cap_bytes: 1024 * 1024,
         min_gnu_patch_version: 207,
         skip_version_check: false,
         default_per_page: 50,
      }
   }
}

impl CopybaraConfig {
   /// Load config from the default location, applying environment overrides.
   /// Falls back to `Default` if no file exists or no home directory can be
   /// determined. Environment variables override config-file values:
   /// - `COPYBARA_GIT_BIN` overrides `git_bin`
   /// - `COPYBARA_PATCH_BIN` overrides `patch_bin`
   /// - `COPYBARA_DIFF3_BIN` overrides `diff3_bin`
   /// - `COPYBARA_API_URL` overrides `api_base_url`
   /// - `COPYBARA_API_TOKEN` overrides `api_token`
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("COPYBARA_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_default()
      };

      let mut config = if config_path.exists() { Self::from_file(&config_path)? } else { Self::default() };

      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   fn apply_env_overrides(config: &mut Self) {
      if let Ok(bin) = std::env::var("COPYBARA_GIT_BIN") {
         config.git_bin = bin;
      }
      if let Ok(bin) = std::env::var("COPYBARA_PATCH_BIN") {
         config.patch_bin = bin;
      }
      if let Ok(bin) = std::env::var("COPYBARA_DIFF3_BIN") {
         config.diff3_bin = bin;
      }
      if let Ok(url) = std::env::var("COPYBARA_API_URL") {
         config.api_base_url = url;
      }
      if let Ok(token) = std::env::var("COPYBARA_API_TOKEN") {
         config.api_token = Some(token);
      }
   }

   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path)
         .map_err(|e| CopybaraError::Other(format!("failed to read config {}: {e}", path.display())))?;
      let mut config: Self = toml::from_str(&contents)?;
      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   /// Default config path (`~/.config/copybara/config.toml`), platform-safe:
   /// tries `HOME` then `USERPROFILE`.
   pub fn default_config_path() -> Result<PathBuf> {
      if let Ok(home) = std::env::var("HOME") {
         return Ok(PathBuf::from(home).join(".config/copybara/config.toml"));
      }
      if let Ok(home) = std::env::var("USERPROFILE") {
         return Ok(PathBuf::from(home).join(".config/copybara/config.toml"));
      }
      Err(CopybaraError::Other("no home directory found (tried HOME and USERPROFILE)".to_string()))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults_are_sane() {
      let cfg = CopybaraConfig::default();
      assert_eq!(cfg.git_bin, "git");
      assert_eq!(cfg.default_per_page, 50);
      assert!(!cfg.skip_version_check);
   }

   #[test]
   fn env_overrides_apply() {
      // SAFETY: test runs single-threaded per-process env var mutation is fine here.
      unsafe {
         std::env::set_var("COPYBARA_GIT_BIN", "/opt/git/bin/git");
      }
      let mut cfg = CopybaraConfig::default();
      CopybaraConfig::apply_env_overrides(&mut cfg);
      assert_eq!(cfg.git_bin, "/opt/git/bin/git");
      unsafe {
         std::env::remove_var("COPYBARA_GIT_BIN");
      }
   }
}
