//! Checkout hook runner (§6): a caller-supplied relative path to an
//! executable inside the checkout root.

use std::path::Path;
use std::process::Command;

use crate::error::{CopybaraError, Result};
use crate::util::path_safety::validate_relative;

/// Run the hook at `relative_path` (relative to `checkout_root`) with the
/// checkout as working directory. `env` is passed explicitly; this code
/// never reads or mutates the ambient process environment (§6).
pub fn run_checkout_hook(
   checkout_root: &Path,
   relative_path: &str,
   env: &[(String, String)],
) -> Result<()> {
   let rel = validate_relative(relative_path, false)
      .map_err(|_| CopybaraError::user_config("hook", format!("InvalidHookPath: {relative_path}")))?;

   let hook_path = checkout_root.join(&rel);
   if !hook_path.starts_with(checkout_root) {
      return Err(CopybaraError::user_config("hook", format!("InvalidHookPath: {relative_path}")));
   }
   if !hook_path.is_file() {
      return Err(CopybaraError::user_config("hook", format!("InvalidHookPath: {relative_path} not found")));
   }

   let mut cmd = Command::new(&hook_path);
   cmd.current_dir(checkout_root).env_clear();
   for (key, value) in env {
      cmd.env(key, value);
   }

   let output = cmd
      .output()
      .map_err(|e| CopybaraError::Other(format!("failed to spawn hook {relative_path}: {e}")))?;

   if !output.status.success() {
      let exit_code = output.status.code().unwrap_or(-1);
      return Err(CopybaraError::subprocess("checkout-hook", exit_code, String::from_utf8_lossy(&output.stderr)));
   }

   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs;

   #[test]
   fn rejects_path_outside_checkout() {
      let tmp = std::env::temp_dir().join("copybara-hook-test-escape");
      fs::create_dir_all(&tmp).expect("mkdir");
      let err = run_checkout_hook(&tmp, "../outside", &[]).expect_err("should reject");
      assert!(matches!(err, CopybaraError::UserConfig { .. }));
      fs::remove_dir_all(&tmp).ok();
   }

   #[test]
   fn rejects_missing_hook() {
      let tmp = std::env::temp_dir().join("copybara-hook-test-missing");
      fs::create_dir_all(&tmp).expect("mkdir");
      let err = run_checkout_hook(&tmp, "does-not-exist.sh", &[]).expect_err("should reject");
      assert!(matches!(err, CopybaraError::UserConfig { .. }));
      fs::remove_dir_all(&tmp).ok();
   }
}
