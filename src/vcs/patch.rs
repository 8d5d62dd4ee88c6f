//! Patch application (§4.3.2), grounded on the teacher's `patch.rs`: the
//! same subprocess invocation shape (`Command::new(bin).args([...])`,
//! stderr captured via `String::from_utf8_lossy`), generalized from "apply
//! a commit-message patch to a git worktree" to "apply an arbitrary unified
//! diff to any directory, git repo or not" under the documented applier
//! selection policy (§4.3.2).

use std::path::Path;
use std::process::{Command, Output};

use crate::config::CopybaraConfig;
use crate::error::{CopybaraError, Result};

/// Which tool actually applied the patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applier {
   GitApply,
   GnuPatch,
}

/// Apply `diff_bytes` to `checkout_root` under the applier selection
/// policy (§4.3.2): a non-empty `excluded` forces `git apply` (GNU patch
/// has no path-exclusion support); otherwise GNU patch is used when
/// `config.skip_version_check` is set or the probed `patch` binary's
/// version meets `config.min_gnu_patch_version`, falling back to
/// `git apply` otherwise. `strip_slashes` is the leading-path-component
/// count (`-p<N>`) both tools are invoked with; `git_dir` sets `git`'s
/// `--git-dir` when `checkout_root` is not itself a git worktree.
pub fn patch(
   config: &CopybaraConfig,
   checkout_root: &Path,
   diff_bytes: &[u8],
   reverse: bool,
   excluded: &[String],
   strip_slashes: u32,
   git_dir: Option<&Path>,
) -> Result<Applier> {
   match select_applier(config, excluded) {
      Applier::GitApply => {
         try_git_apply(config, checkout_root, diff_bytes, reverse, excluded, strip_slashes, git_dir)?;
         Ok(Applier::GitApply)
      },
      Applier::GnuPatch => {
         try_gnu_patch(config, checkout_root, diff_bytes, reverse, strip_slashes)?;
         Ok(Applier::GnuPatch)
      },
   }
}

/// Apply `diff_bytes` onto the single file at `checkout_root`'s patch
/// target via GNU `patch --merge` (§4.3.3 `ApplyDestinationPatch`), which
/// writes standard conflict markers on hunks that fail to apply cleanly
/// instead of rejecting the whole file. Returns whether any hunk
/// conflicted.
pub fn patch_merge(config: &CopybaraConfig, checkout_root: &Path, diff_bytes: &[u8], strip_slashes: u32) -> Result<bool> {
   let mut cmd = Command::new(&config.patch_bin);
   cmd.current_dir(checkout_root).arg(format!("-p{strip_slashes}")).arg("--merge").arg("--no-backup-if-mismatch");
   let output = run_with_stdin(cmd, diff_bytes, "patch")?;
   // GNU patch --merge: 0 = every hunk applied cleanly, 1 = some hunks were
   // written as conflict markers instead of failing, >1 = genuine error.
   match output.status.code() {
      Some(0) => Ok(false),
      Some(1) => Ok(true),
      _ => Err(CopybaraError::subprocess("patch", output.status.code().unwrap_or(-1), String::from_utf8_lossy(&output.stderr))),
   }
}

fn select_applier(config: &CopybaraConfig, excluded: &[String]) -> Applier {
   if !excluded.is_empty() {
      return Applier::GitApply;
   }
   if config.skip_version_check {
      return Applier::GnuPatch;
   }
   match probe_gnu_patch_version(config) {
      Ok(version) if version >= config.min_gnu_patch_version => Applier::GnuPatch,
      _ => Applier::GitApply,
   }
}

fn probe_gnu_patch_version(config: &CopybaraConfig) -> Result<u32> {
   let output = Command::new(&config.patch_bin)
      .arg("--version")
      .output()
      .map_err(|e| CopybaraError::Other(format!("failed to spawn {}: {e}", config.patch_bin)))?;
   parse_patch_version(&String::from_utf8_lossy(&output.stdout))
      .ok_or_else(|| CopybaraError::Other("could not parse `patch --version` output".to_string()))
}

/// Parse the `major * 100 + minor` version out of GNU patch's banner line
/// (e.g. `"GNU patch 2.7.6"` -> `207`).
fn parse_patch_version(text: &str) -> Option<u32> {
   let version_str = text.lines().next()?.split_whitespace().last()?;
   let mut parts = version_str.split('.');
   let major: u32 = parts.next()?.parse().ok()?;
   let minor: u32 = parts.next()?.parse().ok()?;
   Some(major * 100 + minor)
}

fn try_git_apply(
   config: &CopybaraConfig,
   checkout_root: &Path,
   diff_bytes: &[u8],
   reverse: bool,
   excluded: &[String],
   strip_slashes: u32,
   git_dir: Option<&Path>,
) -> Result<()> {
   let mut cmd = Command::new(&config.git_bin);
   if let Some(dir) = git_dir {
      cmd.arg("--git-dir").arg(dir);
   }
   cmd.current_dir(checkout_root).arg("apply").arg("--whitespace=nowarn").arg(format!("-p{strip_slashes}"));
   if reverse {
      cmd.arg("--reverse");
   }
   for pattern in excluded {
      cmd.arg(format!("--exclude={pattern}"));
   }
   let output = run_with_stdin(cmd, diff_bytes, "git")?;
   if output.status.success() {
      Ok(())
   } else {
      Err(CopybaraError::subprocess("git", output.status.code().unwrap_or(-1), String::from_utf8_lossy(&output.stderr)))
   }
}

fn try_gnu_patch(config: &CopybaraConfig, checkout_root: &Path, diff_bytes: &[u8], reverse: bool, strip_slashes: u32) -> Result<()> {
   let mut cmd = Command::new(&config.patch_bin);
   cmd.current_dir(checkout_root).arg(format!("-p{strip_slashes}")).arg("--no-backup-if-mismatch");
   if reverse {
      cmd.arg("--reverse");
   }
   let output = run_with_stdin(cmd, diff_bytes, "patch")?;
   if output.status.success() {
      Ok(())
   } else {
      Err(CopybaraError::subprocess("patch", output.status.code().unwrap_or(-1), String::from_utf8_lossy(&output.stderr)))
   }
}

fn run_with_stdin(mut cmd: Command, stdin_bytes: &[u8], tool: &'static str) -> Result<Output> {
   use std::io::Write;
   use std::process::Stdio;

   cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
   let mut child = cmd.spawn().map_err(|e| CopybaraError::Other(format!("failed to spawn {tool}: {e}")))?;
   child
      .stdin
      .take()
      .expect("piped stdin")
      .write_all(stdin_bytes)
      .map_err(|e| CopybaraError::Other(format!("failed to write {tool} stdin: {e}")))?;
   child.wait_with_output().map_err(|e| CopybaraError::Other(format!("failed to wait on {tool}: {e}")))
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs;

   fn tmp_dir(name: &str) -> std::path::PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-patch-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn applier_variants_are_distinguishable() {
      assert_ne!(Applier::GitApply, Applier::GnuPatch);
   }

   #[test]
   fn run_with_stdin_reports_subprocess_error_on_missing_binary() {
      let dir = tmp_dir("missing-bin");
      let cmd = Command::new("definitely-not-a-real-binary-xyz");
      assert!(run_with_stdin(cmd, b"", "ghost").is_err());
      fs::remove_dir_all(&dir).ok();
   }

   #[test]
   fn non_empty_excludes_force_git_apply_regardless_of_version_policy() {
      let mut config = CopybaraConfig::default();
      config.skip_version_check = true;
      assert_eq!(select_applier(&config, &["vendor/**".to_string()]), Applier::GitApply);
   }

   #[test]
   fn skip_version_check_selects_gnu_patch_when_no_excludes() {
      let mut config = CopybaraConfig::default();
      config.skip_version_check = true;
      assert_eq!(select_applier(&config, &[]), Applier::GnuPatch);
   }

   #[test]
   fn parse_patch_version_reads_major_minor() {
      assert_eq!(parse_patch_version("GNU patch 2.7.6\n"), Some(207));
      assert_eq!(parse_patch_version("patch 2.7\n"), Some(207));
      assert_eq!(parse_patch_version("garbage"), None);
   }
}
