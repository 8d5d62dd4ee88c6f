//! Three-way merge (§4.3.3), grounded on `martinvonz-jj`'s
//! `merge_tools/external.rs` pattern of shelling out to a merge tool with
//! base/left/right files on disk and reading back the result, here
//! specialized to GNU `diff3 -m`.
//!
//! The spec names two merge strategies, `ApplyDestinationPatch` and
//! `MergeImportTool`, as separate components. Resolved in DESIGN.md as two
//! variants of one `MergeBackend` sharing a single `merge()` contract: they
//! differ only in which two sides they treat as the "patch" versus the
//! "base", not in the mechanics of producing a result.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::CopybaraConfig;
use crate::error::{CopybaraError, Result};
use crate::util::fs_ops::walk_files;
use crate::vcs::patch;

/// Outcome of a single-file merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
   /// No conflict markers; `content` is the merged file.
   Clean(Vec<u8>),
   /// Conflict markers (`<<<<<<<` / `=======` / `>>>>>>>`) are present in
   /// `content`.
   Conflicted(Vec<u8>),
   /// `diff3` exited 2 (binary-file policy, §4.3.3): the file is left
   /// untouched in `origin` and a warning should be logged by the caller.
   Skipped,
}

/// Which strategy produced the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeBackend {
   /// Treat `theirs` as a patch computed against `base` and apply it on
   /// top of `ours` via `patch --merge` (§4.3.2/§4.3.3), a two-way
   /// operation framed as a merge because the caller already knows which
   /// side is "new". Produces hunk-level conflict markers, not a
   /// whole-file fallback.
   ApplyDestinationPatch,
   /// A genuine three-way merge of `base`/`ours`/`theirs` via `diff3 -m`,
   /// used when both sides may have diverged independently.
   MergeImportTool,
}

impl MergeBackend {
   pub fn merge(&self, config: &CopybaraConfig, base: &[u8], ours: &[u8], theirs: &[u8]) -> Result<MergeOutcome> {
      match self {
         Self::ApplyDestinationPatch => apply_destination_patch(config, base, ours, theirs),
         Self::MergeImportTool => diff3_merge(config, base, ours, theirs),
      }
   }
}

fn apply_destination_patch(config: &CopybaraConfig, base: &[u8], ours: &[u8], theirs: &[u8]) -> Result<MergeOutcome> {
   let dir = tempdir("apply-dest-patch")?;
   let base_path = dir.join("base");
   let destination_path = dir.join("destination");
   fs::write(&base_path, base)?;
   fs::write(&destination_path, theirs)?;

   // Diff base -> destination, labeled so its hunks target a file named
   // "destination"; applying that diff onto a copy of `ours` saved under
   // the same name patches ours with destination's changes.
   let diff = crate::vcs::diff::diff(config, &base_path, &destination_path, false, &[])?;
   let work_dir = dir.join("work");
   fs::create_dir_all(&work_dir)?;
   let target = work_dir.join("destination");
   fs::write(&target, ours)?;

   let conflicted = patch::patch_merge(config, &work_dir, &diff, 0)?;
   let merged = fs::read(&target)?;
   fs::remove_dir_all(&dir).ok();

   if conflicted { Ok(MergeOutcome::Conflicted(merged)) } else { Ok(MergeOutcome::Clean(merged)) }
}

fn diff3_merge(config: &CopybaraConfig, base: &[u8], ours: &[u8], theirs: &[u8]) -> Result<MergeOutcome> {
   let dir = tempdir("diff3-merge")?;
   let base_path = dir.join("base");
   let ours_path = dir.join("ours");
   let theirs_path = dir.join("theirs");
   fs::write(&base_path, base)?;
   fs::write(&ours_path, ours)?;
   fs::write(&theirs_path, theirs)?;

   let output = Command::new(&config.diff3_bin)
      .arg("-m")
      .arg(&ours_path)
      .arg(&base_path)
      .arg(&theirs_path)
      .output()
      .map_err(|e| CopybaraError::Other(format!("failed to spawn diff3: {e}")))?;

   fs::remove_dir_all(&dir).ok();

   // diff3 -m: 0 = clean merge, 1 = conflicts present, 2 = binary/unmergeable
   // (skip, leave origin untouched), other = genuine error.
   match output.status.code() {
      Some(0) => Ok(MergeOutcome::Clean(output.stdout)),
      Some(1) => Ok(MergeOutcome::Conflicted(output.stdout)),
      Some(2) => Ok(MergeOutcome::Skipped),
      _ => Err(CopybaraError::subprocess("diff3", output.status.code().unwrap_or(-1), String::from_utf8_lossy(&output.stderr))),
   }
}

fn tempdir(label: &str) -> Result<std::path::PathBuf> {
   let dir = std::env::temp_dir().join(format!("copybara-{label}-{}-{}", std::process::id(), label.len()));
   fs::create_dir_all(&dir)?;
   Ok(dir)
}

/// Per-path outcomes from a whole-tree `merge_tree` run, for the caller to
/// report.
#[derive(Debug, Clone, Default)]
pub struct TreeMergeOutcome {
   /// Paths whose three-way merge produced conflict markers.
   pub conflicted: Vec<String>,
   /// Paths `diff3` skipped (binary-file policy, §4.3.3).
   pub skipped: Vec<String>,
}

/// `MergeImportTool` as a directory-tree operation (§4.3.3): merges
/// `destination` into `origin` using `baseline` as the common ancestor,
/// mutating `origin` in place. For every path in the union of the three
/// trees:
/// - present only in `destination` -> copied into `origin`.
/// - present in `baseline` and `destination` but not `origin` -> an
///   intentional local removal; left absent from `origin`.
/// - present in all three -> three-way merged via `diff3 -m`.
///
/// Paths in any other combination (origin-only, or present in exactly one
/// of baseline/destination alongside origin) are left untouched: the spec
/// only prescribes an action for the three cases above.
pub fn merge_tree(config: &CopybaraConfig, baseline: &Path, origin: &Path, destination: &Path) -> Result<TreeMergeOutcome> {
   use std::collections::BTreeSet;

   let baseline_files: BTreeSet<PathBuf> = walk_files(baseline)?.into_iter().collect();
   let origin_files: BTreeSet<PathBuf> = walk_files(origin)?.into_iter().collect();
   let destination_files: BTreeSet<PathBuf> = walk_files(destination)?.into_iter().collect();

   let mut union: BTreeSet<PathBuf> = BTreeSet::new();
   union.extend(baseline_files.iter().cloned());
   union.extend(origin_files.iter().cloned());
   union.extend(destination_files.iter().cloned());

   let mut outcome = TreeMergeOutcome::default();

   for rel in union {
      let in_baseline = baseline_files.contains(&rel);
      let in_origin = origin_files.contains(&rel);
      let in_destination = destination_files.contains(&rel);

      if in_destination && !in_baseline && !in_origin {
         let dst = origin.join(&rel);
         if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
         }
         fs::copy(destination.join(&rel), &dst)?;
      } else if in_baseline && in_destination && !in_origin {
         // Intentional removal: origin already lacks this path, nothing to do.
      } else if in_baseline && in_origin && in_destination {
         let base_bytes = fs::read(baseline.join(&rel))?;
         let origin_bytes = fs::read(origin.join(&rel))?;
         let destination_bytes = fs::read(destination.join(&rel))?;
         let rel_name = rel.display().to_string();
         match MergeBackend::MergeImportTool.merge(config, &base_bytes, &origin_bytes, &destination_bytes)? {
            MergeOutcome::Clean(content) => fs::write(origin.join(&rel), content)?,
            MergeOutcome::Conflicted(content) => {
               fs::write(origin.join(&rel), content)?;
               outcome.conflicted.push(rel_name);
            },
            MergeOutcome::Skipped => outcome.skipped.push(rel_name),
         }
      }
   }

   Ok(outcome)
}
