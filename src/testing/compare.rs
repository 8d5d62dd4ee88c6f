//! Tree comparison for fixture testing: did the transformation under test
//! produce exactly the golden tree?

use std::{collections::BTreeSet, fs, path::Path};

use crate::error::Result;
use crate::util::fs_ops::walk_files;

/// Result of comparing an actual resulting tree to its golden counterpart.
#[derive(Debug, Clone)]
pub struct CompareResult {
   /// Files present in golden but missing from actual.
   pub missing: Vec<String>,
   /// Files present in actual but absent from golden.
   pub unexpected: Vec<String>,
   /// Files present in both whose contents differ.
   pub differing: Vec<String>,
   /// Overall pass/fail.
   pub passed: bool,
   /// Human-readable summary.
   pub summary: String,
}

/// Compare an actual resulting tree to its golden tree, relative path by
/// relative path.
pub fn compare_trees(actual_root: &Path, golden_root: &Path) -> Result<CompareResult> {
   let actual_files: BTreeSet<String> = walk_files(actual_root)?.into_iter().map(|p| path_to_slash(&p)).collect();
   let golden_files: BTreeSet<String> = walk_files(golden_root)?.into_iter().map(|p| path_to_slash(&p)).collect();

   let missing: Vec<String> = golden_files.difference(&actual_files).cloned().collect();
   let unexpected: Vec<String> = actual_files.difference(&golden_files).cloned().collect();

   let mut differing = Vec::new();
   for rel in actual_files.intersection(&golden_files) {
      let a = fs::read(actual_root.join(rel))?;
      let g = fs::read(golden_root.join(rel))?;
      if a != g {
         differing.push(rel.clone());
      }
   }
   differing.sort();

   let passed = missing.is_empty() && unexpected.is_empty() && differing.is_empty();
   let summary = if passed {
      format!("✓ {} files match golden", actual_files.len())
   } else {
      format!(
         "✗ {} missing, {} unexpected, {} differing",
         missing.len(),
         unexpected.len(),
         differing.len()
      )
   };

   Ok(CompareResult { missing, unexpected, differing, passed, summary })
}

fn path_to_slash(path: &Path) -> String {
   path.to_string_lossy().replace('\\', "/")
}
