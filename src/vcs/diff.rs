//! Diff computation (§4.3.1), grounded on the teacher's `diff.rs`: the same
//! `diff --git a/X b/Y` / `index ` / `new file` / `deleted file` / `rename`
//! / `+++`/`---` / `@@` scanning approach, generalized from "diff of a git
//! repo's working tree" to "diff of two sibling directories via
//! `git diff --no-index`".

use std::path::Path;
use std::process::Command;

use crate::config::CopybaraConfig;
use crate::error::{CopybaraError, Result};

/// How a path changed between the two trees (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
   Add,
   Delete,
   Modified,
}

/// A record produced by `diff_files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFile {
   pub name: String,
   pub operation: Operation,
}

/// Produce a unified diff over two sibling directories (§4.3.1). `left`
/// and `right` must share a parent directory; otherwise `PathsNotSiblings`.
/// Uses `--` to terminate options so directory names starting with `-` are
/// treated as data, not flags.
pub fn diff(config: &CopybaraConfig, left: &Path, right: &Path, verbose: bool, env: &[(String, String)]) -> Result<Vec<u8>> {
   let parent = siblings_parent(left, right)?;

   let left_name = left.file_name().and_then(|n| n.to_str()).unwrap_or_default();
   let right_name = right.file_name().and_then(|n| n.to_str()).unwrap_or_default();

   let mut cmd = Command::new(&config.git_bin);
   cmd.current_dir(&parent);
   for (k, v) in env {
      cmd.env(k, v);
   }
   cmd.arg("diff").arg("--no-index").arg("--no-color").arg("--no-prefix");
   if verbose {
      cmd.arg("--stat");
   }
   cmd.arg("--").arg(left_name).arg(right_name);

   let output = cmd.output().map_err(|e| CopybaraError::Other(format!("failed to spawn git: {e}")))?;
   // git diff --no-index: 0 = no differences, 1 = differences found, >1 = error.
   match output.status.code() {
      Some(0) | Some(1) => Ok(output.stdout),
      _ => Err(CopybaraError::subprocess("git", output.status.code().unwrap_or(-1), String::from_utf8_lossy(&output.stderr))),
   }
}

fn siblings_parent(left: &Path, right: &Path) -> Result<std::path::PathBuf> {
   let left_parent = left.parent();
   let right_parent = right.parent();
   match (left_parent, right_parent) {
      (Some(l), Some(r)) if l == r => Ok(l.to_path_buf()),
      _ => Err(CopybaraError::validation(
         format!("{}, {}", left.display(), right.display()),
         "PathsNotSiblings: left and right must share a parent directory",
      )),
   }
}

/// Classify every path touched between `left` and `right` as Add, Delete,
/// or Modified; copies and unchanged paths are omitted. Moves are reported
/// as a paired Delete+Add (rename detection is parsed but not merged into a
/// single "Rename" record, matching the spec's `DiffFile` shape which has
/// no `Rename` variant).
pub fn diff_files(config: &CopybaraConfig, left: &Path, right: &Path, env: &[(String, String)]) -> Result<Vec<DiffFile>> {
   let bytes = diff(config, left, right, false, env)?;
   Ok(parse_diff_files(&String::from_utf8_lossy(&bytes)))
}

fn parse_diff_files(text: &str) -> Vec<DiffFile> {
   let mut out = Vec::new();
   let mut current_path: Option<String> = None;
   let mut is_new = false;
   let mut is_deleted = false;
   let mut is_copy = false;

   let flush = |out: &mut Vec<DiffFile>, path: Option<String>, is_new: bool, is_deleted: bool, is_copy: bool| {
      if is_copy {
         return;
      }
      if let Some(path) = path {
         if is_new {
            out.push(DiffFile { name: path, operation: Operation::Add });
         } else if is_deleted {
            out.push(DiffFile { name: path, operation: Operation::Delete });
         } else {
            out.push(DiffFile { name: path, operation: Operation::Modified });
         }
      }
   };

   for line in text.lines() {
      if let Some(rest) = line.strip_prefix("diff --git ") {
         flush(&mut out, current_path.take(), is_new, is_deleted, is_copy);
         is_new = false;
         is_deleted = false;
         is_copy = false;

         let mut parts = rest.split(' ');
         current_path = parts.next_back().map(str::to_string);
      } else if line.starts_with("new file mode") {
         is_new = true;
      } else if line.starts_with("deleted file mode") {
         is_deleted = true;
      } else if line.starts_with("copy from") || line.starts_with("copy to") || line.starts_with("similarity index") {
         is_copy = true;
      } else if let Some(rest) = line.strip_prefix("rename from ") {
         // The delete side of a move. The `diff --git` header gives the
         // *destination* path for this block (`b/Y`), so the source path
         // must come from this line itself, not `current_path`. A rename
         // block has no content hunks, so flush it here as a Delete and
         // let the matching "rename to" line surface as the paired Add.
         current_path.take();
         out.push(DiffFile { name: rest.to_string(), operation: Operation::Delete });
      } else if let Some(rest) = line.strip_prefix("rename to ") {
         out.push(DiffFile { name: rest.to_string(), operation: Operation::Add });
      }
   }
   flush(&mut out, current_path.take(), is_new, is_deleted, is_copy);

   out
}

/// Walk a diff's `diff --git a/X b/Y` blocks and retain only those whose
/// path satisfies `keep`.
pub fn filter_diff(bytes: &[u8], keep: impl Fn(&str) -> bool) -> String {
   let text = String::from_utf8_lossy(bytes);
   let mut out = String::new();
   let mut keep_block = true;

   for line in text.lines() {
      if let Some(rest) = line.strip_prefix("diff --git ") {
         let path = rest.split(' ').next_back().unwrap_or_default();
         keep_block = keep(path);
      }
      if keep_block {
         out.push_str(line);
         out.push('\n');
      }
   }
   out
}

#[cfg(test)]
mod tests {
   use super::*;

   const SAMPLE: &str = "diff --git a/foo.txt b/foo.txt\n\
index abc123..def456 100644\n\
--- a/foo.txt\n\
+++ b/foo.txt\n\
@@ -1 +1 @@\n\
-old\n\
+new\n\
diff --git a/new.txt b/new.txt\n\
new file mode 100644\n\
index 0000000..abc123\n\
--- /dev/null\n\
+++ b/new.txt\n\
@@ -0,0 +1 @@\n\
+added\n\
diff --git a/gone.txt b/gone.txt\n\
deleted file mode 100644\n\
index abc123..0000000\n\
--- a/gone.txt\n\
+++ /dev/null\n\
@@ -1 +0,0 @@\n\
-removed\n";

   #[test]
   fn parse_diff_files_classifies_add_delete_modified() {
      let files = parse_diff_files(SAMPLE);
      assert_eq!(
         files,
         vec![
            DiffFile { name: "foo.txt".to_string(), operation: Operation::Modified },
            DiffFile { name: "new.txt".to_string(), operation: Operation::Add },
            DiffFile { name: "gone.txt".to_string(), operation: Operation::Delete },
         ]
      );
   }

   #[test]
   fn parse_diff_files_pairs_rename_as_delete_and_add() {
      let text = "diff --git a/old.txt b/new.txt\n\
similarity index 100%\n\
rename from old.txt\n\
rename to new.txt\n";
      let files = parse_diff_files(text);
      assert_eq!(
         files,
         vec![
            DiffFile { name: "old.txt".to_string(), operation: Operation::Delete },
            DiffFile { name: "new.txt".to_string(), operation: Operation::Add },
         ]
      );
   }

   #[test]
   fn parse_diff_files_omits_copies() {
      let text = "diff --git a/src.txt b/dst.txt\n\
similarity index 100%\n\
copy from src.txt\n\
copy to dst.txt\n";
      assert!(parse_diff_files(text).is_empty());
   }

   #[test]
   fn filter_diff_keeps_only_matching_blocks() {
      let out = filter_diff(SAMPLE.as_bytes(), |path| path == "new.txt");
      assert!(out.contains("new.txt"));
      assert!(!out.contains("foo.txt"));
      assert!(!out.contains("gone.txt"));
   }
}
