//! Shared file copy / move semantics (§2 component E): the primitives that
//! `Move`/`Copy`/`Rename` build on, factored out so both can share the same
//! "does the destination already exist, is it a directory merge" logic.

use std::fs;
use std::path::Path;

use crate::error::{CopybaraError, Result};

/// Recursively copy `src` (file or directory) into `dst`. If both are
/// directories, `src`'s contents are merged into `dst`. If `dst` is an
/// existing file, fails unless `overwrite` is set.
pub fn copy_recursive(src: &Path, dst: &Path, overwrite: bool) -> Result<()> {
   let meta = fs::symlink_metadata(src)
      .map_err(|e| CopybaraError::validation(src.display().to_string(), format!("source does not exist: {e}")))?;

   if meta.is_dir() {
      fs::create_dir_all(dst)?;
      for entry in fs::read_dir(src)? {
         let entry = entry?;
         let child_dst = dst.join(entry.file_name());
         copy_recursive(&entry.path(), &child_dst, overwrite)?;
      }
      return Ok(());
   }

   if dst.is_dir() {
      return Err(CopybaraError::validation(
         dst.display().to_string(),
         "destination is an existing directory, cannot overwrite with a file",
      ));
   }
   if dst.exists() && !overwrite {
      return Err(CopybaraError::validation(
         dst.display().to_string(),
         "destination already exists (pass overwrite=true to replace it)",
      ));
   }

   if let Some(parent) = dst.parent() {
      fs::create_dir_all(parent)?;
   }
   fs::copy(src, dst)?;
   Ok(())
}

/// Move `src` into `dst` using the same merge/overwrite rules as
/// `copy_recursive`, then delete `src`. If `src` is a directory and ends up
/// empty after the move, it is removed.
pub fn move_recursive(src: &Path, dst: &Path, overwrite: bool) -> Result<()> {
   copy_recursive(src, dst, overwrite)?;
   remove_recursive(src)?;
   Ok(())
}

/// Remove a file or directory tree.
pub fn remove_recursive(path: &Path) -> Result<()> {
   let meta = match fs::symlink_metadata(path) {
      Ok(meta) => meta,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
      Err(e) => return Err(e.into()),
   };

   if meta.is_dir() {
      fs::remove_dir_all(path)?;
   } else {
      fs::remove_file(path)?;
   }
   Ok(())
}

/// Remove `dir` if it exists and is empty; no-op (not an error) otherwise.
pub fn remove_if_empty_dir(dir: &Path) {
   if let Ok(mut entries) = fs::read_dir(dir)
      && entries.next().is_none()
   {
      let _ = fs::remove_dir(dir);
   }
}

/// Recursively list every regular file under `root`, relative to `root`,
/// following directories but never following symlinks (§4.3.4 generation
/// walk policy: "following only non-symlink directories and skipping all
/// symlinks").
pub fn walk_files(root: &Path) -> Result<Vec<std::path::PathBuf>> {
   let mut out = Vec::new();
   walk_files_inner(root, Path::new(""), &mut out)?;
   out.sort();
   Ok(out)
}

fn walk_files_inner(root: &Path, rel: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
   let dir = root.join(rel);
   for entry in fs::read_dir(&dir)? {
      let entry = entry?;
      let meta = entry.metadata()?;
      let child_rel = rel.join(entry.file_name());
      if meta.is_symlink() {
         continue;
      }
      if meta.is_dir() {
         walk_files_inner(root, &child_rel, out)?;
      } else if meta.is_file() {
         out.push(child_rel);
      }
   }
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs;

   fn tmp_dir(name: &str) -> std::path::PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-fs-ops-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn copy_file_respects_overwrite() {
      let dir = tmp_dir("copy-file");
      let src = dir.join("src.txt");
      let dst = dir.join("dst.txt");
      fs::write(&src, b"hello").expect("write src");
      fs::write(&dst, b"existing").expect("write dst");

      assert!(copy_recursive(&src, &dst, false).is_err());
      copy_recursive(&src, &dst, true).expect("overwrite copy");
      assert_eq!(fs::read(&dst).expect("read"), b"hello");
      fs::remove_dir_all(&dir).ok();
   }

   #[test]
   fn move_merges_directories() {
      let dir = tmp_dir("move-merge");
      let src = dir.join("src");
      let dst = dir.join("dst");
      fs::create_dir_all(src.join("nested")).expect("mkdir");
      fs::write(src.join("a.txt"), b"a").expect("write");
      fs::write(src.join("nested/b.txt"), b"b").expect("write");
      fs::create_dir_all(&dst).expect("mkdir dst");

      move_recursive(&src, &dst, false).expect("move");
      assert!(!src.exists());
      assert_eq!(fs::read(dst.join("a.txt")).expect("read"), b"a");
      assert_eq!(fs::read(dst.join("nested/b.txt")).expect("read"), b"b");
      fs::remove_dir_all(&dir).ok();
   }

   #[test]
   fn walk_files_skips_symlinks() {
      let dir = tmp_dir("walk");
      fs::write(dir.join("a.txt"), b"a").expect("write");
      fs::create_dir_all(dir.join("sub")).expect("mkdir");
      fs::write(dir.join("sub/b.txt"), b"b").expect("write");

      let files = walk_files(&dir).expect("walk");
      assert_eq!(files, vec![std::path::PathBuf::from("a.txt"), std::path::PathBuf::from("sub/b.txt")]);
      fs::remove_dir_all(&dir).ok();
   }
}
