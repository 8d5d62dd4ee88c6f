//! Move/Copy/Remove/Rename (§4.2.1 rows 1-4): thin wrappers over
//! `util::fs_ops`'s merge/overwrite semantics and `util::path_safety`'s
//! validation, new domain logic with no direct teacher counterpart.

use std::path::PathBuf;

use super::{Status, TransformWork, Transformation};
use crate::error::{CopybaraError, Result};
use crate::util::{fs_ops, path_safety};

/// `Move(before, after, overwrite)` (§4.2.1). Reversible iff `overwrite`
/// was false: the reverse is `Move(after, before, false)`.
#[derive(Debug, Clone)]
pub struct Move {
   pub before: String,
   pub after: String,
   pub overwrite: bool,
}

impl Transformation for Move {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let before = path_safety::validate_relative(&self.before, false)?;
      let after = path_safety::validate_relative(&self.after, true)?;
      let src = work.checkout_root.join(&before);
      let dst = path_safety::resolve_in_checkout(&work.checkout_root, &after)?;

      if !src.exists() {
         if work.ignore_noop {
            return Ok(Status::Noop(format!("{}: source does not exist", self.before)));
         }
         return Err(CopybaraError::validation(self.before.clone(), "SourceDoesNotExist"));
      }

      fs_ops::move_recursive(&src, &dst, self.overwrite)?;
      if let Some(parent) = src.parent() {
         fs_ops::remove_if_empty_dir(parent);
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      if self.overwrite {
         return Err(CopybaraError::non_reversible(self.describe(), "overwrite=true discards the prior destination content"));
      }
      Ok(Box::new(Move { before: self.after.clone(), after: self.before.clone(), overwrite: false }))
   }

   fn describe(&self) -> String {
      format!("Move({} -> {})", self.before, self.after)
   }
}

/// `Copy(before, after, overwrite)` (§4.2.1). Only reversible via an
/// explicit counterpart (`ExplicitReversal`); a bare `Copy` has no implicit
/// reverse since the source is never removed.
#[derive(Debug, Clone)]
pub struct Copy {
   pub before: String,
   pub after: String,
   pub overwrite: bool,
}

impl Transformation for Copy {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let before = path_safety::validate_relative(&self.before, false)?;
      let after = path_safety::validate_relative(&self.after, true)?;
      let src = work.checkout_root.join(&before);
      let dst = path_safety::resolve_in_checkout(&work.checkout_root, &after)?;

      if !src.exists() {
         if work.ignore_noop {
            return Ok(Status::Noop(format!("{}: source does not exist", self.before)));
         }
         return Err(CopybaraError::validation(self.before.clone(), "SourceDoesNotExist"));
      }

      fs_ops::copy_recursive(&src, &dst, self.overwrite)?;
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Err(CopybaraError::non_reversible(self.describe(), "Copy has no implicit reverse; wrap it in ExplicitReversal"))
   }

   fn describe(&self) -> String {
      format!("Copy({} -> {})", self.before, self.after)
   }
}

/// `Remove(glob)` (§4.2.1). Never reversible on its own; only legal inside
/// an `ExplicitReversal`'s reverse branch.
#[derive(Debug, Clone)]
pub struct Remove {
   pub glob: crate::glob::Glob,
}

impl Transformation for Remove {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.glob)?;
      if files.is_empty() {
         return Ok(Status::Noop("Remove matched nothing".to_string()));
      }
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         fs_ops::remove_recursive(&abs)?;
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Err(CopybaraError::non_reversible(self.describe(), "Remove has no reverse; the forward transform must provide the counterpart"))
   }

   fn describe(&self) -> String {
      "Remove(glob)".to_string()
   }
}

/// `Rename(before, after, suffix, overwrite)` (§4.2.1): renames every file
/// whose basename equals (or, if `suffix`, ends with) `before`.
#[derive(Debug, Clone)]
pub struct Rename {
   pub before: String,
   pub after: String,
   pub suffix: bool,
   pub overwrite: bool,
}

impl Rename {
   fn matches_basename(&self, name: &str) -> bool {
      if self.suffix { name.ends_with(&self.before) } else { name == self.before }
   }

   fn renamed_basename(&self, name: &str) -> String {
      if self.suffix {
         let stem = &name[..name.len() - self.before.len()];
         format!("{stem}{}", self.after)
      } else {
         self.after.clone()
      }
   }
}

impl Transformation for Rename {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let all = crate::glob::Glob::new(["**/*"], Vec::<&str>::new())?;
      let files = work.find(&all)?;

      let mut matched = Vec::new();
      for rel in &files {
         if let Some(name) = rel.file_name().and_then(|n| n.to_str())
            && self.matches_basename(name)
         {
            matched.push(rel.clone());
         }
      }

      if matched.is_empty() {
         return Ok(Status::Noop("Rename matched no basenames".to_string()));
      }

      for rel in matched {
         let new_name = self.renamed_basename(rel.file_name().and_then(|n| n.to_str()).unwrap_or_default());
         let dst_rel: PathBuf = match rel.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from(&new_name),
            Some(parent) => parent.join(&new_name),
            None => PathBuf::from(&new_name),
         };
         let src = work.checkout_root.join(&rel);
         let dst = path_safety::resolve_in_checkout(&work.checkout_root, &dst_rel)?;
         fs_ops::move_recursive(&src, &dst, self.overwrite)?;
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      if self.overwrite {
         return Err(CopybaraError::non_reversible(self.describe(), "overwrite=true discards the prior destination content"));
      }
      Ok(Box::new(Rename { before: self.after.clone(), after: self.before.clone(), suffix: self.suffix, overwrite: false }))
   }

   fn describe(&self) -> String {
      format!("Rename({} -> {}, suffix={})", self.before, self.after, self.suffix)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::console::Console;
   use std::fs;

   fn tmp_dir(name: &str) -> PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-fileops-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn move_then_reverse_restores_original_layout() {
      let root = tmp_dir("move-reverse");
      fs::write(root.join("a.txt"), b"hi").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);

      let mv = Move { before: "a.txt".to_string(), after: "b.txt".to_string(), overwrite: false };
      mv.transform(&mut work).expect("move");
      assert!(root.join("b.txt").exists());
      assert!(!root.join("a.txt").exists());

      let reversed = mv.reverse().expect("reverse");
      reversed.transform(&mut work).expect("reverse move");
      assert!(root.join("a.txt").exists());
      assert!(!root.join("b.txt").exists());

      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn move_missing_source_fails_not_noop() {
      let root = tmp_dir("move-missing");
      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let mv = Move { before: "nope.txt".to_string(), after: "b.txt".to_string(), overwrite: false };
      assert!(mv.transform(&mut work).is_err());
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn move_missing_source_noops_when_ignore_noop_is_set() {
      let root = tmp_dir("move-missing-ignore-noop");
      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console).with_ignore_noop(true);
      let mv = Move { before: "nope.txt".to_string(), after: "b.txt".to_string(), overwrite: false };
      assert!(mv.transform(&mut work).expect("noop, not error").is_noop());
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn copy_missing_source_noops_when_ignore_noop_is_set() {
      let root = tmp_dir("copy-missing-ignore-noop");
      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console).with_ignore_noop(true);
      let cp = Copy { before: "nope.txt".to_string(), after: "b.txt".to_string(), overwrite: false };
      assert!(cp.transform(&mut work).expect("noop, not error").is_noop());
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn move_with_overwrite_is_not_reversible() {
      let mv = Move { before: "a".to_string(), after: "b".to_string(), overwrite: true };
      assert!(mv.reverse().is_err());
   }

   #[test]
   fn remove_noops_when_glob_matches_nothing() {
      let root = tmp_dir("remove-noop");
      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let glob = crate::glob::Glob::new(["*.missing"], Vec::<&str>::new()).expect("glob");
      let remove = Remove { glob };
      assert!(remove.transform(&mut work).expect("ok").is_noop());
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn remove_has_no_reverse() {
      let glob = crate::glob::Glob::new(["*.txt"], Vec::<&str>::new()).expect("glob");
      let remove = Remove { glob };
      assert!(remove.reverse().is_err());
   }

   #[test]
   fn rename_matches_suffix_basenames() {
      let root = tmp_dir("rename-suffix");
      fs::write(root.join("foo.BUILD.bazel"), b"x").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let rn = Rename { before: ".bazel".to_string(), after: ".bzl".to_string(), suffix: true, overwrite: false };
      rn.transform(&mut work).expect("rename");
      assert!(root.join("foo.BUILD.bzl").exists());

      fs::remove_dir_all(&root).ok();
   }
}
