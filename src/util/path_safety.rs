//! Path safety validation (§4.2.4).
//!
//! Every path supplied by a transformation — user-declared or computed (e.g.
//! after a regex substitution) — is validated here before it ever touches
//! the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{CopybaraError, Result};

/// Validate that `raw` is a normalized relative path: no leading `/`, no
/// `.`/`..` components, non-empty after trimming unless `allow_root` is set
/// (the `Move`/`Copy` `after=""` convention for "move into the repo root").
pub fn validate_relative(raw: &str, allow_root: bool) -> Result<PathBuf> {
   let trimmed = raw.trim();
   if trimmed.is_empty() {
      return if allow_root {
         Ok(PathBuf::new())
      } else {
         Err(CopybaraError::user_config("path", "path must not be empty"))
      };
   }

   let path = Path::new(trimmed);
   if path.is_absolute() {
      return Err(CopybaraError::user_config("path", format!("path must be relative: {trimmed}")));
   }

   let mut normalized = PathBuf::new();
   for component in path.components() {
      match component {
         Component::Normal(part) => normalized.push(part),
         Component::CurDir => {
            return Err(CopybaraError::user_config("path", format!("path must not contain '.': {trimmed}")));
         },
         Component::ParentDir => {
            return Err(CopybaraError::user_config("path", format!("path must not contain '..': {trimmed}")));
         },
         Component::RootDir | Component::Prefix(_) => {
            return Err(CopybaraError::user_config("path", format!("path must be relative: {trimmed}")));
         },
      }
   }

   Ok(normalized)
}

/// Join a validated relative path onto `root`, verifying the result does
/// not escape `root` (`PathEscape`). Used for computed destination paths
/// (e.g. after regex-group substitution) which must be re-validated even
/// when the template's static shape looked safe.
pub fn resolve_in_checkout(root: &Path, rel: &Path) -> Result<PathBuf> {
   let joined = root.join(rel);

   let mut depth: i64 = 0;
   for component in rel.components() {
      match component {
         Component::Normal(_) => depth += 1,
         Component::ParentDir => depth -= 1,
         _ => {},
      }
      if depth < 0 {
         return Err(CopybaraError::validation(
            joined.display().to_string(),
            "computed path escapes the checkout root (PathEscape)",
         ));
      }
   }

   Ok(joined)
}
