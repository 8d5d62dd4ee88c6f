//! Directory-walk convenience built on `Roots()`/`Tips()` (§9: "Roots() is
//! not an optimization hint — it is a correctness requirement... Traversal
//! must begin at roots and prune at tips"). Per-root walks are independent,
//! so they run in parallel via `rayon`, mirroring the teacher's own
//! rayon-parallelized batch pattern (`rewrite.rs`).

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::Glob;
use crate::error::Result;
use crate::util::fs_ops::walk_files;

/// List every file under `checkout_root` that `glob` matches, limiting
/// traversal to `glob.roots()` and skipping symlinks (same walk policy as
/// ConsistencyFile generation, §4.3.4).
pub fn find(checkout_root: &Path, glob: &Glob) -> Result<Vec<PathBuf>> {
   let roots = glob.roots();
   let tips = glob.tips();

   let per_root: Vec<Result<Vec<PathBuf>>> = roots
      .into_par_iter()
      .map(|root| {
         let root_dir = checkout_root.join(&root);
         if !root_dir.is_dir() {
            return Ok(Vec::new());
         }
         let files = walk_files(&root_dir)?;
         Ok(files
            .into_iter()
            .map(|rel| if root.is_empty() { rel } else { Path::new(&root).join(rel) })
            .filter(|rel| {
               let rel_str = rel.to_string_lossy();
               tips.iter().any(|tip| is_under(tip, &rel_str)) || glob.matches(&rel_str)
            })
            .collect())
      })
      .collect();

   let mut out = Vec::new();
   for chunk in per_root {
      out.extend(chunk?);
   }
   out.sort();
   out.dedup();
   Ok(out)
}

fn is_under(tip: &str, path: &str) -> bool {
   if tip.is_empty() {
      return true;
   }
   path.strip_prefix(tip).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs;

   #[test]
   fn find_limits_to_roots_and_matches() {
      let dir = std::env::temp_dir().join(format!("copybara-glob-walk-{}", std::process::id()));
      fs::create_dir_all(dir.join("src")).expect("mkdir");
      fs::create_dir_all(dir.join("docs")).expect("mkdir");
      fs::write(dir.join("src/main.rs"), b"").expect("write");
      fs::write(dir.join("docs/readme.md"), b"").expect("write");

      let glob = Glob::new(["src/**/*.rs"], Vec::<&str>::new()).expect("glob");
      let found = find(&dir, &glob).expect("find");
      assert_eq!(found, vec![PathBuf::from("src/main.rs")]);

      fs::remove_dir_all(&dir).ok();
   }
}
