//! ConsistencyFile (§4.3.4): a manifest of per-path content hashes plus a
//! hunked diff, used to verify a destination checkout hasn't drifted and to
//! compute reverse patches. Hashing is parallelized with `rayon` the same
//! way the teacher's `rewrite.rs` parallelizes its own per-file batch work;
//! `indexmap::IndexMap` keeps the manifest in insertion (sorted-path) order
//! so two manifests built from the same tree always serialize identically.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{CopybaraError, Result};
use crate::util::fs_ops::walk_files;

/// Hex-encoded SHA-256 of a file's contents.
pub type Hash = String;

const HEADER_COMMENT: &str = "# This file is generated by Copybara";
const ALGORITHM_LINE: &str = "version=1, algorithm=sha256";
const SHA256_HEX_LEN: usize = 64;

/// A manifest of every tracked path's hash plus the unified diff needed to
/// reconstruct the prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyFile {
   pub hashes: IndexMap<String, Hash>,
   pub reverse_diff: Vec<u8>,
}

const ORIG_SUFFIX: &str = ".orig";

impl ConsistencyFile {
   /// Walk `root`, hash every file in parallel, and pair the manifest with
   /// the unified diff from `root` back to `previous_root` (the tree as it
   /// stood before the transformation that produced `root` ran). The diff
   /// `previous_root -> root` (baseline -> destination) must contain only
   /// hunked changes; a full-file add or delete fails generation (§4.3.4).
   pub fn generate(config: &crate::config::CopybaraConfig, root: &Path, previous_root: &Path) -> Result<Self> {
      let files = walk_files(root)?;
      reject_full_file_changes(config, previous_root, root)?;

      let mut pairs: Vec<(String, Result<Hash>)> = files
         .par_iter()
         .map(|rel| {
            let abs = root.join(rel);
            let hash = hash_file(&abs);
            (rel.to_string_lossy().into_owned(), hash)
         })
         .collect();
      pairs.sort_by(|a, b| a.0.cmp(&b.0));

      let mut hashes = IndexMap::new();
      for (path, hash) in pairs {
         hashes.insert(path, hash?);
      }

      let reverse_diff = crate::vcs::diff::diff(config, root, previous_root, false, &[])?;
      Ok(Self { hashes, reverse_diff })
   }

   /// Serialize with a leading "generated by Copybara" header and algorithm
   /// identifier, then `path\thash\n` lines (sorted by insertion order,
   /// which `generate` already guarantees is path-sorted), a blank line,
   /// and the raw reverse diff bytes.
   pub fn to_bytes(&self) -> Vec<u8> {
      let mut out = Vec::new();
      out.extend_from_slice(HEADER_COMMENT.as_bytes());
      out.push(b'\n');
      out.extend_from_slice(ALGORITHM_LINE.as_bytes());
      out.push(b'\n');
      for (path, hash) in &self.hashes {
         out.extend_from_slice(path.as_bytes());
         out.push(b'\t');
         out.extend_from_slice(hash.as_bytes());
         out.push(b'\n');
      }
      out.push(b'\n');
      out.extend_from_slice(&self.reverse_diff);
      out
   }

   /// Parse the format written by `to_bytes`. Rejects paths with invalid
   /// components (`\0`, `.`, `..`), hashes with non-hex characters, and
   /// hashes whose length doesn't match the expected SHA-256 output size
   /// (§4.3.4).
   pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
      let text = String::from_utf8_lossy(bytes);
      let mut lines = text.split('\n');

      match lines.next() {
         Some(l) if l == HEADER_COMMENT => {},
         _ => return Err(CopybaraError::validation("ConsistencyFile", "missing generated-by-Copybara header")),
      }
      match lines.next() {
         Some(l) if l == ALGORITHM_LINE => {},
         _ => return Err(CopybaraError::validation("ConsistencyFile", "missing or unsupported algorithm line")),
      }

      let mut hashes = IndexMap::new();
      for line in lines.by_ref() {
         if line.is_empty() {
            break;
         }
         let mut parts = line.splitn(2, '\t');
         let (path, hash) = match (parts.next(), parts.next()) {
            (Some(p), Some(h)) => (p, h),
            _ => return Err(CopybaraError::validation("ConsistencyFile", "malformed manifest line")),
         };
         validate_manifest_path(path)?;
         validate_manifest_hash(hash)?;
         hashes.insert(path.to_string(), hash.to_string());
      }

      let reverse_diff = lines.collect::<Vec<_>>().join("\n").into_bytes();
      Ok(Self { hashes, reverse_diff })
   }

   /// Produce patch bytes that, applied to the current tree, would reverse
   /// the transformation this file was generated from.
   pub fn reverse_patches(&self) -> &[u8] {
      &self.reverse_diff
   }

   /// Recompute hashes for `root` and compare against this manifest,
   /// reporting every path whose hash differs or that is missing/extra.
   pub fn validate_directory(&self, root: &Path) -> Result<Vec<String>> {
      let files = walk_files(root)?;

      let mut current: IndexMap<String, Hash> = IndexMap::new();
      let pairs: Vec<(String, Result<Hash>)> = files
         .par_iter()
         .map(|rel| {
            let abs = root.join(rel);
            (rel.to_string_lossy().into_owned(), hash_file(&abs))
         })
         .collect();
      for (path, hash) in pairs {
         current.insert(path, hash?);
      }

      let mut mismatches = Vec::new();
      for (path, expected) in &self.hashes {
         match current.get(path) {
            Some(actual) if actual == expected => {},
            Some(_) => mismatches.push(format!("{path}: hash mismatch")),
            None => mismatches.push(format!("{path}: missing")),
         }
      }
      for path in current.keys() {
         if !self.hashes.contains_key(path) {
            mismatches.push(format!("{path}: unexpected"));
         }
      }
      mismatches.sort();
      Ok(mismatches)
   }
}

/// Reject a `baseline -> destination` diff containing any full-file add or
/// delete (§4.3.4): a ConsistencyFile can only carry hunked changes, since
/// `reverse_patches` depends on every entry being a patchable modification.
fn reject_full_file_changes(config: &crate::config::CopybaraConfig, baseline: &Path, destination: &Path) -> Result<()> {
   let diff = crate::vcs::diff::diff_files(config, baseline, destination, &[])?;
   for entry in &diff {
      match entry.operation {
         crate::vcs::diff::Operation::Add | crate::vcs::diff::Operation::Delete => {
            return Err(CopybaraError::validation(entry.name.clone(), full_file_change_hint(&entry.name)));
         },
         crate::vcs::diff::Operation::Modified => {},
      }
   }
   Ok(())
}

fn full_file_change_hint(name: &str) -> String {
   let basename = Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or(name);
   if basename.ends_with(ORIG_SUFFIX) {
      format!("full-file add/delete of '{name}': .orig files may need to be cleaned up")
   } else if basename.starts_with('.') {
      format!("full-file add/delete of '{name}': dot files may not be tracked")
   } else {
      format!("full-file add/delete of '{name}' is not representable in a ConsistencyFile diff")
   }
}

fn validate_manifest_path(path: &str) -> Result<()> {
   if path.contains('\0') {
      return Err(CopybaraError::validation(path.to_string(), "path contains a NUL byte"));
   }
   for component in Path::new(path).components() {
      match component {
         std::path::Component::Normal(_) => {},
         _ => return Err(CopybaraError::validation(path.to_string(), "path contains a '.' or '..' component")),
      }
   }
   Ok(())
}

fn validate_manifest_hash(hash: &str) -> Result<()> {
   if hash.len() != SHA256_HEX_LEN {
      return Err(CopybaraError::validation(hash.to_string(), format!("hash length must be {SHA256_HEX_LEN} hex characters")));
   }
   if !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(CopybaraError::validation(hash.to_string(), "hash contains non-hex characters"));
   }
   Ok(())
}

fn hash_file(path: &Path) -> Result<Hash> {
   let bytes = std::fs::read(path)?;
   let mut hasher = Sha256::new();
   hasher.update(&bytes);
   Ok(format!("{:x}", hasher.finalize()))
}
