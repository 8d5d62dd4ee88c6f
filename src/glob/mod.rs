//! Component A: the Glob engine (§4.1).
//!
//! A Glob is an immutable algebraic value — `Leaf`, `Union`, or
//! `Difference` — compiled once and matched many times. No teacher
//! counterpart exists for this component (the teacher has no
//! pattern-matching module); the pattern compiler in `pattern.rs` is
//! grounded on the pack's glob engines (`pantsbuild-pants`,
//! `vercel-turborepo`'s `wax`), generalized from their directory-walker
//! use case to the pure `Matches`/`Roots`/`Tips` contract this spec needs.

mod pattern;
pub mod walk;

use std::collections::BTreeSet;

pub use pattern::Pattern;
pub use walk::find;

use crate::error::{CopybaraError, Result};

/// A leaf: any include must match, no exclude may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
   include: Vec<Pattern>,
   exclude: Vec<Pattern>,
}

impl Leaf {
   fn matches(&self, path: &str) -> bool {
      self.include.iter().any(|p| p.is_match(path)) && !self.exclude.iter().any(|p| p.is_match(path))
   }
}

/// An immutable tree of include/exclude/union/difference nodes (§3, §4.1).
#[derive(Debug, Clone, PartialEq)]
pub enum Glob {
   Leaf(Leaf),
   Union(Box<Glob>, Box<Glob>),
   Difference(Box<Glob>, Box<Glob>),
}

impl Glob {
   /// Build a Leaf glob from include/exclude pattern strings. Canonicalizes
   /// by sorting both lists so structurally-equal leaves compare equal
   /// regardless of declaration order.
   pub fn new(include: impl IntoIterator<Item = impl AsRef<str>>, exclude: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
      let mut include: Vec<Pattern> = include
         .into_iter()
         .map(|p| Pattern::compile(p.as_ref()))
         .collect::<Result<_>>()?;
      let mut exclude: Vec<Pattern> = exclude
         .into_iter()
         .map(|p| Pattern::compile(p.as_ref()))
         .collect::<Result<_>>()?;

      if include.is_empty() {
         return Err(CopybaraError::user_config("glob", "InvalidGlob: at least one include pattern is required"));
      }

      include.sort_by(|a, b| a.as_str().cmp(b.as_str()));
      exclude.sort_by(|a, b| a.as_str().cmp(b.as_str()));
      Ok(Self::Leaf(Leaf { include, exclude }))
   }

   /// `Union(a, b)`: matches if either matches. Composing with a non-Glob is
   /// a type error the caller's type system already prevents, so the only
   /// runtime failure mode this preserves is structural: union is always
   /// well-defined between two `Glob` values.
   pub fn union(self, other: Self) -> Self {
      Self::Union(Box::new(self), Box::new(other))
   }

   /// `Difference(a, b)`: matches iff `a` matches and `b` does not.
   pub fn difference(self, other: Self) -> Self {
      Self::Difference(Box::new(self), Box::new(other))
   }

   /// `Matches(p)`: a pure function of the patterns and the relative path,
   /// independent of filesystem state (Testable Property #3).
   pub fn matches(&self, rel_path: &str) -> bool {
      match self {
         Self::Leaf(leaf) => leaf.matches(rel_path),
         Self::Union(a, b) => a.matches(rel_path) || b.matches(rel_path),
         Self::Difference(a, b) => a.matches(rel_path) && !b.matches(rel_path),
      }
   }

   /// `Roots()`: minimal antichain of directory prefixes covering every
   /// include pattern. `Difference` only needs its positive side's roots —
   /// `b` can only narrow, never widen, what `a` would traverse.
   pub fn roots(&self) -> BTreeSet<String> {
      let raw = match self {
         Self::Leaf(leaf) => leaf.include.iter().map(Pattern::literal_prefix).collect(),
         Self::Union(a, b) => a.roots().into_iter().chain(b.roots()).collect(),
         Self::Difference(a, _) => a.roots(),
      };
      minimal_antichain(raw)
   }

   /// `Tips()`: maximal prefixes such that everything under them is
   /// included. Conservative for `Difference`: since the excluded side
   /// could carve an arbitrary hole out of any candidate tip, a
   /// `Difference` contributes no tips at all rather than risk claiming a
   /// prefix is fully included when it might not be (a correctness-safe
   /// approximation; see DESIGN.md).
   pub fn tips(&self) -> BTreeSet<String> {
      let raw = match self {
         Self::Leaf(leaf) if leaf.exclude.is_empty() => {
            leaf.include.iter().filter_map(Pattern::full_subtree_prefix).collect()
         },
         Self::Leaf(_) => BTreeSet::new(),
         Self::Union(a, b) => a.tips().into_iter().chain(b.tips()).collect(),
         Self::Difference(..) => BTreeSet::new(),
      };
      minimal_antichain(raw)
   }
}

/// Remove redundant descendants: `foo/bar` is dropped if `foo` is already
/// present (used for both `Roots()` and `Tips()`).
fn minimal_antichain(prefixes: impl IntoIterator<Item = String>) -> BTreeSet<String> {
   let mut sorted: Vec<String> = prefixes.into_iter().collect();
   sorted.sort_by_key(str::len);

   let mut kept: Vec<String> = Vec::new();
   'outer: for candidate in sorted {
      for existing in &kept {
         if is_ancestor(existing, &candidate) {
            continue 'outer;
         }
      }
      kept.push(candidate);
   }
   kept.into_iter().collect()
}

/// True if `ancestor` is `""` or a component-wise prefix of `path` (so
/// `"foo"` is an ancestor of `"foo/bar"` but not of `"foobar"`).
fn is_ancestor(ancestor: &str, path: &str) -> bool {
   if ancestor.is_empty() {
      return true;
   }
   if ancestor == path {
      return true;
   }
   path.strip_prefix(ancestor).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn leaf_matches_include_not_exclude() {
      let g = Glob::new(["*.rs"], ["main.rs"]).expect("glob");
      assert!(g.matches("lib.rs"));
      assert!(!g.matches("main.rs"));
      assert!(!g.matches("lib.txt"));
   }

   #[test]
   fn union_matches_either_side() {
      let a = Glob::new(["*.rs"], Vec::<&str>::new()).expect("glob");
      let b = Glob::new(["*.toml"], Vec::<&str>::new()).expect("glob");
      let u = a.union(b);
      assert!(u.matches("lib.rs"));
      assert!(u.matches("Cargo.toml"));
      assert!(!u.matches("README.md"));
   }

   #[test]
   fn difference_excludes_matches_of_b() {
      let a = Glob::new(["src/**"], Vec::<&str>::new()).expect("glob");
      let b = Glob::new(["src/generated/**"], Vec::<&str>::new()).expect("glob");
      let d = a.difference(b);
      assert!(d.matches("src/main.rs"));
      assert!(!d.matches("src/generated/foo.rs"));
   }

   #[test]
   fn roots_drops_redundant_descendants() {
      let g = Glob::new(["foo/bar/*.txt", "foo/*.txt"], Vec::<&str>::new()).expect("glob");
      assert_eq!(g.roots(), BTreeSet::from(["foo".to_string()]));
   }

   #[test]
   fn roots_leading_doublestar_yields_repo_root() {
      let g = Glob::new(["**/*.txt"], Vec::<&str>::new()).expect("glob");
      assert_eq!(g.roots(), BTreeSet::from([String::new()]));
   }

   #[test]
   fn tips_detect_full_subtree_inclusion() {
      let g = Glob::new(["vendor/**"], Vec::<&str>::new()).expect("glob");
      assert_eq!(g.tips(), BTreeSet::from(["vendor".to_string()]));
   }

   #[test]
   fn difference_contributes_no_tips() {
      let a = Glob::new(["vendor/**"], Vec::<&str>::new()).expect("glob");
      let b = Glob::new(["vendor/keep/**"], Vec::<&str>::new()).expect("glob");
      assert!(a.difference(b).tips().is_empty());
   }

   #[test]
   fn empty_include_is_invalid_composition() {
      assert!(Glob::new(Vec::<&str>::new(), Vec::<&str>::new()).is_err());
   }

   #[test]
   fn matches_is_pure_independent_of_filesystem() {
      let g = Glob::new(["a/*.rs"], Vec::<&str>::new()).expect("glob");
      assert_eq!(g.matches("a/b.rs"), g.matches("a/b.rs"));
   }
}
