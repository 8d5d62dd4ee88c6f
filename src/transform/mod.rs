//! Component B: the transformation pipeline (§4.2). No teacher counterpart
//! exists for the domain operations themselves (the teacher rewrites commit
//! messages, not trees); the shape of `TransformWork` threading concrete
//! `Console`/cache structs through a pipeline follows `rewrite.rs`'s
//! `run_rewrite_mode`, and every primitive reuses `util::fs_ops` /
//! `util::path_safety` built for Component E.

mod dynamic;
mod fileops;
mod replace;
pub mod template;
mod verify;

use std::collections::HashMap;
use std::path::PathBuf;

pub use dynamic::{DynamicContext, DynamicTransform, ExplicitReversal};
pub use fileops::{Copy, Move, Remove, Rename};
pub use replace::{FilterReplace, Replace, TodoMode, TodoReplace};
pub use verify::{Charset, ConvertEncoding, VerifyMatch};

use crate::console::Console;
use crate::error::{CopybaraError, Result};
use crate::glob::Glob;

/// Outcome of a successful `transform()` call; failure is `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
   Success,
   Noop(String),
}

impl Status {
   pub fn is_noop(&self) -> bool {
      matches!(self, Self::Noop(_))
   }
}

/// Capability set every operation in the catalog (§4.2.1) implements.
pub trait Transformation: std::fmt::Debug {
   fn transform(&self, work: &mut TransformWork) -> Result<Status>;
   fn reverse(&self) -> Result<Box<dyn Transformation>>;
   fn describe(&self) -> String;
}

/// Per-work cache mapping the last-queried glob to the file list it
/// produced (§3: TreeState). `Uncached` after any mutation unless the
/// transformation explicitly calls `notify_no_change`.
#[derive(Debug, Clone)]
enum TreeState {
   Uncached,
   Cached { glob: Glob, files: Vec<PathBuf> },
}

/// Per-migration-run context threaded through every transformation,
/// single-threaded by construction (§5: "a single migration run is
/// single-threaded at the pipeline level").
pub struct TransformWork<'a> {
   pub checkout_root: PathBuf,
   pub message: String,
   pub console: &'a mut Console,
   pub labels: HashMap<String, Vec<String>>,
   /// Per-run flag (spec.md: "the run's `ignoreNoop` flag"): when set,
   /// operations that would otherwise fail because their target is absent
   /// (e.g. `Move`/`Copy` with a missing source) noop instead.
   pub ignore_noop: bool,
   tree_state: TreeState,
   /// Set by a transformation right before returning, to tell the cache
   /// contract whether this call consumed-but-didn't-invalidate the
   /// snapshot. Reset to `false` at the start of every `transform` call by
   /// `Sequence`.
   no_change_notified: bool,
}

impl<'a> TransformWork<'a> {
   pub fn new(checkout_root: PathBuf, console: &'a mut Console) -> Self {
      Self {
         checkout_root,
         message: String::new(),
         console,
         labels: HashMap::new(),
         ignore_noop: false,
         tree_state: TreeState::Uncached,
         no_change_notified: false,
      }
   }

   /// Builder form setting the run's `ignoreNoop` flag (§4.2.1: `Move`/`Copy`
   /// with a missing source).
   pub fn with_ignore_noop(mut self, ignore_noop: bool) -> Self {
      self.ignore_noop = ignore_noop;
      self
   }

   /// List files under `checkout_root` matching `glob`, consulting the
   /// cache first.
   pub fn find(&mut self, glob: &Glob) -> Result<Vec<PathBuf>> {
      if let TreeState::Cached { glob: cached_glob, files } = &self.tree_state {
         if cached_glob == glob {
            return Ok(files.clone());
         }
      }
      let files = crate::glob::find(&self.checkout_root, glob)?;
      self.tree_state = TreeState::Cached { glob: glob.clone(), files: files.clone() };
      Ok(files)
   }

   /// Called by a transformation that consulted the TreeState but made no
   /// change to the tree, so the snapshot is still accurate for the next
   /// child in a Sequence.
   pub fn notify_no_change(&mut self) {
      self.no_change_notified = true;
   }

   fn invalidate_tree_state(&mut self) {
      if !self.no_change_notified {
         self.tree_state = TreeState::Uncached;
      }
   }

   fn reset_notify_flag(&mut self) {
      self.no_change_notified = false;
   }
}

/// How a `Sequence` aggregates its children's noop/success outcomes
/// (§4.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopPolicy {
   IgnoreNoop,
   NoopIfAnyNoop,
   NoopIfAllNoop,
   FailIfAnyNoop,
}

/// The compositional heart of the pipeline: runs children strictly in
/// order on a single thread, honoring the cache contract between each and
/// aggregating noop/success per `NoopPolicy`.
#[derive(Debug)]
pub struct Sequence {
   children: Vec<Box<dyn Transformation>>,
   noop_policy: NoopPolicy,
}

impl Sequence {
   pub fn new(children: Vec<Box<dyn Transformation>>, noop_policy: NoopPolicy) -> Self {
      Self { children, noop_policy }
   }
}

impl Transformation for Sequence {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let mut any_noop = false;
      let mut any_success = false;

      for child in &self.children {
         work.reset_notify_flag();
         let status = child.transform(work)?;
         work.invalidate_tree_state();

         match &status {
            Status::Success => any_success = true,
            Status::Noop(reason) => {
               any_noop = true;
               match self.noop_policy {
                  NoopPolicy::FailIfAnyNoop => {
                     return Err(CopybaraError::void_operation(child.describe()));
                  },
                  NoopPolicy::NoopIfAnyNoop => return Ok(Status::Noop(reason.clone())),
                  NoopPolicy::IgnoreNoop | NoopPolicy::NoopIfAllNoop => {},
               }
            },
         }
      }

      match self.noop_policy {
         NoopPolicy::NoopIfAllNoop if any_noop && !any_success => Ok(Status::Noop("all children were noop".to_string())),
         _ => Ok(Status::Success),
      }
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      let mut reversed = Vec::with_capacity(self.children.len());
      for child in self.children.iter().rev() {
         reversed.push(child.reverse()?);
      }
      Ok(Box::new(Sequence { children: reversed, noop_policy: self.noop_policy }))
   }

   fn describe(&self) -> String {
      format!("Sequence({} children)", self.children.len())
   }
}
