//! Fixture-based golden testing for the transformation pipeline.
//!
//! A fixture describes a checkout tree before a transformation runs and the
//! tree it must become afterward. There is no on-disk workflow language
//! (§1 Non-goals): callers supply the `Transformation` under test directly.
//!
//! # Directory structure
//!
//! ```text
//! tests/fixtures/
//! ├── manifest.toml
//! ├── move-basic/
//! │   ├── meta.toml
//! │   ├── consistency.txt  # optional: expected ConsistencyFile bytes
//! │   ├── input/        # checkout tree before the transformation runs
//! │   └── golden/        # expected checkout tree afterward
//! └── ...
//! ```

mod compare;
pub mod fixture;
mod report;
mod runner;

use std::path::Path;

pub use compare::{CompareResult, compare_trees};
pub use fixture::{Fixture, FixtureEntry, FixtureInput, FixtureMeta, Golden, Manifest, discover_fixtures};
pub use report::generate_html_report;
pub use runner::{ConsistencyCheck, RunResult, TestRunner, TestSummary};

use crate::error::Result;

/// Default fixtures directory relative to crate root.
pub const FIXTURES_DIR: &str = "tests/fixtures";

/// Get the fixtures directory path.
pub fn fixtures_dir() -> std::path::PathBuf {
   if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
      return Path::new(&manifest_dir).join(FIXTURES_DIR);
   }
   Path::new(FIXTURES_DIR).to_path_buf()
}

/// List all available fixtures.
pub fn list_fixtures() -> Result<Vec<String>> {
   let manifest = Manifest::load(&fixtures_dir())?;
   Ok(manifest.fixtures.into_keys().collect())
}
