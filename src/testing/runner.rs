//! Fixture test runner: copies a fixture's `input/` tree to a scratch
//! checkout, runs the caller-supplied transformation against it, and
//! compares the result to `golden/`.

use std::path::PathBuf;

use super::{
   compare::{CompareResult, compare_trees},
   fixture::{Fixture, discover_fixtures},
};
use crate::{
   config::CopybaraConfig,
   console::Console,
   error::{CopybaraError, Result},
   transform::{Transformation, TransformWork},
   util::fs_ops::copy_recursive,
   vcs::consistency::ConsistencyFile,
};

/// Outcome of comparing a freshly-generated `ConsistencyFile` against the
/// one recorded alongside a fixture's golden tree.
#[derive(Debug)]
pub struct ConsistencyCheck {
   pub matched: bool,
   pub detail: String,
}

/// Result of running a single fixture.
#[derive(Debug)]
pub struct RunResult {
   pub name: String,
   pub comparison: Option<CompareResult>,
   pub consistency: Option<ConsistencyCheck>,
   pub error: Option<String>,
}

/// Drives fixtures in `fixtures_dir` against a caller-supplied
/// transformation; this crate carries no workflow configuration language
/// (§1 Non-goals), so the transformation under test is not read from disk.
pub struct TestRunner<'t> {
   pub fixtures_dir: PathBuf,
   pub transformation: &'t dyn Transformation,
   pub config: CopybaraConfig,
   pub filter: Option<String>,
}

impl<'t> TestRunner<'t> {
   pub fn new(fixtures_dir: impl Into<PathBuf>, transformation: &'t dyn Transformation) -> Self {
      Self { fixtures_dir: fixtures_dir.into(), transformation, config: CopybaraConfig::default(), filter: None }
   }

   pub fn with_filter(mut self, filter: Option<String>) -> Self {
      self.filter = filter;
      self
   }

   pub fn with_config(mut self, config: CopybaraConfig) -> Self {
      self.config = config;
      self
   }

   pub fn run_all(&self) -> Result<Vec<RunResult>> {
      let names = discover_fixtures(&self.fixtures_dir)?;
      let mut results = Vec::new();
      for name in names {
         if let Some(pattern) = &self.filter
            && !name.contains(pattern.as_str())
         {
            continue;
         }
         results.push(self.run_fixture(&name));
      }
      Ok(results)
   }

   pub fn run_fixture(&self, name: &str) -> RunResult {
      match self.run_fixture_inner(name) {
         Ok(result) => result,
         Err(e) => RunResult { name: name.to_string(), comparison: None, consistency: None, error: Some(e.to_string()) },
      }
   }

   fn run_fixture_inner(&self, name: &str) -> Result<RunResult> {
      let fixture = Fixture::load(&self.fixtures_dir, name)?;

      // `ConsistencyFile::generate` diffs the pre- and post-transformation
      // trees internally, and that diff requires both to share a parent
      // directory, so the untouched copy and the scratch copy live as
      // siblings under one run root (mirrors the `cbr` binary's layout).
      let run_root = std::env::temp_dir().join(format!("copybara-fixture-run-{name}-{}", std::process::id()));
      if run_root.exists() {
         crate::util::fs_ops::remove_recursive(&run_root)?;
      }
      let original = run_root.join("before");
      let scratch = run_root.join("after");
      copy_recursive(&fixture.input.root, &original, true)?;
      copy_recursive(&fixture.input.root, &scratch, true)?;

      let mut console = Console::null();
      let mut work = TransformWork::new(scratch.clone(), &mut console);
      self.transformation.transform(&mut work)?;

      let comparison = match &fixture.golden {
         Some(golden) => Some(compare_trees(&scratch, &golden.root)?),
         None => None,
      };

      let consistency = match fixture.golden.as_ref().and_then(|g| g.consistency_path.as_ref()) {
         Some(consistency_path) => {
            let generated = ConsistencyFile::generate(&self.config, &scratch, &original)?;
            let expected_bytes = std::fs::read(consistency_path)?;
            let matched = generated.to_bytes() == expected_bytes;
            let detail = if matched {
               "consistency file matches golden".to_string()
            } else {
               "consistency file bytes differ from golden".to_string()
            };
            Some(ConsistencyCheck { matched, detail })
         },
         None => None,
      };

      crate::util::fs_ops::remove_recursive(&run_root).ok();

      Ok(RunResult { name: name.to_string(), comparison, consistency, error: None })
   }
}

/// Summary of a test run.
#[derive(Debug, Default)]
pub struct TestSummary {
   pub total: usize,
   pub passed: usize,
   pub failed: usize,
   pub no_golden: usize,
   pub errors: usize,
   /// Fixtures whose tree comparison passed but whose `ConsistencyFile`
   /// diverged from the golden one.
   pub consistency_mismatches: usize,
}

impl TestSummary {
   pub fn from_results(results: &[RunResult]) -> Self {
      let mut summary = Self { total: results.len(), ..Default::default() };
      for result in results {
         let consistency_ok = result.consistency.as_ref().is_none_or(|c| c.matched);
         if result.error.is_some() {
            summary.errors += 1;
         } else if let Some(cmp) = &result.comparison {
            if cmp.passed && consistency_ok {
               summary.passed += 1;
            } else {
               summary.failed += 1;
               if cmp.passed && !consistency_ok {
                  summary.consistency_mismatches += 1;
               }
            }
         } else {
            summary.no_golden += 1;
         }
      }
      summary
   }

   pub const fn all_passed(&self) -> bool {
      self.failed == 0 && self.errors == 0
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs;

   #[derive(Debug)]
   struct TouchFile;
   impl Transformation for TouchFile {
      fn transform(&self, work: &mut TransformWork) -> Result<crate::transform::Status> {
         fs::write(work.checkout_root.join("out.txt"), "written")?;
         Ok(crate::transform::Status::Success)
      }
      fn reverse(&self) -> Result<Box<dyn Transformation>> {
         Err(CopybaraError::non_reversible("TouchFile", "test double"))
      }
      fn describe(&self) -> String {
         "TouchFile".to_string()
      }
   }

   fn tmp_dir(name: &str) -> PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-runner-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn passing_fixture_reports_comparison_passed() {
      let fixtures_dir = tmp_dir("pass");
      let fixture_dir = fixtures_dir.join("writes-file");
      fs::create_dir_all(fixture_dir.join("input")).expect("mkdir");
      fs::create_dir_all(fixture_dir.join("golden")).expect("mkdir");
      fs::write(fixture_dir.join("meta.toml"), "description = \"writes out.txt\"\n").expect("write");
      fs::write(fixture_dir.join("golden/out.txt"), "written").expect("write");

      let touch = TouchFile;
      let runner = TestRunner::new(&fixtures_dir, &touch);
      let result = runner.run_fixture("writes-file");
      assert!(result.error.is_none());
      assert!(result.comparison.expect("comparison").passed);

      fs::remove_dir_all(&fixtures_dir).ok();
   }

   #[test]
   fn missing_fixture_reports_error() {
      let fixtures_dir = tmp_dir("missing");
      let touch = TouchFile;
      let runner = TestRunner::new(&fixtures_dir, &touch);
      let result = runner.run_fixture("does-not-exist");
      assert!(result.error.is_some());

      fs::remove_dir_all(&fixtures_dir).ok();
   }

   #[test]
   fn matching_consistency_file_reports_matched() {
      let fixtures_dir = tmp_dir("consistency-match");
      let fixture_dir = fixtures_dir.join("writes-file");
      fs::create_dir_all(fixture_dir.join("input")).expect("mkdir");
      fs::create_dir_all(fixture_dir.join("golden")).expect("mkdir");
      fs::write(fixture_dir.join("meta.toml"), "description = \"writes out.txt\"\n").expect("write");
      fs::write(fixture_dir.join("golden/out.txt"), "written").expect("write");

      // Precompute the consistency file the same way the runner will: a
      // scratch ("after") tree containing out.txt, sibling to the untouched
      // ("before") copy of the empty input.
      let precompute_root = tmp_dir("consistency-match-precompute");
      let before = precompute_root.join("before");
      let after = precompute_root.join("after");
      fs::create_dir_all(&before).expect("mkdir");
      fs::create_dir_all(&after).expect("mkdir");
      fs::write(after.join("out.txt"), "written").expect("write");
      let expected = ConsistencyFile::generate(&CopybaraConfig::default(), &after, &before).expect("generate");
      fs::write(fixture_dir.join("consistency.txt"), expected.to_bytes()).expect("write");
      fs::remove_dir_all(&precompute_root).ok();

      let touch = TouchFile;
      let runner = TestRunner::new(&fixtures_dir, &touch);
      let result = runner.run_fixture("writes-file");
      assert!(result.error.is_none(), "{:?}", result.error);
      assert!(result.comparison.expect("comparison").passed);
      let consistency = result.consistency.expect("consistency check ran");
      assert!(consistency.matched, "{}", consistency.detail);

      fs::remove_dir_all(&fixtures_dir).ok();
   }

   #[test]
   fn mismatched_consistency_file_fails_even_when_tree_matches() {
      let fixtures_dir = tmp_dir("consistency-mismatch");
      let fixture_dir = fixtures_dir.join("writes-file");
      fs::create_dir_all(fixture_dir.join("input")).expect("mkdir");
      fs::create_dir_all(fixture_dir.join("golden")).expect("mkdir");
      fs::write(fixture_dir.join("meta.toml"), "description = \"writes out.txt\"\n").expect("write");
      fs::write(fixture_dir.join("golden/out.txt"), "written").expect("write");
      fs::write(fixture_dir.join("consistency.txt"), b"stale-manifest\n\n").expect("write");

      let touch = TouchFile;
      let runner = TestRunner::new(&fixtures_dir, &touch);
      let result = runner.run_fixture("writes-file");
      assert!(result.comparison.expect("comparison").passed);
      assert!(!result.consistency.expect("consistency check ran").matched);

      let summary = TestSummary::from_results(&[result]);
      assert_eq!(summary.failed, 1);
      assert_eq!(summary.consistency_mismatches, 1);

      fs::remove_dir_all(&fixtures_dir).ok();
   }
}
