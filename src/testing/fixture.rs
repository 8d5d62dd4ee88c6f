//! Fixture types and I/O for pipeline-scenario golden tests (§4.5).
//!
//! Each fixture describes a checkout tree before a transformation runs
//! (`input/`) and the tree it must become afterward (`golden/`). There is no
//! on-disk workflow language (§1 Non-goals): the transformation under test is
//! supplied by the caller as a `Transformation` value, not read from the
//! fixture.

use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::error::{CopybaraError, Result};

/// Manifest listing all fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
   #[serde(default)]
   pub fixtures: HashMap<String, FixtureEntry>,
}

/// Entry in the manifest for a single fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEntry {
   pub description: String,
   #[serde(default)]
   pub tags: Vec<String>,
}

impl Manifest {
   pub fn load(fixtures_dir: &Path) -> Result<Self> {
      let path = fixtures_dir.join("manifest.toml");
      if !path.exists() {
         return Ok(Self { fixtures: HashMap::new() });
      }
      let content = fs::read_to_string(&path)?;
      toml::from_str(&content).map_err(|e| CopybaraError::Other(format!("failed to parse manifest.toml: {e}")))
   }

   pub fn save(&self, fixtures_dir: &Path) -> Result<()> {
      let path = fixtures_dir.join("manifest.toml");
      let content = toml::to_string_pretty(self).map_err(|e| CopybaraError::Other(format!("failed to serialize manifest: {e}")))?;
      fs::write(&path, content)?;
      Ok(())
   }

   pub fn add(&mut self, name: String, entry: FixtureEntry) {
      self.fixtures.insert(name, entry);
   }
}

/// Metadata for a single fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureMeta {
   pub description: String,
   #[serde(default)]
   pub tags: Vec<String>,
}

/// The `input/` checkout tree a transformation is run against.
#[derive(Debug, Clone)]
pub struct FixtureInput {
   pub root: PathBuf,
}

/// The `golden/` expected resulting tree, plus an optional expected
/// `ConsistencyFile` the run should also reproduce.
#[derive(Debug, Clone)]
pub struct Golden {
   pub root: PathBuf,
   pub consistency_path: Option<PathBuf>,
}

/// A complete fixture: metadata plus `input/` and (optionally) `golden/`
/// tree roots on disk.
#[derive(Debug, Clone)]
pub struct Fixture {
   pub name: String,
   pub meta: FixtureMeta,
   pub input: FixtureInput,
   pub golden: Option<Golden>,
}

impl Fixture {
   /// Load a fixture from `fixtures_dir/name`.
   pub fn load(fixtures_dir: &Path, name: &str) -> Result<Self> {
      let fixture_dir = fixtures_dir.join(name);
      if !fixture_dir.exists() {
         return Err(CopybaraError::Other(format!("fixture '{name}' not found at {}", fixture_dir.display())));
      }

      let meta_path = fixture_dir.join("meta.toml");
      let meta: FixtureMeta = if meta_path.exists() {
         let content = fs::read_to_string(&meta_path)?;
         toml::from_str(&content).map_err(|e| CopybaraError::Other(format!("failed to parse {}: {e}", meta_path.display())))?
      } else {
         return Err(CopybaraError::Other(format!("fixture '{name}' missing meta.toml")));
      };

      let input_root = fixture_dir.join("input");
      if !input_root.exists() {
         return Err(CopybaraError::Other(format!("fixture '{name}' missing input/")));
      }

      let golden_root = fixture_dir.join("golden");
      let golden = if golden_root.exists() {
         let consistency_path = fixture_dir.join("consistency.txt");
         Some(Golden { root: golden_root, consistency_path: consistency_path.exists().then_some(consistency_path) })
      } else {
         None
      };

      Ok(Self { name: name.to_string(), meta, input: FixtureInput { root: input_root }, golden })
   }

   /// Write `meta.toml` for a fixture whose `input/`/`golden/` trees already
   /// exist on disk (used when recording a new fixture from a live run).
   pub fn save_meta(&self, fixtures_dir: &Path) -> Result<()> {
      let fixture_dir = fixtures_dir.join(&self.name);
      fs::create_dir_all(&fixture_dir)?;
      let content = toml::to_string_pretty(&self.meta).map_err(|e| CopybaraError::Other(format!("failed to serialize meta: {e}")))?;
      fs::write(fixture_dir.join("meta.toml"), content)?;
      Ok(())
   }
}

/// Discover all fixture names present under `fixtures_dir` (any directory
/// with a `meta.toml`), sorted.
pub fn discover_fixtures(fixtures_dir: &Path) -> Result<Vec<String>> {
   let mut fixtures = Vec::new();
   if !fixtures_dir.exists() {
      return Ok(fixtures);
   }

   for entry in fs::read_dir(fixtures_dir)? {
      let entry = entry?;
      let path = entry.path();
      if !path.is_dir() {
         continue;
      }
      if path.join("meta.toml").exists()
         && let Some(name) = path.file_name().and_then(|n| n.to_str())
      {
         fixtures.push(name.to_string());
      }
   }

   fixtures.sort();
   Ok(fixtures)
}

#[cfg(test)]
mod tests {
   use super::*;

   fn tmp_dir(name: &str) -> PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-fixture-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn load_reads_meta_and_detects_golden() {
      let root = tmp_dir("load");
      let fixture_dir = root.join("move-basic");
      fs::create_dir_all(fixture_dir.join("input")).expect("mkdir");
      fs::create_dir_all(fixture_dir.join("golden")).expect("mkdir");
      fs::write(fixture_dir.join("meta.toml"), "description = \"moves a file\"\ntags = [\"fileops\"]\n").expect("write");

      let fixture = Fixture::load(&root, "move-basic").expect("load");
      assert_eq!(fixture.meta.description, "moves a file");
      assert_eq!(fixture.meta.tags, vec!["fileops".to_string()]);
      assert!(fixture.golden.is_some());

      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn load_without_golden_dir_leaves_golden_none() {
      let root = tmp_dir("load-no-golden");
      let fixture_dir = root.join("bare");
      fs::create_dir_all(fixture_dir.join("input")).expect("mkdir");
      fs::write(fixture_dir.join("meta.toml"), "description = \"bare\"\n").expect("write");

      let fixture = Fixture::load(&root, "bare").expect("load");
      assert!(fixture.golden.is_none());

      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn discover_fixtures_returns_sorted_names() {
      let root = tmp_dir("discover");
      for name in ["zeta", "alpha"] {
         let dir = root.join(name);
         fs::create_dir_all(dir.join("input")).expect("mkdir");
         fs::write(dir.join("meta.toml"), "description = \"x\"\n").expect("write");
      }

      let names = discover_fixtures(&root).expect("discover");
      assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);

      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn discover_fixtures_on_missing_dir_returns_empty() {
      let names = discover_fixtures(&PathBuf::from("/nonexistent/copybara/fixtures")).expect("discover");
      assert!(names.is_empty());
   }
}
