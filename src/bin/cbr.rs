//! A thin demonstration binary (§1): runs a hard-coded pipeline against a
//! local checkout and prints the resulting diff. It does not parse a
//! workflow configuration language — that evaluator lives outside this
//! crate and would construct `Glob`/`Transformation` values directly.

use std::path::PathBuf;

use clap::Parser;
use copybara_core::config::CopybaraConfig;
use copybara_core::console::Console;
use copybara_core::error::{CopybaraError, Result};
use copybara_core::glob::Glob;
use copybara_core::transform::{NoopPolicy, Replace, Sequence, Status, Transformation, TransformWork};
use copybara_core::util::fs_ops;
use copybara_core::vcs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the bundled demonstration pipeline against a checkout", long_about = None)]
struct Args {
   /// Checkout directory to run the pipeline against. Left untouched; the
   /// pipeline runs against a scratch copy.
   #[arg(long, default_value = ".")]
   checkout: PathBuf,

   /// Template matched literally against file contents under `checkout`
   /// (no `${name}` interpolations, so no `regexGroups` binding is needed).
   #[arg(long, default_value = "TODO(old-owner)")]
   pattern: String,

   /// Replacement text substituted for every match.
   #[arg(long, default_value = "TODO(new-owner)")]
   replacement: String,

   /// Glob include pattern selecting which files the pipeline considers.
   #[arg(long, default_value = "**/*")]
   include: String,
}

/// The hard-coded demonstration pipeline: a single text substitution over
/// every file under `include`, wrapped in a `Sequence` so the binary
/// exercises the same composition path a real caller would use.
fn build_pipeline(args: &Args) -> Result<Sequence> {
   let paths = Glob::new([args.include.as_str()], Vec::<&str>::new())?;
   let replace = Replace::new(&args.pattern, &args.replacement, std::collections::HashMap::new(), paths, false, false)?;
   Ok(Sequence::new(vec![Box::new(replace)], NoopPolicy::IgnoreNoop))
}

fn main() -> Result<()> {
   let args = Args::parse();
   let config = CopybaraConfig::load()?;
   let mut console = Console::stderr();

   let checkout = args.checkout.canonicalize().map_err(|e| CopybaraError::Other(format!("failed to resolve checkout {}: {e}", args.checkout.display())))?;

   // `vcs::diff::diff` requires its two trees to be siblings, so both the
   // "before" and "after" snapshots live under one scratch parent.
   let run_root = std::env::temp_dir().join(format!("cbr-run-{}", std::process::id()));
   if run_root.exists() {
      fs_ops::remove_recursive(&run_root)?;
   }
   let original = run_root.join("before");
   let scratch = run_root.join("after");
   fs_ops::copy_recursive(&checkout, &original, true)?;
   fs_ops::copy_recursive(&checkout, &scratch, true)?;

   let pipeline = build_pipeline(&args)?;
   console.info(&format!("running {}", pipeline.describe()));

   let mut work = TransformWork::new(scratch.clone(), &mut console);
   let status = pipeline.transform(&mut work)?;
   match &status {
      Status::Success => console.info("pipeline reported success"),
      Status::Noop(reason) => console.warn(&format!("pipeline was a no-op: {reason}")),
   }

   let diff = vcs::diff::diff(&config, &original, &scratch, false, &[])?;
   if diff.is_empty() {
      console.info("no changes produced");
   } else {
      print!("{}", String::from_utf8_lossy(&diff));
   }

   fs_ops::remove_recursive(&run_root).ok();
   Ok(())
}
