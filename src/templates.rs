//! Pipeline summary report rendering (§4.2.6): a `describe()`-collecting
//! report of what ran, through the `tera` + `rust-embed` stack kept from
//! the teacher's `templates.rs` (embedded-template-plus-user-override
//! resolution order), repurposed from rendering LLM prompts to rendering a
//! CLI-facing "what happened" report. Never used for the `${name}`
//! mini-language in `transform::template`, which is a different grammar
//! entirely.

use std::path::PathBuf;
use std::sync::LazyLock;

use parking_lot::Mutex;
use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::error::{CopybaraError, Result};

/// Embedded report templates, compiled into the binary.
#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

const DEFAULT_TEMPLATE: &str = "summary.md.tera";

static TERA: LazyLock<Mutex<Tera>> = LazyLock::new(|| {
   let mut tera = Tera::default();

   if let Some(user_dir) = user_templates_dir()
      && user_dir.exists()
      && let Err(e) = register_user_templates(&mut tera, &user_dir)
   {
      eprintln!("Warning: {e}");
   }

   for file in Templates::iter() {
      if tera.get_template_names().any(|name| name == file.as_ref()) {
         continue;
      }
      if let Some(embedded) = Templates::get(file.as_ref())
         && let Ok(content) = std::str::from_utf8(embedded.data.as_ref())
         && let Err(e) = tera.add_raw_template(file.as_ref(), content)
      {
         eprintln!("Warning: failed to register embedded template {}: {e}", file.as_ref());
      }
   }

   tera.autoescape_on(vec![]);
   Mutex::new(tera)
});

fn user_templates_dir() -> Option<PathBuf> {
   std::env::var("HOME")
      .or_else(|_| std::env::var("USERPROFILE"))
      .ok()
      .map(|home| PathBuf::from(home).join(".config/copybara/templates"))
}

fn register_user_templates(tera: &mut Tera, dir: &PathBuf) -> Result<()> {
   for entry in std::fs::read_dir(dir).map_err(|e| CopybaraError::Other(format!("failed to read {}: {e}", dir.display())))? {
      let entry = entry.map_err(|e| CopybaraError::Other(e.to_string()))?;
      let path = entry.path();
      if path.extension().and_then(|s| s.to_str()) != Some("tera") {
         continue;
      }
      let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
      if let Err(e) = tera.add_template_file(&path, Some(&name)) {
         eprintln!("Warning: failed to load user template {}: {e}", path.display());
      }
   }
   Ok(())
}

/// One transformation's outcome, as surfaced in the report.
#[derive(Debug, Clone)]
pub struct StepReport {
   pub describe: String,
   pub outcome: String,
   pub elapsed_ms: u64,
}

/// Render the pipeline summary report for a completed (or failed) run.
pub fn render_summary(steps: &[StepReport], final_status: &str) -> Result<String> {
   let mut context = Context::new();
   context.insert("steps", steps);
   context.insert("final_status", final_status);
   context.insert(
      "total_elapsed_ms",
      &steps.iter().map(|s| s.elapsed_ms).sum::<u64>(),
   );

   let tera = TERA.lock();
   tera
      .render(DEFAULT_TEMPLATE, &context)
      .map_err(|e| CopybaraError::Other(format!("failed to render pipeline summary: {e}")))
}

impl serde::Serialize for StepReport {
   fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
      use serde::ser::SerializeStruct;
      let mut s = serializer.serialize_struct("StepReport", 3)?;
      s.serialize_field("describe", &self.describe)?;
      s.serialize_field("outcome", &self.outcome)?;
      s.serialize_field("elapsed_ms", &self.elapsed_ms)?;
      s.end()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn render_summary_includes_each_step_and_final_status() {
      let steps = vec![
         StepReport { describe: "Move(a -> b)".to_string(), outcome: "success".to_string(), elapsed_ms: 12 },
         StepReport { describe: "Replace".to_string(), outcome: "noop".to_string(), elapsed_ms: 3 },
      ];
      let rendered = render_summary(&steps, "success").expect("render");
      assert!(rendered.contains("Move(a -> b)"));
      assert!(rendered.contains("Replace"));
      assert!(rendered.contains("success"));
   }
}
