//! HTML report generation for fixture test results.

use std::{fs, path::Path};

use crate::error::Result;

use super::{CompareResult, ConsistencyCheck, Fixture, RunResult, TestSummary};

/// Generate an HTML report from test results.
pub fn generate_html_report(results: &[RunResult], fixtures: &[Fixture], output_path: &Path) -> Result<()> {
   let summary = TestSummary::from_results(results);
   let html = render_report(results, fixtures, &summary);
   fs::write(output_path, html)?;
   Ok(())
}

fn render_report(results: &[RunResult], fixtures: &[Fixture], summary: &TestSummary) -> String {
   let mut html = String::new();

   html.push_str(&format!(
      r#"<!DOCTYPE html>
<html lang="en">
<head>
   <meta charset="UTF-8">
   <meta name="viewport" content="width=device-width, initial-scale=1.0">
   <title>Fixture Test Report</title>
   <style>
      :root {{
         --bg: #0d1117;
         --fg: #c9d1d9;
         --fg-muted: #8b949e;
         --border: #30363d;
         --bg-card: #161b22;
         --green: #3fb950;
         --red: #f85149;
         --yellow: #d29922;
      }}
      * {{ box-sizing: border-box; margin: 0; padding: 0; }}
      body {{
         font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, sans-serif;
         background: var(--bg);
         color: var(--fg);
         line-height: 1.6;
         padding: 2rem;
      }}
      .container {{ max-width: 1200px; margin: 0 auto; }}
      h1 {{ margin-bottom: 1rem; font-weight: 600; }}
      .summary {{ display: flex; gap: 1rem; margin-bottom: 2rem; flex-wrap: wrap; }}
      .stat {{ background: var(--bg-card); border: 1px solid var(--border); border-radius: 6px; padding: 1rem 1.5rem; min-width: 120px; }}
      .stat-value {{ font-size: 2rem; font-weight: 600; }}
      .stat-label {{ color: var(--fg-muted); font-size: 0.875rem; }}
      .stat.passed .stat-value {{ color: var(--green); }}
      .stat.failed .stat-value {{ color: var(--red); }}
      .stat.no-golden .stat-value {{ color: var(--yellow); }}
      .stat.errors .stat-value {{ color: var(--red); }}
      .fixture {{ background: var(--bg-card); border: 1px solid var(--border); border-radius: 6px; margin-bottom: 1.5rem; overflow: hidden; }}
      .fixture-header {{ padding: 1rem 1.5rem; border-bottom: 1px solid var(--border); display: flex; justify-content: space-between; align-items: center; }}
      .fixture-name {{ font-weight: 600; font-size: 1.1rem; }}
      .fixture-status {{ padding: 0.25rem 0.75rem; border-radius: 20px; font-size: 0.875rem; }}
      .fixture-status.passed {{ background: rgba(63, 185, 80, 0.15); color: var(--green); }}
      .fixture-status.failed {{ background: rgba(248, 81, 73, 0.15); color: var(--red); }}
      .fixture-status.no-golden {{ background: rgba(210, 153, 34, 0.15); color: var(--yellow); }}
      .fixture-status.error {{ background: rgba(248, 81, 73, 0.15); color: var(--red); }}
      .fixture-content {{ padding: 1.5rem; }}
      .path-list {{ list-style: none; font-family: monospace; font-size: 0.875rem; }}
      .path-list li {{ padding: 0.15rem 0; }}
      .error-message {{ background: rgba(248, 81, 73, 0.1); border: 1px solid var(--red); color: var(--red); padding: 1rem; border-radius: 6px; font-family: monospace; font-size: 0.875rem; }}
      .timestamp {{ color: var(--fg-muted); font-size: 0.875rem; margin-bottom: 1rem; }}
      .description {{ color: var(--fg-muted); font-size: 0.875rem; margin-bottom: 0.75rem; }}
   </style>
</head>
<body>
   <div class="container">
      <h1>Fixture Test Report</h1>
      <p class="timestamp">Generated: {}</p>
      <div class="summary">
         <div class="stat"><div class="stat-value">{}</div><div class="stat-label">Total</div></div>
         <div class="stat passed"><div class="stat-value">{}</div><div class="stat-label">Passed</div></div>
         <div class="stat failed"><div class="stat-value">{}</div><div class="stat-label">Failed</div></div>
         <div class="stat no-golden"><div class="stat-value">{}</div><div class="stat-label">No Golden</div></div>
         <div class="stat errors"><div class="stat-value">{}</div><div class="stat-label">Errors</div></div>
      </div>
"#,
      chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
      summary.total,
      summary.passed,
      summary.failed,
      summary.no_golden,
      summary.errors
   ));

   for result in results {
      let fixture = fixtures.iter().find(|f| f.name == result.name);
      html.push_str(&render_fixture_result(result, fixture));
   }

   html.push_str("\n   </div>\n</body>\n</html>\n");
   html
}

fn render_fixture_result(result: &RunResult, fixture: Option<&Fixture>) -> String {
   let consistency_ok = result.consistency.as_ref().is_none_or(|c| c.matched);
   let (status_class, status_text) = if result.error.is_some() {
      ("error", "Error")
   } else if let Some(cmp) = &result.comparison {
      if cmp.passed && consistency_ok { ("passed", "Passed") } else { ("failed", "Failed") }
   } else {
      ("no-golden", "No Golden")
   };

   let mut html = format!(
      r#"
      <div class="fixture {status_class}">
         <div class="fixture-header">
            <span class="fixture-name">{}</span>
            <span class="fixture-status {status_class}">{status_text}</span>
         </div>
         <div class="fixture-content">
"#,
      result.name
   );

   if let Some(f) = fixture
      && !f.meta.description.is_empty()
   {
      html.push_str(&format!(r#"<p class="description">{}</p>"#, html_escape(&f.meta.description)));
   }

   if let Some(err) = &result.error {
      html.push_str(&format!(r#"<div class="error-message">{}</div>"#, html_escape(err)));
      html.push_str("</div></div>\n");
      return html;
   }

   if let Some(cmp) = &result.comparison {
      html.push_str(&render_comparison(cmp));
   } else {
      html.push_str("<p>No golden tree recorded for this fixture.</p>");
   }

   if let Some(consistency) = &result.consistency {
      html.push_str(&render_consistency(consistency));
   }

   html.push_str("</div></div>\n");
   html
}

fn render_comparison(cmp: &CompareResult) -> String {
   let mut html = format!("<p>{}</p>", html_escape(&cmp.summary));
   html.push_str(&render_path_list("Missing (expected, not produced)", &cmp.missing));
   html.push_str(&render_path_list("Unexpected (produced, not expected)", &cmp.unexpected));
   html.push_str(&render_path_list("Differing contents", &cmp.differing));
   html
}

fn render_consistency(consistency: &ConsistencyCheck) -> String {
   let class = if consistency.matched { "passed" } else { "failed" };
   format!(r#"<p class="fixture-status {class}">Consistency file: {}</p>"#, html_escape(&consistency.detail))
}

fn render_path_list(label: &str, paths: &[String]) -> String {
   if paths.is_empty() {
      return String::new();
   }
   let items: String = paths.iter().map(|p| format!("<li>{}</li>", html_escape(p))).collect();
   format!("<h3>{label}</h3><ul class=\"path-list\">{items}</ul>")
}

fn html_escape(s: &str) -> String {
   s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;").replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::testing::fixture::{FixtureInput, FixtureMeta};
   use std::path::PathBuf;

   fn sample_fixture() -> Fixture {
      Fixture {
         name: "move-basic".to_string(),
         meta: FixtureMeta { description: "moves a file".to_string(), tags: vec![] },
         input: FixtureInput { root: PathBuf::from("/tmp/in") },
         golden: None,
      }
   }

   #[test]
   fn report_includes_fixture_name_and_passed_status() {
      let fixtures = vec![sample_fixture()];
      let results = vec![RunResult {
         name: "move-basic".to_string(),
         comparison: Some(CompareResult { missing: vec![], unexpected: vec![], differing: vec![], passed: true, summary: "✓ ok".to_string() }),
         consistency: None,
         error: None,
      }];
      let summary = TestSummary::from_results(&results);
      let html = render_report(&results, &fixtures, &summary);
      assert!(html.contains("move-basic"));
      assert!(html.contains("Passed"));
   }

   #[test]
   fn report_lists_missing_and_unexpected_paths_on_failure() {
      let fixtures = vec![sample_fixture()];
      let results = vec![RunResult {
         name: "move-basic".to_string(),
         comparison: Some(CompareResult {
            missing: vec!["b.txt".to_string()],
            unexpected: vec!["c.txt".to_string()],
            differing: vec![],
            passed: false,
            summary: "✗ 1 missing, 1 unexpected, 0 differing".to_string(),
         }),
         consistency: None,
         error: None,
      }];
      let summary = TestSummary::from_results(&results);
      let html = render_report(&results, &fixtures, &summary);
      assert!(html.contains("b.txt"));
      assert!(html.contains("c.txt"));
      assert!(html.contains("Failed"));
   }
}
