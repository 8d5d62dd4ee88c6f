//! `Link` header parsing for paginated GET (§4.4.2), new logic — the
//! teacher's `api.rs` never paginates (a chat completion is one response),
//! so this is grounded only in the spec's own grammar description.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CopybaraError, Result};

static LINK_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^<(?P<url>[^>]*)>\s*;\s*rel="(?P<rel>[^"]*)"$"#).expect("static regex"));

/// Parse a `Link: <url1>; rel="next", <url2>; rel="prev"` header value and
/// return the URL tagged `rel="next"`, if present. A tuple that doesn't
/// match the expected grammar is a `Verify` failure, not a silent skip.
pub fn next_link(header_value: &str, url_for_error: &str) -> Result<Option<String>> {
   for raw_entry in header_value.split(',') {
      let entry = raw_entry.trim();
      if entry.is_empty() {
         continue;
      }
      let caps = LINK_ENTRY
         .captures(entry)
         .ok_or_else(|| CopybaraError::Verify { url: url_for_error.to_string(), detail: format!("malformed Link entry: {entry}") })?;
      if &caps["rel"] == "next" {
         return Ok(Some(caps["url"].to_string()));
      }
   }
   Ok(None)
}

/// Validate that `next_url` begins with `base_url` exactly as configured
/// (no canonicalization — see DESIGN.md's Open Question decision), then
/// strip the prefix so the caller can re-join it with the transport's own
/// base-URL handling.
pub fn strip_base(next_url: &str, base_url: &str) -> Result<String> {
   next_url
      .strip_prefix(base_url)
      .map(str::to_string)
      .ok_or_else(|| CopybaraError::Verify {
         url: next_url.to_string(),
         detail: format!("next page URL does not start with configured base URL {base_url}"),
      })
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn next_link_finds_rel_next_among_multiple_entries() {
      let header = r#"<https://example.com/a?page=2>; rel="next", <https://example.com/a?page=1>; rel="prev""#;
      assert_eq!(next_link(header, "https://example.com/a").expect("parse").as_deref(), Some("https://example.com/a?page=2"));
   }

   #[test]
   fn next_link_absent_returns_none() {
      let header = r#"<https://example.com/a?page=1>; rel="prev""#;
      assert_eq!(next_link(header, "https://example.com/a").expect("parse"), None);
   }

   #[test]
   fn malformed_link_entry_is_a_verify_error() {
      let header = "not a link header at all";
      assert!(next_link(header, "https://example.com").is_err());
   }

   #[test]
   fn strip_base_rejects_mismatched_prefix() {
      assert!(strip_base("https://evil.example.com/next", "https://example.com").is_err());
      assert_eq!(strip_base("https://example.com/next", "https://example.com").expect("ok"), "/next");
   }
}
