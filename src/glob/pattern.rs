//! Shell-style pattern compilation (§4.1): `*`, `**`, `?`, `[…]`, `{a,b}`,
//! and backslash-escapes, compiled once into an anchored `regex::Regex`.
//!
//! Translating the grammar component-by-component (rather than hand-rolling
//! a matcher loop) follows the approach of the pack's glob engines — the
//! pantsbuild `glob_matching.rs` normalizes into path components before
//! building matchers; here the whole pattern is transliterated directly
//! into a single anchored regex, which is simpler for an engine whose only
//! consumer is `str::is_match` rather than an incremental directory walker.

use regex::Regex;

use crate::error::{CopybaraError, Result};

/// A single compiled shell-style pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
   raw: String,
   regex: Regex,
}

impl Pattern {
   pub fn compile(raw: &str) -> Result<Self> {
      if raw.is_empty() {
         return Err(CopybaraError::user_config("glob", "InvalidGlob: empty pattern"));
      }
      let body = translate(raw)?;
      let anchored = format!("^{body}$");
      let regex = Regex::new(&anchored)
         .map_err(|e| CopybaraError::user_config("glob", format!("InvalidGlob: {raw}: {e}")))?;
      Ok(Self { raw: raw.to_string(), regex })
   }

   pub fn is_match(&self, path: &str) -> bool {
      self.regex.is_match(path)
   }

   pub fn as_str(&self) -> &str {
      &self.raw
   }

   /// The literal directory prefix below which every character up to the
   /// first meta character is fixed — used to compute `Roots()`. A leading
   /// `**` (nothing literal before it) yields `""`.
   pub fn literal_prefix(&self) -> String {
      let mut out = String::new();
      let mut chars = self.raw.chars().peekable();
      let mut last_slash = 0usize;

      while let Some(c) = chars.next() {
         match c {
            '\\' => {
               if let Some(escaped) = chars.next() {
                  out.push(escaped);
               }
            },
            '*' | '?' | '[' | '{' => {
               out.truncate(last_slash);
               return out;
            },
            '/' => {
               last_slash = out.len();
               out.push('/');
            },
            other => out.push(other),
         }
      }
      out
   }

   /// True if this pattern, with no exclusions in play, denotes "everything
   /// under `prefix`" — i.e. it is exactly `prefix/**` (or `**` for the
   /// repo root). Used to compute `Tips()`.
   pub fn full_subtree_prefix(&self) -> Option<String> {
      if self.raw == "**" {
         return Some(String::new());
      }
      self.raw.strip_suffix("/**").map(str::to_string)
   }
}

impl PartialEq for Pattern {
   fn eq(&self, other: &Self) -> bool {
      self.raw == other.raw
   }
}
impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
   fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
      self.raw.hash(state);
   }
}

/// Translate one shell-style pattern into a regex body (no anchors).
fn translate(raw: &str) -> Result<String> {
   let mut out = String::new();
   let mut chars = raw.chars().peekable();

   while let Some(c) = chars.next() {
      match c {
         '\\' => match chars.next() {
            Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
            None => return Err(CopybaraError::user_config("glob", format!("InvalidGlob: {raw}: trailing backslash"))),
         },
         '*' => {
            if chars.peek() == Some(&'*') {
               chars.next();
               // `**/` collapses the slash into the match so `a/**/b` can
               // match `a/b` directly, matching gitignore-style semantics.
               if chars.peek() == Some(&'/') {
                  chars.next();
                  out.push_str("(?:.*/)?");
               } else {
                  out.push_str(".*");
               }
            } else {
               out.push_str("[^/]*");
            }
         },
         '?' => out.push_str("[^/]"),
         '[' => {
            let mut class = String::from("[");
            let mut closed = false;
            if chars.peek() == Some(&'!') {
               chars.next();
               class.push('^');
            }
            for c in chars.by_ref() {
               class.push(c);
               if c == ']' {
                  closed = true;
                  break;
               }
            }
            if !closed {
               return Err(CopybaraError::user_config("glob", format!("InvalidGlob: {raw}: unbalanced brackets")));
            }
            out.push_str(&class);
         },
         '{' => {
            let mut depth = 1;
            let mut body = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
               match c {
                  '{' => {
                     depth += 1;
                     body.push(c);
                  },
                  '}' => {
                     depth -= 1;
                     if depth == 0 {
                        closed = true;
                        break;
                     }
                     body.push(c);
                  },
                  other => body.push(other),
               }
            }
            if !closed {
               return Err(CopybaraError::user_config("glob", format!("InvalidGlob: {raw}: unbalanced braces")));
            }
            let alternatives = body
               .split(',')
               .map(translate)
               .collect::<Result<Vec<_>>>()?;
            out.push_str("(?:");
            out.push_str(&alternatives.join("|"));
            out.push(')');
         },
         other => out.push_str(&regex::escape(&other.to_string())),
      }
   }

   Ok(out)
}
