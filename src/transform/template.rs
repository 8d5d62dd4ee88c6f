//! The `${name}` mini-language (§4.2.5): distinct enough from Tera's
//! Jinja2-style syntax to warrant its own hand-rolled tokenizer/renderer
//! (see DESIGN.md) rather than repurposing the teacher's `tera` stack, which
//! stays reserved for the CLI-facing pipeline-summary report.

use std::collections::{BTreeSet, HashMap};

use regex::Regex;

use crate::error::{CopybaraError, Result};

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
   Literal(String),
   Interpolation(String),
}

/// A parsed `${name}` template, ready to render against a set of captured
/// regex groups.
#[derive(Debug, Clone)]
pub struct Template {
   tokens: Vec<Token>,
}

impl Template {
   /// Parse `raw`. `$$` is a literal `$`; `${name}` is an interpolation
   /// (`name` must be non-empty); any other `$` is a syntax error; `\`
   /// preceding any character makes it literal.
   pub fn parse(raw: &str) -> Result<Self> {
      let mut tokens = Vec::new();
      let mut literal = String::new();
      let mut chars = raw.chars().peekable();

      while let Some(c) = chars.next() {
         match c {
            '\\' => match chars.next() {
               Some(escaped) => literal.push(escaped),
               None => return Err(CopybaraError::user_config("template", "trailing backslash")),
            },
            '$' => match chars.peek() {
               Some('$') => {
                  chars.next();
                  literal.push('$');
               },
               Some('{') => {
                  chars.next();
                  let mut name = String::new();
                  let mut closed = false;
                  for c in chars.by_ref() {
                     if c == '}' {
                        closed = true;
                        break;
                     }
                     name.push(c);
                  }
                  if !closed || name.is_empty() {
                     return Err(CopybaraError::user_config("template", "malformed ${name} interpolation"));
                  }
                  if !literal.is_empty() {
                     tokens.push(Token::Literal(std::mem::take(&mut literal)));
                  }
                  tokens.push(Token::Interpolation(name));
               },
               _ => return Err(CopybaraError::user_config("template", "bare '$' is not valid; use '$$' or '${name}'")),
            },
            other => literal.push(other),
         }
      }
      if !literal.is_empty() {
         tokens.push(Token::Literal(literal));
      }
      Ok(Self { tokens })
   }

   /// The set of group names this template interpolates, in first-use
   /// order of appearance (deduplicated).
   pub fn group_names(&self) -> BTreeSet<String> {
      self.tokens
         .iter()
         .filter_map(|t| match t {
            Token::Interpolation(name) => Some(name.clone()),
            Token::Literal(_) => None,
         })
         .collect()
   }

   /// Compile this template into the regex it matches: literal segments are
   /// escaped, and each `${name}` interpolation becomes a named capture
   /// group `(?P<name>pattern)` bound to `groups[name]` (§4.2.1 `Replace`'s
   /// `regexGroups`). Every interpolated name must have an entry in
   /// `groups`; `multiline` prefixes `(?m)`.
   pub fn compile_regex(&self, groups: &HashMap<String, String>, multiline: bool) -> Result<Regex> {
      let mut pattern = String::new();
      if multiline {
         pattern.push_str("(?m)");
      }
      for token in &self.tokens {
         match token {
            Token::Literal(s) => pattern.push_str(&regex::escape(s)),
            Token::Interpolation(name) => {
               let group_pattern = groups
                  .get(name)
                  .ok_or_else(|| CopybaraError::user_config("replace", format!("before interpolates '${{{name}}}' with no matching regexGroups entry")))?;
               pattern.push_str(&format!("(?P<{name}>{group_pattern})"));
            },
         }
      }
      Regex::new(&pattern).map_err(|e| CopybaraError::user_config("replace", format!("invalid compiled regex: {e}")))
   }

   /// Render against a set of named captures, failing if any interpolated
   /// name has no binding.
   pub fn render(&self, groups: &std::collections::HashMap<String, String>) -> Result<String> {
      let mut out = String::new();
      for token in &self.tokens {
         match token {
            Token::Literal(s) => out.push_str(s),
            Token::Interpolation(name) => match groups.get(name) {
               Some(value) => out.push_str(value),
               None => return Err(CopybaraError::user_config("template", format!("unbound group '${{{name}}}'"))),
            },
         }
      }
      Ok(out)
   }
}

/// Validate that `before` and `after` templates use exactly corresponding
/// groups: every interpolation in `before` appears in `after` and vice
/// versa, unless `allow_unused` is set (for callers like `FilterReplace`
/// that legitimately interpolate only a subset).
pub fn validate_group_parity(before: &Template, after: &Template, allow_unused: bool) -> Result<()> {
   if allow_unused {
      return Ok(());
   }
   let before_groups = before.group_names();
   let after_groups = after.group_names();
   if before_groups != after_groups {
      return Err(CopybaraError::user_config(
         "template",
         format!("group mismatch between before ({before_groups:?}) and after ({after_groups:?})"),
      ));
   }
   Ok(())
}

/// Extract named-group captures from a regex match against `input`,
/// keyed by group name.
pub fn captures_as_map(regex: &Regex, input: &str) -> Option<std::collections::HashMap<String, String>> {
   let caps = regex.captures(input)?;
   let mut map = std::collections::HashMap::new();
   for name in regex.capture_names().flatten() {
      if let Some(m) = caps.name(name) {
         map.insert(name.to_string(), m.as_str().to_string());
      }
   }
   Some(map)
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::collections::HashMap;

   #[test]
   fn literal_dollar_dollar_renders_as_single_dollar() {
      let t = Template::parse("cost: $$5").expect("parse");
      assert_eq!(t.render(&HashMap::new()).expect("render"), "cost: $5");
   }

   #[test]
   fn interpolation_binds_named_group() {
      let t = Template::parse("hello ${name}!").expect("parse");
      let mut groups = HashMap::new();
      groups.insert("name".to_string(), "world".to_string());
      assert_eq!(t.render(&groups).expect("render"), "hello world!");
   }

   #[test]
   fn unbound_interpolation_is_an_error() {
      let t = Template::parse("${missing}").expect("parse");
      assert!(t.render(&HashMap::new()).is_err());
   }

   #[test]
   fn bare_dollar_is_a_syntax_error() {
      assert!(Template::parse("$oops").is_err());
   }

   #[test]
   fn empty_interpolation_name_is_invalid() {
      assert!(Template::parse("${}").is_err());
   }

   #[test]
   fn backslash_escapes_any_character() {
      let t = Template::parse("\\$literal").expect("parse");
      assert_eq!(t.render(&HashMap::new()).expect("render"), "$literal");
   }

   #[test]
   fn compile_regex_binds_named_groups_from_regex_groups_map() {
      let t = Template::parse("foo${m}bar").expect("parse");
      let mut groups = HashMap::new();
      groups.insert("m".to_string(), ".*".to_string());
      let regex = t.compile_regex(&groups, false).expect("compile");
      let caps = regex.captures("fooBAZbar").expect("match");
      assert_eq!(&caps["m"], "BAZ");
   }

   #[test]
   fn compile_regex_fails_when_interpolation_has_no_group_entry() {
      let t = Template::parse("foo${m}bar").expect("parse");
      assert!(t.compile_regex(&HashMap::new(), false).is_err());
   }

   #[test]
   fn group_parity_rejects_mismatched_templates() {
      let before = Template::parse("${a}-${b}").expect("parse");
      let after = Template::parse("${a}").expect("parse");
      assert!(validate_group_parity(&before, &after, false).is_err());
      assert!(validate_group_parity(&before, &after, true).is_ok());
   }
}
