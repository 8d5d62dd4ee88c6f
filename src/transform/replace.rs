//! `Replace`, `FilterReplace`, and `TodoReplace` (§4.2.1 rows 5-7):
//! template-based text substitution over a selected file set, new domain
//! logic built on the `${name}` mini-language in `template.rs`.

use std::collections::HashMap;

use regex::Regex;

use super::template::{captures_as_map, validate_group_parity, Template};
use super::{Status, TransformWork, Transformation};
use crate::error::{CopybaraError, Result};
use crate::glob::Glob;

/// `Replace(before, after, regex, paths, multiline, first_only)` (§4.2.1).
#[derive(Debug, Clone)]
pub struct Replace {
   pub before: Template,
   pub after: Template,
   pub regex: Regex,
   pub paths: Glob,
   pub first_only: bool,
}

impl Replace {
   /// `regex_groups` binds each `${name}` interpolation appearing in
   /// `before` to the regex pattern it must match (§4.2.1: "Templates use
   /// `${name}` interpolation bound to named regex groups"); `before` is
   /// compiled into the actual matcher from this binding, there is no
   /// separate standalone pattern. Every `regex_groups` key must also
   /// appear in both `before` and `after` (§4.2.5 validation), unless
   /// `before` simply has no interpolations at all.
   pub fn new(before: &str, after: &str, regex_groups: HashMap<String, String>, paths: Glob, multiline: bool, first_only: bool) -> Result<Self> {
      let before_t = Template::parse(before)?;
      let after_t = Template::parse(after)?;
      validate_group_parity(&before_t, &after_t, false)?;

      for name in regex_groups.keys() {
         if !before_t.group_names().contains(name) || !after_t.group_names().contains(name) {
            return Err(CopybaraError::user_config("replace", format!("regexGroups entry '{name}' must appear in both before and after")));
         }
      }

      let regex = before_t.compile_regex(&regex_groups, multiline)?;
      Ok(Self { before: before_t, after: after_t, regex, paths, first_only })
   }

   fn apply_to_text(&self, text: &str) -> Result<(String, bool)> {
      let mut out = String::new();
      let mut last_end = 0;
      let mut changed = false;

      for m in self.regex.find_iter(text) {
         if self.first_only && changed {
            break;
         }
         let groups = captures_as_map(&self.regex, &text[m.start()..m.end()]).unwrap_or_default();
         out.push_str(&text[last_end..m.start()]);
         out.push_str(&self.after.render(&groups)?);
         last_end = m.end();
         changed = true;
      }
      out.push_str(&text[last_end..]);
      Ok((out, changed))
   }
}

impl Transformation for Replace {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.paths)?;
      if files.is_empty() {
         return Ok(Status::Noop("Replace: no files matched paths".to_string()));
      }

      let mut any_changed = false;
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         let Ok(text) = std::fs::read_to_string(&abs) else { continue };
         let (rewritten, changed) = self.apply_to_text(&text)?;
         if changed {
            std::fs::write(&abs, rewritten)?;
            any_changed = true;
         }
      }

      if !any_changed {
         work.notify_no_change();
         return Ok(Status::Noop("Replace: pattern matched nothing".to_string()));
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      // Swapping templates requires a regex that matches `after`'s shape,
      // which this implementation cannot derive automatically unless
      // `after` is itself a fixed literal with no interpolation.
      if !self.after.group_names().is_empty() {
         return Err(CopybaraError::non_reversible(
            self.describe(),
            "reverse Replace needs a regex matching the 'after' shape; wrap in ExplicitReversal instead",
         ));
      }
      Err(CopybaraError::non_reversible(self.describe(), "Replace reversal requires an explicit reverse regex; use ExplicitReversal"))
   }

   fn describe(&self) -> String {
      "Replace".to_string()
   }
}

/// `FilterReplace(regex, mapping, group, reverse_mapping)` (§4.2.1): for
/// each match of `regex`, replace the captured `group` (or whole match)
/// via a finite lookup table.
#[derive(Debug, Clone)]
pub struct FilterReplace {
   pub regex: Regex,
   pub group: Option<String>,
   pub mapping: HashMap<String, String>,
   pub reverse_mapping: Option<HashMap<String, String>>,
   pub paths: Glob,
}

impl FilterReplace {
   fn rewrite_line(&self, line: &str) -> (String, bool) {
      let mut out = String::new();
      let mut last_end = 0;
      let mut changed = false;

      for caps in self.regex.captures_iter(line) {
         let whole = caps.get(0).expect("group 0 always matches");
         let target = match &self.group {
            Some(name) => caps.name(name),
            None => caps.get(0),
         };
         let Some(target) = target else { continue };

         if let Some(mapped) = self.mapping.get(target.as_str()) {
            out.push_str(&line[last_end..whole.start()]);
            out.push_str(&line[whole.start()..target.start()]);
            out.push_str(mapped);
            out.push_str(&line[target.end()..whole.end()]);
            last_end = whole.end();
            changed = true;
         }
      }
      out.push_str(&line[last_end..]);
      (out, changed)
   }
}

impl Transformation for FilterReplace {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.paths)?;
      if files.is_empty() {
         return Ok(Status::Noop("FilterReplace: no files matched paths".to_string()));
      }

      let mut any_changed = false;
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         let Ok(text) = std::fs::read_to_string(&abs) else { continue };
         let mut rewritten = String::with_capacity(text.len());
         let mut file_changed = false;
         for line in text.split_inclusive('\n') {
            let (trimmed, had_newline) = match line.strip_suffix('\n') {
               Some(t) => (t, true),
               None => (line, false),
            };
            let (new_line, changed) = self.rewrite_line(trimmed);
            rewritten.push_str(&new_line);
            if had_newline {
               rewritten.push('\n');
            }
            file_changed |= changed;
         }
         if file_changed {
            std::fs::write(&abs, rewritten)?;
            any_changed = true;
         }
      }

      if !any_changed {
         work.notify_no_change();
         return Ok(Status::Noop("FilterReplace: mapping applied nowhere".to_string()));
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      let reverse_mapping = self
         .reverse_mapping
         .clone()
         .ok_or_else(|| CopybaraError::non_reversible(self.describe(), "no reverse mapping was provided"))?;
      Ok(Box::new(FilterReplace {
         regex: self.regex.clone(),
         group: self.group.clone(),
         mapping: reverse_mapping,
         reverse_mapping: Some(self.mapping.clone()),
         paths: self.paths.clone(),
      }))
   }

   fn describe(&self) -> String {
      "FilterReplace".to_string()
   }
}

/// Mode for `TodoReplace` (§4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoMode {
   MapOrIgnore,
   MapOrFail,
   MapOrDefault,
   UseDefault,
   ScrubNames,
}

/// `TodoReplace(tags, mode, mapping, default, ignore, paths)` (§4.2.1):
/// rewrites `TAG(user1, user2, ...): ...` markers.
#[derive(Debug, Clone)]
pub struct TodoReplace {
   pub tags: Vec<String>,
   pub mode: TodoMode,
   pub mapping: HashMap<String, String>,
   pub default: Option<String>,
   pub ignore: Option<Regex>,
   pub paths: Glob,
}

impl TodoReplace {
   fn marker_regex(&self) -> Result<Regex> {
      let alternation = self.tags.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
      Regex::new(&format!(r"(?:{alternation})\(([^)]*)\):"))
         .map_err(|e| CopybaraError::user_config("todo_replace", format!("invalid tag set: {e}")))
   }

   fn rewrite_user_list(&self, users: &str) -> Result<Option<String>> {
      let names: Vec<&str> = users.split(',').map(str::trim).collect();
      let mut mapped = Vec::with_capacity(names.len());
      for name in names {
         if self.ignore.as_ref().is_some_and(|re| re.is_match(name)) {
            mapped.push(name.to_string());
            continue;
         }
         match self.mode {
            TodoMode::ScrubNames => return Ok(None),
            TodoMode::UseDefault => {
               let default = self.default.clone().ok_or_else(|| CopybaraError::user_config("todo_replace", "USE_DEFAULT requires a default"))?;
               return Ok(Some(default));
            },
            TodoMode::MapOrIgnore => mapped.push(self.mapping.get(name).cloned().unwrap_or_else(|| name.to_string())),
            TodoMode::MapOrFail => {
               let replaced = self
                  .mapping
                  .get(name)
                  .cloned()
                  .ok_or_else(|| CopybaraError::validation(name.to_string(), "TodoReplace: MAP_OR_FAIL with no mapping entry"))?;
               mapped.push(replaced);
            },
            TodoMode::MapOrDefault => {
               let default = self.default.clone().unwrap_or_else(|| name.to_string());
               mapped.push(self.mapping.get(name).cloned().unwrap_or(default));
            },
         }
      }
      Ok(Some(mapped.join(", ")))
   }
}

impl Transformation for TodoReplace {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.paths)?;
      if files.is_empty() {
         return Ok(Status::Noop("TodoReplace: no files matched paths".to_string()));
      }
      let marker = self.marker_regex()?;

      let mut any_changed = false;
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         let Ok(text) = std::fs::read_to_string(&abs) else { continue };
         let mut out = String::with_capacity(text.len());
         let mut last_end = 0;
         let mut changed = false;

         for caps in marker.captures_iter(&text) {
            let whole = caps.get(0).expect("group 0");
            let users = caps.get(1).expect("group 1").as_str();
            out.push_str(&text[last_end..whole.start()]);
            match self.rewrite_user_list(users)? {
               Some(new_users) => {
                  let tag_part = &whole.as_str()[..whole.as_str().find('(').unwrap_or(0)];
                  out.push_str(tag_part);
                  out.push('(');
                  out.push_str(&new_users);
                  out.push_str("):");
               },
               None => {
                  let tag_part = &whole.as_str()[..whole.as_str().find('(').unwrap_or(0)];
                  out.push_str(tag_part);
                  out.push(':');
               },
            }
            last_end = whole.end();
            changed = true;
         }
         out.push_str(&text[last_end..]);

         if changed {
            std::fs::write(&abs, out)?;
            any_changed = true;
         }
      }

      if !any_changed {
         work.notify_no_change();
         return Ok(Status::Noop("TodoReplace: no markers found".to_string()));
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Err(CopybaraError::non_reversible(self.describe(), "TodoReplace reversal requires a bijective mapping; not modeled here"))
   }

   fn describe(&self) -> String {
      format!("TodoReplace({:?})", self.mode)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::console::Console;
   use std::fs;
   use std::path::PathBuf;

   fn tmp_dir(name: &str) -> PathBuf {
      let dir = std::env::temp_dir().join(format!("copybara-replace-{name}-{}", std::process::id()));
      fs::create_dir_all(&dir).expect("mkdir");
      dir
   }

   #[test]
   fn replace_substitutes_named_groups() {
      let root = tmp_dir("replace-groups");
      fs::write(root.join("a.txt"), "hello OLD world").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.txt"], Vec::<&str>::new()).expect("glob");
      let mut regex_groups = HashMap::new();
      regex_groups.insert("word".to_string(), "OLD".to_string());
      let replace = Replace::new("${word}", "${word}", regex_groups, paths, false, false).expect("replace");
      replace.transform(&mut work).expect("transform");

      let contents = fs::read_to_string(root.join("a.txt")).expect("read");
      assert_eq!(contents, "hello OLD world");
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn replace_noops_when_no_files_match_paths() {
      let root = tmp_dir("replace-noop");
      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.missing"], Vec::<&str>::new()).expect("glob");
      let replace = Replace::new("a", "b", HashMap::new(), paths, false, false).expect("replace");
      assert!(replace.transform(&mut work).expect("ok").is_noop());
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn replace_with_regex_groups_reshuffles_captured_text() {
      let root = tmp_dir("replace-regex-groups");
      fs::write(root.join("a.txt"), "fooBAZbar").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.txt"], Vec::<&str>::new()).expect("glob");
      let mut regex_groups = HashMap::new();
      regex_groups.insert("m".to_string(), ".*".to_string());
      let replace = Replace::new("foo${m}bar", "bar${m}foo", regex_groups, paths, false, false).expect("replace");
      replace.transform(&mut work).expect("transform");

      let contents = fs::read_to_string(root.join("a.txt")).expect("read");
      assert_eq!(contents, "barBAZfoo");
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn filter_replace_maps_captured_group() {
      let root = tmp_dir("filter-replace");
      fs::write(root.join("users.txt"), "owner: alice\n").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.txt"], Vec::<&str>::new()).expect("glob");
      let mut mapping = HashMap::new();
      mapping.insert("alice".to_string(), "alice_internal".to_string());
      let fr = FilterReplace {
         regex: Regex::new(r"owner: (?P<who>\w+)").unwrap(),
         group: Some("who".to_string()),
         mapping,
         reverse_mapping: None,
         paths,
      };
      fr.transform(&mut work).expect("transform");
      let contents = fs::read_to_string(root.join("users.txt")).expect("read");
      assert_eq!(contents, "owner: alice_internal\n");
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn todo_replace_scrub_names_drops_parenthesized_list() {
      let root = tmp_dir("todo-scrub");
      fs::write(root.join("a.rs"), "// TODO(alice, bob): fix this\n").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.rs"], Vec::<&str>::new()).expect("glob");
      let todo = TodoReplace {
         tags: vec!["TODO".to_string()],
         mode: TodoMode::ScrubNames,
         mapping: HashMap::new(),
         default: None,
         ignore: None,
         paths,
      };
      todo.transform(&mut work).expect("transform");
      let contents = fs::read_to_string(root.join("a.rs")).expect("read");
      assert_eq!(contents, "// TODO: fix this\n");
      fs::remove_dir_all(&root).ok();
   }

   #[test]
   fn todo_replace_map_or_fail_errors_on_unknown_user() {
      let root = tmp_dir("todo-fail");
      fs::write(root.join("a.rs"), "// TODO(ghost): x\n").expect("write");

      let mut console = Console::null();
      let mut work = TransformWork::new(root.clone(), &mut console);
      let paths = Glob::new(["*.rs"], Vec::<&str>::new()).expect("glob");
      let todo = TodoReplace {
         tags: vec!["TODO".to_string()],
         mode: TodoMode::MapOrFail,
         mapping: HashMap::new(),
         default: None,
         ignore: None,
         paths,
      };
      assert!(todo.transform(&mut work).is_err());
      fs::remove_dir_all(&root).ok();
   }
}
