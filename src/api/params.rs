//! Ordered query parameters (§4.4.1): an insertion-ordered, duplicate-key-
//! preserving list, generalized from the teacher's `api.rs` request-body
//! construction to the GitLab-shaped query-string convention.

/// An ordered list of `(key, value)` pairs. Not `IndexMap` — duplicate keys
/// (e.g. `tag[]=a&tag[]=b`) must be preserved, which `IndexMap` cannot do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
   pub fn new() -> Self {
      Self(Vec::new())
   }

   pub fn push(&mut self, key: impl Into<String>, value: impl std::fmt::Display) -> &mut Self {
      self.0.push((key.into(), value.to_string()));
      self
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   /// RFC 3986 percent-encode both sides, preserving insertion order and
   /// duplicate keys, joined with `&`.
   pub fn query_string(&self) -> String {
      self.0
         .iter()
         .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
         .collect::<Vec<_>>()
         .join("&")
   }
}

fn percent_encode(raw: &str) -> String {
   let mut out = String::with_capacity(raw.len());
   for byte in raw.as_bytes() {
      match byte {
         b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(*byte as char),
         other => out.push_str(&format!("%{other:02X}")),
      }
   }
   out
}

/// Join a path with an already-built query string, appending `?` or `&`
/// depending on whether `path` already contains a `?`.
pub fn join_query(path: &str, extra: &str) -> String {
   if extra.is_empty() {
      return path.to_string();
   }
   let sep = if path.contains('?') { '&' } else { '?' };
   format!("{path}{sep}{extra}")
}
