//! `VerifyMatch` and `ConvertEncoding` (§4.2.1 rows 8-9): a read-only
//! assertion and a charset round-trip, both new domain logic.

use regex::Regex;

use super::{Status, TransformWork, Transformation};
use crate::error::{CopybaraError, Result};
use crate::glob::Glob;

/// `VerifyMatch(regex, verify_no_match, paths)` (§4.2.1). Never mutates;
/// self-reversing (running it again performs the same assertion).
#[derive(Debug, Clone)]
pub struct VerifyMatch {
   pub regex: Regex,
   pub verify_no_match: bool,
   pub paths: Glob,
}

impl Transformation for VerifyMatch {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.paths)?;
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         let Ok(text) = std::fs::read_to_string(&abs) else { continue };
         let matched = self.regex.is_match(&text);
         if matched == self.verify_no_match {
            return Err(CopybaraError::validation(
               rel.display().to_string(),
               if self.verify_no_match { "VerifyMatch: forbidden pattern present" } else { "VerifyMatch: required pattern missing" },
            ));
         }
      }
      work.notify_no_change();
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Ok(Box::new(self.clone()))
   }

   fn describe(&self) -> String {
      format!("VerifyMatch(verify_no_match={})", self.verify_no_match)
   }
}

/// `ConvertEncoding(before, after, paths)` (§4.2.1): currently supports the
/// identity pair plus UTF-8 <-> Latin-1, since Latin-1 maps 1:1 onto the
/// first 256 Unicode code points and needs no external codec crate to
/// round-trip. A general multi-codec conversion (Shift-JIS, UTF-16, etc.)
/// would need a dedicated encoding crate and is not wired up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
   Utf8,
   Latin1,
}

#[derive(Debug, Clone)]
pub struct ConvertEncoding {
   pub before: Charset,
   pub after: Charset,
   pub paths: Glob,
}

impl ConvertEncoding {
   fn decode(bytes: &[u8], charset: Charset) -> Result<String> {
      match charset {
         Charset::Utf8 => {
            String::from_utf8(bytes.to_vec()).map_err(|e| CopybaraError::validation("ConvertEncoding", format!("invalid utf-8: {e}")))
         },
         Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
      }
   }

   fn encode(text: &str, charset: Charset) -> Result<Vec<u8>> {
      match charset {
         Charset::Utf8 => Ok(text.as_bytes().to_vec()),
         Charset::Latin1 => text
            .chars()
            .map(|c| u8::try_from(c as u32).map_err(|_| CopybaraError::validation("ConvertEncoding", format!("{c:?} is outside Latin-1"))))
            .collect(),
      }
   }
}

impl Transformation for ConvertEncoding {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let files = work.find(&self.paths)?;
      if files.is_empty() {
         return Ok(Status::Noop("ConvertEncoding: no files matched paths".to_string()));
      }
      for rel in &files {
         let abs = work.checkout_root.join(rel);
         let bytes = std::fs::read(&abs)?;
         let text = Self::decode(&bytes, self.before)?;
         let reencoded = Self::encode(&text, self.after)?;
         std::fs::write(&abs, reencoded)?;
      }
      Ok(Status::Success)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Ok(Box::new(ConvertEncoding { before: self.after, after: self.before, paths: self.paths.clone() }))
   }

   fn describe(&self) -> String {
      format!("ConvertEncoding({:?} -> {:?})", self.before, self.after)
   }
}
