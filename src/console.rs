//! The write-only sink threaded through `TransformWork` (§3).
//!
//! Not part of the distilled core (logging/console UI is listed as an
//! external collaborator in spec §1), but any runnable implementation needs
//! a concrete sink to hand transformations — this is it, built on the same
//! styling primitives as the rest of the ambient console layer.

use std::io::Write;

use crate::style;

/// A write-only sink for transformation progress output.
///
/// `Console::null()` is used in tests and library embeddings that don't
/// want terminal output at all.
pub struct Console {
   sink: Box<dyn Write + Send>,
   styled: bool,
}

impl Console {
   /// A console that writes to stderr, styled according to terminal
   /// capability and `NO_COLOR`.
   pub fn stderr() -> Self {
      Self { sink: Box::new(std::io::stderr()), styled: style::colors_enabled() }
   }

   /// A console that discards everything written to it.
   pub fn null() -> Self {
      Self { sink: Box::new(std::io::sink()), styled: false }
   }

   /// A console writing into an in-memory buffer, for tests that want to
   /// assert on captured output.
   pub fn buffer() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
      let buf = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
      (Self { sink: Box::new(BufferWriter(buf.clone())), styled: false }, buf)
   }

   pub fn info(&mut self, msg: &str) {
      self.line("info", msg, style::info);
   }

   pub fn warn(&mut self, msg: &str) {
      self.line("warn", msg, style::warning);
   }

   pub fn error(&mut self, msg: &str) {
      self.line("error", msg, style::error);
   }

   pub fn progress(&mut self, msg: &str) {
      self.line("...", msg, style::dim);
   }

   /// `style_fn` bakes in ANSI codes (subject to the global terminal/
   /// `NO_COLOR` check in `style::colors_enabled`); applied only when this
   /// console was constructed with styling on, so `Console::null`/`buffer`
   /// always emit plain tags regardless of the ambient terminal.
   fn line(&mut self, tag: &str, msg: &str, style_fn: impl Fn(&str) -> String) {
      let tag = if self.styled { style_fn(tag) } else { tag.to_string() };
      let _ = writeln!(self.sink, "[{tag}] {msg}");
   }
}

struct BufferWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl Write for BufferWriter {
   fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      self.0.lock().expect("console buffer poisoned").extend_from_slice(buf);
      Ok(buf.len())
   }

   fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn buffer_captures_lines() {
      let (mut console, buf) = Console::buffer();
      console.info("hello");
      console.warn("careful");
      let out = String::from_utf8(buf.lock().expect("poisoned").clone()).expect("utf8");
      assert!(out.contains("hello"));
      assert!(out.contains("careful"));
   }

   #[test]
   fn null_console_does_not_panic() {
      let mut console = Console::null();
      console.info("ignored");
   }

   #[test]
   fn unstyled_console_never_emits_ansi_escapes() {
      let (mut console, buf) = Console::buffer();
      console.info("hello");
      console.warn("careful");
      console.error("broken");
      let out = String::from_utf8(buf.lock().expect("poisoned").clone()).expect("utf8");
      assert!(!out.contains('\x1b'));
   }
}
