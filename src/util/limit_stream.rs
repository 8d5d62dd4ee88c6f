//! `LimitFilterOutputStream` (§5): bounds the stdout/stderr a subprocess can
//! accumulate. After `cap` bytes, a fixed suffix is emitted once and the
//! remainder is silently dropped — a runaway subprocess cannot exhaust
//! memory or blow up a log.

use std::io::{self, Write};

const TRUNCATION_SUFFIX: &str = "\n... [output truncated]\n";

/// Wraps any `Write` sink, capping the bytes that reach it.
pub struct LimitFilterOutputStream<W: Write> {
   inner: W,
   cap: usize,
   written: usize,
   suffix_emitted: bool,
}

impl<W: Write> LimitFilterOutputStream<W> {
   pub fn new(inner: W, cap: usize) -> Self {
      Self { inner, cap, written: 0, suffix_emitted: false }
   }

   pub fn into_inner(self) -> W {
      self.inner
   }
}

impl<W: Write> Write for LimitFilterOutputStream<W> {
   fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      if self.written >= self.cap {
         if !self.suffix_emitted {
            self.inner.write_all(TRUNCATION_SUFFIX.as_bytes())?;
            self.suffix_emitted = true;
         }
         return Ok(buf.len());
      }

      let remaining = self.cap - self.written;
      if buf.len() <= remaining {
         self.inner.write_all(buf)?;
         self.written += buf.len();
      } else {
         self.inner.write_all(&buf[..remaining])?;
         self.written = self.cap;
         self.inner.write_all(TRUNCATION_SUFFIX.as_bytes())?;
         self.suffix_emitted = true;
      }

      Ok(buf.len())
   }

   fn flush(&mut self) -> io::Result<()> {
      self.inner.flush()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn passes_through_under_cap() {
      let mut buf = Vec::new();
      {
         let mut stream = LimitFilterOutputStream::new(&mut buf, 1024);
         stream.write_all(b"hello").expect("write");
      }
      assert_eq!(buf, b"hello");
   }

   #[test]
   fn truncates_once_over_cap() {
      let mut buf = Vec::new();
      {
         let mut stream = LimitFilterOutputStream::new(&mut buf, 4);
         stream.write_all(b"hello world").expect("write");
         stream.write_all(b"more").expect("write");
      }
      let out = String::from_utf8(buf).expect("utf8");
      assert!(out.starts_with("hell"));
      assert_eq!(out.matches("truncated").count(), 1);
   }
}
