use std::ops::{Deref, DerefMut};

/// Text buffer that prefixes every line with the current indentation.
///
/// Nesting goes through [`IndentedTextWriter::block`] or
/// [`IndentedTextWriter::indent`], whose guards restore the previous level when
/// dropped.
#[derive(Debug)]
pub struct IndentedTextWriter {
    buffer: String,
    unit: String,
    level: usize,
}

impl IndentedTextWriter {
    pub fn new(unit: impl Into<String>) -> Self {
        IndentedTextWriter {
            buffer: String::with_capacity(4096),
            unit: unit.into(),
            level: 0,
        }
    }

    /// Write one indented line. Empty lines carry no indentation.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.level {
                self.buffer.push_str(&self.unit);
            }
            self.buffer.push_str(text);
        }
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Write each line of `text` at the current indentation.
    pub fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    /// Increase the indent until the guard is dropped.
    pub fn indent(&mut self) -> IndentGuard<'_> {
        self.level += 1;
        IndentGuard {
            writer: self,
            closing: None,
        }
    }

    /// Write `{`, indent, and write `}` when the guard is dropped.
    pub fn block(&mut self) -> IndentGuard<'_> {
        self.block_with_closing("}")
    }

    /// Like [`Self::block`] with a custom closing line such as `};`.
    pub fn block_with_closing(&mut self, closing: &'static str) -> IndentGuard<'_> {
        self.line("{");
        self.level += 1;
        IndentGuard {
            writer: self,
            closing: Some(closing),
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

pub struct IndentGuard<'a> {
    writer: &'a mut IndentedTextWriter,
    closing: Option<&'static str>,
}

impl Deref for IndentGuard<'_> {
    type Target = IndentedTextWriter;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for IndentGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.writer.level -= 1;
        if let Some(closing) = self.closing {
            self.writer.line(closing);
        }
    }
}
