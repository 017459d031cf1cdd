#![forbid(unsafe_code)]

//! Borrowed views over runs of a backing text buffer.

use std::ops::Range;

/// An immutable view over a contiguous run of a backing buffer.
///
/// Typically one editor line. Offsets are byte offsets into `buffer`; the
/// range always lies on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    buffer: &'a str,
    start: usize,
    end: usize,
}

impl<'a> Segment<'a> {
    /// View `range` of `buffer`.
    ///
    /// Returns `None` if the range is inverted, out of bounds, or splits a
    /// UTF-8 sequence.
    pub fn new(buffer: &'a str, range: Range<usize>) -> Option<Self> {
        buffer.get(range.clone())?;
        Some(Self {
            buffer,
            start: range.start,
            end: range.end,
        })
    }

    /// View the whole of `text`.
    pub fn whole(text: &'a str) -> Self {
        Self {
            buffer: text,
            start: 0,
            end: text.len(),
        }
    }

    /// The viewed text.
    pub fn as_str(&self) -> &'a str {
        &self.buffer[self.start..self.end]
    }

    /// The viewed bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.as_str().as_bytes()
    }

    /// The full backing buffer.
    pub fn buffer(&self) -> &'a str {
        self.buffer
    }

    /// Range of this view within the backing buffer.
    pub fn buffer_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Split `text` into one segment per line, each viewing `text` itself.
    ///
    /// LF, CRLF and bare CR all end a line and are excluded from the
    /// segments, so `buffer_range().start` is the line's absolute offset. A
    /// trailing line ending does not produce a final empty line.
    pub fn lines(text: &'a str) -> Vec<Self> {
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let mut pos = 0;
        while pos < bytes.len() {
            let width = match bytes[pos] {
                b'\n' => 1,
                b'\r' if bytes.get(pos + 1) == Some(&b'\n') => 2,
                b'\r' => 1,
                _ => {
                    pos += 1;
                    continue;
                }
            };
            lines.push(Self {
                buffer: text,
                start,
                end: pos,
            });
            pos += width;
            start = pos;
        }
        if start < bytes.len() {
            lines.push(Self {
                buffer: text,
                start,
                end: bytes.len(),
            });
        }
        lines
    }

    /// Sub-view relative to this segment, or `None` if out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range.end > self.len() {
            return None;
        }
        Self::new(self.buffer, self.start + range.start..self.start + range.end)
    }
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(text: &'a str) -> Self {
        Self::whole(text)
    }
}
