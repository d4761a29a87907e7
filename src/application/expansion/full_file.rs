//! Full-file expansion: every fold of the inline representation is replaced
//! by the blob lines it hides.

use crate::application::normalize::strip_diff_marker;
use crate::domain::{ContentLine, DiffLine, LineKind, LineNumbers, RawLine, line_code_for};

/// A lazy, restartable sequence of expanded lines consumed in chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedLines {
    lines: Vec<DiffLine>,
    cursor: usize,
}

impl ExpandedLines {
    pub fn new(lines: Vec<DiffLine>) -> Self {
        Self { lines, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.lines.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    /// Hands out up to `size` lines and advances.
    pub fn next_chunk(&mut self, size: usize) -> Vec<DiffLine> {
        let end = (self.cursor + size).min(self.lines.len());
        let chunk = self.lines[self.cursor..end].to_vec();
        self.cursor = end;
        chunk
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for ExpandedLines {
    type Item = DiffLine;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(line)
    }
}

/// Replaces each fold with `blob[before.new .. after.new - 1]`, numbering the
/// inserted lines from the line before the fold.
pub fn convert_expand_lines(lines: &[DiffLine], blob: &[RawLine], file_hash: &str) -> Vec<DiffLine> {
    let mut expanded = Vec::with_capacity(lines.len().max(blob.len()));

    for (index, line) in lines.iter().enumerate() {
        if !line.is_match() {
            expanded.push(line.clone());
            continue;
        }

        let before = index.checked_sub(1).map(|i| &lines[i]);
        let after = lines.get(index + 1);
        let start = before.and_then(DiffLine::new_line).unwrap_or(0) as usize;
        let end = after
            .and_then(DiffLine::new_line)
            .map(|new_line| (new_line as usize).saturating_sub(1))
            .unwrap_or(blob.len())
            .min(blob.len());
        if start >= end {
            continue;
        }

        let old_base = before.and_then(DiffLine::old_line).unwrap_or(0);
        let new_base = before.and_then(DiffLine::new_line).unwrap_or(0);
        for (offset, raw) in blob[start..end].iter().enumerate() {
            let step = offset as u32 + 1;
            let numbers = LineNumbers::new(old_base + step, new_base + step);
            let text = raw.rich_text.as_deref().or(raw.text.as_deref()).unwrap_or("");
            expanded.push(DiffLine::Content(ContentLine::new(
                line_code_for(file_hash, numbers),
                LineKind::Context,
                numbers,
                strip_diff_marker(text).to_string(),
            )));
        }
    }

    expanded
}
