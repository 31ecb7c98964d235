use std::ops::Range;

use crate::message::{LevelStyle, StyledText};

use super::RenderError;

/// Contiguous stretch of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub style: LevelStyle,
    pub range: Range<usize>,
}

/// Append-only styled text with a line index.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    runs: Vec<StyledRun>,
    line_starts: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            runs: Vec::new(),
            line_starts: vec![0],
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    /// Inserts `item` at `offset`. Only the end of the document is a valid
    /// position.
    pub fn insert(&mut self, offset: usize, item: &StyledText) -> Result<(), RenderError> {
        if offset != self.text.len() {
            return Err(RenderError::InvalidPosition {
                offset,
                len: self.text.len(),
            });
        }
        if item.text.is_empty() {
            return Ok(());
        }

        let start = self.text.len();
        self.text.push_str(&item.text);
        let end = self.text.len();

        self.line_starts.extend(
            item.text
                .match_indices('\n')
                .map(|(pos, _)| start + pos + 1),
        );

        match self.runs.last_mut() {
            Some(last) if last.style == item.style && last.range.end == start => {
                last.range.end = end;
            }
            _ => self.runs.push(StyledRun {
                style: item.style,
                range: start..end,
            }),
        }
        Ok(())
    }

    /// Number of displayable lines; a trailing newline does not open a new one.
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else if self.text.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    fn line_range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.line_count() {
            return None;
        }
        let start = self.line_starts[index];
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        Some(start..end)
    }

    /// Styled fragments of line `index`, without its newline.
    pub fn line(&self, index: usize) -> Vec<(LevelStyle, &str)> {
        let Some(range) = self.line_range(index) else {
            return Vec::new();
        };

        let first = self.runs.partition_point(|run| run.range.end <= range.start);
        let mut spans = Vec::new();
        for run in &self.runs[first..] {
            if run.range.start >= range.end {
                break;
            }
            let from = run.range.start.max(range.start);
            let to = run.range.end.min(range.end);
            if from < to {
                spans.push((run.style, &self.text[from..to]));
            }
        }
        spans
    }
}
