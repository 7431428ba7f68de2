use crate::chars;

use super::{InputBuffer, Position};

/// Plain character buffer over a string, with an eagerly-built line index.
#[derive(Debug, Clone)]
pub struct DefaultInputBuffer {
    chars: Vec<char>,
    line_starts: Vec<usize>,
}

impl DefaultInputBuffer {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (i, &c) in chars.iter().enumerate() {
            match c {
                '\n' => line_starts.push(i + 1),
                // A bare \r ends a line; \r\n is handled by the \n arm.
                '\r' if chars.get(i + 1) != Some(&'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }
        Self { chars, line_starts }
    }
}

impl InputBuffer for DefaultInputBuffer {
    fn char_at(&self, index: usize) -> char {
        self.chars.get(index).copied().unwrap_or(chars::EOI)
    }

    fn length(&self) -> usize {
        self.chars.len()
    }

    fn extract(&self, start: usize, end: usize) -> String {
        let start = start.min(self.chars.len());
        let end = end.clamp(start, self.chars.len());
        self.chars[start..end].iter().collect()
    }

    fn extract_line(&self, line: usize) -> String {
        let Some(&start) = self.line_starts.get(line.wrapping_sub(1)) else {
            return String::new();
        };
        let mut end = start;
        while end < self.chars.len() && self.chars[end] != '\n' && self.chars[end] != '\r' {
            end += 1;
        }
        self.chars[start..end].iter().collect()
    }

    fn position_of(&self, index: usize) -> Position {
        let index = index.min(self.chars.len());
        let line = self.line_starts.partition_point(|&s| s <= index);
        Position {
            line,
            column: index - self.line_starts[line - 1] + 1,
        }
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
