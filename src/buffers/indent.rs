use crate::chars;
use crate::errors::ParseError;

use super::{default::DefaultInputBuffer, InputBuffer, Position};

/// Default tab width used when measuring indentation prefixes.
pub const DEFAULT_TAB_STOP: usize = 8;

/// Buffer that converts leading-whitespace indentation into the `INDENT`
/// and `DEDENT` sentinel characters.
///
/// Each non-blank line's whitespace prefix is measured against a stack of
/// indentation columns: a wider prefix pushes a level and emits `INDENT`, a
/// narrower one emits a `DEDENT` per popped level. Blank lines contribute
/// only their terminator and leave the stack untouched; levels still open
/// at end of input are closed with trailing `DEDENT`s. A prefix mixing tabs
/// and spaces is rejected at the offending index.
///
/// Every converted character remembers the original index it came from, so
/// positions and line extraction report against the original text.
#[derive(Debug)]
pub struct IndentDedentInputBuffer {
    converted: Vec<char>,
    origins: Vec<usize>,
    inner: DefaultInputBuffer,
}

impl IndentDedentInputBuffer {
    pub fn new(text: &str) -> Result<Self, ParseError> {
        Self::with_tab_stop(text, DEFAULT_TAB_STOP)
    }

    pub fn with_tab_stop(text: &str, tab_stop: usize) -> Result<Self, ParseError> {
        let source: Vec<char> = text.chars().collect();
        let mut converted = Vec::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        let mut levels: Vec<usize> = vec![0];

        fn emit(c: char, origin: usize, converted: &mut Vec<char>, origins: &mut Vec<usize>) {
            converted.push(c);
            origins.push(origin);
        }

        let mut line_start = 0;
        while line_start < source.len() {
            // Bounds of this line's content and terminator.
            let mut content_end = line_start;
            while content_end < source.len()
                && source[content_end] != '\n'
                && source[content_end] != '\r'
            {
                content_end += 1;
            }
            let term_end = match source.get(content_end) {
                Some('\r') if source.get(content_end + 1) == Some(&'\n') => content_end + 2,
                Some(_) => content_end + 1,
                None => content_end,
            };

            // Measure the whitespace prefix, rejecting mixed tabs and spaces.
            let mut prefix_end = line_start;
            let mut width = 0;
            while prefix_end < content_end {
                let c = source[prefix_end];
                if c != ' ' && c != '\t' {
                    break;
                }
                if c != source[line_start] {
                    return Err(ParseError::illegal_indentation(prefix_end));
                }
                width += if c == '\t' { tab_stop } else { 1 };
                prefix_end += 1;
            }

            if prefix_end == content_end {
                // Blank line: only the terminator survives.
                for i in content_end..term_end {
                    emit(source[i], i, &mut converted, &mut origins);
                }
                line_start = term_end;
                continue;
            }

            let top = *levels.last().unwrap_or(&0);
            if width > top {
                levels.push(width);
                emit(chars::INDENT, prefix_end, &mut converted, &mut origins);
            } else if width < top {
                while levels.len() > 1 && *levels.last().unwrap_or(&0) > width {
                    levels.pop();
                    emit(chars::DEDENT, prefix_end, &mut converted, &mut origins);
                }
                // A dedent to a column never pushed re-indents from the
                // nearest shallower level.
                if *levels.last().unwrap_or(&0) < width {
                    levels.push(width);
                    emit(chars::INDENT, prefix_end, &mut converted, &mut origins);
                }
            }

            for i in prefix_end..term_end {
                emit(source[i], i, &mut converted, &mut origins);
            }
            line_start = term_end;
        }

        while levels.len() > 1 {
            levels.pop();
            emit(chars::DEDENT, source.len(), &mut converted, &mut origins);
        }

        Ok(Self {
            converted,
            origins,
            inner: DefaultInputBuffer::new(text),
        })
    }

    /// Maps an index in the converted stream back to the original text.
    pub fn origin_of(&self, index: usize) -> usize {
        self.origins
            .get(index)
            .copied()
            .unwrap_or(self.inner.length())
    }
}

impl InputBuffer for IndentDedentInputBuffer {
    fn char_at(&self, index: usize) -> char {
        self.converted.get(index).copied().unwrap_or(chars::EOI)
    }

    fn length(&self) -> usize {
        self.converted.len()
    }

    fn extract(&self, start: usize, end: usize) -> String {
        if start >= end || start >= self.converted.len() {
            return String::new();
        }
        let end = end.min(self.converted.len());
        let orig_start = self.origin_of(start);
        let orig_end = self.origin_of(end - 1) + 1;
        self.inner.extract(orig_start, orig_end)
    }

    fn extract_line(&self, line: usize) -> String {
        self.inner.extract_line(line)
    }

    fn position_of(&self, index: usize) -> Position {
        self.inner.position_of(self.origin_of(index))
    }

    fn line_count(&self) -> usize {
        self.inner.line_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseErrorKind;

    fn converted(text: &str) -> String {
        let buf = IndentDedentInputBuffer::with_tab_stop(text, 4).unwrap();
        (0..buf.length())
            .map(|i| match buf.char_at(i) {
                chars::INDENT => '>',
                chars::DEDENT => '<',
                c => c,
            })
            .collect()
    }

    #[test]
    fn inserts_indent_and_dedent_sentinels() {
        assert_eq!(converted("a\n  b\n  c\nd\n"), "a\n>b\nc\n<d\n");
    }

    #[test]
    fn closes_open_levels_at_end_of_input() {
        assert_eq!(converted("a\n  b\n    c"), "a\n>b\n>c<<");
    }

    #[test]
    fn blank_lines_keep_only_their_terminator() {
        assert_eq!(converted("a\n   \n  b\n"), "a\n\n>b\n<");
    }

    #[test]
    fn rejects_mixed_tabs_and_spaces() {
        let err = IndentDedentInputBuffer::new("a\n \tb\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IllegalIndentation);
        assert_eq!(err.start, 3);
    }

    #[test]
    fn positions_report_against_the_original_text() {
        let buf = IndentDedentInputBuffer::with_tab_stop("a\n  b\n", 4).unwrap();
        // Converted stream: a \n INDENT b \n DEDENT
        assert_eq!(buf.position_of(3), Position { line: 2, column: 3 });
        assert_eq!(buf.extract_line(2), "  b");
    }
}
