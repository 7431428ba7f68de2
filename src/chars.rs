//! Reserved sentinel characters and label escaping.
//!
//! Three characters are reserved by the engine: `EOI`, which every buffer
//! yields for indices at or past the real input length, and the
//! `INDENT`/`DEDENT` pair, which only the indentation-aware buffer emits.
//! Grammars match them through the dedicated `eoi`/`indent`/`dedent` rules;
//! `Any` and subtractive character sets never match `EOI`.

/// Virtual end-of-input character.
pub const EOI: char = '\u{FFFF}';

/// Virtual character marking an indentation increase.
pub const INDENT: char = '\u{FDD0}';

/// Virtual character marking an indentation decrease.
pub const DEDENT: char = '\u{FDD1}';

/// Escapes a character for use in matcher labels and error messages.
pub fn escape(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\u{C}' => "\\f".to_string(),
        EOI => "EOI".to_string(),
        INDENT => "INDENT".to_string(),
        DEDENT => "DEDENT".to_string(),
        other => other.to_string(),
    }
}

/// Escapes every character of a string, for labels of string rules.
pub fn escape_str(s: &str) -> String {
    s.chars().map(escape).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters_and_sentinels() {
        assert_eq!(escape('a'), "a");
        assert_eq!(escape('\n'), "\\n");
        assert_eq!(escape(EOI), "EOI");
        assert_eq!(escape_str("a\tb"), "a\\tb");
    }
}
