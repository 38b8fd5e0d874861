//! Character classification rules for ECMAScript source text, extended with the handful of
//! extra start characters Objective-J literals need (`@`, `$`).
//!
//! `IdentifierStart`/`IdentifierPart` fall back to Unicode's `XID_Start`/`XID_Continue`
//! properties (via `unicode-xid`) for anything outside ASCII, matching what other
//! ECMAScript-family lexers use as a practical stand-in for the spec's own `ID_Start`/
//! `ID_Continue`-derived grammar.

use unicode_xid::UnicodeXID;

/// Whether `c` may begin an identifier (`$`, `_`, an ASCII letter, or a Unicode `XID_Start`
/// character).
pub fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_xid_start())
}

/// Whether `c` may continue an identifier once started.
pub fn is_identifier_continue(c: char) -> bool {
    c == '$' || c.is_ascii_alphanumeric() || c == '_' || (!c.is_ascii() && c.is_xid_continue())
}

/// ECMAScript `LineTerminator`: LF, CR, U+2028, U+2029.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// ECMAScript `WhiteSpace`, excluding line terminators (which the preprocessor and the
/// automatic-semicolon-insertion logic need to tell apart from ordinary space).
pub fn is_whitespace(c: char) -> bool {
    !is_line_terminator(c) && c.is_whitespace()
}

pub fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_octal_digit(c: char) -> bool {
    matches!(c, '0'..='7')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_letters_digits_and_punctuation_classify_as_before() {
        assert!(is_identifier_start('_'));
        assert!(is_identifier_start('$'));
        assert!(is_identifier_start('a'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_continue('1'));
        assert!(!is_identifier_continue('-'));
    }

    #[test]
    fn unicode_letters_may_start_and_continue_identifiers() {
        assert!(is_identifier_start('π'));
        assert!(is_identifier_continue('π'));
        assert!(is_identifier_start('日'));
    }

    #[test]
    fn unicode_combining_marks_may_continue_but_not_start_identifiers() {
        // U+0301 COMBINING ACUTE ACCENT: XID_Continue but not XID_Start.
        assert!(!is_identifier_start('\u{301}'));
        assert!(is_identifier_continue('\u{301}'));
    }
}
