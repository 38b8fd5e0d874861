use std::{collections::HashMap, ops::Range, rc::Rc};

use ecma_foundation::{
    arena::ArenaBuilder,
    errors::{Diagnostic, Label, ReplacementSuggestion},
    source::SourceFileId,
    span::Span,
};

use crate::{
    classify::{is_decimal_digit, is_hex_digit, is_identifier_continue, is_identifier_start},
    token::{AnyToken, SourceLocation, Token, TokenId, TokenKind},
    token_stream::{Channel, TokenStream},
};

/// Context for lexical analysis.
///
/// In the default context a `>` following another `>` is greedily munched into `>>`/`>>>`.
/// In the type context (inside a generic-looking angle-bracket list) each `>` is lexed on its
/// own, so that `Array<Array<number>>` doesn't need a space before the closing `>>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalContext {
    Default,
    Type,
}

/// Whether a `/` should be lexed as the start of a regular expression literal or as the
/// division operator. Mirrors the "goal symbol" technique used by production ECMAScript
/// lexers: a `/` starts a regex unless the previous significant token could itself end an
/// expression (an identifier, a literal, `)`, `]`, `++`, `--`, or the keywords `this`/`super`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegExpContext {
    Allowed,
    Disallowed,
}

#[derive(Debug)]
pub struct Lexer<'a> {
    pub token_arena: ArenaBuilder<'a, Token>,

    pub file: SourceFileId,
    pub input: Rc<str>,
    pub position: SourceLocation,

    pub errors: HashMap<TokenId, Diagnostic<Token>>,

    /// The `/`-disambiguation a caller driving this lexer through plain [`TokenStream::next`]
    /// gets for free, tracked from the kind of the last non-trivia token this lexer produced.
    /// A caller that also knows whether that token's spelling was a keyword (e.g. `this` versus
    /// an arbitrary identifier) should call [`Self::next_any`] directly with its own context
    /// instead - this tracker only ever sees [`TokenKind`], never spelling.
    regexp_context: RegExpContext,
}

#[allow(clippy::unnecessary_cast)]
impl<'a> Lexer<'a> {
    pub fn new(token_arena: ArenaBuilder<'a, Token>, file: SourceFileId, input: Rc<str>) -> Self {
        Self {
            token_arena,
            file,
            input,
            position: 0,
            errors: HashMap::new(),
            regexp_context: RegExpContext::Allowed,
        }
    }

    /// `beforeExpr` for a token kind, ignoring spelling - keywords and plain identifiers look
    /// identical at this level, so this call errs toward `Disallowed` whenever a kind could be
    /// either an identifier or a `beforeExpr` keyword (`this`, `typeof`, `return`, ...).
    fn kind_ends_expression(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Ident
                | TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::StringLit
                | TokenKind::RegExpLit
                | TokenKind::NameLit
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::Inc
                | TokenKind::Dec
        )
    }

    fn note_emitted(&mut self, kind: TokenKind) {
        if !matches!(kind.channel(), Channel::COMMENT | Channel::SPACE | Channel::ERROR | Channel::MACRO) {
            self.regexp_context = if Self::kind_ends_expression(kind) {
                RegExpContext::Disallowed
            } else {
                RegExpContext::Allowed
            };
        }
    }

    pub fn current_char(&self) -> Option<char> {
        self.input.get(self.position as usize..)?.chars().next()
    }

    pub fn peek_char(&self, ahead: usize) -> Option<char> {
        self.input
            .get(self.position as usize..)?
            .chars()
            .nth(ahead)
    }

    pub fn advance_char(&mut self) {
        if let Some(char) = self.current_char() {
            self.position += char.len_utf8() as SourceLocation;
        }
    }

    fn range(&self, start: SourceLocation) -> Range<SourceLocation> {
        start..self.position
    }

    fn create_token(&mut self, kind: TokenKind, range: Range<SourceLocation>) -> TokenId {
        self.token_arena.push(Token {
            kind,
            source_range: range,
        })
    }

    fn one_or_more(&mut self, mut test: impl FnMut(char) -> bool) -> Result<(), ()> {
        if !self.current_char().map(&mut test).unwrap_or(false) {
            return Err(());
        }
        while self.current_char().map(&mut test).unwrap_or(false) {
            self.advance_char();
        }
        Ok(())
    }

    fn whitespace(&mut self, start: SourceLocation) -> TokenId {
        while matches!(self.current_char(), Some(' ' | '\t' | '\r' | '\n')) {
            self.advance_char();
        }
        self.create_token(TokenKind::Whitespace, self.range(start))
    }

    fn comment_or_division_or_regexp(
        &mut self,
        start: SourceLocation,
        regexp_context: RegExpContext,
    ) -> TokenId {
        self.advance_char();
        match self.current_char() {
            Some('/') => {
                self.advance_char();
                self.line_comment(start)
            }
            Some('*') => {
                self.advance_char();
                loop {
                    match self.current_char() {
                        Some('*') => {
                            self.advance_char();
                            if self.current_char() == Some('/') {
                                self.advance_char();
                                break;
                            }
                        }
                        None => {
                            let comment_start =
                                self.create_token(TokenKind::Error, start..start + 2);
                            self.errors.insert(
                                comment_start,
                                Diagnostic::error(
                                    "block comment does not have a matching `*/` terminator",
                                )
                                .with_label(Label::primary(
                                    &Span::single(comment_start),
                                    "the comment starts here",
                                )),
                            );
                            return comment_start;
                        }
                        _ => self.advance_char(),
                    }
                }
                self.create_token(TokenKind::Comment, self.range(start))
            }
            _ if regexp_context == RegExpContext::Allowed => self.regexp_literal(start),
            _ => self.single_or_double_char_token_from(start, TokenKind::Div, '=', TokenKind::DivAssign),
        }
    }

    /// Reads to (but not past) the next line terminator or end of input, the shared tail of
    /// `//`, `<!--` and `-->` comments.
    fn line_comment(&mut self, start: SourceLocation) -> TokenId {
        while !matches!(self.current_char(), None | Some('\n')) {
            self.advance_char();
        }
        self.create_token(TokenKind::Comment, self.range(start))
    }

    fn regexp_literal(&mut self, start: SourceLocation) -> TokenId {
        let mut in_class = false;
        loop {
            match self.current_char() {
                None | Some('\n') => {
                    let unterminated = self.create_token(TokenKind::Error, self.range(start));
                    self.errors.insert(
                        unterminated,
                        Diagnostic::error(
                            "regular expression literal does not have a closing `/`",
                        )
                        .with_label(Label::primary(
                            &Span::single(unterminated),
                            "the literal starts here",
                        )),
                    );
                    return unterminated;
                }
                Some('\\') => {
                    self.advance_char();
                    self.advance_char();
                }
                Some('[') => {
                    in_class = true;
                    self.advance_char();
                }
                Some(']') => {
                    in_class = false;
                    self.advance_char();
                }
                Some('/') if !in_class => {
                    self.advance_char();
                    break;
                }
                Some(_) => self.advance_char(),
            }
        }
        // Flags.
        while matches!(self.current_char(), Some(c) if c.is_ascii_alphabetic()) {
            self.advance_char();
        }
        self.create_token(TokenKind::RegExpLit, self.range(start))
    }

    /// If the lexer is sitting on a `\uNNNN` identifier escape, decodes it without consuming
    /// anything, returning the escaped character and the length of the escape in source
    /// characters (always 6: `\`, `u`, and four hex digits).
    fn identifier_escape(&self) -> Option<(char, u32)> {
        if self.current_char() != Some('\\') || self.peek_char(1) != Some('u') {
            return None;
        }
        let hex: String = (0..4).map_while(|i| self.peek_char(2 + i)).collect();
        if hex.len() != 4 {
            return None;
        }
        let code = u32::from_str_radix(&hex, 16).ok()?;
        char::from_u32(code).map(|ch| (ch, 6))
    }

    fn identifier(&mut self) -> TokenId {
        let start = self.position;
        loop {
            if let Some((ch, len)) = self.identifier_escape() {
                if !is_identifier_continue(ch) {
                    break;
                }
                for _ in 0..len {
                    self.advance_char();
                }
                continue;
            }
            match self.current_char() {
                Some(c) if is_identifier_continue(c) => self.advance_char(),
                _ => break,
            }
        }
        self.create_token(TokenKind::Ident, self.range(start))
    }

    fn decimal_number(&mut self, start: SourceLocation) -> TokenId {
        while self.current_char().map(is_decimal_digit).unwrap_or(false) {
            self.advance_char();
        }
        let mut is_float = false;
        if self.current_char() == Some('.') {
            is_float = true;
            self.advance_char();
            while self.current_char().map(is_decimal_digit).unwrap_or(false) {
                self.advance_char();
            }
        }
        if let Some('e' | 'E') = self.current_char() {
            let exponent_start = self.position;
            self.advance_char();
            if let Some('+' | '-') = self.current_char() {
                self.advance_char();
            }
            match self.one_or_more(is_decimal_digit) {
                Ok(_) => {
                    is_float = true;
                }
                Err(_) => {
                    let before_exponent =
                        self.create_token(TokenKind::IntLit, start..exponent_start);
                    let exponent =
                        self.create_token(TokenKind::Error, self.range(exponent_start));
                    self.errors.insert(exponent, Diagnostic::error(
                        "'e' in a number literal's scientific notation must be followed by an exponent",
                    )
                    .with_label(Label::primary(
                        &Span::single(exponent),
                        "scientific notation used here",
                    )));
                    return before_exponent;
                }
            }
        }
        self.create_token(
            if is_float {
                TokenKind::FloatLit
            } else {
                TokenKind::IntLit
            },
            self.range(start),
        )
    }

    fn number(&mut self, start: SourceLocation) -> TokenId {
        let literal = if self.current_char() == Some('0') {
            self.advance_char();
            match self.current_char() {
                Some('x' | 'X') => {
                    self.advance_char();
                    while self.current_char().map(is_hex_digit).unwrap_or(false) {
                        self.advance_char();
                    }
                    self.create_token(TokenKind::IntLit, self.range(start))
                }
                Some('0'..='7') => {
                    // Legacy ES3 octal integer literal.
                    while let Some('0'..='7') = self.current_char() {
                        self.advance_char();
                    }
                    self.create_token(TokenKind::IntLit, self.range(start))
                }
                _ => {
                    self.position -= 1;
                    self.decimal_number(start)
                }
            }
        } else {
            self.decimal_number(start)
        };

        if self.current_char().map(is_identifier_start).unwrap_or(false) {
            let ident_start = self.position;
            self.identifier();
            let ident_end = self.position;
            let ident_error = self.create_token(TokenKind::Error, self.range(ident_start));
            self.errors.insert(
                ident_error,
                Diagnostic::error(
                    "number literal must not be immediately followed by an identifier",
                )
                .with_label(Label::secondary(
                    &Span::single(literal),
                    "number literal occurs here...",
                ))
                .with_label(Label::primary(
                    &Span::single(ident_error),
                    "...and is immediately followed by an identifier",
                ))
                .with_note((
                    "help: add a space between the number and the identifier",
                    ReplacementSuggestion {
                        file: self.file,
                        span: start..ident_end,
                        replacement: format!(
                            "{} {}",
                            &self.input[start as usize..ident_start as usize],
                            &self.input[ident_start as usize..ident_end as usize]
                        ),
                    },
                )),
            );
        }

        literal
    }

    fn string_char(&mut self) {
        match self.current_char() {
            Some('\\') => {
                self.advance_char();
                self.advance_char();
            }
            _ => self.advance_char(),
        }
    }

    fn string(&mut self, start: SourceLocation, quote: char) -> TokenId {
        self.advance_char();
        while self.current_char() != Some(quote) {
            if matches!(self.current_char(), None | Some('\n')) {
                let open_quote = self.create_token(TokenKind::Error, start..start + 1);
                let unterminated = self.create_token(TokenKind::Error, self.range(start + 1));
                self.errors.insert(
                    unterminated,
                    Diagnostic::error(format!(
                        "string literal does not have a closing quote `{quote}`"
                    ))
                    .with_label(Label::primary(
                        &Span::single(open_quote),
                        "the string starts here",
                    )),
                );
                return unterminated;
            }
            self.string_char();
        }
        self.advance_char();
        self.create_token(TokenKind::StringLit, self.range(start))
    }

    fn single_char_token(&mut self, kind: TokenKind) -> TokenId {
        let start = self.position;
        self.advance_char();
        self.create_token(kind, self.range(start))
    }

    fn single_or_double_char_token(
        &mut self,
        kind: TokenKind,
        second: char,
        second_kind: TokenKind,
    ) -> TokenId {
        let start = self.position;
        self.advance_char();
        self.single_or_double_char_token_from(start, kind, second, second_kind)
    }

    fn single_or_double_char_token_from(
        &mut self,
        start: SourceLocation,
        kind: TokenKind,
        second: char,
        second_kind: TokenKind,
    ) -> TokenId {
        if self.current_char() == Some(second) {
            self.advance_char();
            self.create_token(second_kind, self.range(start))
        } else {
            self.create_token(kind, self.range(start))
        }
    }

    /// Lexes `+`/`-`/`*`/etc., which may be doubled (`++`, `**`) or take a trailing `=` to
    /// become a compound assignment (`+=`).
    fn operator_with_compound_assign(
        &mut self,
        base: TokenKind,
        doubled: Option<(char, TokenKind)>,
        compound_assign: TokenKind,
    ) -> TokenId {
        let start = self.position;
        self.advance_char();
        if let Some((second, doubled_kind)) = doubled {
            if self.current_char() == Some(second) {
                self.advance_char();
                return self.create_token(doubled_kind, self.range(start));
            }
        }
        if self.current_char() == Some('=') {
            self.advance_char();
            self.create_token(compound_assign, self.range(start))
        } else {
            self.create_token(base, self.range(start))
        }
    }
}

/// Functions used by the preprocessor to skip the rest of a physical line without producing
/// tokens for it (e.g. after a `#`-directive keyword it doesn't recognize).
impl<'a> Lexer<'a> {
    pub fn eat_until_line_feed(&mut self) {
        while !matches!(self.current_char(), Some('\n') | None) {
            self.advance_char();
        }
    }
}

impl<'a> Lexer<'a> {
    /// Produces the next token, given a lexical context (for `>>` vs `>` disambiguation) and
    /// whether a `/` at this position should be read as a regular expression.
    pub fn next_any(&mut self, context: LexicalContext, regexp: RegExpContext) -> AnyToken {
        let start = self.position;

        if matches!(self.current_char(), Some(' ' | '\t' | '\r' | '\n')) {
            let id = self.whitespace(start);
            let kind = self.token_arena.arena().element(id).kind;
            self.note_emitted(kind);
            return AnyToken { kind, id };
        }

        let id = if let Some(char) = self.current_char() {
            match char {
                '/' => self.comment_or_division_or_regexp(start, regexp),
                c if is_identifier_start(c) => self.identifier(),
                '\\' if self.identifier_escape().is_some_and(|(ch, _)| is_identifier_start(ch)) => {
                    self.identifier()
                }
                '0'..='9' => self.number(start),
                '"' => self.string(start, '"'),
                '\'' => self.string(start, '\''),
                '+' => self.operator_with_compound_assign(
                    TokenKind::Add,
                    Some(('+', TokenKind::Inc)),
                    TokenKind::AddAssign,
                ),
                // `-->`, treated as a line comment per Annex B, but only where a `/` would
                // also be read as starting a new expression - otherwise `x-->y` is the
                // decrement-then-greater-than it looks like everywhere else.
                '-' if regexp == RegExpContext::Allowed
                    && self.peek_char(1) == Some('-')
                    && self.peek_char(2) == Some('>') =>
                {
                    self.advance_char();
                    self.advance_char();
                    self.advance_char();
                    self.line_comment(start)
                }
                '-' => self.operator_with_compound_assign(
                    TokenKind::Sub,
                    Some(('-', TokenKind::Dec)),
                    TokenKind::SubAssign,
                ),
                '*' => self.operator_with_compound_assign(
                    TokenKind::Mul,
                    Some(('*', TokenKind::Pow)),
                    TokenKind::MulAssign,
                ),
                '%' => {
                    self.single_or_double_char_token(TokenKind::Rem, '=', TokenKind::RemAssign)
                }
                // `<!--`, treated as a line comment per Annex B, unconditionally.
                '<' if self.peek_char(1) == Some('!')
                    && self.peek_char(2) == Some('-')
                    && self.peek_char(3) == Some('-') =>
                {
                    self.advance_char();
                    self.advance_char();
                    self.advance_char();
                    self.advance_char();
                    self.line_comment(start)
                }
                '<' => {
                    self.advance_char();
                    match self.current_char() {
                        Some('<') => {
                            self.advance_char();
                            self.single_or_double_char_token_from(
                                start,
                                TokenKind::ShiftLeft,
                                '=',
                                TokenKind::ShiftLeftAssign,
                            )
                        }
                        Some('=') => {
                            self.advance_char();
                            self.create_token(TokenKind::LessEqual, self.range(start))
                        }
                        _ => self.create_token(TokenKind::Less, self.range(start)),
                    }
                }
                '>' => {
                    self.advance_char();
                    match self.current_char() {
                        Some('>') if context != LexicalContext::Type => {
                            self.advance_char();
                            if self.current_char() == Some('>') {
                                self.advance_char();
                                self.single_or_double_char_token_from(
                                    start,
                                    TokenKind::TripleShiftRight,
                                    '=',
                                    TokenKind::TripleShiftRightAssign,
                                )
                            } else {
                                self.single_or_double_char_token_from(
                                    start,
                                    TokenKind::ShiftRight,
                                    '=',
                                    TokenKind::ShiftRightAssign,
                                )
                            }
                        }
                        Some('=') => {
                            self.advance_char();
                            self.create_token(TokenKind::GreaterEqual, self.range(start))
                        }
                        _ => self.create_token(TokenKind::Greater, self.range(start)),
                    }
                }
                '&' => self.operator_with_compound_assign(
                    TokenKind::BitAnd,
                    Some(('&', TokenKind::And)),
                    TokenKind::BitAndAssign,
                ),
                '|' => self.operator_with_compound_assign(
                    TokenKind::BitOr,
                    Some(('|', TokenKind::Or)),
                    TokenKind::BitOrAssign,
                ),
                '^' => self.operator_with_compound_assign(TokenKind::BitXor, None, TokenKind::BitXorAssign),
                '@' => self.single_char_token(TokenKind::At),
                ':' => self.single_char_token(TokenKind::Colon),
                '?' => self.single_char_token(TokenKind::Question),
                '!' => {
                    self.advance_char();
                    match self.current_char() {
                        Some('=') => {
                            self.advance_char();
                            if self.current_char() == Some('=') {
                                self.advance_char();
                                self.create_token(TokenKind::StrictNotEqual, self.range(start))
                            } else {
                                self.create_token(TokenKind::NotEqual, self.range(start))
                            }
                        }
                        _ => self.create_token(TokenKind::Not, self.range(start)),
                    }
                }
                '=' => {
                    self.advance_char();
                    match self.current_char() {
                        Some('=') => {
                            self.advance_char();
                            if self.current_char() == Some('=') {
                                self.advance_char();
                                self.create_token(TokenKind::StrictEqual, self.range(start))
                            } else {
                                self.create_token(TokenKind::Equal, self.range(start))
                            }
                        }
                        _ => self.create_token(TokenKind::Assign, self.range(start)),
                    }
                }
                '~' => self.single_char_token(TokenKind::BitNot),
                '(' => self.single_char_token(TokenKind::LeftParen),
                ')' => self.single_char_token(TokenKind::RightParen),
                '[' => self.single_char_token(TokenKind::LeftBracket),
                ']' => self.single_char_token(TokenKind::RightBracket),
                '{' => self.single_char_token(TokenKind::LeftBrace),
                '}' => self.single_char_token(TokenKind::RightBrace),
                '.' => {
                    self.advance_char();
                    if let Some('0'..='9') = self.current_char() {
                        self.position -= 1;
                        self.decimal_number(start)
                    } else if self.current_char() == Some('.') && self.peek_char(1) == Some('.') {
                        self.advance_char();
                        self.advance_char();
                        self.create_token(TokenKind::Ellipsis, self.range(start))
                    } else {
                        self.create_token(TokenKind::Dot, self.range(start))
                    }
                }
                ',' => self.single_char_token(TokenKind::Comma),
                ';' => self.single_char_token(TokenKind::Semi),
                '#' => self.single_char_token(TokenKind::Hash),
                '\\' => self.single_char_token(TokenKind::Backslash),
                unknown => {
                    let unrecognized_character =
                        self.create_token(TokenKind::Error, self.range(start));
                    self.errors.insert(
                        unrecognized_character,
                        Diagnostic::error(format!("unrecognized character: {unknown:?}"))
                            .with_label(Label::primary(
                                &Span::single(unrecognized_character),
                                "this character is not valid syntax",
                            )),
                    );
                    unrecognized_character
                }
            }
        } else {
            self.create_token(TokenKind::EndOfFile, self.range(start))
        };

        let kind = self.token_arena.arena().element(id).kind;
        self.note_emitted(kind);
        AnyToken { kind, id }
    }
}

impl<'a> TokenStream for Lexer<'a> {
    type Position = SourceLocation;

    fn next(&mut self) -> AnyToken {
        let context = self.regexp_context;
        self.next_any(LexicalContext::Default, context)
    }

    fn position(&self) -> Self::Position {
        self.position
    }

    fn set_position(&mut self, position: Self::Position) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_foundation::{arena::Arena, source::{SourceFile, SourceFileSet}};
    use std::path::PathBuf;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let mut files = SourceFileSet::new();
        let file_id = files.add(SourceFile::new(
            "test.js".into(),
            PathBuf::from("test.js"),
            Rc::from(source),
        ));

        let mut arena = Arena::new();
        let builder = arena.build_source_file(file_id);
        let mut lexer = Lexer::new(builder, file_id, Rc::from(source));
        let mut kinds = vec![];
        loop {
            let token = lexer.next();
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            if token.kind != TokenKind::Whitespace {
                kinds.push(token.kind);
            }
        }
        kinds
    }

    #[test]
    fn lexes_arithmetic_operators() {
        let kinds = lex_all("1+2*3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLit,
                TokenKind::Add,
                TokenKind::IntLit,
                TokenKind::Mul,
                TokenKind::IntLit
            ]
        );
    }

    #[test]
    fn lexes_compound_assignment() {
        let kinds = lex_all("x+=1");
        assert_eq!(
            kinds,
            vec![TokenKind::Ident, TokenKind::AddAssign, TokenKind::IntLit]
        );
    }

    #[test]
    fn lexes_string_with_escape() {
        let kinds = lex_all(r#""a\"b""#);
        assert_eq!(kinds, vec![TokenKind::StringLit]);
    }

    #[test]
    fn unicode_letter_starts_an_identifier() {
        let kinds = lex_all("\u{3c0} + 1");
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Add, TokenKind::IntLit]);
    }

    #[test]
    fn identifier_escape_at_the_start_reads_as_one_identifier_token() {
        // `\u0078` decodes to `x`; the whole escape plus the trailing letters is one identifier.
        let kinds = lex_all(r"\u0078yz + 1");
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Add, TokenKind::IntLit]);
    }

    #[test]
    fn identifier_escape_in_the_middle_continues_the_identifier() {
        // `\u0062` decodes to `b`, in the middle of `abc`.
        let kinds = lex_all(r"a\u0062c + 1");
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Add, TokenKind::IntLit]);
    }

    #[test]
    fn slash_at_start_of_expression_reads_a_regexp_literal() {
        let kinds = lex_all("/abc/g");
        assert_eq!(kinds, vec![TokenKind::RegExpLit]);
    }

    #[test]
    fn slash_after_an_identifier_reads_division() {
        let kinds = lex_all("x/g");
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Div, TokenKind::Ident]);
    }

    #[test]
    fn html_open_comment_reads_to_end_of_line() {
        let kinds = lex_all("<!-- x\n1");
        assert_eq!(kinds, vec![TokenKind::Comment, TokenKind::IntLit]);
    }

    #[test]
    fn html_close_comment_reads_to_end_of_line_at_start_of_expression() {
        let kinds = lex_all("-->x\n1");
        assert_eq!(kinds, vec![TokenKind::Comment, TokenKind::IntLit]);
    }

    #[test]
    fn html_close_comment_is_decrement_greater_than_after_an_operand() {
        let kinds = lex_all("x-->y");
        assert_eq!(
            kinds,
            vec![TokenKind::Ident, TokenKind::Dec, TokenKind::Greater, TokenKind::Ident]
        );
    }
}
