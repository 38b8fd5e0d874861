//! Character classification and tokenization for ECMAScript 3/5 source text extended with
//! Objective-J syntax.
//!
//! This crate owns the token arena: every token produced anywhere in the pipeline (straight
//! off a [`SourceFile`][ecma_foundation::source::SourceFile], pasted together by the macro
//! expander, or stringified into a synthetic buffer) lives here and is referred to by a
//! [`TokenId`][token::TokenId] handle rather than being copied around.

pub mod classify;
pub mod lexer;
pub mod sources;
pub mod token;
pub mod token_stream;

use std::rc::Rc;

use ecma_foundation::source::{SourceFile, SourceFileId};

use lexer::{Lexer, LexicalContext, RegExpContext};
use token::{AnyToken, Token};
use token_stream::TokenStream;

/// Options controlling standalone tokenization (the `tokenize`/`tokTypes` half of the public
/// interface). Unlike [`crate::ecma_syntax::ParserOptions`], this only affects the lexer: most
/// of the callers that reach for `tokenize` directly want raw tokens, not a parsed AST, and
/// don't need ASI/strict-mode/reserved-word policy at all.
#[derive(Debug, Clone, Copy)]
pub struct LexerOptions {
    pub ecma_version: u8,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self { ecma_version: 5 }
    }
}

/// A resumable lexer handle: `next_token` advances and returns one token at a time, with a
/// per-call override for regex-vs-division disambiguation (mirroring `tokenize`'s
/// `forceRegexp?` parameter), and `jump_to` reseeks to a previously recorded position.
pub struct TokenIter<'a> {
    lexer: Lexer<'a>,
}

impl<'a> TokenIter<'a> {
    pub fn new(
        token_arena: ecma_foundation::arena::ArenaBuilder<'a, Token>,
        file: SourceFileId,
        input: Rc<str>,
        _options: &LexerOptions,
    ) -> Self {
        Self {
            lexer: Lexer::new(token_arena, file, input),
        }
    }

    /// Reads the next token. `force_regexp` overrides the lexer's own division-vs-regex guess
    /// when the caller already knows better (e.g. a tool re-lexing starting mid-expression).
    pub fn next_token(&mut self, force_regexp: Option<bool>) -> AnyToken {
        let regexp_context = match force_regexp {
            Some(true) => RegExpContext::Allowed,
            Some(false) => RegExpContext::Disallowed,
            None => RegExpContext::Disallowed,
        };
        self.lexer.next_any(LexicalContext::Default, regexp_context)
    }

    pub fn position(&self) -> <Lexer<'a> as TokenStream>::Position {
        self.lexer.position()
    }

    /// Reseeks the underlying lexer to `position`, as if tokenization had started over from
    /// there. `regexp_allowed` is threaded straight into the next `next_token` call rather than
    /// stored, since it only matters for the one token read immediately after the jump.
    pub fn jump_to(&mut self, position: <Lexer<'a> as TokenStream>::Position, regexp_allowed: bool) -> AnyToken {
        self.lexer.set_position(position);
        self.next_token(Some(regexp_allowed))
    }
}

pub fn tokenize<'a>(
    token_arena: ecma_foundation::arena::ArenaBuilder<'a, Token>,
    file: SourceFileId,
    input: Rc<str>,
    options: &LexerOptions,
) -> TokenIter<'a> {
    TokenIter::new(token_arena, file, input, options)
}

/// Line/column/line-bounds for a byte offset into a source file, as returned by `getLineInfo`.
/// `line` is 1-based, `column` is a 0-based byte offset from `line_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub line: u32,
    pub column: u32,
    pub line_start: u32,
    pub line_end: u32,
}

pub fn get_line_info(file: &SourceFile, offset: u32) -> LineInfo {
    let line_starts = file.line_starts();
    let line_index = match line_starts.binary_search(&(offset as usize)) {
        Ok(index) => index,
        Err(index) => index.saturating_sub(1),
    };
    let line_start = line_starts[line_index] as u32;
    let line_end = line_starts
        .get(line_index + 1)
        .map(|&start| start as u32)
        .unwrap_or(file.source.len() as u32);
    LineInfo {
        line: line_index as u32 + 1,
        column: offset - line_start,
        line_start,
        line_end,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ecma_foundation::{arena::Arena, source::SourceFileSet};

    use crate::token::TokenKind;

    use super::*;

    fn setup(source: &str) -> (Arena<Token>, SourceFileSet, SourceFileId, Rc<str>) {
        let mut arena = Arena::new();
        let mut files = SourceFileSet::new();
        let input: Rc<str> = Rc::from(source);
        let file = files.add(SourceFile::new("t.j".to_string(), PathBuf::from("t.j"), Rc::clone(&input)));
        (arena, files, file, input)
    }

    #[test]
    fn tokenize_reads_tokens_up_to_end_of_file() {
        let (mut arena, _files, file, input) = setup("foo bar");
        let builder = arena.build_source_file(file);
        let mut iter = tokenize(builder, file, input, &LexerOptions::default());
        let first = iter.next_token(None);
        assert_ne!(first.kind, TokenKind::EndOfFile);
        let second = iter.next_token(None);
        assert_ne!(second.kind, TokenKind::EndOfFile);
        let third = iter.next_token(None);
        assert_eq!(third.kind, TokenKind::EndOfFile);
    }

    #[test]
    fn jump_to_reseeks_a_previously_recorded_position() {
        let (mut arena, _files, file, input) = setup("foo bar");
        let builder = arena.build_source_file(file);
        let mut iter = tokenize(builder, file, input, &LexerOptions::default());
        let _foo = iter.next_token(None);
        let position = iter.position();
        let _bar = iter.next_token(None);
        let replayed = iter.jump_to(position, false);
        assert_eq!(replayed.kind, TokenKind::Ident);
    }

    #[test]
    fn get_line_info_finds_the_right_line_and_column() {
        let file = SourceFile::new("t.j".to_string(), PathBuf::from("t.j"), Rc::from("one\ntwo\nthree"));
        let info = get_line_info(&file, 6);
        assert_eq!(info.line, 2);
        assert_eq!(info.column, 2);
    }

    #[test]
    fn get_line_info_on_the_first_line_has_line_one() {
        let file = SourceFile::new("t.j".to_string(), PathBuf::from("t.j"), Rc::from("abcdef"));
        let info = get_line_info(&file, 0);
        assert_eq!(info.line, 1);
        assert_eq!(info.column, 0);
        assert_eq!(info.line_end, 6);
    }
}
