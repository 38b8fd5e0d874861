//! The token stream adapter (C7) the parser reads through. The distilled specification
//! describes a "read token" function pointer that gets swapped out mid-stream whenever a macro
//! expansion starts or ends; here that's replaced by a single upfront linearization instead.
//!
//! This parser's preprocessor (`ecma_preprocessor::Preprocessor`) runs to completion *before*
//! the parser starts, producing one flat [`ecma_preprocessor::sliced_tokens::SlicedTokens`]
//! that already interleaves source and macro-expansion regions end to end, whether or not
//! preprocessing was actually requested (see `crate::parse`, which slices the whole token run
//! into one span when it isn't). That upfront linearization is what the distilled source's
//! per-token provider stack is doing at lex time; doing it once, ahead of parsing, means the
//! parser never needs a second, lexer-backed provider to fall back on.

use ecma_lexer::{
    lexer::RegExpContext,
    token_stream::{Channel, TokenStream},
};
use ecma_preprocessor::sliced_tokens::SlicedTokenStream;

/// Wraps the preprocessor's spliced token stream for the parser, threading through the
/// regex-vs-division disambiguation context (see [`RegExpContext`]) that [`TokenStream`]'s
/// fixed `next(&mut self)` shape has no room to carry. A spliced token has already been lexed
/// once by the preprocessor, so that ambiguity was already resolved then; the parameter exists
/// only so callers don't need a second code path for "the provider that still needs it".
pub struct TokenProvider<'a> {
    stream: SlicedTokenStream<'a>,
}

impl<'a> TokenProvider<'a> {
    pub fn next_with_regexp_context(&mut self, _regexp_context: RegExpContext) -> ecma_lexer::token::AnyToken {
        self.stream.next()
    }

    pub fn from_stream(stream: SlicedTokenStream<'a>) -> Self {
        TokenProvider { stream }
    }
}

impl<'a> TokenStream for TokenProvider<'a> {
    type Position = <SlicedTokenStream<'a> as TokenStream>::Position;

    fn next(&mut self) -> ecma_lexer::token::AnyToken {
        self.stream.next()
    }

    fn next_from(&mut self, channel: Channel) -> ecma_lexer::token::AnyToken {
        self.stream.next_from(channel)
    }

    fn position(&self) -> Self::Position {
        self.stream.position()
    }

    fn set_position(&mut self, position: Self::Position) {
        self.stream.set_position(position)
    }
}
