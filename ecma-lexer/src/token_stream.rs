use bitflags::bitflags;
use ecma_foundation::{arena::Arena, errors::Diagnostic, span::Span};

use crate::token::{AnyToken, TokenId, TokenKind, TokenSpan};

use super::token::Token;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Channel: u8 {
        /// Main input (everything that is not comments, whitespace, macro output, or errors.)
        const CODE    = 0x1;
        /// Comments only. Not consumed by the parser, but kept for tools that want trivia.
        const COMMENT = 0x2;
        /// Whitespace and line terminators. Consulted by the preprocessor for line boundaries
        /// and by the parser for automatic semicolon insertion.
        const SPACE   = 0x4;
        /// Tokens synthesized by macro expansion that carry no user-visible text.
        const MACRO   = 0x8;
        /// Lexis errors. Skipped by the parser; diagnostics are replicated into the sink.
        const ERROR   = 0x10;
    }
}

pub trait TokenStream {
    type Position;

    fn next(&mut self) -> AnyToken;

    fn next_from(&mut self, channel: Channel) -> AnyToken {
        loop {
            let token = self.next();
            if channel.contains(token.kind.channel()) {
                return token;
            }
        }
    }

    fn position(&self) -> Self::Position;

    fn set_position(&mut self, position: Self::Position);

    fn peek(&mut self) -> AnyToken {
        let position = self.position();
        let token = self.next();
        self.set_position(position);
        token
    }

    fn peek_from(&mut self, channel: Channel) -> AnyToken {
        let position = self.position();
        let token = self.next_from(channel);
        self.set_position(position);
        token
    }

    /// Can be used to add token stream-known context to parser diagnostics.
    fn contextualize_diagnostic(&self, diagnostic: Diagnostic<Token>) -> Diagnostic<Token> {
        diagnostic
    }
}

impl<T> TokenStream for &mut T
where
    T: TokenStream,
{
    type Position = T::Position;

    fn next(&mut self) -> AnyToken {
        <T as TokenStream>::next(self)
    }

    fn contextualize_diagnostic(&self, diagnostic: Diagnostic<Token>) -> Diagnostic<Token> {
        <T as TokenStream>::contextualize_diagnostic(self, diagnostic)
    }

    fn position(&self) -> Self::Position {
        <T as TokenStream>::position(self)
    }

    fn set_position(&mut self, position: Self::Position) {
        <T as TokenStream>::set_position(self, position)
    }
}

/// [`std::io::Cursor`] but for [`TokenSpan`]s. Turns a [`TokenSpan`] into a [`TokenStream`].
///
/// Used both to replay a macro body during expansion and, spliced end to end by
/// [`ecma_preprocessor::sliced_tokens::SlicedTokenStream`], to splice macro-expansion output
/// back into the surrounding token stream at the call site.
pub struct TokenSpanCursor<'a> {
    token_arena: &'a Arena<Token>,
    cursor: Option<TokenId>,
    last: TokenId,
}

impl<'a> TokenSpanCursor<'a> {
    /// Returns a cursor for traversing the span, or [`None`] if the span is empty.
    pub fn new(token_arena: &'a Arena<Token>, span: TokenSpan) -> Option<Self> {
        match span {
            Span::Empty => None,
            Span::Spanning { start, end } => Some(Self {
                token_arena,
                cursor: Some(start),
                last: end,
            }),
        }
    }
}

impl<'a> TokenStream for TokenSpanCursor<'a> {
    type Position = Option<TokenId>;

    fn next(&mut self) -> AnyToken {
        match self.cursor {
            Some(id) => {
                let token = self.token_arena.element(id);
                self.cursor = (id != self.last).then(|| id.successor());
                AnyToken {
                    kind: token.kind,
                    id,
                }
            }
            None => AnyToken {
                kind: TokenKind::EndOfFile,
                id: self.last,
            },
        }
    }

    fn position(&self) -> Self::Position {
        self.cursor
    }

    fn set_position(&mut self, position: Self::Position) {
        self.cursor = position;
    }
}
