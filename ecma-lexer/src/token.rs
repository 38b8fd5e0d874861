use ecma_foundation::{
    arena::Id,
    errors::SourceRange,
    span::{Span, Spanned},
};
use std::{fmt, ops::Range};

use crate::token_stream::Channel;

pub type SourceLocation = usize;

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub source_range: Range<usize>,
}

impl SourceRange for Token {
    fn source_range(&self) -> Range<usize> {
        self.source_range.clone()
    }
}

pub type TokenId = Id<Token>;
pub type TokenSpan = Span<Token>;

/// Passes all the token kinds as a sequence of `Token = "name",` into the provided macro.
#[macro_export]
macro_rules! expand_tokens {
    ($x:path) => {
        $x! {
            Comment = "comment",
            Whitespace = "whitespace",

            Ident = "identifier",

            IntLit    = "number literal",
            FloatLit  = "number literal",
            StringLit = "string literal",
            RegExpLit = "regular expression literal",

            // Objective-J selector/name literal, e.g. `@"foo"` or a bare selector fragment.
            NameLit   = "name literal",

            Add              = "`+`",
            Sub              = "`-`",
            Mul              = "`*`",
            Div              = "`/`",
            Rem              = "`%`",
            Pow              = "`**`",
            Dollar           = "`$`",
            At               = "`@`",
            ShiftLeft        = "`<<`",
            ShiftRight       = "`>>`",
            TripleShiftRight = "`>>>`",
            BitNot           = "`~`",
            BitAnd           = "`&`",
            BitOr            = "`|`",
            BitXor           = "`^`",
            Not              = "`!`",
            Equal            = "`==`",
            StrictEqual      = "`===`",
            NotEqual         = "`!=`",
            StrictNotEqual   = "`!==`",
            Less             = "`<`",
            Greater          = "`>`",
            LessEqual        = "`<=`",
            GreaterEqual     = "`>=`",
            And              = "`&&`",
            Or               = "`||`",
            Inc              = "`++`",
            Dec              = "`--`",

            Assign           = "`=`",
            AddAssign        = "`+=`",
            SubAssign        = "`-=`",
            MulAssign        = "`*=`",
            DivAssign        = "`/=`",
            RemAssign        = "`%=`",
            ShiftLeftAssign  = "`<<=`",
            ShiftRightAssign = "`>>=`",
            TripleShiftRightAssign = "`>>>=`",
            BitAndAssign     = "`&=`",
            BitOrAssign      = "`|=`",
            BitXorAssign     = "`^=`",

            Question         = "`?`",
            Colon            = "`:`",
            Dot              = "`.`",
            Ellipsis         = "`...`",

            LeftParen    = "`(`",
            RightParen   = "`)`",
            LeftBracket  = "`[`",
            RightBracket = "`]`",
            LeftBrace    = "`{`",
            RightBrace   = "`}`",
            Comma        = "`,`",
            Semi         = "`;`",
            Hash         = "`#`",
            Backslash    = "`\\`",

            // Used for errors produced by the lexer.
            Error = "error",

            // Produced by preprocessor directive parsing for things such as `#pragma`
            // bodies that should be visible to `#if` but otherwise skipped by the parser.
            Generated = "macro output",
            // Produced by expanding an undefined macro; used for error recovery.
            FailedExp = "undefined macro output",
            EndOfFile = "end of file",
        }
    };
}

macro_rules! token_kind_enum {
    ($($name:tt = $pretty_name:tt),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub enum TokenKind {
            $($name),*
        }

        impl TokenKind {
            pub fn pretty_name(&self) -> &'static str {
                match self {
                    $(TokenKind::$name => $pretty_name),*
                }
            }
        }
    }
}

expand_tokens!(token_kind_enum);

impl TokenKind {
    /// Tokens that may begin a compound assignment operator, e.g. `+` in `+=`.
    pub fn can_be_compound_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Add
                | TokenKind::Sub
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::Rem
                | TokenKind::ShiftLeft
                | TokenKind::ShiftRight
                | TokenKind::TripleShiftRight
                | TokenKind::BitAnd
                | TokenKind::BitOr
                | TokenKind::BitXor
        )
    }

    pub fn closed_by(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LeftParen => Some(TokenKind::RightParen),
            TokenKind::LeftBracket => Some(TokenKind::RightBracket),
            TokenKind::LeftBrace => Some(TokenKind::RightBrace),
            _ => None,
        }
    }

    pub fn closes(&self) -> Option<TokenKind> {
        match self {
            TokenKind::RightParen => Some(TokenKind::LeftParen),
            TokenKind::RightBracket => Some(TokenKind::LeftBracket),
            TokenKind::RightBrace => Some(TokenKind::LeftBrace),
            _ => None,
        }
    }

    pub const fn channel(&self) -> Channel {
        match self {
            TokenKind::Comment => Channel::COMMENT,
            TokenKind::Whitespace => Channel::SPACE,
            TokenKind::FailedExp | TokenKind::Generated => Channel::MACRO,
            TokenKind::Error => Channel::ERROR,
            _ => Channel::CODE,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AnyToken {
    pub kind: TokenKind,
    pub id: TokenId,
}

impl fmt::Debug for AnyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.id)
    }
}

impl Spanned<Token> for AnyToken {
    fn span(&self) -> TokenSpan {
        TokenSpan::single(self.id)
    }
}
