//! The parser core (C8): token navigation, automatic semicolon insertion, and the bits shared
//! by statement dispatch ([`stmt`]), expression precedence climbing ([`expr`]), and the
//! Objective-J extensions ([`objj`]).
//!
//! Unlike the derive-driven `Parse`/`PredictiveParse` system this grammar replaces, there is no
//! generic rule dispatch here: every production is a plain method on [`Parser`] that reads
//! tokens and builds [`crate::ast::Node`]s directly, the way a hand-written recursive-descent
//! parser for a language this irregular (ASI, regex/division lexing, message-send lookahead)
//! has to be written.

pub mod expr;
pub mod objj;
pub mod stmt;

use std::mem;

use tracing::debug;

use ecma_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    span::Spanned,
};
use ecma_lexer::{
    lexer::RegExpContext,
    sources::LexedSources,
    token::{AnyToken, Token, TokenId, TokenKind, TokenSpan},
    token_stream::Channel,
};
use ecma_preprocessor::macro_table::{Macro, MacroTable};

use crate::{
    ast::{join_spans, BlockStatement, FunctionParam, Identifier, Literal, LiteralValue, Node, Trivia},
    token_provider::TokenProvider,
    token_types::{lookup_keyword, token_type_info},
    ForbidReserved, ParserOptions,
};

/// What kind of statement a label on the [`Parser::labels`] stack names, so `break`/`continue`
/// can tell whether the label they reference actually encloses a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Loop,
    Switch,
    Other,
}

#[derive(Debug, Clone)]
struct LabelEntry {
    name: String,
    kind: LabelKind,
}

/// A production could not be parsed; the caller already received a diagnostic describing why.
#[derive(Debug, Clone, Copy)]
pub struct ParseError {
    pub span: TokenSpan,
}

impl ParseError {
    fn new(span: TokenSpan) -> Self {
        Self { span }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    pub sources: LexedSources<'a>,
    tokens: TokenProvider<'a>,
    diagnostics: &'a mut dyn DiagnosticSink<Token>,
    pub options: ParserOptions,

    current: AnyToken,
    newline_before_current: bool,
    newline_before_next: bool,
    /// Whether a `/` starting the next token should be read as a regex literal. Threaded
    /// through [`TokenProvider::next_with_regexp_context`] rather than stored on the provider
    /// itself, since it depends on what the *parser* is expecting, not on anything lexical.
    expr_allowed: bool,
    leading_trivia: Vec<AnyToken>,

    pub(crate) in_function: bool,
    labels: Vec<LabelEntry>,
    pub(crate) strict: bool,
    /// Suppressed while parsing a `for (...)` head's init clause, so that `for (a in b)` isn't
    /// misread as `for ((a in b); ...)`.
    pub(crate) allow_in: bool,
    /// `nodeMessageSendObjectExpression`: latched by the postfix `[` handling in
    /// [`Self::parse_subscripts`] when `[ expr` turns out not to be a subscript, and consumed by
    /// the enclosing statement parser on its next turn, which redirects to
    /// [`Self::parse_message_send_expression`].
    pub(crate) pending_message_send: Option<PendingMessageSend>,
    /// Macros known at the point preprocessing handed off to this parser: the predefined set,
    /// plus every `#define` the preprocessor actually saw. Empty when the parse was run with
    /// `preprocess: false`. Exposed read-only via [`Self::get_macros`].
    macro_table: MacroTable,
}

/// A latched, partially-parsed message send: the `[` has been consumed along with its receiver
/// expression, but the selector and arguments haven't been read yet.
pub(crate) struct PendingMessageSend {
    pub bracket_start: TokenSpan,
    pub receiver: Node,
}

impl<'a> Parser<'a> {
    pub fn new(
        sources: LexedSources<'a>,
        mut tokens: TokenProvider<'a>,
        diagnostics: &'a mut dyn DiagnosticSink<Token>,
        options: ParserOptions,
        macro_table: MacroTable,
    ) -> Self {
        let first = tokens.next_with_regexp_context(RegExpContext::Allowed);
        let mut parser = Self {
            sources,
            tokens,
            diagnostics,
            options,
            current: first,
            newline_before_current: false,
            newline_before_next: false,
            expr_allowed: true,
            leading_trivia: Vec::new(),
            in_function: false,
            labels: Vec::new(),
            strict: false,
            allow_in: true,
            pending_message_send: None,
            macro_table,
        };
        parser.settle_current(first);
        parser
    }

    /// Non-predefined macros after this parse, or an empty iterator if it didn't preprocess.
    pub fn get_macros(&self) -> impl Iterator<Item = &Macro> {
        self.macro_table.iter()
    }

    /// Drives the trivia-skipping loop starting from an already-read token, which may itself be
    /// trivia (used both by [`Self::new`], which has nowhere else to get a first token from,
    /// and by [`Self::bump`]).
    fn settle_current(&mut self, mut token: AnyToken) {
        loop {
            match token.kind.channel() {
                Channel::COMMENT => {
                    if self.options.track_comments {
                        self.leading_trivia.push(token);
                    }
                }
                Channel::SPACE => {
                    if self.token_text(token).contains(is_line_terminator_char) {
                        self.newline_before_next = true;
                    }
                    if self.options.track_spaces {
                        self.leading_trivia.push(token);
                    }
                }
                // The lexer already reported this token's diagnostic (malformed literal,
                // unterminated comment, ...) while producing the token stream `self.tokens`
                // was built from; here it's just filler to be skipped.
                Channel::ERROR => {}
                // Macro-synthesized filler (e.g. a `#pragma` body) carries no text the parser
                // should ever see.
                Channel::MACRO => {}
                _ => {
                    self.current = token;
                    self.newline_before_current = self.newline_before_next;
                    self.newline_before_next = false;
                    self.expr_allowed = self.expr_allowed_after(token);
                    return;
                }
            }
            let ctx = self.regexp_context();
            token = self.tokens.next_with_regexp_context(ctx);
        }
    }

    fn regexp_context(&self) -> RegExpContext {
        if self.expr_allowed {
            RegExpContext::Allowed
        } else {
            RegExpContext::Disallowed
        }
    }

    fn token_text(&self, token: AnyToken) -> &'a str {
        self.sources.source(&token)
    }

    /// Whether a `/` immediately after `token` should be read as a regex literal, mirroring the
    /// `beforeExpr` attribute consulted by `tokTypes`/`lookup_keyword`.
    fn expr_allowed_after(&self, token: AnyToken) -> bool {
        match token.kind {
            TokenKind::Ident => lookup_keyword(self.token_text(token))
                .map(|info| info.before_expr)
                .unwrap_or(false),
            _ => token_type_info(token.kind)
                .map(|info| info.before_expr)
                .unwrap_or(true),
        }
    }

    pub fn current(&self) -> AnyToken {
        self.current
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn current_text(&self) -> &'a str {
        self.token_text(self.current)
    }

    pub fn at_keyword(&self, keyword: &str) -> bool {
        self.at(TokenKind::Ident) && self.current_text() == keyword
    }

    pub fn newline_before_current(&self) -> bool {
        self.newline_before_current
    }

    /// Consumes the current token and reads the next one, returning the consumed token.
    pub fn bump(&mut self) -> AnyToken {
        let previous = self.current;
        let ctx = self.regexp_context();
        let token = self.tokens.next_with_regexp_context(ctx);
        self.settle_current(token);
        previous
    }

    /// Consumes the current token if it matches `kind`, returning whether it did.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<AnyToken> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(kind.pretty_name()))
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> ParseResult<AnyToken> {
        if self.at_keyword(keyword) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    pub fn unexpected(&mut self, expected: &str) -> ParseError {
        let span = self.current.span();
        self.emit_diagnostic(
            Diagnostic::error(format!("{expected} expected"))
                .with_label(Label::primary(&span, format!("found {:?} here", self.current.kind))),
        );
        ParseError::new(span)
    }

    pub fn bail<T>(&mut self, span: TokenSpan, diagnostic: Diagnostic<Token>) -> ParseResult<T> {
        self.emit_diagnostic(diagnostic);
        Err(ParseError::new(span))
    }

    pub fn emit_diagnostic(&mut self, mut diagnostic: Diagnostic<Token>) {
        if self.options.line_no_in_error_message {
            if let Some(suffix) = self.line_no_suffix(&diagnostic) {
                diagnostic.message.push_str(&suffix);
            }
        }
        debug!(severity = ?diagnostic.severity, message = %diagnostic.message, "parser diagnostic");
        self.diagnostics.emit(diagnostic);
    }

    /// `" (line:column)"` for the diagnostic's primary label span (first label if none is marked
    /// primary), or `None` if it has no labels to place it at.
    fn line_no_suffix(&self, diagnostic: &Diagnostic<Token>) -> Option<String> {
        let label = diagnostic
            .labels
            .iter()
            .find(|label| label.style == ecma_foundation::errors::LabelStyle::Primary)
            .or_else(|| diagnostic.labels.first())?;
        let TokenSpan::Spanning { start, .. } = label.span else {
            return None;
        };
        let source_file_id = self.sources.token_arena.source_file_id(start);
        let token = self.sources.token_arena.element(start);
        let file = self.sources.source_file_set.get(source_file_id);
        let info = ecma_lexer::get_line_info(file, token.source_range.start as u32);
        Some(format!(" ({}:{})", info.line, info.column))
    }

    // -- Trivia ----------------------------------------------------------------------------

    fn take_leading_trivia(&mut self) -> Vec<AnyToken> {
        mem::take(&mut self.leading_trivia)
    }

    /// Call at the start of a node: claims the trivia accumulated since the last token was
    /// consumed as this node's leading trivia.
    pub(crate) fn start_trivia(&mut self) -> PartialTrivia {
        PartialTrivia(split_trivia(self.take_leading_trivia()))
    }

    /// Call once the node's last token has been consumed: the trivia accumulated since then
    /// becomes both this node's trailing trivia and (non-destructively, since it's still sitting
    /// in `leading_trivia`) the next node's leading trivia. A comment may legitimately show up
    /// in both places; see `ast::Trivia`.
    pub(crate) fn finish_trivia(&self, before: PartialTrivia) -> Trivia {
        let (comments_after, spaces_after) = split_trivia(self.leading_trivia.clone());
        Trivia {
            comments_before: before.0.0,
            spaces_before: before.0.1,
            comments_after,
            spaces_after,
        }
    }

    // -- Automatic semicolon insertion -------------------------------------------------------

    /// Consumes a trailing `;`, synthesizing one if `strictSemicolons` is off and one of: EOF,
    /// `}` ahead, a newline occurred before the current token, or (Objective-J only) a message
    /// send is latched in [`Self::pending_message_send`].
    pub(crate) fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Semi) {
            return Ok(());
        }
        if !self.options.strict_semicolons
            && (self.at(TokenKind::EndOfFile)
                || self.at(TokenKind::RightBrace)
                || self.newline_before_current
                || self.pending_message_send.is_some())
        {
            return Ok(());
        }
        Err(self.unexpected("`;`"))
    }

    // -- Shared by function declarations and function expressions ---------------------------

    pub(crate) fn parse_identifier(&mut self) -> ParseResult<Identifier> {
        if !self.at(TokenKind::Ident) {
            return Err(self.unexpected("identifier"));
        }
        let token = self.bump();
        let name = self.token_text(token).to_string();
        if self.options.forbid_reserved != ForbidReserved::Never && self.is_reserved_word(&name) {
            self.reserved_word_diagnostic(token, &name);
        }
        Ok(Identifier {
            span: token.span(),
            trivia: Trivia::default(),
            name,
        })
    }

    /// Whether `name` is reserved under the parser's current `ecma_version`/strict-mode state,
    /// irrespective of `forbid_reserved` (callers decide whether that matters at this position).
    pub(crate) fn is_reserved_word(&self, name: &str) -> bool {
        let Some(info) = lookup_keyword(name) else {
            return false;
        };
        let reserved_by_version = info.reserved_since.is_some_and(|since| self.options.ecma_version >= since);
        reserved_by_version || (info.strict_reserved && self.strict)
    }

    pub(crate) fn reserved_word_diagnostic(&mut self, token: AnyToken, name: &str) {
        let span = token.span();
        self.emit_diagnostic(
            Diagnostic::error(format!("the reserved word '{name}' cannot be used as an identifier"))
                .with_label(Label::primary(&span, "reserved word")),
        );
    }

    pub(crate) fn parse_function_params(&mut self) -> ParseResult<Vec<FunctionParam>> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RightParen) {
            params.push(FunctionParam {
                id: self.parse_identifier()?,
                objj_type: None,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(params)
    }

    /// Parses a `{ ... }` function body, reporting whether it opens with a `"use strict"`
    /// directive prologue. Strictness is inherited from the enclosing scope either way: once
    /// set, [`Self::strict`] is never cleared for the remainder of the function body.
    pub(crate) fn parse_function_body(&mut self) -> ParseResult<(Box<Node>, bool)> {
        let was_strict = self.strict;
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        let mut directive_prologue = true;
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            let statements = self.parse_statement()?;
            if directive_prologue {
                if let [Node::ExpressionStatement(stmt)] = statements.as_slice() {
                    if let Node::Literal(Literal { value: LiteralValue::String(text), .. }) =
                        stmt.expression.as_ref()
                    {
                        if text == "use strict" {
                            self.strict = true;
                        }
                        body.extend(statements);
                        continue;
                    }
                }
                directive_prologue = false;
            }
            body.extend(statements);
        }
        let close = self.expect(TokenKind::RightBrace)?;
        let span = join_spans(open.span(), close.span());
        let strict = self.strict;
        self.strict = was_strict;
        Ok((
            Box::new(Node::BlockStatement(BlockStatement {
                span,
                trivia: Trivia::default(),
                body,
            })),
            strict,
        ))
    }
}

/// Leading trivia captured by [`Parser::start_trivia`], held until [`Parser::finish_trivia`]
/// pairs it with the node's trailing trivia.
pub(crate) struct PartialTrivia((Vec<TokenId>, Vec<TokenId>));

fn split_trivia(tokens: Vec<AnyToken>) -> (Vec<TokenId>, Vec<TokenId>) {
    let mut comments = Vec::new();
    let mut spaces = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::Comment => comments.push(token.id),
            TokenKind::Whitespace => spaces.push(token.id),
            _ => {}
        }
    }
    (comments, spaces)
}

fn is_line_terminator_char(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
