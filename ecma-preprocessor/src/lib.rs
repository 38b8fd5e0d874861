//! The directive driver: scans a token stream for `#`-directives (`#define`, `#undef`,
//! `#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`/`#endif`, `#pragma`, `#error`, `#warning`,
//! `#line`), keeps a [`MacroTable`] and [`ConditionalStack`] up to date, and runs every run of
//! non-directive tokens through the macro expander before splicing the result into an output
//! [`SlicedTokens`].
//!
//! Each expanded run of tokens is re-lexed into a freshly synthesized source file appended to
//! the same [`SourceFileSet`]/[`Arena<Token>`] the rest of the pipeline already uses, rather
//! than inventing a separate buffer/origin type for synthetic text - downstream consumers only
//! ever need to deal with one token arena.

pub mod cond;
pub mod eval;
pub mod expand;
pub mod macro_table;
pub mod sliced_tokens;

use std::{path::PathBuf, rc::Rc};

use ecma_foundation::{
    arena::Arena,
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFile, SourceFileId, SourceFileSet},
    span::Span,
};
use ecma_lexer::{
    lexer::Lexer,
    sources::LexedSources,
    token::{AnyToken, Token, TokenKind, TokenSpan},
    token_stream::TokenStream,
};

use cond::ConditionalStack;
use eval::{EvalError, EvalToken};
use expand::{expand, ExpToken, ExpansionContext};
use macro_table::{Macro, MacroParams, MacroTable};
use sliced_tokens::{SlicedTokens, TokenSlice};

/// Preprocessor that sits between the lexer and the parser, turning a raw token stream for one
/// source file into a [`SlicedTokens`] the parser can read as if macros had never existed.
pub struct Preprocessor<'a, T> {
    token_arena: &'a mut Arena<Token>,
    source_file_set: &'a mut SourceFileSet,
    tokens: T,
    diagnostics: &'a mut dyn DiagnosticSink<Token>,

    macro_table: MacroTable,
    conditional: ConditionalStack,
    out: SlicedTokens,

    region: Vec<ExpToken>,
    at_line_start: bool,
    current_file: Option<SourceFileId>,
    line_number: u32,
    line_number_override: Option<String>,
    synthetic_files: u32,
    objj: bool,
    browser: bool,
}

impl<'a, T> Preprocessor<'a, T>
where
    T: TokenStream,
    T::Position: Copy,
{
    pub fn new(
        token_arena: &'a mut Arena<Token>,
        source_file_set: &'a mut SourceFileSet,
        tokens: T,
        macro_table: MacroTable,
        diagnostics: &'a mut dyn DiagnosticSink<Token>,
    ) -> Self {
        Self::with_dialect(token_arena, source_file_set, tokens, macro_table, diagnostics, false, false)
    }

    /// Like [`Preprocessor::new`], but controls what `__OBJJ__`/`__BROWSER__` expand to.
    pub fn with_dialect(
        token_arena: &'a mut Arena<Token>,
        source_file_set: &'a mut SourceFileSet,
        tokens: T,
        macro_table: MacroTable,
        diagnostics: &'a mut dyn DiagnosticSink<Token>,
        objj: bool,
        browser: bool,
    ) -> Self {
        Self {
            token_arena,
            source_file_set,
            tokens,
            diagnostics,
            macro_table,
            conditional: ConditionalStack::new(),
            out: SlicedTokens::new(),
            region: Vec::new(),
            at_line_start: true,
            current_file: None,
            line_number: 1,
            line_number_override: None,
            synthetic_files: 0,
            objj,
            browser,
        }
    }

    /// Runs the driver to completion, returning the macro table so a caller processing several
    /// files can thread `#define`s defined in one into the next, and the preprocessed output.
    pub fn preprocess(mut self) -> (MacroTable, SlicedTokens) {
        loop {
            let position = self.tokens.position();
            let token = self.tokens.next();

            if token.kind == TokenKind::EndOfFile {
                self.emit_region();
                if !self.conditional.is_empty() {
                    self.diagnostics.emit(
                        Diagnostic::error("unterminated `#if`")
                            .with_label(Label::primary(&token, "expected a matching `#endif` before the end of the file")),
                    );
                }
                let _ = position;
                break;
            }

            self.current_file = Some(self.token_arena.source_file_id(token.id));

            match token.kind {
                TokenKind::Hash if self.at_line_start => {
                    self.emit_region();
                    self.handle_directive(token);
                    self.at_line_start = true;
                }
                TokenKind::Whitespace => {
                    let newlines = lexed_sources(self.source_file_set, self.token_arena).source(&token).matches('\n').count() as u32;
                    if newlines > 0 {
                        self.at_line_start = true;
                        self.line_number += newlines;
                    }
                    if self.conditional.is_active() {
                        let sources = lexed_sources(self.source_file_set, self.token_arena);
                        self.region.push(ExpToken::from_any(token, &sources));
                    }
                }
                TokenKind::Comment => {
                    if self.conditional.is_active() {
                        let sources = lexed_sources(self.source_file_set, self.token_arena);
                        self.region.push(ExpToken::from_any(token, &sources));
                    }
                }
                _ => {
                    self.at_line_start = false;
                    if self.conditional.is_active() {
                        let sources = lexed_sources(self.source_file_set, self.token_arena);
                        self.region.push(ExpToken::from_any(token, &sources));
                    }
                }
            }
        }

        (self.macro_table, self.out)
    }

    fn current_file_name(&self) -> String {
        if let Some(name) = &self.line_number_override {
            return name.clone();
        }
        self.current_file
            .map(|id| self.source_file_set.get(id).filename.clone())
            .unwrap_or_default()
    }

    /// Macro-expands the run of tokens accumulated since the last directive (or the start of
    /// the file) and splices the result into the output.
    fn emit_region(&mut self) {
        if self.region.is_empty() {
            return;
        }
        let region = std::mem::take(&mut self.region);
        let fallback_source = region.first().and_then(|t| t.origin);

        let file_name = self.current_file_name();
        let ctx = ExpansionContext {
            file_name: &file_name,
            line_number: self.line_number,
            objj: self.objj,
            browser: self.browser,
        };
        let mut expanding = Vec::new();
        let sources = lexed_sources(self.source_file_set, self.token_arena);
        let expanded = expand(
            region,
            &self.macro_table,
            &sources,
            &mut expanding,
            &mut *self.diagnostics,
            &ctx,
        );

        if expanded.is_empty() {
            if let Some(source) = fallback_source {
                self.out.push(TokenSlice::Empty { source });
            }
            return;
        }

        let mut text = String::new();
        for (i, tok) in expanded.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(&tok.text);
        }

        self.synthetic_files += 1;
        let name = format!("<macro expansion {}>", self.synthetic_files);
        let source: Rc<str> = Rc::from(text.as_str());
        let file_id = self
            .source_file_set
            .add(SourceFile::new(name.clone(), PathBuf::from(name), Rc::clone(&source)));
        let builder = self.token_arena.build_source_file(file_id);
        let mut lexer = Lexer::new(builder, file_id, Rc::clone(&source));

        let mut start = None;
        let mut end = None;
        loop {
            let token = lexer.next();
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            start.get_or_insert(token.id);
            end = Some(token.id);
        }

        match (start, end) {
            (Some(start), Some(end)) => self.out.push(TokenSlice::Span { start, end }),
            _ => {
                if let Some(source) = fallback_source {
                    self.out.push(TokenSlice::Empty { source });
                }
            }
        }
    }

    /// Reads every token up to (but not including) the next unescaped line terminator, honoring
    /// `\`-newline continuation. Comments are dropped; non-newline whitespace is dropped.
    fn read_logical_line(&mut self) -> Vec<AnyToken> {
        let mut tokens = Vec::new();
        let mut after_backslash = false;
        loop {
            let position = self.tokens.position();
            let token = self.tokens.next();
            match token.kind {
                TokenKind::EndOfFile => {
                    self.tokens.set_position(position);
                    break;
                }
                TokenKind::Whitespace => {
                    let contains_newline = lexed_sources(self.source_file_set, self.token_arena).source(&token).contains('\n');
                    if contains_newline {
                        if after_backslash {
                            after_backslash = false;
                        } else {
                            break;
                        }
                    }
                }
                TokenKind::Comment => {}
                TokenKind::Backslash => after_backslash = true,
                _ => {
                    after_backslash = false;
                    tokens.push(token);
                }
            }
        }
        tokens
    }

    fn handle_directive(&mut self, hash: AnyToken) {
        let line = self.read_logical_line();
        let Some(name_token) = line.first() else {
            // A lone `#` on its own line is a null directive: valid, and ignored.
            return;
        };
        if name_token.kind != TokenKind::Ident {
            if self.conditional.is_active() {
                self.diagnostics.emit(
                    Diagnostic::error("expected a preprocessor directive name after `#`")
                        .with_label(Label::primary(name_token, "")),
                );
            }
            return;
        }

        let name = lexed_sources(self.source_file_set, self.token_arena).source(name_token).to_owned();
        let rest = &line[1..];
        match name.as_str() {
            "define" => {
                if self.conditional.is_active() {
                    self.directive_define(rest, hash);
                }
            }
            "undef" => {
                if self.conditional.is_active() {
                    self.directive_undef(rest, hash);
                }
            }
            "if" => self.directive_if(rest),
            "ifdef" => self.directive_ifdef(rest, hash, false),
            "ifndef" => self.directive_ifdef(rest, hash, true),
            "elif" => self.directive_elif(rest, hash),
            "else" => self.directive_else(hash),
            "endif" => self.directive_endif(hash),
            "pragma" => {}
            "error" => {
                if self.conditional.is_active() {
                    self.directive_error(rest, hash);
                }
            }
            "warning" => {
                if self.conditional.is_active() {
                    self.directive_warning(rest, hash);
                }
            }
            "line" => {
                if self.conditional.is_active() {
                    self.directive_line(rest, hash);
                }
            }
            _ => {
                if self.conditional.is_active() {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("unknown preprocessor directive `#{name}`"))
                            .with_label(Label::primary(&hash, "")),
                    );
                }
            }
        }
    }

    fn directive_define(&mut self, rest: &[AnyToken], hash: AnyToken) {
        let Some(name_token) = rest.first() else {
            self.diagnostics.emit(
                Diagnostic::error("macro name expected after `#define`")
                    .with_label(Label::primary(&hash, "")),
            );
            return;
        };
        if name_token.kind != TokenKind::Ident {
            self.diagnostics.emit(
                Diagnostic::error("macro name must be an identifier")
                    .with_label(Label::primary(name_token, "")),
            );
            return;
        }
        let name = lexed_sources(self.source_file_set, self.token_arena).source(name_token).to_owned();

        let mut index = 1;
        let params = if rest.get(1).map(|t| t.kind) == Some(TokenKind::LeftParen)
            && lexed_sources(self.source_file_set, self.token_arena).tokens_are_hugging_each_other(name_token.id, rest[1].id)
        {
            index = 2;
            let (names, variadic, variadic_name) = self.parse_macro_params(rest, &mut index, &hash);
            Some(MacroParams { names, variadic, variadic_name })
        } else {
            None
        };

        let body = rest[index..]
            .first()
            .zip(rest[index..].last())
            .map(|(first, last)| TokenSpan::Spanning {
                start: first.id,
                end: last.id,
            })
            .unwrap_or(TokenSpan::Empty);

        let macro_def = Macro {
            name: name.clone(),
            params,
            body,
        };

        if let Some(previous) = self.macro_table.get(&name).cloned() {
            let sources = lexed_sources(self.source_file_set, self.token_arena);
            let identical =
                macro_def.same_definition_modulo_span(&previous, |span| sources.source(&span).to_owned());
            if !identical {
                self.diagnostics.emit(
                    Diagnostic::warning(format!("macro `{name}` redefined with a different body"))
                        .with_label(Label::primary(&hash, "")),
                );
            }
        }
        self.macro_table.define(macro_def);
    }

    /// Parses the parenthesized parameter list of a function-like macro, starting at `*index`
    /// (just past the opening `(`). Returns the fixed parameter names, whether the list is
    /// variadic, and - for the GNU named-variadic spelling (`args...` rather than a bare
    /// `...`) - the name bound to the variadic arguments.
    fn parse_macro_params(
        &mut self,
        rest: &[AnyToken],
        index: &mut usize,
        hash: &AnyToken,
    ) -> (Vec<String>, bool, Option<String>) {
        let mut names = Vec::new();
        let mut variadic = false;
        let mut variadic_name = None;

        if rest.get(*index).map(|t| t.kind) != Some(TokenKind::RightParen) {
            loop {
                match rest.get(*index) {
                    Some(t) if t.kind == TokenKind::Ellipsis => {
                        variadic = true;
                        *index += 1;
                        break;
                    }
                    Some(t) if t.kind == TokenKind::Ident => {
                        let ident_name = lexed_sources(self.source_file_set, self.token_arena).source(t).to_owned();
                        *index += 1;
                        if rest.get(*index).map(|t| t.kind) == Some(TokenKind::Ellipsis) {
                            *index += 1;
                            variadic = true;
                            variadic_name = Some(ident_name);
                            break;
                        }
                        names.push(ident_name);
                    }
                    _ => {
                        self.diagnostics.emit(
                            Diagnostic::error("expected a parameter name in macro definition")
                                .with_label(Label::primary(hash, "")),
                        );
                        break;
                    }
                }
                match rest.get(*index).map(|t| t.kind) {
                    Some(TokenKind::Comma) => *index += 1,
                    Some(TokenKind::RightParen) => break,
                    _ => {
                        self.diagnostics.emit(
                            Diagnostic::error("expected `,` or `)` in macro parameter list")
                                .with_label(Label::primary(hash, "")),
                        );
                        break;
                    }
                }
            }
        }

        if rest.get(*index).map(|t| t.kind) == Some(TokenKind::RightParen) {
            *index += 1;
        } else {
            self.diagnostics.emit(
                Diagnostic::error("unterminated macro parameter list")
                    .with_label(Label::primary(hash, "")),
            );
        }

        (names, variadic, variadic_name)
    }

    fn directive_undef(&mut self, rest: &[AnyToken], hash: AnyToken) {
        let Some(name_token) = rest.first() else {
            self.diagnostics.emit(
                Diagnostic::error("macro name expected after `#undef`")
                    .with_label(Label::primary(&hash, "")),
            );
            return;
        };
        let name = lexed_sources(self.source_file_set, self.token_arena).source(name_token).to_owned();
        self.macro_table.undefine(&name);
    }

    fn directive_if(&mut self, rest: &[AnyToken]) {
        let parent_active = self.conditional.is_active();
        let condition = parent_active && self.evaluate_condition(rest);
        self.conditional.push_if(condition);
    }

    fn directive_ifdef(&mut self, rest: &[AnyToken], hash: AnyToken, negate: bool) {
        let parent_active = self.conditional.is_active();
        let condition = parent_active
            && match rest.first() {
                Some(t) if t.kind == TokenKind::Ident => {
                    let defined = self.macro_table.is_defined(lexed_sources(self.source_file_set, self.token_arena).source(t));
                    if negate {
                        !defined
                    } else {
                        defined
                    }
                }
                _ => {
                    let directive = if negate { "ifndef" } else { "ifdef" };
                    self.diagnostics.emit(
                        Diagnostic::error(format!("`#{directive}` expects a macro name"))
                            .with_label(Label::primary(&hash, "")),
                    );
                    false
                }
            };
        self.conditional.push_if(condition);
    }

    fn directive_elif(&mut self, rest: &[AnyToken], hash: AnyToken) {
        // Unknown identifiers evaluate to 0 rather than erroring, so it's always safe to
        // evaluate the condition here; `ConditionalStack::elif` discards it when it doesn't
        // matter (a previous branch in the chain was already taken, or the enclosing scope
        // is itself inactive).
        let condition = self.evaluate_condition(rest);
        if let Err(message) = self.conditional.elif(condition) {
            self.diagnostics
                .emit(Diagnostic::error(message).with_label(Label::primary(&hash, "")));
        }
    }

    fn directive_else(&mut self, hash: AnyToken) {
        if let Err(message) = self.conditional.else_branch() {
            self.diagnostics
                .emit(Diagnostic::error(message).with_label(Label::primary(&hash, "")));
        }
    }

    fn directive_endif(&mut self, hash: AnyToken) {
        if let Err(message) = self.conditional.endif() {
            self.diagnostics
                .emit(Diagnostic::error(message).with_label(Label::primary(&hash, "")));
        }
    }

    fn directive_error(&mut self, rest: &[AnyToken], hash: AnyToken) {
        let message = self.render_rest(rest);
        self.diagnostics.emit(
            Diagnostic::error(format!("#error: {message}")).with_label(Label::primary(&hash, "")),
        );
    }

    fn directive_warning(&mut self, rest: &[AnyToken], hash: AnyToken) {
        let message = self.render_rest(rest);
        self.diagnostics.emit(
            Diagnostic::warning(format!("#warning: {message}"))
                .with_label(Label::primary(&hash, "")),
        );
    }

    fn directive_line(&mut self, rest: &[AnyToken], hash: AnyToken) {
        let Some(number_token) = rest.first().filter(|t| t.kind == TokenKind::IntLit) else {
            self.diagnostics.emit(
                Diagnostic::error("`#line` expects a line number").with_label(Label::primary(&hash, "")),
            );
            return;
        };
        if let Ok(number) = lexed_sources(self.source_file_set, self.token_arena).source(number_token).parse::<u32>() {
            self.line_number = number;
        }
        if let Some(name_token) = rest.get(1).filter(|t| t.kind == TokenKind::StringLit) {
            let quoted = lexed_sources(self.source_file_set, self.token_arena).source(name_token);
            self.line_number_override = Some(quoted.trim_matches(|c| c == '"' || c == '\'').to_owned());
        }
    }

    fn render_rest(&self, rest: &[AnyToken]) -> String {
        let sources = lexed_sources(self.source_file_set, self.token_arena);
        rest.iter()
            .map(|t| sources.source(t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Evaluates a `#if`/`#elif` condition: resolves `defined NAME`/`defined(NAME)` against the
    /// macro table without expanding their operand, macro-expands everything else, then hands
    /// the result to the constant expression evaluator.
    fn evaluate_condition(&mut self, rest: &[AnyToken]) -> bool {
        let resolved = self.resolve_defined(rest);

        let file_name = self.current_file_name();
        let ctx = ExpansionContext {
            file_name: &file_name,
            line_number: self.line_number,
            objj: self.objj,
            browser: self.browser,
        };
        let mut expanding = Vec::new();
        let sources = lexed_sources(self.source_file_set, self.token_arena);
        let expanded = expand(
            resolved,
            &self.macro_table,
            &sources,
            &mut expanding,
            &mut *self.diagnostics,
            &ctx,
        );

        let eval_tokens = self.exp_tokens_to_eval(&expanded);
        match eval::evaluate(&eval_tokens) {
            Ok(value) => value != 0,
            Err(EvalError::UnknownIdentifier(name)) => {
                // An identifier that survives macro expansion and isn't itself a macro
                // evaluates to 0, same as a standard C preprocessor would.
                self.diagnostics.emit(Diagnostic::warning(format!(
                    "`{name}` is not defined, evaluates to 0"
                )));
                let retried: Vec<EvalToken> = eval_tokens
                    .into_iter()
                    .map(|t| match t {
                        EvalToken::Ident(_) => EvalToken::Int(0),
                        other => other,
                    })
                    .collect();
                eval::evaluate(&retried).unwrap_or(0) != 0
            }
            Err(error) => {
                self.diagnostics.emit(Diagnostic::error(error.to_string()));
                false
            }
        }
    }

    fn resolve_defined(&self, tokens: &[AnyToken]) -> Vec<ExpToken> {
        let sources = lexed_sources(self.source_file_set, self.token_arena);
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            if token.kind == TokenKind::Ident && sources.source(&token) == "defined" {
                let (name, consumed) = if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::LeftParen) {
                    (tokens.get(i + 2).map(|t| sources.source(t)), 4)
                } else {
                    (tokens.get(i + 1).map(|t| sources.source(t)), 2)
                };
                let defined = name.map(|n| self.macro_table.is_defined(n)).unwrap_or(false);
                out.push(ExpToken::synthetic(
                    TokenKind::IntLit,
                    if defined { "1" } else { "0" },
                ));
                i += consumed.min(tokens.len() - i);
            } else {
                out.push(ExpToken::from_any(token, &sources));
                i += 1;
            }
        }
        out
    }

    fn exp_tokens_to_eval(&self, tokens: &[ExpToken]) -> Vec<EvalToken> {
        tokens
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Whitespace | TokenKind::Comment => None,
                TokenKind::IntLit => parse_int_literal(&t.text).map(EvalToken::Int),
                TokenKind::StringLit => Some(EvalToken::Str(strip_string_literal_quotes(&t.text))),
                TokenKind::Ident if t.text == "true" => Some(EvalToken::Int(1)),
                TokenKind::Ident if t.text == "false" => Some(EvalToken::Int(0)),
                TokenKind::Ident => Some(EvalToken::Ident(t.text.clone())),
                other => punct_for(other).map(EvalToken::Punct),
            })
            .collect()
    }
}

/// Borrows just the two fields [`LexedSources`] needs, rather than going through a `&self`
/// method - which would tie the result to a borrow of the whole [`Preprocessor`], and make it
/// impossible to also hold a `&mut` to `diagnostics`/`region`/`macro_table` alongside it.
fn lexed_sources<'s>(source_file_set: &'s SourceFileSet, token_arena: &'s Arena<Token>) -> LexedSources<'s> {
    LexedSources {
        source_file_set,
        token_arena,
    }
}

fn punct_for(kind: TokenKind) -> Option<&'static str> {
    Some(match kind {
        TokenKind::Or => "||",
        TokenKind::And => "&&",
        TokenKind::BitOr => "|",
        TokenKind::BitXor => "^",
        TokenKind::BitAnd => "&",
        TokenKind::Equal | TokenKind::StrictEqual => "==",
        TokenKind::NotEqual | TokenKind::StrictNotEqual => "!=",
        TokenKind::Less => "<",
        TokenKind::LessEqual => "<=",
        TokenKind::Greater => ">",
        TokenKind::GreaterEqual => ">=",
        TokenKind::ShiftLeft => "<<",
        TokenKind::ShiftRight => ">>",
        TokenKind::Add => "+",
        TokenKind::Sub => "-",
        TokenKind::Mul => "*",
        TokenKind::Div => "/",
        TokenKind::Rem => "%",
        TokenKind::Not => "!",
        TokenKind::BitNot => "~",
        TokenKind::LeftParen => "(",
        TokenKind::RightParen => ")",
        _ => return None,
    })
}

/// Strips the surrounding `"`/`'` quotes a string literal's raw source text still carries, the
/// same quote character the lexer required to close it. Used only to turn a string atom into the
/// spelling [`eval::EvalToken::Str`] compares, not a general unescaper - `#if` string atoms are
/// compared verbatim, same as GNU cpp's.
fn strip_string_literal_quotes(text: &str) -> String {
    let inner = text.strip_prefix('"').or_else(|| text.strip_prefix('\'')).unwrap_or(text);
    let inner = inner.strip_suffix('"').or_else(|| inner.strip_suffix('\'')).unwrap_or(inner);
    inner.to_string()
}

fn parse_int_literal(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return i64::from_str_radix(&text[1..], 8).ok();
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use ecma_lexer::token::TokenId;

    use super::*;

    /// A [`TokenStream`] over tokens already sitting in a `Vec`, used to feed the preprocessor
    /// its input without the stream itself borrowing the arena (the driver holds its own
    /// `&mut Arena` already, and a live [`Lexer`] can't be handed over on top of that).
    struct BufferedTokenStream {
        tokens: Vec<AnyToken>,
        index: usize,
    }

    impl TokenStream for BufferedTokenStream {
        type Position = usize;

        fn next(&mut self) -> AnyToken {
            let last = *self.tokens.last().expect("lexing always produces an EndOfFile token");
            let token = self.tokens.get(self.index).copied().unwrap_or(last);
            self.index = (self.index + 1).min(self.tokens.len());
            token
        }

        fn position(&self) -> Self::Position {
            self.index
        }

        fn set_position(&mut self, position: Self::Position) {
            self.index = position;
        }
    }

    fn run(source: &str) -> (MacroTable, SlicedTokens, Arena<Token>, SourceFileSet, Vec<Diagnostic<Token>>) {
        let mut arena = Arena::new();
        let mut files = SourceFileSet::new();
        let input: Rc<str> = Rc::from(source);
        let file = files.add(SourceFile::new("t.j".to_string(), PathBuf::from("t.j"), Rc::clone(&input)));

        let builder = arena.build_source_file(file);
        let mut lexer = Lexer::new(builder, file, Rc::clone(&input));
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next();
            let is_eof = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        let mut diagnostics: Vec<Diagnostic<Token>> = Vec::new();
        let preprocessor = Preprocessor::new(
            &mut arena,
            &mut files,
            BufferedTokenStream { tokens, index: 0 },
            MacroTable::new(),
            &mut diagnostics,
        );
        let (macro_table, sliced) = preprocessor.preprocess();
        (macro_table, sliced, arena, files, diagnostics)
    }

    /// Concatenates every non-whitespace, non-comment token's text, space-separated, stopping
    /// once the stream starts repeating its last token (its documented end-of-input behavior).
    fn render(sliced: &SlicedTokens, arena: &Arena<Token>, files: &SourceFileSet) -> String {
        let Some(mut stream) = sliced.stream(arena) else { return String::new() };
        let sources = lexed_sources(files, arena);
        let mut out = String::new();
        let mut previous: Option<TokenId> = None;
        loop {
            let token = stream.next();
            if matches!(token.kind, TokenKind::Comment | TokenKind::Whitespace) {
                continue;
            }
            if previous == Some(token.id) {
                break;
            }
            previous = Some(token.id);
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(sources.source(&token));
        }
        out
    }

    #[test]
    fn object_macro_is_replaced_with_its_body() {
        let (_, sliced, arena, files, diagnostics) = run("#define X 4\nfoo = X;");
        assert!(diagnostics.is_empty());
        assert_eq!(render(&sliced, &arena, &files), "foo = 4 ;");
    }

    #[test]
    fn unknown_directive_raises_an_error() {
        let (_, _, _, _, diagnostics) = run("#bogus\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("unknown preprocessor directive"));
    }

    #[test]
    fn unmatched_if_raises_an_error_at_eof() {
        let (_, _, _, _, diagnostics) = run("#if 1\nvar x = 1;\n");
        assert!(diagnostics.iter().any(|d| d.message.contains("unterminated `#if`")));
    }

    #[test]
    fn redefining_a_macro_with_a_different_body_warns() {
        let (_, _, _, _, diagnostics) = run("#define X 1\n#define X 2\n");
        assert!(diagnostics.iter().any(|d| d.message.contains("redefined with a different body")));
    }

    #[test]
    fn getmacros_excludes_predefined_names() {
        let (macro_table, _, _, _, _) = run("#define X 1\n");
        let names: Vec<_> = macro_table.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["X"]);
    }

    #[test]
    fn self_referential_macro_expansion_terminates() {
        let (_, sliced, arena, files, diagnostics) = run("#define X X\nX;");
        assert!(diagnostics.is_empty());
        assert_eq!(render(&sliced, &arena, &files), "X ;");
    }

    #[test]
    fn if_accepts_equal_string_literals() {
        let (_, sliced, arena, files, diagnostics) = run("#if \"a\" == \"a\"\nvar x = 1;\n#endif");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        assert_eq!(render(&sliced, &arena, &files), "var x = 1 ;");
    }

    #[test]
    fn if_rejects_unequal_string_literals() {
        let (_, sliced, arena, files, diagnostics) = run("#if \"a\" == \"b\"\nvar x = 1;\n#endif");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        assert_eq!(render(&sliced, &arena, &files), "");
    }

    #[test]
    fn if_accepts_true_and_false_literals() {
        let (_, sliced, arena, files, diagnostics) = run("#if true\nvar x = 1;\n#else\nvar x = 2;\n#endif");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        assert_eq!(render(&sliced, &arena, &files), "var x = 1 ;");
    }

    #[test]
    fn named_variadic_parameter_collects_the_trailing_arguments() {
        let (_, sliced, arena, files, diagnostics) =
            run("#define L(fmt, args...) f(fmt, args)\nL(\"x\", 1, 2);");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        assert_eq!(render(&sliced, &arena, &files), "f ( \"x\" , 1 , 2 ) ;");
    }

    #[test]
    fn named_variadic_parameter_supports_comma_deletion_when_empty() {
        let (_, sliced, arena, files, diagnostics) =
            run("#define L(fmt, args...) f(fmt, ##args)\nL(\"x\");");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        assert_eq!(render(&sliced, &arena, &files), "f ( \"x\" ) ;");
    }
}
