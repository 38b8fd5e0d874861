//! The macro expansion engine: argument collection, prescan/rescan, `##` pasting, `#`
//! stringification, and variadic arguments - bound to `__VA_ARGS__` by default, or to a
//! GNU named-variadic parameter (`args...`) when the macro declared one - with the GNU
//! `, ##__VA_ARGS__` comma-deletion extension.
//!
//! Expansion works over [`ExpToken`]s, a text-carrying token that's either a direct reference
//! to an arena token (`origin: Some(id)`, the common case - most of a macro body is copied
//! through untouched) or synthesized text with no arena backing (`origin: None`, produced by
//! `##` pasting or `#` stringification). The driver in `lib.rs` is responsible for turning any
//! synthesized [`ExpToken`]s that survive into real arena tokens before they's spliced into
//! the output stream.

use std::collections::VecDeque;

use ecma_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    span::Span,
};
use ecma_lexer::{
    classify::{is_decimal_digit, is_identifier_continue, is_identifier_start},
    sources::LexedSources,
    token::{AnyToken, Token, TokenId, TokenKind},
};

use crate::macro_table::{Macro, MacroParams, MacroTable, Predefined};

/// The preprocessor gives up expanding further and reports an error once a single macro
/// invocation has recursed this deep, rather than looping (or stack-overflowing) forever on
/// a self-referential definition.
pub const MAX_EXPANSION_DEPTH: usize = 200;

#[derive(Debug, Clone)]
pub struct ExpToken {
    pub kind: TokenKind,
    pub text: String,
    pub origin: Option<TokenId>,
}

impl ExpToken {
    pub fn from_any(token: AnyToken, sources: &LexedSources) -> Self {
        Self {
            kind: token.kind,
            text: sources.source(&token).to_owned(),
            origin: Some(token.id),
        }
    }

    pub fn synthetic(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            origin: None,
        }
    }
}

/// Call-site context needed to expand `__LINE__`/`__FILE__` and to label recursion-limit
/// diagnostics.
pub struct ExpansionContext<'a> {
    pub file_name: &'a str,
    pub line_number: u32,
    /// Whether `__OBJJ__` should expand to `1` rather than `0`.
    pub objj: bool,
    /// Whether `__BROWSER__` should expand to `1` rather than `0`.
    pub browser: bool,
}

/// Expands every macro invocation found in `input`, returning the fully rescanned output.
///
/// `expanding` is the self-reference guard: it names every macro whose body is currently
/// being rescanned higher up the call stack. An identifier naming one of those macros is left
/// untouched rather than expanded again, which is what stops `#define A A` (or mutual
/// recursion through several macros) from looping forever.
pub fn expand(
    input: Vec<ExpToken>,
    macro_table: &MacroTable,
    sources: &LexedSources,
    expanding: &mut Vec<String>,
    diagnostics: &mut dyn DiagnosticSink<Token>,
    ctx: &ExpansionContext,
) -> Vec<ExpToken> {
    let mut queue: VecDeque<ExpToken> = input.into_iter().collect();
    let mut output = Vec::new();

    while let Some(tok) = queue.pop_front() {
        if tok.kind != TokenKind::Ident {
            output.push(tok);
            continue;
        }

        if expanding.contains(&tok.text) {
            output.push(tok);
            continue;
        }

        if let Some(predefined) = Predefined::lookup(&tok.text) {
            output.push(expand_predefined(predefined, ctx));
            continue;
        }

        let Some(macro_def) = macro_table.get(&tok.text).cloned() else {
            output.push(tok);
            continue;
        };

        if expanding.len() >= MAX_EXPANSION_DEPTH {
            let mut diagnostic = Diagnostic::error(format!(
                "macro `{}` recursed more than {MAX_EXPANSION_DEPTH} levels deep",
                tok.text
            ));
            if let Some(id) = tok.origin {
                diagnostic = diagnostic.with_label(Label::primary(
                    &Span::single(id),
                    "while expanding this",
                ));
            }
            diagnostics.emit(diagnostic);
            output.push(tok);
            continue;
        }

        let body = match &macro_def.params {
            None => macro_body_tokens(&macro_def, sources),
            Some(params) => {
                if !matches!(queue.front(), Some(t) if t.kind == TokenKind::LeftParen) {
                    // Not actually invoked - a function-like macro name with no following
                    // `(` stands for itself.
                    output.push(tok);
                    continue;
                }
                queue.pop_front();
                match collect_arguments(&mut queue, params, diagnostics, &tok) {
                    Some(args) => substitute_body(
                        &macro_def,
                        params,
                        &args,
                        macro_table,
                        sources,
                        expanding,
                        diagnostics,
                        ctx,
                    ),
                    None => continue,
                }
            }
        };

        expanding.push(tok.text.clone());
        let rescanned = expand(body, macro_table, sources, expanding, diagnostics, ctx);
        expanding.pop();

        // Push the rescanned body back onto the front of the queue (rather than straight into
        // `output`) so that it can interact with whatever tokens follow it - e.g. a macro that
        // expands to a bare identifier followed immediately by a `(` belonging to the next,
        // unexpanded, function-like macro call.
        for t in rescanned.into_iter().rev() {
            queue.push_front(t);
        }
    }

    output
}

fn expand_predefined(predefined: Predefined, ctx: &ExpansionContext) -> ExpToken {
    match predefined {
        Predefined::ObjJ => ExpToken::synthetic(TokenKind::IntLit, if ctx.objj { "1" } else { "0" }),
        Predefined::Browser => {
            ExpToken::synthetic(TokenKind::IntLit, if ctx.browser { "1" } else { "0" })
        }
        Predefined::File => {
            ExpToken::synthetic(TokenKind::StringLit, format!("\"{}\"", ctx.file_name))
        }
        Predefined::Line => {
            ExpToken::synthetic(TokenKind::IntLit, ctx.line_number.to_string())
        }
    }
}

fn macro_body_tokens(macro_def: &Macro, sources: &LexedSources) -> Vec<ExpToken> {
    let Some(cursor) = ecma_lexer::token_stream::TokenSpanCursor::new(sources.token_arena, macro_def.body)
    else {
        return vec![];
    };
    let mut cursor = cursor;
    let mut tokens = vec![];
    loop {
        let token = ecma_lexer::token_stream::TokenStream::next(&mut cursor);
        if token.kind == TokenKind::EndOfFile {
            break;
        }
        tokens.push(ExpToken::from_any(token, sources));
    }
    tokens
}

/// A single macro argument, keeping both its unexpanded form (used by `#` and next to `##`)
/// and - lazily, only if the body actually substitutes it in an ordinary position - its fully
/// macro-expanded form.
struct Argument {
    unexpanded: Vec<ExpToken>,
}

fn collect_arguments(
    queue: &mut VecDeque<ExpToken>,
    params: &MacroParams,
    diagnostics: &mut dyn DiagnosticSink<Token>,
    macro_name: &ExpToken,
) -> Option<Vec<Argument>> {
    let mut args: Vec<Vec<ExpToken>> = vec![vec![]];
    let mut depth = 0i32;

    loop {
        let Some(tok) = queue.pop_front() else {
            diagnostics.emit(Diagnostic::error(format!(
                "unterminated invocation of macro `{}`: missing `)`",
                macro_name.text
            )));
            return None;
        };
        match tok.kind {
            TokenKind::LeftParen => {
                depth += 1;
                args.last_mut().unwrap().push(tok);
            }
            TokenKind::RightParen if depth == 0 => break,
            TokenKind::RightParen => {
                depth -= 1;
                args.last_mut().unwrap().push(tok);
            }
            TokenKind::Comma if depth == 0 => {
                args.push(vec![]);
            }
            _ => args.last_mut().unwrap().push(tok),
        }
    }

    // Fold every argument past the fixed parameter count back into one, comma-separated,
    // `__VA_ARGS__` argument. `MACRO()` on a purely variadic macro collects zero call-site
    // arguments, which parses above as a single empty `args[0]` - that's already the empty
    // `__VA_ARGS__` the GNU comma-deletion extension expects, so it needs no special case.
    if params.variadic {
        if args.len() > params.names.len() {
            let tail = args.split_off(params.names.len());
            let mut merged = vec![];
            for (i, part) in tail.into_iter().enumerate() {
                if i > 0 {
                    merged.push(ExpToken::synthetic(TokenKind::Comma, ","));
                }
                merged.extend(part);
            }
            args.push(merged);
        } else if args.len() == params.names.len() {
            args.push(vec![]);
        }
    }

    let expected = params.names.len() + usize::from(params.variadic);
    if args.len() != expected {
        diagnostics.emit(Diagnostic::error(format!(
            "macro `{}` expects {} argument(s), but got {}",
            macro_name.text,
            expected,
            args.len()
        )));
    }

    Some(args.into_iter().map(|unexpanded| Argument { unexpanded }).collect())
}

fn find_param<'p>(params: &'p MacroParams, name: &str) -> Option<(usize, bool)> {
    if let Some(index) = params.index_of(name) {
        return Some((index, false));
    }
    if params.variadic_arg_name() == Some(name) {
        return Some((params.names.len(), true));
    }
    None
}

fn stringify(arg: &[ExpToken]) -> ExpToken {
    let mut text = String::from('"');
    for (i, tok) in arg.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        for c in tok.text.chars() {
            if c == '"' || c == '\\' {
                text.push('\\');
            }
            text.push(c);
        }
    }
    text.push('"');
    ExpToken::synthetic(TokenKind::StringLit, text)
}

fn paste(left: &ExpToken, right: &ExpToken, diagnostics: &mut dyn DiagnosticSink<Token>) -> ExpToken {
    let combined = format!("{}{}", left.text, right.text);
    let kind = classify_pasted_text(&combined);
    if kind == TokenKind::Error {
        diagnostics.emit(Diagnostic::error(format!(
            "pasting \"{}\" and \"{}\" does not form a valid token",
            left.text, right.text
        )));
    }
    ExpToken::synthetic(kind, combined)
}

fn classify_pasted_text(text: &str) -> TokenKind {
    if text.is_empty() {
        return TokenKind::Generated;
    }
    let mut chars = text.chars();
    let first = chars.next().unwrap();
    if is_identifier_start(first) && text.chars().all(is_identifier_continue) {
        return TokenKind::Ident;
    }
    if is_decimal_digit(first) && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        return if text.contains('.') {
            TokenKind::FloatLit
        } else {
            TokenKind::IntLit
        };
    }
    const OPERATORS: &[(&str, TokenKind)] = &[
        ("+", TokenKind::Add),
        ("-", TokenKind::Sub),
        ("*", TokenKind::Mul),
        ("/", TokenKind::Div),
        ("%", TokenKind::Rem),
        ("**", TokenKind::Pow),
        ("++", TokenKind::Inc),
        ("--", TokenKind::Dec),
        ("==", TokenKind::Equal),
        ("===", TokenKind::StrictEqual),
        ("!=", TokenKind::NotEqual),
        ("!==", TokenKind::StrictNotEqual),
        ("<", TokenKind::Less),
        (">", TokenKind::Greater),
        ("<=", TokenKind::LessEqual),
        (">=", TokenKind::GreaterEqual),
        ("<<", TokenKind::ShiftLeft),
        (">>", TokenKind::ShiftRight),
        (">>>", TokenKind::TripleShiftRight),
        ("&&", TokenKind::And),
        ("||", TokenKind::Or),
        ("&", TokenKind::BitAnd),
        ("|", TokenKind::BitOr),
        ("^", TokenKind::BitXor),
        ("~", TokenKind::BitNot),
        ("!", TokenKind::Not),
        ("=", TokenKind::Assign),
        ("+=", TokenKind::AddAssign),
        ("-=", TokenKind::SubAssign),
        ("*=", TokenKind::MulAssign),
        ("/=", TokenKind::DivAssign),
        ("%=", TokenKind::RemAssign),
        ("?", TokenKind::Question),
        (":", TokenKind::Colon),
        (".", TokenKind::Dot),
        ("...", TokenKind::Ellipsis),
    ];
    OPERATORS
        .iter()
        .find(|(spelling, _)| *spelling == text)
        .map(|(_, kind)| *kind)
        .unwrap_or(TokenKind::Error)
}

#[allow(clippy::too_many_arguments)]
fn substitute_body(
    macro_def: &Macro,
    params: &MacroParams,
    args: &[Argument],
    macro_table: &MacroTable,
    sources: &LexedSources,
    expanding: &mut Vec<String>,
    diagnostics: &mut dyn DiagnosticSink<Token>,
    ctx: &ExpansionContext,
) -> Vec<ExpToken> {
    let body = macro_body_tokens(macro_def, sources);

    // First pass: resolve `#param` stringification, which always uses the argument's raw,
    // unexpanded spelling.
    let mut after_stringify: Vec<ExpToken> = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i].kind == TokenKind::Hash {
            if let Some(next) = body.get(i + 1) {
                if let Some((index, _)) = find_param(params, &next.text) {
                    after_stringify.push(stringify(&args[index].unexpanded));
                    i += 2;
                    continue;
                }
            }
        }
        after_stringify.push(body[i].clone());
        i += 1;
    }

    // Second pass: resolve `##` pasting (operands stay unexpanded) and substitute every
    // remaining parameter reference with its fully macro-expanded argument.
    let mut out: Vec<ExpToken> = Vec::with_capacity(after_stringify.len());
    let mut i = 0;
    while i < after_stringify.len() {
        let is_paste_next = after_stringify.get(i + 1).map(|t| t.kind) == Some(TokenKind::Hash)
            && after_stringify.get(i + 2).map(|t| t.kind) == Some(TokenKind::Hash);

        if is_paste_next {
            let left_raw = resolve_operand_for_paste(&after_stringify[i], params, args);
            let mut j = i + 3;
            let mut chain = left_raw;
            loop {
                let Some(right_tok) = after_stringify.get(j) else {
                    break;
                };
                let right_raw = resolve_operand_for_paste(right_tok, params, args);
                let (right_first, right_rest) = match right_raw.split_first() {
                    Some((first, rest)) => (Some(first.clone()), rest.to_vec()),
                    None => (None, vec![]),
                };

                let last = chain.pop();
                match (last, right_first) {
                    (Some(last), Some(right_first)) => chain.push(paste(&last, &right_first, diagnostics)),
                    // GNU extension: `, ##__VA_ARGS__` (or `, ##args` for a named variadic
                    // parameter) deletes the comma when the variadic argument pasted against
                    // it is empty.
                    (Some(last), None)
                        if last.kind == TokenKind::Comma
                            && params.variadic_arg_name() == Some(after_stringify[j].text.as_str()) => {}
                    (Some(last), None) => chain.push(last),
                    (None, Some(right_first)) => chain.push(right_first),
                    (None, None) => {}
                }
                chain.extend(right_rest);

                j += 1;
                if after_stringify.get(j).map(|t| t.kind) == Some(TokenKind::Hash)
                    && after_stringify.get(j + 1).map(|t| t.kind) == Some(TokenKind::Hash)
                {
                    j += 2;
                    continue;
                }
                break;
            }
            out.extend(chain);
            i = j;
            continue;
        }

        let tok = &after_stringify[i];
        if tok.kind == TokenKind::Ident {
            if let Some((index, _)) = find_param(params, &tok.text) {
                let expanded = expand(
                    args[index].unexpanded.clone(),
                    macro_table,
                    sources,
                    expanding,
                    diagnostics,
                    ctx,
                );
                out.extend(expanded);
                i += 1;
                continue;
            }
        }
        out.push(tok.clone());
        i += 1;
    }

    out
}

fn resolve_operand_for_paste(tok: &ExpToken, params: &MacroParams, args: &[Argument]) -> Vec<ExpToken> {
    if tok.kind == TokenKind::Ident {
        if let Some((index, _)) = find_param(params, &tok.text) {
            return args[index].unexpanded.clone();
        }
    }
    vec![tok.clone()]
}
