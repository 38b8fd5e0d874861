//! The recursive-descent parser for ES3/ES5 extended with Objective-J, and the public
//! entry point ([`parse`]) that wires the lexer, preprocessor and parser together.
//!
//! `ecma_syntax` never hands the parser a live [`ecma_lexer::lexer::Lexer`] to pull tokens
//! from directly: [`Parser`][parser::Parser] also holds a [`LexedSources`] borrow of the same
//! token arena for resolving token text, and a `Lexer` holds the arena *mutably* for as long
//! as it's lexing. Those two borrows can't coexist on one arena, so [`parse`] always lexes a
//! file to completion first (either straight into the arena, or through the preprocessor if
//! macros are in play) and only ever builds the parser's
//! [`TokenProvider`][token_provider::TokenProvider] from the already-finished, read-only
//! result.

pub mod ast;
pub mod parser;
pub mod token_provider;
pub mod token_types;

use std::rc::Rc;

use ecma_foundation::{
    arena::Arena,
    errors::Diagnostic,
    source::{SourceFile, SourceFileId, SourceFileSet},
};
use ecma_lexer::{
    lexer::{Lexer, LexicalContext, RegExpContext},
    sources::LexedSources,
    token::{AnyToken, Token, TokenId, TokenKind},
    token_stream::{Channel, TokenStream},
};
use ecma_preprocessor::{
    macro_table::{Macro, MacroTable},
    sliced_tokens::{SlicedTokens, TokenSlice},
    Preprocessor,
};

use ast::Program;
use parser::Parser;
use token_provider::TokenProvider;
use token_types::{lookup_keyword, token_type_info};

/// Whether a `/` read immediately after a token of `kind` spelled `text` should be read as a
/// regex literal rather than division, mirroring `tokTypes`' `beforeExpr` attribute. Kept in
/// sync with [`parser::Parser`]'s identically-shaped `expr_allowed_after`: that one drives the
/// disambiguation the parser itself would need if it ever lexed live, this one drives it for the
/// upfront lex that actually produces every token the parser sees.
fn regexp_allowed_after(kind: TokenKind, text: &str) -> bool {
    match kind {
        TokenKind::Ident => lookup_keyword(text).map(|info| info.before_expr).unwrap_or(false),
        _ => token_type_info(kind).map(|info| info.before_expr).unwrap_or(true),
    }
}

/// Tracks the `regexpAllowed` lexer flag across an upfront-lex loop: `true` until the first
/// non-trivia token is seen, then whatever [`regexp_allowed_after`] says about the most recent
/// one. Trivia (comments, whitespace, lexer-error filler, macro filler) never updates it, same
/// as `Parser::settle_current`'s trivia-skipping loop.
struct RegExpAllowedTracker {
    allowed: bool,
}

impl RegExpAllowedTracker {
    fn new() -> Self {
        Self { allowed: true }
    }

    fn context(&self) -> RegExpContext {
        if self.allowed {
            RegExpContext::Allowed
        } else {
            RegExpContext::Disallowed
        }
    }

    fn record(&mut self, token: AnyToken, text: &str) {
        if !matches!(token.kind.channel(), Channel::COMMENT | Channel::SPACE | Channel::ERROR | Channel::MACRO) {
            self.allowed = regexp_allowed_after(token.kind, text);
        }
    }
}

/// Mirrors `spec.md`'s parser options record. Every field is read by some part of the pipeline
/// below [`parse`]; there is no `onComment`/`onToken` streaming callback field, since trivia is
/// collected into the AST via `track_comments`/`track_spaces` instead of being pushed out
/// through a callback mid-parse (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub ecma_version: u8,
    pub strict_semicolons: bool,
    pub allow_trailing_commas: bool,
    pub forbid_reserved: ForbidReserved,
    pub track_comments: bool,
    pub track_comments_include_line_break: bool,
    pub track_spaces: bool,
    pub locations: bool,
    pub ranges: bool,
    pub objj: bool,
    pub browser: bool,
    pub preprocess: bool,
    /// Macros predefined before the first `#define`, as `(name, body text)` pairs. An empty
    /// body text defines an object-like macro with no replacement, the same as a bare
    /// `#define FOO` with nothing after the name.
    pub macros: Vec<(String, String)>,
    pub line_no_in_error_message: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbidReserved {
    Never,
    Always,
    Everywhere,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ecma_version: 5,
            strict_semicolons: false,
            allow_trailing_commas: true,
            forbid_reserved: ForbidReserved::Never,
            track_comments: false,
            track_comments_include_line_break: false,
            track_spaces: false,
            locations: true,
            ranges: true,
            objj: false,
            browser: true,
            preprocess: false,
            macros: Vec::new(),
            line_no_in_error_message: true,
        }
    }
}

/// Lexes `input` to completion and drains every per-token diagnostic the lexer raised along the
/// way (malformed literals, unterminated comments, ...) into `diagnostics` before the `Lexer`
/// - and the `errors` map living on it - goes out of scope. Once tokens are handed off as a
/// plain `Vec`, there is no longer a live `Lexer` for [`TokenProvider`] to consult, so this is
/// the only point in the pipeline where those diagnostics can still be recovered.
fn lex_to_completion(
    token_arena: &mut Arena<Token>,
    file: SourceFileId,
    input: Rc<str>,
    diagnostics: &mut Vec<Diagnostic<Token>>,
) -> Vec<AnyToken> {
    let builder = token_arena.build_source_file(file);
    let mut lexer = Lexer::new(builder, file, Rc::clone(&input));
    let mut tokens = Vec::new();
    let mut regexp = RegExpAllowedTracker::new();
    loop {
        let token = lexer.next_any(LexicalContext::Default, regexp.context());
        let is_eof = token.kind == TokenKind::EndOfFile;
        let range = lexer.token_arena.arena().element(token.id).source_range.clone();
        regexp.record(token, &input[range]);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    diagnostics.extend(lexer.errors.into_values());
    tokens
}

/// First and last (inclusive, `EndOfFile` excluded) token ids among already-lexed tokens, or
/// `None` if lexing produced nothing but the trailing `EndOfFile`.
fn content_span(tokens: &[AnyToken]) -> Option<(TokenId, TokenId)> {
    let content = tokens.iter().filter(|token| token.kind != TokenKind::EndOfFile);
    let start = content.clone().next()?.id;
    let end = content.last()?.id;
    Some((start, end))
}

/// A [`TokenStream`] over tokens already sitting in a `Vec`, used only to feed the
/// preprocessor its input without the provider itself borrowing the arena: every [`AnyToken`]
/// is a self-contained `Copy` handle, so replaying them doesn't need the arena at all until
/// someone looks a token's text up.
struct BufferedTokenStream {
    tokens: Vec<AnyToken>,
    index: usize,
}

impl BufferedTokenStream {
    fn new(tokens: Vec<AnyToken>) -> Self {
        Self { tokens, index: 0 }
    }
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

/// Defines every macro in `options.macros` by lexing its body text into its own synthetic
/// source file appended to `source_file_set`, the same way the preprocessor synthesizes a
/// source file when re-lexing macro-expansion output in `Preprocessor::emit_region`. An empty
/// body text defines an object-like macro with an empty body, same as `#define FOO` alone.
fn seed_predefined_macros(
    token_arena: &mut Arena<Token>,
    source_file_set: &mut SourceFileSet,
    macros: &[(String, String)],
    macro_table: &mut MacroTable,
    diagnostics: &mut Vec<Diagnostic<Token>>,
) {
    use ecma_lexer::token::TokenSpan;

    for (name, body_text) in macros {
        let file_name = format!("<define:{name}>");
        let input: Rc<str> = Rc::from(body_text.as_str());
        let file = source_file_set.add(SourceFile::new(file_name.clone(), file_name.into(), Rc::clone(&input)));
        let builder = token_arena.build_source_file(file);
        let mut lexer = Lexer::new(builder, file, Rc::clone(&input));
        let mut start = None;
        let mut end = None;
        let mut regexp = RegExpAllowedTracker::new();
        loop {
            let token = lexer.next_any(LexicalContext::Default, regexp.context());
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            let range = lexer.token_arena.arena().element(token.id).source_range.clone();
            regexp.record(token, &input[range]);
            start.get_or_insert(token.id);
            end = Some(token.id);
        }
        let body = match (start, end) {
            (Some(start), Some(end)) => TokenSpan::Spanning { start, end },
            _ => TokenSpan::Empty,
        };
        diagnostics.extend(lexer.errors.into_values());
        macro_table.define(Macro { name: name.clone(), params: None, body });
    }
}

/// Everything a [`parse`] call produced: the program (if parsing reached a result), every
/// diagnostic raised along the way, and the source/token arena those diagnostics and the
/// program's [`TokenSpan`]s point into. `spec.md`'s `parse` returns just a program and a
/// diagnostic list, but here the arena has to come back too, since a `TokenSpan` is only
/// meaningful against the arena that produced it; dropping the arena at the end of `parse` would
/// leave every node's span referring to nothing. Use [`ParseOutcome::sources`] to resolve spans
/// back to text or line/column positions.
pub struct ParseOutcome {
    pub program: Option<Program>,
    pub diagnostics: Vec<Diagnostic<Token>>,
    pub source_file_set: SourceFileSet,
    pub token_arena: Arena<Token>,
}

impl ParseOutcome {
    pub fn sources(&self) -> LexedSources<'_> {
        LexedSources { source_file_set: &self.source_file_set, token_arena: &self.token_arena }
    }
}

/// Parses `source` per `options`, returning the program on success alongside every diagnostic
/// raised along the way (lex errors, directive/macro-expansion errors, parse errors). A fatal
/// parse error still leaves its diagnostic in the returned list; `program` is `None` in that
/// case, matching `spec.md`'s "partial ASTs are never returned" rule.
pub fn parse(source: &SourceFile, options: &ParserOptions) -> ParseOutcome {
    let mut diagnostics: Vec<Diagnostic<Token>> = Vec::new();
    let mut token_arena = Arena::new();
    let mut source_file_set = SourceFileSet::new();

    let source_rc = Rc::clone(&source.source);
    let file = source_file_set.add(source.clone());

    let tokens = lex_to_completion(&mut token_arena, file, Rc::clone(&source_rc), &mut diagnostics);
    let content = content_span(&tokens);

    let (macro_table, sliced_tokens) = if options.preprocess {
        let mut macro_table = MacroTable::new();
        seed_predefined_macros(&mut token_arena, &mut source_file_set, &options.macros, &mut macro_table, &mut diagnostics);
        let preprocessor = Preprocessor::with_dialect(
            &mut token_arena,
            &mut source_file_set,
            BufferedTokenStream::new(tokens),
            macro_table,
            &mut diagnostics,
            options.objj,
            options.browser,
        );
        preprocessor.preprocess()
    } else {
        let mut sliced = SlicedTokens::new();
        if let Some((start, end)) = content {
            sliced.push(TokenSlice::Span { start, end });
        }
        (MacroTable::new(), sliced)
    };

    let Some(stream) = sliced_tokens.stream(&token_arena) else {
        let program = Program { span: ecma_lexer::token::TokenSpan::Empty, trivia: Default::default(), body: Vec::new() };
        return ParseOutcome { program: Some(program), diagnostics, source_file_set, token_arena };
    };

    let program = {
        let sources = LexedSources { source_file_set: &source_file_set, token_arena: &token_arena };
        let token_provider = TokenProvider::from_stream(stream);
        let mut parser = Parser::new(sources, token_provider, &mut diagnostics, options.clone(), macro_table);
        parser.parse_program().ok()
    };

    ParseOutcome { program, diagnostics, source_file_set, token_arena }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ecma_foundation::span::Spanned;
    use ecma_lexer::token::TokenSpan;

    use crate::ast::{Literal, LiteralValue, Node};

    use super::*;

    fn file(source: &str) -> SourceFile {
        SourceFile::new("test.j".to_string(), PathBuf::from("test.j"), Rc::from(source))
    }

    fn parse_ok(source: &str, options: ParserOptions) -> (Program, ParseOutcome) {
        let outcome = parse(&file(source), &options);
        assert!(outcome.diagnostics.is_empty(), "unexpected diagnostics: {:?}", outcome.diagnostics);
        let program = outcome.program.clone().expect("parse produced no program");
        (program, outcome)
    }

    #[test]
    fn object_macro_expands_in_place() {
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (program, outcome) = parse_ok("#define X 4\nfoo = X;", options);
        assert_eq!(program.body.len(), 1);
        let Node::ExpressionStatement(stmt) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::AssignmentExpression(assignment) = stmt.expression.as_ref() else { panic!("expected an assignment") };
        let Node::Literal(literal) = assignment.right.as_ref() else { panic!("expected a literal") };
        assert!(matches!(literal.value, LiteralValue::Number(n) if n == 4.0));
        assert_eq!(outcome.sources().source(&stmt.span), "foo = X;");
    }

    #[test]
    fn predefined_macros_are_visible_without_their_own_define_directive() {
        let options = ParserOptions {
            preprocess: true,
            macros: vec![("PLATFORM_IOS".to_string(), "1".to_string())],
            ..Default::default()
        };
        let (program, _) = parse_ok("foo = PLATFORM_IOS;", options);
        let Node::ExpressionStatement(stmt) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::AssignmentExpression(assignment) = stmt.expression.as_ref() else { panic!("expected an assignment") };
        let Node::Literal(literal) = assignment.right.as_ref() else { panic!("expected a literal") };
        assert!(matches!(literal.value, LiteralValue::Number(n) if n == 1.0));
    }

    #[test]
    fn token_paste_produces_a_single_identifier() {
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (program, _) = parse_ok("#define CAT(a,b) a ## b\nvar CAT(foo,bar) = 1;", options);
        let Node::VariableDeclaration(decl) = &program.body[0] else { panic!("expected a variable declaration") };
        assert_eq!(decl.declarations[0].id.name, "foobar");
    }

    #[test]
    fn stringify_rescans_its_argument() {
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (program, _) = parse_ok(
            "#define str(s) #s\n#define xstr(s) str(s)\n#define V 4\nxstr(V);\nstr(V);",
            options,
        );
        let Node::ExpressionStatement(first) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::Literal(literal) = first.expression.as_ref() else { panic!("expected a literal") };
        assert!(matches!(&literal.value, LiteralValue::String(s) if s == "4"));

        let Node::ExpressionStatement(second) = &program.body[1] else { panic!("expected an expression statement") };
        let Node::Literal(literal) = second.expression.as_ref() else { panic!("expected a literal") };
        assert!(matches!(&literal.value, LiteralValue::String(s) if s == "V"));
    }

    #[test]
    fn variadic_comma_paste_deletes_the_comma_when_empty() {
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (program, _) = parse_ok(
            "#define L(fmt, ...) f(fmt, ##__VA_ARGS__)\nL(\"hi\");\nL(\"hi\", 1);",
            options,
        );
        let Node::ExpressionStatement(first) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::CallExpression(call) = first.expression.as_ref() else { panic!("expected a call") };
        assert_eq!(call.arguments.len(), 1);

        let Node::ExpressionStatement(second) = &program.body[1] else { panic!("expected an expression statement") };
        let Node::CallExpression(call) = second.expression.as_ref() else { panic!("expected a call") };
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn conditional_skip_keeps_only_the_taken_branch() {
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (program, _) = parse_ok("#if 0\nvar x = 1;\n#else\nvar x = 2;\n#endif", options);
        assert_eq!(program.body.len(), 1);
        let Node::VariableDeclaration(decl) = &program.body[0] else { panic!("expected a variable declaration") };
        let Some(init) = &decl.declarations[0].init else { panic!("expected an initializer") };
        let Node::Literal(literal) = init.as_ref() else { panic!("expected a literal") };
        assert!(matches!(literal.value, LiteralValue::Number(n) if n == 2.0));
    }

    #[test]
    fn message_send_after_asi_is_its_own_statement() {
        let options = ParserOptions { objj: true, ..Default::default() };
        let (program, _) = parse_ok("var a = 1\n[self doThing]", options);
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Node::VariableDeclaration(_)));
        let Node::ExpressionStatement(stmt) = &program.body[1] else { panic!("expected an expression statement") };
        let Node::MessageSendExpression(send) = stmt.expression.as_ref() else { panic!("expected a message send") };
        assert_eq!(send.selector.as_ref().map(|s| s.name.as_str()), Some("doThing"));
        let Some(object) = &send.object else { panic!("expected a receiver") };
        assert!(matches!(object.as_ref(), Node::Identifier(id) if id.name == "self"));
    }

    #[test]
    fn conditional_stack_is_balanced_when_accepted() {
        // A lone `#if` left open is a directive error, not a fatal parse error, so this just
        // checks that a properly closed `#if`/`#endif` pair raises nothing.
        let options = ParserOptions { preprocess: true, ..Default::default() };
        let (_, outcome) = parse_ok("#if 1\nvar x = 1;\n#endif", options);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn forbid_reserved_rejects_reserved_words_as_identifiers() {
        let options = ParserOptions { forbid_reserved: ForbidReserved::Always, ..Default::default() };
        let outcome = parse(&file("var class = 1;"), &options);
        assert!(!outcome.diagnostics.is_empty());
    }

    #[test]
    fn allow_trailing_commas_false_rejects_trailing_comma_in_object_literal() {
        let options = ParserOptions { allow_trailing_commas: false, ..Default::default() };
        let outcome = parse(&file("var x = {a: 1,};"), &options);
        assert!(!outcome.diagnostics.is_empty());
    }

    #[test]
    fn line_no_in_error_message_appends_a_position_suffix() {
        let options = ParserOptions { line_no_in_error_message: true, ..Default::default() };
        let outcome = parse(&file("var;"), &options);
        let message = &outcome.diagnostics[0].message;
        assert!(message.contains("(1:"), "expected a line:column suffix, got {message:?}");
    }

    #[test]
    fn division_after_an_operand_is_not_a_regexp_literal() {
        let (program, outcome) = parse_ok("var r = 10 / 2 / 5;", ParserOptions::default());
        let Node::VariableDeclaration(decl) = &program.body[0] else { panic!("expected a variable declaration") };
        assert_eq!(outcome.sources().source(&decl.declarations[0].init.as_ref().unwrap().span()), "10 / 2 / 5");
    }

    #[test]
    fn regexp_literal_is_read_at_the_start_of_an_expression() {
        let (program, _) = parse_ok("var r = /abc/g;", ParserOptions::default());
        let Node::VariableDeclaration(decl) = &program.body[0] else { panic!("expected a variable declaration") };
        let Some(init) = &decl.declarations[0].init else { panic!("expected an initializer") };
        assert!(matches!(init.as_ref(), Node::Literal(Literal { value: LiteralValue::RegExp { .. }, .. })));
    }

    #[test]
    fn regexp_literal_is_read_as_a_call_argument() {
        let (program, _) = parse_ok(r#"x.split(/,/);"#, ParserOptions::default());
        let Node::ExpressionStatement(stmt) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::CallExpression(call) = stmt.expression.as_ref() else { panic!("expected a call") };
        assert!(matches!(&call.arguments[0], Node::Literal(Literal { value: LiteralValue::RegExp { .. }, .. })));
    }

    #[test]
    fn return_outside_a_function_is_a_parse_error() {
        let outcome = parse(&file("return 1;"), &ParserOptions::default());
        assert!(!outcome.diagnostics.is_empty());
        assert!(outcome.diagnostics[0].message.contains("outside"));
    }

    #[test]
    fn return_inside_a_function_is_fine() {
        let outcome = parse(&file("function f() { return 1; }"), &ParserOptions::default());
        assert!(outcome.diagnostics.is_empty(), "unexpected diagnostics: {:?}", outcome.diagnostics);
    }

    #[test]
    fn with_statement_in_strict_mode_is_a_parse_error() {
        let outcome = parse(&file(r#"function f() { "use strict"; with (x) {} }"#), &ParserOptions::default());
        assert!(!outcome.diagnostics.is_empty());
        assert!(outcome.diagnostics[0].message.contains("strict"));
    }

    #[test]
    fn with_statement_outside_strict_mode_is_fine() {
        let outcome = parse(&file("with (x) {}"), &ParserOptions::default());
        assert!(outcome.diagnostics.is_empty(), "unexpected diagnostics: {:?}", outcome.diagnostics);
    }

    #[test]
    fn string_literal_accepts_a_capital_u_eight_digit_escape() {
        let (program, _) = parse_ok(r#"x = "\U0001F600";"#, ParserOptions::default());
        let Node::ExpressionStatement(stmt) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::AssignmentExpression(assignment) = stmt.expression.as_ref() else { panic!("expected an assignment") };
        let Node::Literal(literal) = assignment.right.as_ref() else { panic!("expected a literal") };
        assert!(matches!(&literal.value, LiteralValue::String(s) if s == "\u{1F600}"));
    }

    #[test]
    fn string_literal_accepts_a_multi_digit_octal_escape() {
        let (program, _) = parse_ok(r#"x = "\101\102";"#, ParserOptions::default());
        let Node::ExpressionStatement(stmt) = &program.body[0] else { panic!("expected an expression statement") };
        let Node::AssignmentExpression(assignment) = stmt.expression.as_ref() else { panic!("expected an assignment") };
        let Node::Literal(literal) = assignment.right.as_ref() else { panic!("expected a literal") };
        assert!(matches!(&literal.value, LiteralValue::String(s) if s == "AB"));
    }

    #[test]
    fn octal_escape_in_strict_mode_is_a_parse_error() {
        let outcome = parse(&file(r#"function f() { "use strict"; x = "\101"; }"#), &ParserOptions::default());
        assert!(outcome.diagnostics.iter().any(|d| d.message.contains("octal escape")));
    }

    #[test]
    fn bare_null_escape_in_strict_mode_is_fine() {
        let outcome = parse(&file(r#"function f() { "use strict"; x = "\0"; }"#), &ParserOptions::default());
        assert!(outcome.diagnostics.is_empty(), "unexpected diagnostics: {:?}", outcome.diagnostics);
    }

    #[test]
    fn empty_source_parses_to_an_empty_program() {
        let outcome = parse(&file(""), &ParserOptions::default());
        let program = outcome.program.expect("empty input still parses");
        assert!(matches!(program.span, TokenSpan::Empty));
        assert!(program.body.is_empty());
    }
}
