//! Statement parsing: the `Program`/`BlockStatement` body-collection loop and every ES3/5
//! statement kind.
//!
//! Every production here returns `Vec<Node>` rather than a single `Node`, even though almost
//! all of them only ever produce one. The exception is Objective-J's `@class A, B, C;`, which
//! names several classes in one statement but has no AST node of its own to hold the list — it
//! expands to multiple sibling `ClassStatement` nodes. Threading `Vec<Node>` through every
//! statement production, rather than giving `@class` a special multi-result path, keeps
//! `body.extend(self.parse_statement()?)` the one call every body-collection loop needs.

use ecma_foundation::{
    errors::{Diagnostic, Label},
    span::Spanned,
};
use ecma_lexer::token::{AnyToken, TokenKind};

use crate::ast::{
    join_spans, BlockStatement, BreakStatement, CatchClause, ContinueStatement, DoWhileStatement,
    EmptyStatement, ExpressionStatement, ForInLeft, ForInStatement, ForInit, ForStatement,
    FunctionDeclaration, Identifier, IfStatement, LabeledStatement, Node, Program,
    ReturnStatement, SwitchCase, SwitchStatement, ThrowStatement, Trivia, TryStatement,
    VariableDeclaration, VariableDeclarationKind, VariableDeclarator, WhileStatement,
    WithStatement,
};
use crate::parser::{LabelEntry, LabelKind, ParseResult, Parser};
use crate::token_types::lookup_keyword;

impl<'a> Parser<'a> {
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let start = self.current().span();
        let mut body = Vec::new();
        while !self.at(TokenKind::EndOfFile) {
            body.extend(self.parse_statement()?);
        }
        let span = if body.is_empty() { start } else { join_spans(start, body.last().unwrap().span()) };
        Ok(Program { span, trivia: Trivia::default(), body })
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<Vec<Node>> {
        if let Some(pending) = self.pending_message_send.take() {
            let expr = self.parse_message_send_expression(pending.bracket_start, pending.receiver)?;
            self.consume_semicolon()?;
            let span = expr.span();
            return Ok(vec![Node::ExpressionStatement(ExpressionStatement {
                span,
                trivia: Trivia::default(),
                expression: Box::new(expr),
            })]);
        }

        if self.at(TokenKind::LeftBrace) {
            return Ok(vec![self.parse_block()?]);
        }
        if self.eat(TokenKind::Semi) {
            return Ok(vec![Node::EmptyStatement(EmptyStatement {
                span: self.current().span(),
                trivia: Trivia::default(),
            })]);
        }
        if self.options.objj && self.at(TokenKind::At) {
            return self.parse_objj_statement();
        }
        if self.at(TokenKind::Ident) {
            match self.current_text() {
                "var" => return Ok(vec![self.parse_variable_statement()?]),
                "function" => return Ok(vec![self.parse_function_declaration()?]),
                "if" => return Ok(vec![self.parse_if_statement()?]),
                "for" => return Ok(vec![self.parse_for_statement()?]),
                "while" => return Ok(vec![self.parse_while_statement()?]),
                "do" => return Ok(vec![self.parse_do_while_statement()?]),
                "switch" => return Ok(vec![self.parse_switch_statement()?]),
                "try" => return Ok(vec![self.parse_try_statement()?]),
                "throw" => return Ok(vec![self.parse_throw_statement()?]),
                "return" => return Ok(vec![self.parse_return_statement()?]),
                "break" => return Ok(vec![self.parse_break_or_continue(true)?]),
                "continue" => return Ok(vec![self.parse_break_or_continue(false)?]),
                "with" => return Ok(vec![self.parse_with_statement()?]),
                "debugger" => {
                    let token = self.bump();
                    self.consume_semicolon()?;
                    return Ok(vec![Node::DebuggerStatement(crate::ast::DebuggerStatement {
                        span: token.span(),
                        trivia: Trivia::default(),
                    })]);
                }
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Vec<Node>> {
        let expr = self.parse_expression()?;
        if let Node::Identifier(id) = &expr {
            if self.at(TokenKind::Colon) {
                let label = id.clone();
                self.bump();
                let body_is_loop = self.at(TokenKind::Ident)
                    && lookup_keyword(self.current_text()).map(|k| k.is_loop).unwrap_or(false);
                self.labels.push(LabelEntry {
                    name: label.name.clone(),
                    kind: if body_is_loop { LabelKind::Loop } else { LabelKind::Other },
                });
                let body = self
                    .parse_statement()?
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| empty_statement(label.span));
                self.labels.pop();
                let span = join_spans(label.span, body.span());
                return Ok(vec![Node::LabeledStatement(LabeledStatement {
                    span,
                    trivia: Trivia::default(),
                    label,
                    body: Box::new(body),
                })]);
            }
        }
        self.consume_semicolon()?;
        let span = expr.span();
        Ok(vec![Node::ExpressionStatement(ExpressionStatement {
            span,
            trivia: Trivia::default(),
            expression: Box::new(expr),
        })])
    }

    fn parse_block(&mut self) -> ParseResult<Node> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            body.extend(self.parse_statement()?);
        }
        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Node::BlockStatement(BlockStatement {
            span: join_spans(open.span(), close.span()),
            trivia: Trivia::default(),
            body,
        }))
    }

    fn parse_variable_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("var")?;
        let declarations = self.parse_variable_declarators()?;
        self.consume_semicolon()?;
        let span = join_spans(
            start.span(),
            declarations.last().map(|d| d.id.span).unwrap_or(start.span()),
        );
        Ok(Node::VariableDeclaration(VariableDeclaration {
            span,
            trivia: Trivia::default(),
            declarations,
            kind: VariableDeclarationKind::Var,
        }))
    }

    fn parse_variable_declarators(&mut self) -> ParseResult<Vec<VariableDeclarator>> {
        let mut declarators = Vec::new();
        loop {
            let id = self.parse_identifier()?;
            let init = if self.eat(TokenKind::Assign) {
                Some(Box::new(self.parse_assignment_expression()?))
            } else {
                None
            };
            declarators.push(VariableDeclarator { id, init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(declarators)
    }

    fn parse_function_declaration(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("function")?;
        let id = Some(self.parse_identifier()?);
        let params = self.parse_function_params()?;
        let was_in_function = self.in_function;
        self.in_function = true;
        let (body, strict) = self.parse_function_body()?;
        self.in_function = was_in_function;
        let span = join_spans(start.span(), body.span());
        Ok(Node::FunctionDeclaration(FunctionDeclaration {
            span,
            trivia: Trivia::default(),
            id,
            params,
            body,
            strict,
        }))
    }

    fn parse_if_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("if")?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let consequent = self.parse_single_statement()?;
        let alternate = if self.eat_keyword("else") {
            Some(Box::new(self.parse_single_statement()?))
        } else {
            None
        };
        let span = join_spans(
            start.span(),
            alternate.as_deref().unwrap_or(&consequent).span(),
        );
        Ok(Node::IfStatement(IfStatement {
            span,
            trivia: Trivia::default(),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        }))
    }

    /// A statement position that takes exactly one node (an `if`/`for`/`while` body, etc). Only
    /// Objective-J's `@class A, B;` ever produces more than one, and that can't appear directly
    /// in one of these positions in practice; if it somehow did, the rest are dropped.
    fn parse_single_statement(&mut self) -> ParseResult<Node> {
        let mut statements = self.parse_statement()?;
        Ok(if statements.is_empty() {
            empty_statement(self.current().span())
        } else {
            statements.remove(0)
        })
    }

    fn parse_loop_body(&mut self) -> ParseResult<Node> {
        self.labels.push(LabelEntry { name: String::new(), kind: LabelKind::Loop });
        let body = self.parse_single_statement();
        self.labels.pop();
        body
    }

    fn parse_for_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("for")?;
        self.expect(TokenKind::LeftParen)?;

        if self.eat(TokenKind::Semi) {
            return self.parse_for_rest(start, ForInit::None);
        }

        if self.at_keyword("var") {
            let var_start = self.bump();
            let declarations = self.parse_variable_declarators()?;
            if self.at_keyword("in") {
                self.bump();
                if declarations.len() != 1 {
                    return Err(self.unexpected("single declarator before `in`"));
                }
                let decl = VariableDeclaration {
                    span: var_start.span(),
                    trivia: Trivia::default(),
                    declarations,
                    kind: VariableDeclarationKind::Var,
                };
                let right = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                let body = self.parse_loop_body()?;
                let span = join_spans(start.span(), body.span());
                return Ok(Node::ForInStatement(ForInStatement {
                    span,
                    trivia: Trivia::default(),
                    left: ForInLeft::VariableDeclaration(decl),
                    right: Box::new(right),
                    body: Box::new(body),
                }));
            }
            self.expect(TokenKind::Semi)?;
            let decl = VariableDeclaration {
                span: var_start.span(),
                trivia: Trivia::default(),
                declarations,
                kind: VariableDeclarationKind::Var,
            };
            return self.parse_for_rest(start, ForInit::VariableDeclaration(decl));
        }

        let was_allow_in = self.allow_in;
        self.allow_in = false;
        let expr = self.parse_expression()?;
        self.allow_in = was_allow_in;
        if self.at_keyword("in") {
            self.bump();
            let right = self.parse_expression()?;
            self.expect(TokenKind::RightParen)?;
            let body = self.parse_loop_body()?;
            let span = join_spans(start.span(), body.span());
            return Ok(Node::ForInStatement(ForInStatement {
                span,
                trivia: Trivia::default(),
                left: ForInLeft::Expression(Box::new(expr)),
                right: Box::new(right),
                body: Box::new(body),
            }));
        }
        self.expect(TokenKind::Semi)?;
        self.parse_for_rest(start, ForInit::Expression(Box::new(expr)))
    }

    fn parse_for_rest(&mut self, start: AnyToken, init: ForInit) -> ParseResult<Node> {
        let test = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Semi)?;
        let update = if self.at(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        let span = join_spans(start.span(), body.span());
        Ok(Node::ForStatement(ForStatement {
            span,
            trivia: Trivia::default(),
            init,
            test,
            update,
            body: Box::new(body),
        }))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("while")?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        let span = join_spans(start.span(), body.span());
        Ok(Node::WhileStatement(WhileStatement {
            span,
            trivia: Trivia::default(),
            test: Box::new(test),
            body: Box::new(body),
        }))
    }

    fn parse_do_while_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("do")?;
        let body = self.parse_loop_body()?;
        self.expect_keyword("while")?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        // `do ... while (x)` doesn't require a following `;` per ES5 Annex A; a missing one is
        // silently accepted regardless of `strict_semicolons`.
        self.eat(TokenKind::Semi);
        let span = join_spans(start.span(), test.span());
        Ok(Node::DoWhileStatement(DoWhileStatement {
            span,
            trivia: Trivia::default(),
            body: Box::new(body),
            test: Box::new(test),
        }))
    }

    fn parse_switch_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("switch")?;
        self.expect(TokenKind::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;
        self.labels.push(LabelEntry { name: String::new(), kind: LabelKind::Switch });
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.at(TokenKind::RightBrace) {
            let test = if self.eat_keyword("default") {
                if seen_default {
                    return Err(self.unexpected("at most one `default` clause"));
                }
                seen_default = true;
                None
            } else {
                self.expect_keyword("case")?;
                Some(Box::new(self.parse_expression()?))
            };
            self.expect(TokenKind::Colon)?;
            let mut consequent = Vec::new();
            while !self.at(TokenKind::RightBrace) && !self.at_keyword("case") && !self.at_keyword("default") {
                consequent.extend(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        self.labels.pop();
        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Node::SwitchStatement(SwitchStatement {
            span: join_spans(start.span(), close.span()),
            trivia: Trivia::default(),
            discriminant: Box::new(discriminant),
            cases,
        }))
    }

    fn parse_try_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("try")?;
        let block = self.parse_block()?;
        let handler = if self.eat_keyword("catch") {
            self.expect(TokenKind::LeftParen)?;
            let param = self.parse_identifier()?;
            self.expect(TokenKind::RightParen)?;
            let body = self.parse_block()?;
            Some(CatchClause { param, body: Box::new(body) })
        } else {
            None
        };
        let finalizer = if self.eat_keyword("finally") {
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected("`catch` or `finally`"));
        }
        let end = finalizer
            .as_ref()
            .map(|n| n.span())
            .or_else(|| handler.as_ref().map(|h| h.body.span()))
            .unwrap_or(block.span());
        let span = join_spans(start.span(), end);
        Ok(Node::TryStatement(TryStatement {
            span,
            trivia: Trivia::default(),
            block: Box::new(block),
            handler,
            finalizer,
        }))
    }

    fn parse_throw_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("throw")?;
        if self.newline_before_current() {
            return Err(self.unexpected("expression (no line break after `throw`)"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        let span = join_spans(start.span(), argument.span());
        Ok(Node::ThrowStatement(ThrowStatement {
            span,
            trivia: Trivia::default(),
            argument: Box::new(argument),
        }))
    }

    fn parse_return_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("return")?;
        if !self.in_function {
            self.emit_diagnostic(
                Diagnostic::error("'return' outside of a function")
                    .with_label(Label::primary(&start.span(), "not inside a function body")),
            );
        }
        let argument = if self.at(TokenKind::Semi)
            || self.at(TokenKind::RightBrace)
            || self.at(TokenKind::EndOfFile)
            || self.newline_before_current()
        {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume_semicolon()?;
        let span = argument.as_deref().map(|n| join_spans(start.span(), n.span())).unwrap_or(start.span());
        Ok(Node::ReturnStatement(ReturnStatement { span, trivia: Trivia::default(), argument }))
    }

    fn parse_break_or_continue(&mut self, is_break: bool) -> ParseResult<Node> {
        let start = self.bump();
        let label = if !self.newline_before_current()
            && self.at(TokenKind::Ident)
            && lookup_keyword(self.current_text()).is_none()
        {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.validate_label_reference(is_break, label.as_ref());
        self.consume_semicolon()?;
        let span = label.as_ref().map(|l| join_spans(start.span(), l.span)).unwrap_or(start.span());
        Ok(if is_break {
            Node::BreakStatement(BreakStatement { span, trivia: Trivia::default(), label })
        } else {
            Node::ContinueStatement(ContinueStatement { span, trivia: Trivia::default(), label })
        })
    }

    fn validate_label_reference(&mut self, is_break: bool, label: Option<&Identifier>) {
        let Some(label) = label else { return };
        match self.labels.iter().rev().find(|l| l.name == label.name) {
            None => self.emit_diagnostic(
                Diagnostic::error(format!("label `{}` is not defined", label.name))
                    .with_label(Label::primary::<_, String>(&label.span, None)),
            ),
            Some(entry) if !is_break && entry.kind != LabelKind::Loop => self.emit_diagnostic(
                Diagnostic::error(format!("`continue` label `{}` does not label a loop", label.name))
                    .with_label(Label::primary::<_, String>(&label.span, None)),
            ),
            _ => {}
        }
    }

    fn parse_with_statement(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("with")?;
        if self.strict {
            self.emit_diagnostic(
                Diagnostic::error("'with' statements are not allowed in strict mode code")
                    .with_label(Label::primary(&start.span(), "'with' used here")),
            );
        }
        self.expect(TokenKind::LeftParen)?;
        let object = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_single_statement()?;
        let span = join_spans(start.span(), body.span());
        Ok(Node::WithStatement(WithStatement {
            span,
            trivia: Trivia::default(),
            object: Box::new(object),
            body: Box::new(body),
        }))
    }
}

fn empty_statement(span: ecma_lexer::token::TokenSpan) -> Node {
    Node::EmptyStatement(EmptyStatement { span, trivia: Trivia::default() })
}
