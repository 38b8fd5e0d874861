//! Expression parsing: precedence climbing over binary/logical/assignment operators, the
//! left-hand-side chain of calls/member accesses/`new`, and primary expression atoms.
//!
//! The one piece of this grammar that isn't ordinary recursive descent is the `[` ambiguity
//! between a computed member access and the start of an Objective-J message send; see
//! [`Self::parse_subscripts`].

use ecma_foundation::{
    errors::{Diagnostic, Label},
    span::Spanned,
};
use ecma_lexer::token::{AnyToken, TokenKind};

use crate::ast::{
    join_spans, AssignmentOperator, BinaryExpression, BinaryOperator, CallExpression,
    ConditionalExpression, FunctionExpression, Identifier, Literal, LiteralValue,
    LogicalExpression, LogicalOperator, MemberExpression, NewExpression, Node, ObjectExpression,
    ObjectProperty, ObjectPropertyKind, SequenceExpression, ThisExpression, Trivia,
    UnaryExpression, UnaryOperator, UpdateExpression, UpdateOperator,
};
use crate::parser::{ParseResult, Parser, PendingMessageSend};
use crate::token_types::token_type_info;

impl<'a> Parser<'a> {
    /// `Expression`: an assignment expression, or a `,`-separated sequence of them.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node> {
        let first = self.parse_assignment_expression()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        let span = expressions
            .iter()
            .map(Spanned::span)
            .reduce(|a, b| a.join(&b))
            .expect("at least one expression");
        Ok(Node::SequenceExpression(SequenceExpression {
            span,
            trivia: Trivia::default(),
            expressions,
        }))
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> ParseResult<Node> {
        let left = self.parse_conditional_expression()?;
        if let Some(operator) = self.current_assignment_operator() {
            self.bump();
            let right = self.parse_assignment_expression()?;
            let span = join_spans(left.span(), right.span());
            return Ok(Node::AssignmentExpression(crate::ast::AssignmentExpression {
                span,
                trivia: Trivia::default(),
                operator,
                left: Box::new(left),
                right: Box::new(right),
            }));
        }
        Ok(left)
    }

    fn current_assignment_operator(&self) -> Option<AssignmentOperator> {
        use AssignmentOperator::*;
        Some(match self.current().kind {
            TokenKind::Assign => Assign,
            TokenKind::AddAssign => AddAssign,
            TokenKind::SubAssign => SubAssign,
            TokenKind::MulAssign => MulAssign,
            TokenKind::DivAssign => DivAssign,
            TokenKind::RemAssign => RemAssign,
            TokenKind::ShiftLeftAssign => ShiftLeftAssign,
            TokenKind::ShiftRightAssign => ShiftRightAssign,
            TokenKind::TripleShiftRightAssign => TripleShiftRightAssign,
            TokenKind::BitAndAssign => BitAndAssign,
            TokenKind::BitOrAssign => BitOrAssign,
            TokenKind::BitXorAssign => BitXorAssign,
            _ => return None,
        })
    }

    fn parse_conditional_expression(&mut self) -> ParseResult<Node> {
        let test = self.parse_binary_expression(1)?;
        if self.eat(TokenKind::Question) {
            let consequent = self.parse_assignment_expression()?;
            self.expect(TokenKind::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            let span = join_spans(test.span(), alternate.span());
            return Ok(Node::ConditionalExpression(ConditionalExpression {
                span,
                trivia: Trivia::default(),
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            }));
        }
        Ok(test)
    }

    /// Precedence climbing over `||`/`&&`/binary operators/`in`/`instanceof`, per the
    /// precedence table in [`crate::token_types::token_type_info`].
    fn parse_binary_expression(&mut self, min_precedence: u8) -> ParseResult<Node> {
        let mut left = self.parse_unary_expression()?;
        loop {
            let Some((precedence, is_logical)) = self.current_binop_precedence() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let op_token = self.bump();
            let right = self.parse_binary_expression(precedence + 1)?;
            let span = join_spans(left.span(), right.span());
            left = if is_logical {
                Node::LogicalExpression(LogicalExpression {
                    span,
                    trivia: Trivia::default(),
                    operator: logical_operator(op_token.kind),
                    left: Box::new(left),
                    right: Box::new(right),
                })
            } else {
                Node::BinaryExpression(BinaryExpression {
                    span,
                    trivia: Trivia::default(),
                    operator: self.binary_operator(op_token),
                    left: Box::new(left),
                    right: Box::new(right),
                })
            };
        }
        Ok(left)
    }

    fn current_binop_precedence(&self) -> Option<(u8, bool)> {
        if self.at(TokenKind::Ident) {
            let text = self.current_text();
            if text == "in" {
                return self.allow_in.then_some((7, false));
            }
            if text == "instanceof" {
                return Some((7, false));
            }
            return None;
        }
        let info = token_type_info(self.current().kind)?;
        let precedence = info.binop?;
        let is_logical = matches!(self.current().kind, TokenKind::Or | TokenKind::And);
        Some((precedence, is_logical))
    }

    fn binary_operator(&self, token: ecma_lexer::token::AnyToken) -> BinaryOperator {
        use BinaryOperator::*;
        match token.kind {
            TokenKind::Add => Add,
            TokenKind::Sub => Sub,
            TokenKind::Mul => Mul,
            TokenKind::Div => Div,
            TokenKind::Rem => Rem,
            TokenKind::ShiftLeft => ShiftLeft,
            TokenKind::ShiftRight => ShiftRight,
            TokenKind::TripleShiftRight => TripleShiftRight,
            TokenKind::BitAnd => BitAnd,
            TokenKind::BitOr => BitOr,
            TokenKind::BitXor => BitXor,
            TokenKind::Equal => Equal,
            TokenKind::NotEqual => NotEqual,
            TokenKind::StrictEqual => StrictEqual,
            TokenKind::StrictNotEqual => StrictNotEqual,
            TokenKind::Less => Less,
            TokenKind::LessEqual => LessEqual,
            TokenKind::Greater => Greater,
            TokenKind::GreaterEqual => GreaterEqual,
            TokenKind::Ident if self.sources.source(&token) == "in" => In,
            TokenKind::Ident => InstanceOf,
            other => unreachable!("{other:?} is not a binary operator token"),
        }
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Node> {
        if let Some(operator) = self.current_unary_operator() {
            let op_token = self.bump();
            let argument = self.parse_unary_expression()?;
            let span = join_spans(op_token.span(), argument.span());
            return Ok(Node::UnaryExpression(UnaryExpression {
                span,
                trivia: Trivia::default(),
                operator,
                argument: Box::new(argument),
            }));
        }
        if self.at(TokenKind::Inc) || self.at(TokenKind::Dec) {
            let op_token = self.bump();
            let argument = self.parse_unary_expression()?;
            let span = join_spans(op_token.span(), argument.span());
            return Ok(Node::UpdateExpression(UpdateExpression {
                span,
                trivia: Trivia::default(),
                operator: update_operator(op_token.kind),
                argument: Box::new(argument),
                prefix: true,
            }));
        }
        self.parse_update_expression()
    }

    fn current_unary_operator(&self) -> Option<UnaryOperator> {
        use UnaryOperator::*;
        Some(match self.current().kind {
            TokenKind::Add => Plus,
            TokenKind::Sub => Minus,
            TokenKind::Not => Not,
            TokenKind::BitNot => BitNot,
            TokenKind::Ident if self.at_keyword("typeof") => TypeOf,
            TokenKind::Ident if self.at_keyword("void") => Void,
            TokenKind::Ident if self.at_keyword("delete") => Delete,
            _ => return None,
        })
    }

    /// Postfix `++`/`--`. Prefix update expressions are handled one level up, in
    /// [`Self::parse_unary_expression`], since they bind to a full unary expression rather than
    /// just a left-hand-side expression.
    fn parse_update_expression(&mut self) -> ParseResult<Node> {
        let argument = self.parse_left_hand_side_expression()?;
        if !self.newline_before_current() && (self.at(TokenKind::Inc) || self.at(TokenKind::Dec)) {
            let op_token = self.bump();
            let span = join_spans(argument.span(), op_token.span());
            return Ok(Node::UpdateExpression(UpdateExpression {
                span,
                trivia: Trivia::default(),
                operator: update_operator(op_token.kind),
                argument: Box::new(argument),
                prefix: false,
            }));
        }
        Ok(argument)
    }

    fn parse_left_hand_side_expression(&mut self) -> ParseResult<Node> {
        let base = if self.at_keyword("new") {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        self.parse_subscripts(base, true)
    }

    fn parse_new_expression(&mut self) -> ParseResult<Node> {
        let new_token = self.expect_keyword("new")?;
        let callee = if self.at_keyword("new") {
            self.parse_new_expression()?
        } else {
            let atom = self.parse_primary_expression()?;
            self.parse_subscripts(atom, false)?
        };
        let mut span = join_spans(new_token.span(), callee.span());
        let arguments = if self.at(TokenKind::LeftParen) {
            let (args, close) = self.parse_arguments()?;
            span = join_spans(span, close.span());
            args
        } else {
            Vec::new()
        };
        Ok(Node::NewExpression(NewExpression {
            span,
            trivia: Trivia::default(),
            callee: Box::new(callee),
            arguments,
        }))
    }

    /// The postfix chain of `.prop`, `[expr]`, and (when `allow_call`) `(args)`.
    ///
    /// A `[` here is ambiguous in Objective-J mode: `foo[bar]` is an ordinary computed member
    /// access, but `foo` followed by a newline and `[self doThing]` is two statements, the
    /// second one a message send whose receiver (`self`) happens to be spelled with the same
    /// bracket. After reading `[ expr`, if the next token isn't `]`, this can't be a subscript,
    /// so the attempt is abandoned: the `[` and `expr` already consumed become the start of a
    /// message send, latched in `pending_message_send` for the enclosing statement parser to
    /// pick up on its next turn (see `parser::objj::Parser::parse_message_send_expression`), and
    /// `base` is returned completely unchanged, as if the `[` had never been there.
    fn parse_subscripts(&mut self, mut base: Node, allow_call: bool) -> ParseResult<Node> {
        loop {
            if self.eat(TokenKind::Dot) {
                let property = self.parse_identifier_name()?;
                let span = join_spans(base.span(), property.span);
                base = Node::MemberExpression(MemberExpression {
                    span,
                    trivia: Trivia::default(),
                    object: Box::new(base),
                    property: Box::new(Node::Identifier(property)),
                    computed: false,
                });
            } else if self.at(TokenKind::LeftBracket) {
                let bracket_start = self.current().span();
                self.bump();
                let receiver = self.parse_expression()?;
                if self.eat(TokenKind::RightBracket) {
                    let span = join_spans(base.span(), bracket_start);
                    base = Node::MemberExpression(MemberExpression {
                        span,
                        trivia: Trivia::default(),
                        object: Box::new(base),
                        property: Box::new(receiver),
                        computed: true,
                    });
                } else if self.options.objj {
                    self.pending_message_send = Some(PendingMessageSend { bracket_start, receiver });
                    return Ok(base);
                } else {
                    return Err(self.unexpected("`]`"));
                }
            } else if allow_call && self.at(TokenKind::LeftParen) {
                let (arguments, close) = self.parse_arguments()?;
                let span = join_spans(base.span(), close.span());
                base = Node::CallExpression(CallExpression {
                    span,
                    trivia: Trivia::default(),
                    callee: Box::new(base),
                    arguments,
                });
            } else {
                break;
            }
        }
        Ok(base)
    }

    fn parse_identifier_name(&mut self) -> ParseResult<Identifier> {
        // Property names after `.` may be any identifier-shaped token, including reserved words
        // (`foo.in`, `foo.class`), unless `forbid_reserved` is set to forbid them everywhere.
        if !self.at(TokenKind::Ident) {
            return Err(self.unexpected("property name"));
        }
        let token = self.bump();
        let name = self.sources.source(&token).to_string();
        if self.options.forbid_reserved == crate::ForbidReserved::Everywhere && self.is_reserved_word(&name) {
            self.reserved_word_diagnostic(token, &name);
        }
        Ok(Identifier {
            span: token.span(),
            trivia: Trivia::default(),
            name,
        })
    }

    pub(crate) fn parse_arguments(&mut self) -> ParseResult<(Vec<Node>, ecma_lexer::token::AnyToken)> {
        self.expect(TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.at(TokenKind::RightParen) {
            arguments.push(self.parse_assignment_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen)?;
        Ok((arguments, close))
    }

    fn parse_primary_expression(&mut self) -> ParseResult<Node> {
        match self.current().kind {
            TokenKind::Ident if self.at_keyword("this") => {
                let token = self.bump();
                Ok(Node::ThisExpression(ThisExpression { span: token.span(), trivia: Trivia::default() }))
            }
            TokenKind::Ident if self.at_keyword("function") => self.parse_function_expression(),
            TokenKind::Ident if self.at_keyword("null") => {
                let token = self.bump();
                Ok(literal(token.span(), LiteralValue::Null, "null".to_string()))
            }
            TokenKind::Ident if self.at_keyword("true") || self.at_keyword("false") => {
                let text = self.current_text();
                let value = text == "true";
                let token = self.bump();
                Ok(literal(token.span(), LiteralValue::Bool(value), text.to_string()))
            }
            TokenKind::Ident => {
                let id = self.parse_identifier()?;
                Ok(Node::Identifier(id))
            }
            TokenKind::IntLit | TokenKind::FloatLit => {
                let token = self.bump();
                let raw = self.sources.source(&token).to_string();
                let value = parse_numeric_literal(&raw);
                Ok(literal(token.span(), LiteralValue::Number(value), raw))
            }
            TokenKind::StringLit => {
                let token = self.bump();
                let raw = self.sources.source(&token).to_string();
                let value = self.unescape_string_literal(&raw, token);
                Ok(literal(token.span(), LiteralValue::String(value), raw))
            }
            TokenKind::RegExpLit => {
                let token = self.bump();
                let raw = self.sources.source(&token).to_string();
                let (pattern, flags) = split_regexp_literal(&raw);
                Ok(literal(token.span(), LiteralValue::RegExp { pattern, flags }, raw))
            }
            TokenKind::LeftParen => {
                self.bump();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(expression)
            }
            TokenKind::LeftBracket => self.parse_array_expression(),
            TokenKind::LeftBrace => self.parse_object_expression(),
            TokenKind::At if self.options.objj => self.parse_objj_primary_expression(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_function_expression(&mut self) -> ParseResult<Node> {
        let start = self.expect_keyword("function")?;
        let id = if self.at(TokenKind::Ident) && !self.at_keyword("function") {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let params = self.parse_function_params()?;
        let was_in_function = self.in_function;
        self.in_function = true;
        let (body, strict) = self.parse_function_body()?;
        self.in_function = was_in_function;
        let span = join_spans(start.span(), body.span());
        Ok(Node::FunctionExpression(FunctionExpression {
            span,
            trivia: Trivia::default(),
            id,
            params,
            body,
            strict,
        }))
    }

    /// A leading `[`: either an ordinary array literal or (Objective-J) a message send, decided
    /// by the same rule as the postfix case in [`Self::parse_subscripts`] except, since there's
    /// no preceding statement the ambiguity could instead belong to, an ambiguous result is
    /// resolved immediately in place rather than latched.
    fn parse_array_expression(&mut self) -> ParseResult<Node> {
        let open = self.expect(TokenKind::LeftBracket)?;
        if self.at(TokenKind::RightBracket) {
            let close = self.bump();
            return Ok(Node::ArrayExpression(crate::ast::ArrayExpression {
                span: join_spans(open.span(), close.span()),
                trivia: Trivia::default(),
                elements: Vec::new(),
            }));
        }
        if self.at(TokenKind::Comma) {
            return self.parse_array_elements(open, None);
        }
        let first = self.parse_assignment_expression()?;
        if !self.options.objj || self.at(TokenKind::RightBracket) || self.at(TokenKind::Comma) {
            return self.parse_array_elements(open, Some(first));
        }
        self.parse_message_send_expression(open.span(), first)
    }

    fn parse_array_elements(
        &mut self,
        open: ecma_lexer::token::AnyToken,
        first: Option<Node>,
    ) -> ParseResult<Node> {
        let mut elements = vec![first.map(Box::new)];
        while self.eat(TokenKind::Comma) {
            if self.at(TokenKind::RightBracket) {
                elements.push(None);
                continue;
            }
            elements.push(Some(Box::new(self.parse_assignment_expression()?)));
        }
        let close = self.expect(TokenKind::RightBracket)?;
        Ok(Node::ArrayExpression(crate::ast::ArrayExpression {
            span: join_spans(open.span(), close.span()),
            trivia: Trivia::default(),
            elements,
        }))
    }

    fn parse_object_expression(&mut self) -> ParseResult<Node> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            properties.push(self.parse_object_property()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.at(TokenKind::RightBrace) && !self.options.allow_trailing_commas {
                return Err(self.unexpected("property name"));
            }
        }
        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Node::ObjectExpression(ObjectExpression {
            span: join_spans(open.span(), close.span()),
            trivia: Trivia::default(),
            properties,
        }))
    }

    fn parse_object_property(&mut self) -> ParseResult<ObjectProperty> {
        let key_token = self.bump();
        let key_text = self.sources.source(&key_token).to_string();
        let is_accessor_word = key_token.kind == TokenKind::Ident
            && (key_text == "get" || key_text == "set")
            && (self.at(TokenKind::Ident) || self.at(TokenKind::StringLit) || self.at(TokenKind::IntLit)
                || self.at(TokenKind::FloatLit));
        if is_accessor_word {
            let kind = if key_text == "get" { ObjectPropertyKind::Get } else { ObjectPropertyKind::Set };
            let name_token = self.bump();
            let key = self.property_key_from_token(name_token)?;
            let params = self.parse_function_params()?;
            let was_in_function = self.in_function;
            self.in_function = true;
            let (body, strict) = self.parse_function_body()?;
            self.in_function = was_in_function;
            let span = join_spans(key_token.span(), body.span());
            let value = Box::new(Node::FunctionExpression(FunctionExpression {
                span,
                trivia: Trivia::default(),
                id: None,
                params,
                body,
                strict,
            }));
            return Ok(ObjectProperty { key: Box::new(key), value, kind });
        }
        let key = self.property_key_from_token(key_token)?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_assignment_expression()?;
        Ok(ObjectProperty { key: Box::new(key), value: Box::new(value), kind: ObjectPropertyKind::Init })
    }

    fn property_key_from_token(&mut self, token: AnyToken) -> ParseResult<Node> {
        let raw = self.sources.source(&token).to_string();
        Ok(match token.kind {
            TokenKind::Ident => Node::Identifier(Identifier { span: token.span(), trivia: Trivia::default(), name: raw }),
            TokenKind::StringLit => {
                let value = self.unescape_string_literal(&raw, token);
                literal(token.span(), LiteralValue::String(value), raw)
            }
            TokenKind::IntLit | TokenKind::FloatLit => {
                let value = parse_numeric_literal(&raw);
                literal(token.span(), LiteralValue::Number(value), raw)
            }
            _ => return Err(self.unexpected("property name")),
        })
    }

    /// Unescapes the body of a string literal (`raw` still has its surrounding quotes; they're
    /// trimmed here). Recognizes `\x` and `\u` hex escapes, the GNU `\U` 8-digit extension, and
    /// legacy octal escapes. An octal escape other than the bare `\0` raises a diagnostic when
    /// parsed as strict mode code, where the standard forbids it.
    fn unescape_string_literal(&mut self, raw: &str, token: AnyToken) -> String {
        let inner = &raw[1..raw.len().saturating_sub(1)];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some('v') => out.push('\u{b}'),
                Some('\n') | Some('\r') => { /* line continuation: the backslash-newline vanishes */ }
                Some('x') => {
                    let hex: String = chars.by_ref().take(2).collect();
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                }
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                }
                Some('U') => {
                    let hex: String = chars.by_ref().take(8).collect();
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                }
                Some(d @ '0'..='7') => {
                    let mut digits = String::from(d);
                    let max_len = if d <= '3' { 3 } else { 2 };
                    while digits.len() < max_len {
                        match chars.peek() {
                            Some(&next) if ('0'..='7').contains(&next) => {
                                digits.push(next);
                                chars.next();
                            }
                            _ => break,
                        }
                    }
                    if self.strict && !(d == '0' && digits.len() == 1) {
                        self.emit_diagnostic(
                            Diagnostic::error("octal escape sequences are not allowed in strict mode code")
                                .with_label(Label::primary(&token.span(), "octal escape used here")),
                        );
                    }
                    if let Ok(code) = u32::from_str_radix(&digits, 8) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                }
                Some(other) => out.push(other),
                None => {}
            }
        }
        out
    }
}

fn literal(span: ecma_lexer::token::TokenSpan, value: LiteralValue, raw: String) -> Node {
    Node::Literal(Literal { span, trivia: Trivia::default(), value, raw })
}

fn logical_operator(kind: TokenKind) -> LogicalOperator {
    match kind {
        TokenKind::And => LogicalOperator::And,
        TokenKind::Or => LogicalOperator::Or,
        other => unreachable!("{other:?} is not a logical operator token"),
    }
}

fn update_operator(kind: TokenKind) -> UpdateOperator {
    match kind {
        TokenKind::Inc => UpdateOperator::Increment,
        TokenKind::Dec => UpdateOperator::Decrement,
        other => unreachable!("{other:?} is not an update operator token"),
    }
}

fn parse_numeric_literal(raw: &str) -> f64 {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    if let Some(oct) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
        return u64::from_str_radix(oct, 8).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

fn split_regexp_literal(raw: &str) -> (String, String) {
    let rest = &raw[1..];
    match rest.rfind('/') {
        Some(end) => (rest[..end].to_string(), rest[end + 1..].to_string()),
        None => (rest.to_string(), String::new()),
    }
}
