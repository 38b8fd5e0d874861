//! The Objective-J extensions (C9): class/interface/protocol declarations, method declarations
//! and their typed selectors, ivar declarations with `@accessors`, message sends, and the
//! `@selector`/`@protocol`/`@ref`/`@deref`/`@[...]`/`@{...}`/`@"..."` literal forms.
//!
//! Every `@`-prefixed construct is resolved by spelling, not by a dedicated token kind: the
//! lexer hands the parser a plain `At` token followed by an `Ident`, and it's up to whichever
//! grammar position is reading it to know which keyword set is valid there. A bare `@` never
//! appears with more than one legal continuation in any given position, so there's no need for
//! real lookahead — each of these productions consumes the `@` and then commits to interpreting
//! whatever follows.

use ecma_foundation::span::Spanned;
use ecma_lexer::token::{AnyToken, TokenKind, TokenSpan};

use crate::ast::{
    join_spans, AccessorAttribute, Accessors, ArrayLiteral, ClassDeclarationStatement,
    ClassStatement, Dereference, DictionaryLiteral, DictionaryLiteralEntry, GlobalStatement,
    Identifier, ImportStatement, InterfaceDeclarationStatement, IvarDeclaration, Literal,
    LiteralValue, MessageSendArgument, MessageSendExpression, MethodDeclarationStatement,
    MethodKind, Node, ObjectiveJPrimitive, ObjectiveJType, ObjectiveJTypeKind,
    ProtocolDeclarationStatement, ProtocolLiteralExpression, Reference,
    SelectorLiteralExpression, SelectorPart, Trivia,
};
use crate::parser::{ParseResult, Parser};

impl<'a> Parser<'a> {
    /// Entry point for a `@`-prefixed statement: `@implementation`, `@interface`, `@protocol`,
    /// `@import`, `@class`, or `@global`. Called with the `@` already consumed, since some
    /// callers (class-body member loops) need to inspect the keyword after `@` themselves
    /// first, to tell a nested declaration apart from `@end`.
    pub(crate) fn parse_objj_statement(&mut self) -> ParseResult<Vec<Node>> {
        let at = self.expect(TokenKind::At)?;
        self.dispatch_objj_statement(at)
    }

    fn dispatch_objj_statement(&mut self, at: AnyToken) -> ParseResult<Vec<Node>> {
        if !self.at(TokenKind::Ident) {
            return Err(self.unexpected("an Objective-J keyword"));
        }
        match self.current_text() {
            "implementation" => Ok(vec![self.parse_implementation(at)?]),
            "interface" => Ok(vec![self.parse_interface(at)?]),
            "protocol" => Ok(vec![self.parse_protocol(at)?]),
            "import" => Ok(vec![self.parse_import(at)?]),
            "class" => self.parse_class_statement(at),
            "global" => Ok(vec![self.parse_global_statement(at)?]),
            _ => Err(self.unexpected(
                "`@implementation`, `@interface`, `@protocol`, `@import`, `@class`, or `@global`",
            )),
        }
    }

    fn parse_implementation(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let id = self.parse_identifier()?;
        let (superclass, category) = self.parse_superclass_or_category()?;
        let protocols = self.parse_protocol_list()?;
        let ivars = self.parse_ivar_block()?;
        let (body, end) = self.parse_class_body()?;
        Ok(Node::ClassDeclarationStatement(ClassDeclarationStatement {
            span: join_spans(at.span(), end.span()),
            trivia: Trivia::default(),
            id,
            superclass,
            category,
            protocols,
            ivars,
            body,
        }))
    }

    fn parse_interface(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let id = self.parse_identifier()?;
        let (superclass, category) = self.parse_superclass_or_category()?;
        let protocols = self.parse_protocol_list()?;
        let ivars = self.parse_ivar_block()?;
        let (body, end) = self.parse_class_body()?;
        Ok(Node::InterfaceDeclarationStatement(InterfaceDeclarationStatement {
            span: join_spans(at.span(), end.span()),
            trivia: Trivia::default(),
            id,
            superclass,
            category,
            protocols,
            ivars,
            body,
        }))
    }

    fn parse_protocol(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let id = self.parse_identifier()?;
        let protocols = self.parse_protocol_list()?;
        let (body, end) = self.parse_class_body()?;
        Ok(Node::ProtocolDeclarationStatement(ProtocolDeclarationStatement {
            span: join_spans(at.span(), end.span()),
            trivia: Trivia::default(),
            id,
            protocols,
            body,
        }))
    }

    fn parse_superclass_or_category(&mut self) -> ParseResult<(Option<Identifier>, Option<Identifier>)> {
        if self.eat(TokenKind::Colon) {
            Ok((Some(self.parse_identifier()?), None))
        } else if self.eat(TokenKind::LeftParen) {
            let category = self.parse_identifier()?;
            self.expect(TokenKind::RightParen)?;
            Ok((None, Some(category)))
        } else {
            Ok((None, None))
        }
    }

    fn parse_protocol_list(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut protocols = Vec::new();
        if self.eat(TokenKind::Less) {
            loop {
                protocols.push(self.parse_identifier()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Greater)?;
        }
        Ok(protocols)
    }

    fn parse_ivar_block(&mut self) -> ParseResult<Vec<IvarDeclaration>> {
        let mut ivars = Vec::new();
        if self.eat(TokenKind::LeftBrace) {
            while !self.at(TokenKind::RightBrace) {
                ivars.push(self.parse_ivar_declaration()?);
            }
            self.expect(TokenKind::RightBrace)?;
        }
        Ok(ivars)
    }

    fn parse_ivar_declaration(&mut self) -> ParseResult<IvarDeclaration> {
        let start = self.current();
        let outlet = if self.at(TokenKind::At) {
            self.bump();
            self.expect_keyword("outlet")?;
            true
        } else {
            false
        };
        let objj_type = self.parse_objj_type()?;
        let id = self.parse_identifier()?;
        let mut end = id.span;
        let accessors = if self.at(TokenKind::At) {
            self.bump();
            self.expect_keyword("accessors")?;
            let (accessors, accessors_end) = self.parse_accessors()?;
            end = accessors_end;
            Some(accessors)
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(IvarDeclaration {
            span: join_spans(start.span(), end),
            trivia: Trivia::default(),
            objj_type,
            id,
            accessors,
            outlet,
        })
    }

    /// `@accessors` or `@accessors(attr, attr, getter=name, setter=name)`. The `(...)` form is
    /// optional; a bare `@accessors` means "generate the default property accessor".
    fn parse_accessors(&mut self) -> ParseResult<(Accessors, TokenSpan)> {
        let mut attributes = Vec::new();
        let mut getter = None;
        let mut setter = None;
        let mut end = self.current().span();
        if self.eat(TokenKind::LeftParen) {
            loop {
                if self.at_keyword("property") {
                    attributes.push(AccessorAttribute::Property);
                    end = self.bump().span();
                } else if self.at_keyword("readwrite") {
                    attributes.push(AccessorAttribute::ReadWrite);
                    end = self.bump().span();
                } else if self.at_keyword("readonly") {
                    attributes.push(AccessorAttribute::ReadOnly);
                    end = self.bump().span();
                } else if self.at_keyword("copy") {
                    attributes.push(AccessorAttribute::Copy);
                    end = self.bump().span();
                } else if self.at_keyword("getter") {
                    self.bump();
                    self.expect(TokenKind::Assign)?;
                    attributes.push(AccessorAttribute::Getter);
                    let id = self.parse_identifier()?;
                    end = id.span;
                    getter = Some(id);
                } else if self.at_keyword("setter") {
                    self.bump();
                    self.expect(TokenKind::Assign)?;
                    attributes.push(AccessorAttribute::Setter);
                    let id = self.parse_identifier()?;
                    end = id.span;
                    setter = Some(id);
                } else {
                    break;
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            let close = self.expect(TokenKind::RightParen)?;
            end = close.span();
        }
        Ok((Accessors { attributes, getter, setter }, end))
    }

    /// `void`, `id<Protocols>`, `[signed|unsigned] [char|byte|short|int [long [long]]]`, or a
    /// bare class name.
    pub(crate) fn parse_objj_type(&mut self) -> ParseResult<ObjectiveJType> {
        let start = self.current();
        if self.at_keyword("void") {
            let end = self.bump().span();
            return Ok(ObjectiveJType {
                span: join_spans(start.span(), end),
                kind: ObjectiveJTypeKind::Primitive { signed: None, primitive: ObjectiveJPrimitive::Void },
                action: false,
            });
        }
        if self.at(TokenKind::Ident) && self.current_text() == "id" {
            let mut end = self.bump().span();
            let protocols = self.parse_protocol_list()?;
            if let Some(last) = protocols.last() {
                end = last.span;
            }
            return Ok(ObjectiveJType {
                span: join_spans(start.span(), end),
                kind: ObjectiveJTypeKind::Id { protocols },
                action: false,
            });
        }
        if self.at(TokenKind::Ident)
            && (self.at_keyword("signed")
                || self.at_keyword("unsigned")
                || matches!(self.current_text(), "char" | "byte" | "short" | "int" | "long"))
        {
            return self.parse_objj_primitive_type(start);
        }
        let id = self.parse_identifier()?;
        Ok(ObjectiveJType { span: id.span, kind: ObjectiveJTypeKind::Class(id), action: false })
    }

    fn parse_objj_primitive_type(&mut self, start: AnyToken) -> ParseResult<ObjectiveJType> {
        let mut end = start.span();
        let signed = if self.at_keyword("signed") {
            end = self.bump().span();
            Some(true)
        } else if self.at_keyword("unsigned") {
            end = self.bump().span();
            Some(false)
        } else {
            None
        };
        let primitive = match self.current_text() {
            "char" => {
                end = self.bump().span();
                ObjectiveJPrimitive::Char
            }
            "byte" => {
                end = self.bump().span();
                ObjectiveJPrimitive::Byte
            }
            "short" => {
                end = self.bump().span();
                ObjectiveJPrimitive::Short
            }
            "int" => {
                end = self.bump().span();
                ObjectiveJPrimitive::Int
            }
            "long" => {
                end = self.bump().span();
                if self.current_text() == "long" {
                    end = self.bump().span();
                    ObjectiveJPrimitive::LongLong
                } else {
                    ObjectiveJPrimitive::Long
                }
            }
            // Bare `signed`/`unsigned` with no further word names plain `int`.
            _ => ObjectiveJPrimitive::Int,
        };
        Ok(ObjectiveJType {
            span: join_spans(start.span(), end),
            kind: ObjectiveJTypeKind::Primitive { signed, primitive },
            action: false,
        })
    }

    /// A method's parenthesized return type, e.g. `(int)` or `(@action void)`.
    fn parse_method_type(&mut self) -> ParseResult<ObjectiveJType> {
        self.expect(TokenKind::LeftParen)?;
        let action = if self.at(TokenKind::At) {
            self.bump();
            self.expect_keyword("action")?;
            true
        } else {
            false
        };
        let mut objj_type = self.parse_objj_type()?;
        objj_type.action = action;
        self.expect(TokenKind::RightParen)?;
        Ok(objj_type)
    }

    /// `+`/`-`, optional typed return, selector parts alternating a keyword and `:(type)param`
    /// (or a single bare keyword for a unary selector), optional trailing `, ...` variadic
    /// marker, and a body (or, inside `@protocol`, a bare `;`).
    fn parse_method_declaration(&mut self) -> ParseResult<Node> {
        let start = self.current();
        let kind = if self.eat(TokenKind::Add) {
            MethodKind::Class
        } else {
            self.expect(TokenKind::Sub)?;
            MethodKind::Instance
        };
        let return_type = if self.at(TokenKind::LeftParen) { Some(self.parse_method_type()?) } else { None };

        let mut selector = Vec::new();
        let name = self.parse_identifier()?;
        let mut last_span = name.span;
        if self.eat(TokenKind::Colon) {
            let param_type = if self.at(TokenKind::LeftParen) { Some(self.parse_method_type()?) } else { None };
            let param = self.parse_identifier()?;
            last_span = param.span;
            selector.push(SelectorPart { name: Some(name), param_type, param: Some(param) });
            while self.at(TokenKind::Ident) {
                let name = self.parse_identifier()?;
                self.expect(TokenKind::Colon)?;
                let param_type = if self.at(TokenKind::LeftParen) { Some(self.parse_method_type()?) } else { None };
                let param = self.parse_identifier()?;
                last_span = param.span;
                selector.push(SelectorPart { name: Some(name), param_type, param: Some(param) });
            }
        } else {
            selector.push(SelectorPart { name: Some(name), param_type: None, param: None });
        }

        let variadic = if self.eat(TokenKind::Comma) {
            self.expect(TokenKind::Ellipsis)?;
            true
        } else {
            false
        };

        let body = if self.at(TokenKind::LeftBrace) {
            let was_in_function = self.in_function;
            self.in_function = true;
            let (body, _strict) = self.parse_function_body()?;
            self.in_function = was_in_function;
            last_span = body.span();
            Some(body)
        } else {
            self.consume_semicolon()?;
            None
        };

        Ok(Node::MethodDeclarationStatement(MethodDeclarationStatement {
            span: join_spans(start.span(), last_span),
            trivia: Trivia::default(),
            kind,
            return_type,
            selector,
            variadic,
            body,
        }))
    }

    /// The shared body of `@implementation`/`@interface`/`@protocol`: a run of method
    /// declarations and nested statements, terminated by `@end`. `@optional`/`@required`
    /// protocol-section markers are recognized and otherwise ignored.
    fn parse_class_body(&mut self) -> ParseResult<(Vec<Node>, AnyToken)> {
        let mut body = Vec::new();
        loop {
            if self.at(TokenKind::At) {
                let at = self.bump();
                if self.at_keyword("end") {
                    let end = self.bump();
                    return Ok((body, end));
                }
                if self.at_keyword("optional") || self.at_keyword("required") {
                    self.bump();
                    continue;
                }
                body.extend(self.dispatch_objj_statement(at)?);
                continue;
            }
            if self.at(TokenKind::Add) || self.at(TokenKind::Sub) {
                body.push(self.parse_method_declaration()?);
                continue;
            }
            if self.at(TokenKind::EndOfFile) {
                return Err(self.unexpected("`@end`"));
            }
            body.extend(self.parse_statement()?);
        }
    }

    fn parse_import(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let (filename, framework, end) = if self.eat(TokenKind::Less) {
            let mut text = String::new();
            loop {
                if self.at(TokenKind::EndOfFile) {
                    return Err(self.unexpected("`>`"));
                }
                if self.eat(TokenKind::Greater) {
                    break;
                }
                text.push_str(self.current_text());
                self.bump();
            }
            let end = self.current().span();
            (text, true, end)
        } else if self.at(TokenKind::StringLit) {
            let token = self.bump();
            let raw = self.sources.source(&token);
            let filename = raw[1..raw.len().saturating_sub(1)].to_string();
            (filename, false, token.span())
        } else {
            return Err(self.unexpected("`<framework/file>` or a quoted filename"));
        };
        self.consume_semicolon()?;
        Ok(Node::ImportStatement(ImportStatement {
            span: join_spans(at.span(), end),
            trivia: Trivia::default(),
            filename,
            framework,
        }))
    }

    fn parse_class_statement(&mut self, at: AnyToken) -> ParseResult<Vec<Node>> {
        self.bump();
        let mut statements = Vec::new();
        loop {
            let id = self.parse_identifier()?;
            let span = join_spans(at.span(), id.span);
            statements.push(Node::ClassStatement(ClassStatement { span, trivia: Trivia::default(), id }));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume_semicolon()?;
        Ok(statements)
    }

    fn parse_global_statement(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let id = self.parse_identifier()?;
        self.consume_semicolon()?;
        Ok(Node::GlobalStatement(GlobalStatement {
            span: join_spans(at.span(), id.span),
            trivia: Trivia::default(),
            id,
        }))
    }

    /// Consumes a latched [`crate::parser::PendingMessageSend`]'s selector and arguments: a
    /// leading bare keyword (unary send) or a run of `keyword: arg` pairs, then an optional
    /// trailing `, expr, expr, ...` variadic tail, up to the closing `]`.
    pub(crate) fn parse_message_send_expression(
        &mut self,
        bracket_start: TokenSpan,
        receiver: Node,
    ) -> ParseResult<Node> {
        let super_object = matches!(&receiver, Node::Identifier(id) if id.name == "super");
        let object = if super_object { None } else { Some(Box::new(receiver)) };

        let first_name = self.parse_identifier()?;
        let (selector, arguments) = if self.eat(TokenKind::Colon) {
            let mut arguments = Vec::new();
            let first_arg = self.parse_assignment_expression()?;
            arguments.push(MessageSendArgument { selector: Some(first_name), argument: Box::new(first_arg) });
            while self.at(TokenKind::Ident) {
                let name = self.parse_identifier()?;
                self.expect(TokenKind::Colon)?;
                let arg = self.parse_assignment_expression()?;
                arguments.push(MessageSendArgument { selector: Some(name), argument: Box::new(arg) });
            }
            (None, arguments)
        } else {
            (Some(first_name), Vec::new())
        };

        let mut variadic_arguments = Vec::new();
        while self.eat(TokenKind::Comma) {
            variadic_arguments.push(self.parse_assignment_expression()?);
        }

        let close = self.expect(TokenKind::RightBracket)?;
        Ok(Node::MessageSendExpression(MessageSendExpression {
            span: join_spans(bracket_start, close.span()),
            trivia: Trivia::default(),
            object,
            super_object,
            selector,
            arguments,
            variadic_arguments,
        }))
    }

    /// `@selector(...)`, `@protocol(...)`, `@ref(...)`, `@deref(...)`, `@[...]`, `@{...}`, or
    /// `@"..."`, dispatched from [`crate::parser::expr`]'s primary-expression parsing.
    pub(crate) fn parse_objj_primary_expression(&mut self) -> ParseResult<Node> {
        let at = self.expect(TokenKind::At)?;
        match self.current().kind {
            TokenKind::LeftBracket => self.parse_objj_array_literal(at),
            TokenKind::LeftBrace => self.parse_objj_dictionary_literal(at),
            TokenKind::StringLit => {
                let token = self.bump();
                let raw = self.sources.source(&token).to_string();
                let value = raw[1..raw.len().saturating_sub(1)].to_string();
                Ok(Node::Literal(Literal {
                    span: join_spans(at.span(), token.span()),
                    trivia: Trivia::default(),
                    value: LiteralValue::String(value),
                    raw,
                }))
            }
            TokenKind::Ident => match self.current_text() {
                "selector" => self.parse_selector_literal(at),
                "protocol" => self.parse_protocol_literal(at),
                "ref" => self.parse_reference(at),
                "deref" => self.parse_dereference(at),
                _ => Err(self.unexpected("`@selector`, `@protocol`, `@ref`, or `@deref`")),
            },
            _ => Err(self.unexpected("an Objective-J literal")),
        }
    }

    fn parse_selector_literal(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        self.expect(TokenKind::LeftParen)?;
        let mut selector = String::new();
        while self.at(TokenKind::Ident) {
            let token = self.bump();
            selector.push_str(self.sources.source(&token));
            if self.eat(TokenKind::Colon) {
                selector.push(':');
            } else {
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen)?;
        Ok(Node::SelectorLiteralExpression(SelectorLiteralExpression {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            selector,
        }))
    }

    fn parse_protocol_literal(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        self.expect(TokenKind::LeftParen)?;
        let id = self.parse_identifier()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(Node::ProtocolLiteralExpression(ProtocolLiteralExpression {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            id,
        }))
    }

    fn parse_reference(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        self.expect(TokenKind::LeftParen)?;
        let argument = self.parse_identifier()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(Node::Reference(Reference {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            argument,
        }))
    }

    fn parse_dereference(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        self.expect(TokenKind::LeftParen)?;
        let argument = self.parse_assignment_expression()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(Node::Dereference(Dereference {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            argument: Box::new(argument),
        }))
    }

    fn parse_objj_array_literal(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) {
            elements.push(self.parse_assignment_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.at(TokenKind::RightBracket) && !self.options.allow_trailing_commas {
                return Err(self.unexpected("array element"));
            }
        }
        let close = self.expect(TokenKind::RightBracket)?;
        Ok(Node::ArrayLiteral(ArrayLiteral {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            elements,
        }))
    }

    fn parse_objj_dictionary_literal(&mut self, at: AnyToken) -> ParseResult<Node> {
        self.bump();
        let mut entries = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            let key = self.parse_assignment_expression()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_assignment_expression()?;
            entries.push(DictionaryLiteralEntry { key, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if self.at(TokenKind::RightBrace) && !self.options.allow_trailing_commas {
                return Err(self.unexpected("dictionary entry"));
            }
        }
        let close = self.expect(TokenKind::RightBrace)?;
        Ok(Node::DictionaryLiteral(DictionaryLiteral {
            span: join_spans(at.span(), close.span()),
            trivia: Trivia::default(),
            entries,
        }))
    }
}
