//! Static descriptors for token types, exposed to external consumers as `tokTypes` in the
//! distilled specification. Unlike a hand-rolled JS lexer, [`ecma_lexer`] does not give
//! keywords their own [`TokenKind`](ecma_lexer::token::TokenKind) variants — a keyword is an
//! `Ident` whose text happens to match one of the tables below — so this module splits the
//! descriptor set into punctuator descriptors (keyed by `TokenKind`) and keyword descriptors
//! (keyed by spelling), mirroring the attributes in the specification's `TokenType` record.

use ecma_lexer::token::TokenKind;

/// Attributes attached to a token type: precedence for binary operators, whether the token can
/// precede an expression (used for the `/` division-vs-regex disambiguation), and so on.
#[derive(Debug, Clone, Copy)]
pub struct TokenTypeInfo {
    pub label: &'static str,
    pub before_expr: bool,
    pub is_assign: bool,
    pub prefix: bool,
    pub postfix: bool,
    pub is_update: bool,
    /// Binary operator precedence, 1 (lowest, `||`) through 10 (highest, `*`/`/`/`%`).
    pub binop: Option<u8>,
    /// Whether this operator is accepted inside a `#if` constant expression.
    pub preprocess: bool,
}

const fn punct(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo {
        label,
        before_expr: false,
        is_assign: false,
        prefix: false,
        postfix: false,
        is_update: false,
        binop: None,
        preprocess: false,
    }
}

const fn binop(label: &'static str, precedence: u8, preprocess: bool) -> TokenTypeInfo {
    TokenTypeInfo {
        binop: Some(precedence),
        before_expr: true,
        preprocess,
        ..punct(label)
    }
}

const fn assign(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo {
        is_assign: true,
        before_expr: true,
        ..punct(label)
    }
}

/// Looks up the descriptor for a punctuator/literal [`TokenKind`]. Returns `None` for
/// `Ident`, which carries no fixed attributes of its own (see [`keyword_info`]).
pub fn token_type_info(kind: TokenKind) -> Option<TokenTypeInfo> {
    use TokenKind::*;
    Some(match kind {
        IntLit | FloatLit | StringLit | RegExpLit | NameLit => TokenTypeInfo {
            before_expr: false,
            ..punct(kind.pretty_name())
        },

        Add => binop("+", 9, true),
        Sub => binop("-", 9, true),
        Mul => binop("*", 10, true),
        Div => binop("/", 10, true),
        Rem => binop("%", 10, true),
        Pow => binop("**", 10, false),
        ShiftLeft => binop("<<", 8, true),
        ShiftRight => binop(">>", 8, true),
        TripleShiftRight => binop(">>>", 8, false),
        BitAnd => binop("&", 5, true),
        BitOr => binop("|", 3, true),
        BitXor => binop("^", 4, true),
        Equal => binop("==", 6, true),
        StrictEqual => binop("===", 6, false),
        NotEqual => binop("!=", 6, true),
        StrictNotEqual => binop("!==", 6, false),
        Less => binop("<", 7, true),
        Greater => binop(">", 7, true),
        LessEqual => binop("<=", 7, true),
        GreaterEqual => binop(">=", 7, true),
        And => binop("&&", 2, true),
        Or => binop("||", 1, true),

        Not => TokenTypeInfo {
            prefix: true,
            before_expr: true,
            preprocess: true,
            ..punct("!")
        },
        BitNot => TokenTypeInfo {
            prefix: true,
            before_expr: true,
            preprocess: true,
            ..punct("~")
        },
        Inc | Dec => TokenTypeInfo {
            prefix: true,
            postfix: true,
            is_update: true,
            before_expr: true,
            ..punct(kind.pretty_name())
        },

        Assign => assign("="),
        AddAssign => assign("+="),
        SubAssign => assign("-="),
        MulAssign => assign("*="),
        DivAssign => assign("/="),
        RemAssign => assign("%="),
        ShiftLeftAssign => assign("<<="),
        ShiftRightAssign => assign(">>="),
        TripleShiftRightAssign => assign(">>>="),
        BitAndAssign => assign("&="),
        BitOrAssign => assign("|="),
        BitXorAssign => assign("^="),

        Question | Colon | Dot | Ellipsis | LeftParen | LeftBracket | LeftBrace | Comma
        | Semi | Hash | Backslash | Dollar | At => TokenTypeInfo {
            before_expr: true,
            ..punct(kind.pretty_name())
        },
        RightParen | RightBracket | RightBrace => punct(kind.pretty_name()),

        Comment | Whitespace | Ident | Error | Generated | FailedExp | EndOfFile => return None,
    })
}

/// Attributes of a reserved word, looked up by spelling.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub label: &'static str,
    pub before_expr: bool,
    pub is_loop: bool,
    /// Reserved starting with which `ecmaVersion`; `None` means always reserved.
    pub reserved_since: Option<u8>,
    /// Reserved only once strict mode is in effect (`let`, `yield`, `static`, ...).
    pub strict_reserved: bool,
}

const fn keyword(label: &'static str) -> KeywordInfo {
    KeywordInfo {
        label,
        before_expr: false,
        is_loop: false,
        reserved_since: Some(3),
        strict_reserved: false,
    }
}

pub const ES3_ES5_KEYWORDS: &[(&str, KeywordInfo)] = &[
    ("break", keyword("break")),
    ("case", keyword("case")),
    ("catch", keyword("catch")),
    ("continue", keyword("continue")),
    ("debugger", keyword("debugger")),
    ("default", keyword("default")),
    (
        "delete",
        KeywordInfo {
            before_expr: true,
            ..keyword("delete")
        },
    ),
    (
        "do",
        KeywordInfo {
            is_loop: true,
            ..keyword("do")
        },
    ),
    (
        "else",
        KeywordInfo {
            before_expr: true,
            ..keyword("else")
        },
    ),
    ("finally", keyword("finally")),
    (
        "for",
        KeywordInfo {
            is_loop: true,
            ..keyword("for")
        },
    ),
    ("function", keyword("function")),
    ("if", keyword("if")),
    (
        "in",
        KeywordInfo {
            before_expr: true,
            ..keyword("in")
        },
    ),
    (
        "instanceof",
        KeywordInfo {
            before_expr: true,
            ..keyword("instanceof")
        },
    ),
    (
        "new",
        KeywordInfo {
            before_expr: true,
            ..keyword("new")
        },
    ),
    (
        "return",
        KeywordInfo {
            before_expr: true,
            ..keyword("return")
        },
    ),
    ("switch", keyword("switch")),
    (
        "this",
        KeywordInfo {
            before_expr: false,
            ..keyword("this")
        },
    ),
    (
        "throw",
        KeywordInfo {
            before_expr: true,
            ..keyword("throw")
        },
    ),
    ("try", keyword("try")),
    (
        "typeof",
        KeywordInfo {
            before_expr: true,
            ..keyword("typeof")
        },
    ),
    ("var", keyword("var")),
    (
        "void",
        KeywordInfo {
            before_expr: true,
            ..keyword("void")
        },
    ),
    (
        "while",
        KeywordInfo {
            is_loop: true,
            ..keyword("while")
        },
    ),
    ("with", keyword("with")),
    (
        "null",
        KeywordInfo {
            before_expr: false,
            ..keyword("null")
        },
    ),
    ("true", keyword("true")),
    ("false", keyword("false")),
    // ES5 future-reserved words that ES3 left unreserved.
    ("class", KeywordInfo { reserved_since: Some(5), ..keyword("class") }),
    ("const", KeywordInfo { reserved_since: Some(5), ..keyword("const") }),
    ("enum", KeywordInfo { reserved_since: Some(5), ..keyword("enum") }),
    ("export", KeywordInfo { reserved_since: Some(5), ..keyword("export") }),
    ("extends", KeywordInfo { reserved_since: Some(5), ..keyword("extends") }),
    ("import", KeywordInfo { reserved_since: Some(5), ..keyword("import") }),
    ("super", KeywordInfo { reserved_since: Some(5), ..keyword("super") }),
    // Strict-mode-only reserved words.
    ("implements", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("implements") }),
    ("interface", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("interface") }),
    ("let", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("let") }),
    ("package", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("package") }),
    ("private", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("private") }),
    ("protected", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("protected") }),
    ("public", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("public") }),
    ("static", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("static") }),
    ("yield", KeywordInfo { reserved_since: None, strict_reserved: true, ..keyword("yield") }),
];

pub fn lookup_keyword(name: &str) -> Option<KeywordInfo> {
    ES3_ES5_KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == name)
        .map(|(_, info)| *info)
}

pub const OBJJ_KEYWORDS: &[&str] = &[
    "implementation",
    "end",
    "import",
    "selector",
    "class",
    "global",
    "protocol",
    "optional",
    "required",
    "ref",
    "deref",
    "interface",
    "accessors",
    "outlet",
    "action",
];
