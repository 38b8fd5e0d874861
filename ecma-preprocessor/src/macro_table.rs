//! The macro table: storage for `#define`d macros, plus the fixed set of macros the
//! preprocessor predefines without the program ever `#define`ing them.

use std::collections::HashMap;

use ecma_lexer::token::TokenSpan;

#[derive(Debug, Clone)]
pub struct MacroParams {
    /// Names of the fixed (non-variadic) parameters, in declaration order.
    pub names: Vec<String>,
    /// Whether the parameter list ends in `...` or `name...`, binding the rest of the call's
    /// arguments to [`Self::variadic_arg_name`].
    pub variadic: bool,
    /// The GNU named-variadic spelling (`#define L(fmt, args...) ...`), if the macro used one
    /// instead of a bare `...`. `None` when `variadic` is `false`, or when it's `true` but the
    /// macro used the standard bare `...`/`__VA_ARGS__` spelling.
    pub variadic_name: Option<String>,
}

impl MacroParams {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|p| p == name)
    }

    /// The identifier that refers to the variadic arguments inside this macro's body: the
    /// explicit `name...` spelling if the macro used one, otherwise the standard `__VA_ARGS__`.
    /// `None` if the macro isn't variadic at all.
    pub fn variadic_arg_name(&self) -> Option<&str> {
        self.variadic.then(|| self.variadic_name.as_deref().unwrap_or("__VA_ARGS__"))
    }

    /// Number of arguments a call must supply at minimum: all fixed parameters, plus one more
    /// if variadic (so that the variadic argument is never omitted entirely, matching the
    /// reference preprocessor's strict arity check - the GNU comma-deletion extension is what
    /// lets the variadic part be empty, not this).
    pub fn min_args(&self) -> usize {
        self.names.len()
    }
}

/// A single `#define`d macro. Object-like macros have `params: None`; function-like macros
/// (including variadic ones) carry their parameter list in `params`.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Option<MacroParams>,
    /// Span of the macro body in the token arena, exactly as written at the `#define` site.
    pub body: TokenSpan,
}

impl Macro {
    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    /// Two macro definitions are "identical" per the standard's redefinition rule if they have
    /// the same parameter list and the same body spelling. Used to decide whether a
    /// redefinition is silently accepted (C allows identical redefinition) or should warn.
    pub fn same_definition_modulo_span(&self, other: &Macro, body_text: impl Fn(TokenSpan) -> String) -> bool {
        let params_match = match (&self.params, &other.params) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.names == b.names && a.variadic == b.variadic && a.variadic_name == b.variadic_name
            }
            _ => false,
        };
        params_match && body_text(self.body) == body_text(other.body)
    }
}

/// Preprocessor macros that are always defined, reflecting facts about the compilation
/// environment (file/line) or the dialect (`__OBJJ__`) rather than anything the program wrote.
///
/// `__DATE__` and `__TIME__` are deliberately not provided: their presence would make two
/// otherwise-identical preprocessing runs of the same input produce different output, which
/// breaks macro-expansion idempotence as a testable property of this preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predefined {
    ObjJ,
    Browser,
    File,
    Line,
}

impl Predefined {
    pub fn lookup(name: &str) -> Option<Predefined> {
        match name {
            "__OBJJ__" => Some(Predefined::ObjJ),
            "__BROWSER__" => Some(Predefined::Browser),
            "__FILE__" => Some(Predefined::File),
            "__LINE__" => Some(Predefined::Line),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    user: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a macro, returning the previous definition if one existed (the caller decides
    /// whether to warn about the redefinition).
    pub fn define(&mut self, macro_def: Macro) -> Option<Macro> {
        self.user.insert(macro_def.name.clone(), macro_def)
    }

    pub fn undefine(&mut self, name: &str) -> Option<Macro> {
        self.user.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.user.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.user.contains_key(name) || Predefined::lookup(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.user.values()
    }
}
