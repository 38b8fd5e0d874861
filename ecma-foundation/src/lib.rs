//! Foundational types shared by the lexer, preprocessor, and parser crates:
//! source files, spans, the token arena, and the diagnostic model.

pub mod arena;
pub mod errors;
pub mod source;
pub mod span;
