use crate::errors::Diagnostic;

/// Diagnostic sink - anything that can collect diagnostics raised while lexing, preprocessing,
/// or parsing a source file. Generic over the arena element type `T` a diagnostic's labels
/// point into (always the lexer's `Token` in this crate, but the sink itself doesn't need to
/// know that).
pub trait DiagnosticSink<T> {
    fn emit(&mut self, diagnostic: Diagnostic<T>);
}

/// A sink that discards everything, for call sites that genuinely don't care about diagnostics
/// (e.g. speculative lookahead that's allowed to fail silently).
impl<T> DiagnosticSink<T> for () {
    fn emit(&mut self, _: Diagnostic<T>) {}
}

impl<T> DiagnosticSink<T> for Vec<Diagnostic<T>> {
    fn emit(&mut self, diagnostic: Diagnostic<T>) {
        self.push(diagnostic);
    }
}
