//! Diagnostics reported by the lexer, parser and type checker.

use std::fmt;

use crate::span::{LineMap, Span};

/// A single message attached to a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Render as `file:line:col: error[CODE]: message`.
    pub fn render(&self, lines: &LineMap, file_name: &str) -> String {
        let (line, column) = lines.line_col(self.span.start);
        match self.code {
            Some(code) => format!("{file_name}:{line}:{column}: error[{code}]: {}", self.message),
            None => format!("{file_name}:{line}:{column}: error: {}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_line_and_code() {
        let source = "var x: Int = 1\nreturn y";
        let diag = Diagnostic::error("could not resolve: y", Span::new(22, 23)).with_code("E0200");
        let rendered = diag.render(&LineMap::new(source), "main.si");
        assert_eq!(rendered, "main.si:2:8: error[E0200]: could not resolve: y");
    }
}
