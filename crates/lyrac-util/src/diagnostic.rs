//! Error and warning reporting infrastructure.
//!
//! Every pass reports problems as structured [`Diagnostic`] records through
//! a shared [`Handler`]; nothing in the compiler throws. The driver renders
//! accumulated diagnostics with [`render`] once a pass gate fails.

use std::cell::RefCell;
use std::fmt;

use crate::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Prevents compilation.
    Error,
    /// Does not prevent compilation.
    Warning,
    /// Additional context.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// The pipeline stage a diagnostic originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Symbols,
    Resolve,
    Types,
    Codegen,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "lex"),
            Stage::Parse => write!(f, "syntax"),
            Stage::Symbols => write!(f, "symbol"),
            Stage::Resolve => write!(f, "operator"),
            Stage::Types => write!(f, "type"),
            Stage::Codegen => write!(f, "codegen"),
            Stage::Internal => write!(f, "internal"),
        }
    }
}

/// A structured diagnostic record.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// Originating stage.
    pub stage: Stage,
    /// Main message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// Offset (in characters from the span start) of the precise offending
    /// character, when it differs from the span start.
    pub caret_offset: usize,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            stage,
            message: message.into(),
            span,
            caret_offset: 0,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Warning,
            stage,
            message: message.into(),
            span,
            caret_offset: 0,
        }
    }

    /// Point the caret at a specific character within the span.
    pub fn with_caret_offset(mut self, offset: usize) -> Self {
        self.caret_offset = offset;
        self
    }
}

/// Collects diagnostics across the pipeline.
///
/// Passes hold a shared `&Handler`; interior mutability keeps the reporting
/// API usable from traversals that also borrow the AST.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Report an error.
    pub fn error(&self, stage: Stage, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(stage, message, span));
    }

    /// Check whether any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Snapshot of all diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drop all recorded diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a diagnostic as header plus source excerpt.
///
/// The header is `STAGE LEVEL at PATH:LINE:COL: MESSAGE`. The excerpt
/// underlines the span: a single caret for point spans, a wavy underline
/// for wider ones with the caret relocated to `caret_offset` when set.
pub fn render(diag: &Diagnostic, path: &str, source: &str) -> String {
    let mut out = format!(
        "{} {} at {}:{}:{}: {}",
        diag.stage, diag.level, path, diag.span.line, diag.span.column, diag.message
    );
    if diag.span.is_dummy() {
        return out;
    }
    let Some(line_text) = source.lines().nth(diag.span.line as usize - 1) else {
        return out;
    };
    out.push('\n');
    out.push_str(line_text);
    out.push('\n');
    let start = diag.span.column.max(1) as usize - 1;
    let width = (diag.span.end_column.saturating_sub(diag.span.column)).max(1) as usize;
    out.extend(std::iter::repeat(' ').take(start));
    if width == 1 {
        out.push('^');
    } else {
        for i in 0..width {
            if diag.caret_offset > 0 && i == diag.caret_offset {
                out.push('^');
            } else {
                out.push('~');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_counts() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.error(Stage::Lex, "bad", Span::point(1, 1));
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        handler.emit(Diagnostic::warning(Stage::Parse, "meh", Span::DUMMY));
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.diagnostics().len(), 2);
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.error(Stage::Types, "x", Span::DUMMY);
        handler.clear();
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_render_point() {
        let diag = Diagnostic::error(Stage::Parse, "expected `;`", Span::point(1, 10));
        let out = render(&diag, "main.lyr", "let x = 1\nlet y = 2;");
        assert_eq!(
            out,
            "syntax error at main.lyr:1:10: expected `;`\nlet x = 1\n         ^"
        );
    }

    #[test]
    fn test_render_span_underline() {
        let diag = Diagnostic::error(Stage::Types, "mismatch", Span::new(8, 12, 1, 9, 13));
        let out = render(&diag, "t.lyr", "let x = 3.14;");
        assert!(out.ends_with("let x = 3.14;\n        ~~~~"));
    }

    #[test]
    fn test_render_caret_offset() {
        let diag = Diagnostic::error(Stage::Lex, "bad escape", Span::new(0, 8, 1, 1, 9))
            .with_caret_offset(3);
        let out = render(&diag, "t.lyr", "\"ab\\qcd\"");
        assert!(out.ends_with("~~~^~~~~"));
    }

    #[test]
    fn test_render_dummy_span_header_only() {
        let diag = Diagnostic::error(Stage::Internal, "invariant violated", Span::DUMMY);
        let out = render(&diag, "t.lyr", "whatever");
        assert_eq!(out, "internal error at t.lyr:0:0: invariant violated");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(format!("{}", Stage::Resolve), "operator");
        assert_eq!(format!("{}", Stage::Types), "type");
    }
}
