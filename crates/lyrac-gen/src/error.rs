//! Error types for code generation.
//!
//! Errors with a source span are user-facing and become stage=codegen
//! diagnostics; spanless variants are fatal (internal errors, LLVM or
//! linker failures) and abort compilation with a system exit code.

use lyrac_util::Span;
use thiserror::Error;

/// Error type for LLVM code generation and linking.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// A type annotation outside the known set.
    #[error("unknown type `{name}`")]
    UnknownType { name: String, span: Span },

    /// Read or write of a name with no stack slot.
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String, span: Span },

    /// Assignment whose left operand is not an identifier.
    #[error("assignment target is not a variable")]
    BadAssignTarget { span: Span },

    /// No native lowering and no table overload for the operand types.
    #[error("no lowering for operator `{symbol}` with operand types ({operands})")]
    UnknownOperator {
        symbol: String,
        operands: String,
        span: Span,
    },

    /// Call target missing from the module.
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String, span: Span },

    /// Call arity does not match the declaration.
    #[error("`{name}` expects {expected} argument(s), found {found}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A void-returning expression used where a value is required.
    #[error("void value used where a value is required")]
    VoidValue { span: Span },

    /// Deferred integer parse failed.
    #[error("integer literal `{text}` is out of range for i32")]
    BadIntLiteral { text: String, span: Span },

    /// Deferred float parse failed.
    #[error("invalid floating-point literal `{text}`")]
    BadFloatLiteral { text: String, span: Span },

    /// Two bodies ended up mapped to one module symbol.
    #[error("`{name}` already has a definition")]
    DuplicateDefinition { name: String, span: Span },

    /// LLVM function verification failed; indicates a generator bug.
    #[error("generated function `{name}` failed verification")]
    VerifyFailed { name: String },

    /// An LLVM operation failed.
    #[error("LLVM operation failed: {0}")]
    Llvm(String),

    /// The system linker could not be spawned.
    #[error("linker `{cmd}` not found: {message}")]
    LinkerNotFound { cmd: String, message: String },

    /// The system linker reported failure.
    #[error("linking failed: {0}")]
    LinkFailed(String),

    /// Invariant violation with no source location.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodeGenError {
    /// The source span for user-facing errors; `None` for fatal ones.
    pub fn span(&self) -> Option<Span> {
        match self {
            CodeGenError::UnknownType { span, .. }
            | CodeGenError::UndefinedVariable { span, .. }
            | CodeGenError::BadAssignTarget { span }
            | CodeGenError::UnknownOperator { span, .. }
            | CodeGenError::UnknownFunction { span, .. }
            | CodeGenError::ArgCountMismatch { span, .. }
            | CodeGenError::VoidValue { span }
            | CodeGenError::BadIntLiteral { span, .. }
            | CodeGenError::BadFloatLiteral { span, .. }
            | CodeGenError::DuplicateDefinition { span, .. } => Some(*span),
            CodeGenError::VerifyFailed { .. }
            | CodeGenError::Llvm(_)
            | CodeGenError::LinkerNotFound { .. }
            | CodeGenError::LinkFailed(_)
            | CodeGenError::Internal(_) => None,
        }
    }
}

impl From<inkwell::builder::BuilderError> for CodeGenError {
    fn from(err: inkwell::builder::BuilderError) -> Self {
        CodeGenError::Llvm(err.to_string())
    }
}

/// Result alias for code generation.
pub type Result<T> = std::result::Result<T, CodeGenError>;
