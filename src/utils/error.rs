//! Error handling for the MiniCS compiler core

use crate::utils::Span;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Every semantic diagnostic is one of these. The checker collects them and
/// keeps walking; the code generator returns `UnsupportedConstruct` and stops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Declarations ====================

    #[error("'{name}' is already declared in this scope")]
    Redeclaration { name: String, span: Span },

    #[error("duplicate case label {label}")]
    DuplicateCaseLabel { label: String, span: Span },

    // ==================== Name resolution ====================

    #[error("'{name}' is not declared")]
    UndeclaredSymbol { name: String, span: Span },

    #[error("unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("field '{field}' not found in type {ty}")]
    UnknownField { field: String, ty: String, span: Span },

    // ==================== Typing ====================

    #[error("{message}")]
    TypeMismatch { message: String, span: Span },

    #[error("'{name}' is a constant and cannot be modified")]
    ConstantAssignment { name: String, span: Span },

    #[error("'{name}' is not a method")]
    NotCallable { name: String, span: Span },

    #[error("'{name}' expects {expected} argument(s) but got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    // ==================== Control flow ====================

    #[error("{message}")]
    ControlFlowMisuse { message: String, span: Span },

    #[error("program has no 'void {name}()' entry method")]
    MissingEntryPoint { name: String, span: Span },

    // ==================== Internal ====================

    #[error("unsupported construct during code generation: {0}")]
    UnsupportedConstruct(String),
}

/// Diagnostic taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Redeclaration,
    UndeclaredSymbol,
    TypeMismatch,
    ArityMismatch,
    ControlFlowMisuse,
    MissingEntryPoint,
    UnsupportedConstruct,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Redeclaration => "redeclaration",
            Category::UndeclaredSymbol => "undeclared-symbol",
            Category::TypeMismatch => "type-mismatch",
            Category::ArityMismatch => "arity-mismatch",
            Category::ControlFlowMisuse => "control-flow",
            Category::MissingEntryPoint => "missing-entry-point",
            Category::UnsupportedConstruct => "unsupported-construct",
        };
        write!(f, "{}", s)
    }
}

impl Error {
    pub(crate) fn mismatch(message: impl Into<String>, span: Span) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Redeclaration { span, .. }
            | Self::DuplicateCaseLabel { span, .. }
            | Self::UndeclaredSymbol { span, .. }
            | Self::UnknownType { span, .. }
            | Self::UnknownField { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::ConstantAssignment { span, .. }
            | Self::NotCallable { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::ControlFlowMisuse { span, .. }
            | Self::MissingEntryPoint { span, .. } => Some(*span),
            Self::UnsupportedConstruct(_) => None,
        }
    }

    /// Where this error sits in the diagnostic taxonomy
    pub fn category(&self) -> Category {
        match self {
            Self::Redeclaration { .. } | Self::DuplicateCaseLabel { .. } => Category::Redeclaration,
            Self::UndeclaredSymbol { .. }
            | Self::UnknownType { .. }
            | Self::UnknownField { .. } => Category::UndeclaredSymbol,
            Self::TypeMismatch { .. }
            | Self::ConstantAssignment { .. }
            | Self::NotCallable { .. } => Category::TypeMismatch,
            Self::ArityMismatch { .. } => Category::ArityMismatch,
            Self::ControlFlowMisuse { .. } => Category::ControlFlowMisuse,
            Self::MissingEntryPoint { .. } => Category::MissingEntryPoint,
            Self::UnsupportedConstruct(_) => Category::UnsupportedConstruct,
        }
    }

    /// Short stable code used in reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::Redeclaration { .. } => "E0001",
            Self::DuplicateCaseLabel { .. } => "E0002",
            Self::UndeclaredSymbol { .. } => "E0003",
            Self::UnknownType { .. } => "E0004",
            Self::UnknownField { .. } => "E0005",
            Self::TypeMismatch { .. } => "E0006",
            Self::ConstantAssignment { .. } => "E0007",
            Self::NotCallable { .. } => "E0008",
            Self::ArityMismatch { .. } => "E0009",
            Self::ControlFlowMisuse { .. } => "E0010",
            Self::MissingEntryPoint { .. } => "E0011",
            Self::UnsupportedConstruct(_) => "E9000",
        }
    }
}
