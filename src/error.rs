use std::fmt;

use thiserror::Error;

use crate::ast::{SymbolKind, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// Lexer Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("{location}: Unexpected character '{character}'")]
    UnexpectedCharacter {
        character: char,
        location: SourceLocation,
    },
    #[error("{location}: Unterminated string literal")]
    UnterminatedString { location: SourceLocation },
    #[error("{location}: Unterminated comment")]
    UnterminatedComment { location: SourceLocation },
    #[error("{location}: Invalid number '{value}'")]
    InvalidNumber {
        value: String,
        location: SourceLocation,
    },
}

impl LexError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            LexError::UnexpectedCharacter { location, .. }
            | LexError::UnterminatedString { location }
            | LexError::UnterminatedComment { location }
            | LexError::InvalidNumber { location, .. } => location,
        }
    }
}

/// Classification of parser errors, independent of their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyDeclared,
    UndeclaredIdentifier,
    UseBeforeInit,
    TypeMismatch,
    OperatorTypeIncompatible,
    SyntaxError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// Parser Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: '{name}' is already declared on line {first_line}")]
    AlreadyDeclared {
        name: String,
        first_line: usize,
        line: usize,
    },
    #[error("line {line}: '{name}' is not declared")]
    UndeclaredIdentifier { name: String, line: usize },
    #[error("line {line}: '{name}' is used before it is initialized")]
    UseBeforeInit { name: String, line: usize },
    #[error("line {line}: types {left} and {right} are incompatible")]
    TypeMismatch {
        left: SymbolKind,
        right: SymbolKind,
        line: usize,
    },
    #[error("line {line}: '{name}' is a {kind}, not a variable")]
    NotAVariable {
        name: String,
        kind: SymbolKind,
        line: usize,
    },
    #[error("line {line}: operator '{operator}' cannot be applied to {operand}")]
    OperatorTypeIncompatible {
        operator: &'static str,
        operand: Type,
        line: usize,
    },
    #[error("line {line}: Expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::AlreadyDeclared { .. } => ErrorKind::AlreadyDeclared,
            ParseError::UndeclaredIdentifier { .. } => ErrorKind::UndeclaredIdentifier,
            ParseError::UseBeforeInit { .. } => ErrorKind::UseBeforeInit,
            ParseError::TypeMismatch { .. } | ParseError::NotAVariable { .. } => {
                ErrorKind::TypeMismatch
            }
            ParseError::OperatorTypeIncompatible { .. } => ErrorKind::OperatorTypeIncompatible,
            ParseError::UnexpectedToken { .. } | ParseError::UnexpectedEof { .. } => {
                ErrorKind::SyntaxError
            }
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::AlreadyDeclared { line, .. }
            | ParseError::UndeclaredIdentifier { line, .. }
            | ParseError::UseBeforeInit { line, .. }
            | ParseError::TypeMismatch { line, .. }
            | ParseError::NotAVariable { line, .. }
            | ParseError::OperatorTypeIncompatible { line, .. }
            | ParseError::UnexpectedToken { line, .. } => Some(*line),
            ParseError::UnexpectedEof { .. } => None,
        }
    }

    pub fn type_mismatch(left: impl Into<SymbolKind>, right: impl Into<SymbolKind>, line: usize) -> Self {
        ParseError::TypeMismatch {
            left: left.into(),
            right: right.into(),
            line,
        }
    }
}

// Compilation Errors
#[derive(Debug, Error)]
pub enum CompileError {
    /// Lexical errors or pre-existing diagnostics stopped parsing from starting.
    #[error("{} errors found", .messages.len())]
    Rejected { messages: Vec<String> },
    /// The first fatal error, along with diagnostics recorded before it.
    #[error("{error}")]
    Parse {
        error: ParseError,
        diagnostics: Vec<String>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CompileError {
    /// Every message to surface to the user, in reporting order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CompileError::Rejected { messages } => messages.clone(),
            CompileError::Parse { error, diagnostics } => {
                let mut messages = diagnostics.clone();
                messages.push(error.to_string());
                messages
            }
            other => vec![other.to_string()],
        }
    }
}

// Result types
pub type ParseResult<T> = Result<T, ParseError>;
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let eof = ParseError::UnexpectedEof {
            expected: "';'".to_string(),
        };
        assert_eq!(eof.kind(), ErrorKind::SyntaxError);
        assert_eq!(eof.line(), None);

        let mismatch = ParseError::type_mismatch(Type::Int, Type::Float, 3);
        assert_eq!(mismatch.kind(), ErrorKind::TypeMismatch);
        assert_eq!(mismatch.line(), Some(3));
    }

    #[test]
    fn test_messages_mention_types_and_line() {
        let err = ParseError::OperatorTypeIncompatible {
            operator: "+",
            operand: Type::Bool,
            line: 7,
        };
        assert_eq!(
            err.to_string(),
            "line 7: operator '+' cannot be applied to BOOL"
        );

        let err = ParseError::AlreadyDeclared {
            name: "x".to_string(),
            first_line: 1,
            line: 2,
        };
        assert_eq!(err.to_string(), "line 2: 'x' is already declared on line 1");
    }

    #[test]
    fn test_parse_failure_lists_diagnostics_first() {
        let err = CompileError::Parse {
            error: ParseError::UseBeforeInit {
                name: "y".to_string(),
                line: 4,
            },
            diagnostics: vec!["line 2: 'f' is not declared".to_string()],
        };
        let messages = err.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("before it is initialized"));
    }
}
