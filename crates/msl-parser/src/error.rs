//! Parser error types

use msl_ast::{DeclareError, Span};
use msl_lexer::{Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("too many {table} declarations: the limit is {max}")]
    TooManyDeclarations {
        table: &'static str,
        max: usize,
        span: Span,
    },

    #[error("`{name}` is declared more than once")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("too many syntax nodes: the limit is {max}")]
    TooManyNodes { max: usize, span: Span },

    #[error("nesting is deeper than {max} levels")]
    TooDeep { max: usize, span: Span },

    #[error("function `{name}` is defined more than once")]
    DuplicateFunction { name: String, span: Span },

    #[error("invalid array size `{text}`")]
    InvalidArraySize { text: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::TooManyDeclarations { span, .. } => *span,
            ParseError::DuplicateDeclaration { span, .. } => *span,
            ParseError::TooManyNodes { span, .. } => *span,
            ParseError::TooDeep { span, .. } => *span,
            ParseError::DuplicateFunction { span, .. } => *span,
            ParseError::InvalidArraySize { span, .. } => *span,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        let expected = expected.into();
        match found.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected,
                span: found.span,
            },
            kind @ (TokenKind::Ident
            | TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StringLit) => ParseError::UnexpectedToken {
                expected,
                found: format!("{} `{}`", kind.describe(), found.attribute),
                span: found.span,
            },
            kind => ParseError::UnexpectedToken {
                expected,
                found: kind.describe().to_string(),
                span: found.span,
            },
        }
    }

    pub(crate) fn from_declare(err: DeclareError, span: Span) -> Self {
        match err {
            DeclareError::Capacity { table, max } => {
                ParseError::TooManyDeclarations { table, max, span }
            }
            DeclareError::Duplicate { name } => ParseError::DuplicateDeclaration { name, span },
        }
    }
}
