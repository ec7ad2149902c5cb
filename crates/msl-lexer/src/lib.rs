//! MSL Lexer - Tokenization using logos
//!
//! Produces a flat token array ending in a single `Eof` token. Longest match
//! decides between keywords and identifiers, so `intangible` is an
//! identifier, not `int` followed by `angible`.

mod token;

pub use token::*;

use logos::Logos;
use msl_ast::{Limits, Span};
use thiserror::Error;

/// Longest attribute allowed for any token other than a string literal
pub const MAX_TOKEN_LENGTH: usize = 32;

const CONTEXT_LENGTH: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unknown token on line {line}: `{context}`")]
    UnknownToken {
        context: String,
        line: usize,
        span: Span,
    },

    #[error("too many tokens: the limit is {max}")]
    TokensOverflow { max: usize, span: Span },

    #[error("token `{text}` is longer than {max} bytes")]
    TokenTooLong {
        text: String,
        max: usize,
        span: Span,
    },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnknownToken { span, .. } => *span,
            LexError::TokensOverflow { span, .. } => *span,
            LexError::TokenTooLong { span, .. } => *span,
        }
    }

    fn unknown(source: &str, span: Span) -> Self {
        let rest = &source[span.start..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let context: String = rest[..line_end].chars().take(CONTEXT_LENGTH).collect();
        LexError::UnknownToken {
            context: context.trim_end().to_string(),
            line: span.line(source),
            span,
        }
    }
}

/// A token with its source text and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text; for string literals the text between the quotes, escapes untouched
    pub attribute: String,
    pub span: Span,
}

/// Tokenize a source string with the default limits
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    lex_with_limits(source, &Limits::default())
}

/// Tokenize a source string; `limits.max_tokens` counts the trailing `Eof`.
pub fn lex_with_limits(source: &str, limits: &Limits) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = result.map_err(|()| LexError::unknown(source, span))?;

        if tokens.len() + 1 >= limits.max_tokens {
            return Err(LexError::TokensOverflow {
                max: limits.max_tokens,
                span,
            });
        }

        let text = lexer.slice();
        let attribute = if kind == TokenKind::StringLit {
            text[1..text.len() - 1].to_string()
        } else if text.len() > MAX_TOKEN_LENGTH {
            return Err(LexError::TokenTooLong {
                text: text.to_string(),
                max: MAX_TOKEN_LENGTH,
                span,
            });
        } else {
            text.to_string()
        };

        tokens.push(Token {
            kind,
            attribute,
            span,
        });
    }

    if tokens.len() >= limits.max_tokens {
        return Err(LexError::TokensOverflow {
            max: limits.max_tokens,
            span: Span::new(source.len(), source.len()),
        });
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        attribute: String::new(),
        span: Span::new(end, end),
    });

    Ok(tokens)
}
