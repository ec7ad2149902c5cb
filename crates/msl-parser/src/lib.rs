//! MSL Parser - Recursive descent parser
//!
//! Turns the token array into an arena [`Ast`] and records the struct-like
//! declarations (`Input`, `Output`, `ConstantBuffer`, `Texture1D/2D/3D`)
//! directly into a [`CompilerState`]; those never appear in the tree.
//!
//! Precedence, loosest to tightest: assignment, logical `&& ||`, relational,
//! additive, multiplicative, prefix unary, member/array access, primary.

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use msl_ast::{Ast, CompilerState, Limits};
use msl_lexer::Token;

/// Parse a token array (as produced by `msl_lexer::lex`)
pub fn parse(tokens: &[Token]) -> Result<(Ast, CompilerState), ParseError> {
    Parser::new(tokens).parse_program()
}

pub fn parse_with_limits(
    tokens: &[Token],
    limits: &Limits,
) -> Result<(Ast, CompilerState), ParseError> {
    Parser::with_limits(tokens, limits).parse_program()
}
