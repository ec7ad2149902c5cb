//! The whole compile: lex, parse, metadata, annotate, bytecode

use msl_ast::{Limits, ShaderKind, Span};
use msl_checker::{annotate, AnnotateError};
use msl_lexer::{lex_with_limits, LexError};
use msl_parser::{parse_with_limits, ParseError};
use serde::Serialize;
use thiserror::Error;

use crate::{generate, generate_metadata, GenError};

/// Buffer sizes used by [`compile_to_vec`]
pub const DEFAULT_BYTECODE_CAPACITY: usize = 64 * 1024;
pub const DEFAULT_METADATA_CAPACITY: usize = 4 * 1024;

/// Bytes written to each output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompileInfo {
    pub bytecode_len: usize,
    pub metadata_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    #[error(transparent)]
    Gen(#[from] GenError),
}

impl CompileError {
    /// Source location of the failure, when it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex(e) => Some(e.span()),
            CompileError::Parse(e) => Some(e.span()),
            CompileError::Annotate(e) => Some(e.span()),
            CompileError::Gen(e) => e.span(),
        }
    }

    /// Short name of the failing stage
    pub fn stage(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "lex",
            CompileError::Parse(_) => "parse",
            CompileError::Annotate(_) => "semantic",
            CompileError::Gen(_) => "codegen",
        }
    }
}

/// Compile `source` for `kind` into caller-owned buffers.
///
/// Nothing is written to either buffer unless lexing and parsing succeed.
pub fn compile(
    source: &str,
    bytecode_buf: &mut [u8],
    metadata_buf: &mut [u8],
    kind: ShaderKind,
) -> Result<CompileInfo, CompileError> {
    compile_with_limits(source, bytecode_buf, metadata_buf, kind, &Limits::default())
}

pub fn compile_with_limits(
    source: &str,
    bytecode_buf: &mut [u8],
    metadata_buf: &mut [u8],
    kind: ShaderKind,
    limits: &Limits,
) -> Result<CompileInfo, CompileError> {
    let tokens = lex_with_limits(source, limits)?;
    let (mut ast, mut state) = parse_with_limits(&tokens, limits)?;

    // Metadata mints the indices annotation and bytecode refer to
    let metadata_len = generate_metadata(&mut state, kind, metadata_buf)?;
    annotate(&mut ast, &state)?;
    let bytecode_len = generate(&ast, &state, kind, bytecode_buf)?;

    Ok(CompileInfo {
        bytecode_len,
        metadata_len,
    })
}

/// Owned result of [`compile_to_vec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub bytecode: Vec<u8>,
    pub metadata: Vec<u8>,
}

/// Compile into freshly allocated buffers of the given capacities
pub fn compile_to_vec(
    source: &str,
    kind: ShaderKind,
    bytecode_capacity: usize,
    metadata_capacity: usize,
) -> Result<Artifact, CompileError> {
    let mut bytecode = vec![0u8; bytecode_capacity];
    let mut metadata = vec![0u8; metadata_capacity];
    let info = compile(source, &mut bytecode, &mut metadata, kind)?;
    bytecode.truncate(info.bytecode_len);
    metadata.truncate(info.metadata_len);
    Ok(Artifact { bytecode, metadata })
}
