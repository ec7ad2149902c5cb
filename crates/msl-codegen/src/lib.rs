//! MSL Codegen - bytecode and metadata generation
//!
//! Turns an annotated tree plus its compiler state into the two binary
//! artifacts a render device (or the MVM) consumes, and decodes them again
//! for inspection. [`compile`] drives the whole pipeline.

mod bytecode;
mod bytes;
mod disasm;
mod metadata;
mod opcode;
mod pipeline;
mod temps;

pub use bytecode::*;
pub use bytes::{ByteReader, ByteWriter, Section};
pub use disasm::*;
pub use metadata::*;
pub use opcode::*;
pub use pipeline::*;
pub use temps::TempAllocator;

use msl_ast::{Span, ValueType};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("bytecode buffer overflow: {capacity} bytes is not enough")]
    BytecodeOverflow { capacity: usize },

    #[error("metadata buffer overflow: {capacity} bytes is not enough")]
    MetadataOverflow { capacity: usize },

    #[error("unsupported type `{ty}`")]
    UnsupportedType { ty: ValueType, span: Span },

    #[error("unsupported feature: {feature}")]
    UnsupportedFeature { feature: String, span: Span },

    #[error("entry point `{name}` is not defined")]
    MissingEntryPoint { name: &'static str },

    #[error("name `{name}` is longer than {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("too many {what}")]
    TooManyVariables { what: &'static str },

    #[error("invalid literal `{text}`")]
    InvalidLiteral { text: String, span: Span },

    #[error("variable indices have not been assigned")]
    IndicesNotAssigned,
}

impl GenError {
    pub fn span(&self) -> Option<Span> {
        match self {
            GenError::UnsupportedType { span, .. } => Some(*span),
            GenError::UnsupportedFeature { span, .. } => Some(*span),
            GenError::InvalidLiteral { span, .. } => Some(*span),
            _ => None,
        }
    }
}

/// Failure to read back a bytecode or metadata buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("unrecognized marker {found:?}")]
    BadMarker { found: [u8; 4] },

    #[error("unsupported bytecode version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("unknown shader kind {code}")]
    UnknownShaderKind { code: u8 },

    #[error("unknown type code {code:#04x} at offset {offset}")]
    UnknownType { code: u8, offset: usize },

    #[error("unknown binding kind {code} at offset {offset}")]
    UnknownBindingKind { code: u8, offset: usize },

    #[error("unknown opcode {code:#04x} at offset {offset}")]
    UnknownOpcode { code: u8, offset: usize },

    #[error("unknown intrinsic {code} at offset {offset}")]
    UnknownIntrinsic { code: u8, offset: usize },

    #[error("unknown throw severity {code} at offset {offset}")]
    UnknownSeverity { code: u8, offset: usize },

    #[error("text at offset {offset} is not valid UTF-8")]
    InvalidName { offset: usize },

    #[error("unexpected trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize },
}
