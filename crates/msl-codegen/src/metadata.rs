//! Metadata: the binary description of a program's external interface
//!
//! Layout: `MSLM`, shader kind, input/output/binding counts, then input
//! records, output records and binding records (constant buffers, then 1D,
//! 2D and 3D textures). Names occupy a fixed 16-byte NUL-padded field.

use msl_ast::{CompilerState, ShaderKind, Symbol, TextureDim, ValueType};
use serde::Serialize;

use crate::bytes::{ByteReader, ByteWriter, Section};
use crate::{DecodeError, GenError};

pub const METADATA_MARKER: [u8; 4] = *b"MSLM";

/// Longest name that fits the record's name field with its NUL
pub const MAX_NAME_LENGTH: usize = 15;

const NAME_FIELD: usize = MAX_NAME_LENGTH + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    ConstantBuffer,
    Texture1D,
    Texture2D,
    Texture3D,
}

impl BindingKind {
    pub fn code(self) -> u8 {
        match self {
            BindingKind::ConstantBuffer => 0,
            BindingKind::Texture1D => 1,
            BindingKind::Texture2D => 2,
            BindingKind::Texture3D => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<BindingKind> {
        match code {
            0 => Some(BindingKind::ConstantBuffer),
            1 => Some(BindingKind::Texture1D),
            2 => Some(BindingKind::Texture2D),
            3 => Some(BindingKind::Texture3D),
            _ => None,
        }
    }

    fn texture(dim: TextureDim) -> BindingKind {
        match dim {
            TextureDim::One => BindingKind::Texture1D,
            TextureDim::Two => BindingKind::Texture2D,
            TextureDim::Three => BindingKind::Texture3D,
        }
    }
}

/// Serialize `state` into `buf`, minting variable indices first.
///
/// Returns the number of bytes written.
pub fn generate_metadata(
    state: &mut CompilerState,
    kind: ShaderKind,
    buf: &mut [u8],
) -> Result<usize, GenError> {
    state.assign_indices();

    let mut out = ByteWriter::new(buf, Section::Metadata);
    out.bytes(&METADATA_MARKER)?;
    out.u8(kind.code())?;
    out.u8(count(state.inputs.len(), "inputs")?)?;
    out.u8(count(state.outputs.len(), "outputs")?)?;
    out.u8(count(state.binding_count(), "binding points")?)?;

    for symbol in state.inputs.iter().chain(&state.outputs) {
        write_symbol(&mut out, symbol)?;
    }

    for buffer in &state.constant_buffers {
        out.u8(BindingKind::ConstantBuffer.code())?;
        write_symbol(&mut out, &buffer.symbol)?;
        out.u8(count(buffer.variables.len(), "constant buffer variables")?)?;
        for var in &buffer.variables {
            out.u16(index_of(var)?)?;
            out.u16(var.array_size)?;
            out.u8(var.ty.code())?;
        }
    }

    for dim in TextureDim::ALL {
        for texture in state.textures(dim) {
            out.u8(BindingKind::texture(dim).code())?;
            write_symbol(&mut out, texture)?;
        }
    }

    Ok(out.position())
}

fn count(len: usize, what: &'static str) -> Result<u8, GenError> {
    u8::try_from(len).map_err(|_| GenError::TooManyVariables { what })
}

fn index_of(symbol: &Symbol) -> Result<u16, GenError> {
    symbol.assigned_index.ok_or(GenError::IndicesNotAssigned)
}

/// `[name:16][index:2][type:1]`
fn write_symbol(out: &mut ByteWriter<'_>, symbol: &Symbol) -> Result<(), GenError> {
    let name = symbol.display_name.as_bytes();
    if name.len() > MAX_NAME_LENGTH {
        return Err(GenError::NameTooLong {
            name: symbol.display_name.clone(),
            max: MAX_NAME_LENGTH,
        });
    }
    let mut field = [0u8; NAME_FIELD];
    field[..name.len()].copy_from_slice(name);
    out.bytes(&field)?;
    out.u16(index_of(symbol)?)?;
    out.u8(symbol.ty.code())
}

// === Decoding ===

/// Input or output variable record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRecord {
    pub name: String,
    pub index: u16,
    pub ty: ValueType,
}

/// Member of a constant buffer record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferVariable {
    pub index: u16,
    pub array_size: u16,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRecord {
    pub kind: BindingKind,
    pub name: String,
    pub index: u16,
    pub ty: ValueType,
    /// Empty for textures
    pub variables: Vec<BufferVariable>,
}

/// Decoded metadata, as a render device sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub kind: ShaderKind,
    pub inputs: Vec<VariableRecord>,
    pub outputs: Vec<VariableRecord>,
    pub bindings: Vec<BindingRecord>,
}

impl Metadata {
    pub fn decode(bytes: &[u8]) -> Result<Metadata, DecodeError> {
        let mut r = ByteReader::new(bytes);

        let marker = r.array::<4>()?;
        if marker != METADATA_MARKER {
            return Err(DecodeError::BadMarker { found: marker });
        }
        let kind_code = r.u8()?;
        let kind = ShaderKind::from_code(kind_code).ok_or(DecodeError::UnknownShaderKind {
            code: kind_code,
        })?;

        let input_count = r.u8()?;
        let output_count = r.u8()?;
        let binding_count = r.u8()?;

        let inputs = (0..input_count)
            .map(|_| read_variable(&mut r))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = (0..output_count)
            .map(|_| read_variable(&mut r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut bindings = Vec::with_capacity(usize::from(binding_count));
        for _ in 0..binding_count {
            let offset = r.position();
            let code = r.u8()?;
            let kind = BindingKind::from_code(code)
                .ok_or(DecodeError::UnknownBindingKind { code, offset })?;
            let record = read_variable(&mut r)?;

            let mut variables = Vec::new();
            if kind == BindingKind::ConstantBuffer {
                for _ in 0..r.u8()? {
                    let index = r.u16()?;
                    let array_size = r.u16()?;
                    let ty = read_type(&mut r)?;
                    variables.push(BufferVariable {
                        index,
                        array_size,
                        ty,
                    });
                }
            }

            bindings.push(BindingRecord {
                kind,
                name: record.name,
                index: record.index,
                ty: record.ty,
                variables,
            });
        }

        if !r.is_at_end() {
            return Err(DecodeError::TrailingBytes {
                offset: r.position(),
            });
        }

        Ok(Metadata {
            kind,
            inputs,
            outputs,
            bindings,
        })
    }

    /// `(name, index, type)` of every record in wire order
    pub fn triples(&self) -> Vec<(&str, u16, ValueType)> {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .map(|v| (v.name.as_str(), v.index, v.ty))
            .chain(self.bindings.iter().map(|b| (b.name.as_str(), b.index, b.ty)))
            .collect()
    }
}

fn read_type(r: &mut ByteReader<'_>) -> Result<ValueType, DecodeError> {
    let offset = r.position();
    let code = r.u8()?;
    ValueType::from_code(code).ok_or(DecodeError::UnknownType { code, offset })
}

fn read_variable(r: &mut ByteReader<'_>) -> Result<VariableRecord, DecodeError> {
    let offset = r.position();
    let field = r.take(NAME_FIELD)?;
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let name = std::str::from_utf8(&field[..end])
        .map_err(|_| DecodeError::InvalidName { offset })?
        .to_string();
    let index = r.u16()?;
    let ty = read_type(r)?;
    Ok(VariableRecord { name, index, ty })
}
