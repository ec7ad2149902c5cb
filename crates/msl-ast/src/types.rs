//! Value types and compile targets

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a variable, literal, or expression result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    #[default]
    Void,
    Bool,
    Int1,
    Int2,
    Int3,
    Int4,
    Float1,
    Float2,
    Float3,
    Float4,
    Float4x4,
    String,
    Texture1D,
    Texture2D,
    Texture3D,
}

impl ValueType {
    const ALL: [ValueType; 15] = [
        ValueType::Void,
        ValueType::Bool,
        ValueType::Int1,
        ValueType::Int2,
        ValueType::Int3,
        ValueType::Int4,
        ValueType::Float1,
        ValueType::Float2,
        ValueType::Float3,
        ValueType::Float4,
        ValueType::Float4x4,
        ValueType::String,
        ValueType::Texture1D,
        ValueType::Texture2D,
        ValueType::Texture3D,
    ];

    /// Wire code used in metadata records and `CONSTRUCT` operands
    pub fn code(self) -> u8 {
        match self {
            ValueType::Void => 0x00,
            ValueType::Bool => 0x01,
            ValueType::Int1 => 0x02,
            ValueType::Int2 => 0x03,
            ValueType::Int3 => 0x04,
            ValueType::Int4 => 0x05,
            ValueType::Float1 => 0x06,
            ValueType::Float2 => 0x07,
            ValueType::Float3 => 0x08,
            ValueType::Float4 => 0x09,
            ValueType::Float4x4 => 0x0A,
            ValueType::String => 0x0B,
            ValueType::Texture1D => 0x10,
            ValueType::Texture2D => 0x11,
            ValueType::Texture3D => 0x12,
        }
    }

    pub fn from_code(code: u8) -> Option<ValueType> {
        Self::ALL.into_iter().find(|ty| ty.code() == code)
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            ValueType::Float1
                | ValueType::Float2
                | ValueType::Float3
                | ValueType::Float4
                | ValueType::Float4x4
        )
    }

    pub fn is_int(self) -> bool {
        matches!(
            self,
            ValueType::Int1 | ValueType::Int2 | ValueType::Int3 | ValueType::Int4
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_float() || self.is_int()
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, ValueType::Bool | ValueType::Int1 | ValueType::Float1)
    }

    pub fn is_texture(self) -> bool {
        matches!(
            self,
            ValueType::Texture1D | ValueType::Texture2D | ValueType::Texture3D
        )
    }

    /// Number of scalar components the type occupies in a constructor.
    pub fn component_count(self) -> usize {
        match self {
            ValueType::Bool | ValueType::Int1 | ValueType::Float1 => 1,
            ValueType::Int2 | ValueType::Float2 => 2,
            ValueType::Int3 | ValueType::Float3 => 3,
            ValueType::Int4 | ValueType::Float4 => 4,
            ValueType::Float4x4 => 16,
            _ => 0,
        }
    }

    /// Number of addressable `.x/.y/.z/.w` components.
    pub fn width(self) -> usize {
        match self {
            ValueType::Float4x4 => 4,
            other if other.is_numeric() => other.component_count(),
            _ => 0,
        }
    }

    /// Type of a single component, `None` for non-vector types.
    pub fn component_type(self) -> Option<ValueType> {
        match self {
            ValueType::Int1 | ValueType::Int2 | ValueType::Int3 | ValueType::Int4 => {
                Some(ValueType::Int1)
            }
            ValueType::Float1 | ValueType::Float2 | ValueType::Float3 | ValueType::Float4 => {
                Some(ValueType::Float1)
            }
            ValueType::Float4x4 => Some(ValueType::Float4),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Bool => "bool",
            ValueType::Int1 => "int1",
            ValueType::Int2 => "int2",
            ValueType::Int3 => "int3",
            ValueType::Int4 => "int4",
            ValueType::Float1 => "float1",
            ValueType::Float2 => "float2",
            ValueType::Float3 => "float3",
            ValueType::Float4 => "float4",
            ValueType::Float4x4 => "float4x4",
            ValueType::String => "string",
            ValueType::Texture1D => "Texture1D",
            ValueType::Texture2D => "Texture2D",
            ValueType::Texture3D => "Texture3D",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which program a compile produces, and therefore which function is the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderKind {
    /// General-purpose stack-machine program (MVM)
    Vm,
    Vertex,
    Pixel,
}

impl ShaderKind {
    pub fn code(self) -> u8 {
        match self {
            ShaderKind::Vm => 0,
            ShaderKind::Vertex => 1,
            ShaderKind::Pixel => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<ShaderKind> {
        match code {
            0 => Some(ShaderKind::Vm),
            1 => Some(ShaderKind::Vertex),
            2 => Some(ShaderKind::Pixel),
            _ => None,
        }
    }

    /// Name of the function that gets generated for this target.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderKind::Vm => "main",
            ShaderKind::Vertex => "VertexShader",
            ShaderKind::Pixel => "PixelShader",
        }
    }

    pub fn is_shader(self) -> bool {
        !matches!(self, ShaderKind::Vm)
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vm => f.write_str("vm"),
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Pixel => f.write_str("pixel"),
        }
    }
}
