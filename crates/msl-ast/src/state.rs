//! Declared interface of a program: inputs, outputs, constant buffers and textures
//!
//! The parser fills these tables from the struct-like top-level declarations.
//! Variable indices are minted later by [`CompilerState::assign_indices`],
//! which the metadata generator calls before anything reads them.

use serde::{Deserialize, Serialize};

use crate::{Span, ValueType};

pub const MAX_INPUTS: usize = 16;
pub const MAX_OUTPUTS: usize = 16;
pub const MAX_CONSTANT_BUFFERS: usize = 14;
pub const MAX_BUFFER_VARIABLES: usize = 64;
pub const MAX_TEXTURES: usize = 16;

/// Index 0 never names a variable.
pub const FIRST_VARIABLE_INDEX: u16 = 1;

/// One declared global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Name used in source
    pub id: String,
    /// Binding name exposed to the render device (semantic, buffer or texture name)
    pub display_name: String,
    pub ty: ValueType,
    /// 0 for non-array variables
    pub array_size: u16,
    pub assigned_index: Option<u16>,
    pub span: Span,
}

impl Symbol {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            ty,
            array_size: 0,
            assigned_index: None,
            span: Span::default(),
        }
    }

    pub fn with_array_size(mut self, array_size: u16) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantBuffer {
    pub symbol: Symbol,
    pub variables: Vec<Symbol>,
}

impl ConstantBuffer {
    pub fn find_variable(&self, name: &str) -> Option<&Symbol> {
        self.variables.iter().find(|v| v.id == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDim {
    One,
    Two,
    Three,
}

impl TextureDim {
    pub const ALL: [TextureDim; 3] = [TextureDim::One, TextureDim::Two, TextureDim::Three];

    pub fn value_type(self) -> ValueType {
        match self {
            TextureDim::One => ValueType::Texture1D,
            TextureDim::Two => ValueType::Texture2D,
            TextureDim::Three => ValueType::Texture3D,
        }
    }
}

/// Why a declaration could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclareError {
    Capacity { table: &'static str, max: usize },
    Duplicate { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerState {
    pub inputs: Vec<Symbol>,
    pub outputs: Vec<Symbol>,
    pub constant_buffers: Vec<ConstantBuffer>,
    pub textures_1d: Vec<Symbol>,
    pub textures_2d: Vec<Symbol>,
    pub textures_3d: Vec<Symbol>,
    next_index: Option<u16>,
}

impl CompilerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_input(&mut self, symbol: Symbol) -> Result<(), DeclareError> {
        self.check_global(&symbol.id)?;
        push_bounded(&mut self.inputs, symbol, "Input", MAX_INPUTS)
    }

    pub fn declare_output(&mut self, symbol: Symbol) -> Result<(), DeclareError> {
        self.check_global(&symbol.id)?;
        push_bounded(&mut self.outputs, symbol, "Output", MAX_OUTPUTS)
    }

    pub fn declare_constant_buffer(&mut self, buffer: ConstantBuffer) -> Result<(), DeclareError> {
        self.check_global(&buffer.symbol.id)?;
        if buffer.variables.len() > MAX_BUFFER_VARIABLES {
            return Err(DeclareError::Capacity {
                table: "ConstantBuffer variables",
                max: MAX_BUFFER_VARIABLES,
            });
        }
        for (i, var) in buffer.variables.iter().enumerate() {
            if buffer.variables[..i].iter().any(|v| v.id == var.id) {
                return Err(DeclareError::Duplicate {
                    name: var.id.clone(),
                });
            }
        }
        push_bounded(
            &mut self.constant_buffers,
            buffer,
            "ConstantBuffer",
            MAX_CONSTANT_BUFFERS,
        )
    }

    pub fn declare_texture(&mut self, dim: TextureDim, symbol: Symbol) -> Result<(), DeclareError> {
        self.check_global(&symbol.id)?;
        let (table, name) = match dim {
            TextureDim::One => (&mut self.textures_1d, "Texture1D"),
            TextureDim::Two => (&mut self.textures_2d, "Texture2D"),
            TextureDim::Three => (&mut self.textures_3d, "Texture3D"),
        };
        push_bounded(table, symbol, name, MAX_TEXTURES)
    }

    fn check_global(&self, id: &str) -> Result<(), DeclareError> {
        let taken = self.inputs.iter().any(|s| s.id == id)
            || self.outputs.iter().any(|s| s.id == id)
            || self.constant_buffers.iter().any(|b| b.symbol.id == id)
            || TextureDim::ALL
                .into_iter()
                .any(|dim| self.textures(dim).iter().any(|s| s.id == id));
        if taken {
            Err(DeclareError::Duplicate { name: id.to_string() })
        } else {
            Ok(())
        }
    }

    pub fn textures(&self, dim: TextureDim) -> &[Symbol] {
        match dim {
            TextureDim::One => &self.textures_1d,
            TextureDim::Two => &self.textures_2d,
            TextureDim::Three => &self.textures_3d,
        }
    }

    pub fn find_input(&self, name: &str) -> Option<&Symbol> {
        self.inputs.iter().find(|s| s.id == name)
    }

    pub fn find_output(&self, name: &str) -> Option<&Symbol> {
        self.outputs.iter().find(|s| s.id == name)
    }

    pub fn find_constant_buffer(&self, name: &str) -> Option<&ConstantBuffer> {
        self.constant_buffers.iter().find(|b| b.symbol.id == name)
    }

    /// Texture lookup in 1D, 2D, 3D order
    pub fn find_texture(&self, name: &str) -> Option<&Symbol> {
        TextureDim::ALL
            .into_iter()
            .find_map(|dim| self.textures(dim).iter().find(|s| s.id == name))
    }

    /// Resolution order for a bare identifier: textures, then inputs, then outputs.
    pub fn find_global(&self, name: &str) -> Option<&Symbol> {
        self.find_texture(name)
            .or_else(|| self.find_input(name))
            .or_else(|| self.find_output(name))
    }

    /// Number every variable, buffer and texture in wire order.
    ///
    /// Inputs, outputs, each constant buffer followed by its members, then
    /// 1D/2D/3D textures. Returns the first index left free for temporaries.
    /// Calling it again renumbers identically.
    pub fn assign_indices(&mut self) -> u16 {
        let mut next = FIRST_VARIABLE_INDEX;
        let mut mint = |symbol: &mut Symbol| {
            symbol.assigned_index = Some(next);
            next += 1;
        };

        self.inputs.iter_mut().for_each(&mut mint);
        self.outputs.iter_mut().for_each(&mut mint);
        for buffer in &mut self.constant_buffers {
            mint(&mut buffer.symbol);
            buffer.variables.iter_mut().for_each(&mut mint);
        }
        self.textures_1d.iter_mut().for_each(&mut mint);
        self.textures_2d.iter_mut().for_each(&mut mint);
        self.textures_3d.iter_mut().for_each(&mut mint);

        self.next_index = Some(next);
        next
    }

    /// First index available to temporaries, once indices have been assigned.
    pub fn next_free_index(&self) -> Option<u16> {
        self.next_index
    }

    pub fn binding_count(&self) -> usize {
        self.constant_buffers.len()
            + self.textures_1d.len()
            + self.textures_2d.len()
            + self.textures_3d.len()
    }
}

fn push_bounded<T>(
    table: &mut Vec<T>,
    entry: T,
    name: &'static str,
    max: usize,
) -> Result<(), DeclareError> {
    if table.len() >= max {
        return Err(DeclareError::Capacity { table: name, max });
    }
    table.push(entry);
    Ok(())
}
