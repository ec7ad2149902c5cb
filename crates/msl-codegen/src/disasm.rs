//! Bytecode decoder and textual listing

use std::fmt;

use msl_ast::{Intrinsic, ValueType};
use serde::Serialize;

use crate::bytecode::{SHADER_MARKER, VM_MARKER};
use crate::bytes::ByteReader;
use crate::opcode::{Opcode, Severity, VERSION};
use crate::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instruction {
    End,
    OpScope,
    ClScope,
    Decl { ty: ValueType, var: u16 },
    LoadBool { dst: u16, value: bool },
    LoadInt { dst: u16, value: i32 },
    LoadFloat { dst: u16, value: f32 },
    Assign { dst: u16, src: u16 },
    /// `GETFCMP` / `GETICMP`
    GetComponent { op: Opcode, dst: u16, base: u16, component: u8 },
    GetElement { dst: u16, base: u16, index: u16 },
    Binary { op: Opcode, dst: u16, lhs: u16, rhs: u16 },
    /// `NEG` / `NOT`
    Unary { op: Opcode, dst: u16, src: u16 },
    Construct { ty: ValueType, dst: u16, args: Vec<u16> },
    Call { intrinsic: Intrinsic, dst: u16, args: Vec<u16> },
    Throw { severity: Severity, message: String },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::End => Opcode::End,
            Instruction::OpScope => Opcode::OpScope,
            Instruction::ClScope => Opcode::ClScope,
            Instruction::Decl { ty, .. } => Opcode::decl(*ty).unwrap_or(Opcode::DeclB),
            Instruction::LoadBool { .. } => Opcode::Ldb,
            Instruction::LoadInt { .. } => Opcode::Ldi,
            Instruction::LoadFloat { .. } => Opcode::Ldf,
            Instruction::Assign { .. } => Opcode::Assign,
            Instruction::GetComponent { op, .. } => *op,
            Instruction::GetElement { .. } => Opcode::GetACmp,
            Instruction::Binary { op, .. } => *op,
            Instruction::Unary { op, .. } => *op,
            Instruction::Construct { .. } => Opcode::Construct,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Throw { .. } => Opcode::Throw,
        }
    }
}

fn list(args: &[u16]) -> String {
    args.iter()
        .map(|a| format!("v{a}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().mnemonic();
        match self {
            Instruction::End | Instruction::OpScope | Instruction::ClScope => f.write_str(name),
            Instruction::Decl { var, .. } => write!(f, "{name} v{var}"),
            Instruction::LoadBool { dst, value } => write!(f, "{name} v{dst}, {value}"),
            Instruction::LoadInt { dst, value } => write!(f, "{name} v{dst}, {value}"),
            Instruction::LoadFloat { dst, value } => write!(f, "{name} v{dst}, {value:?}"),
            Instruction::Assign { dst, src } => write!(f, "{name} v{dst}, v{src}"),
            Instruction::GetComponent {
                dst,
                base,
                component,
                ..
            } => write!(f, "{name} v{dst}, v{base}, {component}"),
            Instruction::GetElement { dst, base, index } => {
                write!(f, "{name} v{dst}, v{base}, v{index}")
            }
            Instruction::Binary { dst, lhs, rhs, .. } => write!(f, "{name} v{dst}, v{lhs}, v{rhs}"),
            Instruction::Unary { dst, src, .. } => write!(f, "{name} v{dst}, v{src}"),
            Instruction::Construct { ty, dst, args } => {
                write!(f, "{name} {ty} v{dst}, [{}]", list(args))
            }
            Instruction::Call {
                intrinsic,
                dst,
                args,
            } => write!(f, "{name} {} v{dst}, [{}]", intrinsic.name(), list(args)),
            Instruction::Throw { severity, message } => {
                write!(f, "{name} {} {:?}", severity.name(), message)
            }
        }
    }
}

/// Which marker a bytecode stream starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    Shader,
    Vm,
}

/// A decoded bytecode stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub target: Target,
    pub instructions: Vec<Instruction>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.target {
            Target::Shader => SHADER_MARKER,
            Target::Vm => VM_MARKER,
        };
        writeln!(
            f,
            "; {} version {}.{}",
            String::from_utf8_lossy(&marker),
            VERSION[0],
            VERSION[1]
        )?;

        let mut depth = 0usize;
        for instruction in &self.instructions {
            if *instruction == Instruction::ClScope {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "{:indent$}{instruction}", "", indent = depth * 2)?;
            if *instruction == Instruction::OpScope {
                depth += 1;
            }
        }
        Ok(())
    }
}

/// Decode a complete bytecode stream, header included
pub fn disassemble(bytes: &[u8]) -> Result<Program, DecodeError> {
    let mut r = ByteReader::new(bytes);

    let marker = r.array::<4>()?;
    let target = match marker {
        SHADER_MARKER => Target::Shader,
        VM_MARKER => Target::Vm,
        found => return Err(DecodeError::BadMarker { found }),
    };
    let version = r.array::<2>()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion {
            major: version[0],
            minor: version[1],
        });
    }

    let mut instructions = Vec::new();
    while !r.is_at_end() {
        instructions.push(decode_instruction(&mut r)?);
    }

    Ok(Program {
        target,
        instructions,
    })
}

fn decode_instruction(r: &mut ByteReader<'_>) -> Result<Instruction, DecodeError> {
    let offset = r.position();
    let code = r.u8()?;
    let op = Opcode::from_code(code).ok_or(DecodeError::UnknownOpcode { code, offset })?;

    if let Some(ty) = op.declared_type() {
        return Ok(Instruction::Decl { ty, var: r.u16()? });
    }
    if op.is_binary() {
        return Ok(Instruction::Binary {
            op,
            dst: r.u16()?,
            lhs: r.u16()?,
            rhs: r.u16()?,
        });
    }

    let instruction = match op {
        Opcode::End => Instruction::End,
        Opcode::OpScope => Instruction::OpScope,
        Opcode::ClScope => Instruction::ClScope,
        Opcode::Ldb => Instruction::LoadBool {
            dst: r.u16()?,
            value: r.u8()? != 0,
        },
        Opcode::Ldi => Instruction::LoadInt {
            dst: r.u16()?,
            value: r.i32()?,
        },
        Opcode::Ldf => Instruction::LoadFloat {
            dst: r.u16()?,
            value: r.f32()?,
        },
        Opcode::Assign => Instruction::Assign {
            dst: r.u16()?,
            src: r.u16()?,
        },
        Opcode::GetFCmp | Opcode::GetICmp => Instruction::GetComponent {
            op,
            dst: r.u16()?,
            base: r.u16()?,
            component: r.u8()?,
        },
        Opcode::GetACmp => Instruction::GetElement {
            dst: r.u16()?,
            base: r.u16()?,
            index: r.u16()?,
        },
        Opcode::Neg | Opcode::Not => Instruction::Unary {
            op,
            dst: r.u16()?,
            src: r.u16()?,
        },
        Opcode::Construct => {
            let type_offset = r.position();
            let code = r.u8()?;
            let ty = ValueType::from_code(code).ok_or(DecodeError::UnknownType {
                code,
                offset: type_offset,
            })?;
            let dst = r.u16()?;
            Instruction::Construct {
                ty,
                dst,
                args: read_args(r)?,
            }
        }
        Opcode::Call => {
            let code = r.u8()?;
            let intrinsic =
                Intrinsic::from_code(code).ok_or(DecodeError::UnknownIntrinsic { code, offset })?;
            let dst = r.u16()?;
            Instruction::Call {
                intrinsic,
                dst,
                args: read_args(r)?,
            }
        }
        Opcode::Throw => {
            let code = r.u8()?;
            let severity =
                Severity::from_code(code).ok_or(DecodeError::UnknownSeverity { code, offset })?;
            let len = r.u16()?;
            let text_offset = r.position();
            let bytes = r.take(usize::from(len))?;
            let message = std::str::from_utf8(bytes)
                .map_err(|_| DecodeError::InvalidName {
                    offset: text_offset,
                })?
                .to_string();
            Instruction::Throw { severity, message }
        }
        // Declarations and binary operators returned above
        _ => return Err(DecodeError::UnknownOpcode { code, offset }),
    };
    Ok(instruction)
}

fn read_args(r: &mut ByteReader<'_>) -> Result<Vec<u16>, DecodeError> {
    let argc = r.u8()?;
    (0..argc).map(|_| r.u16()).collect()
}
