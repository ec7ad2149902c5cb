//! Instruction opcodes

use msl_ast::{NodeKind, ValueType};
use serde::Serialize;

/// Bytecode format version, written right after the marker
pub const VERSION: [u8; 2] = [0x02, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Opcode {
    End = 0x01,
    OpScope = 0x02,
    ClScope = 0x03,

    DeclB = 0x10,
    DeclI1 = 0x11,
    DeclI2 = 0x12,
    DeclI3 = 0x13,
    DeclI4 = 0x14,
    DeclF1 = 0x15,
    DeclF2 = 0x16,
    DeclF3 = 0x17,
    DeclF4 = 0x18,
    DeclF4x4 = 0x19,

    Ldb = 0x20,
    Ldi = 0x21,
    Ldf = 0x22,

    Assign = 0x30,
    GetFCmp = 0x31,
    GetICmp = 0x32,
    GetACmp = 0x33,

    Add = 0x40,
    Sub = 0x41,
    Mul = 0x42,
    Div = 0x43,
    Neg = 0x44,
    Not = 0x45,

    Eq = 0x50,
    Ne = 0x51,
    Lt = 0x52,
    Gt = 0x53,
    Le = 0x54,
    Ge = 0x55,
    And = 0x56,
    Or = 0x57,

    Construct = 0x60,
    Call = 0x61,

    Throw = 0x70,
}

impl Opcode {
    const ALL: [Opcode; 37] = [
        Opcode::End,
        Opcode::OpScope,
        Opcode::ClScope,
        Opcode::DeclB,
        Opcode::DeclI1,
        Opcode::DeclI2,
        Opcode::DeclI3,
        Opcode::DeclI4,
        Opcode::DeclF1,
        Opcode::DeclF2,
        Opcode::DeclF3,
        Opcode::DeclF4,
        Opcode::DeclF4x4,
        Opcode::Ldb,
        Opcode::Ldi,
        Opcode::Ldf,
        Opcode::Assign,
        Opcode::GetFCmp,
        Opcode::GetICmp,
        Opcode::GetACmp,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Neg,
        Opcode::Not,
        Opcode::Eq,
        Opcode::Ne,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::Le,
        Opcode::Ge,
        Opcode::And,
        Opcode::Or,
        Opcode::Construct,
        Opcode::Call,
        Opcode::Throw,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Opcode> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// `DECL*` instruction for a variable of type `ty`
    pub fn decl(ty: ValueType) -> Option<Opcode> {
        match ty {
            ValueType::Bool => Some(Opcode::DeclB),
            ValueType::Int1 => Some(Opcode::DeclI1),
            ValueType::Int2 => Some(Opcode::DeclI2),
            ValueType::Int3 => Some(Opcode::DeclI3),
            ValueType::Int4 => Some(Opcode::DeclI4),
            ValueType::Float1 => Some(Opcode::DeclF1),
            ValueType::Float2 => Some(Opcode::DeclF2),
            ValueType::Float3 => Some(Opcode::DeclF3),
            ValueType::Float4 => Some(Opcode::DeclF4),
            ValueType::Float4x4 => Some(Opcode::DeclF4x4),
            _ => None,
        }
    }

    /// Type declared by a `DECL*` opcode
    pub fn declared_type(self) -> Option<ValueType> {
        match self {
            Opcode::DeclB => Some(ValueType::Bool),
            Opcode::DeclI1 => Some(ValueType::Int1),
            Opcode::DeclI2 => Some(ValueType::Int2),
            Opcode::DeclI3 => Some(ValueType::Int3),
            Opcode::DeclI4 => Some(ValueType::Int4),
            Opcode::DeclF1 => Some(ValueType::Float1),
            Opcode::DeclF2 => Some(ValueType::Float2),
            Opcode::DeclF3 => Some(ValueType::Float3),
            Opcode::DeclF4 => Some(ValueType::Float4),
            Opcode::DeclF4x4 => Some(ValueType::Float4x4),
            _ => None,
        }
    }

    /// Three-operand instruction for a binary expression node
    pub fn binary(kind: NodeKind) -> Option<Opcode> {
        match kind {
            NodeKind::Add => Some(Opcode::Add),
            NodeKind::Sub => Some(Opcode::Sub),
            NodeKind::Mul => Some(Opcode::Mul),
            NodeKind::Div => Some(Opcode::Div),
            NodeKind::Eq => Some(Opcode::Eq),
            NodeKind::Ne => Some(Opcode::Ne),
            NodeKind::Lt => Some(Opcode::Lt),
            NodeKind::Gt => Some(Opcode::Gt),
            NodeKind::Le => Some(Opcode::Le),
            NodeKind::Ge => Some(Opcode::Ge),
            NodeKind::And => Some(Opcode::And),
            NodeKind::Or => Some(Opcode::Or),
            _ => None,
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self.code() >> 4, 0x4 | 0x5) && !matches!(self, Opcode::Neg | Opcode::Not)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::End => "END",
            Opcode::OpScope => "OPSCOPE",
            Opcode::ClScope => "CLSCOPE",
            Opcode::DeclB => "DECLB",
            Opcode::DeclI1 => "DECLI1",
            Opcode::DeclI2 => "DECLI2",
            Opcode::DeclI3 => "DECLI3",
            Opcode::DeclI4 => "DECLI4",
            Opcode::DeclF1 => "DECLF1",
            Opcode::DeclF2 => "DECLF2",
            Opcode::DeclF3 => "DECLF3",
            Opcode::DeclF4 => "DECLF4",
            Opcode::DeclF4x4 => "DECLF4X4",
            Opcode::Ldb => "LDB",
            Opcode::Ldi => "LDI",
            Opcode::Ldf => "LDF",
            Opcode::Assign => "ASSIGN",
            Opcode::GetFCmp => "GETFCMP",
            Opcode::GetICmp => "GETICMP",
            Opcode::GetACmp => "GETACMP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Neg => "NEG",
            Opcode::Not => "NOT",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Le => "LE",
            Opcode::Ge => "GE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Construct => "CONSTRUCT",
            Opcode::Call => "CALL",
            Opcode::Throw => "THROW",
        }
    }
}

/// Severity operand of `THROW`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn code(self) -> u8 {
        match self {
            Severity::Warning => 0,
            Severity::Error => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Severity> {
        match code {
            0 => Some(Severity::Warning),
            1 => Some(Severity::Error),
            _ => None,
        }
    }

    /// Severity keyword as written after `throw`
    pub fn from_keyword(keyword: &str) -> Option<Severity> {
        match keyword {
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_round_trip() {
        for code in 0x10..=0x19 {
            let op = Opcode::from_code(code).unwrap();
            let ty = op.declared_type().unwrap();
            assert_eq!(Opcode::decl(ty), Some(op));
        }
        assert_eq!(Opcode::decl(ValueType::Texture2D), None);
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(Opcode::from_code(0x00), None);
        assert_eq!(Opcode::from_code(0x34), None);
        assert_eq!(Opcode::from_code(0xff), None);
    }

    #[test]
    fn binary_classification() {
        assert!(Opcode::Add.is_binary());
        assert!(Opcode::Or.is_binary());
        assert!(!Opcode::Neg.is_binary());
        assert!(!Opcode::Assign.is_binary());
    }
}
