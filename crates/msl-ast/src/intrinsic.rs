//! Built-in functions callable from MSL source

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    Dot,
    Cross,
    Normalize,
    Length,
    Min,
    Max,
    Mul,
    Saturate,
    Sample,
}

impl Intrinsic {
    const ALL: [Intrinsic; 9] = [
        Intrinsic::Dot,
        Intrinsic::Cross,
        Intrinsic::Normalize,
        Intrinsic::Length,
        Intrinsic::Min,
        Intrinsic::Max,
        Intrinsic::Mul,
        Intrinsic::Saturate,
        Intrinsic::Sample,
    ];

    pub fn from_name(name: &str) -> Option<Intrinsic> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    pub fn from_code(code: u8) -> Option<Intrinsic> {
        Self::ALL.into_iter().find(|i| i.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Dot => "dot",
            Intrinsic::Cross => "cross",
            Intrinsic::Normalize => "normalize",
            Intrinsic::Length => "length",
            Intrinsic::Min => "min",
            Intrinsic::Max => "max",
            Intrinsic::Mul => "mul",
            Intrinsic::Saturate => "saturate",
            Intrinsic::Sample => "sample",
        }
    }

    /// Operand byte of the `CALL` instruction
    pub fn code(self) -> u8 {
        match self {
            Intrinsic::Dot => 0,
            Intrinsic::Cross => 1,
            Intrinsic::Normalize => 2,
            Intrinsic::Length => 3,
            Intrinsic::Min => 4,
            Intrinsic::Max => 5,
            Intrinsic::Mul => 6,
            Intrinsic::Saturate => 7,
            Intrinsic::Sample => 8,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Intrinsic::Normalize | Intrinsic::Length | Intrinsic::Saturate => 1,
            _ => 2,
        }
    }
}
