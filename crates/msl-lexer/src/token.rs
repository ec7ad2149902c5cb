//! Token definitions for MSL

use logos::Logos;
use msl_ast::{TextureDim, ValueType};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // === Declaration keywords ===
    #[token("Input")]
    #[token("input")]
    Input,
    #[token("Output")]
    #[token("output")]
    Output,
    #[token("ConstantBuffer")]
    ConstantBuffer,
    #[token("Texture1D")]
    Texture1D,
    #[token("Texture2D")]
    Texture2D,
    #[token("Texture3D")]
    Texture3D,

    // === Statement keywords ===
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("throw")]
    Throw,
    #[token("warning")]
    Warning,
    #[token("error")]
    Error,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Types ===
    #[token("void")]
    Void,
    #[token("bool")]
    Bool,
    #[token("int")]
    #[token("int1")]
    Int1,
    #[token("int2")]
    Int2,
    #[token("int3")]
    Int3,
    #[token("int4")]
    Int4,
    #[token("float")]
    #[token("float1")]
    Float1,
    #[token("float2")]
    Float2,
    #[token("float3")]
    Float3,
    #[token("float4")]
    Float4,
    #[token("float4x4")]
    Float4x4,
    #[token("string")]
    String,

    // === Operators ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,

    // === Punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"[0-9]+", priority = 2)]
    IntLit,
    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLit,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Appended after the last real token
    Eof,
}

/// Static description of a token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: &'static str,
    pub is_type: bool,
    pub is_operator: bool,
    pub is_punctuation: bool,
}

impl TokenInfo {
    const fn plain(name: &'static str) -> Self {
        Self {
            name,
            is_type: false,
            is_operator: false,
            is_punctuation: false,
        }
    }

    const fn ty(name: &'static str) -> Self {
        Self {
            is_type: true,
            ..Self::plain(name)
        }
    }

    const fn op(name: &'static str) -> Self {
        Self {
            is_operator: true,
            ..Self::plain(name)
        }
    }

    const fn punct(name: &'static str) -> Self {
        Self {
            is_punctuation: true,
            ..Self::plain(name)
        }
    }
}

impl TokenKind {
    pub fn info(&self) -> TokenInfo {
        match self {
            TokenKind::Input => TokenInfo::plain("'Input'"),
            TokenKind::Output => TokenInfo::plain("'Output'"),
            TokenKind::ConstantBuffer => TokenInfo::plain("'ConstantBuffer'"),
            TokenKind::Texture1D => TokenInfo::plain("'Texture1D'"),
            TokenKind::Texture2D => TokenInfo::plain("'Texture2D'"),
            TokenKind::Texture3D => TokenInfo::plain("'Texture3D'"),
            TokenKind::If => TokenInfo::plain("'if'"),
            TokenKind::Else => TokenInfo::plain("'else'"),
            TokenKind::While => TokenInfo::plain("'while'"),
            TokenKind::For => TokenInfo::plain("'for'"),
            TokenKind::Return => TokenInfo::plain("'return'"),
            TokenKind::Throw => TokenInfo::plain("'throw'"),
            TokenKind::Warning => TokenInfo::plain("'warning'"),
            TokenKind::Error => TokenInfo::plain("'error'"),
            TokenKind::True => TokenInfo::plain("'true'"),
            TokenKind::False => TokenInfo::plain("'false'"),
            TokenKind::Void => TokenInfo::ty("'void'"),
            TokenKind::Bool => TokenInfo::ty("'bool'"),
            TokenKind::Int1 => TokenInfo::ty("'int'"),
            TokenKind::Int2 => TokenInfo::ty("'int2'"),
            TokenKind::Int3 => TokenInfo::ty("'int3'"),
            TokenKind::Int4 => TokenInfo::ty("'int4'"),
            TokenKind::Float1 => TokenInfo::ty("'float'"),
            TokenKind::Float2 => TokenInfo::ty("'float2'"),
            TokenKind::Float3 => TokenInfo::ty("'float3'"),
            TokenKind::Float4 => TokenInfo::ty("'float4'"),
            TokenKind::Float4x4 => TokenInfo::ty("'float4x4'"),
            TokenKind::String => TokenInfo::ty("'string'"),
            TokenKind::EqEq => TokenInfo::op("'=='"),
            TokenKind::Ne => TokenInfo::op("'!='"),
            TokenKind::Ge => TokenInfo::op("'>='"),
            TokenKind::Le => TokenInfo::op("'<='"),
            TokenKind::AndAnd => TokenInfo::op("'&&'"),
            TokenKind::OrOr => TokenInfo::op("'||'"),
            TokenKind::Eq => TokenInfo::op("'='"),
            TokenKind::Lt => TokenInfo::op("'<'"),
            TokenKind::Gt => TokenInfo::op("'>'"),
            TokenKind::Plus => TokenInfo::op("'+'"),
            TokenKind::Minus => TokenInfo::op("'-'"),
            TokenKind::Star => TokenInfo::op("'*'"),
            TokenKind::Slash => TokenInfo::op("'/'"),
            TokenKind::Bang => TokenInfo::op("'!'"),
            TokenKind::LParen => TokenInfo::punct("'('"),
            TokenKind::RParen => TokenInfo::punct("')'"),
            TokenKind::LBrace => TokenInfo::punct("'{'"),
            TokenKind::RBrace => TokenInfo::punct("'}'"),
            TokenKind::LBracket => TokenInfo::punct("'['"),
            TokenKind::RBracket => TokenInfo::punct("']'"),
            TokenKind::Comma => TokenInfo::punct("','"),
            TokenKind::Semicolon => TokenInfo::punct("';'"),
            TokenKind::Colon => TokenInfo::punct("':'"),
            TokenKind::Dot => TokenInfo::punct("'.'"),
            TokenKind::IntLit => TokenInfo::plain("integer"),
            TokenKind::FloatLit => TokenInfo::plain("float"),
            TokenKind::StringLit => TokenInfo::plain("string"),
            TokenKind::Ident => TokenInfo::plain("identifier"),
            TokenKind::Eof => TokenInfo::plain("end of file"),
        }
    }

    pub fn describe(&self) -> &'static str {
        self.info().name
    }

    /// The value type named by a type keyword
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            TokenKind::Void => Some(ValueType::Void),
            TokenKind::Bool => Some(ValueType::Bool),
            TokenKind::Int1 => Some(ValueType::Int1),
            TokenKind::Int2 => Some(ValueType::Int2),
            TokenKind::Int3 => Some(ValueType::Int3),
            TokenKind::Int4 => Some(ValueType::Int4),
            TokenKind::Float1 => Some(ValueType::Float1),
            TokenKind::Float2 => Some(ValueType::Float2),
            TokenKind::Float3 => Some(ValueType::Float3),
            TokenKind::Float4 => Some(ValueType::Float4),
            TokenKind::Float4x4 => Some(ValueType::Float4x4),
            TokenKind::String => Some(ValueType::String),
            _ => None,
        }
    }

    pub fn texture_dim(&self) -> Option<TextureDim> {
        match self {
            TokenKind::Texture1D => Some(TextureDim::One),
            TokenKind::Texture2D => Some(TextureDim::Two),
            TokenKind::Texture3D => Some(TextureDim::Three),
            _ => None,
        }
    }
}
