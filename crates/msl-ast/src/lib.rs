//! MSL AST - Core types shared by every compiler stage
//!
//! Spans, value types, the arena-backed syntax tree with its annotations, and
//! the compiler state holding the declared program interface.

mod intrinsic;
mod node;
mod span;
mod state;
mod types;

pub use intrinsic::*;
pub use node::*;
pub use span::*;
pub use state::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// Default token capacity of the lexer
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Default height limit of the syntax tree
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Scratch capacities for one compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_tokens: usize,
    pub max_nodes: usize,
    /// Deepest nesting of statements and expressions the later passes walk
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
