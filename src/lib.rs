//! MSL - A small shading language compiler
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use msl_ast as ast;
pub use msl_checker as checker;
pub use msl_codegen as codegen;
pub use msl_lexer as lexer;
pub use msl_parser as parser;

pub use msl_codegen::{compile, CompileError, CompileInfo};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexported_pipeline_compiles_empty_vm_program() {
        let mut bytecode = [0u8; 16];
        let mut metadata = [0u8; 16];
        let info = compile(
            "void main() { }",
            &mut bytecode,
            &mut metadata,
            ast::ShaderKind::Vm,
        )
        .unwrap();
        assert_eq!(&bytecode[..info.bytecode_len], b"MVMB\x02\x01\x01");
        assert_eq!(&metadata[..info.metadata_len], b"MSLM\x00\x00\x00\x00");
    }
}
