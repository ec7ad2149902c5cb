//! End-to-end integration tests for the MSL compiler
//!
//! Compiles every sample in shaders/ and checks both artifacts decode.

mod common;

use std::fs;

use msl::ast::{ShaderKind, ValueType};
use msl::codegen::{
    compile_to_vec, disassemble, BindingKind, Instruction, Metadata, Opcode, Target,
};
use msl::CompileError;

use common::{discover_shaders, kind_of, load_shader};

#[test]
fn e2e_all_shaders_compile() {
    let shaders = discover_shaders();
    assert!(!shaders.is_empty(), "No .msl files found in shaders/");

    let mut failures = Vec::new();

    for path in &shaders {
        let source = fs::read_to_string(path).expect("Failed to read shader");
        let kind = kind_of(&source);

        match compile_to_vec(&source, kind, 4096, 1024) {
            Ok(artifact) => {
                let program = disassemble(&artifact.bytecode).expect("bytecode decodes");
                let metadata = Metadata::decode(&artifact.metadata).expect("metadata decodes");
                assert_eq!(metadata.kind, kind, "{}", path.display());
                assert_eq!(
                    program.target,
                    if kind.is_shader() { Target::Shader } else { Target::Vm }
                );
                assert_eq!(program.instructions.last(), Some(&Instruction::End));
                println!("✓ Compiled: {} ({} bytes)", path.display(), artifact.bytecode.len());
            }
            Err(err) => {
                eprintln!("✗ Failed to compile: {}", path.display());
                failures.push((path.clone(), format!("{} error: {}", err.stage(), err)));
            }
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} out of {} shaders failed to compile:\n{}",
            failures.len(),
            shaders.len(),
            failures
                .iter()
                .map(|(path, err)| format!("  - {}: {}", path.display(), err))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

#[test]
fn e2e_scopes_balance() {
    for path in discover_shaders() {
        let source = fs::read_to_string(&path).expect("Failed to read shader");
        let artifact = compile_to_vec(&source, kind_of(&source), 4096, 1024).unwrap();
        let program = disassemble(&artifact.bytecode).unwrap();

        let mut depth = 0i32;
        for instruction in &program.instructions {
            match instruction {
                Instruction::OpScope => depth += 1,
                Instruction::ClScope => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "{}: scope closed twice", path.display());
        }
        assert_eq!(depth, 0, "{}: unclosed scope", path.display());
    }
}

#[test]
fn e2e_vertex_metadata() {
    let source = load_shader("transform");
    let artifact = compile_to_vec(&source, ShaderKind::Vertex, 4096, 1024).unwrap();
    let metadata = Metadata::decode(&artifact.metadata).unwrap();

    let inputs: Vec<_> = metadata.inputs.iter().map(|v| (v.name.as_str(), v.index)).collect();
    assert_eq!(inputs, vec![("POSITION", 1), ("NORMAL", 2), ("TEXCOORD", 3)]);

    let outputs: Vec<_> = metadata.outputs.iter().map(|v| (v.name.as_str(), v.index)).collect();
    assert_eq!(outputs, vec![("SV_POSITION", 4), ("NORMAL", 5), ("TEXCOORD", 6)]);

    let buffer = &metadata.bindings[0];
    assert_eq!(buffer.kind, BindingKind::ConstantBuffer);
    assert_eq!(buffer.name, "Transforms");
    assert_eq!(buffer.index, 7);
    let members: Vec<_> = buffer.variables.iter().map(|v| (v.index, v.ty)).collect();
    assert_eq!(
        members,
        vec![(8, ValueType::Float4x4), (9, ValueType::Float4x4)]
    );
}

#[test]
fn e2e_pixel_samples_texture() {
    let source = load_shader("lit");
    let artifact = compile_to_vec(&source, ShaderKind::Pixel, 4096, 1024).unwrap();
    let metadata = Metadata::decode(&artifact.metadata).unwrap();
    let program = disassemble(&artifact.bytecode).unwrap();

    let texture = metadata
        .bindings
        .iter()
        .find(|b| b.kind == BindingKind::Texture2D)
        .expect("texture binding");
    assert_eq!(texture.name, "Albedo");

    // The texture is passed to the sampler by its own index
    assert!(program.instructions.iter().any(|i| matches!(
        i,
        Instruction::Call { args, .. } if args.first() == Some(&texture.index)
    )));
    assert!(program
        .instructions
        .iter()
        .any(|i| i.opcode() == Opcode::GetACmp));
}

#[test]
fn e2e_vm_script_throws() {
    let source = load_shader("difference");
    let artifact = compile_to_vec(&source, ShaderKind::Vm, 4096, 1024).unwrap();
    let program = disassemble(&artifact.bytecode).unwrap();

    assert!(artifact.bytecode.starts_with(b"MVMB\x02\x01"));
    assert!(program.instructions.iter().any(|i| matches!(
        i,
        Instruction::Throw { message, .. } if message == "difference computed"
    )));
}

#[test]
fn e2e_wrong_target_reports_missing_entry_point() {
    let source = load_shader("lit");
    let err = compile_to_vec(&source, ShaderKind::Vertex, 4096, 1024).unwrap_err();
    assert_eq!(err.stage(), "codegen");
    assert!(err.to_string().contains("VertexShader"), "{err}");
}

#[test]
fn e2e_metadata_serializes_to_json() {
    let source = load_shader("lit");
    let artifact = compile_to_vec(&source, ShaderKind::Pixel, 4096, 1024).unwrap();
    let metadata = Metadata::decode(&artifact.metadata).unwrap();

    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["kind"], "Pixel");
    assert_eq!(json["outputs"][0]["name"], "COLOR");
}

#[test]
fn e2e_errors_carry_spans() {
    let source = "Input { float4 pos : POSITION; } void main() { pos = missing; }";
    let err = compile_to_vec(source, ShaderKind::Vm, 4096, 1024).unwrap_err();
    assert!(matches!(err, CompileError::Annotate(_)));

    let span = err.span().expect("semantic errors have a span");
    assert_eq!(&source[span.start..span.end], "missing");
}
