//! Declaration tables as seen by the later stages

use msl_ast::{Limits, NodeKind, TextureDim, ValueType};
use msl_lexer::lex;
use msl_parser::{parse, parse_with_limits, ParseError};

const SHADER: &str = r#"
    // interface
    input { float4 pos : POSITION; float2 uv : TEXCOORD; }
    output { float4 color : COLOR; }
    ConstantBuffer cb : PerFrame {
        float4x4 world : World;
        float4 lights[4];
    }
    Texture3D volume : Volume;
    Texture1D ramp : Ramp;

    /* entry */
    void PixelShader() {
        Output.color = sample(ramp, uv.x);
    }
    float4 helper(float4 a, int b) { return a; }
"#;

#[test]
fn test_lowercase_io_blocks_and_comments() {
    let tokens = lex(SHADER).unwrap();
    let (_, state) = parse(&tokens).unwrap();

    let inputs: Vec<_> = state
        .inputs
        .iter()
        .map(|s| (s.id.as_str(), s.display_name.as_str(), s.ty))
        .collect();
    assert_eq!(
        inputs,
        vec![
            ("pos", "POSITION", ValueType::Float4),
            ("uv", "TEXCOORD", ValueType::Float2),
        ]
    );
    assert_eq!(state.outputs[0].display_name, "COLOR");
}

#[test]
fn test_constant_buffer_member_names() {
    let tokens = lex(SHADER).unwrap();
    let (_, state) = parse(&tokens).unwrap();

    let buffer = state.find_constant_buffer("cb").expect("buffer declared");
    assert_eq!(buffer.symbol.display_name, "PerFrame");
    assert_eq!(buffer.symbol.ty, ValueType::Void);

    let world = buffer.find_variable("world").unwrap();
    assert_eq!(world.display_name, "World");
    assert_eq!(world.ty, ValueType::Float4x4);

    // Without an explicit binding name the member name is used
    let lights = buffer.find_variable("lights").unwrap();
    assert_eq!(lights.display_name, "lights");
    assert_eq!(lights.array_size, 4);
}

#[test]
fn test_textures_grouped_by_dimension() {
    let tokens = lex(SHADER).unwrap();
    let (_, state) = parse(&tokens).unwrap();

    assert_eq!(state.textures(TextureDim::One)[0].id, "ramp");
    assert!(state.textures(TextureDim::Two).is_empty());
    assert_eq!(state.textures(TextureDim::Three)[0].ty, ValueType::Texture3D);
    assert_eq!(state.binding_count(), 3);
}

#[test]
fn test_indices_follow_table_order() {
    let tokens = lex(SHADER).unwrap();
    let (_, mut state) = parse(&tokens).unwrap();
    let first_temp = state.assign_indices();

    let index = |name: &str| state.find_global(name).and_then(|s| s.assigned_index);
    assert_eq!(index("pos"), Some(1));
    assert_eq!(index("uv"), Some(2));
    assert_eq!(index("color"), Some(3));

    let buffer = state.find_constant_buffer("cb").unwrap();
    assert_eq!(buffer.symbol.assigned_index, Some(4));
    assert_eq!(buffer.variables[1].assigned_index, Some(6));

    // 1D textures come before 3D ones regardless of source order
    assert_eq!(index("ramp"), Some(7));
    assert_eq!(index("volume"), Some(8));
    assert_eq!(first_temp, 9);
    assert_eq!(state.next_free_index(), Some(9));
}

#[test]
fn test_functions_keep_parameters_and_return_type() {
    let tokens = lex(SHADER).unwrap();
    let (ast, _) = parse(&tokens).unwrap();

    let names: Vec<_> = ast
        .functions()
        .map(|f| ast.node(f).attribute.as_str())
        .collect();
    assert_eq!(names, vec!["PixelShader", "helper"]);

    let helper = ast.find_function("helper").unwrap();
    assert_eq!(ast.annotation(helper).return_type, ValueType::Float4);
    let params: Vec<_> = ast
        .children(helper)
        .iter()
        .filter(|&&c| ast.kind(c) == NodeKind::Parameter)
        .map(|&c| (ast.node(c).attribute.as_str(), ast.annotation(c).return_type))
        .collect();
    assert_eq!(params, vec![("a", ValueType::Float4), ("b", ValueType::Int1)]);
}

#[test]
fn test_void_member_rejected() {
    let tokens = lex("Input { void nothing : NONE; }").unwrap();
    let err = parse(&tokens).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }), "{err:?}");
}

#[test]
fn test_name_clash_across_tables() {
    let source = "Input { float4 pos : POSITION; } Texture2D pos : Albedo;";
    let tokens = lex(source).unwrap();
    let err = parse(&tokens).unwrap_err();
    assert_eq!(
        err,
        ParseError::DuplicateDeclaration {
            name: "pos".to_string(),
            span: err.span(),
        }
    );
    assert_eq!(&source[err.span().range()], "Texture2D pos : Albedo;");
}

#[test]
fn test_tight_node_limit() {
    let tokens = lex("void main() { }").unwrap();
    let limits = Limits {
        max_nodes: 1,
        ..Limits::default()
    };
    let err = parse_with_limits(&tokens, &limits).unwrap_err();
    assert!(matches!(err, ParseError::TooManyNodes { max: 1, .. }), "{err:?}");
}
