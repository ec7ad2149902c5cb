//! Integration tests for semantic error detection

use msl_checker::{annotate, AnnotateError};

const HEADER: &str = r#"
Input { float4 pos : POSITION; float2 uv : TEXCOORD; }
Output { float4 color : COLOR; }
ConstantBuffer cb : PerFrame { float4 tint; }
Texture2D albedo : Albedo;
Texture3D volume : Volume;
"#;

/// Helper: lex, parse, number, annotate
fn check_body(body: &str) -> Result<(), AnnotateError> {
    let source = format!("{HEADER}\nvoid main() {{ {body} }}");
    let tokens = msl_lexer::lex(&source).expect("lex failed");
    let (mut ast, mut state) = msl_parser::parse(&tokens).expect("parse failed");
    state.assign_indices();
    annotate(&mut ast, &state)
}

fn check_body_ok(body: &str) {
    let result = check_body(body);
    assert!(result.is_ok(), "Expected annotation to succeed, got {:?}", result.err());
}

// === Resolution ===

#[test]
fn test_unknown_identifier() {
    let err = check_body("Output.color = missing;").unwrap_err();
    assert!(
        matches!(&err, AnnotateError::UnresolvedIdentifier { name, .. } if name == "missing"),
        "{err:?}"
    );
}

#[test]
fn test_buffer_member_needs_buffer_prefix() {
    let err = check_body("Output.color = tint;").unwrap_err();
    assert!(matches!(err, AnnotateError::UnresolvedIdentifier { .. }), "{err:?}");
    check_body_ok("Output.color = cb.tint;");
}

#[test]
fn test_unknown_io_member() {
    let err = check_body("Output.color = Input.normal;").unwrap_err();
    assert!(
        matches!(&err, AnnotateError::InvalidMember { owner, member, .. }
            if owner == "Input" && member == "normal"),
        "{err:?}"
    );
}

#[test]
fn test_unknown_function() {
    let err = check_body("Output.color = shade(pos);").unwrap_err();
    assert!(matches!(err, AnnotateError::UnresolvedIdentifier { .. }), "{err:?}");
}

#[test]
fn test_lowercase_io_keywords() {
    check_body_ok("output.color = input.pos;");
}

// === Components ===

#[test]
fn test_component_out_of_range() {
    let err = check_body("Output.color.x = uv.z;").unwrap_err();
    assert!(
        matches!(&err, AnnotateError::InvalidMember { member, .. } if member == "z"),
        "{err:?}"
    );
    check_body_ok("Output.color.x = uv.y;");
}

#[test]
fn test_component_name_must_be_xyzw() {
    let err = check_body("Output.color.x = pos.r;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidMember { .. }), "{err:?}");
}

#[test]
fn test_texture_has_no_components() {
    let err = check_body("Output.color.x = albedo.x;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidMember { .. }), "{err:?}");
}

// === Lvalues ===

#[test]
fn test_assign_to_literal() {
    let err = check_body("1 = pos.x;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
}

#[test]
fn test_assign_to_call_result() {
    let err = check_body("normalize(pos) = pos;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
}

#[test]
fn test_assign_to_texture() {
    let err = check_body("albedo = albedo;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
}

#[test]
fn test_assign_to_temporary_component() {
    let err = check_body("(pos + pos).x = 1.0;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
}

#[test]
fn test_component_of_array_element_not_assignable() {
    let source = "Output { float4 c[2] : C; } void main() { BODY }";
    let check = |body: &str| {
        let source = source.replace("BODY", body);
        let tokens = msl_lexer::lex(&source).expect("lex failed");
        let (mut ast, mut state) = msl_parser::parse(&tokens).expect("parse failed");
        state.assign_indices();
        annotate(&mut ast, &state)
    };

    // The element is read into a temporary before its component is taken
    let err = check("Output.c[0].x = 1.0;").unwrap_err();
    assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
    assert!(check("Output.c[1] = float4(1.0, 0.0, 0.0, 1.0);").is_ok());
    assert!(check("Output.c[1] = Output.c[0].x;").is_ok());
}

// === Types ===

#[test]
fn test_logical_operators_need_bool() {
    let err = check_body("pos.x && true;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    let err = check_body("true || 1;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    let err = check_body("!pos.x;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("pos.x < 1.0 && !(pos.y > 2.0);");
}

#[test]
fn test_conditions_need_bool() {
    let err = check_body("if (pos.x) Output.color = pos;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    let err = check_body("while (1) ;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("for (;;) ;");
}

#[test]
fn test_assignment_type_mismatch() {
    let err = check_body("Output.color = uv;").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("Output.color = 0.0;");
}

#[test]
fn test_scalar_splat_needs_matching_component_kind() {
    let source = "Input { float4 pos : POSITION; } \
                  Output { int1 n : N; int3 counts : COUNTS; float4 color : COLOR; } \
                  void main() { BODY }";
    let check = |body: &str| {
        let source = source.replace("BODY", body);
        let tokens = msl_lexer::lex(&source).expect("lex failed");
        let (mut ast, mut state) = msl_parser::parse(&tokens).expect("parse failed");
        state.assign_indices();
        annotate(&mut ast, &state)
    };

    // No narrowing and no change of kind
    for body in ["n = 1.5;", "Output.color = 1;", "counts = 2.0;", "n = pos;"] {
        let err = check(body).unwrap_err();
        assert!(
            matches!(&err, AnnotateError::TypeMismatch { context, .. } if context == "assignment"),
            "{body}: {err:?}"
        );
    }

    for body in ["n = 1;", "counts = 2;", "Output.color = 0.5;", "Output.color.x = 1.0;"] {
        assert!(check(body).is_ok(), "{body}: {:?}", check(body).err());
    }
}

#[test]
fn test_constructor_component_count() {
    let err = check_body("Output.color = float4(uv, 1.0);").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("Output.color = float4(uv, 0.0, 1.0);");
    check_body_ok("Output.color = float4(1.0);");
}

#[test]
fn test_index_must_be_int() {
    let err = check_body("Output.color.x = pos[1.0];").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("Output.color.x = pos[2];");
}

// === Calls ===

#[test]
fn test_intrinsic_arity() {
    let err = check_body("Output.color.x = dot(pos);").unwrap_err();
    assert!(
        matches!(err, AnnotateError::ArgumentCount { expected: 2, found: 1, .. }),
        "{err:?}"
    );
}

#[test]
fn test_sample_dimension_must_match() {
    let err = check_body("Output.color = sample(volume, uv);").unwrap_err();
    assert!(matches!(err, AnnotateError::TypeMismatch { .. }), "{err:?}");
    check_body_ok("Output.color = sample(albedo, uv);");
}

#[test]
fn test_user_function_call() {
    let source = format!(
        "{HEADER}\nfloat4 shade(float4 c) {{ return c; }}\nvoid main() {{ Output.color = shade(pos); }}"
    );
    let tokens = msl_lexer::lex(&source).unwrap();
    let (mut ast, mut state) = msl_parser::parse(&tokens).unwrap();
    state.assign_indices();
    assert!(annotate(&mut ast, &state).is_ok());

    let bad = format!(
        "{HEADER}\nfloat4 shade(float4 c) {{ return c; }}\nvoid main() {{ Output.color = shade(pos, pos); }}"
    );
    let tokens = msl_lexer::lex(&bad).unwrap();
    let (mut ast, mut state) = msl_parser::parse(&tokens).unwrap();
    state.assign_indices();
    assert!(matches!(
        annotate(&mut ast, &state),
        Err(AnnotateError::ArgumentCount { .. })
    ));
}
