//! MSL Semantic Annotator
//!
//! Resolves identifiers against the declared interface, types every
//! expression, and checks lvalues, members, call arity and conditions.
//! Indices must already be assigned (see `CompilerState::assign_indices`).

mod annotator;
mod types;

pub use annotator::*;
pub use types::*;

use msl_ast::{Ast, CompilerState, Span};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    #[error("unresolved identifier `{name}`")]
    UnresolvedIdentifier { name: String, span: Span },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("cannot assign to {target}")]
    InvalidLvalue { target: String, span: Span },

    #[error("`{member}` is not a member of {owner}")]
    InvalidMember {
        owner: String,
        member: String,
        span: Span,
    },

    #[error("`{name}` has no assigned variable index")]
    UnnumberedSymbol { name: String, span: Span },

    #[error("`{callee}` takes {expected} argument(s), {found} supplied")]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },
}

impl AnnotateError {
    pub fn span(&self) -> Span {
        match self {
            AnnotateError::UnresolvedIdentifier { span, .. } => *span,
            AnnotateError::TypeMismatch { span, .. } => *span,
            AnnotateError::InvalidLvalue { span, .. } => *span,
            AnnotateError::InvalidMember { span, .. } => *span,
            AnnotateError::UnnumberedSymbol { span, .. } => *span,
            AnnotateError::ArgumentCount { span, .. } => *span,
        }
    }
}

/// Annotate every function in `ast` in place
pub fn annotate(ast: &mut Ast, state: &CompilerState) -> Result<(), AnnotateError> {
    Annotator::new(state).annotate(ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msl_ast::{ComponentBase, NodeId, NodeKind, Resolved, ValueType};

    const HEADER: &str = r#"
        Input { float4 pos : POSITION; float2 uv : TEXCOORD; }
        Output { float4 color : COLOR; }
        ConstantBuffer cb : PerFrame { float4x4 world; float4 tints[4]; int count; }
        Texture2D albedo : Albedo;
    "#;

    fn annotated(body: &str) -> Result<(Ast, CompilerState), AnnotateError> {
        let source = format!("{HEADER} void main() {{ {body} }}");
        let tokens = msl_lexer::lex(&source).expect("lex failed");
        let (mut ast, mut state) = msl_parser::parse(&tokens).expect("parse failed");
        state.assign_indices();
        annotate(&mut ast, &state)?;
        Ok((ast, state))
    }

    fn first_expr(ast: &Ast) -> NodeId {
        let body = ast.function_body(ast.find_function("main").unwrap()).unwrap();
        ast.children(ast.children(body)[0])[0]
    }

    #[test]
    fn test_identity_assignment_resolves_to_input() {
        let (ast, state) = annotated("pos = pos;").unwrap();
        let assign = first_expr(&ast);
        let index = state.inputs[0].assigned_index.unwrap();
        for &side in ast.children(assign) {
            assert_eq!(ast.kind(side), NodeKind::Reference);
            assert_eq!(
                ast.annotation(side).resolved,
                Resolved::Variable {
                    var: index,
                    array_size: 0
                }
            );
        }
        assert_eq!(ast.annotation(assign).return_type, ValueType::Float4);
    }

    #[test]
    fn test_io_keyword_members_become_references() {
        let (ast, state) = annotated("Output.color = Input.pos;").unwrap();
        let assign = first_expr(&ast);
        let (target, value) = (ast.children(assign)[0], ast.children(assign)[1]);
        assert_eq!(ast.kind(target), NodeKind::Reference);
        assert!(ast.annotation(target).is_lvalue);
        assert!(ast.children(target).is_empty());
        assert_eq!(
            ast.annotation(value).resolved,
            Resolved::Variable {
                var: state.inputs[0].assigned_index.unwrap(),
                array_size: 0
            }
        );
    }

    #[test]
    fn test_buffer_member_is_not_assignable() {
        let (ast, _) = annotated("Output.color = cb.tints[cb.count];").unwrap();
        let value = ast.children(first_expr(&ast))[1];
        assert_eq!(ast.kind(value), NodeKind::ArrayReference);
        assert_eq!(ast.annotation(value).return_type, ValueType::Float4);

        let err = annotated("cb.count = 1;").unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidLvalue { .. }), "{err:?}");
    }

    #[test]
    fn test_component_of_variable_and_temporary() {
        let (ast, state) = annotated("Output.color.x = (pos + pos).y;").unwrap();
        let assign = first_expr(&ast);
        let (target, value) = (ast.children(assign)[0], ast.children(assign)[1]);

        let color = state.outputs[0].assigned_index.unwrap();
        assert_eq!(
            ast.annotation(target).resolved,
            Resolved::Component {
                base: ComponentBase::Variable(color),
                component: 0
            }
        );
        assert!(ast.annotation(target).is_lvalue);
        assert_eq!(ast.annotation(target).return_type, ValueType::Float1);

        assert_eq!(
            ast.annotation(value).resolved,
            Resolved::Component {
                base: ComponentBase::Temporary,
                component: 1
            }
        );
        assert_eq!(ast.kind(ast.children(value)[0]), NodeKind::Add);
    }

    #[test]
    fn test_literals_are_constant() {
        let (ast, _) = annotated("Output.color = float4(1.0, 2.0, 3.0, 4.0);").unwrap();
        let value = ast.children(first_expr(&ast))[1];
        assert!(ast.annotation(value).is_constant);
        for &arg in ast.children(value) {
            assert_eq!(ast.annotation(arg).return_type, ValueType::Float1);
            assert!(ast.annotation(arg).is_constant);
        }
    }

    #[test]
    fn test_intrinsic_call() {
        let (ast, _) = annotated("Output.color = mul(cb.world, Input.pos);").unwrap();
        let call = ast.children(first_expr(&ast))[1];
        assert_eq!(ast.annotation(call).return_type, ValueType::Float4);
        assert!(matches!(ast.annotation(call).resolved, Resolved::Intrinsic(_)));

        let (ast, _) = annotated("Output.color = sample(albedo, uv);").unwrap();
        let call = ast.children(first_expr(&ast))[1];
        assert_eq!(ast.annotation(call).return_type, ValueType::Float4);
    }

    #[test]
    fn test_annotation_is_repeatable() {
        let (mut ast, state) = annotated("Output.color.x = (pos + pos).y;").unwrap();
        let before = format!("{:?}", ast);
        annotate(&mut ast, &state).unwrap();
        assert_eq!(format!("{:?}", ast), before);
    }

    #[test]
    fn test_unnumbered_symbol() {
        let source = format!("{HEADER} void main() {{ pos = pos; }}");
        let tokens = msl_lexer::lex(&source).unwrap();
        let (mut ast, state) = msl_parser::parse(&tokens).unwrap();
        let err = annotate(&mut ast, &state).unwrap_err();
        assert!(matches!(err, AnnotateError::UnnumberedSymbol { .. }), "{err:?}");
    }
}
