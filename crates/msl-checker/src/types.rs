//! Result-type rules for calls and constructors

use msl_ast::{Intrinsic, Span, ValueType};

use crate::AnnotateError;

fn mismatch(context: &str, expected: &str, found: ValueType, span: Span) -> AnnotateError {
    AnnotateError::TypeMismatch {
        context: context.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
        span,
    }
}

/// Result type of an intrinsic applied to `args`; arity is checked by the caller.
pub fn intrinsic_result(
    intrinsic: Intrinsic,
    args: &[ValueType],
    span: Span,
) -> Result<ValueType, AnnotateError> {
    let context = format!("call to `{}`", intrinsic.name());
    let first = args[0];

    let numeric = |ty: ValueType| -> Result<ValueType, AnnotateError> {
        if ty.is_numeric() {
            Ok(ty)
        } else {
            Err(mismatch(&context, "numeric operand", ty, span))
        }
    };

    match intrinsic {
        Intrinsic::Dot => {
            numeric(first)?;
            if args[1] != first {
                return Err(mismatch(&context, first.name(), args[1], span));
            }
            first
                .component_type()
                .filter(|_| first != ValueType::Float4x4)
                .ok_or_else(|| mismatch(&context, "vector", first, span))
        }
        Intrinsic::Cross => {
            for &ty in args {
                if ty != ValueType::Float3 {
                    return Err(mismatch(&context, "float3", ty, span));
                }
            }
            Ok(ValueType::Float3)
        }
        Intrinsic::Normalize | Intrinsic::Saturate => numeric(first),
        Intrinsic::Length => {
            if first.is_float() && first != ValueType::Float4x4 {
                Ok(ValueType::Float1)
            } else {
                Err(mismatch(&context, "float vector", first, span))
            }
        }
        Intrinsic::Min | Intrinsic::Max => {
            numeric(first)?;
            if args[1] != first {
                return Err(mismatch(&context, first.name(), args[1], span));
            }
            Ok(first)
        }
        Intrinsic::Mul => match (first, args[1]) {
            (ValueType::Float4x4, ValueType::Float4) | (ValueType::Float4, ValueType::Float4x4) => {
                Ok(ValueType::Float4)
            }
            (ValueType::Float4x4, ValueType::Float4x4) => Ok(ValueType::Float4x4),
            (ValueType::Float4x4, other) | (other, _) => {
                Err(mismatch(&context, "float4 or float4x4", other, span))
            }
        },
        Intrinsic::Sample => {
            let coords = match first {
                ValueType::Texture1D => ValueType::Float1,
                ValueType::Texture2D => ValueType::Float2,
                ValueType::Texture3D => ValueType::Float3,
                other => return Err(mismatch(&context, "texture", other, span)),
            };
            if args[1] != coords {
                return Err(mismatch(&context, coords.name(), args[1], span));
            }
            Ok(ValueType::Float4)
        }
    }
}

/// Checks a `T(args...)` constructor: either one scalar (splat) or exactly
/// enough components to fill `T`.
pub fn check_constructor(
    target: ValueType,
    args: &[ValueType],
    span: Span,
) -> Result<(), AnnotateError> {
    let context = format!("{} constructor", target);
    let wanted = target.component_count();
    if wanted == 0 {
        return Err(mismatch(&context, "constructible type", target, span));
    }

    for &ty in args {
        if !(ty.is_numeric() || ty == ValueType::Bool) {
            return Err(mismatch(&context, "numeric argument", ty, span));
        }
    }

    let supplied: usize = args.iter().map(|ty| ty.component_count()).sum();
    let splat = args.len() == 1 && args[0].is_scalar();
    if supplied == wanted || splat {
        Ok(())
    } else {
        Err(AnnotateError::TypeMismatch {
            context,
            expected: format!("{wanted} components"),
            found: format!("{supplied} components"),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_needs_matching_coordinates() {
        let span = Span::default();
        assert_eq!(
            intrinsic_result(
                Intrinsic::Sample,
                &[ValueType::Texture2D, ValueType::Float2],
                span
            ),
            Ok(ValueType::Float4)
        );
        assert!(intrinsic_result(
            Intrinsic::Sample,
            &[ValueType::Texture2D, ValueType::Float3],
            span
        )
        .is_err());
    }

    #[test]
    fn dot_yields_component_type() {
        let span = Span::default();
        assert_eq!(
            intrinsic_result(Intrinsic::Dot, &[ValueType::Float3, ValueType::Float3], span),
            Ok(ValueType::Float1)
        );
        assert_eq!(
            intrinsic_result(Intrinsic::Dot, &[ValueType::Int2, ValueType::Int2], span),
            Ok(ValueType::Int1)
        );
    }

    #[test]
    fn mul_matrix_vector() {
        let span = Span::default();
        assert_eq!(
            intrinsic_result(Intrinsic::Mul, &[ValueType::Float4x4, ValueType::Float4], span),
            Ok(ValueType::Float4)
        );
        assert!(intrinsic_result(Intrinsic::Mul, &[ValueType::Float2, ValueType::Float2], span)
            .is_err());
    }

    #[test]
    fn constructor_component_counts() {
        let span = Span::default();
        assert!(check_constructor(
            ValueType::Float4,
            &[ValueType::Float3, ValueType::Float1],
            span
        )
        .is_ok());
        assert!(check_constructor(ValueType::Float4, &[ValueType::Float1], span).is_ok());
        assert!(check_constructor(
            ValueType::Float4,
            &[ValueType::Float2, ValueType::Float1],
            span
        )
        .is_err());
        assert!(check_constructor(ValueType::Texture2D, &[ValueType::Float1], span).is_err());
    }
}
