//! Semantic annotation pass
//!
//! Walks every function post-order, fills in each expression's
//! [`Annotation`], and rewrites identifier-like nodes into `Reference`,
//! `ComponentReference` and `ArrayReference` nodes that point at assigned
//! variable indices.

use msl_ast::*;

use crate::types::{check_constructor, intrinsic_result};
use crate::AnnotateError;

/// What a `left.right` access turned out to name.
enum ResolvedPath {
    /// A whole global variable (`Input.x`, `Output.x`, `cb.member`)
    Global { symbol: Symbol, lvalue: bool },
    /// A vector component of the left operand
    Component {
        base: ComponentBase,
        component: u8,
        ty: ValueType,
        lvalue: bool,
    },
}

pub struct Annotator<'s> {
    state: &'s CompilerState,
}

impl<'s> Annotator<'s> {
    pub fn new(state: &'s CompilerState) -> Self {
        Self { state }
    }

    pub fn annotate(&self, ast: &mut Ast) -> Result<(), AnnotateError> {
        let functions: Vec<NodeId> = ast.functions().collect();
        for function in functions {
            self.annotate_children(ast, function)?;
        }
        Ok(())
    }

    fn annotate_children(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        let children = ast.children(id).to_vec();
        for child in children {
            self.annotate_node(ast, child)?;
        }
        Ok(())
    }

    fn annotate_node(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        match ast.kind(id) {
            NodeKind::Root
            | NodeKind::Function
            | NodeKind::Block
            | NodeKind::ExprStatement
            | NodeKind::Return
            | NodeKind::Throw => self.annotate_children(ast, id),

            // Carry their annotation from the parser or a previous pass
            NodeKind::Parameter
            | NodeKind::Empty
            | NodeKind::Reference
            | NodeKind::ComponentReference
            | NodeKind::ArrayReference => Ok(()),

            NodeKind::If | NodeKind::While => {
                self.annotate_children(ast, id)?;
                let condition = ast.children(id)[0];
                expect_type(ast, condition, ValueType::Bool, ast.kind(id).describe())
            }
            NodeKind::For => {
                self.annotate_children(ast, id)?;
                let condition = ast.children(id)[1];
                if ast.kind(condition) == NodeKind::Empty {
                    Ok(())
                } else {
                    expect_type(ast, condition, ValueType::Bool, "for")
                }
            }

            NodeKind::IntLiteral => {
                set(ast, id, ValueType::Int1, true, false, Resolved::None);
                Ok(())
            }
            NodeKind::FloatLiteral => {
                set(ast, id, ValueType::Float1, true, false, Resolved::None);
                Ok(())
            }
            NodeKind::BoolLiteral => {
                set(ast, id, ValueType::Bool, true, false, Resolved::None);
                Ok(())
            }
            NodeKind::StringLiteral => {
                set(ast, id, ValueType::String, true, false, Resolved::None);
                Ok(())
            }

            NodeKind::InputKeyword | NodeKind::OutputKeyword => {
                Err(AnnotateError::UnresolvedIdentifier {
                    name: ast.node(id).attribute.clone(),
                    span: ast.node(id).span,
                })
            }
            NodeKind::Ident => self.resolve_identifier(ast, id),

            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => {
                self.annotate_children(ast, id)?;
                let (left, right) = operands(ast, id);
                let context = ast.kind(id).describe();
                expect_numeric(ast, left, context)?;
                expect_numeric(ast, right, context)?;
                let ty = ast.annotation(left).return_type;
                set(ast, id, ty, false, false, Resolved::None);
                Ok(())
            }
            NodeKind::Eq
            | NodeKind::Ne
            | NodeKind::Lt
            | NodeKind::Gt
            | NodeKind::Le
            | NodeKind::Ge => {
                self.annotate_children(ast, id)?;
                set(ast, id, ValueType::Bool, false, false, Resolved::None);
                Ok(())
            }
            NodeKind::And | NodeKind::Or => {
                self.annotate_children(ast, id)?;
                let (left, right) = operands(ast, id);
                let context = ast.kind(id).describe();
                expect_type(ast, left, ValueType::Bool, context)?;
                expect_type(ast, right, ValueType::Bool, context)?;
                set(ast, id, ValueType::Bool, false, false, Resolved::None);
                Ok(())
            }
            NodeKind::Not => {
                self.annotate_children(ast, id)?;
                let operand = ast.children(id)[0];
                expect_type(ast, operand, ValueType::Bool, "'!'")?;
                set(ast, id, ValueType::Bool, false, false, Resolved::None);
                Ok(())
            }
            NodeKind::Neg | NodeKind::Plus => {
                self.annotate_children(ast, id)?;
                let operand = ast.children(id)[0];
                expect_numeric(ast, operand, ast.kind(id).describe())?;
                let ty = ast.annotation(operand).return_type;
                set(ast, id, ty, false, false, Resolved::None);
                Ok(())
            }

            NodeKind::Assign => {
                self.annotate_children(ast, id)?;
                let (target, value) = operands(ast, id);
                if !ast.annotation(target).is_lvalue {
                    return Err(AnnotateError::InvalidLvalue {
                        target: ast.kind(target).describe().to_string(),
                        span: ast.node(target).span,
                    });
                }
                let ty = ast.annotation(target).return_type;
                let found = ast.annotation(value).return_type;
                if found != ty && !is_splat(found, ty) {
                    return Err(AnnotateError::TypeMismatch {
                        context: "assignment".to_string(),
                        expected: ty.to_string(),
                        found: found.to_string(),
                        span: ast.node(value).span,
                    });
                }
                set(ast, id, ty, false, false, Resolved::None);
                Ok(())
            }

            NodeKind::Member => self.resolve_member(ast, id),
            NodeKind::Index => self.resolve_index(ast, id),
            NodeKind::Call => self.resolve_call(ast, id),

            NodeKind::Construct => {
                self.annotate_children(ast, id)?;
                let ty = ast.annotation(id).return_type;
                let args = arg_types(ast, id);
                check_constructor(ty, &args, ast.node(id).span)?;
                let constant = ast
                    .children(id)
                    .iter()
                    .all(|&arg| ast.annotation(arg).is_constant);
                set(ast, id, ty, constant, false, Resolved::None);
                Ok(())
            }
        }
    }

    /// A bare identifier: parameters of the enclosing function, then
    /// textures, inputs, outputs.
    fn resolve_identifier(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        if let Some(param) = find_parameter(ast, id) {
            let ty = ast.annotation(param).return_type;
            set(ast, id, ty, false, false, Resolved::None);
            return Ok(());
        }

        let node = ast.node(id);
        let symbol = self
            .state
            .find_global(&node.attribute)
            .ok_or_else(|| AnnotateError::UnresolvedIdentifier {
                name: node.attribute.clone(),
                span: node.span,
            })?
            .clone();
        let lvalue = !symbol.ty.is_texture();
        make_reference(ast, id, &symbol, lvalue)
    }

    fn resolve_member(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        let (left, right) = operands(ast, id);
        let member = ast.node(right).attribute.clone();
        let member_span = ast.node(right).span;

        let invalid = |owner: String| AnnotateError::InvalidMember {
            owner,
            member: member.clone(),
            span: member_span,
        };

        let path = match ast.kind(left) {
            NodeKind::InputKeyword => {
                let symbol = self
                    .state
                    .find_input(&member)
                    .ok_or_else(|| invalid("Input".to_string()))?;
                ResolvedPath::Global {
                    symbol: symbol.clone(),
                    lvalue: true,
                }
            }
            NodeKind::OutputKeyword => {
                let symbol = self
                    .state
                    .find_output(&member)
                    .ok_or_else(|| invalid("Output".to_string()))?;
                ResolvedPath::Global {
                    symbol: symbol.clone(),
                    lvalue: true,
                }
            }
            NodeKind::Ident
                if self
                    .state
                    .find_constant_buffer(&ast.node(left).attribute)
                    .is_some() =>
            {
                let name = &ast.node(left).attribute;
                let symbol = self
                    .state
                    .find_constant_buffer(name)
                    .and_then(|buffer| buffer.find_variable(&member))
                    .ok_or_else(|| invalid(format!("constant buffer `{name}`")))?;
                ResolvedPath::Global {
                    symbol: symbol.clone(),
                    lvalue: false,
                }
            }
            _ => {
                self.annotate_node(ast, left)?;
                let annotation = *ast.annotation(left);
                let ty = annotation.return_type;
                let component = component_index(&member)
                    .filter(|&c| usize::from(c) < ty.width())
                    .ok_or_else(|| invalid(format!("type {ty}")))?;
                let component_ty = ty.component_type().ok_or_else(|| invalid(format!("type {ty}")))?;

                match (ast.kind(left), annotation.resolved) {
                    (NodeKind::Reference, Resolved::Variable { array_size, .. })
                        if array_size > 0 =>
                    {
                        return Err(AnnotateError::TypeMismatch {
                            context: "member access".to_string(),
                            expected: "array element".to_string(),
                            found: format!("array of {ty}"),
                            span: ast.node(left).span,
                        });
                    }
                    (NodeKind::Reference, Resolved::Variable { var, .. }) => {
                        ResolvedPath::Component {
                            base: ComponentBase::Variable(var),
                            component,
                            ty: component_ty,
                            lvalue: annotation.is_lvalue,
                        }
                    }
                    _ => ResolvedPath::Component {
                        base: ComponentBase::Temporary,
                        component,
                        ty: component_ty,
                        lvalue: false,
                    },
                }
            }
        };

        match path {
            ResolvedPath::Global { symbol, lvalue } => make_reference(ast, id, &symbol, lvalue),
            ResolvedPath::Component {
                base,
                component,
                ty,
                lvalue,
            } => {
                let constant = ast.annotation(left).is_constant;
                ast.clear_children(id);
                if base == ComponentBase::Temporary {
                    ast.append_child(id, left);
                }
                let node = ast.node_mut(id);
                node.kind = NodeKind::ComponentReference;
                node.attribute = member;
                node.annotation = Annotation {
                    return_type: ty,
                    is_constant: constant,
                    is_lvalue: lvalue,
                    resolved: Resolved::Component { base, component },
                };
                Ok(())
            }
        }
    }

    fn resolve_index(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        let (base, index) = operands(ast, id);
        self.annotate_node(ast, base)?;
        self.annotate_node(ast, index)?;

        let base_annotation = *ast.annotation(base);
        let (var, array_size) = match (ast.kind(base), base_annotation.resolved) {
            (NodeKind::Reference, Resolved::Variable { var, array_size }) => (var, array_size),
            _ => {
                return Err(AnnotateError::TypeMismatch {
                    context: "array access".to_string(),
                    expected: "variable".to_string(),
                    found: ast.kind(base).describe().to_string(),
                    span: ast.node(base).span,
                })
            }
        };
        expect_type(ast, index, ValueType::Int1, "array index")?;

        let base_ty = base_annotation.return_type;
        let element_ty = if array_size > 0 {
            base_ty
        } else {
            base_ty
                .component_type()
                .ok_or_else(|| AnnotateError::TypeMismatch {
                    context: "array access".to_string(),
                    expected: "array or vector".to_string(),
                    found: base_ty.to_string(),
                    span: ast.node(base).span,
                })?
        };

        ast.clear_children(id);
        ast.append_child(id, index);
        let node = ast.node_mut(id);
        node.kind = NodeKind::ArrayReference;
        node.annotation = Annotation {
            return_type: element_ty,
            is_constant: false,
            is_lvalue: base_annotation.is_lvalue,
            resolved: Resolved::Array { base: var },
        };
        Ok(())
    }

    fn resolve_call(&self, ast: &mut Ast, id: NodeId) -> Result<(), AnnotateError> {
        self.annotate_children(ast, id)?;
        let name = ast.node(id).attribute.clone();
        let span = ast.node(id).span;
        let args = arg_types(ast, id);

        let (ty, resolved) = if let Some(intrinsic) = Intrinsic::from_name(&name) {
            check_arity(&name, intrinsic.arity(), args.len(), span)?;
            (intrinsic_result(intrinsic, &args, span)?, Resolved::Intrinsic(intrinsic))
        } else if let Some(function) = ast.find_function(&name) {
            let params: Vec<ValueType> = ast
                .children(function)
                .iter()
                .filter(|&&c| ast.kind(c) == NodeKind::Parameter)
                .map(|&c| ast.annotation(c).return_type)
                .collect();
            check_arity(&name, params.len(), args.len(), span)?;
            for ((&expected, &found), &arg) in params.iter().zip(&args).zip(ast.children(id)) {
                if expected != found {
                    return Err(AnnotateError::TypeMismatch {
                        context: format!("argument to `{name}`"),
                        expected: expected.to_string(),
                        found: found.to_string(),
                        span: ast.node(arg).span,
                    });
                }
            }
            (
                ast.annotation(function).return_type,
                Resolved::Function(function),
            )
        } else {
            return Err(AnnotateError::UnresolvedIdentifier { name, span });
        };

        set(ast, id, ty, false, false, resolved);
        Ok(())
    }
}

fn set(
    ast: &mut Ast,
    id: NodeId,
    return_type: ValueType,
    is_constant: bool,
    is_lvalue: bool,
    resolved: Resolved,
) {
    ast.node_mut(id).annotation = Annotation {
        return_type,
        is_constant,
        is_lvalue,
        resolved,
    };
}

fn make_reference(
    ast: &mut Ast,
    id: NodeId,
    symbol: &Symbol,
    lvalue: bool,
) -> Result<(), AnnotateError> {
    let var = symbol
        .assigned_index
        .ok_or_else(|| AnnotateError::UnnumberedSymbol {
            name: symbol.id.clone(),
            span: ast.node(id).span,
        })?;
    ast.clear_children(id);
    let node = ast.node_mut(id);
    node.kind = NodeKind::Reference;
    node.attribute = symbol.id.clone();
    node.annotation = Annotation {
        return_type: symbol.ty,
        is_constant: false,
        is_lvalue: lvalue,
        resolved: Resolved::Variable {
            var,
            array_size: symbol.array_size,
        },
    };
    Ok(())
}

/// Parameter of the function enclosing `id` with the same name
fn find_parameter(ast: &Ast, id: NodeId) -> Option<NodeId> {
    let name = &ast.node(id).attribute;
    let mut current = ast.node(id).parent;
    while let Some(parent) = current {
        if ast.kind(parent) == NodeKind::Function {
            return ast.children(parent).iter().copied().find(|&c| {
                ast.kind(c) == NodeKind::Parameter && ast.node(c).attribute == *name
            });
        }
        current = ast.node(parent).parent;
    }
    None
}

fn operands(ast: &Ast, id: NodeId) -> (NodeId, NodeId) {
    let children = ast.children(id);
    (children[0], children[1])
}

fn arg_types(ast: &Ast, id: NodeId) -> Vec<ValueType> {
    ast.children(id)
        .iter()
        .map(|&arg| ast.annotation(arg).return_type)
        .collect()
}

/// A numeric scalar widened to every component of a vector of its own kind
fn is_splat(scalar: ValueType, target: ValueType) -> bool {
    scalar.is_numeric()
        && scalar.is_scalar()
        && target.width() > 1
        && target.component_type() == Some(scalar)
}

fn component_index(name: &str) -> Option<u8> {
    match name {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        "w" => Some(3),
        _ => None,
    }
}

fn check_arity(callee: &str, expected: usize, found: usize, span: Span) -> Result<(), AnnotateError> {
    if expected == found {
        Ok(())
    } else {
        Err(AnnotateError::ArgumentCount {
            callee: callee.to_string(),
            expected,
            found,
            span,
        })
    }
}

fn expect_type(
    ast: &Ast,
    id: NodeId,
    expected: ValueType,
    context: &str,
) -> Result<(), AnnotateError> {
    let found = ast.annotation(id).return_type;
    if found == expected {
        Ok(())
    } else {
        Err(AnnotateError::TypeMismatch {
            context: context.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: ast.node(id).span,
        })
    }
}

fn expect_numeric(ast: &Ast, id: NodeId, context: &str) -> Result<(), AnnotateError> {
    let found = ast.annotation(id).return_type;
    if found.is_numeric() {
        Ok(())
    } else {
        Err(AnnotateError::TypeMismatch {
            context: context.to_string(),
            expected: "numeric operand".to_string(),
            found: found.to_string(),
            span: ast.node(id).span,
        })
    }
}
