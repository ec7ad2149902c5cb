//! Bytecode generation
//!
//! Only the entry function of the target is emitted. Every operator node
//! opens a temporary scope (`OPSCOPE`), declares its operand temporaries with
//! `DECL*`, writes its result into the slot chosen by the caller, and closes
//! the scope again (`CLSCOPE`). Plain variable references are used as
//! operands directly.

use msl_ast::*;

use crate::bytes::{ByteWriter, Section};
use crate::opcode::{Opcode, Severity, VERSION};
use crate::temps::TempAllocator;
use crate::GenError;

pub const SHADER_MARKER: [u8; 4] = *b"MSLB";
pub const VM_MARKER: [u8; 4] = *b"MVMB";

pub fn bytecode_marker(kind: ShaderKind) -> [u8; 4] {
    if kind.is_shader() {
        SHADER_MARKER
    } else {
        VM_MARKER
    }
}

/// Generate the bytecode for `kind`'s entry function into `buf`.
///
/// `state` must have its indices assigned and `ast` must be annotated.
/// Returns the number of bytes written.
pub fn generate(
    ast: &Ast,
    state: &CompilerState,
    kind: ShaderKind,
    buf: &mut [u8],
) -> Result<usize, GenError> {
    let first_temp = state.next_free_index().ok_or(GenError::IndicesNotAssigned)?;
    let mut generator = BytecodeGenerator {
        ast,
        kind,
        out: ByteWriter::new(buf, Section::Bytecode),
        temps: TempAllocator::new(first_temp),
    };
    generator.program()?;
    Ok(generator.out.position())
}

struct BytecodeGenerator<'a, 'b> {
    ast: &'a Ast,
    kind: ShaderKind,
    out: ByteWriter<'b>,
    temps: TempAllocator,
}

impl<'a, 'b> BytecodeGenerator<'a, 'b> {
    fn program(&mut self) -> Result<(), GenError> {
        self.out.bytes(&bytecode_marker(self.kind))?;
        self.out.bytes(&VERSION)?;

        let name = self.kind.entry_point();
        let body = self
            .ast
            .find_function(name)
            .and_then(|f| self.ast.function_body(f))
            .ok_or(GenError::MissingEntryPoint { name })?;

        self.statement(body)?;
        self.op(Opcode::End)
    }

    // === Statements ===

    fn statement(&mut self, id: NodeId) -> Result<(), GenError> {
        let ast = self.ast;
        let node = ast.node(id);
        match node.kind {
            NodeKind::Block => {
                for &child in &node.children {
                    self.statement(child)?;
                }
                Ok(())
            }
            NodeKind::Empty => Ok(()),
            NodeKind::ExprStatement => {
                let expr = node.children[0];
                if self.ast.kind(expr) == NodeKind::Assign {
                    self.assign(expr, None)
                } else {
                    self.discard(expr)
                }
            }
            NodeKind::Return => {
                if node.children.is_empty() {
                    self.op(Opcode::End)
                } else {
                    Err(self.unsupported("returning a value", id))
                }
            }
            NodeKind::Throw => self.throw(id),
            NodeKind::If => Err(self.unsupported("if statements", id)),
            NodeKind::While => Err(self.unsupported("while loops", id)),
            NodeKind::For => Err(self.unsupported("for loops", id)),
            kind => Err(self.unsupported(kind.describe(), id)),
        }
    }

    /// An expression evaluated only for its effects
    fn discard(&mut self, expr: NodeId) -> Result<(), GenError> {
        if self.ast.annotation(expr).return_type == ValueType::Void {
            return Err(self.unsupported("calls to user functions", expr));
        }
        self.open_scope()?;
        let slot = self.declare(expr)?;
        self.expr(expr, slot)?;
        self.close_scope()
    }

    fn throw(&mut self, id: NodeId) -> Result<(), GenError> {
        if self.kind.is_shader() {
            return Err(self.unsupported("throw in shader programs", id));
        }
        let ast = self.ast;
        let node = ast.node(id);
        let severity = Severity::from_keyword(&node.attribute)
            .ok_or_else(|| self.unsupported("throw severity", id))?;
        let message = node
            .children
            .first()
            .map(|&m| unescape(&self.ast.node(m).attribute))
            .unwrap_or_default();
        let len = u16::try_from(message.len())
            .map_err(|_| self.unsupported("throw messages longer than 65535 bytes", id))?;

        self.op(Opcode::Throw)?;
        self.out.u8(severity.code())?;
        self.out.u16(len)?;
        self.out.bytes(message.as_bytes())
    }

    // === Expressions ===

    /// Evaluate `id` into the already declared slot `dst`
    fn expr(&mut self, id: NodeId, dst: u16) -> Result<(), GenError> {
        let ast = self.ast;
        let node = ast.node(id);
        let annotation = node.annotation;

        if let Some(op) = Opcode::binary(node.kind) {
            self.open_scope()?;
            let lhs = self.operand(node.children[0])?;
            let rhs = self.operand(node.children[1])?;
            self.op(op)?;
            self.out.u16(dst)?;
            self.out.u16(lhs)?;
            self.out.u16(rhs)?;
            return self.close_scope();
        }

        match node.kind {
            NodeKind::IntLiteral => {
                let value = parse_int(&node.attribute).ok_or_else(|| self.invalid_literal(id))?;
                self.op(Opcode::Ldi)?;
                self.out.u16(dst)?;
                self.out.i32(value)
            }
            NodeKind::FloatLiteral => {
                let value: f32 = node
                    .attribute
                    .parse()
                    .map_err(|_| self.invalid_literal(id))?;
                self.op(Opcode::Ldf)?;
                self.out.u16(dst)?;
                self.out.f32(value)
            }
            NodeKind::BoolLiteral => {
                self.op(Opcode::Ldb)?;
                self.out.u16(dst)?;
                self.out.u8(u8::from(node.attribute == "true"))
            }
            NodeKind::Reference => {
                let src = self.variable(id)?;
                self.copy(dst, src)
            }
            NodeKind::ComponentReference => {
                self.open_scope()?;
                let slot = self.bind_component(id)?;
                self.copy(dst, slot)?;
                self.close_scope()
            }
            NodeKind::ArrayReference => {
                self.open_scope()?;
                let slot = self.bind_element(id)?;
                self.copy(dst, slot)?;
                self.close_scope()
            }
            NodeKind::Assign => self.assign(id, Some(dst)),
            NodeKind::Plus => self.expr(node.children[0], dst),
            NodeKind::Neg | NodeKind::Not => {
                let op = if node.kind == NodeKind::Neg {
                    Opcode::Neg
                } else {
                    Opcode::Not
                };
                self.open_scope()?;
                let src = self.operand(node.children[0])?;
                self.op(op)?;
                self.out.u16(dst)?;
                self.out.u16(src)?;
                self.close_scope()
            }
            NodeKind::Construct => {
                self.open_scope()?;
                let args = self.operands(id)?;
                self.op(Opcode::Construct)?;
                self.out.u8(annotation.return_type.code())?;
                self.out.u16(dst)?;
                self.argument_list(&args)?;
                self.close_scope()
            }
            NodeKind::Call => match annotation.resolved {
                Resolved::Intrinsic(intrinsic) => {
                    self.open_scope()?;
                    let args = self.operands(id)?;
                    self.op(Opcode::Call)?;
                    self.out.u8(intrinsic.code())?;
                    self.out.u16(dst)?;
                    self.argument_list(&args)?;
                    self.close_scope()
                }
                _ => Err(self.unsupported("calls to user functions", id)),
            },
            NodeKind::Ident => Err(self.unsupported("function parameters", id)),
            NodeKind::StringLiteral => Err(GenError::UnsupportedType {
                ty: ValueType::String,
                span: node.span,
            }),
            kind => Err(self.unsupported(kind.describe(), id)),
        }
    }

    /// `target = value`; when `consumed` is set the assigned value is also
    /// copied there.
    fn assign(&mut self, id: NodeId, consumed: Option<u16>) -> Result<(), GenError> {
        let children = self.ast.children(id);
        let (target, value) = (children[0], children[1]);

        match self.ast.kind(target) {
            NodeKind::Reference => {
                let var = self.variable(target)?;
                self.convert(value, var, self.ast.annotation(target).return_type)?;
                if let Some(dst) = consumed {
                    self.copy(dst, var)?;
                }
                Ok(())
            }
            NodeKind::ComponentReference | NodeKind::ArrayReference => {
                self.open_scope()?;
                let slot = if self.ast.kind(target) == NodeKind::ComponentReference {
                    self.bind_component(target)?
                } else {
                    self.bind_element(target)?
                };
                self.convert(value, slot, self.ast.annotation(target).return_type)?;
                if let Some(dst) = consumed {
                    self.copy(dst, slot)?;
                }
                self.close_scope()
            }
            _ => Err(self.unsupported("assignment to this expression", target)),
        }
    }

    /// Evaluate `value` into `dst` of type `ty`, splatting a scalar if needed
    fn convert(&mut self, value: NodeId, dst: u16, ty: ValueType) -> Result<(), GenError> {
        let found = self.ast.annotation(value).return_type;
        if found == ty || !found.is_scalar() {
            return self.expr(value, dst);
        }
        self.open_scope()?;
        let scalar = self.operand(value)?;
        self.op(Opcode::Construct)?;
        self.out.u8(ty.code())?;
        self.out.u16(dst)?;
        self.argument_list(&[scalar])?;
        self.close_scope()
    }

    /// Bind a fresh temporary to the component named by a `ComponentReference`
    fn bind_component(&mut self, id: NodeId) -> Result<u16, GenError> {
        let ast = self.ast;
        let node = ast.node(id);
        let (base, component) = match node.annotation.resolved {
            Resolved::Component { base, component } => (base, component),
            _ => return Err(self.unsupported("unresolved component", id)),
        };
        let base = match base {
            ComponentBase::Variable(var) => var,
            ComponentBase::Temporary => self.operand(node.children[0])?,
        };
        let slot = self.declare(id)?;
        let op = if node.annotation.return_type.is_float() {
            Opcode::GetFCmp
        } else {
            Opcode::GetICmp
        };
        self.op(op)?;
        self.out.u16(slot)?;
        self.out.u16(base)?;
        self.out.u8(component)?;
        Ok(slot)
    }

    /// Bind a fresh temporary to the element named by an `ArrayReference`
    fn bind_element(&mut self, id: NodeId) -> Result<u16, GenError> {
        let ast = self.ast;
        let node = ast.node(id);
        let base = match node.annotation.resolved {
            Resolved::Array { base } => base,
            _ => return Err(self.unsupported("unresolved array access", id)),
        };
        let index = self.operand(node.children[0])?;
        let slot = self.declare(id)?;
        self.op(Opcode::GetACmp)?;
        self.out.u16(slot)?;
        self.out.u16(base)?;
        self.out.u16(index)?;
        Ok(slot)
    }

    /// Slot holding the value of `id`: the variable itself for a plain
    /// reference, otherwise a declared temporary of the current scope.
    fn operand(&mut self, id: NodeId) -> Result<u16, GenError> {
        if self.ast.kind(id) == NodeKind::Reference {
            return self.variable(id);
        }
        let slot = self.declare(id)?;
        self.expr(id, slot)?;
        Ok(slot)
    }

    fn operands(&mut self, id: NodeId) -> Result<Vec<u16>, GenError> {
        let children = self.ast.children(id).to_vec();
        children.into_iter().map(|c| self.operand(c)).collect()
    }

    fn argument_list(&mut self, args: &[u16]) -> Result<(), GenError> {
        let argc = u8::try_from(args.len()).map_err(|_| GenError::TooManyVariables {
            what: "arguments",
        })?;
        self.out.u8(argc)?;
        for &arg in args {
            self.out.u16(arg)?;
        }
        Ok(())
    }

    fn variable(&self, id: NodeId) -> Result<u16, GenError> {
        match self.ast.annotation(id).resolved {
            Resolved::Variable { var, .. } => Ok(var),
            _ => Err(self.unsupported("unresolved reference", id)),
        }
    }

    /// Allocate a temporary of `id`'s type and emit its `DECL*`
    fn declare(&mut self, id: NodeId) -> Result<u16, GenError> {
        let ty = self.ast.annotation(id).return_type;
        let op = Opcode::decl(ty).ok_or(GenError::UnsupportedType {
            ty,
            span: self.ast.node(id).span,
        })?;
        let slot = self.temps.alloc_temp()?;
        self.op(op)?;
        self.out.u16(slot)?;
        Ok(slot)
    }

    fn copy(&mut self, dst: u16, src: u16) -> Result<(), GenError> {
        self.op(Opcode::Assign)?;
        self.out.u16(dst)?;
        self.out.u16(src)
    }

    fn open_scope(&mut self) -> Result<(), GenError> {
        self.temps.push_scope();
        self.op(Opcode::OpScope)
    }

    fn close_scope(&mut self) -> Result<(), GenError> {
        self.temps.pop_scope();
        self.op(Opcode::ClScope)
    }

    fn op(&mut self, op: Opcode) -> Result<(), GenError> {
        self.out.u8(op.code())
    }

    fn unsupported(&self, feature: &str, id: NodeId) -> GenError {
        GenError::UnsupportedFeature {
            feature: feature.to_string(),
            span: self.ast.node(id).span,
        }
    }

    fn invalid_literal(&self, id: NodeId) -> GenError {
        let ast = self.ast;
        let node = ast.node(id);
        GenError::InvalidLiteral {
            text: node.attribute.clone(),
            span: node.span,
        }
    }
}

/// Decimal int literal; values up to 2^32 - 1 wrap to their bit pattern.
fn parse_int(text: &str) -> Option<i32> {
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<u32>().ok().map(|v| v as i32))
}

/// Resolve the backslash escapes a string literal keeps from the source
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_common_sequences() {
        assert_eq!(unescape(r#"say \"hi\"\n"#), "say \"hi\"\n");
        assert_eq!(unescape(r"back\\slash"), r"back\slash");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn int_literals_wrap_to_bits() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("4294967295"), Some(-1));
        assert_eq!(parse_int("4294967296"), None);
    }

    #[test]
    fn marker_depends_on_target() {
        assert_eq!(bytecode_marker(ShaderKind::Vm), *b"MVMB");
        assert_eq!(bytecode_marker(ShaderKind::Pixel), *b"MSLB");
    }
}
