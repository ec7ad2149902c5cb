//! Arena-allocated syntax tree
//!
//! Nodes live in a single `Vec<Node>` owned by [`Ast`] and refer to each other
//! through [`NodeId`] indices. Nodes are never freed individually; the whole
//! arena is cleared with [`Ast::reset`] before the next parse.

use serde::{Deserialize, Serialize};

use crate::{Intrinsic, Span, ValueType};

/// Default node capacity of an [`Ast`]
pub const DEFAULT_MAX_NODES: usize = 8192;

/// Index of a node inside its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Root,

    // === Declarations ===
    /// `attribute` is the function name, children are parameters then the body block
    Function,
    Parameter,

    // === Statements ===
    Block,
    ExprStatement,
    /// Empty statement, also stands in for the omitted parts of a `for` header
    Empty,
    If,
    While,
    /// Always four children: init, condition, step, body
    For,
    Return,
    /// `attribute` is `warning` or `error`, the only child is the message literal
    Throw,

    // === Expressions ===
    Assign,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Plus,
    Not,
    /// `left.right`; the right child is an `Ident`
    Member,
    /// `base[index]`
    Index,
    /// `name(args...)`, `attribute` is the callee name
    Call,
    /// `Type(args...)`, the constructed type is the node's return type
    Construct,
    Ident,
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    StringLiteral,
    InputKeyword,
    OutputKeyword,

    // === Produced by annotation ===
    Reference,
    ComponentReference,
    ArrayReference,
}

impl NodeKind {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            NodeKind::Eq | NodeKind::Ne | NodeKind::Lt | NodeKind::Gt | NodeKind::Le | NodeKind::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, NodeKind::And | NodeKind::Or)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::IntLiteral
                | NodeKind::FloatLiteral
                | NodeKind::BoolLiteral
                | NodeKind::StringLiteral
        )
    }

    pub fn is_reference(self) -> bool {
        matches!(
            self,
            NodeKind::Reference | NodeKind::ComponentReference | NodeKind::ArrayReference
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Function => "function",
            NodeKind::Parameter => "parameter",
            NodeKind::Block => "block",
            NodeKind::ExprStatement => "expression statement",
            NodeKind::Empty => "empty statement",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::For => "for",
            NodeKind::Return => "return",
            NodeKind::Throw => "throw",
            NodeKind::Assign => "'='",
            NodeKind::And => "'&&'",
            NodeKind::Or => "'||'",
            NodeKind::Eq => "'=='",
            NodeKind::Ne => "'!='",
            NodeKind::Lt => "'<'",
            NodeKind::Gt => "'>'",
            NodeKind::Le => "'<='",
            NodeKind::Ge => "'>='",
            NodeKind::Add => "'+'",
            NodeKind::Sub => "'-'",
            NodeKind::Mul => "'*'",
            NodeKind::Div => "'/'",
            NodeKind::Neg => "unary '-'",
            NodeKind::Plus => "unary '+'",
            NodeKind::Not => "'!'",
            NodeKind::Member => "member access",
            NodeKind::Index => "array access",
            NodeKind::Call => "call",
            NodeKind::Construct => "constructor",
            NodeKind::Ident => "identifier",
            NodeKind::IntLiteral => "int literal",
            NodeKind::FloatLiteral => "float literal",
            NodeKind::BoolLiteral => "bool literal",
            NodeKind::StringLiteral => "string literal",
            NodeKind::InputKeyword => "'Input'",
            NodeKind::OutputKeyword => "'Output'",
            NodeKind::Reference => "reference",
            NodeKind::ComponentReference => "component reference",
            NodeKind::ArrayReference => "array reference",
        }
    }
}

/// Where a component reference reads its vector from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentBase {
    /// A global variable, by assigned index
    Variable(u16),
    /// The node's first child, evaluated into a temporary at generation time
    Temporary,
}

/// What an identifier-like node was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolved {
    #[default]
    None,
    Variable {
        var: u16,
        array_size: u16,
    },
    Component {
        base: ComponentBase,
        component: u8,
    },
    /// Element of `base`; the node's only child is the index expression
    Array {
        base: u16,
    },
    Intrinsic(Intrinsic),
    Function(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub return_type: ValueType,
    pub is_constant: bool,
    pub is_lvalue: bool,
    pub resolved: Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub attribute: String,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub annotation: Annotation,
}

/// The node arena ran out of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExhausted {
    pub max: usize,
}

/// Arena of syntax nodes rooted at [`Ast::ROOT`].
///
/// Only nodes reachable from the root are part of the tree. A node detached by
/// [`Ast::clear_children`] keeps its slot and contents but has `parent: None`.
/// Unless it is appended again it is dead: every pass walks down from the
/// root, so it is never visited, and its stale `children` are never followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
    max_nodes: usize,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_NODES)
    }

    /// An arena holding at most `max_nodes` nodes, root included.
    pub fn with_capacity_limit(max_nodes: usize) -> Self {
        let mut ast = Self {
            nodes: Vec::new(),
            max_nodes: max_nodes.max(1),
        };
        ast.reset();
        ast
    }

    /// Drop every node except a fresh root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node {
            kind: NodeKind::Root,
            attribute: String::new(),
            span: Span::default(),
            parent: None,
            children: Vec::new(),
            annotation: Annotation::default(),
        });
    }

    pub fn alloc(
        &mut self,
        kind: NodeKind,
        attribute: impl Into<String>,
        span: Span,
    ) -> Result<NodeId, PoolExhausted> {
        if self.nodes.len() >= self.max_nodes {
            return Err(PoolExhausted {
                max: self.max_nodes,
            });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            attribute: attribute.into(),
            span,
            parent: None,
            children: Vec::new(),
            annotation: Annotation::default(),
        });
        Ok(id)
    }

    /// Attach `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach every child of `id`; the detached nodes stay in the arena as dead
    /// slots, unreachable from the root.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn annotation(&self, id: NodeId) -> &Annotation {
        &self.nodes[id.0].annotation
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Function declarations in source order
    pub fn functions(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .filter(|&id| self.kind(id) == NodeKind::Function)
    }

    pub fn find_function(&self, name: &str) -> Option<NodeId> {
        self.functions()
            .find(|&id| self.node(id).attribute == name)
    }

    /// Body block of a function node
    pub fn function_body(&self, function: NodeId) -> Option<NodeId> {
        self.children(function)
            .iter()
            .copied()
            .find(|&id| self.kind(id) == NodeKind::Block)
    }
}
