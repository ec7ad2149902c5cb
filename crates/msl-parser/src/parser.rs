//! Recursive descent parser implementation

use msl_ast::*;
use msl_lexer::{Token, TokenKind};

use crate::ParseError;

/// Stands in for the trailing token of a slice that lacks one
static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    attribute: String::new(),
    span: Span { start: 0, end: 0 },
};

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    ast: Ast,
    state: CompilerState,
    /// Tree height below each node, by node index
    heights: Vec<usize>,
    /// Open recursive descents
    depth: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self::with_limits(tokens, &Limits::default())
    }

    pub fn with_limits(tokens: &'t [Token], limits: &Limits) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::with_capacity_limit(limits.max_nodes),
            state: CompilerState::new(),
            heights: vec![1],
            depth: 0,
            max_depth: limits.max_depth,
        }
    }

    // === Utilities ===

    fn current(&self) -> &'t Token {
        self.tokens.get(self.pos).unwrap_or(&EOF_TOKEN)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Step past the current token; `Eof` is never stepped past.
    fn advance(&mut self) -> &'t Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<&'t Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current())
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| self.span())
    }

    fn node(&mut self, kind: NodeKind, attribute: &str, span: Span) -> Result<NodeId, ParseError> {
        let id = self
            .ast
            .alloc(kind, attribute, span)
            .map_err(|e| ParseError::TooManyNodes { max: e.max, span })?;
        self.heights.resize(id.0 + 1, 1);
        Ok(id)
    }

    fn node_with(
        &mut self,
        kind: NodeKind,
        attribute: &str,
        span: Span,
        children: &[NodeId],
    ) -> Result<NodeId, ParseError> {
        let height = 1 + children
            .iter()
            .map(|c| self.heights.get(c.0).copied().unwrap_or(1))
            .max()
            .unwrap_or(0);
        if height > self.max_depth {
            return Err(ParseError::TooDeep {
                max: self.max_depth,
                span,
            });
        }

        let id = self.node(kind, attribute, span)?;
        self.heights[id.0] = height;
        for &child in children {
            self.ast.append_child(id, child);
        }
        Ok(id)
    }

    /// Run one level of recursive descent, failing once `max_depth` levels are open.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                max: self.max_depth,
                span: self.span(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn binary(&mut self, kind: NodeKind, left: NodeId, right: NodeId) -> Result<NodeId, ParseError> {
        let span = self.ast.node(left).span.merge(self.ast.node(right).span);
        self.node_with(kind, "", span, &[left, right])
    }

    // === Program ===

    /// Parse the whole token stream into a tree plus the declared interface.
    pub fn parse_program(mut self) -> Result<(Ast, CompilerState), ParseError> {
        while !self.at(TokenKind::Eof) {
            self.parse_top_level()?;
        }
        Ok((self.ast, self.state))
    }

    fn parse_top_level(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            TokenKind::Input | TokenKind::Output => self.parse_io_block(),
            TokenKind::ConstantBuffer => self.parse_constant_buffer(),
            TokenKind::Texture1D | TokenKind::Texture2D | TokenKind::Texture3D => {
                self.parse_texture()
            }
            kind if kind.value_type().is_some() => {
                let function = self.parse_function()?;
                let node = self.ast.node(function);
                if self.ast.find_function(&node.attribute).is_some() {
                    return Err(ParseError::DuplicateFunction {
                        name: node.attribute.clone(),
                        span: node.span,
                    });
                }
                self.ast.append_child(Ast::ROOT, function);
                Ok(())
            }
            _ => Err(self.unexpected("declaration")),
        }
    }

    // === Struct-like declarations ===

    /// `Input { float4 pos : POSITION; ... }` and the matching `Output` block
    fn parse_io_block(&mut self) -> Result<(), ParseError> {
        let is_input = self.at(TokenKind::Input);
        self.advance();
        self.consume(TokenKind::LBrace)?;

        while !self.at(TokenKind::RBrace) {
            let start = self.span();
            let ty = self.parse_variable_type()?;
            let name = self.consume(TokenKind::Ident)?;
            let array_size = self.parse_array_suffix()?;
            self.consume(TokenKind::Colon)?;
            let semantic = self.consume(TokenKind::Ident)?;
            self.consume(TokenKind::Semicolon)?;

            let span = start.merge(self.previous_span());
            let symbol = Symbol::new(name.attribute.as_str(), semantic.attribute.as_str(), ty)
                .with_array_size(array_size)
                .with_span(span);
            let declared = if is_input {
                self.state.declare_input(symbol)
            } else {
                self.state.declare_output(symbol)
            };
            declared.map_err(|e| ParseError::from_declare(e, span))?;
        }

        self.consume(TokenKind::RBrace)?;
        self.eat(TokenKind::Semicolon);
        Ok(())
    }

    /// `ConstantBuffer cb : PerFrame { float4x4 world; float4 lights[4]; }`
    fn parse_constant_buffer(&mut self) -> Result<(), ParseError> {
        let start = self.span();
        self.consume(TokenKind::ConstantBuffer)?;
        let id = self.consume(TokenKind::Ident)?;
        self.consume(TokenKind::Colon)?;
        let name = self.consume(TokenKind::Ident)?;
        self.consume(TokenKind::LBrace)?;

        let mut variables = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let var_start = self.span();
            let ty = self.parse_variable_type()?;
            let var_name = self.consume(TokenKind::Ident)?;
            let array_size = self.parse_array_suffix()?;
            let display = if self.eat(TokenKind::Colon) {
                self.consume(TokenKind::Ident)?
            } else {
                var_name
            };
            self.consume(TokenKind::Semicolon)?;

            let span = var_start.merge(self.previous_span());
            variables.push(
                Symbol::new(var_name.attribute.as_str(), display.attribute.as_str(), ty)
                    .with_array_size(array_size)
                    .with_span(span),
            );
        }

        self.consume(TokenKind::RBrace)?;
        self.eat(TokenKind::Semicolon);

        let span = start.merge(self.previous_span());
        let buffer = ConstantBuffer {
            symbol: Symbol::new(id.attribute.as_str(), name.attribute.as_str(), ValueType::Void)
                .with_span(span),
            variables,
        };
        self.state
            .declare_constant_buffer(buffer)
            .map_err(|e| ParseError::from_declare(e, span))
    }

    /// `Texture2D albedo : AlbedoMap;`
    fn parse_texture(&mut self) -> Result<(), ParseError> {
        let start = self.span();
        let keyword = self.advance();
        let dim = keyword
            .kind
            .texture_dim()
            .ok_or_else(|| ParseError::unexpected("texture declaration", keyword))?;
        let id = self.consume(TokenKind::Ident)?;
        self.consume(TokenKind::Colon)?;
        let name = self.consume(TokenKind::Ident)?;
        self.consume(TokenKind::Semicolon)?;

        let span = start.merge(self.previous_span());
        let symbol = Symbol::new(id.attribute.as_str(), name.attribute.as_str(), dim.value_type())
            .with_span(span);
        self.state
            .declare_texture(dim, symbol)
            .map_err(|e| ParseError::from_declare(e, span))
    }

    /// A type usable for a variable: anything but `void`.
    fn parse_variable_type(&mut self) -> Result<ValueType, ParseError> {
        match self.peek().value_type() {
            Some(ty) if ty != ValueType::Void => {
                self.advance();
                Ok(ty)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_array_suffix(&mut self) -> Result<u16, ParseError> {
        if !self.eat(TokenKind::LBracket) {
            return Ok(0);
        }
        let size = self.consume(TokenKind::IntLit)?;
        let value = size
            .attribute
            .parse::<u16>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::InvalidArraySize {
                text: size.attribute.clone(),
                span: size.span,
            })?;
        self.consume(TokenKind::RBracket)?;
        Ok(value)
    }

    // === Functions ===

    fn parse_function(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        let ret = self.advance();
        let return_type = ret.kind.value_type().unwrap_or_default();
        let name = self.consume(TokenKind::Ident)?;
        self.consume(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let param_start = self.span();
                let ty = self.parse_variable_type()?;
                let param_name = self.consume(TokenKind::Ident)?;
                let span = param_start.merge(param_name.span);
                let param = self.node(NodeKind::Parameter, &param_name.attribute, span)?;
                self.ast.node_mut(param).annotation.return_type = ty;
                params.push(param);

                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;

        let body = self.parse_block()?;
        params.push(body);

        let span = start.merge(self.previous_span());
        let function = self.node_with(NodeKind::Function, &name.attribute, span, &params)?;
        self.ast.node_mut(function).annotation.return_type = return_type;
        Ok(function)
    }

    // === Statements ===

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::LBrace)?;

        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }

        self.consume(TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::Block, "", span, &statements)
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                self.node(NodeKind::Empty, "", span)
            }
            _ => {
                let start = self.span();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::Semicolon)?;
                let span = start.merge(self.previous_span());
                self.node_with(NodeKind::ExprStatement, "", span, &[expr])
            }
        }
    }

    fn parse_condition(&mut self) -> Result<NodeId, ParseError> {
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_statement()?;

        let mut children = vec![condition, then_branch];
        if self.eat(TokenKind::Else) {
            children.push(self.parse_statement()?);
        }

        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::If, "", span, &children)
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_statement()?;
        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::While, "", span, &[condition, body])
    }

    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LParen)?;
        let init = self.parse_optional_expr(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon)?;
        let condition = self.parse_optional_expr(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon)?;
        let step = self.parse_optional_expr(TokenKind::RParen)?;
        self.consume(TokenKind::RParen)?;
        let body = self.parse_statement()?;

        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::For, "", span, &[init, condition, step, body])
    }

    /// An expression, or an `Empty` placeholder when `terminator` comes next
    fn parse_optional_expr(&mut self, terminator: TokenKind) -> Result<NodeId, ParseError> {
        if self.at(terminator) {
            let span = self.span();
            self.node(NodeKind::Empty, "", Span::new(span.start, span.start))
        } else {
            self.parse_expr()
        }
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Return)?;
        let mut children = Vec::new();
        if !self.at(TokenKind::Semicolon) {
            children.push(self.parse_expr()?);
        }
        self.consume(TokenKind::Semicolon)?;
        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::Return, "", span, &children)
    }

    /// `throw warning "message";` / `throw error "message";`
    fn parse_throw(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Throw)?;
        let severity = match self.peek() {
            TokenKind::Warning | TokenKind::Error => self.advance(),
            _ => return Err(self.unexpected("'warning' or 'error'")),
        };
        let message = self.consume(TokenKind::StringLit)?;
        let literal = self.node(NodeKind::StringLiteral, &message.attribute, message.span)?;
        self.ast.node_mut(literal).annotation.return_type = ValueType::String;
        self.consume(TokenKind::Semicolon)?;

        let span = start.merge(self.previous_span());
        self.node_with(NodeKind::Throw, &severity.attribute, span, &[literal])
    }

    // === Expressions ===

    pub(crate) fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        self.nested(Self::parse_assignment)
    }

    /// The right side binds one level tighter, so `a = b = c` is rejected.
    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let left = self.parse_logical()?;

        if self.eat(TokenKind::Eq) {
            let right = self.parse_logical()?;
            return self.binary(NodeKind::Assign, left, right);
        }

        Ok(left)
    }

    fn parse_logical(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let kind = match self.peek() {
                TokenKind::AndAnd => NodeKind::And,
                TokenKind::OrOr => NodeKind::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let kind = match self.peek() {
                TokenKind::EqEq => NodeKind::Eq,
                TokenKind::Ne => NodeKind::Ne,
                TokenKind::Lt => NodeKind::Lt,
                TokenKind::Gt => NodeKind::Gt,
                TokenKind::Le => NodeKind::Le,
                TokenKind::Ge => NodeKind::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let kind = match self.peek() {
                TokenKind::Plus => NodeKind::Add,
                TokenKind::Minus => NodeKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let kind = match self.peek() {
                TokenKind::Star => NodeKind::Mul,
                TokenKind::Slash => NodeKind::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();

        let kind = match self.peek() {
            TokenKind::Plus => Some(NodeKind::Plus),
            TokenKind::Minus => Some(NodeKind::Neg),
            TokenKind::Bang => Some(NodeKind::Not),
            _ => None,
        };

        if let Some(kind) = kind {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            let span = start.merge(self.ast.node(operand).span);
            return self.node_with(kind, "", span, &[operand]);
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat(TokenKind::Dot) {
                let field = self.consume(TokenKind::Ident)?;
                let member = self.node(NodeKind::Ident, &field.attribute, field.span)?;
                expr = self.binary(NodeKind::Member, expr, member)?;
                self.ast.node_mut(expr).attribute = field.attribute.clone();
            } else if self.eat(TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.consume(TokenKind::RBracket)?;
                expr = self.binary(NodeKind::Index, expr, index)?;
                let span = self.ast.node(expr).span.merge(self.previous_span());
                self.ast.node_mut(expr).span = span;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.span();

        match self.peek() {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Ident if self.peek_ahead(1) == TokenKind::LParen => {
                let name = self.advance();
                let args = self.parse_arguments()?;
                let span = start.merge(self.previous_span());
                self.node_with(NodeKind::Call, &name.attribute, span, &args)
            }
            TokenKind::Ident => {
                let token = self.advance();
                self.node(NodeKind::Ident, &token.attribute, token.span)
            }
            kind if kind.value_type().is_some() => {
                let token = self.advance();
                let ty = token.kind.value_type().unwrap_or_default();
                if !self.at(TokenKind::LParen) {
                    return Err(self.unexpected("'(' after type name"));
                }
                let args = self.parse_arguments()?;
                let span = start.merge(self.previous_span());
                let node = self.node_with(NodeKind::Construct, ty.name(), span, &args)?;
                self.ast.node_mut(node).annotation.return_type = ty;
                Ok(node)
            }
            TokenKind::IntLit => {
                let token = self.advance();
                self.node(NodeKind::IntLiteral, &token.attribute, token.span)
            }
            TokenKind::FloatLit => {
                let token = self.advance();
                self.node(NodeKind::FloatLiteral, &token.attribute, token.span)
            }
            TokenKind::StringLit => {
                let token = self.advance();
                self.node(NodeKind::StringLiteral, &token.attribute, token.span)
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                self.node(NodeKind::BoolLiteral, &token.attribute, token.span)
            }
            TokenKind::Input => {
                let token = self.advance();
                self.node(NodeKind::InputKeyword, &token.attribute, token.span)
            }
            TokenKind::Output => {
                let token = self.advance();
                self.node(NodeKind::OutputKeyword, &token.attribute, token.span)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `( expr, expr, ... )`
    fn parse_arguments(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.consume(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(args)
    }
}
