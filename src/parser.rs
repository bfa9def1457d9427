use tracing::{debug, trace};

use crate::ast::{BinaryOperator, Declaration, ElifBranch, Node, Program, SymbolKind, Type, Value};
use crate::config::ParserConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{ParseError, ParseResult};
use crate::grammar::{self, Action};
use crate::lexer::{Token, TokenType};
use crate::symbol_table::SymbolTable;
use crate::type_checker::{self, TypedExpr};

/// One-pass parser: every construct runs its semantic action (symbol table
/// update, type check, folding) the moment it is reduced. Fatal errors are
/// returned as `Err`; the rest are recorded in [`Parser::diagnostics`].
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    symbol_table: SymbolTable,
    diagnostics: Diagnostics,
    config: ParserConfig,
    /// Nesting of function bodies being parsed. A body runs at call time, so
    /// constants known at the definition are not propagated into it.
    function_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_config(tokens, ParserConfig::default())
    }

    pub fn with_config(mut tokens: Vec<Token>, config: ParserConfig) -> Self {
        if tokens.last().map(|t| &t.token_type) != Some(&TokenType::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                token_type: TokenType::Eof,
                line,
                column: 0,
            });
        }

        Self {
            tokens,
            current: 0,
            symbol_table: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            config,
            function_depth: 0,
        }
    }

    /// Get a reference to the symbol table after parsing
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Take ownership of the symbol table and diagnostics (consumes the parser)
    pub fn into_parts(self) -> (SymbolTable, Diagnostics) {
        (self.symbol_table, self.diagnostics)
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        let statements = self.parse_statements(false)?;
        debug!(
            statements = statements.len(),
            symbols = self.symbol_table.len(),
            diagnostics = self.diagnostics.len(),
            "parsed program"
        );
        Ok(Program { statements })
    }

    fn parse_statements(&mut self, in_block: bool) -> ParseResult<Vec<Node>> {
        let mut statements = Vec::new();

        loop {
            match self.peek().token_type {
                TokenType::Eof if in_block => return Err(self.error("'}'")),
                TokenType::Eof => break,
                TokenType::RightBrace if in_block => break,
                TokenType::Return if in_block => {
                    statements.push(self.parse_return()?);
                    if !self.check(&TokenType::RightBrace) {
                        return Err(self.error("'}' after return"));
                    }
                    break;
                }
                _ => {
                    // empty statements are dropped
                    if let Some(statement) = self.parse_statement()? {
                        statements.push(statement);
                    }
                }
            }
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> ParseResult<Option<Node>> {
        let statement = match self.peek().token_type {
            TokenType::Semicolon => {
                self.advance();
                return Ok(None);
            }
            TokenType::If => self.parse_selection()?,
            TokenType::While => self.parse_while()?,
            TokenType::Do => self.parse_do_while()?,
            TokenType::For => self.parse_for()?,
            TokenType::Function => self.parse_function_def()?,
            TokenType::Struct => self.parse_struct_def()?,
            TokenType::Array => self.parse_array()?,
            TokenType::Identifier(_) if self.next_is(&TokenType::LeftParen) => {
                self.parse_function_call()?
            }
            _ => {
                let statement = self.parse_simple_statement()?;
                self.expect(&TokenType::Semicolon, "';'")?;
                statement
            }
        };
        Ok(Some(statement))
    }

    /// The forms terminated by ';': print, read, declaration, expression.
    fn parse_simple_statement(&mut self) -> ParseResult<Node> {
        match self.peek().token_type {
            TokenType::Print => self.parse_print(),
            TokenType::Read => self.parse_read(),
            _ if self.at_type_keyword() => Ok(Node::Declaration(self.parse_declaration()?)),
            _ => Ok(self.parse_expression()?.node),
        }
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Node>> {
        self.expect(&TokenType::LeftBrace, "'{'")?;
        let statements = self.parse_statements(true)?;
        self.expect(&TokenType::RightBrace, "'}'")?;
        Ok(statements)
    }

    /// A block that may run any number of times, or not at all, from here:
    /// constants it writes are not trusted afterwards.
    fn parse_deferred_block(&mut self) -> ParseResult<Vec<Node>> {
        let start = self.current;
        let block = self.parse_block()?;
        self.forget_writes(start, self.current);
        Ok(block)
    }

    fn parse_return(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'return'
        let name = match &self.peek().token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.expect(&TokenType::Semicolon, "';'")?;
        Ok(Node::Return { name })
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        let ty = match self.peek().token_type {
            TokenType::Int => Type::Int,
            TokenType::Float => Type::Float,
            TokenType::String => Type::String,
            TokenType::Bool => Type::Bool,
            _ => return Err(self.error("a type")),
        };
        self.advance();
        Ok(ty)
    }

    fn at_type_keyword(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Int | TokenType::Float | TokenType::String | TokenType::Bool
        )
    }

    /// `type ID` or `type ID '=' expr`. The name is registered after its
    /// initializer has been checked.
    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let declared_type = self.parse_type()?;
        let (name, line) = self.expect_identifier()?;

        let init = if self.match_token(&TokenType::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        trace!(production = "declaration", name = %name, line);
        self.symbol_table.declare(&name, declared_type.into(), line)?;

        let init = init
            .map(|init| type_checker::coerce(init, declared_type, line))
            .transpose()?;
        if let Some(init) = &init {
            self.symbol_table
                .mark_initialized(&name, line, init.constant().cloned());
        }

        Ok(Declaration {
            name,
            declared_type,
            init: init.map(|init| Box::new(init.node)),
        })
    }

    fn parse_print(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'print'
        self.expect(&TokenType::LeftParen, "'('")?;
        let expr = self.parse_expression()?;
        self.expect(&TokenType::RightParen, "')'")?;
        Ok(Node::Print {
            expr: Box::new(expr.node),
        })
    }

    fn parse_read(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'read'
        self.expect(&TokenType::LeftParen, "'('")?;
        let (name, line) = self.expect_identifier()?;
        self.expect(&TokenType::RightParen, "')'")?;

        trace!(production = "read", name = %name, line);
        self.variable_type(&name, line)?;
        // the value read is only known at run time
        self.symbol_table.mark_initialized(&name, line, None);

        Ok(Node::Read {
            variable_name: name,
        })
    }

    fn parse_selection(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'if'
        let condition = self.parse_condition()?;
        let then_block = self.parse_deferred_block()?;

        let mut elifs = Vec::new();
        while self.match_token(&TokenType::Elif) {
            let condition = self.parse_condition()?;
            let block = self.parse_deferred_block()?;
            elifs.push(ElifBranch { condition, block });
        }

        let else_block = if self.match_token(&TokenType::Else) {
            Some(self.parse_deferred_block()?)
        } else {
            None
        };

        Ok(Node::If {
            condition: Box::new(condition),
            then_block,
            elifs,
            else_block,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Node> {
        let start = self.current;
        self.forget_writes(start, self.block_end(start));
        self.advance(); // consume 'while'

        let condition = self.parse_condition()?;
        let block = self.parse_block()?;
        self.forget_writes(start, self.current);

        Ok(Node::While {
            condition: Box::new(condition),
            block,
        })
    }

    fn parse_do_while(&mut self) -> ParseResult<Node> {
        let start = self.current;
        self.forget_writes(start, self.block_end(start));
        self.advance(); // consume 'do'

        let block = self.parse_block()?;
        self.expect(&TokenType::While, "'while'")?;
        let condition = self.parse_condition()?;
        self.expect(&TokenType::Semicolon, "';'")?;
        self.forget_writes(start, self.current);

        Ok(Node::DoWhile {
            block,
            condition: Box::new(condition),
        })
    }

    fn parse_for(&mut self) -> ParseResult<Node> {
        let start = self.current;
        self.advance(); // consume 'for'
        self.expect(&TokenType::LeftParen, "'('")?;

        let init = if self.check(&TokenType::Semicolon) {
            None
        } else if self.at_type_keyword() {
            Some(Node::Declaration(self.parse_declaration()?))
        } else if self.at_assignment() {
            Some(self.parse_assignment()?.node)
        } else {
            return Err(self.error("a declaration or assignment"));
        };
        self.expect(&TokenType::Semicolon, "';'")?;

        // the init runs once; everything after it repeats
        self.forget_writes(self.current, self.block_end(self.current));

        let condition = if self.check(&TokenType::Semicolon) {
            None
        } else {
            let line = self.peek().line;
            let condition = self.parse_expression()?;
            Some(self.check_condition(condition, line)?)
        };
        self.expect(&TokenType::Semicolon, "';'")?;

        let step = if self.check(&TokenType::RightParen) {
            None
        } else {
            Some(self.parse_expression()?.node)
        };
        self.expect(&TokenType::RightParen, "')'")?;

        let block = self.parse_block()?;
        self.forget_writes(start, self.current);

        Ok(Node::For {
            init: init.map(Box::new),
            condition: condition.map(Box::new),
            step: step.map(Box::new),
            block,
        })
    }

    /// `'(' expr ')'` in branch and loop headers.
    fn parse_condition(&mut self) -> ParseResult<Node> {
        let line = self.expect(&TokenType::LeftParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenType::RightParen, "')'")?;
        self.check_condition(condition, line)
    }

    fn check_condition(&self, condition: TypedExpr, line: usize) -> ParseResult<Node> {
        if self.config.strict_conditions && condition.ty != Type::Bool {
            return Err(ParseError::type_mismatch(Type::Bool, condition.ty, line));
        }
        Ok(condition.node)
    }

    fn parse_function_def(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'function'
        let (name, line) = self.expect_identifier()?;

        self.expect(&TokenType::LeftParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                params.push(self.parse_declaration()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenType::RightParen, "')'")?;

        self.function_depth += 1;
        let body = self.parse_deferred_block();
        self.function_depth -= 1;
        let body = body?;

        trace!(production = "function_def", name = %name, line);
        self.symbol_table.declare(&name, SymbolKind::Function, line)?;

        Ok(Node::FunctionDef { name, params, body })
    }

    fn parse_function_call(&mut self) -> ParseResult<Node> {
        let (name, line) = self.expect_identifier()?;

        self.expect(&TokenType::LeftParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.parse_argument()?.node);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenType::RightParen, "')'")?;
        self.expect(&TokenType::Semicolon, "';'")?;

        trace!(production = "function_call", name = %name, line);
        if !self.symbol_table.exists(&name) {
            self.diagnostics.report(ParseError::UndeclaredIdentifier {
                name: name.clone(),
                line,
            });
        }

        Ok(Node::FunctionCall { name, args })
    }

    /// Call arguments are single values: a literal or an identifier.
    fn parse_argument(&mut self) -> ParseResult<TypedExpr> {
        match self.peek().token_type {
            TokenType::Identifier(_)
            | TokenType::Integer(_)
            | TokenType::Real(_)
            | TokenType::Text(_)
            | TokenType::True
            | TokenType::False => self.parse_primary(),
            _ => Err(self.error("a literal or identifier")),
        }
    }

    fn parse_struct_def(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'struct'
        let (name, line) = self.expect_identifier()?;
        let body = self.parse_deferred_block()?;

        trace!(production = "struct_def", name = %name, line);
        if let Err(err) = self.symbol_table.declare(&name, SymbolKind::Struct, line) {
            let redefines_struct = self
                .symbol_table
                .lookup(&name)
                .map(|symbol| symbol.kind == SymbolKind::Struct)
                .unwrap_or(false);
            if !redefines_struct {
                return Err(err);
            }
            self.diagnostics.report(err);
        }

        Ok(Node::StructDef { name, body })
    }

    /// `array ID ('[' INT ']')+ ';'` or `array ID ('[' INT ']')+ '=' expr ';'`.
    fn parse_array(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'array'
        let (name, _) = self.expect_identifier()?;

        let mut dimensions = Vec::new();
        loop {
            self.expect(&TokenType::LeftBracket, "'['")?;
            match self.peek().token_type {
                TokenType::Integer(bound) => {
                    dimensions.push(bound);
                    self.advance();
                }
                _ => return Err(self.error("an integer bound")),
            }
            self.expect(&TokenType::RightBracket, "']'")?;

            if !self.check(&TokenType::LeftBracket) {
                break;
            }
        }

        let node = if self.match_token(&TokenType::Equal) {
            let value = self.parse_expression()?;
            Node::ArrayAssign {
                name,
                dimensions,
                value: Box::new(value.node),
            }
        } else {
            Node::ArrayDecl { name, dimensions }
        };
        self.expect(&TokenType::Semicolon, "';'")?;
        Ok(node)
    }

    /// Shift-reduce over binary operators. Operands are shifted onto one
    /// stack, operators onto another; each reduction type-checks and folds.
    fn parse_expression(&mut self) -> ParseResult<TypedExpr> {
        let mut operands = vec![self.parse_operand()?];
        let mut operators = Vec::new();

        while let Some(incoming) = grammar::binary_operator(&self.peek().token_type) {
            while let Some(&(stacked, line)) = operators.last() {
                match grammar::resolve(stacked, incoming) {
                    Action::Shift => break,
                    Action::Reduce => {
                        operators.pop();
                        self.reduce(&mut operands, stacked, line)?;
                    }
                    Action::Error => return Err(self.error("end of comparison")),
                }
            }

            let line = self.advance().line;
            operators.push((incoming, line));
            operands.push(self.parse_operand()?);
        }

        while let Some((operator, line)) = operators.pop() {
            self.reduce(&mut operands, operator, line)?;
        }

        operands.pop().ok_or_else(|| self.error("an expression"))
    }

    fn reduce(
        &self,
        operands: &mut Vec<TypedExpr>,
        operator: BinaryOperator,
        line: usize,
    ) -> ParseResult<()> {
        let right = operands.pop();
        let left = operands.pop();
        match (left, right) {
            (Some(left), Some(right)) => {
                trace!(production = "binary", %operator, line);
                operands.push(type_checker::check_binary(operator, left, right, line)?);
                Ok(())
            }
            _ => Err(self.error("an operand")),
        }
    }

    fn parse_operand(&mut self) -> ParseResult<TypedExpr> {
        if self.at_assignment() {
            self.parse_assignment()
        } else {
            self.parse_unary()
        }
    }

    fn parse_unary(&mut self) -> ParseResult<TypedExpr> {
        if self.check(&TokenType::Minus) {
            let line = self.advance().line;
            let operand = self.parse_unary()?;
            trace!(production = "unary_minus", line);
            return type_checker::check_negate(operand, line);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<TypedExpr> {
        let token = self.peek().clone();
        let value = match token.token_type {
            TokenType::Integer(v) => Value::Int(v),
            TokenType::Real(v) => Value::Float(v),
            TokenType::Text(v) => Value::Str(v),
            TokenType::True => Value::Bool(true),
            TokenType::False => Value::Bool(false),
            TokenType::Identifier(name) => {
                self.advance();
                return self.resolve_identifier(name, token.line);
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenType::RightParen, "')'")?;
                return Ok(expr);
            }
            _ => return Err(self.error("an expression")),
        };
        self.advance();
        Ok(TypedExpr::literal(value))
    }

    /// An identifier used as a value must be declared and initialized.
    fn resolve_identifier(&self, name: String, line: usize) -> ParseResult<TypedExpr> {
        let ty = self.variable_type(&name, line)?;
        let value = match self.symbol_table.lookup(&name) {
            Some(symbol) if symbol.is_initialized() => symbol.value.clone(),
            _ => return Err(ParseError::UseBeforeInit { name, line }),
        };

        if self.config.propagate_constants && self.function_depth == 0 {
            if let Some(value) = value {
                trace!(name = %name, %value, "propagated constant");
                return Ok(TypedExpr::literal(value));
            }
        }

        Ok(TypedExpr::new(Node::Identifier { ty, name }, ty))
    }

    /// `ID '=' expr`: the target must exist and accept the value's type.
    fn parse_assignment(&mut self) -> ParseResult<TypedExpr> {
        let (target, line) = self.expect_identifier()?;
        self.expect(&TokenType::Equal, "'='")?;
        let value = self.parse_expression()?;

        trace!(production = "assignment", name = %target, line);
        let ty = self.variable_type(&target, line)?;
        let value = type_checker::coerce(value, ty, line)?;
        self.symbol_table
            .mark_initialized(&target, line, value.constant().cloned());

        Ok(TypedExpr::new(
            Node::Assignment {
                ty,
                target,
                value: Box::new(value.node),
            },
            ty,
        ))
    }

    /// Declared value type of `name`; functions and structs have none.
    fn variable_type(&self, name: &str, line: usize) -> ParseResult<Type> {
        let symbol = self
            .symbol_table
            .lookup(name)
            .ok_or_else(|| ParseError::UndeclaredIdentifier {
                name: name.to_string(),
                line,
            })?;

        symbol.kind.value_type().ok_or_else(|| ParseError::NotAVariable {
            name: name.to_string(),
            kind: symbol.kind,
            line,
        })
    }

    /// Clear tracked constants of every variable written in `tokens[from..to]`.
    fn forget_writes(&mut self, from: usize, to: usize) {
        let end = to.min(self.tokens.len());
        let mut written = Vec::new();

        for i in from..end {
            match &self.tokens[i].token_type {
                TokenType::Identifier(name)
                    if self.token_type_at(i + 1) == Some(&TokenType::Equal) =>
                {
                    written.push(name.clone());
                }
                TokenType::Read => {
                    if let Some(TokenType::Identifier(name)) = self.token_type_at(i + 2) {
                        written.push(name.clone());
                    }
                }
                _ => {}
            }
        }

        for name in written {
            self.symbol_table.forget_value(&name);
        }
    }

    /// Index just past the first brace-delimited block starting at `from`.
    fn block_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            match token.token_type {
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    fn at_assignment(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Identifier(_))
            && self.next_is(&TokenType::Equal)
    }

    fn expect(&mut self, token_type: &TokenType, expected: &str) -> ParseResult<usize> {
        if self.check(token_type) {
            Ok(self.advance().line)
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, usize)> {
        match &self.peek().token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                let line = self.advance().line;
                Ok((name, line))
            }
            _ => Err(self.error("an identifier")),
        }
    }

    /// Syntax error at the current token.
    fn error(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match token.token_type {
            TokenType::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
            _ => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.token_type.to_string(),
                line: token.line,
            },
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        &self.peek().token_type == token_type
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn token_type_at(&self, index: usize) -> Option<&TokenType> {
        self.tokens.get(index).map(|t| &t.token_type)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn next_is(&self, token_type: &TokenType) -> bool {
        self.token_type_at(self.current + 1) == Some(token_type)
    }

    fn advance(&mut self) -> &Token {
        let index = self.current;
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[index]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::Lexer;

    fn parser_for(input: &str, config: ParserConfig) -> Parser {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();
        assert!(lexer.errors().is_empty(), "lex errors: {:?}", lexer.errors());
        Parser::with_config(tokens, config)
    }

    fn parse_program(input: &str) -> (ParseResult<Program>, Parser) {
        let mut parser = parser_for(input, ParserConfig::default());
        let result = parser.parse();
        (result, parser)
    }

    fn parse_ok(input: &str) -> (Program, Parser) {
        let (result, parser) = parse_program(input);
        (result.unwrap(), parser)
    }

    fn parse_err(input: &str) -> ParseError {
        parse_program(input).0.unwrap_err()
    }

    fn init_of(node: &Node) -> &Node {
        match node {
            Node::Declaration(Declaration {
                init: Some(init), ..
            }) => init,
            _ => panic!("Expected initialized declaration, got {:?}", node),
        }
    }

    #[test]
    fn test_constant_propagation_folds_initializer() {
        let (program, parser) = parse_ok("int x = 5; int y = x + 2; print(y);");

        assert_eq!(program.statements.len(), 3);
        assert_eq!(init_of(&program.statements[1]), &Node::literal(Value::Int(7)));
        assert_eq!(
            program.statements[2],
            Node::Print {
                expr: Box::new(Node::literal(Value::Int(7)))
            }
        );
        assert_eq!(
            parser.symbol_table().lookup("y").unwrap().value,
            Some(Value::Int(7))
        );
    }

    #[test]
    fn test_propagation_disabled() {
        let config = ParserConfig {
            propagate_constants: false,
            ..ParserConfig::default()
        };
        let mut parser = parser_for("int x = 5; int y = x + 2;", config);
        let program = parser.parse().unwrap();

        match init_of(&program.statements[1]) {
            Node::BinaryOp { operator, ty, .. } => {
                assert_eq!(*operator, BinaryOperator::Add);
                assert_eq!(*ty, Type::Int);
            }
            other => panic!("Expected binary operation, got {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_variable_is_fatal() {
        let err = parse_err("x = 1;");
        assert_eq!(
            err,
            ParseError::UndeclaredIdentifier {
                name: "x".to_string(),
                line: 1
            }
        );
    }

    #[test]
    fn test_declaration_registers_after_initializer() {
        let err = parse_err("int x = x;");
        assert_eq!(err.kind(), ErrorKind::UndeclaredIdentifier);
    }

    #[test]
    fn test_use_before_init() {
        let err = parse_err("int x;\nprint(x);");
        assert_eq!(
            err,
            ParseError::UseBeforeInit {
                name: "x".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = parse_err("int x;\nfloat x;");
        assert_eq!(
            err,
            ParseError::AlreadyDeclared {
                name: "x".to_string(),
                first_line: 1,
                line: 2
            }
        );
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let err = parse_err("int x; x = 3.0;");
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_initializer_must_match_declared_type() {
        let err = parse_err("int i = 1.5;");
        assert_eq!(err, ParseError::type_mismatch(Type::Int, Type::Float, 1));

        let err = parse_err("string s = 1;");
        assert_eq!(err, ParseError::type_mismatch(Type::String, Type::Int, 1));
    }

    #[test]
    fn test_int_widens_into_float() {
        let (program, parser) = parse_ok("float f = 1; int n; read(n); float g; g = n;");

        assert_eq!(init_of(&program.statements[0]), &Node::literal(Value::Float(1.0)));
        assert_eq!(
            parser.symbol_table().lookup("f").unwrap().value,
            Some(Value::Float(1.0))
        );
        match &program.statements[4] {
            Node::Assignment { ty, value, .. } => {
                assert_eq!(*ty, Type::Float);
                assert!(matches!(value.as_ref(), Node::Convert { ty: Type::Float, .. }));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_division_declares_float() {
        let (program, _) = parse_ok("float x = 7 / 2;");
        assert_eq!(init_of(&program.statements[0]), &Node::literal(Value::Float(3.5)));

        let err = parse_err("int x = 7 / 2;");
        assert_eq!(err, ParseError::type_mismatch(Type::Int, Type::Float, 1));
    }

    #[test]
    fn test_function_body_ignores_outer_constants() {
        let (program, parser) = parse_ok("int i = 0;\nfunction inc() { i = i + 1; }\ninc();");

        match &program.statements[1] {
            Node::FunctionDef { body, .. } => match &body[0] {
                Node::Assignment { target, value, .. } => {
                    assert_eq!(target, "i");
                    assert_eq!(
                        value.as_ref(),
                        &Node::BinaryOp {
                            operator: BinaryOperator::Add,
                            ty: Type::Int,
                            left: Box::new(Node::Identifier {
                                ty: Type::Int,
                                name: "i".to_string()
                            }),
                            right: Box::new(Node::literal(Value::Int(1))),
                        }
                    );
                }
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
        assert_eq!(parser.symbol_table().lookup("i").unwrap().value, None);
    }

    #[test]
    fn test_function_body_reads_stay_symbolic() {
        let (program, parser) = parse_ok("int g = 1; function f() { print(g); } g = 2; f();");

        assert_eq!(
            program.statements[1],
            Node::FunctionDef {
                name: "f".to_string(),
                params: vec![],
                body: vec![Node::Print {
                    expr: Box::new(Node::Identifier {
                        ty: Type::Int,
                        name: "g".to_string()
                    })
                }],
            }
        );
        // outside the body propagation resumes
        assert_eq!(
            parser.symbol_table().lookup("g").unwrap().value,
            Some(Value::Int(2))
        );
    }

    #[test]
    fn test_undeclared_call_is_diagnostic() {
        let (program, parser) = parse_ok("f(1);");
        assert_eq!(program.statements.len(), 1);
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(
            parser.diagnostics().iter().next().map(ParseError::kind),
            Some(ErrorKind::UndeclaredIdentifier)
        );
    }

    #[test]
    fn test_function_definition_and_call() {
        let (program, parser) =
            parse_ok("function f(int a, float b) { return a; }\nf(1, 2.0);");

        assert!(parser.diagnostics().is_empty());
        match &program.statements[0] {
            Node::FunctionDef { name, params, body } => {
                assert_eq!(name, "f");
                assert_eq!(params.len(), 2);
                assert_eq!(params[1].declared_type, Type::Float);
                assert_eq!(
                    body,
                    &vec![Node::Return {
                        name: Some("a".to_string())
                    }]
                );
            }
            other => panic!("Expected function definition, got {:?}", other),
        }

        let kinds: Vec<SymbolKind> = parser.symbol_table().symbols().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Int, SymbolKind::Float, SymbolKind::Function]);
    }

    #[test]
    fn test_recursive_call_is_undeclared_diagnostic() {
        let (_, parser) = parse_ok("function f() { f(); }");
        assert_eq!(parser.diagnostics().len(), 1);
        assert!(parser.symbol_table().exists("f"));
    }

    #[test]
    fn test_function_used_as_value() {
        let err = parse_err("function f() { }\nint y = f;");
        assert_eq!(
            err,
            ParseError::NotAVariable {
                name: "f".to_string(),
                kind: SymbolKind::Function,
                line: 2
            }
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_struct_redeclaration_is_diagnostic() {
        let (program, parser) = parse_ok("struct S { int a; }\nstruct S { }");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn test_struct_over_variable_is_fatal() {
        let err = parse_err("int S;\nstruct S { }");
        assert_eq!(err.kind(), ErrorKind::AlreadyDeclared);
    }

    #[test]
    fn test_non_associative_comparison() {
        let err = parse_err("int a; int b; read(a); read(b); bool c = a < b < 3;");
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_precedence_shapes_tree() {
        let (program, _) = parse_ok("int a; read(a); int b = a + a * 2;");

        match init_of(&program.statements[2]) {
            Node::BinaryOp {
                operator, right, ..
            } => {
                assert_eq!(*operator, BinaryOperator::Add);
                assert!(matches!(
                    right.as_ref(),
                    Node::BinaryOp {
                        operator: BinaryOperator::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("Expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_while_condition_forgets_loop_writes() {
        let (program, parser) = parse_ok("bool b = true; while (b) { b = false; }");

        match &program.statements[1] {
            Node::While { condition, .. } => {
                assert_eq!(
                    condition.as_ref(),
                    &Node::Identifier {
                        ty: Type::Bool,
                        name: "b".to_string()
                    }
                );
            }
            other => panic!("Expected while loop, got {:?}", other),
        }
        assert_eq!(parser.symbol_table().lookup("b").unwrap().value, None);
    }

    #[test]
    fn test_if_block_writes_are_forgotten() {
        let (program, _) = parse_ok("int x = 1; if (x > 0) { x = 2; } print(x);");

        match &program.statements[1] {
            Node::If { condition, .. } => {
                assert_eq!(condition.as_ref(), &Node::literal(Value::Bool(true)));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
        assert_eq!(
            program.statements[2],
            Node::Print {
                expr: Box::new(Node::Identifier {
                    ty: Type::Int,
                    name: "x".to_string()
                })
            }
        );
    }

    #[test]
    fn test_for_loop() {
        let (program, _) = parse_ok("for (int i = 0; i < 3; i = i + 1) { print(i); }");

        match &program.statements[0] {
            Node::For {
                init,
                condition,
                step,
                block,
            } => {
                assert!(matches!(init.as_deref(), Some(Node::Declaration(_))));
                assert_eq!(condition.as_ref().and_then(|c| c.ty()), Some(Type::Bool));
                assert!(matches!(step.as_deref(), Some(Node::Assignment { .. })));
                assert_eq!(block.len(), 1);
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_elif_chain_without_else() {
        let (program, _) = parse_ok(
            "int x; read(x); if (x == 1) { print(1); } elif (x == 2) { print(2); } elif (x == 3) { }",
        );

        match &program.statements[2] {
            Node::If {
                elifs, else_block, ..
            } => {
                assert_eq!(elifs.len(), 2);
                assert!(else_block.is_none());
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_do_while() {
        let (program, _) = parse_ok("int n = 0; do { n = n + 1; } while (n < 5);");
        assert!(matches!(program.statements[1], Node::DoWhile { .. }));
    }

    #[test]
    fn test_strict_conditions() {
        let source = "int x = 1; if (x) { }";
        assert!(parse_program(source).0.is_ok());

        let config = ParserConfig {
            strict_conditions: true,
            ..ParserConfig::default()
        };
        let err = parser_for(source, config).parse().unwrap_err();
        assert_eq!(err, ParseError::type_mismatch(Type::Bool, Type::Int, 1));
    }

    #[test]
    fn test_array_forms() {
        let (program, _) = parse_ok("array a[2][3]; array b[4] = 5;");
        assert_eq!(
            program.statements[0],
            Node::ArrayDecl {
                name: "a".to_string(),
                dimensions: vec![2, 3]
            }
        );
        assert!(matches!(&program.statements[1], Node::ArrayAssign { dimensions, .. } if dimensions == &vec![4]));
    }

    #[test]
    fn test_assignment_as_operand() {
        let (program, parser) = parse_ok("int x; 1 + x = 3;");

        match &program.statements[1] {
            Node::BinaryOp { right, .. } => {
                assert!(matches!(right.as_ref(), Node::Assignment { .. }));
            }
            other => panic!("Expected binary operation, got {:?}", other),
        }
        assert_eq!(
            parser.symbol_table().lookup("x").unwrap().value,
            Some(Value::Int(3))
        );
    }

    #[test]
    fn test_read_clears_constant() {
        let (program, _) = parse_ok("int x = 2; read(x); print(x + 1);");
        assert!(matches!(
            &program.statements[2],
            Node::Print { expr } if matches!(expr.as_ref(), Node::BinaryOp { .. })
        ));
    }

    #[test]
    fn test_return_must_end_block() {
        let err = parse_err("function g() { return; print(1); }");
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "print"));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("int x = 1\nprint(x);");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "';'".to_string(),
                found: "print".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse_err("int x =");
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));

        let err = parse_err("while (true) { print(1);");
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                expected: "'}'".to_string()
            }
        );
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        let (program, _) = parse_ok(";; int x = 1;;");
        assert_eq!(program.statements.len(), 1);
    }
}
