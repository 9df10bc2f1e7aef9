// File: src/parser.rs
//
// Pratt parser: precedence climbing over the token stream, producing
// the AST the compiler consumes. Errors accumulate rather than
// aborting on the first bad token, the way the original language's
// parser collected `self.errors` across a whole parse.

use crate::ast::{BlockStatement, Expr, Program, Stmt};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Slash | TokenKind::Asterisk => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub errors: Vec<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, errors: Vec::new() }
    }

    fn current(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn current_location(&self) -> (usize, usize) {
        let t = &self.tokens[self.pos];
        (t.line, t.column)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), String> {
        if std::mem::discriminant(self.current()) == std::mem::discriminant(expected) {
            self.advance();
            Ok(())
        } else {
            let (line, column) = self.current_location();
            Err(format!("expected {expected:?}, got {:?} at {line}:{column}", self.current()))
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, String> {
        let mut statements = Vec::new();
        while *self.current() != TokenKind::Eof {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => self.errors.push(e),
            }
        }
        if let Some(first) = self.errors.first() {
            return Err(first.clone());
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, String> {
        match self.current() {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Stmt, String> {
        self.advance(); // `let`
        let name = match self.current().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            other => return Err(format!("expected identifier after `let`, got {other:?}")),
        };
        self.expect(&TokenKind::Assign)?;
        let mut value = self.parse_expression(Precedence::Lowest)?;
        if let Expr::FunctionLiteral { name: fn_name, .. } = &mut value {
            *fn_name = Some(name.clone());
        }
        if *self.current() == TokenKind::Semicolon {
            self.advance();
        }
        Ok(Stmt::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, String> {
        self.advance(); // `return`
        let value = self.parse_expression(Precedence::Lowest)?;
        if *self.current() == TokenKind::Semicolon {
            self.advance();
        }
        Ok(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, String> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if *self.current() == TokenKind::Semicolon {
            self.advance();
        }
        Ok(Stmt::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, String> {
        self.expect(&TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while *self.current() != TokenKind::RBrace && *self.current() != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(BlockStatement { statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expr, String> {
        let mut left = self.parse_prefix()?;
        while *self.current() != TokenKind::Semicolon && precedence < precedence_of(self.current()) {
            left = match self.current() {
                TokenKind::LParen => self.parse_call_expression(left)?,
                TokenKind::LBracket => self.parse_index_expression(left)?,
                _ => self.parse_infix_expression(left)?,
            };
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, String> {
        match self.current().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Identifier(name))
            }
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::IntegerLiteral(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::StringLiteral(s))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BooleanLiteral(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BooleanLiteral(false))
            }
            TokenKind::Bang | TokenKind::Minus => {
                let operator = if self.advance() == TokenKind::Bang { "!" } else { "-" };
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Prefix { operator: operator.to_string(), right: Box::new(right) })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_expression_list(&TokenKind::RBracket)?;
                Ok(Expr::ArrayLiteral(elements))
            }
            TokenKind::LBrace => self.parse_hash_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            other => {
                let (line, column) = self.current_location();
                Err(format!("no prefix parse function for {other:?} at {line}:{column}"))
            }
        }
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Result<Expr, String> {
        let operator = match self.current() {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            other => return Err(format!("unexpected infix token: {other:?}")),
        }
        .to_string();
        let precedence = precedence_of(self.current());
        self.advance();
        let right = self.parse_expression(precedence)?;
        Ok(Expr::Infix { left: Box::new(left), operator, right: Box::new(right) })
    }

    fn parse_call_expression(&mut self, function: Expr) -> Result<Expr, String> {
        self.advance(); // `(`
        let arguments = self.parse_expression_list(&TokenKind::RParen)?;
        Ok(Expr::Call { function: Box::new(function), arguments })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Result<Expr, String> {
        self.advance(); // `[`
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::Index { left: Box::new(left), index: Box::new(index) })
    }

    fn parse_expression_list(&mut self, end: &TokenKind) -> Result<Vec<Expr>, String> {
        let mut list = Vec::new();
        if std::mem::discriminant(self.current()) == std::mem::discriminant(end) {
            self.advance();
            return Ok(list);
        }
        list.push(self.parse_expression(Precedence::Lowest)?);
        while *self.current() == TokenKind::Comma {
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(end)?;
        Ok(list)
    }

    fn parse_hash_literal(&mut self) -> Result<Expr, String> {
        self.advance(); // `{`
        let mut pairs = Vec::new();
        while *self.current() != TokenKind::RBrace {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if *self.current() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::HashLiteral(pairs))
    }

    fn parse_if_expression(&mut self) -> Result<Expr, String> {
        self.advance(); // `if`
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(&TokenKind::RParen)?;
        let consequence = self.parse_block_statement()?;
        let alternative = if *self.current() == TokenKind::Else {
            self.advance();
            Some(self.parse_block_statement()?)
        } else {
            None
        };
        Ok(Expr::If { condition: Box::new(condition), consequence, alternative })
    }

    fn parse_function_literal(&mut self) -> Result<Expr, String> {
        self.advance(); // `fn`
        self.expect(&TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if *self.current() != TokenKind::RParen {
            loop {
                match self.current().clone() {
                    TokenKind::Ident(name) => {
                        self.advance();
                        parameters.push(name);
                    }
                    other => return Err(format!("expected parameter name, got {other:?}")),
                }
                if *self.current() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block_statement()?;
        Ok(Expr::FunctionLiteral { name: None, parameters, body })
    }
}
