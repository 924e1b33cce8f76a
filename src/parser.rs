/*!
Recursive‑descent parser producing the [`Stmt`]/[`Expr`] tree.

Every token is looked at a bounded number of times and recovery only moves
forward, so parsing is linear in the token count. Syntax errors are collected
and the parser re‑synchronises at the next statement boundary; a program is
only returned when it parsed cleanly. Some errors (bad assignment target, too
many arguments) are recorded without unwinding at all.

`info!` marks the start and end of a parse, `debug!` every grammar branch and
every error.

```text
program        → declaration* EOF ;
declaration    → "class" classDecl | "fun" function | "var" varDecl | statement ;
classDecl      → IDENT ( "<" IDENT )? "{" function* "}" ;
function       → IDENT "(" ( IDENT ( "," IDENT )* )? ")" block ;
varDecl        → IDENT ( "=" expression )? ";" ;
statement      → "for" forStmt | "if" ifStmt | "print" expression ";"
               | "return" expression? ";" | "while" whileStmt
               | "{" block | expression ";" ;
forStmt        → "(" ( "var" varDecl | expression ";" | ";" )
                 expression? ";" expression? ")" statement ;
block          → declaration* "}" ;

expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | or ;
or             → and ( "or" and )* ;
and            → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT ;
```
*/

use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::expr::{Expr, LiteralValue};
use crate::stack::ensure_sufficient_stack;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
pub const MAX_ARITY: usize = 255;

/// Builds a node from `left operator right`.
type Combine = fn(Box<Expr>, Token, Box<Expr>) -> Expr;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<LoxError>,
}

impl Parser {
    /// A trailing `EOF` is appended if `tokens` lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        let terminated: bool = matches!(
            tokens.last(),
            Some(Token {
                token_type: TokenType::EOF,
                ..
            })
        );
        if !terminated {
            let line: usize = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a whole program, or return every syntax error found in it.
    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, Vec<LoxError>> {
        info!("Beginning parse phase");

        let mut program: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => program.push(stmt),
                Err(e) => {
                    debug!("Parse error, synchronizing: {}", e);
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if !self.errors.is_empty() {
            info!("Parse phase failed with {} error(s)", self.errors.len());
            return Err(self.errors);
        }

        info!("Parsed {} statement(s)", program.len());
        Ok(program)
    }

    /// Parse input consisting of exactly one expression.
    pub fn parse_expression(mut self) -> Result<Expr> {
        info!("Parsing a single expression");

        let expr: Expr = self.expression()?;

        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        if !self.is_at_end() {
            return Err(LoxError::parse(self.peek(), "Expected end of expression"));
        }

        Ok(expr)
    }

    // ──────────────────────── declarations ────────────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        ensure_sufficient_stack(|| self.declaration_inner())
    }

    fn declaration_inner(&mut self) -> Result<Stmt> {
        debug!("declaration at line {}", self.peek().line);

        match self.peek().token_type {
            TokenType::CLASS => {
                self.advance();
                self.class_declaration()
            }
            TokenType::FUN => {
                self.advance();
                Ok(Stmt::Function(self.function("function")?))
            }
            TokenType::VAR => {
                self.advance();
                self.var_declaration()
            }
            _ => self.statement(),
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.expect(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass: Option<Expr> = match self.advance_if(TokenType::LESS) {
            Some(_) => {
                let parent: Token =
                    self.expect(TokenType::IDENTIFIER, "Expected superclass name")?;
                Some(Expr::variable(parent))
            }
            None => None,
        };

        self.expect(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.expect(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        debug!("class '{}' with {} method(s)", name.lexeme, methods.len());
        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `kind` is "function" or "method" and only shapes error messages.
    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.expect(TokenType::IDENTIFIER, &format!("Expected {} name", kind))?;
        self.expect(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        let (params, _) = self.comma_list("parameters", "Expected ')' after parameters", |p| {
            p.expect(TokenType::IDENTIFIER, "Expected parameter name")
        })?;

        self.expect(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body", kind),
        )?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.expect(TokenType::IDENTIFIER, "Expected variable name")?;

        let initializer: Option<Expr> = match self.advance_if(TokenType::EQUAL) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.expect(TokenType::SEMICOLON, "Expected ';' after variable declaration")?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statements ─────────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> Result<Stmt> {
        let keyword: Token = self.peek().clone();

        let parse: fn(&mut Self, Token) -> Result<Stmt> = match keyword.token_type {
            TokenType::FOR => Self::for_statement,
            TokenType::IF => Self::if_statement,
            TokenType::PRINT => Self::print_statement,
            TokenType::RETURN => Self::return_statement,
            TokenType::WHILE => Self::while_statement,
            TokenType::LEFT_BRACE => Self::block_statement,
            _ => return self.expression_statement(),
        };

        debug!("{} statement at line {}", keyword.lexeme, keyword.line);
        self.advance();
        parse(self, keyword)
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`, with `true` for a missing
    /// condition.
    fn for_statement(&mut self, keyword: Token) -> Result<Stmt> {
        self.expect(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer: Option<Stmt> = match self.peek().token_type {
            TokenType::SEMICOLON => {
                self.advance();
                None
            }
            TokenType::VAR => {
                self.advance();
                Some(self.var_declaration()?)
            }
            _ => Some(self.expression_statement()?),
        };

        let condition: Expr = self
            .optional_expression(TokenType::SEMICOLON)?
            .unwrap_or_else(|| Expr::literal(LiteralValue::True, keyword.line));
        self.expect(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment: Option<Expr> = self.optional_expression(TokenType::RIGHT_PAREN)?;
        self.expect(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let mut lowered: Stmt = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            lowered = Stmt::Block(vec![initializer, lowered]);
        }

        Ok(lowered)
    }

    fn if_statement(&mut self, _keyword: Token) -> Result<Stmt> {
        let condition: Expr = self.parenthesized("if")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = match self.advance_if(TokenType::ELSE) {
            Some(_) => Some(Box::new(self.statement()?)),
            None => None,
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self, _keyword: Token) -> Result<Stmt> {
        let value: Expr = self.expression()?;
        self.expect(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt> {
        let value: Option<Expr> = self.optional_expression(TokenType::SEMICOLON)?;
        self.expect(TokenType::SEMICOLON, "Expected ';' after return value")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self, _keyword: Token) -> Result<Stmt> {
        let condition: Expr = self.parenthesized("while")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn block_statement(&mut self, _brace: Token) -> Result<Stmt> {
        Ok(Stmt::Block(self.block()?))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.expect(TokenType::SEMICOLON, "Expected ';' after expression")?;

        Ok(Stmt::Expression(expr))
    }

    /// Declarations up to and including the closing `}`; the `{` is already
    /// consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.expect(TokenType::RIGHT_BRACE, "Expected '}' after block")?;
        Ok(statements)
    }

    /// `( expression )` after `if` / `while`.
    fn parenthesized(&mut self, after: &str) -> Result<Expr> {
        self.expect(TokenType::LEFT_PAREN, &format!("Expected '(' after '{}'", after))?;
        let condition: Expr = self.expression()?;
        self.expect(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        Ok(condition)
    }

    /// An expression, unless the next token is `terminator`.
    fn optional_expression(&mut self, terminator: TokenType) -> Result<Option<Expr>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.expression().map(Some)
        }
    }

    // ───────────────────────── expressions ────────────────────────

    fn expression(&mut self) -> Result<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let mut target: Expr = self.or()?;

        let Some(equals) = self.advance_if(TokenType::EQUAL) else {
            return Ok(target);
        };

        let value: Expr = ensure_sufficient_stack(|| self.assignment())?;

        match target {
            Expr::Variable { ref name, .. } => Ok(Expr::assign(name.clone(), value)),

            Expr::Get {
                ref mut object,
                ref name,
            } => {
                let placeholder: Box<Expr> = Box::new(Expr::literal(LiteralValue::Nil, name.line));
                Ok(Expr::Set {
                    object: std::mem::replace(object, placeholder),
                    name: name.clone(),
                    value: Box::new(value),
                })
            }

            // Reported, but the parser is not confused: keep going.
            other => {
                self.error(&equals, "Invalid assignment target");
                Ok(other)
            }
        }
    }

    fn or(&mut self) -> Result<Expr> {
        self.left_assoc(&[TokenType::OR], Self::and, logical)
    }

    fn and(&mut self) -> Result<Expr> {
        self.left_assoc(&[TokenType::AND], Self::equality, logical)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.left_assoc(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
            binary,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.left_assoc(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
            binary,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.left_assoc(&[TokenType::MINUS, TokenType::PLUS], Self::factor, binary)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.left_assoc(&[TokenType::SLASH, TokenType::STAR], Self::unary, binary)
    }

    /// `next ( op next )*`, folded to the left.
    fn left_assoc(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<Expr>,
        combine: Combine,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while operators.contains(&self.peek().token_type) {
            let operator: Token = self.advance().clone();
            let right: Expr = next(self)?;
            expr = combine(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.peek().token_type {
            TokenType::BANG | TokenType::MINUS => {
                let operator: Token = self.advance().clone();
                let right: Expr = ensure_sufficient_stack(|| self.unary())?;

                Ok(Expr::Unary {
                    operator,
                    right: Box::new(right),
                })
            }
            _ => self.call(),
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.advance_if(TokenType::LEFT_PAREN).is_some() {
                let (arguments, paren) =
                    self.comma_list("arguments", "Expected ')' after arguments", Self::expression)?;

                expr = Expr::Call {
                    callee: Box::new(expr),
                    paren,
                    arguments,
                };
            } else if self.advance_if(TokenType::DOT).is_some() {
                let name: Token =
                    self.expect(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: Token = self.peek().clone();

        let expr: Expr = match token.token_type {
            TokenType::FALSE => Expr::literal(LiteralValue::False, token.line),
            TokenType::TRUE => Expr::literal(LiteralValue::True, token.line),
            TokenType::NIL => Expr::literal(LiteralValue::Nil, token.line),
            TokenType::NUMBER(n) => Expr::literal(LiteralValue::Number(n), token.line),
            TokenType::STRING(ref s) => Expr::literal(LiteralValue::Str(s.clone()), token.line),
            TokenType::THIS => Expr::this(token),
            TokenType::IDENTIFIER => Expr::variable(token),

            TokenType::SUPER => {
                self.advance();
                self.expect(TokenType::DOT, "Expected '.' after 'super'")?;
                let method: Token =
                    self.expect(TokenType::IDENTIFIER, "Expected superclass method name")?;
                return Ok(Expr::super_(token, method));
            }

            TokenType::LEFT_PAREN => {
                self.advance();
                let inner: Expr = self.expression()?;
                self.expect(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }

            _ => return Err(LoxError::parse(&token, "Expected expression")),
        };

        self.advance();
        Ok(expr)
    }

    /// Comma‑separated items up to `)`, whose token is returned alongside.
    /// More than [`MAX_ARITY`] items is reported but not fatal.
    fn comma_list<T>(
        &mut self,
        what: &str,
        closing: &str,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<(Vec<T>, Token)> {
        let mut items: Vec<T> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if items.len() >= MAX_ARITY {
                    let at: Token = self.peek().clone();
                    self.error(&at, &format!("Can't have more than {} {}", MAX_ARITY, what));
                }

                items.push(item(self)?);

                if self.advance_if(TokenType::COMMA).is_none() {
                    break;
                }
            }
        }

        let paren: Token = self.expect(TokenType::RIGHT_PAREN, closing)?;
        Ok((items, paren))
    }

    // ─────────────────────────── cursor ───────────────────────────

    /// Record a non‑fatal error and keep parsing.
    fn error(&mut self, token: &Token, message: &str) {
        debug!("Recording parse error at line {}: {}", token.line, message);
        self.errors.push(LoxError::parse(token, message));
    }

    fn expect(&mut self, kind: TokenType, message: &str) -> Result<Token> {
        match self.advance_if(kind) {
            Some(token) => Ok(token),
            None => {
                debug!("expect failed at line {}: {}", self.peek().line, message);
                Err(LoxError::parse(self.peek(), message))
            }
        }
    }

    /// Consume and return the next token if it is of `kind`.
    fn advance_if(&mut self, kind: TokenType) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance().clone())
        } else {
            None
        }
    }

    #[inline(always)]
    fn check(&self, kind: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == kind
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current.saturating_sub(1)]
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Skip past the failing token, then stop after a `;` or before a
    /// keyword that starts a statement.
    fn synchronize(&mut self) {
        let mut previous: TokenType = self.advance().token_type.clone();

        while !self.is_at_end() {
            if previous == TokenType::SEMICOLON {
                return;
            }

            if matches!(
                self.peek().token_type,
                TokenType::CLASS
                    | TokenType::FUN
                    | TokenType::VAR
                    | TokenType::FOR
                    | TokenType::IF
                    | TokenType::WHILE
                    | TokenType::PRINT
                    | TokenType::RETURN
            ) {
                return;
            }

            previous = self.advance().token_type.clone();
        }
    }
}

fn binary(left: Box<Expr>, operator: Token, right: Box<Expr>) -> Expr {
    Expr::Binary {
        left,
        operator,
        right,
    }
}

fn logical(left: Box<Expr>, operator: Token, right: Box<Expr>) -> Expr {
    Expr::Logical {
        left,
        operator,
        right,
    }
}
