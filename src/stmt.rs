use std::rc::Rc;

use serde::Serialize;

use crate::expr::Expr;
use crate::token::Token;

/// A function or method declaration.
///
/// Shared (`Rc`) between the syntax tree and every runtime function value
/// created from it, so closures never copy their body.
#[derive(Debug, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** for *statements* (complete executable
/// constructs).  A program is a sequence of these nodes returned by
/// [`Parser::parse`](crate::parser::Parser::parse).
///
/// `for` loops have no node of their own; the parser lowers them to
/// `Block` + `While`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    Class {
        name: Token,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `print` statement used for output.
    Print(Expr),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Optional expression to return.
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// `while` loop.
    While { condition: Expr, body: Box<Stmt> },
}

impl Stmt {
    /// Lower‑case kind name for log records.
    pub fn name(&self) -> &'static str {
        match self {
            Stmt::Block(_) => "block",
            Stmt::Class { .. } => "class",
            Stmt::Expression(_) => "expression",
            Stmt::Function(_) => "function",
            Stmt::If { .. } => "if",
            Stmt::Print(_) => "print",
            Stmt::Return { .. } => "return",
            Stmt::Var { .. } => "var",
            Stmt::While { .. } => "while",
        }
    }

    /// Move nested statements into `pending`. Function bodies are only taken
    /// when no runtime function still shares the declaration.
    fn detach_children(&mut self, pending: &mut Vec<Stmt>) {
        match self {
            Stmt::Block(statements) => pending.append(statements),

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                detach(then_branch, pending);
                if let Some(else_branch) = else_branch {
                    detach(else_branch, pending);
                }
            }

            Stmt::While { body, .. } => detach(body, pending),

            Stmt::Function(declaration) => take_body(declaration, pending),

            Stmt::Class { methods, .. } => {
                for method in methods {
                    take_body(method, pending);
                }
            }

            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Return { .. } | Stmt::Var { .. } => {}
        }
    }
}

fn detach(child: &mut Box<Stmt>, pending: &mut Vec<Stmt>) {
    if matches!(child.as_ref(), Stmt::Block(statements) if statements.is_empty()) {
        return;
    }

    let placeholder: Box<Stmt> = Box::new(Stmt::Block(Vec::new()));
    pending.push(*std::mem::replace(child, placeholder));
}

fn take_body(declaration: &mut Rc<FunctionDecl>, pending: &mut Vec<Stmt>) {
    if let Some(declaration) = Rc::get_mut(declaration) {
        pending.append(&mut declaration.body);
    }
}

/// Deeply nested blocks are dropped from a worklist, as [`Expr`] is.
impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending: Vec<Stmt> = Vec::new();
        self.detach_children(&mut pending);

        while let Some(mut stmt) = pending.pop() {
            stmt.detach_children(&mut pending);
        }
    }
}
