use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::token::Token;

/// Identity of a resolvable expression node.
///
/// The resolver's side table is keyed by this id rather than by the node's
/// structure: the same source text appearing twice may bind to different
/// scopes. Ids are unique for the whole process so that trees parsed at
/// different times (REPL lines) never collide in one interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    /// Hand out a never-before-seen id.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree; the
/// enclosing [`Expr::Literal`] keeps only the line of the originating
/// [`Token`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal (Lox’s `null`).
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*
/// in Lox.
///
/// Nodes that name a binding (`Variable`, `Assign`, `This`, `Super`) carry an
/// [`ExprId`] so the resolver can annotate them with a scope distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,
        right: Box<Expr>,
    },

    /// Function‑, method‑ or constructor‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal { value: LiteralValue, line: usize },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `super.method` inside a subclass method.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// The 'this' keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Variable access ‑ resolves to the identifier’s current value at runtime.
    Variable { id: ExprId, name: Token },
}

impl Expr {
    pub fn literal(value: LiteralValue, line: usize) -> Self {
        Expr::Literal { value, line }
    }

    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }

    pub fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            id: ExprId::fresh(),
            name,
            value: Box::new(value),
        }
    }

    pub fn this(keyword: Token) -> Self {
        Expr::This {
            id: ExprId::fresh(),
            keyword,
        }
    }

    pub fn super_(keyword: Token, method: Token) -> Self {
        Expr::Super {
            id: ExprId::fresh(),
            keyword,
            method,
        }
    }

    /// Source line best describing this expression, for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Assign { name, .. } => name.line,

            Expr::Binary { operator, .. } => operator.line,

            Expr::Call { paren, .. } => paren.line,

            Expr::Get { name, .. } => name.line,

            Expr::Grouping(expr) => expr.line(),

            Expr::Literal { line, .. } => *line,

            Expr::Logical { operator, .. } => operator.line,

            Expr::Set { name, .. } => name.line,

            Expr::Super { keyword, .. } => keyword.line,

            Expr::This { keyword, .. } => keyword.line,

            Expr::Unary { operator, .. } => operator.line,

            Expr::Variable { name, .. } => name.line,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::Literal { .. } | Expr::Super { .. } | Expr::This { .. } | Expr::Variable { .. }
        )
    }

    /// Move every compound child into `pending`, leaving leaves behind.
    fn detach_children(&mut self, pending: &mut Vec<Expr>) {
        match self {
            Expr::Assign { value: child, .. }
            | Expr::Get { object: child, .. }
            | Expr::Grouping(child)
            | Expr::Unary { right: child, .. } => detach(child, pending),

            Expr::Binary { left, right, .. }
            | Expr::Logical { left, right, .. }
            | Expr::Set {
                object: left,
                value: right,
                ..
            } => {
                detach(left, pending);
                detach(right, pending);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                detach(callee, pending);
                pending.append(arguments);
            }

            Expr::Literal { .. } | Expr::Super { .. } | Expr::This { .. } | Expr::Variable { .. } => {}
        }
    }
}

fn detach(child: &mut Box<Expr>, pending: &mut Vec<Expr>) {
    if !child.is_leaf() {
        let placeholder: Box<Expr> = Box::new(Expr::literal(LiteralValue::Nil, 0));
        pending.push(*std::mem::replace(child, placeholder));
    }
}

/// A chain like `0 + 1 + 1 + ...` nests once per operator. Dropping it through
/// the derived glue would recurse that deep, so subtrees are unhooked onto a
/// worklist and dropped one node at a time.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending: Vec<Expr> = Vec::new();
        self.detach_children(&mut pending);

        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}
