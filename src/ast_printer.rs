use crate::expr::{Expr, LiteralValue};
use crate::stack::ensure_sufficient_stack;
use crate::stmt::{FunctionDecl, Stmt};

/// Renders syntax trees in fully parenthesised prefix form, e.g.
/// `(* (- 123.0) (group 45.67))` or `(if-else (< a b) (print a) (print b))`.
/// Numbers always show a fractional part.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        ensure_sufficient_stack(|| Self::expr(expr))
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        ensure_sufficient_stack(|| Self::stmt(stmt))
    }

    /// One line per top-level statement.
    pub fn print_program(program: &[Stmt]) -> String {
        program
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => Self::sequence("(block", statements),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out: String = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    out.push_str(" < ");
                    out.push_str(&Self::print(superclass));
                }
                for method in methods {
                    out.push(' ');
                    out.push_str(&Self::function(method));
                }
                out.push(')');
                out
            }

            Stmt::Expression(expr) => Self::parenthesize(";", [expr]),
            Stmt::Function(declaration) => Self::function(declaration),
            Stmt::Print(expr) => Self::parenthesize("print", [expr]),

            Stmt::If {
                condition,
                then_branch,
                else_branch: None,
            } => format!("(if {} {})", Self::print(condition), Self::print_stmt(then_branch)),
            Stmt::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => format!(
                "(if-else {} {} {})",
                Self::print(condition),
                Self::print_stmt(then_branch),
                Self::print_stmt(else_branch)
            ),

            Stmt::Return { value: None, .. } => "(return)".to_string(),
            Stmt::Return {
                value: Some(value), ..
            } => Self::parenthesize("return", [value]),

            Stmt::Var {
                name,
                initializer: None,
            } => format!("(var {})", name.lexeme),
            Stmt::Var {
                name,
                initializer: Some(initializer),
            } => format!("(var {} = {})", name.lexeme, Self::print(initializer)),

            Stmt::While { condition, body } => {
                format!("(while {} {})", Self::print(condition), Self::print_stmt(body))
            }
        }
    }

    /// `(fun name(a b) body...)`
    fn function(declaration: &FunctionDecl) -> String {
        let params: Vec<&str> = declaration.params.iter().map(|p| p.lexeme.as_str()).collect();
        let head: String = format!("(fun {}({})", declaration.name.lexeme, params.join(" "));

        Self::sequence(&head, &declaration.body)
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut out: String = head.to_string();

        for statement in statements {
            out.push(' ');
            out.push_str(&Self::print_stmt(statement));
        }

        out.push(')');
        out
    }

    fn expr(expr: &Expr) -> String {
        match expr {
            Expr::Literal { value, .. } => Self::literal(value),

            Expr::Variable { name, .. } => name.lexeme.clone(),
            Expr::This { .. } => "this".to_string(),
            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Grouping(inner) => Self::parenthesize("group", [inner.as_ref()]),
            Expr::Unary { operator, right } => Self::parenthesize(&operator.lexeme, [right.as_ref()]),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => Self::parenthesize(&operator.lexeme, [left.as_ref(), right.as_ref()]),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }
            Expr::Call {
                callee, arguments, ..
            } => Self::parenthesize("call", std::iter::once(callee.as_ref()).chain(arguments)),
            Expr::Get { object, name } => {
                format!("(. {} {})", Self::print(object), name.lexeme)
            }
            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    fn literal(literal: &LiteralValue) -> String {
        match literal {
            LiteralValue::Number(n) if n.fract() == 0.0 => format!("{:.1}", n),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::Str(s) => s.clone(),
            LiteralValue::True => "true".to_string(),
            LiteralValue::False => "false".to_string(),
            LiteralValue::Nil => "nil".to_string(),
        }
    }

    fn parenthesize<'e>(name: &str, parts: impl IntoIterator<Item = &'e Expr>) -> String {
        let mut out: String = format!("({}", name);

        for part in parts {
            out.push(' ');
            out.push_str(&Self::print(part));
        }

        out.push(')');
        out
    }
}
