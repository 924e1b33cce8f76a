pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stack;
pub mod stmt;
pub mod token;
pub mod value;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Scan `source`, returning the tokens or every lexical error.
pub fn scan(source: &str) -> Result<Vec<Token>, Vec<LoxError>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Scan and parse `source` into a program.
pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let tokens: Vec<Token> = scan(source)?;
    Parser::new(tokens).parse()
}

/// Run `source` against `interpreter`: scan → parse → resolve → interpret.
///
/// Static errors of every phase are returned together and nothing executes;
/// otherwise at most one runtime error is returned. Globals and resolved
/// bindings persist in `interpreter`, so successive calls behave like REPL
/// lines.
pub fn run(interpreter: &mut Interpreter, source: &str) -> Result<(), Vec<LoxError>> {
    let statements: Vec<Stmt> = parse(source)?;
    info!("Parsed {} statements", statements.len());

    Resolver::new(interpreter).resolve(&statements)?;

    interpreter.interpret(&statements).map_err(|e| {
        debug!("Runtime error: {}", e);
        vec![LoxError::Runtime(e)]
    })
}
