use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, error, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::Scanner;
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Where `--log` writes its records
    #[arg(long, global = true, value_name = "PATH", default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file as a program (or a lone expression) and prints its AST
    Parse {
        filename: Option<PathBuf>,

        /// Print the tree as JSON instead of prefix notation
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Write to file with module and source line; RUST_LOG overrides the level.
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn report(errors: &[LoxError]) -> i32 {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }

    errors.iter().map(LoxError::exit_code).max().unwrap_or(0)
}

fn no_file() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str) -> i32 {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if tokenized {
        0
    } else {
        65
    }
}

fn parse(source: &str, json: bool) -> Result<i32> {
    let tokens: Vec<Token> = match rox::scan(source) {
        Ok(tokens) => tokens,
        Err(errors) => return Ok(report(&errors)),
    };

    let errors: Vec<LoxError> = match Parser::new(tokens.clone()).parse() {
        Ok(program) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&program).context("Failed to serialize AST")?
                );
            } else if !program.is_empty() {
                println!("{}", AstPrinter::print_program(&program));
            }
            return Ok(0);
        }
        Err(errors) => errors,
    };

    // Input such as `1 + 2` is not a program but is a valid expression.
    match Parser::new(tokens).parse_expression() {
        Ok(expr) => {
            debug!("Input parsed as a single expression");
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&expr).context("Failed to serialize AST")?
                );
            } else {
                println!("{}", AstPrinter::print(&expr));
            }
            Ok(0)
        }
        Err(_) => Ok(report(&errors)),
    }
}

fn evaluate(source: &str) -> i32 {
    let tokens: Vec<Token> = match rox::scan(source) {
        Ok(tokens) => tokens,
        Err(errors) => return report(&errors),
    };

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => return report(&[e]),
    };

    let mut interpreter = Interpreter::new();

    if let Err(errors) = Resolver::new(&mut interpreter).resolve_expression(&expr) {
        return report(&errors);
    }

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => report(&[LoxError::Runtime(e)]),
    }
}

fn run(source: &str) -> i32 {
    let mut interpreter = Interpreter::new();

    match rox::run(&mut interpreter, source) {
        Ok(()) => {
            info!("Program executed successfully");
            0
        }
        Err(errors) => report(&errors),
    }
}

fn repl() -> Result<i32> {
    let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
    let mut interpreter = Interpreter::new();

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());

                if let Err(errors) = rox::run(&mut interpreter, &line) {
                    report(&errors);

                    let fatal = errors
                        .iter()
                        .any(|e| matches!(e, LoxError::Runtime(r) if r.is_fatal()));
                    if fatal {
                        return Ok(70);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("Line editor failed"),
        }
    }

    Ok(0)
}

fn execute(commands: Commands) -> Result<i32> {
    let code: i32 = match commands {
        Commands::Tokenize { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_file()))?;
            tokenize(&source)
        }

        Commands::Parse { filename, json } => {
            let source = read_file(filename.unwrap_or_else(|| no_file()))?;
            parse(&source, json)?
        }

        Commands::Evaluate { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_file()))?;
            evaluate(&source)
        }

        Commands::Run { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_file()))?;
            run(&source)
        }

        Commands::Repl => repl()?,
    };

    Ok(code)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    // Anything that escapes as `anyhow::Error` is host I/O.
    let code: i32 = execute(args.commands).unwrap_or_else(|e| {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        74
    });

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
