use crate::ast::Program;
use crate::error::BisayaError;
use crate::evaluator::Evaluator;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 64;
pub const EXIT_STATIC_ERROR: i32 = 65;
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// Lexical or syntax diagnostics; nothing was executed.
    #[error("{} error(s) found before execution", .0.len())]
    Static(Vec<BisayaError>),
    #[error(transparent)]
    Runtime(BisayaError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => EXIT_STATIC_ERROR,
            RunError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }

    pub fn diagnostics(&self) -> &[BisayaError] {
        match self {
            RunError::Static(errors) => errors,
            RunError::Runtime(error) => std::slice::from_ref(error),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        for error in self.diagnostics() {
            error.report(source, filename);
        }
    }
}

/// Scans and parses `source`. Lexical errors stop before parsing; any
/// diagnostic from either stage rejects the program.
pub fn compile(source: &str) -> Result<Program, Vec<BisayaError>> {
    let (tokens, errors) = Lexer::new(source.to_string()).scan_tokens();
    if !errors.is_empty() {
        return Err(errors);
    }

    let (program, errors) = Parser::new(tokens).parse();
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(program)
}

/// Runs `source` against an existing evaluator.
pub fn execute<R: BufRead, W: Write>(
    source: &str,
    evaluator: &mut Evaluator<R, W>,
) -> Result<(), RunError> {
    let program = compile(source).map_err(RunError::Static)?;
    evaluator.interpret(&program).map_err(RunError::Runtime)
}

/// Runs `source` with the given input and output streams.
pub fn run_source<R: BufRead, W: Write>(source: &str, input: R, output: W) -> Result<W, RunError> {
    let mut evaluator = Evaluator::new(input, output);
    execute(source, &mut evaluator)?;
    Ok(evaluator.into_output())
}

/// Runs `source` on stdin/stdout, reports diagnostics to stderr and returns
/// the process exit code.
pub fn run(source: &str, filename: Option<&str>) -> i32 {
    let stdin = io::stdin();
    let mut evaluator = Evaluator::new(stdin.lock(), io::stdout());

    match execute(source, &mut evaluator) {
        Ok(()) => EXIT_OK,
        Err(error) => {
            debug!(exit_code = error.exit_code(), "run failed");
            error.report(source, filename);
            error.exit_code()
        }
    }
}

/// Prints the token stream, one token per line.
pub fn dump_tokens(source: &str) {
    let (tokens, _) = Lexer::new(source.to_string()).scan_tokens();
    for token in &tokens {
        println!("{}", describe_token(token));
    }
}

fn describe_token(token: &Token) -> String {
    match token.literal {
        Some(ref literal) => format!(
            "[line {}] {:?} {:?} => {}",
            token.line, token.token_type, token.lexeme, literal
        ),
        None => format!("[line {}] {:?} {:?}", token.line, token.token_type, token.lexeme),
    }
}
