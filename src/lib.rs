// Bisaya++ Language Interpreter Library
//
// Core of the interpreter for Bisaya++, a small imperative teaching language
// with Cebuano keywords: lexer, recursive-descent parser, and a tree-walking
// evaluator over a chained scope store with per-variable declared types.

// Public modules
pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use environment::{EnvError, Environment, FrameId};
pub use error::{BisayaError, ErrorKind, Span};
pub use evaluator::Evaluator;
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::{DeclaredType, Value};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{run, run_source, RunError};
