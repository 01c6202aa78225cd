//! rz - An rc-flavored interactive command shell
//!
//! This library provides the shell core: a lexer and parser for the
//! rc-derived surface syntax, and a tree-walking interpreter that
//! executes the resulting command tree as builtins, user functions,
//! and real child processes.

pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod shell;

pub use ast::types::{Argument, Command};
pub use interpreter::{Environment, Interpreter};
pub use parser::{parse, SyntaxError};
pub use shell::{Shell, ShellOptions};
