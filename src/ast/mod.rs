//! AST module
//!
//! Node types for the command tree shared by the parser and interpreter.

pub mod types;

pub use types::{Argument, Assignment, Command, Direction, Redirection, SimpleCommand};
