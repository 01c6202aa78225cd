//! Abstract Syntax Tree Types
//!
//! This module defines the command tree produced by the parser.
//! Both sum types are closed: the resolver and interpreter dispatch
//! with exhaustive matches, never through trait objects.

// =============================================================================
// ARGUMENTS
// =============================================================================

/// A single argument position in a simple command.
///
/// Arguments are resolved to an ordered list of strings at execution
/// time; see the interpreter's resolver. A `Word` resolves to itself,
/// variables resolve to their stored list, and `Concatenate` joins the
/// two sides element-wise.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Literal unquoted word.
    Word(String),
    /// Quoted word, still carrying its surrounding single quotes.
    /// Unquoting (and `''` → `'`) happens at resolution.
    QuotedWord(String),
    /// `$name`, expanding to the stored list.
    Variable(String),
    /// `$#name`, expanding to the element count as one decimal word.
    VariableCount(String),
    /// `$"name`, expanding to the list joined by spaces, as one word.
    VariableString(String),
    /// `$name(1 3 …)`: 1-based index selection.
    VariableSubscript {
        key: String,
        fields: Box<Argument>,
    },
    /// Two adjacent primaries joined by an explicit or free caret.
    Concatenate {
        lhs: Box<Argument>,
        rhs: Box<Argument>,
    },
    /// `(a b c)`: a grouped sequence; nested lists are flattened by
    /// the parser.
    List(Vec<Argument>),
    /// `` `{cmds} ``: run the commands, split captured stdout on `$ifs`.
    Substitution(Vec<Command>),
}

// =============================================================================
// COMMANDS
// =============================================================================

/// One node of the command tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Arguments, redirections, and command-scoped assignments.
    Simple(SimpleCommand),
    /// `fn name { body }`. The body is kept as raw source and re-parsed
    /// when the function is called.
    Function { name: String, body: String },
    /// A statement-level `key=value`.
    Assignment { key: String, value: Argument },
    /// `{ a; b }`
    Group(Vec<Command>),
    /// Sentinel emitted for `&&`: run the following command only when
    /// `$status` is zero.
    IfZero,
    /// Sentinel emitted for `||`: run the following command only when
    /// `$status` is nonzero.
    IfNonzero,
    /// `lhs | rhs`
    Pipe {
        lhs: Box<Command>,
        rhs: Box<Command>,
    },
}

/// A simple command: `a=1 b=2 name arg … <in >out`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleCommand {
    pub arguments: Vec<Argument>,
    pub redirections: Vec<Redirection>,
    /// Assignments scoped to this command's execution.
    pub assignments: Vec<Assignment>,
}

/// `key=value`, either statement-level or as a simple command prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub value: Argument,
}

// =============================================================================
// REDIRECTIONS
// =============================================================================

/// Which way a redirection points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// A single redirection on a simple command.
///
/// `file` is an unresolved argument: the aliasing form `>[2=1]` arrives
/// here as a concatenation whose resolved word begins with `[`, and the
/// interpreter decodes the numeric target when applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirection {
    pub direction: Direction,
    pub append: bool,
    pub fd: i32,
    pub file: Argument,
}

impl Redirection {
    /// Default target descriptor for a direction: stdin for `<`,
    /// stdout for `>`.
    pub fn default_fd(direction: Direction) -> i32 {
        match direction {
            Direction::In => 0,
            Direction::Out => 1,
        }
    }
}
