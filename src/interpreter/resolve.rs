//! Argument Resolution
//!
//! Maps each AST argument to an ordered sequence of words. This is the
//! interpreter's workhorse: everything a simple command executes with
//! (argv, redirection targets, assignment values) goes through here.
//!
//! List semantics throughout: a variable expands to all its elements, a
//! concatenation cross-joins its sides (pairwise when equal length,
//! distributing a singleton otherwise), and a substitution splits the
//! captured output on the `$ifs` separator bytes.

use crate::ast::types::Argument;
use crate::interpreter::errors::ExecError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::pipeline;

/// Resolve one argument to its word sequence.
pub fn resolve_argument(
    interp: &mut Interpreter,
    argument: &Argument,
) -> Result<Vec<String>, ExecError> {
    match argument {
        Argument::Word(word) => Ok(vec![word.clone()]),

        Argument::QuotedWord(quoted) => {
            let bytes = quoted.as_bytes();
            if bytes.len() < 2 {
                return Ok(Vec::new());
            }
            let inner = String::from_utf8_lossy(&bytes[1..bytes.len() - 1]);
            Ok(vec![inner.replace("''", "'")])
        }

        Argument::Variable(name) => {
            // Positional parameters go through $*: $1 is $*(1).
            if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                let index: usize = name
                    .parse()
                    .map_err(|_| ExecError::syntax(format!("bad positional `${}`", name)))?;
                let list = interp.env().get_list("*");
                if index >= 1 && index <= list.len() {
                    return Ok(vec![list[index - 1].clone()]);
                }
                return Ok(Vec::new());
            }
            Ok(interp.env().get_list(name))
        }

        Argument::VariableCount(name) => match interp.env().get(name) {
            None => Ok(vec!["0".to_string()]),
            Some(value) => {
                let count = value.bytes().filter(|b| *b == 1).count() + 1;
                Ok(vec![count.to_string()])
            }
        },

        Argument::VariableString(name) => match interp.env().get(name) {
            None => Ok(Vec::new()),
            Some(value) => Ok(vec![value.replace('\u{1}', " ")]),
        },

        Argument::VariableSubscript { key, fields } => {
            let indices = resolve_argument(interp, fields)?;
            let list = interp.env().get_list(key);
            let mut selected = Vec::new();
            for field in &indices {
                let index: usize = field
                    .parse()
                    .map_err(|_| ExecError::syntax(format!("bad subscript `{}`", field)))?;
                if index >= 1 && index <= list.len() {
                    selected.push(list[index - 1].clone());
                }
            }
            Ok(selected)
        }

        Argument::Concatenate { lhs, rhs } => {
            let left = resolve_argument(interp, lhs)?;
            let right = resolve_argument(interp, rhs)?;
            concatenate(left, right)
        }

        Argument::List(items) => {
            let mut words = Vec::new();
            for item in items {
                words.extend(resolve_argument(interp, item)?);
            }
            Ok(words)
        }

        Argument::Substitution(commands) => {
            let output = pipeline::capture_substitution(interp, commands)?;
            let separators = interp.env().ifs_separators();
            Ok(split_fields(&output, &separators))
        }
    }
}

/// Cross-product join of two resolved lists.
fn concatenate(left: Vec<String>, right: Vec<String>) -> Result<Vec<String>, ExecError> {
    if left.is_empty() || right.is_empty() {
        return Err(ExecError::syntax("null list in concatenation"));
    }
    if left.len() == right.len() {
        return Ok(left
            .into_iter()
            .zip(right)
            .map(|(a, b)| format!("{}{}", a, b))
            .collect());
    }
    if right.len() == 1 {
        let suffix = &right[0];
        return Ok(left.into_iter().map(|a| format!("{}{}", a, suffix)).collect());
    }
    if left.len() == 1 {
        let prefix = &left[0];
        return Ok(right.into_iter().map(|b| format!("{}{}", prefix, b)).collect());
    }
    Err(ExecError::syntax(format!(
        "mismatched list lengths in concatenation ({} and {})",
        left.len(),
        right.len()
    )))
}

/// Split captured output on the separator bytes; empty fields drop out.
fn split_fields(output: &[u8], separators: &[u8]) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = Vec::new();
    for byte in output {
        if separators.contains(byte) {
            if !current.is_empty() {
                fields.push(String::from_utf8_lossy(&current).into_owned());
                current.clear();
            }
        } else {
            current.push(*byte);
        }
    }
    if !current.is_empty() {
        fields.push(String::from_utf8_lossy(&current).into_owned());
    }
    fields
}
