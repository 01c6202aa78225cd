//! External Commands
//!
//! Spawning a child process with the current environment and whatever
//! fd layout the redirections left in place, then mapping its exit kind
//! to a shell status: normal exit → code, anything else → 1, not found
//! → 127, permission denied → 1.

use std::io::ErrorKind;
use std::process::Command;

use crate::interpreter::env::Environment;

/// Spawn `argv` as a child process and wait for it.
pub fn spawn_external(env: &Environment, argv: &[String]) -> i32 {
    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    command.env_clear();
    command.envs(env.iter());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            eprintln!("rz: command not found: {}", argv[0]);
            tracing::debug!(command = %argv[0], "spawn failed: not found");
            return 127;
        }
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            eprintln!("rz: permission denied: {}", argv[0]);
            return 1;
        }
        Err(err) => {
            eprintln!("rz: {}: {}", argv[0], err);
            return 1;
        }
    };

    match child.wait() {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            tracing::warn!(command = %argv[0], %err, "wait failed");
            1
        }
    }
}
