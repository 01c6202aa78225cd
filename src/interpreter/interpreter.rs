//! Interpreter
//!
//! Tree-walking execution over the command list. Commands run strictly
//! in source order; `$status` tracks the most recent non-assignment,
//! non-prompt command; the `&&`/`||` sentinels read it to decide
//! whether the following command runs at all.
//!
//! Dispatch order for a simple command: the `prompt` marker, the
//! `builtin` escape, functions stored under `fn#<name>`, builtins,
//! then an external child process.

use crate::ast::types::{Command, SimpleCommand};
use crate::interpreter::builtins;
use crate::interpreter::env::Environment;
use crate::interpreter::errors::ExecError;
use crate::interpreter::pipeline;
use crate::interpreter::redirect::{apply_redirection, FdGuard};
use crate::interpreter::resolve::resolve_argument;
use crate::interpreter::spawn;

/// One execution pass over a parsed command list. Construct per
/// top-level entry so prompt mode cannot leak across invocations.
pub struct Interpreter<'e> {
    env: &'e mut Environment,
    prompt_mode: bool,
}

impl<'e> Interpreter<'e> {
    pub fn new(env: &'e mut Environment) -> Self {
        Self {
            env,
            prompt_mode: false,
        }
    }

    pub fn env(&self) -> &Environment {
        self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        self.env
    }

    /// Execute a command list, returning the final status.
    pub fn exec(&mut self, commands: &[Command]) -> i32 {
        let mut status = self.env.status().parse().unwrap_or(0);
        let mut skip = false;

        for command in commands {
            match command {
                Command::IfZero => {
                    skip = self.env.status() != "0";
                    continue;
                }
                Command::IfNonzero => {
                    skip = self.env.status() == "0";
                    continue;
                }
                _ => {}
            }
            if std::mem::take(&mut skip) {
                continue;
            }

            status = self.exec_command(command);
            if !self.prompt_mode && !matches!(command, Command::Assignment { .. }) {
                self.env.set_status(status);
            }
        }
        status
    }

    fn exec_command(&mut self, command: &Command) -> i32 {
        match command {
            Command::Assignment { key, value } => match resolve_argument(self, value) {
                Ok(elements) => {
                    self.env.set_list(key.clone(), &elements);
                    0
                }
                Err(err) => report(&err),
            },
            Command::Function { name, body } => {
                self.env.define_function(name, body.clone());
                0
            }
            Command::Group(body) => self.exec(body),
            Command::Pipe { lhs, rhs } => pipeline::run_pipeline(self, lhs, rhs),
            Command::Simple(simple) => self.exec_simple(simple),
            // Sentinels are consumed by exec above.
            Command::IfZero | Command::IfNonzero => 0,
        }
    }

    /// A simple command: apply the local assignments, run, then remove
    /// their keys on every exit path.
    fn exec_simple(&mut self, simple: &SimpleCommand) -> i32 {
        let mut local_keys = Vec::new();
        let mut status = None;
        for assignment in &simple.assignments {
            match resolve_argument(self, &assignment.value) {
                Ok(elements) => {
                    self.env.set_list(assignment.key.clone(), &elements);
                    local_keys.push(assignment.key.clone());
                }
                Err(err) => {
                    status = Some(report(&err));
                    break;
                }
            }
        }

        let status = status.unwrap_or_else(|| self.exec_simple_redirected(simple));

        for key in &local_keys {
            self.env.remove(key);
        }
        status
    }

    fn exec_simple_redirected(&mut self, simple: &SimpleCommand) -> i32 {
        let mut argv = Vec::new();
        for argument in &simple.arguments {
            match resolve_argument(self, argument) {
                Ok(words) => argv.extend(words),
                Err(err) => return report(&err),
            }
        }
        if argv.is_empty() {
            return 0;
        }

        let _guard;
        if !simple.redirections.is_empty() {
            _guard = match FdGuard::new() {
                Ok(guard) => guard,
                Err(err) => return report(&err),
            };
            for redirection in &simple.redirections {
                let targets = match resolve_argument(self, &redirection.file) {
                    Ok(targets) => targets,
                    Err(err) => return report(&err),
                };
                if targets.len() != 1 {
                    return report(&ExecError::syntax("redirection needs one target"));
                }
                if let Err(err) = apply_redirection(
                    redirection.fd,
                    redirection.direction,
                    redirection.append,
                    &targets[0],
                ) {
                    return report(&err);
                }
            }
        }

        self.dispatch(&argv)
    }

    fn dispatch(&mut self, argv: &[String]) -> i32 {
        if argv[0] == "prompt" {
            // Suppress $status updates for the rest of this invocation
            // so the prompt does not clobber the visible exit code.
            self.prompt_mode = true;
        }

        if argv[0] == "builtin" {
            let rest = &argv[1..];
            if rest.is_empty() {
                eprintln!("rz: builtin: missing command");
                return 1;
            }
            return match builtins::dispatch(self.env, rest) {
                Some(status) => status,
                None => {
                    eprintln!("rz: builtin: not a builtin: {}", rest[0]);
                    1
                }
            };
        }

        if let Some(body) = self.env.function_body(&argv[0]).map(str::to_string) {
            return self.call_function(&body, &argv[1..]);
        }

        if let Some(status) = builtins::dispatch(self.env, argv) {
            return status;
        }

        spawn::spawn_external(self.env, argv)
    }

    /// Run a stored function body: rebind `$*` to the call arguments,
    /// re-parse the body, execute, and restore `$*` (or its absence).
    fn call_function(&mut self, body: &str, args: &[String]) -> i32 {
        let saved = self.env.get("*").map(str::to_string);
        self.env.set_list("*", args);

        let status = match crate::parser::parse(body) {
            Ok(commands) => self.exec(&commands),
            Err(err) => {
                eprintln!("rz: {}", err);
                1
            }
        };

        match saved {
            Some(value) => self.env.set("*", value),
            None => {
                self.env.remove("*");
            }
        }
        status
    }
}

fn report(err: &ExecError) -> i32 {
    eprintln!("rz: {}", err);
    tracing::debug!(%err, "command failed");
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::redirect::FD_LOCK;
    use crate::parser::parse;

    fn run(env: &mut Environment, source: &str) -> i32 {
        let commands = parse(source).unwrap();
        Interpreter::new(env).exec(&commands)
    }

    fn tmp(name: &str) -> String {
        format!("/tmp/rz_test_{}_{}", std::process::id(), name)
    }

    fn read_and_remove(path: &str) -> String {
        let content = std::fs::read_to_string(path).unwrap();
        let _ = std::fs::remove_file(path);
        content
    }

    #[test]
    fn test_echo_hello_world() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("hello");
        let status = run(&mut env, &format!("echo hello world > {}", out));
        assert_eq!(status, 0);
        assert_eq!(env.status(), "0");
        assert_eq!(read_and_remove(&out), "hello world\n");
    }

    #[test]
    fn test_assignment_and_expansion() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("assign");
        let status = run(&mut env, &format!("foo=bar; echo $foo > {}", out));
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "bar\n");
        assert_eq!(env.get("foo"), Some("bar"));
    }

    #[test]
    fn test_list_count_string_subscript() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("list");
        let status = run(
            &mut env,
            &format!("xs=(a b c); echo $#xs $\"xs $xs(2) > {}", out),
        );
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "3 a b c b\n");
    }

    #[test]
    fn test_redirect_out_then_in() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let first = tmp("redir1");
        let second = tmp("redir2");
        let status = run(
            &mut env,
            &format!("echo one > {f}; cat {f} > {g}", f = first, g = second),
        );
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&second), "one\n");
        let _ = std::fs::remove_file(&first);
    }

    #[test]
    fn test_append_redirection() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("append");
        run(&mut env, &format!("echo a > {f}; echo b >> {f}", f = out));
        assert_eq!(read_and_remove(&out), "a\nb\n");
    }

    #[test]
    fn test_function_call_with_positionals() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("func");
        let status = run(
            &mut env,
            &format!("fn g {{ echo $1 $2 }}; g hi there > {}", out),
        );
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "hi there\n");
        assert_eq!(env.function_body("g"), Some(" echo $1 $2 "));
    }

    #[test]
    fn test_function_restores_star() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("star");
        run(
            &mut env,
            &format!("*=(x y); fn f {{ true }}; f a b; echo $*(1) > {}", out),
        );
        assert_eq!(read_and_remove(&out), "x\n");
    }

    #[test]
    fn test_single_pipe() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("pipe");
        let status = run(&mut env, &format!("echo x | tr x y > {}", out));
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "y\n");
    }

    #[test]
    fn test_substitution_words() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("subst");
        let status = run(&mut env, &format!("echo `{{echo a b}} > {}", out));
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "a b\n");
    }

    #[test]
    fn test_missing_command_is_127() {
        let mut env = Environment::from_process();
        let status = run(&mut env, "rz_no_such_command_anywhere");
        assert_eq!(status, 127);
        assert_eq!(env.status(), "127");
    }

    #[test]
    fn test_short_circuit_and() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let skipped = tmp("and_skipped");
        let taken = tmp("and_taken");
        run(&mut env, &format!("false && echo yes > {}", skipped));
        assert!(!std::path::Path::new(&skipped).exists());
        run(&mut env, &format!("true && echo yes > {}", taken));
        assert_eq!(read_and_remove(&taken), "yes\n");
    }

    #[test]
    fn test_short_circuit_or() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let taken = tmp("or_taken");
        let skipped = tmp("or_skipped");
        run(&mut env, &format!("false || echo caught > {}", taken));
        assert_eq!(read_and_remove(&taken), "caught\n");
        run(&mut env, &format!("true || echo never > {}", skipped));
        assert!(!std::path::Path::new(&skipped).exists());
    }

    #[test]
    fn test_local_assignment_leaves_no_trace() {
        let mut env = Environment::from_process();
        let status = run(&mut env, "rz_local_k=v true");
        assert_eq!(status, 0);
        assert_eq!(env.get("rz_local_k"), None);
    }

    #[test]
    fn test_assignment_does_not_touch_status() {
        let mut env = Environment::from_process();
        run(&mut env, "false");
        assert_eq!(env.status(), "1");
        run(&mut env, "foo=bar");
        assert_eq!(env.status(), "1");
    }

    #[test]
    fn test_group_runs_in_order() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("group");
        run(&mut env, &format!("{{ echo a > {f}; echo b >> {f} }}", f = out));
        assert_eq!(read_and_remove(&out), "a\nb\n");
    }

    #[test]
    fn test_prompt_mode_suppresses_status() {
        let mut env = Environment::from_process();
        run(&mut env, "false");
        assert_eq!(env.status(), "1");
        run(&mut env, "fn prompt { true }; false");
        assert_eq!(env.status(), "1");
        // Evaluating the prompt leaves $status alone.
        run(&mut env, "prompt");
        assert_eq!(env.status(), "1");
    }

    #[test]
    fn test_builtin_escape() {
        let mut env = Environment::from_process();
        // A function named cd must not shadow the builtin when escaped.
        run(&mut env, "fn cd { false }");
        let status = run(&mut env, "builtin cd /");
        assert_eq!(status, 0);
        assert_eq!(env.get("PWD"), Some("/"));
    }

    #[test]
    fn test_bad_subscript_sets_nonzero_status() {
        let mut env = Environment::from_process();
        run(&mut env, "xs=(a b)");
        let status = run(&mut env, "echo $xs(nope)");
        assert_eq!(status, 1);
        assert_eq!(env.status(), "1");
    }

    #[test]
    fn test_fd_alias_redirection() {
        let _fd = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Environment::from_process();
        let out = tmp("alias");
        // Route stderr to the same file as stdout via >[2=1].
        let status = run(
            &mut env,
            &format!("sh -c 'echo oops 1>&2' > {} >[2=1]", out),
        );
        assert_eq!(status, 0);
        assert_eq!(read_and_remove(&out), "oops\n");
    }
}
