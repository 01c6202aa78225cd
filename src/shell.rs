//! Shell Facade
//!
//! Ties the parser and interpreter together behind the two contracts
//! the outside world uses: `exec(source) → status` and startup
//! configuration loading. The line editor, prompt rendering, and CLI
//! live outside; they only ever call into this type.

use std::path::{Path, PathBuf};

use crate::interpreter::redirect::FdGuard;
use crate::interpreter::{Environment, Interpreter};
use crate::parser::parse;

/// Options for creating a shell.
#[derive(Default)]
pub struct ShellOptions {
    /// Extra variables layered over the inherited environment.
    pub vars: Vec<(String, String)>,
    /// Working directory to enter before the first command.
    pub cwd: Option<String>,
}

/// The shell: one environment, executed into by successive sources.
pub struct Shell {
    env: Environment,
}

impl Shell {
    pub fn new(options: ShellOptions) -> Self {
        if let Some(cwd) = &options.cwd {
            if let Err(err) = std::env::set_current_dir(cwd) {
                eprintln!("rz: cannot enter {}: {}", cwd, err);
            }
        }
        let mut env = Environment::from_process();
        for (key, value) in options.vars {
            env.set(key, value);
        }
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Parse and execute one source string. A syntax error at this
    /// level reports, sets `$status`, and returns 255; execution errors
    /// inside the source are handled statement by statement.
    pub fn exec(&mut self, source: &str) -> i32 {
        let commands = match parse(source) {
            Ok(commands) => commands,
            Err(err) => {
                eprintln!("rz: {}", err);
                self.env.set_status(255);
                return 255;
            }
        };
        // Restore stdio even if something inside leaks a descriptor.
        let _guard = FdGuard::new().ok();
        Interpreter::new(&mut self.env).exec(&commands)
    }

    /// Execute the startup configuration files, skipping missing ones:
    /// `/etc/rz/config.rz`, then `<dir>/rz/config.rz` for each entry of
    /// `XDG_DATA_DIRS`, then the user config under `XDG_CONFIG_HOME`
    /// (or `~/.config`).
    pub fn load_config(&mut self) {
        for path in config_paths(&self.env) {
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    tracing::debug!(path = %path.display(), "loading config");
                    self.exec(&source);
                }
                Err(_) => {
                    tracing::debug!(path = %path.display(), "no config file");
                }
            }
        }
    }

    /// Evaluate the `prompt` function if one is defined, then return
    /// the left prompt string (the first element of `$prompt`).
    pub fn prompt(&mut self) -> String {
        if self.env.function_body("prompt").is_some() {
            let _ = self.exec("prompt");
        }
        self.env
            .get_list("prompt")
            .into_iter()
            .next()
            .unwrap_or_else(|| "> ".to_string())
    }
}

fn config_paths(env: &Environment) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/rz/config.rz")];
    if let Some(dirs) = env.get("XDG_DATA_DIRS") {
        for dir in dirs.split(':').filter(|d| !d.is_empty()) {
            paths.push(Path::new(dir).join("rz/config.rz"));
        }
    }
    let config_home = match env.get("XDG_CONFIG_HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => env.get("HOME").map(|home| Path::new(home).join(".config")),
    };
    if let Some(home) = config_home {
        paths.push(home.join("rz/config.rz"));
    }
    paths
}
