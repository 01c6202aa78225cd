//! Environment
//!
//! The process-wide name → value mapping threaded through the
//! interpreter. Values are byte strings; list values join their
//! elements with `0x01`. The empty list is the *absence* of the key:
//! storing an empty list removes it. Function bodies live under
//! `fn#<name>` as raw source, which also exports them to child shells.

use std::collections::HashMap;

/// Separator byte for list-valued entries.
pub const LIST_SEP: char = '\u{1}';

/// Default `$ifs`: space, tab, newline, encoded element-wise.
pub const DEFAULT_IFS: &str = " \u{1}\t\u{1}\n";

/// Default `$prompt`: left, top-left, top-right, right.
pub const DEFAULT_PROMPT: &str = "> \u{1}\u{1}\u{1}";

/// The variable store.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// An empty environment. Most callers want [`Environment::from_process`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the startup environment: the process environment plus the
    /// shell's conventions: `ifs`, `nl`, `tab`, `prompt`, `status`, a
    /// lower-cased `home` mirror of `HOME`, a `path` mirror of `PATH`
    /// with `:` rewritten to the list separator, and `PWD`.
    pub fn from_process() -> Self {
        let mut env = Self {
            vars: std::env::vars().collect(),
        };

        env.set("ifs", DEFAULT_IFS);
        env.set("nl", "\n");
        env.set("tab", "\t");
        env.set("prompt", DEFAULT_PROMPT);
        env.set("status", "0");

        if let Some(home) = env.get("HOME").map(str::to_string) {
            env.set("home", home);
        }
        if let Some(path) = env.get("PATH").map(str::to_string) {
            env.set("path", path.replace(':', "\u{1}"));
        }
        if let Ok(cwd) = std::env::current_dir() {
            env.set("PWD", cwd.to_string_lossy().to_string());
        }

        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// The stored list for `key`; absence is the empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.vars.get(key) {
            Some(value) => value.split(LIST_SEP).map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Store a list, maintaining the encoding invariant: an empty list
    /// removes the key.
    pub fn set_list(&mut self, key: impl Into<String>, elements: &[String]) {
        let key = key.into();
        if elements.is_empty() {
            self.vars.remove(&key);
        } else {
            self.vars.insert(key, elements.join("\u{1}"));
        }
    }

    /// Current `$status`, defaulting to "0".
    pub fn status(&self) -> &str {
        self.get("status").unwrap_or("0")
    }

    pub fn set_status(&mut self, code: i32) {
        self.set("status", code.to_string());
    }

    /// Environment key a function body is stored under.
    pub fn function_key(name: &str) -> String {
        format!("fn#{}", name)
    }

    pub fn function_body(&self, name: &str) -> Option<&str> {
        self.get(&Self::function_key(name))
    }

    pub fn define_function(&mut self, name: &str, body: impl Into<String>) {
        self.set(Self::function_key(name), body);
    }

    /// The `$ifs` separator set as single bytes. Each stored element
    /// must be one byte; malformed elements are skipped with a warning.
    pub fn ifs_separators(&self) -> Vec<u8> {
        let mut separators = Vec::new();
        for element in self.get_list("ifs") {
            let bytes = element.as_bytes();
            if bytes.len() == 1 {
                separators.push(bytes[0]);
            } else {
                tracing::warn!(element = %element.escape_debug(), "skipping multi-byte ifs element");
            }
        }
        separators
    }

    /// All entries, for exporting to child processes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }
}
