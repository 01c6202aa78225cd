//! cd - Change directory builtin
//!
//! - `cd` changes to `$home`
//! - an absolute path is entered directly
//! - a relative path is joined onto the current working directory
//!   component by component, with `..` popping

use crate::interpreter::env::Environment;

/// Handle the cd builtin command.
pub fn handle_cd(env: &mut Environment, args: &[String]) -> i32 {
    let target = if args.is_empty() {
        match env.get("home") {
            Some(home) => home.to_string(),
            None => {
                eprintln!("rz: cd: no home directory");
                return 1;
            }
        }
    } else {
        args[0].clone()
    };

    let destination = if target.starts_with('/') {
        target.clone()
    } else {
        let cwd = std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "/".to_string());
        join_path(&cwd, &target)
    };

    if let Err(err) = std::env::set_current_dir(&destination) {
        eprintln!("rz: cd: {}: {}", target, err);
        return 1;
    }
    env.set("PWD", destination);
    0
}

/// Join a relative path onto an absolute base, honoring `..` by popping
/// and dropping `.` and empty components.
fn join_path(base: &str, relative: &str) -> String {
    let mut components: Vec<&str> = base.split('/').filter(|c| !c.is_empty()).collect();
    for component in relative.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    format!("/{}", components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_simple() {
        assert_eq!(join_path("/home/user", "src"), "/home/user/src");
    }

    #[test]
    fn test_join_dotdot_pops() {
        assert_eq!(join_path("/home/user/src", ".."), "/home/user");
        assert_eq!(join_path("/home/user", "../.."), "/");
        assert_eq!(join_path("/", ".."), "/");
    }

    #[test]
    fn test_join_mixed() {
        assert_eq!(join_path("/a/b", "../c/./d"), "/a/c/d");
    }
}
