//! exit - Exit shell builtin
//!
//! Terminates the shell process with the given 8-bit status (default
//! 0). The surrounding loop never sees a return from a successful
//! exit; an unparseable argument is reported and yields status 1.

/// Handle the exit builtin command.
pub fn handle_exit(args: &[String]) -> i32 {
    let code = match args.first() {
        None => 0,
        Some(arg) => match parse_exit_code(arg) {
            Some(code) => code,
            None => {
                eprintln!("rz: exit: numeric argument required: {}", arg);
                return 1;
            }
        },
    };
    std::process::exit(code)
}

/// Exit codes are 8-bit unsigned.
fn parse_exit_code(arg: &str) -> Option<i32> {
    arg.parse::<u8>().ok().map(i32::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("0"), Some(0));
        assert_eq!(parse_exit_code("7"), Some(7));
        assert_eq!(parse_exit_code("255"), Some(255));
        assert_eq!(parse_exit_code("256"), None);
        assert_eq!(parse_exit_code("-1"), None);
        assert_eq!(parse_exit_code("x"), None);
    }
}
