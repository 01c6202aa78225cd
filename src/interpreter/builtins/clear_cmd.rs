//! clear - Clear the terminal builtin

use std::io::Write;

/// Reset the terminal, home the cursor, and erase below it.
pub fn handle_clear() -> i32 {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x1bc\x1b[H\x1b[J");
    let _ = stdout.flush();
    0
}
