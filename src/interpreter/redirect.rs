//! File Descriptor Redirection
//!
//! The process-wide fd table is shared between the shell and its
//! children, so every command that may mutate it saves stdin, stdout,
//! and stderr first and restores them afterwards. [`FdGuard`] is that
//! scoped acquisition: the constructor dups the stdio triple aside
//! (marked close-on-exec so children never see the copies) and `Drop`
//! dup2s them back on every exit path.
//!
//! Redirection targets come in two shapes: a file path, opened and
//! dup2ed over the target descriptor, or a bracketed fd form decoded
//! here: `[n=m]` aliases descriptor n to m, `[n=]` and `[n]` close n.

use std::fs::{File, OpenOptions};
use std::os::fd::IntoRawFd;
use std::os::unix::io::RawFd;

use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::unistd::{close, dup, dup2};

use crate::ast::types::Direction;
use crate::interpreter::errors::ExecError;

/// Scoped save/restore of stdin, stdout, and stderr.
pub struct FdGuard {
    saved: [(RawFd, RawFd); 3],
}

impl FdGuard {
    /// Dup the stdio triple to fresh descriptors. The copies are marked
    /// FD_CLOEXEC so spawned children do not inherit them.
    pub fn new() -> Result<Self, ExecError> {
        let mut saved = [(0, -1); 3];
        for (slot, fd) in saved.iter_mut().zip(0..3) {
            let copy = dup(fd).map_err(|err| {
                ExecError::runtime(format!("cannot save descriptor {}: {}", fd, err))
            })?;
            let _ = fcntl(copy, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC));
            *slot = (fd, copy);
        }
        Ok(Self { saved })
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        for (target, copy) in self.saved {
            if copy >= 0 {
                let _ = dup2(copy, target);
                let _ = close(copy);
            }
        }
    }
}

/// Apply one resolved redirection target to the fd table.
///
/// `target` is the single resolved word of the redirection's file
/// argument. A `[…]` form carries descriptor surgery; anything else is
/// a path to open according to the direction and append flag.
pub fn apply_redirection(
    fd: i32,
    direction: Direction,
    append: bool,
    target: &str,
) -> Result<(), ExecError> {
    if target.starts_with('[') && target.ends_with(']') {
        return apply_fd_form(&target[1..target.len() - 1]);
    }

    let file = open_target(direction, append, target)?;
    let raw = file.into_raw_fd();
    dup2(raw, fd).map_err(|err| ExecError::runtime(format!("dup2: {}", err)))?;
    let _ = close(raw);
    Ok(())
}

/// `n=m` → dup2(m → n); `n=` or bare `n` → close(n).
fn apply_fd_form(inner: &str) -> Result<(), ExecError> {
    let parse = |s: &str| {
        s.parse::<RawFd>()
            .map_err(|_| ExecError::syntax(format!("bad file descriptor `{}`", s)))
    };
    match inner.split_once('=') {
        Some((lhs, "")) => {
            let _ = close(parse(lhs)?);
            Ok(())
        }
        Some((lhs, rhs)) => {
            let (lhs, rhs) = (parse(lhs)?, parse(rhs)?);
            dup2(rhs, lhs).map_err(|err| ExecError::runtime(format!("dup2: {}", err)))?;
            Ok(())
        }
        None => {
            let _ = close(parse(inner)?);
            Ok(())
        }
    }
}

fn open_target(direction: Direction, append: bool, target: &str) -> Result<File, ExecError> {
    let result = match direction {
        Direction::In => File::open(target),
        Direction::Out => OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(target),
    };
    result.map_err(|err| ExecError::runtime(format!("{}: {}", target, err)))
}

#[cfg(test)]
pub(crate) static FD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
