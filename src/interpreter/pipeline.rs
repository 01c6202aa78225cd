//! Pipelines & Capture
//!
//! The only module that forks. A pipeline `A | B` runs both sides as
//! child processes of the shell: each child re-enters the interpreter
//! for its own side (so builtins, functions, and groups work inside a
//! pipe) and exits with that side's status. Command substitution stays
//! in-process: stdout is swapped for the write end of a pipe, the
//! substituted commands run inline, and the read end (opened
//! non-blocking so a quiet command cannot wedge the shell) is drained
//! afterwards.

use std::io::Write;
use std::os::fd::IntoRawFd;
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, fork, pipe, read, ForkResult, Pid};

use crate::ast::types::Command;
use crate::interpreter::errors::ExecError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::redirect::FdGuard;

/// Run `lhs | rhs`. The pipeline's status is the right-hand side's.
pub fn run_pipeline(interp: &mut Interpreter, lhs: &Command, rhs: &Command) -> i32 {
    match run_pipeline_inner(interp, lhs, rhs) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("rz: {}", err);
            1
        }
    }
}

fn run_pipeline_inner(
    interp: &mut Interpreter,
    lhs: &Command,
    rhs: &Command,
) -> Result<i32, ExecError> {
    let (read_end, write_end) = pipe()?;
    let read_end = read_end.into_raw_fd();
    let write_end = write_end.into_raw_fd();

    let left = match unsafe { fork() } {
        Ok(result) => result,
        Err(err) => {
            let _ = close(read_end);
            let _ = close(write_end);
            return Err(err.into());
        }
    };
    if let ForkResult::Child = left {
        let _ = close(read_end);
        let _ = dup2(write_end, 1);
        let _ = close(write_end);
        exit_with(interp.exec(std::slice::from_ref(lhs)));
    }

    let right = match unsafe { fork() } {
        Ok(result) => result,
        Err(err) => {
            let _ = close(read_end);
            let _ = close(write_end);
            reap(left);
            return Err(err.into());
        }
    };
    if let ForkResult::Child = right {
        let _ = close(write_end);
        let _ = dup2(read_end, 0);
        let _ = close(read_end);
        exit_with(interp.exec(std::slice::from_ref(rhs)));
    }

    let _ = close(read_end);
    let _ = close(write_end);

    reap(left);
    Ok(reap(right))
}

/// Flush and leave: a pipeline child never returns into the parent's
/// control flow.
fn exit_with(status: i32) -> ! {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    std::process::exit(status);
}

fn reap(result: ForkResult) -> i32 {
    let pid = match result {
        ForkResult::Parent { child } => child,
        ForkResult::Child => unreachable!("children exit above"),
    };
    wait_status(pid)
}

fn wait_status(pid: Pid) -> i32 {
    match waitpid(pid, None) {
        Ok(WaitStatus::Exited(_, code)) => code,
        Ok(other) => {
            tracing::debug!(?other, "child did not exit normally");
            1
        }
        Err(err) => {
            tracing::warn!(%err, "waitpid failed");
            1
        }
    }
}

/// Run substituted commands inline, capturing their stdout.
///
/// The read end is switched to non-blocking before stdout is swapped,
/// so the drain below stops at a would-block instead of hanging when
/// the pipe still has an open writer somewhere.
pub fn capture_substitution(
    interp: &mut Interpreter,
    commands: &[Command],
) -> Result<Vec<u8>, ExecError> {
    let (read_end, write_end) = pipe()?;
    let read_end = read_end.into_raw_fd();
    let write_end = write_end.into_raw_fd();

    if let Err(err) = set_nonblocking(read_end) {
        let _ = close(read_end);
        let _ = close(write_end);
        return Err(err);
    }

    {
        let guard = match FdGuard::new() {
            Ok(guard) => guard,
            Err(err) => {
                let _ = close(read_end);
                let _ = close(write_end);
                return Err(err);
            }
        };
        let _ = dup2(write_end, 1);
        let _ = close(write_end);
        interp.exec(commands);
        let _ = std::io::stdout().flush();
        drop(guard); // restores stdout, dropping the last write reference
    }

    let output = drain(read_end);
    let _ = close(read_end);
    Ok(output)
}

fn set_nonblocking(fd: RawFd) -> Result<(), ExecError> {
    let flags = fcntl(fd, FcntlArg::F_GETFL)?;
    let mut oflags = OFlag::from_bits_truncate(flags);
    oflags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(oflags))?;
    Ok(())
}

/// Read until EOF or a blocking read.
fn drain(fd: RawFd) -> Vec<u8> {
    let mut output = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match read(fd, &mut chunk) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&chunk[..n]),
            Err(Errno::EINTR) => continue,
            Err(Errno::EAGAIN) => break,
            Err(err) => {
                tracing::warn!(%err, "substitution read failed");
                break;
            }
        }
    }
    output
}
