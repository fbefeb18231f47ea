//! External command execution.
//!
//! [`ProcessRunner::run`] starts a child with separate stdout and stderr
//! pipes and drains both at once on two scoped reader threads, so a child
//! that fills one pipe while the other is idle never stalls.  Both readers
//! are joined before the child is waited on.
//!
//! Stdout lines are logged at debug, stderr lines at warn, each with the
//! child's pid.  There is no timeout: the runner waits for the child for as
//! long as it takes.

use std::ffi::OsStr;
use std::fmt;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use serde::Serialize;

use crate::errors::{Result, XshotError};

pub const DEFAULT_LOG_TARGET: &str = "xshot::process";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ExitKind {
    /// Normal termination with an exit code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl ExitKind {
    pub fn success(self) -> bool {
        self == ExitKind::Exited(0)
    }
}

impl From<ExitStatus> for ExitKind {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitKind::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitKind::Signaled(signal);
            }
        }
        ExitKind::Exited(-1)
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::Exited(code) => write!(f, "exit={code}"),
            ExitKind::Signaled(signal) => write!(f, "signal={signal}"),
        }
    }
}

/// Everything a successful child wrote, plus its exit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitKind,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Runs external commands and classifies how they ended.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    log_target: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            log_target: DEFAULT_LOG_TARGET.to_owned(),
        }
    }

    /// Route this runner's log records (including child output) to `target`.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    /// Run `program` with `args` and wait for it.
    ///
    /// Returns the captured output when the child exits with code 0.  Any
    /// other exit code or a signal yields [`XshotError::CommandFailed`]
    /// carrying the status and captured stderr.
    pub fn run<S: AsRef<OsStr>>(&self, program: &str, args: &[S]) -> Result<ProcessOutput> {
        let command = describe(program, args);
        log::debug!(target: self.log_target.as_str(), "running {command:?}");

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| XshotError::SpawnFailed {
                command: command.clone(),
                source,
            })?;
        let pid = child.id();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let (stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(|| self.drain(stdout_pipe, pid, Stream::Stdout));
            let err = scope.spawn(|| self.drain(stderr_pipe, pid, Stream::Stderr));
            (join(out), join(err))
        });

        let status = ExitKind::from(child.wait()?);
        if !status.success() {
            log::error!(target: self.log_target.as_str(), "process pid={pid} {status}");
            return Err(XshotError::CommandFailed {
                command,
                status,
                stderr,
            });
        }
        log::debug!(target: self.log_target.as_str(), "process pid={pid} {status}");

        Ok(ProcessOutput {
            stdout,
            stderr,
            status,
        })
    }

    /// Read `pipe` line by line until EOF, logging and collecting each line.
    fn drain<R: Read>(&self, pipe: Option<R>, pid: u32, stream: Stream) -> String {
        let mut captured = String::new();
        let Some(pipe) = pipe else {
            return captured;
        };
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    let trimmed = text.trim_end();
                    let target = self.log_target.as_str();
                    match stream {
                        Stream::Stdout => log::debug!(target: target, "[{pid}] stdout: {trimmed}"),
                        Stream::Stderr => log::warn!(target: target, "[{pid}] stderr: {trimmed}"),
                    }
                    captured.push_str(&text);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!(
                        target: self.log_target.as_str(),
                        "[{pid}] {stream}: read failed, discarding the rest: {e}"
                    );
                    // The child may still be writing; keep the pipe empty
                    // until EOF so it can exit.
                    discard_to_eof(&mut reader);
                    break;
                }
            }
        }
        captured
    }
}

fn discard_to_eof<R: Read>(reader: &mut R) {
    loop {
        match io::copy(reader, &mut io::sink()) {
            Ok(_) => return,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // A second hard failure means the pipe is unusable.
            Err(_) => return,
        }
    }
}

fn join(handle: thread::ScopedJoinHandle<'_, String>) -> String {
    match handle.join() {
        Ok(text) => text,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Human-readable command line for logs and errors.
fn describe<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Result<ProcessOutput> {
        ProcessRunner::new().run("/bin/sh", &["-c", script])
    }

    #[test]
    fn test_captures_both_streams() {
        let out = sh("echo one; echo two >&2; echo three; echo four >&2").unwrap();
        assert_eq!(out.stdout, "one\nthree\n");
        assert_eq!(out.stderr, "two\nfour\n");
        assert_eq!(out.status, ExitKind::Exited(0));
    }

    #[test]
    fn test_large_stderr_does_not_deadlock() {
        // Far more than a pipe buffer on stderr before stdout is touched.
        let out = sh(
            "i=0; while [ $i -lt 20000 ]; do echo err-line-$i >&2; i=$((i+1)); done; \
             echo out-1; echo out-2",
        )
        .unwrap();
        assert_eq!(out.stderr.lines().count(), 20000);
        assert_eq!(out.stdout.lines().collect::<Vec<_>>(), vec!["out-1", "out-2"]);
        assert!(out.stderr.starts_with("err-line-0\n"));
        assert!(out.stderr.ends_with("err-line-19999\n"));
    }

    #[test]
    fn test_large_stdout_does_not_deadlock() {
        let out = sh(
            "echo warn >&2; i=0; while [ $i -lt 20000 ]; do echo out-line-$i; i=$((i+1)); done",
        )
        .unwrap();
        assert_eq!(out.stdout.lines().count(), 20000);
        assert_eq!(out.stderr, "warn\n");
    }

    #[test]
    fn test_last_line_without_newline() {
        let out = sh("printf 'a\\nb'").unwrap();
        assert_eq!(out.stdout, "a\nb");
    }

    #[test]
    fn test_exit_code_is_failure() {
        let err = sh("echo bad >&2; exit 2").unwrap_err();
        match err {
            XshotError::CommandFailed {
                status, stderr, ..
            } => {
                assert_eq!(status, ExitKind::Exited(2));
                assert_eq!(stderr, "bad\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_signal_is_failure() {
        let err = sh("kill -9 $$").unwrap_err();
        match err {
            XshotError::CommandFailed { status, .. } => {
                assert_eq!(status, ExitKind::Signaled(9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let err = ProcessRunner::new()
            .run("/nonexistent/xshot-tool", &["-x"])
            .unwrap_err();
        assert!(matches!(err, XshotError::SpawnFailed { .. }));
        assert!(err.to_string().contains("/nonexistent/xshot-tool -x"));
    }

    #[test]
    fn test_exit_kind_display() {
        assert_eq!(ExitKind::Exited(0).to_string(), "exit=0");
        assert_eq!(ExitKind::Signaled(15).to_string(), "signal=15");
        assert!(ExitKind::Exited(0).success());
        assert!(!ExitKind::Exited(1).success());
        assert!(!ExitKind::Signaled(9).success());
    }

    /// Yields one line, fails once, then yields more data before EOF.
    struct FailingOnce {
        chunks: Vec<io::Result<&'static [u8]>>,
        reached_eof: bool,
    }

    impl Read for FailingOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                self.reached_eof = true;
                return Ok(0);
            }
            match self.chunks.remove(0) {
                Ok(bytes) => {
                    buf[..bytes.len()].copy_from_slice(bytes);
                    Ok(bytes.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    #[test]
    fn test_read_error_still_drains_to_eof() {
        let mut pipe = FailingOnce {
            chunks: vec![
                Ok(&b"first\n"[..]),
                Err(io::Error::new(ErrorKind::Other, "bad read")),
                Ok(&b"second\n"[..]),
                Ok(&b"third\n"[..]),
            ],
            reached_eof: false,
        };
        let captured = ProcessRunner::new().drain(Some(&mut pipe), 1, Stream::Stderr);
        assert_eq!(captured, "first\n");
        assert!(pipe.reached_eof);
        assert!(pipe.chunks.is_empty());
    }

    #[test]
    fn test_describe_joins_args() {
        assert_eq!(
            describe("import", &["-window", "0x1a", "out.png"]),
            "import -window 0x1a out.png"
        );
        let none: [&str; 0] = [];
        assert_eq!(describe("xwininfo", &none), "xwininfo");
    }
}
