//! Child-process plumbing shared by the tool wrappers.
//!
//! Runs an executable with captured stdout/stderr, a hard wall-clock limit
//! and cooperative cancellation. The child is reaped on every exit path,
//! including panics, so an aborted scan leaves no stray processes behind.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::errors::PointFailure;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_EXCERPT_LIMIT: usize = 400;

/// Shared cancellation flag. Cloning hands out another handle to the same
/// flag, so one `cancel()` stops every worker holding a clone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One external invocation: program, arguments, wall-clock limit.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Captured output of a finished invocation.
#[derive(Debug)]
pub struct ExecCapture {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Kills and reaps the child unless it was already waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn kill_and_reap(&mut self) {
        if !self.reaped {
            self.child.kill().ok();
            self.child.wait().ok();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

/// Runs the request to completion, polling for exit, timeout and
/// cancellation. A non-zero exit becomes an execution failure carrying an
/// excerpt of stderr.
pub fn run_captured(
    request: &ExecRequest,
    cancel: &CancelToken,
) -> Result<ExecCapture, PointFailure> {
    if cancel.is_cancelled() {
        return Err(PointFailure::Cancelled);
    }
    debug!(
        program = %request.program.display(),
        args = ?request.args,
        "spawning external tool"
    );
    let started = Instant::now();
    let mut child = Command::new(&request.program)
        .args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            PointFailure::Execution(format!(
                "failed to spawn '{}': {source}",
                request.program.display()
            ))
        })?;
    let stdout_reader = spawn_pipe_reader(child.stdout.take());
    let stderr_reader = spawn_pipe_reader(child.stderr.take());
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };
    let deadline = started + request.timeout;

    let status = loop {
        match guard.child.try_wait() {
            Ok(Some(status)) => {
                guard.reaped = true;
                break status;
            }
            Ok(None) => {}
            Err(source) => {
                guard.kill_and_reap();
                return Err(PointFailure::Execution(format!(
                    "failed to poll '{}': {source}",
                    request.program.display()
                )));
            }
        }
        if cancel.is_cancelled() {
            guard.kill_and_reap();
            // Readers stay detached: a grandchild of the tool may still hold
            // the pipe open, and joining would block on it.
            return Err(PointFailure::Cancelled);
        }
        if Instant::now() >= deadline {
            guard.kill_and_reap();
            debug!(
                program = %request.program.display(),
                "tool hit the wall-clock limit"
            );
            return Err(PointFailure::Timeout {
                limit: request.timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_pipe_reader(stdout_reader);
    let stderr = join_pipe_reader(stderr_reader);
    if !status.success() {
        let reason = status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |code| {
                format!("exit code {code}")
            });
        return Err(PointFailure::Execution(format!(
            "'{}' failed with {reason}{}",
            request.program.display(),
            stderr_excerpt(&stderr)
        )));
    }
    Ok(ExecCapture {
        stdout,
        stderr,
        elapsed: started.elapsed(),
    })
}

fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = String::new();
            pipe.read_to_string(&mut buffer).ok();
            buffer
        })
    })
}

fn join_pipe_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let excerpt: String = trimmed.chars().take(STDERR_EXCERPT_LIMIT).collect();
    format!("; stderr: {excerpt}")
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ExecRequest, run_captured};
    use crate::domain::PointFailure;
    use std::path::PathBuf;
    use std::time::Duration;

    fn request(program: &str, args: &[&str], timeout: Duration) -> ExecRequest {
        ExecRequest {
            program: PathBuf::from(program),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
            timeout,
        }
    }

    #[test]
    fn refuses_to_start_when_already_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = run_captured(
            &request("/bin/true", &[], Duration::from_secs(5)),
            &cancel,
        );
        assert!(matches!(result, Err(PointFailure::Cancelled)));
    }

    #[test]
    fn missing_executable_is_an_execution_failure() {
        let result = run_captured(
            &request("/no/such/binary", &[], Duration::from_secs(5)),
            &CancelToken::new(),
        );
        match result {
            Err(PointFailure::Execution(message)) => {
                assert!(message.contains("failed to spawn"), "got: {message}")
            }
            other => panic!("expected execution failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_of_a_successful_run() {
        let capture = run_captured(
            &request("/bin/sh", &["-c", "echo harvested"], Duration::from_secs(5)),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(capture.stdout.trim(), "harvested");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_carries_the_stderr_excerpt() {
        let result = run_captured(
            &request(
                "/bin/sh",
                &["-c", "echo boom >&2; exit 7"],
                Duration::from_secs(5),
            ),
            &CancelToken::new(),
        );
        match result {
            Err(PointFailure::Execution(message)) => {
                assert!(message.contains("exit code 7"), "got: {message}");
                assert!(message.contains("boom"), "got: {message}");
            }
            other => panic!("expected execution failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn slow_tools_are_killed_at_the_deadline() {
        let started = std::time::Instant::now();
        let result = run_captured(
            &request("/bin/sh", &["-c", "sleep 30"], Duration::from_millis(200)),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(PointFailure::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
