//! Synchronous shell helpers.
//!
//! Commands run through `sh -c` with stdout and stderr drained on their own
//! threads, so a chatty child never blocks on a full pipe while we wait for
//! the deadline.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{AciError, Result};
use crate::results::{maybe_truncate, CONTENT_TRUNCATED_NOTICE, MAX_RESPONSE_LEN_CHAR};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Options for [`run_shell_cmd_with`].
#[derive(Debug, Clone)]
pub struct ShellOptions<'a> {
    pub timeout: Option<Duration>,
    pub truncate_after: Option<usize>,
    pub truncate_notice: &'a str,
}

impl Default for ShellOptions<'_> {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            truncate_after: Some(MAX_RESPONSE_LEN_CHAR),
            truncate_notice: CONTENT_TRUNCATED_NOTICE,
        }
    }
}

/// Run `cmd` with the default timeout and truncation.
pub fn run_shell_cmd(cmd: &str) -> Result<ShellOutput> {
    run_shell_cmd_with(cmd, &ShellOptions::default())
}

/// Run `cmd` under `sh -c`, returning its exit code and captured output.
///
/// stdout is truncated with `opts.truncate_notice`; stderr always uses the
/// generic notice. A child still running at the deadline is killed and
/// reported as [`AciError::Timeout`].
pub fn run_shell_cmd_with(cmd: &str, opts: &ShellOptions<'_>) -> Result<ShellOutput> {
    let start = Instant::now();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some(limit) = opts.timeout {
            if start.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                let elapsed = start.elapsed().as_secs_f64();
                tracing::debug!(cmd, elapsed, "shell command timed out");
                return Err(AciError::Timeout {
                    cmd: cmd.to_string(),
                    elapsed,
                });
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(ShellOutput {
        code: status.code().unwrap_or(0),
        stdout: maybe_truncate(&stdout, opts.truncate_after, opts.truncate_notice),
        stderr: maybe_truncate(&stderr, opts.truncate_after, CONTENT_TRUNCATED_NOTICE),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// True if `tool_name` is on `PATH` and `tool_name --version` succeeds.
pub fn check_tool_installed(tool_name: &str) -> bool {
    if which::which(tool_name).is_err() {
        return false;
    }
    Command::new(tool_name)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
