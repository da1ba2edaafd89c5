// Runs external processes without a console window, with timeout and cancellation

use super::CancelToken;
use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
// Grandchildren can keep the stderr pipe open after the child is gone
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CommandRunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),
    #[error("cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Last non-empty stderr line, if the process wrote any
    pub fn last_stderr_line(&self) -> Option<String> {
        String::from_utf8_lossy(&self.stderr)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(String::from)
    }
}

/// Suppress the console window a child would otherwise get on Windows
pub fn hide_console_window(cmd: &mut Command) {
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    #[cfg(not(windows))]
    let _ = cmd;
}

/// Spawn `cmd` with stdout discarded and stderr captured, then poll it until it exits,
/// the timeout elapses or `cancel` fires. The child is killed in the latter two cases.
pub fn run_with_control(
    cmd: &mut Command,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> Result<CommandOutput, CommandRunError> {
    if cancel.is_cancelled() {
        return Err(CommandRunError::Cancelled);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    hide_console_window(cmd);

    let program = cmd.get_program().to_string_lossy().to_string();
    let mut child = cmd
        .spawn()
        .map_err(|source| CommandRunError::Spawn { program, source })?;

    let stderr_rx = child.stderr.take().map(|mut stderr| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    });
    // The reader thread is detached if the pipe stays open past the drain timeout
    let collect_stderr = |rx: Option<mpsc::Receiver<Vec<u8>>>| {
        rx.and_then(|rx| rx.recv_timeout(STDERR_DRAIN_TIMEOUT).ok())
            .unwrap_or_default()
    };

    let started = Instant::now();
    let mut abort_reason: Option<CommandRunError> = None;

    loop {
        if abort_reason.is_none() {
            if cancel.is_cancelled() {
                abort_reason = Some(CommandRunError::Cancelled);
            } else if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    abort_reason = Some(CommandRunError::TimedOut(limit));
                }
            }
            if abort_reason.is_some() {
                let _ = child.kill();
            }
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                let stderr = collect_stderr(stderr_rx);
                if let Some(reason) = abort_reason {
                    return Err(reason);
                }
                return Ok(CommandOutput { status, stderr });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = collect_stderr(stderr_rx);
                return Err(CommandRunError::Wait(e));
            }
        }
    }
}
