//! Child process runner with live echo, full capture and early termination.
//!
//! stdout and stderr are drained by two independent tasks so a child that
//! fills one pipe while we wait on the other can never deadlock. Each chunk is
//! appended to that stream's buffer and, when echo is on, written straight
//! through to our own stdout/stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::watch;

use crate::error::{Result, RetrofitError};

/// Exit code reported for a child we killed.
pub const TERMINATED_EXIT_CODE: i32 = 1;

const CHUNK_SIZE: usize = 8 * 1024;

/// Longest unterminated line carried into the next predicate check.
const MAX_CARRY: usize = 4 * 1024;

/// Predicate over chunk text that asks the runner to stop the child.
pub type EarlyExit = Arc<dyn Fn(&str) -> bool + Send + Sync>;

type EchoSink = Box<dyn AsyncWrite + Send + Unpin>;

// ─── CommandSpec ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinMode {
    /// Connect the child to our terminal.
    Inherit,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub stdin: StdinMode,
    /// Mirror output to our terminal as it arrives.
    pub echo: bool,
}

impl CommandSpec {
    /// Interactive, echoing command.
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            stdin: StdinMode::Inherit,
            echo: true,
        }
    }

    /// Non-interactive command whose output is only captured.
    pub fn captured(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            stdin: StdinMode::Null,
            echo: false,
            ..Self::new(program, cwd)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-style rendering for messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─── ProcessResult ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub terminated_early: bool,
}

impl ProcessResult {
    /// Exit code with killed children mapped to [`TERMINATED_EXIT_CODE`].
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(TERMINATED_EXIT_CODE)
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ─── run ──────────────────────────────────────────────────────────────────

/// Run `spec` to completion, or until `early_exit` matches a chunk.
///
/// Returns only after the child has exited and both drain tasks have finished.
/// A launch failure is returned as [`RetrofitError::Launch`].
pub async fn run(spec: &CommandSpec, early_exit: Option<EarlyExit>) -> Result<ProcessResult> {
    let program = resolve_program(&spec.program)?;

    let mut cmd = Command::new(&program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd.stdin(match spec.stdin {
        StdinMode::Inherit => Stdio::inherit(),
        StdinMode::Null => Stdio::null(),
    });

    tracing::debug!(command = %spec.display(), cwd = %spec.cwd.display(), "spawning");

    let mut child = cmd.spawn().map_err(|source| RetrofitError::Launch {
        program: spec.program.clone(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RetrofitError::Process("stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RetrofitError::Process("stderr not captured".into()))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_tx = Arc::new(stop_tx);

    let out_echo = spec.echo.then(|| Box::new(tokio::io::stdout()) as EchoSink);
    let err_echo = spec.echo.then(|| Box::new(tokio::io::stderr()) as EchoSink);

    let stdout_task = tokio::spawn(drain(
        stdout,
        out_echo,
        early_exit.clone(),
        Arc::clone(&stop_tx),
        stop_rx.clone(),
    ));
    let stderr_task = tokio::spawn(drain(
        stderr,
        err_echo,
        early_exit,
        Arc::clone(&stop_tx),
        stop_rx.clone(),
    ));

    let mut stop_wait = stop_rx.clone();
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = stop_wait.changed() => None,
    };

    let killed = exited.is_none();
    let status = match exited {
        Some(status) => status?,
        None => {
            tracing::debug!(command = %spec.display(), "fatal output seen, killing child");
            // Fails only if the child already exited; wait() still reaps it.
            let _ = child.start_kill();
            child.wait().await?
        }
    };

    let (out, err) = tokio::join!(stdout_task, stderr_task);
    let out = out.map_err(|e| RetrofitError::Process(format!("stdout reader failed: {e}")))?;
    let err = err.map_err(|e| RetrofitError::Process(format!("stderr reader failed: {e}")))?;

    let terminated_early = *stop_rx.borrow();
    let exit_code = if killed { None } else { status.code() };

    tracing::debug!(
        command = %spec.display(),
        exit_code = ?exit_code,
        terminated_early,
        stdout_bytes = out.len(),
        stderr_bytes = err.len(),
        "child finished"
    );

    Ok(ProcessResult {
        exit_code,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
        terminated_early,
    })
}

/// Look a bare program name up on `PATH` so a missing binary fails with a
/// clear launch error. Paths with a separator are used as given.
fn resolve_program(program: &str) -> Result<PathBuf> {
    if program.contains('/') || program.contains(std::path::MAIN_SEPARATOR) {
        return Ok(PathBuf::from(program));
    }
    which::which(program).map_err(|e| RetrofitError::Launch {
        program: program.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
    })
}

/// Read `reader` to EOF (or until told to stop), echoing and buffering.
async fn drain<R>(
    mut reader: R,
    mut echo: Option<EchoSink>,
    early_exit: Option<EarlyExit>,
    stop_tx: Arc<watch::Sender<bool>>,
    mut stop_rx: watch::Receiver<bool>,
) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut carry = String::new();

    loop {
        if *stop_rx.borrow() {
            break;
        }
        let n = tokio::select! {
            read = reader.read(&mut chunk) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            },
            _ = stop_rx.changed() => break,
        };
        let bytes = &chunk[..n];
        buf.extend_from_slice(bytes);

        if let Some(out) = echo.as_mut() {
            // A closed terminal must not stop capture.
            if out.write_all(bytes).await.is_err() || out.flush().await.is_err() {
                echo = None;
            }
        }

        if let Some(pred) = &early_exit {
            carry.push_str(&String::from_utf8_lossy(bytes));
            if pred(&carry) {
                let _ = stop_tx.send(true);
                break;
            }
            keep_unterminated_tail(&mut carry);
        }
    }

    buf
}

/// Drop everything up to the last newline so only a partial line is carried.
fn keep_unterminated_tail(carry: &mut String) {
    if let Some(idx) = carry.rfind('\n') {
        carry.drain(..=idx);
    }
    if carry.len() > MAX_CARRY {
        let mut cut = carry.len() - MAX_CARRY;
        while !carry.is_char_boundary(cut) {
            cut += 1;
        }
        carry.drain(..cut);
    }
}
