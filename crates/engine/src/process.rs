// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess executor with streaming capture.
//!
//! Two shapes: *script* (inline body fed to the interpreter via stdin) and
//! *file* (interpreter invoked with a script path and argv). Both stream the
//! child's stdout/stderr line by line to the configured sinks while
//! accumulating the full text for the step result, and are bounded by a
//! timeout.

use crate::config::OutputSink;
use crate::{vars, ExecError, ExecutionContext};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Default bound on a single subprocess execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100 * 60);

/// Interpreter driving a script or file action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreter {
    Bash,
    Sh,
    Powershell,
    Pwsh,
    Cmd,
    /// Execute the file itself, no interpreter.
    Binary,
    /// Any other program looked up on PATH (python3, ruby, ...).
    Other(String),
}

impl Interpreter {
    /// Resolve an explicitly named executor.
    pub fn from_name(name: &str) -> Result<Self, ExecError> {
        match name {
            "" => Err(ExecError::Validation("empty executor name".into())),
            "bash" => Ok(Self::Bash),
            "sh" => Ok(Self::Sh),
            "powershell" => Ok(Self::Powershell),
            "pwsh" => Ok(Self::Pwsh),
            "cmd" | "cmd.exe" => Ok(Self::Cmd),
            "binary" => Ok(Self::Binary),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    /// Infer an interpreter from a script file's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sh") => Self::Sh,
            Some("py") => Self::Other("python3".to_string()),
            Some("rb") => Self::Other("ruby".to_string()),
            Some("ps1") => Self::Powershell,
            Some("pwsh") => Self::Pwsh,
            Some("bat") => Self::Cmd,
            None => Self::Binary,
            Some(_) => Self::platform_default(),
        }
    }

    /// Platform fallback for unrecognized extensions.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Cmd
        } else {
            Self::Sh
        }
    }

    /// Program name invoked for this interpreter.
    pub fn program(&self) -> &str {
        match self {
            Self::Bash => "bash",
            Self::Sh => "sh",
            Self::Powershell => "powershell",
            Self::Pwsh => "pwsh",
            Self::Cmd => "cmd",
            Self::Binary => "",
            Self::Other(name) => name,
        }
    }

    fn is_powershell(&self) -> bool {
        matches!(self, Self::Powershell | Self::Pwsh)
    }
}

/// Captured output of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run an inline script body under `interpreter`, feeding it via stdin.
pub async fn run_script(
    ctx: &ExecutionContext,
    interpreter: &Interpreter,
    body: &str,
    env: &HashMap<String, String>,
    timeout: Duration,
) -> Result<RawOutput, ExecError> {
    let mut cmd = Command::new(match interpreter {
        Interpreter::Binary => {
            return Err(ExecError::Validation(
                "the binary executor cannot run inline scripts".into(),
            ))
        }
        other => other.program(),
    });
    let body = match interpreter {
        // bash aborts on the first failing command
        Interpreter::Bash => {
            cmd.args(["-o", "errexit"]);
            body.to_string()
        }
        Interpreter::Powershell | Interpreter::Pwsh => {
            cmd.args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", "-"]);
            format!("&{{{body}}}")
        }
        _ => body.to_string(),
    };
    run(ctx, cmd, interpreter.program().to_string(), Some(body), env, timeout).await
}

/// Run a script file under `interpreter` with the given argv.
pub async fn run_file(
    ctx: &ExecutionContext,
    interpreter: &Interpreter,
    path: &Path,
    args: &[String],
    env: &HashMap<String, String>,
    timeout: Duration,
) -> Result<RawOutput, ExecError> {
    let (mut cmd, label) = match interpreter {
        Interpreter::Binary => (
            Command::new(path),
            path.display().to_string(),
        ),
        other => {
            let mut cmd = Command::new(other.program());
            if other.is_powershell() {
                cmd.args(["-NoLogo", "-NoProfile", "-NonInteractive", "-File"]);
            }
            cmd.arg(path);
            (cmd, other.program().to_string())
        }
    };
    let args = vars::expand(args, &ctx.record)?;
    cmd.args(&args);
    run(ctx, cmd, label, None, env, timeout).await
}

/// Spawn the prepared command, stream and capture its output, enforce the
/// timeout, and turn a non-zero exit into an error.
async fn run(
    ctx: &ExecutionContext,
    mut cmd: Command,
    label: String,
    stdin_body: Option<String>,
    env: &HashMap<String, String>,
    timeout: Duration,
) -> Result<RawOutput, ExecError> {
    // Declared env overlays the inherited process env, values expanded.
    let env = vars::expand_env(env, &ctx.record)?;
    cmd.envs(&env)
        .current_dir(&ctx.vars.work_dir)
        .stdin(if stdin_body.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(
        command = %label,
        cwd = %ctx.vars.work_dir.display(),
        timeout_s = timeout.as_secs(),
        "spawning subprocess"
    );

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        command: label.clone(),
        source,
    })?;

    if let Some(body) = stdin_body {
        let Some(mut stdin) = child.stdin.take() else {
            return Err(ExecError::Protocol("child stdin not piped".into()));
        };
        // Write concurrently so a large body can't deadlock against a full
        // output pipe.
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(body.as_bytes()).await {
                tracing::debug!(error = %e, "short write to child stdin");
            }
        });
    }

    let Some(stdout) = child.stdout.take() else {
        return Err(ExecError::Protocol("child stdout not piped".into()));
    };
    let Some(stderr) = child.stderr.take() else {
        return Err(ExecError::Protocol("child stderr not piped".into()));
    };
    let stdout_task = tokio::spawn(tee(stdout, ctx.cfg.stdout.clone()));
    let stderr_task = tokio::spawn(tee(stderr, ctx.cfg.stderr.clone()));

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(waited) => waited?,
        Err(_) => {
            kill(&mut child).await;
            stdout_task.abort();
            stderr_task.abort();
            tracing::warn!(command = %label, timeout_s = timeout.as_secs(), "subprocess timed out");
            return Err(ExecError::Timeout { timeout });
        }
    };

    let stdout = join_capture(stdout_task).await?;
    let stderr = join_capture(stderr_task).await?;
    let exit_code = status.code().unwrap_or(-1);
    tracing::debug!(command = %label, exit_code, "subprocess finished");

    if !status.success() {
        return Err(ExecError::NonZeroExit { code: exit_code });
    }
    Ok(RawOutput {
        stdout,
        stderr,
        exit_code,
    })
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "failed to kill timed-out child");
    }
    let _ = child.wait().await;
}

async fn join_capture(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<String, ExecError> {
    let bytes = task
        .await
        .map_err(|e| ExecError::Protocol(format!("capture task failed: {e}")))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Line-oriented tee: forward each line to the sink and accumulate the full
/// stream. The final partial line is flushed at close.
async fn tee<R>(reader: R, sink: OutputSink) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            break;
        }
        {
            let mut sink = sink.lock();
            sink.write_all(&line)?;
        }
        captured.extend_from_slice(&line);
    }
    sink.lock().flush()?;
    Ok(captured)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
