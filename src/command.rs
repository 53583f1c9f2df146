use crate::error::{ObserverError, Result};
use crate::tasks::{Message, Task};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

fn render(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run a command to completion and return its stdout. A non-zero exit maps to
/// an error carrying the command line and trimmed stderr.
pub async fn run_command(program: &str, args: &[&str]) -> Result<Vec<u8>> {
    let output = Command::new(program).args(args).output().await?;
    if !output.status.success() {
        return Err(ObserverError::Command {
            command: render(program, args),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Run a command, appending every trimmed non-empty output line to `task`
/// under its current stage. Stdout and stderr are drained concurrently.
pub async fn stream_command(task: &Task, program: &str, args: &[&str]) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::join!(
        stream_lines(task, stdout),
        stream_lines(task, stderr),
    );

    let status = child.wait().await?;
    if !status.success() {
        return Err(ObserverError::Command {
            command: render(program, args),
            detail: format!("exited with status {status}"),
        });
    }
    Ok(())
}

async fn stream_lines<R: AsyncRead + Unpin>(task: &Task, stream: Option<R>) {
    let Some(stream) = stream else { return };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        task.append(Message {
            stage: task.current_stage(),
            message: Some(line.to_string()),
        });
    }
}

/// Run a command and collect its trimmed non-empty output lines. Used for
/// `docker pull`, where callers want the transcript even on failure.
pub async fn collect_lines(program: &str, args: &[&str]) -> (Vec<String>, Result<()>) {
    let mut output = Vec::new();
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => return (output, Err(err.into())),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (mut out_lines, err_lines) = tokio::join!(drain(stdout), drain(stderr));
    out_lines.extend(err_lines);
    output = out_lines;

    match child.wait().await {
        Ok(status) if status.success() => (output, Ok(())),
        Ok(status) => (
            output,
            Err(ObserverError::Command {
                command: render(program, args),
                detail: format!("exited with status {status}"),
            }),
        ),
        Err(err) => (output, Err(err.into())),
    }
}

async fn drain<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<String> {
    let mut collected = Vec::new();
    let Some(stream) = stream else {
        return collected;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if !line.is_empty() {
            collected.push(line.to_string());
        }
    }
    collected
}
