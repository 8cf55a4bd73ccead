use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::config::SandboxConfig;
use crate::error::ToolError;
use crate::guard::WorkingDirectory;

use super::confine;

/// How long pipe readers get to see EOF once the process group is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// How a completed script ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    /// Killed by a signal, so no exit code is available.
    Signal,
}

/// Captured output of a script that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitOutcome,
}

impl ExecutionResult {
    fn from_status(status: ExitStatus, stdout: String, stderr: String) -> Self {
        let exit = match status.code() {
            Some(code) => ExitOutcome::Code(code),
            None => ExitOutcome::Signal,
        };
        Self {
            stdout,
            stderr,
            exit,
        }
    }

    /// Text handed back to the model. A failing script is still a successful
    /// run from the caller's point of view; the exit status is part of the text.
    pub fn render(&self) -> String {
        let mut blocks = Vec::new();

        if self.stdout.is_empty() {
            blocks.push("No output produced.".to_string());
        } else {
            blocks.push(format!("STDOUT:\n{}", self.stdout));
        }

        if !self.stderr.is_empty() {
            blocks.push(format!("STDERR:\n{}", self.stderr));
        }

        match self.exit {
            ExitOutcome::Code(0) => {}
            ExitOutcome::Code(code) => blocks.push(format!("Process exited with code {code}")),
            ExitOutcome::Signal => blocks.push("Process terminated by signal".to_string()),
        }

        blocks.join("\n")
    }
}

/// Runs `file_path` with the interpreter registered for its extension. The
/// child's working directory is the sandbox root, not the script's directory.
pub fn run_script(
    root: &WorkingDirectory,
    file_path: &str,
    args: &[String],
    config: &SandboxConfig,
) -> Result<String, ToolError> {
    let script = confine(root, file_path, "execute")?;

    if !script.is_file() {
        return Err(ToolError::NotFound {
            path: file_path.to_string(),
        });
    }

    let interpreter = script
        .extension()
        .and_then(OsStr::to_str)
        .and_then(|extension| config.interpreter_for(extension))
        .ok_or_else(|| ToolError::UnsupportedScript {
            path: file_path.to_string(),
            expected: config.supported_extensions(),
        })?;

    tracing::debug!(
        script = %root.display_relative(&script),
        interpreter,
        args = ?args,
        "running script"
    );

    let result = execute(
        interpreter,
        &script,
        args,
        root.path(),
        config.script_timeout,
        config.max_output_bytes,
    )?;

    tracing::debug!(exit = ?result.exit, "script finished");
    Ok(result.render())
}

fn execute(
    interpreter: &str,
    script: &Path,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<ExecutionResult, ToolError> {
    let mut command = Command::new(interpreter);
    command
        .arg(script)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group, so a timeout can take down anything the script forked.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let deadline = Instant::now() + timeout;
    let mut child = command.spawn().map_err(|source| ToolError::Launch {
        interpreter: interpreter.to_string(),
        source,
    })?;

    // Drain both pipes while waiting; a child blocked on a full pipe would
    // otherwise never exit.
    let stdout_reader = PipeReader::spawn(child.stdout.take());
    let stderr_reader = PipeReader::spawn(child.stderr.take());

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            kill_process_tree(&mut child);
            abandon_pipes([stdout_reader, stderr_reader]);
            return Err(timed_out(script, timeout));
        }
        Err(error) => {
            kill_process_tree(&mut child);
            abandon_pipes([stdout_reader, stderr_reader]);
            return Err(ToolError::io("waiting for", script, error));
        }
    };

    // Background processes inherit the pipes, so EOF can come later than the
    // child's exit. The drain shares the child's deadline.
    let stdout = finish_pipe(stdout_reader, deadline);
    let stderr = finish_pipe(stderr_reader, deadline);

    match (stdout, stderr) {
        (Ok(stdout), Ok(stderr)) => Ok(ExecutionResult::from_status(
            status,
            lossy_truncated(&stdout, max_output_bytes),
            lossy_truncated(&stderr, max_output_bytes),
        )),
        (stdout, stderr) => {
            kill_process_tree(&mut child);
            abandon_pipes([stdout.err(), stderr.err()]);
            Err(timed_out(script, timeout))
        }
    }
}

fn timed_out(script: &Path, timeout: Duration) -> ToolError {
    tracing::warn!(
        script = %script.display(),
        timeout_sec = timeout.as_secs(),
        "script timed out and was killed"
    );
    ToolError::Timeout {
        seconds: timeout.as_secs(),
    }
}

/// Reads one child pipe to EOF on its own thread.
struct PipeReader {
    output: Receiver<Vec<u8>>,
    handle: JoinHandle<()>,
}

impl PipeReader {
    fn spawn<R>(pipe: Option<R>) -> Option<Self>
    where
        R: Read + Send + 'static,
    {
        let mut pipe = pipe?;
        let (sender, output) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            let _ = sender.send(bytes);
        });
        Some(Self { output, handle })
    }

    /// Waits for EOF until `deadline`. The thread is joined only after it has
    /// delivered, so a pipe still held open hands the reader back.
    fn finish(self, deadline: Instant) -> Result<Vec<u8>, Self> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.output.recv_timeout(remaining) {
            Ok(bytes) => {
                let _ = self.handle.join();
                Ok(bytes)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = self.handle.join();
                Ok(Vec::new())
            }
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }
}

fn finish_pipe(reader: Option<PipeReader>, deadline: Instant) -> Result<Vec<u8>, PipeReader> {
    match reader {
        Some(reader) => reader.finish(deadline),
        None => Ok(Vec::new()),
    }
}

/// Joins readers whose pipes close within [`KILL_GRACE`] of the kill. A pipe
/// held by a process that left the group detaches its reader, which exits on
/// its own at EOF.
fn abandon_pipes(readers: [Option<PipeReader>; 2]) {
    let grace = Instant::now() + KILL_GRACE;
    for reader in readers.into_iter().flatten() {
        if reader.finish(grace).is_err() {
            tracing::debug!("pipe still open after kill; detaching reader");
        }
    }
}

fn lossy_truncated(bytes: &[u8], max_bytes: usize) -> String {
    truncate_to_byte_limit(String::from_utf8_lossy(bytes).into_owned(), max_bytes)
}

/// Kills the child's process group (or just the child off unix) and reaps it.
fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: `kill` has no memory-safety preconditions; a negative pid
            // addresses the process group created with `process_group(0)`.
            // The group id stays reserved while any member is alive, even
            // after the leader has been reaped.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}

fn truncate_to_byte_limit(content: String, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content;
    }

    let mut cutoff = max_bytes;
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let mut truncated = content[..cutoff].to_string();
    truncated.push_str("\n[output truncated]");
    truncated
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{truncate_to_byte_limit, ExecutionResult, ExitOutcome};

    fn result(stdout: &str, stderr: &str, exit: ExitOutcome) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit,
        }
    }

    #[test]
    fn render_clean_run_shows_only_stdout() {
        assert_eq!(
            result("hello\n", "", ExitOutcome::Code(0)).render(),
            "STDOUT:\nhello\n"
        );
    }

    #[test]
    fn render_notes_missing_stdout() {
        assert_eq!(
            result("", "", ExitOutcome::Code(0)).render(),
            "No output produced."
        );
    }

    #[test]
    fn render_reports_stderr_and_non_zero_exit() {
        assert_eq!(
            result("", "boom\n", ExitOutcome::Code(3)).render(),
            "No output produced.\nSTDERR:\nboom\n\nProcess exited with code 3"
        );
        assert_eq!(
            result("x", "", ExitOutcome::Signal).render(),
            "STDOUT:\nx\nProcess terminated by signal"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_to_byte_limit("abc".to_string(), 10), "abc");
        assert_eq!(
            truncate_to_byte_limit("aé".to_string(), 2),
            "a\n[output truncated]"
        );
    }
}
