//! External process execution with concurrent output draining.
//!
//! Every external tool (npm, the Capacitor CLI, Gradle, keytool, apksigner)
//! is launched through a [`ProcessRunner`]. The runner owns the working
//! directory of each call; nothing in the packager changes the process-wide
//! current directory.

use crate::packager::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Grace period for a killed child to be reaped.
const KILL_WAIT: Duration = Duration::from_secs(10);

/// Arguments following these flags are secrets and never printed.
const SECRET_FLAGS: &[&str] = &[
    "--keystore-password",
    "--key-password",
    "--ks-pass",
    "--key-pass",
    "-storepass",
    "-keypass",
];

/// A fully resolved external command.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    env: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl Invocation {
    /// Creates an invocation of `program` running in `cwd`.
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            env: Vec::new(),
            timeout: None,
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Hard limit after which the whole process tree is killed.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.cwd
    }

    pub fn timeout_limit(&self) -> Option<Duration> {
        self.timeout
    }

    /// Command line with secret values masked, suitable for logs and errors.
    pub fn redacted(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("****".to_string());
                mask_next = false;
                continue;
            }
            mask_next = SECRET_FLAGS.contains(&arg.as_str());
            parts.push(arg.clone());
        }
        parts.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.redacted())
            .field("cwd", &self.cwd)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which standard stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One line of child output, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Stderr,
            text: text.into(),
        }
    }
}

/// Accumulated output of one finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last `count` stderr lines joined with newlines.
    pub fn trailing_stderr(&self, count: usize) -> String {
        let start = self.stderr_lines.len().saturating_sub(count);
        self.stderr_lines[start..].join("\n")
    }

    /// Best available error text: stderr, or the stdout tail when stderr is empty.
    pub fn error_text(&self) -> String {
        if self.stderr_lines.iter().any(|l| !l.trim().is_empty()) {
            return self.stderr_lines.join("\n");
        }
        let start = self.stdout_lines.len().saturating_sub(20);
        self.stdout_lines[start..].join("\n")
    }
}

/// Capability to run external processes.
///
/// `on_line` is called for every stdout and stderr line as it arrives.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l OutputLine) + Send),
    ) -> Result<ProcessResult>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l OutputLine) + Send),
    ) -> Result<ProcessResult> {
        log::debug!(
            "Running `{}` in {}",
            invocation,
            invocation.working_dir().display()
        );

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .current_dir(invocation.working_dir())
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down the Gradle daemon
        // launcher and its children together.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            Error::build(format!("failed to start `{}`: {}", invocation.program(), e))
                .with_details(invocation.redacted())
                .with_source(e)
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
        let stdout_task = tokio::spawn(forward_lines(
            child.stdout.take(),
            StreamKind::Stdout,
            tx.clone(),
        ));
        let stderr_task = tokio::spawn(forward_lines(
            child.stderr.take(),
            StreamKind::Stderr,
            tx,
        ));

        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();

        // Both readers stay alive until EOF; the channel closes only after
        // both have dropped their senders.
        let drain_and_wait = async {
            while let Some(line) = rx.recv().await {
                on_line(&line);
                match line.stream {
                    StreamKind::Stdout => stdout_lines.push(line.text),
                    StreamKind::Stderr => stderr_lines.push(line.text),
                }
            }
            child.wait().await
        };

        let outcome = match invocation.timeout_limit() {
            Some(limit) => tokio::time::timeout(limit, drain_and_wait).await.ok(),
            None => Some(drain_and_wait.await),
        };

        let status = match outcome {
            Some(Ok(status)) => status,
            Some(Err(e)) => {
                return Err(Error::build(format!(
                    "failed waiting for `{}`: {}",
                    invocation.program(),
                    e
                ))
                .with_source(e));
            }
            None => {
                let limit = invocation.timeout_limit().unwrap_or_default();
                log::warn!(
                    "`{}` timed out after {}s, terminating process tree",
                    invocation.program(),
                    limit.as_secs()
                );
                terminate_tree(&mut child).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(Error::build(format!(
                    "`{}` timed out after {} seconds and was terminated",
                    invocation.program(),
                    limit.as_secs()
                ))
                .with_details(stderr_lines.join("\n")));
            }
        };

        let _ = tokio::join!(stdout_task, stderr_task);

        let exit_code = status.code().unwrap_or(-1);
        log::debug!("`{}` exited with code {}", invocation.program(), exit_code);

        Ok(ProcessResult {
            stdout_lines,
            stderr_lines,
            exit_code,
        })
    }
}

/// Reads `reader` line by line until EOF, forwarding each line.
///
/// Reads raw bytes so non UTF-8 tool output never stops the drain.
async fn forward_lines<R>(reader: Option<R>, stream: StreamKind, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                // Receiver gone means the caller stopped listening; keep
                // draining so the child never blocks on a full pipe.
                let _ = tx.send(OutputLine { stream, text });
            }
            Err(e) => {
                log::debug!("stopped reading {:?}: {}", stream, e);
                break;
            }
        }
    }
}

async fn terminate_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            log::debug!("killpg({}) failed: {}", pid, e);
        }
    }

    if let Err(e) = child.kill().await {
        log::warn!("Failed to kill child process: {}", e);
    }

    let _ = tokio::time::timeout(KILL_WAIT, child.wait()).await;
}
