//! Deterministic stand-ins for [`ProcessRunner`] and [`FileSystem`].
//!
//! Used by this crate's tests and by downstream crates that want to drive
//! the pipeline without npm, Gradle or the JDK installed.

use crate::packager::Result;
use crate::packager::utils::fs::{FileInfo, FileSystem, TokioFileSystem};
use crate::packager::utils::process::{Invocation, OutputLine, ProcessResult, ProcessRunner};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type Effect = Arc<dyn Fn(&Invocation) + Send + Sync>;
type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canned outcome of one scripted process.
#[derive(Clone)]
pub struct ScriptedResponse {
    lines: Vec<OutputLine>,
    exit_code: i32,
    effect: Option<Effect>,
}

impl ScriptedResponse {
    /// Exit code 0, no output.
    pub fn success() -> Self {
        Self::exit_code(0)
    }

    pub fn exit_code(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: code,
            effect: None,
        }
    }

    /// Non-zero exit with `stderr` split into lines.
    pub fn failure(code: i32, stderr: &str) -> Self {
        stderr
            .lines()
            .fold(Self::exit_code(code), |response, line| response.stderr(line))
    }

    pub fn stdout(mut self, line: impl Into<String>) -> Self {
        self.lines.push(OutputLine::stdout(line));
        self
    }

    pub fn stderr(mut self, line: impl Into<String>) -> Self {
        self.lines.push(OutputLine::stderr(line));
        self
    }

    /// Runs `effect` when the process "executes", e.g. to drop an APK on disk.
    pub fn with_effect(mut self, effect: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }
}

struct Rule {
    matcher: Matcher,
    response: ScriptedResponse,
}

/// [`ProcessRunner`] that records invocations and replays scripted responses.
///
/// The first matching rule wins; unmatched invocations succeed silently.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        self,
        matcher: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
        response: ScriptedResponse,
    ) -> Self {
        lock(&self.rules).push(Rule {
            matcher: Box::new(matcher),
            response,
        });
        self
    }

    /// Matches invocations having `arg` among their arguments.
    pub fn on_arg(self, arg: &str, response: ScriptedResponse) -> Self {
        let arg = arg.to_string();
        self.on(move |inv| inv.arguments().iter().any(|a| *a == arg), response)
    }

    /// Matches invocations whose program path ends with `program`.
    pub fn on_program(self, program: &str, response: ScriptedResponse) -> Self {
        let program = program.to_string();
        self.on(move |inv| inv.program().ends_with(&program), response)
    }

    /// Adds a rule taking precedence over every existing one.
    pub fn push_rule_arg(&self, arg: &str, response: ScriptedResponse) {
        let arg = arg.to_string();
        lock(&self.rules).insert(
            0,
            Rule {
                matcher: Box::new(move |inv| inv.arguments().iter().any(|a| *a == arg)),
                response,
            },
        );
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        lock(&self.calls).clone()
    }

    /// Number of invocations of a program ending with `program`.
    pub fn count_program(&self, program: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|inv| inv.program().ends_with(program))
            .count()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l OutputLine) + Send),
    ) -> Result<ProcessResult> {
        lock(&self.calls).push(invocation.clone());

        let response = lock(&self.rules)
            .iter()
            .find(|rule| (rule.matcher)(invocation))
            .map(|rule| rule.response.clone())
            .unwrap_or_else(ScriptedResponse::success);

        if let Some(effect) = &response.effect {
            effect(invocation);
        }

        let mut result = ProcessResult {
            exit_code: response.exit_code,
            ..Default::default()
        };
        for line in &response.lines {
            on_line(line);
            match line.stream {
                crate::packager::utils::process::StreamKind::Stdout => {
                    result.stdout_lines.push(line.text.clone())
                }
                crate::packager::utils::process::StreamKind::Stderr => {
                    result.stderr_lines.push(line.text.clone())
                }
            }
        }
        Ok(result)
    }
}

/// Real file system that logs every mutating operation.
#[derive(Default)]
pub struct RecordingFileSystem {
    inner: TokioFileSystem,
    ops: Mutex<Vec<String>>,
}

impl RecordingFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutating operations as `"<op> <path>[ -> <path>]"`.
    pub fn ops(&self) -> Vec<String> {
        lock(&self.ops).clone()
    }

    pub fn count(&self, op: &str) -> usize {
        lock(&self.ops)
            .iter()
            .filter(|entry| entry.split(' ').next() == Some(op))
            .count()
    }

    fn record(&self, entry: String) {
        lock(&self.ops).push(entry);
    }
}

#[async_trait]
impl FileSystem for RecordingFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path).await
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileInfo> {
        self.inner.metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.read_dir(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record(format!("create_dir_all {}", path.display()));
        self.inner.create_dir_all(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.record(format!("write {}", path.display()));
        self.inner.write(path, contents).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.record(format!("copy {} -> {}", from.display(), to.display()));
        self.inner.copy(from, to).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.record(format!("rename {} -> {}", from.display(), to.display()));
        self.inner.rename(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record(format!("remove_file {}", path.display()));
        self.inner.remove_file(path).await
    }
}
