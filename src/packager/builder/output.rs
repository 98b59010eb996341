//! Classification of unstructured build output.
//!
//! Gradle and the Capacitor CLI print thousands of lines of progress noise.
//! Each line is sorted into a status marker, the start or body of a failure
//! detail block, or plain progress. Failure blocks run from their marker to
//! the next blank line or `* Section:` header and are tracked per stream so
//! interleaved stdout progress never splits a stderr diagnostic.
//!
//! `FAILURE:` and `BUILD FAILED` lines open a block too. Such a status block
//! is only reported when no detail block exists and something followed the
//! marker.

use crate::packager::utils::process::{OutputLine, StreamKind};
use regex::Regex;
use std::sync::LazyLock;

static SUCCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(BUILD SUCCESSFUL\b|\s*[✔√] )").expect("valid success regex")
});

static FAILURE_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(FAILURE: |BUILD FAILED\b)").expect("valid failure status regex")
});

static FAILURE_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\* What went wrong:|\s*error: |e: |\[error\] |ERROR: |.*\.(java|kt):\d+: error)")
        .expect("valid failure detail regex")
});

static TASK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^> Task (:\S+)").expect("valid task regex"));

/// How a single line was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Success marker; updates the last known status.
    Success,
    /// Overall failure marker (`FAILURE:`, `BUILD FAILED`).
    FailureStatus,
    /// Opens or continues a failure detail block.
    FailureDetail,
    /// Anything else.
    Progress,
}

/// Incremental classifier fed one line at a time in arrival order.
#[derive(Debug, Default)]
pub struct OutputClassifier {
    last_status: Option<String>,
    current_task: Option<String>,
    blocks: Vec<String>,
    status_blocks: Vec<String>,
    open: [Option<OpenBlock>; 2],
    progress_lines: usize,
}

#[derive(Debug)]
struct OpenBlock {
    lines: Vec<String>,
    from_status: bool,
}

fn slot(stream: StreamKind) -> usize {
    match stream {
        StreamKind::Stdout => 0,
        StreamKind::Stderr => 1,
    }
}

impl OutputClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, line: &OutputLine) -> LineClass {
        let text = line.text.as_str();
        let idx = slot(line.stream);

        if let Some(block) = self.open[idx].as_mut() {
            let boundary = text.trim().is_empty() || text.starts_with("* ");
            if !boundary && !FAILURE_DETAIL.is_match(text) && !FAILURE_STATUS.is_match(text) {
                block.lines.push(text.to_string());
                return LineClass::FailureDetail;
            }
            self.close(idx);
        }

        if FAILURE_DETAIL.is_match(text) {
            self.open_block(idx, text, false);
            return LineClass::FailureDetail;
        }
        if FAILURE_STATUS.is_match(text) {
            self.last_status = Some(text.trim().to_string());
            self.open_block(idx, text, true);
            return LineClass::FailureStatus;
        }
        if SUCCESS.is_match(text) {
            self.last_status = Some(text.trim().to_string());
            return LineClass::Success;
        }
        if let Some(caps) = TASK.captures(text) {
            self.current_task = Some(caps[1].to_string());
        }
        self.progress_lines += 1;
        LineClass::Progress
    }

    fn open_block(&mut self, idx: usize, marker: &str, from_status: bool) {
        self.open[idx] = Some(OpenBlock {
            lines: vec![marker.trim_end().to_string()],
            from_status,
        });
    }

    fn close(&mut self, idx: usize) {
        let Some(open) = self.open[idx].take() else {
            return;
        };
        // A lone status marker says nothing beyond `last_status`.
        if open.from_status && open.lines.len() < 2 {
            return;
        }
        let block = open.lines.join("\n").trim().to_string();
        if block.is_empty() {
            return;
        }
        if open.from_status {
            self.status_blocks.push(block);
        } else {
            self.blocks.push(block);
        }
    }

    /// Most recent success or failure marker.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Most recent `> Task :name` seen.
    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn progress_lines(&self) -> usize {
        self.progress_lines
    }

    /// Closes any open blocks and returns all failure blocks in order of completion.
    pub fn finish(mut self) -> ClassifiedOutput {
        self.close(0);
        self.close(1);
        ClassifiedOutput {
            last_status: self.last_status,
            failure_blocks: self.blocks,
            status_blocks: self.status_blocks,
        }
    }
}

/// Summary of one build's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedOutput {
    pub last_status: Option<String>,
    pub failure_blocks: Vec<String>,
    /// Blocks opened by `FAILURE:` / `BUILD FAILED` that carried more than the marker.
    pub status_blocks: Vec<String>,
}

impl ClassifiedOutput {
    /// First detail block, else the first status block.
    pub fn first_failure(&self) -> Option<&str> {
        self.failure_blocks
            .first()
            .or_else(|| self.status_blocks.first())
            .map(String::as_str)
    }

    pub fn reported_success(&self) -> bool {
        self.last_status
            .as_deref()
            .is_some_and(|s| SUCCESS.is_match(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(classifier: &mut OutputClassifier, stream: StreamKind, text: &str) -> Vec<LineClass> {
        text.lines()
            .map(|l| {
                classifier.observe(&OutputLine {
                    stream,
                    text: l.to_string(),
                })
            })
            .collect()
    }

    #[test]
    fn gradle_failure_summary_yields_what_went_wrong_block() {
        let mut c = OutputClassifier::new();
        feed(
            &mut c,
            StreamKind::Stderr,
            "FAILURE: Build failed with an exception.\n\
             \n\
             * What went wrong:\n\
             Execution failed for task ':app:mergeDebugResources'.\n\
             > Resource compilation failed.\n\
             \n\
             * Try:\n\
             > Run with --stacktrace option to get the stack trace.\n\
             \n\
             BUILD FAILED in 4s",
        );
        let out = c.finish();
        assert_eq!(
            out.first_failure(),
            Some(
                "* What went wrong:\n\
                 Execution failed for task ':app:mergeDebugResources'.\n\
                 > Resource compilation failed."
            )
        );
        assert_eq!(out.failure_blocks.len(), 1);
        assert_eq!(out.last_status.as_deref(), Some("BUILD FAILED in 4s"));
        assert!(!out.reported_success());
    }

    #[test]
    fn compiler_errors_come_first() {
        let mut c = OutputClassifier::new();
        feed(
            &mut c,
            StreamKind::Stderr,
            "/p/MainActivity.java:12: error: cannot find symbol\n    Foo bar;\n\n* What went wrong:\nCompilation failed",
        );
        let out = c.finish();
        assert_eq!(out.failure_blocks.len(), 2);
        assert!(out.failure_blocks[0].starts_with("/p/MainActivity.java:12: error"));
        assert!(out.failure_blocks[0].ends_with("Foo bar;"));
    }

    #[test]
    fn stdout_progress_does_not_split_stderr_block() {
        let mut c = OutputClassifier::new();
        c.observe(&OutputLine::stderr("* What went wrong:"));
        assert_eq!(c.observe(&OutputLine::stdout("> Task :app:preBuild")), LineClass::Progress);
        c.observe(&OutputLine::stderr("SDK location not found."));
        let out = c.finish();
        assert_eq!(out.first_failure(), Some("* What went wrong:\nSDK location not found."));
    }

    #[test]
    fn success_marker_and_progress() {
        let mut c = OutputClassifier::new();
        let classes = feed(
            &mut c,
            StreamKind::Stdout,
            "> Task :app:assembleDebug\nSome info line\nBUILD SUCCESSFUL in 31s\n42 actionable tasks",
        );
        assert_eq!(
            classes,
            vec![LineClass::Progress, LineClass::Progress, LineClass::Success, LineClass::Progress]
        );
        assert_eq!(c.current_task(), Some(":app:assembleDebug"));
        assert_eq!(c.progress_lines(), 3);
        let out = c.finish();
        assert!(out.reported_success());
        assert!(out.failure_blocks.is_empty());
    }

    #[test]
    fn capacitor_error_line_is_captured() {
        let mut c = OutputClassifier::new();
        feed(&mut c, StreamKind::Stderr, "[error] Unable to find android platform.\nRun npx cap add android");
        let out = c.finish();
        assert_eq!(
            out.first_failure(),
            Some("[error] Unable to find android platform.\nRun npx cap add android")
        );
    }

    #[test]
    fn build_failed_without_details_keeps_following_lines() {
        let mut c = OutputClassifier::new();
        let classes = feed(
            &mut c,
            StreamKind::Stderr,
            "BUILD FAILED in 2s\nCould not resolve all dependencies for configuration ':app:debugRuntimeClasspath'.",
        );
        assert_eq!(classes, vec![LineClass::FailureStatus, LineClass::FailureDetail]);
        let out = c.finish();
        assert!(out.failure_blocks.is_empty());
        assert_eq!(
            out.first_failure(),
            Some("BUILD FAILED in 2s\nCould not resolve all dependencies for configuration ':app:debugRuntimeClasspath'.")
        );
        assert_eq!(out.last_status.as_deref(), Some("BUILD FAILED in 2s"));
    }

    #[test]
    fn status_line_ends_an_open_detail_block() {
        let mut c = OutputClassifier::new();
        feed(
            &mut c,
            StreamKind::Stderr,
            "e: /src/App.kt:3:1 Unresolved reference: Bridge\nFAILURE: Build failed with an exception.",
        );
        let out = c.finish();
        assert_eq!(out.failure_blocks, vec!["e: /src/App.kt:3:1 Unresolved reference: Bridge".to_string()]);
        assert!(out.status_blocks.is_empty());
        assert_eq!(out.last_status.as_deref(), Some("FAILURE: Build failed with an exception."));
    }
}
