//! Step bookkeeping for a single build call.

use crate::packager::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
}

/// One named phase of a build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildStep {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: StepStatus,
    pub error: Option<String>,
}

impl BuildStep {
    /// Wall-clock duration, if the step has ended.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Ordered log of steps; owned by the orchestrator for one build.
#[derive(Debug, Default)]
pub struct StepTracker {
    steps: Vec<BuildStep>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a step and returns its handle.
    pub fn begin(&mut self, name: &str) -> usize {
        log::debug!("step started: {}", name);
        self.steps.push(BuildStep {
            name: name.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            status: StepStatus::Running,
            error: None,
        });
        self.steps.len() - 1
    }

    /// Records the outcome of step `id` and passes the result through.
    pub fn finish<T>(&mut self, id: usize, result: Result<T>) -> Result<T> {
        if let Some(step) = self.steps.get_mut(id) {
            step.ended_at = Some(Utc::now());
            match &result {
                Ok(_) => step.status = StepStatus::Completed,
                Err(e) => {
                    step.status = StepStatus::Failed;
                    step.error = Some(e.to_string());
                }
            }
            let millis = step.duration().map(|d| d.num_milliseconds()).unwrap_or_default();
            log::debug!("step {:?}: {} ({} ms)", step.status, step.name, millis);
        }
        result
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<BuildStep> {
        self.steps
    }
}
