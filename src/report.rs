//! Step-by-step outcome of a migration run.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The statement ran and changed the schema or data.
    Applied,
    /// Nothing to do; the reason says why (already present, unsupported, ...).
    Skipped(String),
    /// A best-effort step failed and the run continued.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn applied(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Applied,
        }
    }

    pub fn skipped(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Skipped(reason.into()),
        }
    }

    pub fn failed(step: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Failed(error.to_string()),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.status, StepStatus::Applied)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StepStatus::Failed(_))
    }

    fn log(&self) {
        match &self.status {
            StepStatus::Applied => tracing::info!("✅ {}", self.step),
            StepStatus::Skipped(reason) => tracing::info!("⏭️  {} ({})", self.step, reason),
            StepStatus::Failed(error) => tracing::warn!("⚠️  {} failed: {}", self.step, error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub name: &'static str,
    pub steps: Vec<StepOutcome>,
    /// Result of the post-migration check, when the procedure has one.
    pub verified: Option<bool>,
}

impl MigrationReport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            verified: None,
        }
    }

    /// Records and logs a step outcome.
    pub fn push(&mut self, outcome: StepOutcome) {
        outcome.log();
        self.steps.push(outcome);
    }

    pub fn extend(&mut self, outcomes: impl IntoIterator<Item = StepOutcome>) {
        for outcome in outcomes {
            self.push(outcome);
        }
    }

    pub fn applied_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_applied()).count()
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.is_failed())
    }

    /// True when a second run would have nothing left to apply.
    pub fn is_noop(&self) -> bool {
        self.applied_count() == 0
    }

    /// A run succeeds unless its verification explicitly failed. Failed
    /// best-effort steps are warnings.
    pub fn succeeded(&self) -> bool {
        self.verified != Some(false)
    }

    pub fn step(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == name)
    }

    pub fn log_summary(&self) {
        let warnings = self.failed_steps().count();
        let skipped = self.steps.len() - self.applied_count() - warnings;
        tracing::info!(
            "📊 {}: {} applied, {} skipped, {} warnings",
            self.name,
            self.applied_count(),
            skipped,
            warnings
        );
        match self.verified {
            Some(true) => tracing::info!("✅ {} verified", self.name),
            Some(false) => tracing::error!("❌ {} verification failed", self.name),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_success() {
        let mut report = MigrationReport::new("demo");
        report.push(StepOutcome::applied("add column a"));
        report.push(StepOutcome::skipped("add column b", "already exists"));
        report.push(StepOutcome::failed("create index c", "permission denied"));

        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.failed_steps().count(), 1);
        assert!(!report.is_noop());
        assert!(report.succeeded());

        report.verified = Some(false);
        assert!(!report.succeeded());
    }
}
