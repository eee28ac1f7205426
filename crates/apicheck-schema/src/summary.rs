//! Aggregation of many validation outcomes into one report.
//!
//! A test run validates dozens of calls. Failures should not abort the run,
//! so callers record each [`ValidationOutcome`] under a label and print the
//! summary at the end. Skips are deduplicated by label in the report: the
//! same undocumented endpoint hit ten times is one missing schema.

use std::collections::BTreeSet;
use std::fmt;

use crate::outcome::ValidationOutcome;

/// Failures shown in full before the report truncates.
const MAX_LISTED_FAILURES: usize = 20;

/// One recorded non-passing outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub label: String,
    pub message: String,
}

/// Running tally of validation outcomes.
#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    passed: usize,
    failures: Vec<SummaryEntry>,
    skips: Vec<SummaryEntry>,
}

impl ValidationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` under `label` (typically `"<module>: <METHOD> <path> <status>"`).
    pub fn record(&mut self, label: impl Into<String>, outcome: &ValidationOutcome) {
        match outcome {
            ValidationOutcome::Passed => self.passed += 1,
            ValidationOutcome::Skipped { message } => self.skips.push(SummaryEntry {
                label: label.into(),
                message: message.clone(),
            }),
            ValidationOutcome::Failed { message, .. } => self.failures.push(SummaryEntry {
                label: label.into(),
                message: message.clone(),
            }),
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn skipped(&self) -> usize {
        self.skips.len()
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed() + self.skipped()
    }

    /// `true` when nothing failed. Skips do not count against a run.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[SummaryEntry] {
        &self.failures
    }

    pub fn skips(&self) -> &[SummaryEntry] {
        &self.skips
    }

    /// Distinct skipped labels, in first-seen order.
    pub fn unique_skips(&self) -> Vec<&SummaryEntry> {
        let mut seen = BTreeSet::new();
        self.skips
            .iter()
            .filter(|entry| seen.insert(entry.label.as_str()))
            .collect()
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: ValidationSummary) {
        self.passed += other.passed;
        self.failures.extend(other.failures);
        self.skips.extend(other.skips);
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "schema validation: {} checked, {} passed, {} failed, {} skipped",
            self.total(),
            self.passed,
            self.failed(),
            self.skipped()
        )?;

        if !self.failures.is_empty() {
            writeln!(f, "\nfailed:")?;
            for (idx, entry) in self.failures.iter().take(MAX_LISTED_FAILURES).enumerate() {
                writeln!(f, "  {}. {}", idx + 1, entry.label)?;
                for line in entry.message.lines() {
                    writeln!(f, "     {line}")?;
                }
            }
            if self.failures.len() > MAX_LISTED_FAILURES {
                writeln!(f, "  ... and {} more", self.failures.len() - MAX_LISTED_FAILURES)?;
            }
        }

        let unique = self.unique_skips();
        if !unique.is_empty() {
            writeln!(f, "\nno schema defined:")?;
            for (idx, entry) in unique.iter().enumerate() {
                writeln!(f, "  {}. {}", idx + 1, entry.label)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> ValidationOutcome {
        ValidationOutcome::Failed {
            message: message.to_string(),
            violations: Vec::new(),
        }
    }

    fn skipped() -> ValidationOutcome {
        ValidationOutcome::Skipped {
            message: "schema not found: x".to_string(),
        }
    }

    #[test]
    fn counts_and_cleanliness() {
        let mut summary = ValidationSummary::new();
        assert!(summary.is_clean());
        summary.record("user: GET /users 200", &ValidationOutcome::Passed);
        summary.record("news: GET /news 200", &skipped());
        assert!(summary.is_clean());
        summary.record("user: POST /users/register 201", &failed("schema validation failed"));
        assert!(!summary.is_clean());
        assert_eq!(
            (summary.total(), summary.passed(), summary.failed(), summary.skipped()),
            (3, 1, 1, 1)
        );
    }

    #[test]
    fn skips_are_deduplicated_in_report() {
        let mut summary = ValidationSummary::new();
        for _ in 0..3 {
            summary.record("news: GET /news 200", &skipped());
        }
        summary.record("forum: GET /forum/posts 200", &skipped());
        assert_eq!(summary.skipped(), 4);
        let labels: Vec<&str> = summary.unique_skips().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["news: GET /news 200", "forum: GET /forum/posts 200"]);
    }

    #[test]
    fn report_lists_failures_with_indented_messages() {
        let mut summary = ValidationSummary::new();
        summary.record(
            "user: POST /users/register 201",
            &failed(concat!(
                "schema validation failed (POST /users/register 201):\n",
                "  - user: \"id\" is a required property"
            )),
        );
        summary.record("news: GET /news 200", &skipped());
        let report = summary.to_string();
        let header = "schema validation: 2 checked, 0 passed, 1 failed, 1 skipped\n";
        assert!(report.starts_with(header), "{report}");
        assert!(report.contains("  1. user: POST /users/register 201\n"));
        assert!(report.contains("       - user: \"id\" is a required property\n"));
        assert!(report.contains("no schema defined:\n  1. news: GET /news 200\n"));
    }

    #[test]
    fn long_failure_lists_are_truncated() {
        let mut summary = ValidationSummary::new();
        for i in 0..(MAX_LISTED_FAILURES + 3) {
            summary.record(format!("user: GET /users/{i} 200"), &failed("bad"));
        }
        assert!(summary.to_string().contains("... and 3 more"));
    }

    #[test]
    fn merge_adds_everything() {
        let mut a = ValidationSummary::new();
        a.record("a", &ValidationOutcome::Passed);
        let mut b = ValidationSummary::new();
        b.record("b", &failed("bad"));
        b.record("c", &skipped());
        a.merge(b);
        assert_eq!((a.passed(), a.failed(), a.skipped()), (1, 1, 1));
    }
}
