//! Human-readable inconsistency report.
//!
//! Produces plain text like:
//!
//! ```text
//! ==============================
//!   INCONSISTENCY REPORT
//! ==============================
//!
//! 1. Direct Numerical Contradiction
//!    Analysis: Slide 2 claims 10 hours, slide 4 claims 12 hours.
//!    Evidence:
//!      - Slide 2: "Saves 10 hours"
//!      - Slide 4: "Saves 12 hours"
//!
//! --- END OF REPORT ---
//! ```

use std::fmt::Write;

use crate::analyze::Analysis;
use crate::types::Finding;

/// Message printed when there is nothing to report.
pub const NO_INCONSISTENCIES: &str = "The reasoning service reported no inconsistencies.";

/// Appended to the empty report when the analysis call itself failed.
pub const ANALYSIS_FAILED_NOTE: &str =
    "Note: the analysis call did not complete, so this result may be incomplete. See the log for details.";

const TITLE: &str = "INCONSISTENCY REPORT";
const FOOTER: &str = "--- END OF REPORT ---";

/// Formatter for the final report.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    /// Width of the `=` rule around the title.
    rule_width: usize,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self { rule_width: 30 }
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the width of the header rule.
    pub fn with_rule_width(mut self, width: usize) -> Self {
        self.rule_width = width.max(TITLE.len() + 2);
        self
    }

    /// Render findings only, without any failure note.
    pub fn render_findings(&self, findings: &[Finding]) -> String {
        let mut out = self.header();

        if findings.is_empty() {
            out.push_str(NO_INCONSISTENCIES);
            out.push('\n');
            return out;
        }

        for (i, finding) in findings.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, finding.type_of_inconsistency);
            let _ = writeln!(out, "   Analysis: {}", finding.description);
            if !finding.evidence.is_empty() {
                out.push_str("   Evidence:\n");
                for item in &finding.evidence {
                    let _ = writeln!(out, "     - {}", item);
                }
            }
            out.push('\n');
        }

        out.push_str(FOOTER);
        out.push('\n');
        out
    }

    /// Render an analysis outcome, noting when the analysis call failed.
    pub fn render(&self, analysis: &Analysis) -> String {
        let mut out = self.render_findings(analysis.findings());
        if analysis.is_failed() {
            out.push_str(ANALYSIS_FAILED_NOTE);
            out.push('\n');
        }
        out
    }

    fn header(&self) -> String {
        let rule = "=".repeat(self.rule_width);
        format!("{rule}\n  {TITLE}\n{rule}\n\n")
    }
}
