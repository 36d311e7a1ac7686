//! Pass 3: whole-deck inconsistency analysis.

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::prompts::build_analysis_prompt;
use crate::response::parse_json;
use crate::service::{ReasoningService, Request, RequestKind};
use crate::types::{ClaimGroups, Finding};

#[derive(Debug, Deserialize)]
struct AnalysisReply {
    #[serde(default)]
    findings: Vec<Finding>,
}

/// Result of the analysis pass.
///
/// An empty `Completed` and a `Failed` both render as "no inconsistencies";
/// keeping them apart lets callers and tests tell which happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The service answered with a parseable findings list.
    Completed(Vec<Finding>),
    /// The call or its parsing failed; carries the error text.
    Failed(String),
    /// Analysis never ran because there was nothing to analyze.
    Skipped,
}

impl Analysis {
    /// Findings to report. Empty unless the call completed with findings.
    pub fn findings(&self) -> &[Finding] {
        match self {
            Analysis::Completed(findings) => findings,
            Analysis::Failed(_) | Analysis::Skipped => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Analysis::Failed(_))
    }
}

/// Sends the full grouped dataset to the reasoning service in one call.
pub struct InconsistencyAnalyzer<'s, S: ?Sized> {
    service: &'s S,
    config: &'s PipelineConfig,
}

impl<'s, S: ReasoningService + ?Sized> InconsistencyAnalyzer<'s, S> {
    pub fn new(service: &'s S, config: &'s PipelineConfig) -> Self {
        Self { service, config }
    }

    /// Run the analysis. Failures are logged and reported as [`Analysis::Failed`].
    pub fn analyze(&self, groups: &ClaimGroups) -> Analysis {
        log::info!(
            "Sending {} categories ({} claims) for inconsistency analysis",
            groups.len(),
            groups.claim_count()
        );

        match self.request_findings(groups) {
            Ok(findings) => {
                log::info!("Analysis complete: {} findings", findings.len());
                Analysis::Completed(findings)
            }
            Err(e) => {
                log::error!("Inconsistency analysis failed: {}", e);
                Analysis::Failed(e.to_string())
            }
        }
    }

    fn request_findings(&self, groups: &ClaimGroups) -> Result<Vec<Finding>> {
        let dataset = serde_json::to_string_pretty(groups)?;
        let prompt = build_analysis_prompt(&dataset);
        let request = Request::new(RequestKind::Analysis, self.config.analysis_timeout).text(&prompt);

        let reply = self.service.generate(&request)?;
        let parsed: AnalysisReply = parse_json(&reply)?;
        Ok(parsed.findings)
    }
}
