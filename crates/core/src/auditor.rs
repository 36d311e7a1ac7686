//! The pipeline driver: extract, group, normalize, analyze, report.

use std::fmt;

use crate::analyze::{Analysis, InconsistencyAnalyzer};
use crate::config::PipelineConfig;
use crate::extract::ClaimExtractor;
use crate::group::group_claims;
use crate::normalize::UnitNormalizer;
use crate::report::ReportRenderer;
use crate::service::ReasoningService;
use crate::types::{Claim, ClaimGroups, Finding, Slide};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Grouping,
    Normalizing,
    Analyzing,
    Reporting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// Claims straight out of extraction, in slide order.
    pub claims: Vec<Claim>,
    /// Grouped and, where possible, normalized claims.
    pub groups: ClaimGroups,
    pub analysis: Analysis,
    /// Rendered text report.
    pub rendered: String,
}

impl AuditReport {
    pub fn findings(&self) -> &[Finding] {
        self.analysis.findings()
    }
}

/// Runs the full pipeline over a deck against one reasoning service.
pub struct Auditor<S> {
    service: S,
    config: PipelineConfig,
    renderer: ReportRenderer,
    stage: Stage,
}

impl<S: ReasoningService> Auditor<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            config: PipelineConfig::default(),
            renderer: ReportRenderer::default(),
            stage: Stage::Idle,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The stage the last (or current) run reached.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run every pass over `slides`.
    ///
    /// Service failures only degrade the result; this never fails. If no
    /// claims are extracted, the later passes are skipped entirely.
    pub fn run(&mut self, slides: &[Slide]) -> AuditReport {
        log::info!("Starting deck analysis over {} slides", slides.len());

        self.enter(Stage::Extracting);
        let claims = ClaimExtractor::new(&self.service, &self.config).extract_all(slides);

        if claims.is_empty() {
            log::warn!("No claims were extracted; skipping analysis");
            self.enter(Stage::Done);
            return AuditReport {
                claims,
                groups: ClaimGroups::new(),
                rendered: self.renderer.render(&Analysis::Skipped),
                analysis: Analysis::Skipped,
            };
        }

        self.enter(Stage::Grouping);
        let groups = group_claims(claims.iter().cloned());

        self.enter(Stage::Normalizing);
        let groups = UnitNormalizer::new(&self.service, &self.config).normalize_all(groups);

        self.enter(Stage::Analyzing);
        let analysis = InconsistencyAnalyzer::new(&self.service, &self.config).analyze(&groups);

        self.enter(Stage::Reporting);
        let rendered = self.renderer.render(&analysis);

        self.enter(Stage::Done);
        AuditReport {
            claims,
            groups,
            analysis,
            rendered,
        }
    }

    fn enter(&mut self, next: Stage) {
        log::debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
    }
}
