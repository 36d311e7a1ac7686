//! Core types and passes for finding inconsistent claims across a slide deck.
//!
//! The reasoning itself (reading slides, converting units, spotting
//! contradictions) is done by an external model behind [`ReasoningService`];
//! this crate builds the prompts, parses the replies and sequences the passes.

pub mod analyze;
pub mod auditor;
pub mod config;
pub mod error;
pub mod extract;
pub mod group;
pub mod normalize;
pub mod prompts;
pub mod report;
pub mod response;
pub mod service;
pub mod source;
pub mod types;

pub use analyze::{Analysis, InconsistencyAnalyzer};
pub use auditor::{AuditReport, Auditor, Stage};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use extract::ClaimExtractor;
pub use group::group_claims;
pub use normalize::UnitNormalizer;
pub use report::ReportRenderer;
pub use response::{parse_json, unwrap_code_fence};
pub use service::{Part, ReasoningService, Request, RequestKind};
pub use source::{FolderSource, SlideSource};
pub use types::{Claim, ClaimGroups, Finding, Slide, SlideContent};
