//! Pipeline tuning: per-pass timeouts and the normalization throttle.

use std::time::Duration;

/// Timeouts and pacing for the three service passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Per-slide extraction call.
    pub extraction_timeout: Duration,

    /// Per-category normalization call.
    pub normalization_timeout: Duration,

    /// The single whole-dataset analysis call.
    pub analysis_timeout: Duration,

    /// Pause after each normalization call to stay under upstream rate limits.
    pub throttle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_secs(120),
            normalization_timeout: Duration::from_secs(240),
            analysis_timeout: Duration::from_secs(300),
            throttle: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause between normalization calls.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Scale all three timeouts, keeping their ordering.
    pub fn with_timeout_scale(mut self, factor: u32) -> Self {
        let factor = factor.max(1);
        self.extraction_timeout *= factor;
        self.normalization_timeout *= factor;
        self.analysis_timeout *= factor;
        self
    }
}
