//! Pass 2: per-category unit normalization.
//!
//! Only buckets with several claims and at least one number are sent to the
//! service. The reply replaces the bucket as-is; its arithmetic is not
//! checked. Any failure keeps the original bucket.

use std::thread;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::prompts::build_normalization_prompt;
use crate::response::parse_json;
use crate::service::{ReasoningService, Request, RequestKind};
use crate::types::{Claim, ClaimGroups};

/// Whether a bucket is worth a normalization call.
pub fn needs_normalization(claims: &[Claim]) -> bool {
    claims.len() > 1 && claims.iter().any(|c| c.numerical_value.is_some())
}

/// Asks the reasoning service to bring each bucket to a single unit.
pub struct UnitNormalizer<'s, S: ?Sized> {
    service: &'s S,
    config: &'s PipelineConfig,
}

impl<'s, S: ReasoningService + ?Sized> UnitNormalizer<'s, S> {
    pub fn new(service: &'s S, config: &'s PipelineConfig) -> Self {
        Self { service, config }
    }

    /// Normalize every bucket, in order, returning the new grouping.
    pub fn normalize_all(&self, groups: ClaimGroups) -> ClaimGroups {
        log::info!("Normalizing units across {} categories", groups.len());

        let normalized: ClaimGroups = groups
            .into_iter()
            .map(|(category, claims)| {
                let claims = self.normalize_group(&category, claims);
                (category, claims)
            })
            .collect();

        log::info!("Normalization complete. {} categories processed", normalized.len());
        normalized
    }

    /// Normalize a single bucket, falling back to the input on failure.
    pub fn normalize_group(&self, category: &str, claims: Vec<Claim>) -> Vec<Claim> {
        if !needs_normalization(&claims) {
            return claims;
        }

        log::info!("Normalizing category '{}' ({} claims)", category, claims.len());
        let outcome = self.request_normalization(&claims);

        // Pace the next call whether or not this one succeeded.
        if !self.config.throttle.is_zero() {
            thread::sleep(self.config.throttle);
        }

        match outcome {
            Ok(mut normalized) => {
                if normalized.len() == claims.len() {
                    backfill_slides(&mut normalized, &claims);
                }
                normalized
            }
            Err(e) => {
                log::error!("Normalization failed for category '{}': {}", category, e);
                claims
            }
        }
    }

    fn request_normalization(&self, claims: &[Claim]) -> Result<Vec<Claim>> {
        let json_list = serde_json::to_string_pretty(claims)?;
        let prompt = build_normalization_prompt(&json_list);
        let request =
            Request::new(RequestKind::Normalization, self.config.normalization_timeout).text(&prompt);

        let reply = self.service.generate(&request)?;
        parse_json(&reply)
    }
}

/// Give reply claims that came back without a slide number the number of
/// the input claim at the same position.
fn backfill_slides(normalized: &mut [Claim], original: &[Claim]) {
    for (claim, source) in normalized.iter_mut().zip(original) {
        if claim.slide == 0 {
            claim.slide = source.slide;
        }
    }
}
