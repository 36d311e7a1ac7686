//! Pass 1: per-slide claim extraction.

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::prompts::{EXTRACTION_PROMPT, SLIDE_TEXT_HEADING};
use crate::response::parse_json;
use crate::service::{ReasoningService, Request, RequestKind};
use crate::types::{Claim, Slide, SlideContent};

/// Shape of an extraction reply. A reply without `elements` has no claims.
#[derive(Debug, Deserialize)]
struct ExtractionReply {
    #[serde(default)]
    elements: Vec<Claim>,
}

/// Sends slides to the reasoning service and collects their claims.
pub struct ClaimExtractor<'s, S: ?Sized> {
    service: &'s S,
    config: &'s PipelineConfig,
}

impl<'s, S: ReasoningService + ?Sized> ClaimExtractor<'s, S> {
    pub fn new(service: &'s S, config: &'s PipelineConfig) -> Self {
        Self { service, config }
    }

    /// Extract claims from every slide, in slide order.
    ///
    /// A failing slide is logged and contributes nothing; the rest carry on.
    pub fn extract_all(&self, slides: &[Slide]) -> Vec<Claim> {
        log::info!("Found {} slides for extraction", slides.len());

        let mut claims = Vec::new();
        for slide in slides {
            if slide.is_blank() {
                log::info!("Skipping slide {} ({}): no content", slide.number, slide.label);
                continue;
            }

            log::info!("Extracting from slide {} ({})", slide.number, slide.label);
            match self.extract_slide(slide) {
                Ok(found) => {
                    log::info!("Slide {}: {} items extracted", slide.number, found.len());
                    claims.extend(found);
                }
                Err(e) => {
                    log::error!("Extraction failed on slide {} ({}): {}", slide.number, slide.label, e);
                }
            }
        }

        claims
    }

    /// Extract claims from a single slide, stamping each with its number.
    pub fn extract_slide(&self, slide: &Slide) -> Result<Vec<Claim>> {
        let request = Request::new(RequestKind::Extraction, self.config.extraction_timeout)
            .text(EXTRACTION_PROMPT);

        let request = match &slide.content {
            SlideContent::Image { mime_type, data } => request.image(mime_type, data),
            SlideContent::Text(text) => request.text(SLIDE_TEXT_HEADING).text(text),
        };

        let reply = self.service.generate(&request)?;
        let parsed: ExtractionReply = parse_json(&reply)?;

        Ok(parsed
            .elements
            .into_iter()
            .map(|mut claim| {
                claim.slide = slide.number;
                claim
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::service::mock::ScriptedService;
    use std::time::Duration;

    fn image_slide(number: usize) -> Slide {
        Slide::image(number, format!("slide_{number}.png"), "image/png", vec![0x89, 0x50])
    }

    #[test]
    fn test_claims_are_stamped_with_slide_number() {
        let service = ScriptedService::new().reply(
            "```json\n{\"elements\": [{\"metric_category\": \"total_time_savings_claim\", \"text_content\": \"Saves 10 hours\", \"numerical_value\": 10, \"unit\": \"hours\", \"slide\": 99}]}\n```",
        );
        let config = PipelineConfig::default();
        let claims = ClaimExtractor::new(&service, &config).extract_all(&[image_slide(3)]);

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].slide, 3);
        assert_eq!(claims[0].numerical_value, Some(10.0));

        let calls = service.calls.borrow();
        assert_eq!(calls[0].kind, RequestKind::Extraction);
        assert_eq!(calls[0].image_count, 1);
    }

    #[test]
    fn test_failed_slide_does_not_stop_others() {
        let service = ScriptedService::new()
            .reply(r#"{"elements": [{"metric_category": "a", "text_content": "one"}]}"#)
            .reply("Sorry, I can't read this slide.")
            .fail(Error::Timeout(Duration::from_secs(120)))
            .reply(r#"{"elements": [{"metric_category": "b", "text_content": "four"}]}"#);
        let config = PipelineConfig::default();
        let slides: Vec<Slide> = (1..=4).map(image_slide).collect();

        let claims = ClaimExtractor::new(&service, &config).extract_all(&slides);

        assert_eq!(service.calls.borrow().len(), 4);
        let slides_seen: Vec<usize> = claims.iter().map(|c| c.slide).collect();
        assert_eq!(slides_seen, vec![1, 4]);
    }

    #[test]
    fn test_loose_element_does_not_drop_slide() {
        let service = ScriptedService::new().reply(
            r#"{"elements": [
                {"metric_category": "total_time_savings_claim", "text_content": "Saves 10 hours", "numerical_value": 10, "unit": "hours"},
                {"metric_category": "logo", "feature_name": null, "text_content": null, "numerical_value": null, "unit": null}
            ]}"#,
        );
        let config = PipelineConfig::default();

        let claims = ClaimExtractor::new(&service, &config).extract_all(&[image_slide(2)]);

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].numerical_value, Some(10.0));
        assert_eq!(claims[1].category(), Some("logo"));
        assert_eq!(claims[1].text_content, "");
        assert!(claims.iter().all(|c| c.slide == 2));
    }

    #[test]
    fn test_missing_elements_means_no_claims() {
        let service = ScriptedService::new().reply(r#"{"note": "nothing here"}"#);
        let config = PipelineConfig::default();

        let claims = ClaimExtractor::new(&service, &config)
            .extract_slide(&image_slide(1))
            .unwrap();
        assert!(claims.is_empty());
    }

    #[test]
    fn test_text_slide_is_sent_as_text() {
        let service = ScriptedService::new().reply(r#"{"elements": []}"#);
        let config = PipelineConfig::default();
        let slide = Slide::text(2, "ppt/slides/slide2.xml", "Saves 45 minutes per deck");

        ClaimExtractor::new(&service, &config).extract_all(&[slide]);

        let calls = service.calls.borrow();
        assert_eq!(calls[0].image_count, 0);
        assert!(calls[0].prompt.contains(SLIDE_TEXT_HEADING));
        assert!(calls[0].prompt.ends_with("Saves 45 minutes per deck"));
    }

    #[test]
    fn test_blank_slides_are_not_sent() {
        let service = ScriptedService::new();
        let config = PipelineConfig::default();
        let claims = ClaimExtractor::new(&service, &config).extract_all(&[Slide::text(1, "s", " ")]);

        assert!(claims.is_empty());
        assert!(service.calls.borrow().is_empty());
    }
}
