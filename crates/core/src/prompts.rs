//! Instructions sent to the reasoning service for each pass.

/// Instruction for pass 1: pull claims out of one slide.
pub const EXTRACTION_PROMPT: &str = r#"You are a meticulous data analyst. Read the attached presentation slide and extract every factual claim on it, both textual and numerical, as structured JSON.

Give each claim a semantic category so that claims from different slides can be compared even when they are worded differently. Do NOT convert or normalize any values at this stage.

Respond with a JSON object holding a list named "elements". Each element has exactly these keys:
- "metric_category": a standardized snake_case category name (for example "total_productivity_savings_usd", "time_saved_per_slide", "competitor_time_savings", "total_time_savings_claim", "feature_time_savings_breakdown", "qualitative_claim").
- "feature_name": when the category is a breakdown item, the name of the feature (for example "Automated Formatting"); otherwise null.
- "text_content": the raw text exactly as it appears on the slide.
- "numerical_value": the number stated, if any (for "$2M" this is 2000000); otherwise null.
- "unit": the unit stated, if any (for example "USD", "hours", "minutes"); otherwise null.

Output the JSON only."#;

/// Heading placed before slide text when the slide is sent as text.
pub const SLIDE_TEXT_HEADING: &str = "Slide text (in reading order):";

/// Instruction for pass 2, with `{json_list}` standing for one category bucket.
const NORMALIZATION_TEMPLATE: &str = r#"You are a precise unit normalization engine. The JSON list below holds objects that all belong to the SAME semantic category but were extracted from different slides.

Normalize every item to one consistent unit:
1. Look at every unit present in the list (for example "hours" and "minutes").
2. Pick the most sensible common base unit for comparison (for durations, "hours" is usually best).
3. Return the whole list again, adding two keys to every object: "normalized_value" and "normalized_unit". Keep all existing keys, including "slide", unchanged.
4. Convert accurately. For time, 60 minutes = 1 hour. For currency, "$2M" = 2000000.
5. Output ONLY the updated JSON list.

Data to normalize:
{json_list}"#;

/// Instruction for pass 3, with `{grouped_data_json}` standing for the dataset.
const ANALYSIS_TEMPLATE: &str = r#"You are a rigorous logical and factual analyst. Below is the complete set of claims extracted from a multi-slide presentation, grouped by category and normalized where possible.

Examine the whole dataset and find ALL factual and logical inconsistencies. Look specifically for:
1. **Direct Numerical Contradictions:** the same metric (for example "total_productivity_savings_usd") carries different values on different slides.
2. **Incorrect Summations:** a stated total (for example "total_time_savings_claim") does not equal the sum of its parts (for example "feature_time_savings_breakdown").
3. **Logical Contradictions:** a qualitative claim (for example "Tool X is superior") is contradicted by quantitative data (for example Tool X saves less time than Tool Y).
4. **Omissions & Incompleteness:** a list of features or benefits on one slide differs from a list on another slide.

Respond with a single JSON object holding a list named "findings". Each finding has these keys:
- "type_of_inconsistency": the kind of problem (for example "Incorrect Summation").
- "description": a clear paragraph explaining the inconsistency.
- "evidence": a list of the exact text snippets, with their slide numbers, that demonstrate it.

Dataset:
{grouped_data_json}"#;

/// Build the normalization prompt for one bucket rendered as JSON.
pub fn build_normalization_prompt(json_list: &str) -> String {
    NORMALIZATION_TEMPLATE.replace("{json_list}", json_list)
}

/// Build the analysis prompt for the full grouped dataset rendered as JSON.
pub fn build_analysis_prompt(grouped_data_json: &str) -> String {
    ANALYSIS_TEMPLATE.replace("{grouped_data_json}", grouped_data_json)
}
