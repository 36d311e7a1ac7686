//! Domain types for slides, extracted claims, and findings.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single slide ready to be sent to the reasoning service.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Human-readable origin (file name or archive path), used in logs.
    pub label: String,

    /// What the service will look at.
    pub content: SlideContent,
}

impl Slide {
    /// Create an image slide.
    pub fn image(
        number: usize,
        label: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            number,
            label: label.into(),
            content: SlideContent::Image {
                mime_type: mime_type.into(),
                data,
            },
        }
    }

    /// Create a text slide.
    pub fn text(number: usize, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            number,
            label: label.into(),
            content: SlideContent::Text(text.into()),
        }
    }

    /// Whether there is anything on this slide worth sending.
    pub fn is_blank(&self) -> bool {
        match &self.content {
            SlideContent::Image { data, .. } => data.is_empty(),
            SlideContent::Text(text) => text.trim().is_empty(),
        }
    }
}

/// Slide payload: a rendered image or text pulled from the presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideContent {
    /// Encoded image bytes (JPEG or PNG).
    Image { mime_type: String, data: Vec<u8> },
    /// Plain text in reading order.
    Text(String),
}

/// One factual assertion extracted from a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// 1-based number of the slide the claim came from; 0 until stamped.
    #[serde(default, deserialize_with = "lenient_slide")]
    pub slide: usize,

    /// Semantic category label shared by comparable claims.
    #[serde(default, deserialize_with = "lenient_string")]
    pub metric_category: Option<String>,

    /// Feature name for breakdown items.
    #[serde(default, deserialize_with = "lenient_string")]
    pub feature_name: Option<String>,

    /// Raw text as it appears on the slide.
    #[serde(default, deserialize_with = "lenient_text")]
    pub text_content: String,

    #[serde(default, deserialize_with = "lenient_number")]
    pub numerical_value: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub normalized_value: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub normalized_unit: Option<String>,
}

impl Claim {
    /// Create a claim with only a category and text; the rest is unset.
    pub fn new(slide: usize, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            slide,
            metric_category: Some(category.into()),
            feature_name: None,
            text_content: text.into(),
            numerical_value: None,
            unit: None,
            normalized_value: None,
            normalized_unit: None,
        }
    }

    /// Attach a raw numeric value and unit.
    pub fn with_value(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.numerical_value = Some(value);
        self.unit = Some(unit.into());
        self
    }

    /// Attach a feature name.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature_name = Some(feature.into());
        self
    }

    /// The category, if present and non-empty.
    pub fn category(&self) -> Option<&str> {
        self.metric_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Accept numbers and numeric strings ("1,200", "4.5"); anything else is null.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

/// Strings stay strings, other scalars are stringified, null is absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

/// Like [`lenient_string`], but null becomes an empty string.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Slide numbers as integers, floats or numeric strings; anything else is 0.
fn lenient_slide<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let number = lenient_number(deserializer)?;
    Ok(number
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as usize)
        .unwrap_or(0))
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Claims bucketed by category, in first-seen category order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimGroups {
    groups: Vec<(String, Vec<Claim>)>,
}

impl ClaimGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a claim to its category bucket, creating the bucket if needed.
    pub fn push(&mut self, category: &str, claim: Claim) {
        match self.groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, claims)) => claims.push(claim),
            None => self.groups.push((category.to_string(), vec![claim])),
        }
    }

    /// Insert or replace a whole bucket, keeping its position if it exists.
    pub fn insert(&mut self, category: impl Into<String>, claims: Vec<Claim>) {
        let category = category.into();
        match self.groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = claims,
            None => self.groups.push((category, claims)),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[Claim]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, claims)| claims.as_slice())
    }

    /// Category names in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Claim])> {
        self.groups
            .iter()
            .map(|(name, claims)| (name.as_str(), claims.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total claims across all buckets.
    pub fn claim_count(&self) -> usize {
        self.groups.iter().map(|(_, claims)| claims.len()).sum()
    }
}

impl IntoIterator for ClaimGroups {
    type Item = (String, Vec<Claim>);
    type IntoIter = std::vec::IntoIter<(String, Vec<Claim>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl FromIterator<(String, Vec<Claim>)> for ClaimGroups {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Claim>)>>(iter: I) -> Self {
        let mut groups = ClaimGroups::new();
        for (category, claims) in iter {
            groups.insert(category, claims);
        }
        groups
    }
}

// Serialized as a JSON object whose keys keep insertion order.
impl Serialize for ClaimGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, claims) in &self.groups {
            map.serialize_entry(category, claims)?;
        }
        map.end()
    }
}

/// An inconsistency reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default = "unknown_issue")]
    pub type_of_inconsistency: String,

    #[serde(default = "no_description")]
    pub description: String,

    /// Text snippets and slide references backing the finding.
    #[serde(default, deserialize_with = "lenient_evidence")]
    pub evidence: Vec<String>,
}

fn unknown_issue() -> String {
    "Unknown Issue".to_string()
}

fn no_description() -> String {
    "No description provided.".to_string()
}

/// Evidence should be strings; objects or numbers are kept as compact JSON.
fn lenient_evidence<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => vec![other],
    };

    Ok(items
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}
