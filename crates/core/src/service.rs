//! The reasoning service boundary.
//!
//! Everything the pipeline knows about the external model goes through
//! [`ReasoningService`]: a request made of text and image parts goes in, raw
//! text comes out. Callers treat that text as untrusted.

use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Which pipeline pass a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Extraction,
    Normalization,
    Analysis,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Extraction => "extraction",
            RequestKind::Normalization => "normalization",
            RequestKind::Analysis => "analysis",
        };
        f.write_str(name)
    }
}

/// One piece of a multimodal prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Part<'a> {
    Text(&'a str),
    Image { mime_type: &'a str, data: &'a [u8] },
}

/// A single call to the reasoning service.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub kind: RequestKind,
    pub parts: Vec<Part<'a>>,
    /// Upper bound on how long the call may take.
    pub timeout: Duration,
}

impl<'a> Request<'a> {
    pub fn new(kind: RequestKind, timeout: Duration) -> Self {
        Self {
            kind,
            parts: Vec::new(),
            timeout,
        }
    }

    /// Append a text part.
    pub fn text(mut self, text: &'a str) -> Self {
        self.parts.push(Part::Text(text));
        self
    }

    /// Append an inline image part.
    pub fn image(mut self, mime_type: &'a str, data: &'a [u8]) -> Self {
        self.parts.push(Part::Image { mime_type, data });
        self
    }

    /// Concatenated text parts, handy for logging and test doubles.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(*t),
                Part::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A model that turns a prompt into text.
///
/// Implementations must be synchronous and honour `request.timeout`. They
/// should not retry; the pipeline decides how to degrade on failure.
pub trait ReasoningService {
    fn generate(&self, request: &Request<'_>) -> Result<String>;
}

impl<S: ReasoningService + ?Sized> ReasoningService for &S {
    fn generate(&self, request: &Request<'_>) -> Result<String> {
        (**self).generate(request)
    }
}

impl<S: ReasoningService + ?Sized> ReasoningService for Box<S> {
    fn generate(&self, request: &Request<'_>) -> Result<String> {
        (**self).generate(request)
    }
}
