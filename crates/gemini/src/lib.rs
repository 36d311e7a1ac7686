//! Gemini backend for the deckcheck reasoning service.

pub mod client;

pub use client::{GeminiClient, GeminiConfig, ENV_API_KEY};
