//! Clients for the external extraction service.

pub mod gemini_extraction_client;
pub mod prompt;

pub use gemini_extraction_client::GeminiExtractionClient;
pub use prompt::ExtractionPrompt;
