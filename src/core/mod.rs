mod config;
mod errors;
mod extractor;

pub use config::{ExtractorConfig, TokenAdvance};
pub use errors::ConfigError;
pub use extractor::{ExtractionOutcome, Extractor};
