pub mod checkpoint;
pub mod core;
pub mod source;
pub mod stats;

pub use checkpoint::{CheckpointError, CheckpointSink, JsonFileCheckpoint, MemoryCheckpoint};
pub use core::{ConfigError, ExtractionOutcome, Extractor, ExtractorConfig, TokenAdvance};
pub use source::{GraphqlProductSource, GraphqlSourceConfig, MockPageSource, Page, PageSource};
pub use source::SourceError;
pub use stats::{ExtractionSnapshot, ExtractionStats};
