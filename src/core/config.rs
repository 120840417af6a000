use std::time::Duration;

use super::errors::ConfigError;

/// How the extractor derives the token for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAdvance {
    /// Follow the opaque `next_token` handed back by the source.
    Cursor,
    /// Numeric offset: next token is the current offset plus `page_size`.
    Offset,
}

/// Run parameters for an extraction. Passed explicitly at construction;
/// there is no process-wide configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub page_size: usize,
    pub inter_request_delay: Duration,
    pub max_consecutive_failures: usize,
    /// Checkpoint whenever the collected count lands on a multiple of this.
    pub checkpoint_every: usize,
    pub token_advance: TokenAdvance,
    pub initial_token: String,
    /// Known total up front. When `None`, the priming fetch probes the
    /// source's envelope for one, best-effort.
    pub expected_total: Option<usize>,
    /// Minimum spacing between info-level progress lines.
    pub progress_log_interval: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            inter_request_delay: Duration::from_secs(1),
            max_consecutive_failures: 5,
            checkpoint_every: 500,
            token_advance: TokenAdvance::Cursor,
            initial_token: "0".to_string(),
            expected_total: None,
            progress_log_interval: Duration::from_secs(5),
        }
    }
}

impl ExtractorConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    pub fn with_max_consecutive_failures(mut self, budget: usize) -> Self {
        self.max_consecutive_failures = budget;
        self
    }

    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    pub fn with_token_advance(mut self, advance: TokenAdvance) -> Self {
        self.token_advance = advance;
        self
    }

    pub fn with_initial_token(mut self, token: impl Into<String>) -> Self {
        self.initial_token = token.into();
        self
    }

    pub fn with_expected_total(mut self, total: usize) -> Self {
        self.expected_total = Some(total);
        self
    }

    pub fn with_progress_log_interval(mut self, interval: Duration) -> Self {
        self.progress_log_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.checkpoint_every == 0 {
            return Err(ConfigError::ZeroCheckpointCadence);
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::ZeroFailureBudget);
        }
        Ok(())
    }
}
