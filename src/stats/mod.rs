use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSnapshot {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub pages_fetched: usize,
    pub records_collected: usize,
    pub expected_total: Option<usize>,
    pub failed_attempts: usize,
    pub failure_reasons: HashMap<String, usize>,
    pub checkpoints_written: usize,
    pub checkpoint_failures: usize,
}

/// Run counters for one extraction. Cloneable handle, shared interior.
#[derive(Debug, Clone)]
pub struct ExtractionStats {
    stats: Arc<RwLock<ExtractionSnapshot>>,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ExtractionSnapshot {
                start_time: Utc::now(),
                end_time: None,
                pages_fetched: 0,
                records_collected: 0,
                expected_total: None,
                failed_attempts: 0,
                failure_reasons: HashMap::new(),
                checkpoints_written: 0,
                checkpoint_failures: 0,
            })),
        }
    }

    pub fn set_expected_total(&self, total: usize) {
        self.stats.write().expected_total = Some(total);
    }

    pub fn record_page(&self, records: usize) {
        let mut stats = self.stats.write();
        stats.pages_fetched += 1;
        stats.records_collected += records;
    }

    pub fn record_failure(&self, reason: &str) {
        let mut stats = self.stats.write();
        stats.failed_attempts += 1;
        *stats.failure_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn record_checkpoint(&self) {
        self.stats.write().checkpoints_written += 1;
    }

    pub fn record_checkpoint_failure(&self) {
        self.stats.write().checkpoint_failures += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ExtractionSnapshot {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nExtraction Summary:");
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Pages Fetched: {}", stats.pages_fetched);
        match stats.expected_total {
            Some(expected) => {
                println!("Expected Records: {}", expected);
                println!("Collected Records: {}", stats.records_collected);
                println!(
                    "Difference: {}",
                    expected as i64 - stats.records_collected as i64
                );
            }
            None => {
                println!("Expected Records: unknown");
                println!("Collected Records: {}", stats.records_collected);
            }
        }
        println!("Failed Attempts: {}", stats.failed_attempts);
        println!(
            "Checkpoints Written: {} ({} failed)",
            stats.checkpoints_written, stats.checkpoint_failures
        );

        if !stats.failure_reasons.is_empty() {
            println!("\nFailure Reasons:");
            for (reason, count) in &stats.failure_reasons {
                println!("  {}: {}", reason, count);
            }
        }
    }
}

impl Default for ExtractionStats {
    fn default() -> Self {
        Self::new()
    }
}
