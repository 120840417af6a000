use std::time::Instant;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::checkpoint::CheckpointSink;
use crate::source::{Page, PageSource, SourceError};
use crate::stats::ExtractionStats;

use super::config::{ExtractorConfig, TokenAdvance};
use super::errors::ConfigError;

/// How a run ended. Budget exhaustion is surfaced as `Aborted` with the
/// partial records attached rather than being passed off as success, so
/// callers can branch on it.
#[derive(Debug)]
pub enum ExtractionOutcome<T> {
    /// The source was drained, or the expected total was reached.
    Complete(Vec<T>),
    /// The consecutive-failure budget ran out before exhaustion.
    Aborted {
        records: Vec<T>,
        reason: SourceError,
        consecutive_failures: usize,
    },
}

impl<T> ExtractionOutcome<T> {
    pub fn records(&self) -> &[T] {
        match self {
            Self::Complete(records) => records,
            Self::Aborted { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::Complete(records) => records,
            Self::Aborted { records, .. } => records,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Mutable run state. Single-owner, mutated only between pagination steps,
/// dropped when the run ends.
struct ExtractionState<T> {
    accumulated: Vec<T>,
    expected_total: Option<usize>,
    current_token: String,
    consecutive_failures: usize,
}

impl<T> ExtractionState<T> {
    fn new(config: &ExtractorConfig) -> Self {
        Self {
            accumulated: Vec::new(),
            expected_total: config.expected_total,
            current_token: config.initial_token.clone(),
            consecutive_failures: 0,
        }
    }

    fn collected(&self) -> usize {
        self.accumulated.len()
    }

    fn within_expected(&self) -> bool {
        self.expected_total
            .map_or(true, |total| self.collected() < total)
    }

    /// Folds one page into the run. Validates the page before touching any
    /// state, so a malformed page leaves the run exactly where it was and
    /// the same token is retried. Returns `true` when the source reported
    /// exhaustion.
    fn ingest(
        &mut self,
        page: Page<T>,
        advance: TokenAdvance,
        page_size: usize,
    ) -> Result<bool, SourceError> {
        let next_token = if page.has_more {
            Some(next_token(&self.current_token, &page, advance, page_size)?)
        } else {
            None
        };

        self.accumulated.extend(page.records);
        self.consecutive_failures = 0;
        if let Some(token) = next_token {
            self.current_token = token;
        }

        Ok(!page.has_more)
    }
}

fn next_token<T>(
    current: &str,
    page: &Page<T>,
    advance: TokenAdvance,
    page_size: usize,
) -> Result<String, SourceError> {
    match advance {
        TokenAdvance::Cursor => page.next_token.clone().ok_or_else(|| {
            SourceError::Shape("has_more is set but next_token is missing".to_string())
        }),
        TokenAdvance::Offset => {
            let offset: usize = current.parse().map_err(|_| {
                SourceError::Shape(format!("offset token is not numeric: {current:?}"))
            })?;
            Ok((offset + page_size).to_string())
        }
    }
}

/// Drives a cursor/offset pagination loop against a [`PageSource`]: strictly
/// sequential fetches, linear backoff on transient failures, periodic
/// checkpoints to a [`CheckpointSink`], termination on exhaustion or when the
/// consecutive-failure budget runs out.
pub struct Extractor {
    config: ExtractorConfig,
    stats: ExtractionStats,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stats: ExtractionStats::new(),
        })
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Runs the extraction to its end. Every per-page error is handled
    /// inside the loop; the only escalation is the `Aborted` outcome.
    pub async fn extract_all<S, C>(&self, source: &S, sink: &C) -> ExtractionOutcome<S::Record>
    where
        S: PageSource + ?Sized,
        C: CheckpointSink<S::Record> + ?Sized,
    {
        let config = &self.config;
        let mut state = ExtractionState::new(config);
        if let Some(total) = state.expected_total {
            self.stats.set_expected_total(total);
        }

        let mut last_progress: Option<Instant> = None;
        let mut exhausted = false;

        // Priming: one best-effort fetch to learn the total from the result
        // envelope. A failure here does not count against the budget; the
        // loop simply runs unbounded, governed by has_more. Records from a
        // successful priming page are kept, not re-fetched.
        if state.expected_total.is_none() {
            info!("priming fetch (token={})", state.current_token);
            match source.fetch_page(&state.current_token).await {
                Ok(page) => {
                    if let Some(total) = page.total_count {
                        info!("source reports {total} total records");
                        state.expected_total = Some(total);
                        self.stats.set_expected_total(total);
                    } else {
                        debug!("source reports no total; driving loop from has_more");
                    }
                    match self.step(&mut state, page, sink, &mut last_progress).await {
                        Ok(done) => exhausted = done,
                        Err(err) => {
                            warn!("priming page was malformed, will refetch: {err}");
                            self.stats.record_failure(err.category());
                        }
                    }
                }
                Err(err) => {
                    warn!("priming fetch failed, proceeding without a total: {err}");
                    self.stats.record_failure(err.category());
                }
            }
            if !exhausted && state.within_expected() {
                sleep(config.inter_request_delay).await;
            }
        }

        let mut abort_reason: Option<SourceError> = None;

        while !exhausted && state.within_expected() {
            debug!("fetching page (token={})", state.current_token);

            let step = match source.fetch_page(&state.current_token).await {
                Ok(page) => self.step(&mut state, page, sink, &mut last_progress).await,
                Err(err) => Err(err),
            };

            match step {
                Ok(done) => {
                    exhausted = done;
                    if !exhausted && state.within_expected() {
                        sleep(config.inter_request_delay).await;
                    }
                }
                Err(err) => {
                    state.consecutive_failures += 1;
                    self.stats.record_failure(err.category());
                    warn!(
                        "page fetch failed (attempt {}/{}, token={}): {}",
                        state.consecutive_failures,
                        config.max_consecutive_failures,
                        state.current_token,
                        err
                    );
                    if state.consecutive_failures >= config.max_consecutive_failures {
                        abort_reason = Some(err);
                        break;
                    }
                    // Linear backoff, fixed multiplier. The same token is
                    // retried; the failed page is never skipped.
                    sleep(config.inter_request_delay * 2).await;
                }
            }
        }

        self.checkpoint(sink, &state.accumulated).await;
        self.stats.finish();

        match abort_reason {
            Some(reason) => {
                warn!(
                    "aborting after {} consecutive failures with {} records collected",
                    state.consecutive_failures,
                    state.collected()
                );
                ExtractionOutcome::Aborted {
                    consecutive_failures: state.consecutive_failures,
                    records: state.accumulated,
                    reason,
                }
            }
            None => {
                info!("extraction complete: {} records", state.collected());
                ExtractionOutcome::Complete(state.accumulated)
            }
        }
    }

    /// One successful-fetch step: ingest the page, checkpoint on cadence,
    /// report progress. Returns `Ok(true)` on source exhaustion.
    async fn step<T, C>(
        &self,
        state: &mut ExtractionState<T>,
        page: Page<T>,
        sink: &C,
        last_progress: &mut Option<Instant>,
    ) -> Result<bool, SourceError>
    where
        C: CheckpointSink<T> + ?Sized,
    {
        let config = &self.config;
        let batch = page.records.len();
        let exhausted = state.ingest(page, config.token_advance, config.page_size)?;
        self.stats.record_page(batch);

        let collected = state.collected();
        if batch > 0 && collected % config.checkpoint_every == 0 {
            self.checkpoint(sink, &state.accumulated).await;
        }

        // Throttled progress: at most one info line per interval, the rest
        // at debug.
        let due = last_progress.map_or(true, |at| at.elapsed() >= config.progress_log_interval);
        let line = match state.expected_total {
            Some(total) => format!("{batch} records in batch | {collected}/{total} collected"),
            None => format!("{batch} records in batch | {collected} collected"),
        };
        if due {
            info!("{line}");
            *last_progress = Some(Instant::now());
        } else {
            debug!("{line}");
        }

        Ok(exhausted)
    }

    /// Checkpoint writes are best-effort: a failed write is logged and the
    /// loop keeps going.
    async fn checkpoint<T, C>(&self, sink: &C, records: &[T])
    where
        C: CheckpointSink<T> + ?Sized,
    {
        match sink.save(records).await {
            Ok(()) => {
                debug!("checkpointed {} records", records.len());
                self.stats.record_checkpoint();
            }
            Err(err) => {
                warn!("checkpoint write failed: {err}");
                self.stats.record_checkpoint_failure();
            }
        }
    }
}
