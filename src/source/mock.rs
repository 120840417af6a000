use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Page, PageSource, SourceError};

/// Scripted page source for tests: serves a fixed sequence of outcomes in
/// order and records every token it was asked for.
pub struct MockPageSource<T> {
    script: Mutex<VecDeque<Result<Page<T>, SourceError>>>,
    calls: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
}

impl<T> MockPageSource<T> {
    pub fn new(script: Vec<Result<Page<T>, SourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().clone()
    }
}

#[async_trait]
impl<T> PageSource for MockPageSource<T>
where
    T: Send + Sync,
{
    type Record = T;

    async fn fetch_page(&self, token: &str) -> Result<Page<T>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().push(token.to_string());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Shape("mock script exhausted".to_string())))
    }
}
