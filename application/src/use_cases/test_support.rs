//! Hand-written port mocks shared by the use case tests

use crate::ports::history::{HistoryError, HistoryWriter, TurnRecord};
use crate::ports::provider::{CompletionRequest, ProviderAdapter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use superai_domain::{ProviderError, ProviderId};

pub(crate) struct MockProvider {
    id: ProviderId,
    model: String,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn ok(id: ProviderId, text: &str) -> Self {
        Self::new(id, Ok(text.to_string()))
    }

    pub fn err(id: ProviderId, error: ProviderError) -> Self {
        Self::new(id, Err(error))
    }

    fn new(id: ProviderId, fallback: Result<String, ProviderError>) -> Self {
        Self {
            model: format!("{}-mock", id),
            id,
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Results returned by the first calls, before falling back
    pub fn scripted(self, results: Vec<Result<String, ProviderError>>) -> Self {
        *self.script.lock().unwrap() = results.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn provider(&self) -> &ProviderId {
        &self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.script.lock().unwrap().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingHistory {
    pub records: Mutex<Vec<TurnRecord>>,
    pub fail: bool,
}

impl RecordingHistory {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl HistoryWriter for RecordingHistory {
    async fn persist_turn(&self, record: &TurnRecord) -> Result<(), HistoryError> {
        if self.fail {
            return Err(HistoryError::Io(std::io::Error::other("disk full")));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
