//! Mock Enrichment Provider for testing.
//!
//! Provides a configurable implementation of the EnrichmentProvider port,
//! so the pipeline can run without a live enrichment service.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for soft-failure testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockEnrichmentProvider::new()
//!     .with_error(EnrichmentError::Unavailable("maintenance".into()))
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{EnrichmentError, EnrichmentProvider, EnrichmentRequest, EnrichmentResult};

/// A configured mock response.
#[derive(Debug, Clone)]
enum MockResponse {
    Success(EnrichmentResult),
    Error(EnrichmentError),
}

/// Mock enrichment provider.
#[derive(Debug, Clone)]
pub struct MockEnrichmentProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<EnrichmentRequest>>>,
}

impl Default for MockEnrichmentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnrichmentProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, result: EnrichmentResult) -> Self {
        lock(&self.responses).push_back(MockResponse::Success(result));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: EnrichmentError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// All recorded requests.
    pub fn calls(&self) -> Vec<EnrichmentRequest> {
        lock(&self.calls).clone()
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(EnrichmentResult::default()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl EnrichmentProvider for MockEnrichmentProvider {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<EnrichmentResult, EnrichmentError> {
        lock(&self.calls).push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success(result) => Ok(result),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
