/*!
 * Mock transport for testing.
 *
 * The mock never touches the network. It records every request it is
 * given and answers with canned responses:
 * - `MockTransport::respond(status, body)` - Always returns the same response
 * - `MockTransport::sequence(responses)` - Returns responses in order, repeating the last
 * - `MockTransport::failing(error)` - Always fails with a transport error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::TransportError;
use crate::protocol::{SubDbRequest, SubDbResponse};
use crate::transport::Transport;

/// Behavior mode for the mock transport
#[derive(Debug, Clone)]
enum MockBehavior {
    /// Answer with the responses in order, then keep repeating the last one
    Respond(Vec<SubDbResponse>),
    /// Fail every request
    Failing(TransportError),
}

/// In-memory transport that records requests
///
/// Clones share the request log and the call counter.
#[derive(Debug, Clone)]
pub struct MockTransport {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<SubDbRequest>>>,
}

impl MockTransport {
    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `status` and `body`
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::with_response(SubDbResponse::new(status, body))
    }

    /// Always answer with `response`
    pub fn with_response(response: SubDbResponse) -> Self {
        Self::new(MockBehavior::Respond(vec![response]))
    }

    /// Answer with each response in turn, repeating the last one
    pub fn sequence(responses: Vec<SubDbResponse>) -> Self {
        Self::new(MockBehavior::Respond(responses))
    }

    /// Fail every request with `error`
    pub fn failing(error: TransportError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    /// Number of requests executed so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// All requests executed so far, oldest first
    pub fn requests(&self) -> Vec<SubDbRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<SubDbRequest> {
        self.requests.lock().last().cloned()
    }

    fn answer(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        let index = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match &self.behavior {
            MockBehavior::Respond(responses) => {
                let response = responses
                    .get(index)
                    .or_else(|| responses.last())
                    .cloned()
                    .unwrap_or_default();
                Ok(response)
            }
            MockBehavior::Failing(error) => Err(error.clone()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn execute(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        self.answer(request)
    }

    async fn execute_async(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        self.answer(request)
    }
}
