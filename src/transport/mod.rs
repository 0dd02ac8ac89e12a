/*!
 * Transports that carry SubDB requests.
 *
 * The client never talks HTTP itself. It hands a `SubDbRequest` to a
 * `Transport` and interprets whatever `SubDbResponse` comes back:
 * - `http`: reqwest-backed transport used in production
 * - `mock`: in-memory transport with canned responses for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::TransportError;
use crate::protocol::{SubDbRequest, SubDbResponse};

/// Common trait for everything that can execute a SubDB request
///
/// Implementations own connection handling, TLS, timeouts and any retry
/// policy. Both entry points must have the same semantics.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Execute a request, blocking until the response arrives
    ///
    /// # Arguments
    /// * `request` - The request to send
    ///
    /// # Returns
    /// * `Result<SubDbResponse, TransportError>` - The response of any status, or an
    ///   error if no response was received
    fn execute(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError>;

    /// Execute a request asynchronously
    async fn execute_async(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError>;
}

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;
