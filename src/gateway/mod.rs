// Acquired.com Gateway
//
// Token acquisition and authenticated HTTP calls against the payment API.

pub mod client;
pub mod retry;
pub mod token_cache;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::AcquiredClient;
pub use retry::RetryPolicy;
pub use token_cache::{Credential, TokenCache};
pub use transport::{HttpTransport, OutboundRequest, ReqwestTransport, TransportResponse};
