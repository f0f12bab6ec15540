//! Client error types.

use thiserror::Error;

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("rpc transport: {0}")]
    Rpc(#[from] jsonrpsee::core::client::Error),

    #[error("chain rejected call: {0}")]
    Chain(String),

    #[error("malformed response: {0}")]
    BadResponse(String),
}
