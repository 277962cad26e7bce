use thiserror::Error;

use super::codec::CodecError;

/// Failures talking to the Tiny ERP API.
#[derive(Debug, Error)]
pub enum ErpError {
    #[error("Request to Tiny endpoint {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Tiny endpoint {endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Could not decode response from Tiny endpoint {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tiny endpoint {endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ErpError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ErpError::Transport { .. } => "transport",
            ErpError::Status { .. } => "status",
            ErpError::Decode { .. } => "decode",
            ErpError::Rejected { .. } => "rejected",
            ErpError::Codec(_) => "codec",
        }
    }
}
