use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the deployment pipeline, one variant per stage.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid ABI in {}: {reason}", path.display())]
    Abi { path: PathBuf, reason: String },

    #[error("unsupported solidity type: {0}")]
    UnsupportedType(String),

    #[error("invalid value for argument `{name}` of type {ty}: {reason}")]
    InvalidArgument {
        name: String,
        ty: String,
        reason: String,
    },

    #[error("failed to encode constructor arguments for {contract}: {reason}")]
    Encoding { contract: String, reason: String },

    #[error("failed to fetch nonce for {address}: {source}")]
    NonceFetch {
        address: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to submit deployments for {address}: {source}")]
    Submission {
        address: String,
        #[source]
        source: ApiError,
    },

    #[error("invalid hex: {0}")]
    Decode(#[from] hex::FromHexError),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("failed to sign transaction: {0}")]
    Signing(String),
}

/// Failures talking to the indexing API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key not found, set HEIMDAHL_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid request: {0}")]
    Request(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
