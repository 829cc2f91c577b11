//! REST wire/boundary support for the medical supply order plugin.
//!
//! This crate provides **wire models** and a **REST client** for the host application's
//! REST API (`/ws/rest/v1`):
//! - concepts (`GET /concept/{uuid}`), used for quantity-unit lookup
//! - placed orders (`GET /order/{uuid}?v=full`), used when revising or discontinuing
//! - the order submission body (`OrderPost`)
//!
//! This crate focuses on:
//! - serialisation/deserialisation of REST representations
//! - translation between REST representations and flat domain carriers
//! - HTTP transport (reqwest)
//!
//! Domain rules (basket reconciliation, payload selection per action) live in `supply-core`.

pub mod client;
pub mod concept;
pub mod order;

// Re-export facades
pub use client::{Credentials, RestClient};
pub use concept::{Concept, ConceptResource};
pub use order::{OrderPost, OrderResource, PlacedOrder, ResourceRef};

/// Path of the REST API relative to the server base URL.
pub const REST_BASE_PATH: &str = "/ws/rest/v1";

/// Errors returned by the `openmrs` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum OpenmrsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },
}

/// Type alias for Results that can fail with an [`OpenmrsError`].
pub type OpenmrsResult<T> = Result<T, OpenmrsError>;

/// Deserialise `json_text` into `T`, reporting the JSON path of the first mismatch.
pub(crate) fn parse_json<T>(json_text: &str, what: &str) -> OpenmrsResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(OpenmrsError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}
