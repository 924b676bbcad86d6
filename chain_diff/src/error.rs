use std::fmt::{self, Display};

/// Why one endpoint could not deliver a record.
///
/// A data mismatch is never an error: it is the regular output of the
/// comparators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport or connection failure.
    #[error("network error: {0}")]
    Network(String),
    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Protocol { code: i64, message: String },
    /// The endpoint answered with something that could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The requested height or transaction does not exist on the endpoint.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Identifies one side of an [`EndpointPair`](crate::EndpointPair).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Reference,
    Candidate,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Reference => f.write_str("reference"),
            Endpoint::Candidate => f.write_str("candidate"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{endpoint} endpoint: {source}")]
    Fetch {
        endpoint: Endpoint,
        #[source]
        source: FetchError,
    },
    #[error("run cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DriverError {
    pub(crate) fn fetch(endpoint: Endpoint) -> impl FnOnce(FetchError) -> Self {
        move |source| DriverError::Fetch { endpoint, source }
    }
}
