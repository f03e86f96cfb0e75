/// Error kinds for the login, snapshot and extraction flow
use thiserror::Error;

/// A single HTTP exchange failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("login response is not a JSON object: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("login response is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("snapshot response is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("snapshot response is not a JSON object")]
    NotAnObject,

    #[error("snapshot has no `{0}` object")]
    MissingSection(&'static str),

    #[error("user {0} not present in snapshot")]
    UnknownUser(String),

    #[error("structure {0} not present in snapshot")]
    UnknownStructure(String),

    #[error("`{0}` is not a list of string references")]
    InvalidList(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractError {
    #[error("device {device_id} not present in `{section}`")]
    UnknownDevice {
        section: &'static str,
        device_id: String,
    },

    #[error("device {device_id} in `{section}` is not an object")]
    MalformedEntry {
        section: &'static str,
        device_id: String,
    },

    #[error("device {device_id} has no `{metric}`")]
    MissingMetric {
        device_id: String,
        metric: &'static str,
    },

    #[error("device {device_id} has a non-numeric `{metric}`")]
    InvalidMetric {
        device_id: String,
        metric: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid arguments: {0}")]
    Arguments(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Anything that ends a polling run.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
