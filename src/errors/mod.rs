use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedImageError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid host policy document: {0}")]
    HostPolicy(String),

    // Feed errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type FeedImageResult<T> = Result<T, FeedImageError>;

/// Failure reported by an `HttpTransport` before any status handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("redirect limit exceeded: {0}")]
    Redirect(String),

    #[error("reading body failed: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Classified reason a single bounded GET did not yield usable bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid url {0}")]
    InvalidUrl(String),

    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("content type {0} is not allowed")]
    DisallowedContentType(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => FetchError::Timeout,
            TransportError::Connect(msg) => FetchError::Connection(msg),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("image payload is empty")]
    Empty,

    #[error("image payload has {len} bytes, minimum is {min}")]
    TooFewBytes { len: usize, min: usize },

    #[error("unrecognized image signature")]
    UnrecognizedSignature,

    #[error("unsupported image format {0}")]
    UnsupportedFormat(String),

    #[error("declared {declared} but bytes are {detected}")]
    SignatureMismatch { declared: String, detected: String },

    #[error("image could not be decoded: {0}")]
    Undecodable(String),

    #[error("image is {width}x{height}, minimum is {min_width}x{min_height}")]
    TooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProviderError::Fetch(e) => e.http_status(),
            ProviderError::Decode(_) => None,
        }
    }
}
