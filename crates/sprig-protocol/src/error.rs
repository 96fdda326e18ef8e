use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("response is not a smart advertisement: {0}")]
    BadMagic(String),

    #[error("unexpected line: expected {expected}, found {found}")]
    UnexpectedLine { expected: String, found: String },

    #[error("unexpected content type: expected {expected}, found {found}")]
    UnexpectedContentType { expected: String, found: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed pkt-line: {0}")]
    MalformedLine(String),

    #[error("partial pkt-line read: expected {expected} bytes, got {actual}")]
    PartialRead { expected: usize, actual: usize },

    #[error("pkt-line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    #[error("malformed reference line: {0}")]
    MalformedRef(String),

    #[error("invalid object id: {0}")]
    InvalidId(#[from] sprig_types::TypeError),

    #[error("invalid repository URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
