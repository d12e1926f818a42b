use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport closed")]
    Closed,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Nesting depth limit exceeded while skipping")]
    DepthLimit,
}

impl TransportError {
    /// True when the peer went away cleanly between messages.
    pub fn is_eof(&self) -> bool {
        match self {
            TransportError::Closed => true,
            TransportError::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown field {field} on {owner}")]
    UnknownField { owner: String, field: String },

    #[error("Missing required field \"{0}\"")]
    MissingField(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CodecError {
    pub fn mismatch(expected: impl ToString, found: impl ToString) -> CodecError {
        CodecError::TypeMismatch {
            expected: expected.to_string(),
            found:    found.to_string(),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> CodecError {
        CodecError::Transport(TransportError::Io(err))
    }
}
