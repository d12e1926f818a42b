use std::fmt;

use brine_thrift_schema::{
    Codec, CodecError, FieldDescriptor, Primitive, Protocol, Schema, StructDescriptor, StructKind,
    TransportError, TypeRef, Value,
};
use thiserror::Error;

/// Name the application exception struct carries on the wire.
pub const APPLICATION_EXCEPTION: &str = "TApplicationException";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationExceptionKind {
    Unknown            = 0,
    UnknownMethod      = 1,
    InvalidMessageType = 2,
    WrongMethodName    = 3,
    BadSequenceId      = 4,
    MissingResult      = 5,
    InternalError      = 6,
    ProtocolError      = 7,
}

impl ApplicationExceptionKind {
    /// Codes outside the known range map to `Unknown`.
    pub fn from_i32(code: i32) -> ApplicationExceptionKind {
        match code {
            1 => ApplicationExceptionKind::UnknownMethod,
            2 => ApplicationExceptionKind::InvalidMessageType,
            3 => ApplicationExceptionKind::WrongMethodName,
            4 => ApplicationExceptionKind::BadSequenceId,
            5 => ApplicationExceptionKind::MissingResult,
            6 => ApplicationExceptionKind::InternalError,
            7 => ApplicationExceptionKind::ProtocolError,
            _ => ApplicationExceptionKind::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A protocol-level failure reported in place of a reply.
///
/// On the wire this is the struct `{1: string message, 2: i32 type}` sent in
/// an `EXCEPTION` message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ApplicationException {
    pub kind:    ApplicationExceptionKind,
    pub message: String,
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl ApplicationException {
    pub fn new(kind: ApplicationExceptionKind, message: impl Into<String>) -> ApplicationException {
        ApplicationException { kind, message: message.into() }
    }

    pub fn descriptor() -> StructDescriptor {
        StructDescriptor::new(APPLICATION_EXCEPTION, StructKind::Exception, vec![
            FieldDescriptor::new(1, "message", TypeRef::Primitive(Primitive::String)),
            FieldDescriptor::new(2, "type", TypeRef::Primitive(Primitive::I32)),
        ])
    }

    pub fn to_value(&self) -> Value {
        Value::new_struct(APPLICATION_EXCEPTION, vec![
            ("message", Value::from(self.message.as_str())),
            ("type", Value::I32(self.kind.code())),
        ])
    }

    pub fn write(&self, protocol: &mut dyn Protocol) -> Result<(), CodecError> {
        let schema = Schema::new();
        Codec::new(&schema).write_struct(protocol, &Self::descriptor(), &self.to_value())
    }

    pub fn read(protocol: &mut dyn Protocol) -> Result<ApplicationException, CodecError> {
        let schema = Schema::new();
        let value = Codec::new(&schema).read_struct(protocol, &Self::descriptor())?;
        Ok(ApplicationException {
            kind:    ApplicationExceptionKind::from_i32(value.get("type").map_or(0, Value::as_i32)),
            message: value.get("message").map_or("", Value::as_string).to_owned(),
        })
    }
}

/// Why a client call did not produce a result.
#[derive(Debug, Error)]
pub enum CallError {
    /// The handler raised one of the function's declared exceptions.
    #[error("Declared exception: {0:?}")]
    Declared(Value),

    #[error("Application exception: {0}")]
    Application(#[from] ApplicationException),

    #[error("Codec error: {0}")]
    Codec(CodecError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Unknown function {service}.{function}")]
    UnknownFunction { service: String, function: String },
}

impl From<CodecError> for CallError {
    fn from(err: CodecError) -> CallError {
        match err {
            CodecError::Transport(err) => CallError::Transport(err),
            other => CallError::Codec(other),
        }
    }
}

/// What a handler reports instead of a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    /// One of the function's declared exceptions, as a struct value.
    #[error("Declared exception: {0:?}")]
    Declared(Value),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl ToString) -> HandlerError {
        HandlerError::Failed(message.to_string())
    }
}

impl From<CodecError> for HandlerError {
    fn from(err: CodecError) -> HandlerError {
        HandlerError::Failed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(CodecError),

    #[error("Unknown service {0}")]
    UnknownService(String),
}

impl From<CodecError> for ProcessError {
    fn from(err: CodecError) -> ProcessError {
        match err {
            CodecError::Transport(err) => ProcessError::Transport(err),
            other => ProcessError::Codec(other),
        }
    }
}

impl ProcessError {
    /// True when the peer closed the connection between messages.
    pub fn is_eof(&self) -> bool {
        matches!(self, ProcessError::Transport(err) if err.is_eof())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brine_thrift_schema::BinaryProtocol;
    use std::collections::VecDeque;

    #[test]
    fn kinds() {
        assert_eq!(ApplicationExceptionKind::from_i32(1), ApplicationExceptionKind::UnknownMethod);
        assert_eq!(ApplicationExceptionKind::from_i32(6), ApplicationExceptionKind::InternalError);
        assert_eq!(ApplicationExceptionKind::from_i32(99), ApplicationExceptionKind::Unknown);
        assert_eq!(ApplicationExceptionKind::ProtocolError.code(), 7);
    }

    #[test]
    fn wire_round_trip() {
        let mut protocol = BinaryProtocol::new(VecDeque::new());
        let exc = ApplicationException::new(ApplicationExceptionKind::UnknownMethod, "Unknown function nope");
        exc.write(&mut protocol).unwrap();
        assert_eq!(ApplicationException::read(&mut protocol).unwrap(), exc);
        assert!(protocol.transport().is_empty());
    }

    #[test]
    fn wire_layout() {
        let mut protocol = BinaryProtocol::new(VecDeque::new());
        ApplicationException::new(ApplicationExceptionKind::InternalError, "x").write(&mut protocol).unwrap();
        let bytes: Vec<u8> = protocol.transport().iter().copied().collect();
        assert_eq!(bytes, [
            11, 0, 1, 0, 0, 0, 1, b'x',
            8, 0, 2, 0, 0, 0, 6,
            0,
        ]);
    }

    #[test]
    fn display() {
        let exc = ApplicationException::new(ApplicationExceptionKind::InternalError, "boom");
        assert_eq!(exc.to_string(), "InternalError: boom");
        assert_eq!(
            CallError::from(exc).to_string(),
            "Application exception: InternalError: boom"
        );
    }

    #[test]
    fn transport_errors_stay_transport_errors() {
        let err = CallError::from(CodecError::Transport(TransportError::Closed));
        assert!(matches!(err, CallError::Transport(TransportError::Closed)));
        let err = ProcessError::from(CodecError::Transport(TransportError::Closed));
        assert!(err.is_eof());
    }
}
