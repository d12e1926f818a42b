//! brine-thrift
//!
//! Synchronous RPC over Thrift-style schemas.
//!
//! - [Client] sends calls for one service and turns replies into results,
//! - [Processor] dispatches incoming calls to registered handlers,
//! - [ApplicationException], [CallError], [HandlerError] and [ProcessError]
//!   describe what can go wrong.
//!
//! The compiler and the schema runtime are re-exported, so a single
//! dependency is enough to compile an IDL file and serve it.

pub mod client;
pub mod exception;
pub mod processor;

pub use client::Client;
pub use exception::{
    ApplicationException, ApplicationExceptionKind, CallError, HandlerError, ProcessError,
};
pub use processor::{Arguments, Handler, Processor};

pub use brine_thrift_compiler::{compile_file, compile_str, CompileError, CompilerConfig};
pub use brine_thrift_schema::*;

pub mod compiler {
    pub use brine_thrift_compiler::*;
}

pub mod schema {
    pub use brine_thrift_schema::*;
}
