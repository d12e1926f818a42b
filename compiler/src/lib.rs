//! brine-thrift-compiler
//!
//! This crate implements:
//!  1) A packrat parser for `.thrift` IDL files, producing [ast::AstNode]s,
//!  2) `include` expansion through an [IncludeResolver],
//!  3) The declaration-order schema compiler (`compile*` → `Schema`),
//!  4) Definition and field-index verification,
//!  5) Error types (`ParseError`, `CompileError`) and [CompilerConfig].

pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod include;
pub mod lexer;
pub mod packrat;
pub mod parser;
pub mod utils;
pub mod verifier;

pub use compiler::{compile, compile_file, compile_file_with, compile_str, compile_with};
pub use config::CompilerConfig;
pub use error::{CompileError, ParseError};
pub use include::{FsIncludeResolver, IncludeResolver, MemoryIncludeResolver, Source};
pub use parser::parse;
