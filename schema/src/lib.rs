//! Runtime support for Thrift-style schemas: the type model built by the
//! compiler, a dynamic [Value], the [Protocol] abstraction with a binary
//! implementation, and the schema-driven [Codec].
//!
//! ```
//! use brine_thrift_schema::*;
//! use std::collections::VecDeque;
//!
//! let mut schema = Schema::new();
//! schema.structs.insert("Point".to_owned(), StructDescriptor::new("Point", StructKind::Struct, vec![
//!     FieldDescriptor::new(1, "x", TypeRef::Primitive(Primitive::I32)),
//!     FieldDescriptor::new(2, "y", TypeRef::Primitive(Primitive::I32)),
//! ]));
//!
//! let codec = Codec::new(&schema);
//! let mut protocol = BinaryProtocol::new(VecDeque::new());
//! let point = TypeRef::Named("Point".to_owned());
//! let value = Value::new_struct("Point", vec![("x", Value::I32(1)), ("y", Value::from("-2"))]);
//!
//! codec.encode(&mut protocol, &point, &value).unwrap();
//! let decoded = codec.decode(&mut protocol, &point, WireType::Struct).unwrap().unwrap();
//! assert_eq!(format!("{:?}", decoded), "Point {x: 1, y: -2}");
//! ```

pub mod binary;
pub mod codec;
pub mod coerce;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod transport;
pub mod types;
pub mod value;

pub use binary::*;
pub use codec::*;
pub use coerce::{parse_bool, render};
pub use error::*;
pub use protocol::*;
pub use traits::*;
pub use transport::*;
pub use types::*;
pub use value::*;
