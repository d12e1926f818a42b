use crate::{
    error::TransportError,
    types::{MessageType, WireType},
};

/// Containers nested deeper than this are rejected while skipping.
pub const MAX_SKIP_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdentifier {
    pub name:         String,
    pub message_type: MessageType,
    pub sequence_id:  i32,
}

impl MessageIdentifier {
    pub fn new(name: &str, message_type: MessageType, sequence_id: i32) -> MessageIdentifier {
        MessageIdentifier { name: name.to_owned(), message_type, sequence_id }
    }
}

/// A field header as read off the wire. `STOP` carries no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub wire_type: WireType,
    pub index:     i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub element: WireType,
    pub size:    i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key:   WireType,
    pub value: WireType,
    pub size:  i32,
}

/// A wire protocol: the framing primitives the codec and the RPC layer are
/// written against. Implementations own their transport.
pub trait Protocol {
    fn write_message_begin(&mut self, id: &MessageIdentifier) -> Result<(), TransportError>;
    fn write_message_end(&mut self) -> Result<(), TransportError>;
    fn write_struct_begin(&mut self, name: &str) -> Result<(), TransportError>;
    fn write_struct_end(&mut self) -> Result<(), TransportError>;
    fn write_field_begin(&mut self, name: &str, wire_type: WireType, index: i16) -> Result<(), TransportError>;
    fn write_field_end(&mut self) -> Result<(), TransportError>;
    fn write_field_stop(&mut self) -> Result<(), TransportError>;
    fn write_list_begin(&mut self, header: &ListHeader) -> Result<(), TransportError>;
    fn write_list_end(&mut self) -> Result<(), TransportError>;
    fn write_set_begin(&mut self, header: &ListHeader) -> Result<(), TransportError>;
    fn write_set_end(&mut self) -> Result<(), TransportError>;
    fn write_map_begin(&mut self, header: &MapHeader) -> Result<(), TransportError>;
    fn write_map_end(&mut self) -> Result<(), TransportError>;
    fn write_bool(&mut self, value: bool) -> Result<(), TransportError>;
    fn write_byte(&mut self, value: i8) -> Result<(), TransportError>;
    fn write_i16(&mut self, value: i16) -> Result<(), TransportError>;
    fn write_i32(&mut self, value: i32) -> Result<(), TransportError>;
    fn write_i64(&mut self, value: i64) -> Result<(), TransportError>;
    fn write_double(&mut self, value: f64) -> Result<(), TransportError>;
    fn write_string(&mut self, value: &str) -> Result<(), TransportError>;
    fn write_binary(&mut self, value: &[u8]) -> Result<(), TransportError>;
    fn flush(&mut self) -> Result<(), TransportError>;

    fn read_message_begin(&mut self) -> Result<MessageIdentifier, TransportError>;
    fn read_message_end(&mut self) -> Result<(), TransportError>;
    fn read_struct_begin(&mut self) -> Result<(), TransportError>;
    fn read_struct_end(&mut self) -> Result<(), TransportError>;
    fn read_field_begin(&mut self) -> Result<FieldHeader, TransportError>;
    fn read_field_end(&mut self) -> Result<(), TransportError>;
    fn read_list_begin(&mut self) -> Result<ListHeader, TransportError>;
    fn read_list_end(&mut self) -> Result<(), TransportError>;
    fn read_set_begin(&mut self) -> Result<ListHeader, TransportError>;
    fn read_set_end(&mut self) -> Result<(), TransportError>;
    fn read_map_begin(&mut self) -> Result<MapHeader, TransportError>;
    fn read_map_end(&mut self) -> Result<(), TransportError>;
    fn read_bool(&mut self) -> Result<bool, TransportError>;
    fn read_byte(&mut self) -> Result<i8, TransportError>;
    fn read_i16(&mut self) -> Result<i16, TransportError>;
    fn read_i32(&mut self) -> Result<i32, TransportError>;
    fn read_i64(&mut self) -> Result<i64, TransportError>;
    fn read_double(&mut self) -> Result<f64, TransportError>;
    fn read_string(&mut self) -> Result<String, TransportError>;
    fn read_binary(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Reads and discards one value of the given wire type.
    fn skip(&mut self, wire_type: WireType) -> Result<(), TransportError> {
        skip_depth(self, wire_type, MAX_SKIP_DEPTH)
    }
}

fn skip_depth<P: Protocol + ?Sized>(
    protocol: &mut P,
    wire_type: WireType,
    depth: usize,
) -> Result<(), TransportError> {
    if depth == 0 {
        return Err(TransportError::DepthLimit);
    }

    match wire_type {
        WireType::Stop | WireType::Void => Ok(()),
        WireType::Bool => protocol.read_bool().map(|_| ()),
        WireType::Byte => protocol.read_byte().map(|_| ()),
        WireType::I16 => protocol.read_i16().map(|_| ()),
        WireType::I32 => protocol.read_i32().map(|_| ()),
        WireType::I64 => protocol.read_i64().map(|_| ()),
        WireType::Double => protocol.read_double().map(|_| ()),
        WireType::String => protocol.read_binary().map(|_| ()),

        WireType::Struct => {
            protocol.read_struct_begin()?;
            loop {
                let header = protocol.read_field_begin()?;
                if header.wire_type == WireType::Stop {
                    break;
                }
                skip_depth(protocol, header.wire_type, depth - 1)?;
                protocol.read_field_end()?;
            }
            protocol.read_struct_end()
        }

        WireType::List => {
            let header = protocol.read_list_begin()?;
            for _ in 0..header.size {
                skip_depth(protocol, header.element, depth - 1)?;
            }
            protocol.read_list_end()
        }

        WireType::Set => {
            let header = protocol.read_set_begin()?;
            for _ in 0..header.size {
                skip_depth(protocol, header.element, depth - 1)?;
            }
            protocol.read_set_end()
        }

        WireType::Map => {
            let header = protocol.read_map_begin()?;
            for _ in 0..header.size {
                skip_depth(protocol, header.key, depth - 1)?;
                skip_depth(protocol, header.value, depth - 1)?;
            }
            protocol.read_map_end()
        }
    }
}

impl<P: Protocol + ?Sized> Protocol for &mut P {
    fn write_message_begin(&mut self, id: &MessageIdentifier) -> Result<(), TransportError> { (**self).write_message_begin(id) }
    fn write_message_end(&mut self) -> Result<(), TransportError> { (**self).write_message_end() }
    fn write_struct_begin(&mut self, name: &str) -> Result<(), TransportError> { (**self).write_struct_begin(name) }
    fn write_struct_end(&mut self) -> Result<(), TransportError> { (**self).write_struct_end() }
    fn write_field_begin(&mut self, name: &str, wire_type: WireType, index: i16) -> Result<(), TransportError> { (**self).write_field_begin(name, wire_type, index) }
    fn write_field_end(&mut self) -> Result<(), TransportError> { (**self).write_field_end() }
    fn write_field_stop(&mut self) -> Result<(), TransportError> { (**self).write_field_stop() }
    fn write_list_begin(&mut self, header: &ListHeader) -> Result<(), TransportError> { (**self).write_list_begin(header) }
    fn write_list_end(&mut self) -> Result<(), TransportError> { (**self).write_list_end() }
    fn write_set_begin(&mut self, header: &ListHeader) -> Result<(), TransportError> { (**self).write_set_begin(header) }
    fn write_set_end(&mut self) -> Result<(), TransportError> { (**self).write_set_end() }
    fn write_map_begin(&mut self, header: &MapHeader) -> Result<(), TransportError> { (**self).write_map_begin(header) }
    fn write_map_end(&mut self) -> Result<(), TransportError> { (**self).write_map_end() }
    fn write_bool(&mut self, value: bool) -> Result<(), TransportError> { (**self).write_bool(value) }
    fn write_byte(&mut self, value: i8) -> Result<(), TransportError> { (**self).write_byte(value) }
    fn write_i16(&mut self, value: i16) -> Result<(), TransportError> { (**self).write_i16(value) }
    fn write_i32(&mut self, value: i32) -> Result<(), TransportError> { (**self).write_i32(value) }
    fn write_i64(&mut self, value: i64) -> Result<(), TransportError> { (**self).write_i64(value) }
    fn write_double(&mut self, value: f64) -> Result<(), TransportError> { (**self).write_double(value) }
    fn write_string(&mut self, value: &str) -> Result<(), TransportError> { (**self).write_string(value) }
    fn write_binary(&mut self, value: &[u8]) -> Result<(), TransportError> { (**self).write_binary(value) }
    fn flush(&mut self) -> Result<(), TransportError> { (**self).flush() }

    fn read_message_begin(&mut self) -> Result<MessageIdentifier, TransportError> { (**self).read_message_begin() }
    fn read_message_end(&mut self) -> Result<(), TransportError> { (**self).read_message_end() }
    fn read_struct_begin(&mut self) -> Result<(), TransportError> { (**self).read_struct_begin() }
    fn read_struct_end(&mut self) -> Result<(), TransportError> { (**self).read_struct_end() }
    fn read_field_begin(&mut self) -> Result<FieldHeader, TransportError> { (**self).read_field_begin() }
    fn read_field_end(&mut self) -> Result<(), TransportError> { (**self).read_field_end() }
    fn read_list_begin(&mut self) -> Result<ListHeader, TransportError> { (**self).read_list_begin() }
    fn read_list_end(&mut self) -> Result<(), TransportError> { (**self).read_list_end() }
    fn read_set_begin(&mut self) -> Result<ListHeader, TransportError> { (**self).read_set_begin() }
    fn read_set_end(&mut self) -> Result<(), TransportError> { (**self).read_set_end() }
    fn read_map_begin(&mut self) -> Result<MapHeader, TransportError> { (**self).read_map_begin() }
    fn read_map_end(&mut self) -> Result<(), TransportError> { (**self).read_map_end() }
    fn read_bool(&mut self) -> Result<bool, TransportError> { (**self).read_bool() }
    fn read_byte(&mut self) -> Result<i8, TransportError> { (**self).read_byte() }
    fn read_i16(&mut self) -> Result<i16, TransportError> { (**self).read_i16() }
    fn read_i32(&mut self) -> Result<i32, TransportError> { (**self).read_i32() }
    fn read_i64(&mut self) -> Result<i64, TransportError> { (**self).read_i64() }
    fn read_double(&mut self) -> Result<f64, TransportError> { (**self).read_double() }
    fn read_string(&mut self) -> Result<String, TransportError> { (**self).read_string() }
    fn read_binary(&mut self) -> Result<Vec<u8>, TransportError> { (**self).read_binary() }

    fn skip(&mut self, wire_type: WireType) -> Result<(), TransportError> { (**self).skip(wire_type) }
}
