use crate::{
    error::TransportError,
    protocol::{FieldHeader, ListHeader, MapHeader, MessageIdentifier, Protocol},
    types::{MessageType, WireType},
};
use std::io::{self, Read, Write};

const VERSION_1: u32 = 0x8001_0000;
const VERSION_MASK: u32 = 0xffff_0000;

/// Byte strings longer than this are read in pieces instead of being
/// allocated up front from their length prefix.
const MAX_PREALLOCATION: usize = 64 * 1024;

/// The Thrift binary protocol over any byte transport.
///
/// Integers are big-endian and fixed width, strings are prefixed with their
/// `i32` byte length. Messages are always written in the strict form; both the
/// strict and the old unversioned form are accepted when reading.
///
/// ```
/// use brine_thrift_schema::{BinaryProtocol, Protocol};
/// use std::collections::VecDeque;
///
/// let mut protocol = BinaryProtocol::new(VecDeque::new());
/// protocol.write_i32(7).unwrap();
/// assert_eq!(protocol.transport().iter().copied().collect::<Vec<u8>>(), [0, 0, 0, 7]);
/// assert_eq!(protocol.read_i32().unwrap(), 7);
/// ```
pub struct BinaryProtocol<T> {
    transport: T,
}

impl<T: Read + Write> BinaryProtocol<T> {
    pub fn new(transport: T) -> BinaryProtocol<T> {
        BinaryProtocol { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N], TransportError> {
        let mut buf = [0u8; N];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_wire_type(&mut self) -> Result<WireType, TransportError> {
        let code = self.read_exact::<1>()?[0];
        WireType::from_u8(code)
            .ok_or_else(|| TransportError::InvalidData(format!("unknown wire type {}", code)))
    }

    /// Reads exactly `len` bytes without trusting `len` for the allocation.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOCATION));
        Read::take(&mut self.transport, len as u64).read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(bytes)
    }

    fn read_size(&mut self) -> Result<i32, TransportError> {
        let size = self.read_i32()?;
        if size < 0 {
            return Err(TransportError::InvalidData(format!("negative size {}", size)));
        }
        Ok(size)
    }

    fn read_list_header(&mut self) -> Result<ListHeader, TransportError> {
        let element = self.read_wire_type()?;
        let size = self.read_size()?;
        Ok(ListHeader { element, size })
    }
}

impl<T: Read + Write> Protocol for BinaryProtocol<T> {
    fn write_message_begin(&mut self, id: &MessageIdentifier) -> Result<(), TransportError> {
        let version = VERSION_1 | id.message_type as u32;
        self.write_i32(version as i32)?;
        self.write_string(&id.name)?;
        self.write_i32(id.sequence_id)
    }

    fn write_message_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_struct_begin(&mut self, _name: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_field_begin(&mut self, _name: &str, wire_type: WireType, index: i16) -> Result<(), TransportError> {
        self.transport.write_all(&[wire_type.code()])?;
        self.write_i16(index)
    }

    fn write_field_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<(), TransportError> {
        self.transport.write_all(&[WireType::Stop.code()])?;
        Ok(())
    }

    fn write_list_begin(&mut self, header: &ListHeader) -> Result<(), TransportError> {
        self.transport.write_all(&[header.element.code()])?;
        self.write_i32(header.size)
    }

    fn write_list_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_set_begin(&mut self, header: &ListHeader) -> Result<(), TransportError> {
        self.write_list_begin(header)
    }

    fn write_set_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_map_begin(&mut self, header: &MapHeader) -> Result<(), TransportError> {
        self.transport.write_all(&[header.key.code(), header.value.code()])?;
        self.write_i32(header.size)
    }

    fn write_map_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), TransportError> {
        self.transport.write_all(&[if value { 1 } else { 0 }])?;
        Ok(())
    }

    fn write_byte(&mut self, value: i8) -> Result<(), TransportError> {
        self.transport.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<(), TransportError> {
        self.transport.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<(), TransportError> {
        self.transport.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), TransportError> {
        self.transport.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), TransportError> {
        self.transport.write_all(&value.to_bits().to_be_bytes())?;
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), TransportError> {
        self.write_binary(value.as_bytes())
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<(), TransportError> {
        let len = i32::try_from(value.len())
            .map_err(|_| TransportError::InvalidData(format!("{} bytes is too long", value.len())))?;
        self.write_i32(len)?;
        self.transport.write_all(value)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.transport.flush()?;
        Ok(())
    }

    fn read_message_begin(&mut self) -> Result<MessageIdentifier, TransportError> {
        let header = self.read_i32()?;

        let (name, type_code) = if header < 0 {
            let version = header as u32 & VERSION_MASK;
            if version != VERSION_1 {
                return Err(TransportError::InvalidData(format!("bad protocol version {:#x}", version)));
            }
            let name = self.read_string()?;
            (name, (header & 0xff) as u8)
        } else {
            let name = self.read_bytes(header as usize)?;
            let name = String::from_utf8(name)
                .map_err(|err| TransportError::InvalidData(err.to_string()))?;
            (name, self.read_exact::<1>()?[0])
        };

        let message_type = MessageType::from_u8(type_code)
            .ok_or_else(|| TransportError::InvalidData(format!("unknown message type {}", type_code)))?;
        let sequence_id = self.read_i32()?;

        Ok(MessageIdentifier { name, message_type, sequence_id })
    }

    fn read_message_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader, TransportError> {
        let wire_type = self.read_wire_type()?;
        if wire_type == WireType::Stop {
            return Ok(FieldHeader { wire_type, index: 0 });
        }
        let index = self.read_i16()?;
        Ok(FieldHeader { wire_type, index })
    }

    fn read_field_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> Result<ListHeader, TransportError> {
        self.read_list_header()
    }

    fn read_list_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<ListHeader, TransportError> {
        self.read_list_header()
    }

    fn read_set_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<MapHeader, TransportError> {
        let key = self.read_wire_type()?;
        let value = self.read_wire_type()?;
        let size = self.read_size()?;
        Ok(MapHeader { key, value, size })
    }

    fn read_map_end(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, TransportError> {
        Ok(self.read_exact::<1>()?[0] != 0)
    }

    fn read_byte(&mut self) -> Result<i8, TransportError> {
        Ok(i8::from_be_bytes(self.read_exact()?))
    }

    fn read_i16(&mut self) -> Result<i16, TransportError> {
        Ok(i16::from_be_bytes(self.read_exact()?))
    }

    fn read_i32(&mut self) -> Result<i32, TransportError> {
        Ok(i32::from_be_bytes(self.read_exact()?))
    }

    fn read_i64(&mut self) -> Result<i64, TransportError> {
        Ok(i64::from_be_bytes(self.read_exact()?))
    }

    fn read_double(&mut self) -> Result<f64, TransportError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.read_exact()?)))
    }

    fn read_string(&mut self) -> Result<String, TransportError> {
        let bytes = self.read_binary()?;
        String::from_utf8(bytes).map_err(|err| TransportError::InvalidData(err.to_string()))
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, TransportError> {
        let len = self.read_size()? as usize;
        self.read_bytes(len)
    }
}
