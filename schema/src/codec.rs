use crate::{
    error::{CodecError, TransportError},
    protocol::{ListHeader, MapHeader, Protocol},
    types::{EnumDescriptor, NamedType, Primitive, Schema, StructDescriptor, TypeRef, WireType},
    value::{Value, UNKNOWN_ENUM_CODE},
};
use indexmap::IndexMap;
use tracing::{debug, warn};

const MAX_TYPEDEF_DEPTH: usize = 32;

/// How deeply structs and containers may nest in a decoded value.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Upper bound on what a container header may make us preallocate. Sizes come
/// off the wire, so larger containers grow as their elements arrive.
const MAX_PREALLOCATION: usize = 1024;

fn preallocation(size: i32) -> usize {
    usize::try_from(size).unwrap_or(0).min(MAX_PREALLOCATION)
}

fn descend(depth: usize) -> Result<usize, CodecError> {
    depth.checked_sub(1).ok_or(CodecError::Transport(TransportError::DepthLimit))
}

/// A type reference with every name looked up.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Primitive(Primitive),
    Enum(&'a EnumDescriptor),
    Struct(&'a StructDescriptor),
    List(&'a TypeRef),
    Set(&'a TypeRef),
    Map(&'a TypeRef, &'a TypeRef),
}

impl<'a> Resolved<'a> {
    pub fn wire_type(&self) -> WireType {
        match *self {
            Resolved::Primitive(p) => p.wire_type(),
            Resolved::Enum(_)      => WireType::I32,
            Resolved::Struct(_)    => WireType::Struct,
            Resolved::List(_)      => WireType::List,
            Resolved::Set(_)       => WireType::Set,
            Resolved::Map(_, _)    => WireType::Map,
        }
    }
}

/// Container element types are compatible when they match or when either side
/// is a string, in which case every element goes through coercion.
pub fn valid_element_type(expected: WireType, actual: WireType) -> bool {
    expected == actual || expected == WireType::String || actual == WireType::String
}

/// Writes and reads [Value]s as directed by a [Schema].
#[derive(Debug, Clone, Copy)]
pub struct Codec<'s> {
    schema: &'s Schema,
}

impl<'s> Codec<'s> {
    pub fn new(schema: &'s Schema) -> Codec<'s> {
        Codec { schema }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn resolve<'a>(&'a self, ty: &'a TypeRef) -> Result<Resolved<'a>, CodecError> {
        let mut ty = ty;
        let mut depth = 0;
        loop {
            let name = match ty {
                TypeRef::Primitive(p) => return Ok(Resolved::Primitive(*p)),
                TypeRef::List(elem)   => return Ok(Resolved::List(&**elem)),
                TypeRef::Set(elem)    => return Ok(Resolved::Set(&**elem)),
                TypeRef::Map(k, v)    => return Ok(Resolved::Map(&**k, &**v)),
                TypeRef::Named(name)  => name,
            };

            match self.schema.lookup(name) {
                Some(NamedType::Struct(def)) | Some(NamedType::Exception(def)) => return Ok(Resolved::Struct(def)),
                Some(NamedType::Enum(def)) => return Ok(Resolved::Enum(def)),
                None => {}
            }

            match self.schema.typedefs.get(name) {
                Some(alias) if depth < MAX_TYPEDEF_DEPTH => {
                    ty = alias;
                    depth += 1;
                }
                _ => return Err(CodecError::UnknownType(name.clone())),
            }
        }
    }

    pub fn wire_type(&self, ty: &TypeRef) -> Result<WireType, CodecError> {
        Ok(self.resolve(ty)?.wire_type())
    }

    /// Prepares `value` for `ty` and writes it. Nothing is written if the value
    /// cannot be coerced.
    pub fn encode(&self, protocol: &mut dyn Protocol, ty: &TypeRef, value: &Value) -> Result<(), CodecError> {
        let prepared = self.prepare(ty, value)?;
        self.write_value(protocol, ty, &prepared)
    }

    /// Reads a value of type `ty` that the wire announced as `observed`.
    /// Returns `None` when the wire value cannot be turned into `ty`; the wire
    /// value is consumed either way.
    pub fn decode(&self, protocol: &mut dyn Protocol, ty: &TypeRef, observed: WireType) -> Result<Option<Value>, CodecError> {
        self.read_coerced(protocol, ty, observed)
    }

    /// Prepares a struct value against `def` and writes it.
    pub fn write_struct(&self, protocol: &mut dyn Protocol, def: &StructDescriptor, value: &Value) -> Result<(), CodecError> {
        let prepared = self.prepare_struct(def, value)?;
        self.write_prepared_struct(protocol, def, &prepared)
    }

    /// Reads a struct, skipping fields that `def` does not know and fields
    /// whose wire type cannot be coerced.
    pub fn read_struct(&self, protocol: &mut dyn Protocol, def: &StructDescriptor) -> Result<Value, CodecError> {
        self.read_struct_at(protocol, def, MAX_DECODE_DEPTH)
    }

    pub(crate) fn read_struct_at(&self, protocol: &mut dyn Protocol, def: &StructDescriptor, depth: usize) -> Result<Value, CodecError> {
        let depth = descend(depth)?;
        let mut fields = IndexMap::new();

        protocol.read_struct_begin()?;
        loop {
            let header = protocol.read_field_begin()?;
            if header.wire_type == WireType::Stop {
                break;
            }

            match def.field(header.index) {
                Some(field) => {
                    if let Some(value) = self.read_coerced_at(protocol, &field.type_ref, header.wire_type, depth)? {
                        fields.insert(field.name.clone(), value);
                    }
                }
                None => {
                    debug!(owner = %def.name, index = header.index, "skipping unknown field");
                    protocol.skip(header.wire_type)?;
                }
            }
            protocol.read_field_end()?;
        }
        protocol.read_struct_end()?;

        Ok(Value::Struct(def.name.clone(), fields))
    }

    /// Writes a struct value that [prepare_struct](Codec::prepare_struct) has
    /// already produced.
    pub fn write_prepared_struct(&self, protocol: &mut dyn Protocol, def: &StructDescriptor, value: &Value) -> Result<(), CodecError> {
        let fields = match value {
            Value::Struct(_, fields) => fields,
            other => return Err(CodecError::mismatch(&def.name, other.kind_name())),
        };

        protocol.write_struct_begin(&def.name)?;
        for field in def.fields.values() {
            if let Some(value) = fields.get(&field.name) {
                protocol.write_field_begin(&field.name, self.wire_type(&field.type_ref)?, field.index)?;
                self.write_value(protocol, &field.type_ref, value)?;
                protocol.write_field_end()?;
            }
        }
        protocol.write_field_stop()?;
        protocol.write_struct_end()?;
        Ok(())
    }

    /// Writes a value that has already been through [prepare](Codec::prepare).
    fn write_value(&self, protocol: &mut dyn Protocol, ty: &TypeRef, value: &Value) -> Result<(), CodecError> {
        let resolved = self.resolve(ty)?;
        match (resolved, value) {
            (Resolved::Primitive(Primitive::Bool), Value::Bool(v))     => protocol.write_bool(*v)?,
            (Resolved::Primitive(Primitive::Byte), Value::Byte(v))     => protocol.write_byte(*v)?,
            (Resolved::Primitive(Primitive::I16), Value::I16(v))       => protocol.write_i16(*v)?,
            (Resolved::Primitive(Primitive::I32), Value::I32(v))       => protocol.write_i32(*v)?,
            (Resolved::Primitive(Primitive::I64), Value::I64(v))       => protocol.write_i64(*v)?,
            (Resolved::Primitive(Primitive::Double), Value::Double(v)) => protocol.write_double(*v)?,
            (Resolved::Primitive(Primitive::String), Value::String(v)) => protocol.write_string(v)?,
            (Resolved::Primitive(Primitive::Binary), Value::Binary(v)) => protocol.write_binary(v)?,

            (Resolved::Enum(def), Value::Enum(_, member)) => {
                let code = def
                    .code_of(member)
                    .ok_or_else(|| CodecError::mismatch(&def.name, member))?;
                protocol.write_i32(code)?;
            }

            (Resolved::Enum(_), Value::I32(UNKNOWN_ENUM_CODE)) => protocol.write_i32(UNKNOWN_ENUM_CODE)?,

            (Resolved::Struct(def), Value::Struct(..)) => self.write_prepared_struct(protocol, def, value)?,

            (Resolved::List(elem), Value::List(values)) => {
                protocol.write_list_begin(&ListHeader { element: self.wire_type(elem)?, size: container_size(values.len())? })?;
                for value in values {
                    self.write_value(protocol, elem, value)?;
                }
                protocol.write_list_end()?;
            }

            (Resolved::Set(elem), Value::Set(values)) => {
                protocol.write_set_begin(&ListHeader { element: self.wire_type(elem)?, size: container_size(values.len())? })?;
                for value in values {
                    self.write_value(protocol, elem, value)?;
                }
                protocol.write_set_end()?;
            }

            (Resolved::Map(key_ty, value_ty), Value::Map(entries)) => {
                protocol.write_map_begin(&MapHeader {
                    key:   self.wire_type(key_ty)?,
                    value: self.wire_type(value_ty)?,
                    size:  container_size(entries.len())?,
                })?;
                for (key, value) in entries {
                    self.write_value(protocol, key_ty, key)?;
                    self.write_value(protocol, value_ty, value)?;
                }
                protocol.write_map_end()?;
            }

            (_, value) => return Err(CodecError::mismatch(ty, value.kind_name())),
        }
        Ok(())
    }

    /// Reads a value whose wire type already matches what `resolved` expects.
    pub(crate) fn read_direct(&self, protocol: &mut dyn Protocol, resolved: Resolved, depth: usize) -> Result<Option<Value>, CodecError> {
        let value = match resolved {
            Resolved::Primitive(p) => match p {
                Primitive::Bool   => Value::Bool(protocol.read_bool()?),
                Primitive::Byte   => Value::Byte(protocol.read_byte()?),
                Primitive::I16    => Value::I16(protocol.read_i16()?),
                Primitive::I32    => Value::I32(protocol.read_i32()?),
                Primitive::I64    => Value::I64(protocol.read_i64()?),
                Primitive::Double => Value::Double(protocol.read_double()?),
                Primitive::String => Value::String(protocol.read_string()?),
                Primitive::Binary => Value::Binary(protocol.read_binary()?),
            },

            Resolved::Enum(def) => {
                let code = protocol.read_i32()?;
                match def.member_of(code) {
                    Some(member) => Value::Enum(def.name.clone(), member.to_owned()),
                    None => {
                        warn!(enum_name = %def.name, code, "unknown enum code");
                        Value::I32(UNKNOWN_ENUM_CODE)
                    }
                }
            }

            Resolved::Struct(def) => self.read_struct_at(protocol, def, depth)?,

            Resolved::List(elem) => {
                let header = protocol.read_list_begin()?;
                let values = self.read_elements(protocol, elem, header, depth)?;
                protocol.read_list_end()?;
                return Ok(values.map(Value::List));
            }

            Resolved::Set(elem) => {
                let header = protocol.read_set_begin()?;
                let values = self.read_elements(protocol, elem, header, depth)?;
                protocol.read_set_end()?;
                return Ok(values.map(|values| {
                    let mut set = Value::Set(Vec::with_capacity(values.len()));
                    for value in values {
                        set.push(value);
                    }
                    set
                }));
            }

            Resolved::Map(key_ty, value_ty) => {
                let depth = descend(depth)?;
                let header = protocol.read_map_begin()?;
                let key_wire = self.wire_type(key_ty)?;
                let value_wire = self.wire_type(value_ty)?;

                let entries = if valid_element_type(key_wire, header.key) && valid_element_type(value_wire, header.value) {
                    let mut entries = Vec::with_capacity(preallocation(header.size));
                    for _ in 0..header.size {
                        let key = self.read_coerced_at(protocol, key_ty, header.key, depth)?;
                        let value = self.read_coerced_at(protocol, value_ty, header.value, depth)?;
                        if let (Some(key), Some(value)) = (key, value) {
                            entries.push((key, value));
                        }
                    }
                    Some(Value::Map(entries))
                } else {
                    debug!(expected_key = %key_wire, expected_value = %value_wire, "skipping incompatible map");
                    for _ in 0..header.size {
                        protocol.skip(header.key)?;
                        protocol.skip(header.value)?;
                    }
                    None
                };
                protocol.read_map_end()?;
                return Ok(entries);
            }
        };
        Ok(Some(value))
    }

    fn read_elements(&self, protocol: &mut dyn Protocol, elem: &TypeRef, header: ListHeader, depth: usize) -> Result<Option<Vec<Value>>, CodecError> {
        let depth = descend(depth)?;
        let expected = self.wire_type(elem)?;
        if !valid_element_type(expected, header.element) {
            debug!(expected = %expected, found = %header.element, "skipping incompatible container");
            for _ in 0..header.size {
                protocol.skip(header.element)?;
            }
            return Ok(None);
        }

        let mut values = Vec::with_capacity(preallocation(header.size));
        for _ in 0..header.size {
            if let Some(value) = self.read_coerced_at(protocol, elem, header.element, depth)? {
                values.push(value);
            }
        }
        Ok(Some(values))
    }
}

fn container_size(len: usize) -> Result<i32, CodecError> {
    i32::try_from(len).map_err(|_| CodecError::mismatch("container of at most i32::MAX elements", len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{binary::BinaryProtocol, types::{FieldDescriptor, StructKind}};
    use std::collections::VecDeque;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.enums.insert(
            "Status".to_owned(),
            EnumDescriptor::new("Status", vec!["DEAD".to_owned(), "ALIVE".to_owned()]),
        );
        schema.structs.insert(
            "Hello".to_owned(),
            StructDescriptor::new("Hello", StructKind::Struct, vec![
                FieldDescriptor::new(1, "name", TypeRef::Primitive(Primitive::String)),
                FieldDescriptor::new(2, "age", TypeRef::Primitive(Primitive::I32)),
                FieldDescriptor::new(3, "flag", TypeRef::Primitive(Primitive::Bool)),
                FieldDescriptor::new(4, "status", TypeRef::Named("Status".to_owned())),
                FieldDescriptor::new(5, "tags", TypeRef::Set(Box::new(TypeRef::Primitive(Primitive::String)))),
                FieldDescriptor::new(6, "scores", TypeRef::Map(
                    Box::new(TypeRef::Primitive(Primitive::String)),
                    Box::new(TypeRef::Primitive(Primitive::I32)),
                )),
                FieldDescriptor::new(7, "friends", TypeRef::List(Box::new(TypeRef::Named("Hello".to_owned())))),
            ]),
        );
        schema.structs.insert(
            "Node".to_owned(),
            StructDescriptor::new("Node", StructKind::Struct, vec![
                FieldDescriptor::new(1, "next", TypeRef::Named("Node".to_owned())),
            ]),
        );
        schema.typedefs.insert("Age".to_owned(), TypeRef::Primitive(Primitive::I32));
        schema
    }

    fn protocol() -> BinaryProtocol<VecDeque<u8>> {
        BinaryProtocol::new(VecDeque::new())
    }

    fn hello() -> TypeRef {
        TypeRef::Named("Hello".to_owned())
    }

    #[test]
    fn struct_round_trip() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        let value = Value::new_struct("Hello", vec![
            ("name", Value::from("Alice")),
            ("age", Value::I32(30)),
            ("flag", Value::Bool(true)),
            ("status", Value::new_enum("Status", "ALIVE")),
            ("tags", Value::Set(vec![Value::from("a"), Value::from("b")])),
            ("scores", Value::Map(vec![(Value::from("math"), Value::I32(9))])),
            ("friends", Value::List(vec![Value::new_struct("Hello", vec![("name", Value::from("Bob"))])])),
        ]);

        codec.encode(&mut p, &hello(), &value).unwrap();
        let decoded = codec.decode(&mut p, &hello(), WireType::Struct).unwrap();
        assert_eq!(decoded, Some(value));
        assert!(p.transport().is_empty());
    }

    #[test]
    fn false_fields_are_written() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        let value = Value::new_struct("Hello", vec![("flag", Value::Bool(false))]);
        codec.encode(&mut p, &hello(), &value).unwrap();
        assert_eq!(p.transport().iter().copied().collect::<Vec<u8>>(), [2, 0, 3, 0, 0]);

        let decoded = codec.read_struct(&mut p, &schema.structs["Hello"]).unwrap();
        assert_eq!(decoded.get("flag"), Some(&Value::Bool(false)));
        assert_eq!(decoded.get("name"), None);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        p.write_field_begin("extra", WireType::List, 42).unwrap();
        p.write_list_begin(&ListHeader { element: WireType::I64, size: 2 }).unwrap();
        p.write_i64(1).unwrap();
        p.write_i64(2).unwrap();
        p.write_field_begin("age", WireType::I32, 2).unwrap();
        p.write_i32(7).unwrap();
        p.write_field_stop().unwrap();

        let decoded = codec.read_struct(&mut p, &schema.structs["Hello"]).unwrap();
        assert_eq!(decoded, Value::new_struct("Hello", vec![("age", Value::I32(7))]));
    }

    #[test]
    fn incompatible_wire_type_is_skipped() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        p.write_field_begin("age", WireType::Double, 2).unwrap();
        p.write_double(1.5).unwrap();
        p.write_field_stop().unwrap();

        let decoded = codec.read_struct(&mut p, &schema.structs["Hello"]).unwrap();
        assert_eq!(decoded.get("age"), None);
        assert!(p.transport().is_empty());
    }

    #[test]
    fn incompatible_container_is_absent() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();
        let ty = TypeRef::List(Box::new(TypeRef::Primitive(Primitive::I32)));

        p.write_list_begin(&ListHeader { element: WireType::Double, size: 2 }).unwrap();
        p.write_double(1.0).unwrap();
        p.write_double(2.0).unwrap();
        p.write_i32(99).unwrap();

        assert_eq!(codec.decode(&mut p, &ty, WireType::List).unwrap(), None);
        assert_eq!(p.read_i32().unwrap(), 99);
    }

    #[test]
    fn string_elements_are_coerced() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();
        let ty = TypeRef::List(Box::new(TypeRef::Primitive(Primitive::I32)));

        p.write_list_begin(&ListHeader { element: WireType::String, size: 3 }).unwrap();
        p.write_string("1").unwrap();
        p.write_string("x").unwrap();
        p.write_string("3").unwrap();

        assert_eq!(
            codec.decode(&mut p, &ty, WireType::List).unwrap(),
            Some(Value::List(vec![Value::I32(1), Value::I32(3)]))
        );
    }

    #[test]
    fn sets_are_deduplicated_on_read() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();
        let ty = TypeRef::Set(Box::new(TypeRef::Primitive(Primitive::I32)));

        p.write_set_begin(&ListHeader { element: WireType::I32, size: 3 }).unwrap();
        p.write_i32(1).unwrap();
        p.write_i32(1).unwrap();
        p.write_i32(2).unwrap();

        assert_eq!(
            codec.decode(&mut p, &ty, WireType::Set).unwrap(),
            Some(Value::Set(vec![Value::I32(1), Value::I32(2)]))
        );
    }

    #[test]
    fn unknown_enum_code() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();
        let ty = TypeRef::Named("Status".to_owned());

        p.write_i32(1).unwrap();
        p.write_i32(17).unwrap();
        assert_eq!(codec.decode(&mut p, &ty, WireType::I32).unwrap(), Some(Value::new_enum("Status", "ALIVE")));
        assert_eq!(codec.decode(&mut p, &ty, WireType::I32).unwrap(), Some(Value::I32(UNKNOWN_ENUM_CODE)));

        // Written back unchanged.
        codec.encode(&mut p, &ty, &Value::I32(UNKNOWN_ENUM_CODE)).unwrap();
        assert_eq!(p.transport().iter().copied().collect::<Vec<u8>>(), [255, 255, 255, 255]);
        assert_eq!(codec.decode(&mut p, &ty, WireType::I32).unwrap(), Some(Value::I32(UNKNOWN_ENUM_CODE)));

        // Other unowned codes are still rejected.
        assert!(codec.encode(&mut p, &ty, &Value::I32(17)).is_err());
        assert!(p.transport().is_empty());
    }

    #[test]
    fn primitives_round_trip() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        let cases = vec![
            (Primitive::Bool, Value::Bool(false)),
            (Primitive::Byte, Value::Byte(-128)),
            (Primitive::I16, Value::I16(-12345)),
            (Primitive::I32, Value::I32(i32::MAX)),
            (Primitive::I64, Value::I64(i64::MIN)),
            (Primitive::Double, Value::Double(-0.125)),
            (Primitive::String, Value::from("héllo")),
            (Primitive::Binary, Value::Binary(vec![0, 159, 255])),
        ];
        for (primitive, value) in cases {
            let ty = TypeRef::Primitive(primitive);
            codec.encode(&mut p, &ty, &value).unwrap();
            let decoded = codec.decode(&mut p, &ty, primitive.wire_type()).unwrap();
            assert_eq!(decoded, Some(value), "{:?}", primitive);
            assert!(p.transport().is_empty());
        }
    }

    #[test]
    fn huge_container_sizes_are_not_preallocated() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let list = TypeRef::List(Box::new(TypeRef::Primitive(Primitive::I32)));
        let map = TypeRef::Map(
            Box::new(TypeRef::Primitive(Primitive::I32)),
            Box::new(TypeRef::Primitive(Primitive::I32)),
        );

        let mut p = BinaryProtocol::new(VecDeque::from(vec![8, 0x7f, 0xff, 0xff, 0xff, 0, 0, 0, 1]));
        match codec.decode(&mut p, &list, WireType::List) {
            Err(CodecError::Transport(err)) => assert!(err.is_eof()),
            other => panic!("unexpected {:?}", other),
        }

        let mut p = BinaryProtocol::new(VecDeque::from(vec![8, 8, 0x7f, 0xff, 0xff, 0xff]));
        match codec.decode(&mut p, &map, WireType::Map) {
            Err(CodecError::Transport(err)) => assert!(err.is_eof()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decode_depth_limit() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let node = &schema.structs["Node"];

        let mut bytes = Vec::new();
        for _ in 0..200_000 {
            bytes.extend_from_slice(&[12, 0, 1]);
        }
        let mut p = BinaryProtocol::new(VecDeque::from(bytes));
        assert!(matches!(
            codec.read_struct(&mut p, node),
            Err(CodecError::Transport(TransportError::DepthLimit))
        ));

        // A shallow chain is fine.
        let mut p = BinaryProtocol::new(VecDeque::from(vec![12, 0, 1, 12, 0, 1, 0, 0, 0]));
        let decoded = codec.read_struct(&mut p, node).unwrap();
        let expected = Value::new_struct("Node", vec![(
            "next",
            Value::new_struct("Node", vec![("next", Value::new_struct("Node", Vec::<(String, Value)>::new()))]),
        )]);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn typedefs_resolve() {
        let schema = schema();
        let codec = Codec::new(&schema);
        assert_eq!(codec.wire_type(&TypeRef::Named("Age".to_owned())).unwrap(), WireType::I32);
        assert_eq!(codec.wire_type(&hello()).unwrap(), WireType::Struct);
        assert!(matches!(
            codec.wire_type(&TypeRef::Named("Nope".to_owned())),
            Err(CodecError::UnknownType(name)) if name == "Nope"
        ));
    }

    #[test]
    fn type_error_writes_nothing() {
        let schema = schema();
        let codec = Codec::new(&schema);
        let mut p = protocol();

        let value = Value::new_struct("Hello", vec![
            ("name", Value::from("Alice")),
            ("age", Value::from("not a number")),
        ]);
        assert!(matches!(
            codec.encode(&mut p, &hello(), &value),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(p.transport().is_empty());
    }
}
