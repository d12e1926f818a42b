use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// The on-wire tag of a value in the binary protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    Stop   = 0,
    Void   = 1,
    Bool   = 2,
    Byte   = 3,
    Double = 4,
    I16    = 6,
    I32    = 8,
    I64    = 10,
    String = 11,
    Struct = 12,
    Map    = 13,
    Set    = 14,
    List   = 15,
}

impl WireType {
    pub fn from_u8(code: u8) -> Option<WireType> {
        match code {
            0  => Some(WireType::Stop),
            1  => Some(WireType::Void),
            2  => Some(WireType::Bool),
            3  => Some(WireType::Byte),
            4  => Some(WireType::Double),
            6  => Some(WireType::I16),
            8  => Some(WireType::I32),
            10 => Some(WireType::I64),
            11 => Some(WireType::String),
            12 => Some(WireType::Struct),
            13 => Some(WireType::Map),
            14 => Some(WireType::Set),
            15 => Some(WireType::List),
            _  => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            WireType::Stop   => "STOP",
            WireType::Void   => "VOID",
            WireType::Bool   => "BOOL",
            WireType::Byte   => "BYTE",
            WireType::Double => "DOUBLE",
            WireType::I16    => "I16",
            WireType::I32    => "I32",
            WireType::I64    => "I64",
            WireType::String => "STRING",
            WireType::Struct => "STRUCT",
            WireType::Map    => "MAP",
            WireType::Set    => "SET",
            WireType::List   => "LIST",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Call      = 1,
    Reply     = 2,
    Exception = 3,
    Oneway    = 4,
}

impl MessageType {
    pub fn from_u8(code: u8) -> Option<MessageType> {
        match code {
            1 => Some(MessageType::Call),
            2 => Some(MessageType::Reply),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::Oneway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
}

impl Primitive {
    /// Maps an IDL base type keyword to its primitive, if it is one.
    pub fn from_keyword(word: &str) -> Option<Primitive> {
        match word {
            "bool"            => Some(Primitive::Bool),
            "byte" | "i8"     => Some(Primitive::Byte),
            "i16"             => Some(Primitive::I16),
            "i32"             => Some(Primitive::I32),
            "i64"             => Some(Primitive::I64),
            "double"          => Some(Primitive::Double),
            "string" | "slist" => Some(Primitive::String),
            "binary"          => Some(Primitive::Binary),
            _                 => None,
        }
    }

    pub fn wire_type(self) -> WireType {
        match self {
            Primitive::Bool   => WireType::Bool,
            Primitive::Byte   => WireType::Byte,
            Primitive::I16    => WireType::I16,
            Primitive::I32    => WireType::I32,
            Primitive::I64    => WireType::I64,
            Primitive::Double => WireType::Double,
            Primitive::String | Primitive::Binary => WireType::String,
        }
    }
}

/// A reference to a type as written in the IDL. Named references are looked
/// up in the [Schema] when they are used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeRef {
    Primitive(Primitive),
    Named(String),
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => match p {
                Primitive::Bool   => f.write_str("bool"),
                Primitive::Byte   => f.write_str("byte"),
                Primitive::I16    => f.write_str("i16"),
                Primitive::I32    => f.write_str("i32"),
                Primitive::I64    => f.write_str("i64"),
                Primitive::Double => f.write_str("double"),
                Primitive::String => f.write_str("string"),
                Primitive::Binary => f.write_str("binary"),
            },
            TypeRef::Named(name)   => f.write_str(name),
            TypeRef::List(elem)    => write!(f, "list<{}>", elem),
            TypeRef::Set(elem)     => write!(f, "set<{}>", elem),
            TypeRef::Map(key, val) => write!(f, "map<{},{}>", key, val),
        }
    }
}

/// A constant literal from the IDL: field defaults and `const` declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstValue {
    Int(i64),
    Double(f64),
    String(String),
    Identifier(String),
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub index:        i16,
    pub name:         String,
    pub type_ref:     TypeRef,
    pub default:      Option<ConstValue>,
    pub requiredness: Option<Requiredness>,
}

impl FieldDescriptor {
    pub fn new(index: i16, name: &str, type_ref: TypeRef) -> FieldDescriptor {
        FieldDescriptor {
            index,
            name: name.to_owned(),
            type_ref,
            default: None,
            requiredness: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructKind {
    Struct,
    Union,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDescriptor {
    pub name:   String,
    pub kind:   StructKind,
    pub fields: IndexMap<i16, FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: &str, kind: StructKind, fields: Vec<FieldDescriptor>) -> StructDescriptor {
        StructDescriptor {
            name: name.to_owned(),
            kind,
            fields: fields.into_iter().map(|f| (f.index, f)).collect(),
        }
    }

    pub fn field(&self, index: i16) -> Option<&FieldDescriptor> {
        self.fields.get(&index)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.values().find(|f| f.name == name)
    }
}

/// Enum members get wire codes from their declaration order, starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    pub name:    String,
    pub members: Vec<String>,
}

impl EnumDescriptor {
    pub fn new(name: &str, members: Vec<String>) -> EnumDescriptor {
        EnumDescriptor { name: name.to_owned(), members }
    }

    pub fn code_of(&self, member: &str) -> Option<i32> {
        self.members.iter().position(|m| m == member).map(|i| i as i32)
    }

    pub fn member_of(&self, code: i32) -> Option<&str> {
        if code < 0 {
            return None;
        }
        self.members.get(code as usize).map(|m| m.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub name:        String,
    pub return_type: Option<TypeRef>,
    pub arguments:   Vec<FieldDescriptor>,
    pub throws:      Vec<FieldDescriptor>,
    pub oneway:      bool,
}

impl FunctionDescriptor {
    /// The synthetic struct carrying the call arguments.
    pub fn args_struct(&self) -> StructDescriptor {
        StructDescriptor::new(
            &format!("{}_args", self.name),
            StructKind::Struct,
            self.arguments.clone(),
        )
    }

    /// The synthetic struct carrying a reply: field 0 is the return value and
    /// every declared exception sits at its throws index.
    pub fn result_struct(&self) -> StructDescriptor {
        let mut fields = Vec::with_capacity(self.throws.len() + 1);
        if let Some(ref ty) = self.return_type {
            fields.push(FieldDescriptor::new(0, "success", ty.clone()));
        }
        fields.extend(self.throws.iter().cloned());
        StructDescriptor::new(&format!("{}_result", self.name), StructKind::Struct, fields)
    }

    /// Finds the throws field that carries the exception type `name`.
    pub fn throws_field_for(&self, name: &str) -> Option<&FieldDescriptor> {
        self.throws
            .iter()
            .find(|f| matches!(f.type_ref, TypeRef::Named(ref n) if n == name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub name:      String,
    pub extends:   Option<String>,
    pub functions: Vec<FunctionDescriptor>,
}

impl ServiceDescriptor {
    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstDescriptor {
    pub type_ref: TypeRef,
    pub value:    ConstValue,
}

/// What a named type reference points at.
#[derive(Debug, Clone, Copy)]
pub enum NamedType<'a> {
    Struct(&'a StructDescriptor),
    Exception(&'a StructDescriptor),
    Enum(&'a EnumDescriptor),
}

/// A compiled IDL file. Populated in declaration order by the compiler and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub namespace:  Vec<String>,
    pub structs:    IndexMap<String, StructDescriptor>,
    pub exceptions: IndexMap<String, StructDescriptor>,
    pub enums:      IndexMap<String, EnumDescriptor>,
    pub typedefs:   IndexMap<String, TypeRef>,
    pub constants:  IndexMap<String, ConstDescriptor>,
    pub services:   Vec<ServiceDescriptor>,
}

impl Schema {
    pub fn new() -> Schema {
        Schema::default()
    }

    pub fn lookup(&self, name: &str) -> Option<NamedType<'_>> {
        if let Some(def) = self.structs.get(name) {
            return Some(NamedType::Struct(def));
        }
        if let Some(def) = self.exceptions.get(name) {
            return Some(NamedType::Exception(def));
        }
        self.enums.get(name).map(NamedType::Enum)
    }

    /// Finds a struct or an exception by name.
    pub fn struct_like(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.get(name).or_else(|| self.exceptions.get(name))
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some() || self.typedefs.contains_key(name)
    }

    /// The `::`-joined path of a definition inside the schema namespace.
    pub fn qualified_name(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_owned()
        } else {
            format!("{}::{}", self.namespace.join("::"), name)
        }
    }
}
