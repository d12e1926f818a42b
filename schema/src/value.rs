use indexmap::IndexMap;
use std::fmt;
use std::ops::Index;

/// The code an enum decodes to when the wire carries a number that no member
/// of the enum owns.
pub const UNKNOWN_ENUM_CODE: i32 = -1;

/// This type holds dynamic Thrift data.
///
/// Values can represent anything described by a [Schema](crate::Schema) and
/// are written to and read from a [Protocol](crate::Protocol) by the
/// [Codec](crate::Codec). A struct field that is not present is simply missing
/// from the field map, so `Bool(false)` and "absent" stay distinct.
#[derive(Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(String, String),
    Struct(String, IndexMap<String, Value>),
}

impl Value {
    /// Builds a struct value from `(field, value)` pairs.
    pub fn new_struct<I, K>(name: &str, fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(
            name.to_owned(),
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    pub fn new_enum(name: &str, member: &str) -> Value {
        Value::Enum(name.to_owned(), member.to_owned())
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract the value out of a [Byte](#variant.Byte).
    /// Returns `0` for other value kinds.
    pub fn as_byte(&self) -> i8 {
        match *self {
            Value::Byte(value) => value,
            _ => 0,
        }
    }

    /// Extracts any integer kind widened to `i64`. Returns `0` for other value
    /// kinds.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Value::Byte(value) => value as i64,
            Value::I16(value) => value as i64,
            Value::I32(value) => value as i64,
            Value::I64(value) => value,
            _ => 0,
        }
    }

    /// A convenience method to extract the value out of an [I32](#variant.I32).
    /// Returns `0` for other value kinds.
    pub fn as_i32(&self) -> i32 {
        match *self {
            Value::I32(value) => value,
            _ => 0,
        }
    }

    /// A convenience method to extract the value out of a [Double](#variant.Double).
    /// Returns `0.0` for other value kinds.
    pub fn as_double(&self) -> f64 {
        match *self {
            Value::Double(value) => value,
            _ => 0.0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Enums yield their member name. Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            Value::Enum(_, ref member) => member.as_str(),
            _ => "",
        }
    }

    /// Returns the elements of a [List](#variant.List) or [Set](#variant.Set),
    /// or an empty slice for other value kinds.
    pub fn as_list(&self) -> &[Value] {
        match *self {
            Value::List(ref values) | Value::Set(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to extract the value out of an [Enum](#variant.Enum).
    /// Returns `("", "")` for other value kinds.
    pub fn as_enum(&self) -> (&str, &str) {
        match *self {
            Value::Enum(ref name, ref member) => (name, member),
            _ => ("", ""),
        }
    }

    /// Number of elements in a container. Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::List(ref values) | Value::Set(ref values) => values.len(),
            Value::Map(ref entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to a [List](#variant.List). Sets only
    /// take values they do not already hold. Does nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        match *self {
            Value::List(ref mut values) => values.push(value),
            Value::Set(ref mut values) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            _ => {}
        }
    }

    /// A convenience method to extract a field out of a [Struct](#variant.Struct).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Struct(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// A convenience method to update a field on a [Struct](#variant.Struct).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Struct(_, ref mut fields) = *self {
            fields.insert(name.to_owned(), value);
        }
    }

    /// A convenience method to remove a field on a [Struct](#variant.Struct).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Struct(_, ref mut fields) = *self {
            fields.shift_remove(name);
        }
    }

    /// Looks a key up in a [Map](#variant.Map).
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        match *self {
            Value::Map(ref entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// A short description of what this value is, used in error messages.
    pub fn kind_name(&self) -> String {
        match *self {
            Value::Bool(_)              => "bool".to_owned(),
            Value::Byte(_)              => "byte".to_owned(),
            Value::I16(_)               => "i16".to_owned(),
            Value::I32(_)               => "i32".to_owned(),
            Value::I64(_)               => "i64".to_owned(),
            Value::Double(_)            => "double".to_owned(),
            Value::String(_)            => "string".to_owned(),
            Value::Binary(_)            => "binary".to_owned(),
            Value::List(_)              => "list".to_owned(),
            Value::Set(_)               => "set".to_owned(),
            Value::Map(_)               => "map".to_owned(),
            Value::Enum(ref name, _)    => format!("enum {}", name),
            Value::Struct(ref name, _)  => format!("struct {}", name),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't a [List](#variant.List) or
    /// [Set](#variant.Set) or if the provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::List(ref values) | Value::Set(ref values) => &values[index],
            _ => panic!("cannot index into {}", self.kind_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Value {
        Value::Byte(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Value {
        Value::I16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::Byte(value) => value.fmt(f),
            Value::I16(value) => value.fmt(f),
            Value::I32(value) => value.fmt(f),
            Value::I64(value) => value.fmt(f),
            Value::Double(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Binary(ref value) => write!(f, "b{:?}", value),
            Value::List(ref values) => values.fmt(f),
            Value::Set(ref values) => {
                write!(f, "{{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", value)?;
                }
                write!(f, "}}")
            }
            Value::Map(ref entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?} => {:?}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Enum(ref name, ref member) => write!(f, "{}::{}", name, member),

            Value::Struct(ref name, ref fields) => {
                write!(f, "{} {{", name)?;
                let mut first = true;
                for (key, value) in fields {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> Value {
        Value::new_struct(
            "Hello",
            vec![
                ("key1", Value::from("value1")),
                ("key2", Value::from("value2")),
            ],
        )
    }

    #[test]
    fn value_basic() {
        let value = Value::List(vec![
            Value::Bool(true),
            Value::Byte(-1),
            Value::I16(300),
            Value::I32(-1),
            Value::I64(1 << 40),
            Value::Double(0.5),
            Value::String("abc".to_owned()),
            Value::new_enum("Status", "ALIVE"),
            hello(),
        ]);

        assert_eq!(value.len(), 9);

        assert_eq!(value[0], Value::Bool(true));
        assert_eq!(value[1], Value::Byte(-1));
        assert_eq!(value[2], Value::I16(300));
        assert_eq!(value[3], Value::I32(-1));
        assert_eq!(value[4], Value::I64(1 << 40));
        assert_eq!(value[5], Value::Double(0.5));
        assert_eq!(value[6], Value::String("abc".to_owned()));
        assert_eq!(value[7], Value::new_enum("Status", "ALIVE"));
        assert_eq!(value[8], hello());

        assert_eq!(value[0].as_bool(), true);
        assert_eq!(value[1].as_byte(), -1);
        assert_eq!(value[2].as_i64(), 300);
        assert_eq!(value[3].as_i32(), -1);
        assert_eq!(value[4].as_i64(), 1 << 40);
        assert_eq!(value[5].as_double(), 0.5);
        assert_eq!(value[6].as_string(), "abc");
        assert_eq!(value[7].as_string(), "ALIVE");
        assert_eq!(value[7].as_enum(), ("Status", "ALIVE"));
        assert_eq!(value[8].get("key1"), Some(&Value::from("value1")));
        assert_eq!(value[8].get("key3"), None);

        assert_eq!(value[0].as_i32(), 0);
        assert_eq!(value[0].as_string(), "");
        assert!(value[0].as_list().is_empty());
        assert_eq!(value[0].as_enum(), ("", ""));
    }

    #[test]
    fn value_push() {
        let mut value = Value::List(vec![]);
        value.push(Value::I32(1));
        value.push(Value::I32(1));
        assert_eq!(value.len(), 2);

        let mut set = Value::Set(vec![]);
        set.push(Value::I32(1));
        set.push(Value::I32(1));
        set.push(Value::I32(2));
        assert_eq!(set, Value::Set(vec![Value::I32(1), Value::I32(2)]));

        let mut scalar = Value::I32(5);
        scalar.push(Value::I32(1));
        assert_eq!(scalar, Value::I32(5));
    }

    #[test]
    fn value_set_and_remove() {
        let mut value = hello();
        value.set("key3", Value::Bool(false));
        assert_eq!(value.get("key3"), Some(&Value::Bool(false)));

        value.remove("key1");
        assert_eq!(value.get("key1"), None);
        assert_eq!(
            format!("{:?}", value),
            "Hello {key2: \"value2\", key3: false}"
        );
    }

    #[test]
    fn value_map_lookup() {
        let map = Value::Map(vec![
            (Value::from("one"), Value::I32(1)),
            (Value::from("two"), Value::I32(2)),
        ]);
        assert_eq!(map.lookup(&Value::from("two")), Some(&Value::I32(2)));
        assert_eq!(map.lookup(&Value::from("three")), None);
        assert_eq!(format!("{:?}", map), "{\"one\" => 1, \"two\" => 2}");
    }

    #[test]
    fn value_debug() {
        assert_eq!(format!("{:?}", Value::new_enum("Status", "DEAD")), "Status::DEAD");
        assert_eq!(
            format!("{:?}", Value::Set(vec![Value::I32(1), Value::I32(2)])),
            "{1, 2}"
        );
        assert_eq!(format!("{:?}", hello()), "Hello {key1: \"value1\", key2: \"value2\"}");
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::I16(1).kind_name(), "i16");
        assert_eq!(hello().kind_name(), "struct Hello");
        assert_eq!(Value::new_enum("Status", "DEAD").kind_name(), "enum Status");
    }
}
