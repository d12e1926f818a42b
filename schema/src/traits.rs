use crate::{error::CodecError, value::Value};

/// Host types that can be built from a decoded [Value].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, CodecError>;
}

/// Host types that can be turned into a [Value] for encoding.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Extracts a required struct field.
pub fn field<T: FromValue>(value: &Value, name: &str) -> Result<T, CodecError> {
    match value.get(name) {
        Some(v) => T::from_value(v),
        None => Err(CodecError::MissingField(name.to_owned())),
    }
}

/// Extracts a struct field that may be absent.
pub fn optional_field<T: FromValue>(value: &Value, name: &str) -> Result<Option<T>, CodecError> {
    value.get(name).map(T::from_value).transpose()
}

macro_rules! scalar {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, CodecError> {
                match *value {
                    Value::$variant(ref v) => Ok(v.clone()),
                    ref other => Err(CodecError::mismatch($name, other.kind_name())),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

scalar!(bool, Bool, "bool");
scalar!(i8, Byte, "byte");
scalar!(i16, I16, "i16");
scalar!(i32, I32, "i32");
scalar!(i64, I64, "i64");
scalar!(f64, Double, "double");
scalar!(String, String, "string");
scalar!(Vec<u8>, Binary, "binary");

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, CodecError> {
        match *value {
            Value::List(ref values) | Value::Set(ref values) => values.iter().map(T::from_value).collect(),
            ref other => Err(CodecError::mismatch("list", other.kind_name())),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}
