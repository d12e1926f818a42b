use crate::{
    codec::{Codec, Resolved, MAX_DECODE_DEPTH},
    error::CodecError,
    protocol::Protocol,
    types::{EnumDescriptor, Primitive, StructDescriptor, TypeRef, WireType},
    value::{Value, UNKNOWN_ENUM_CODE},
};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRUE_PATTERN: Regex = Regex::new(r"^(1|y|t|on)").unwrap();
}

/// Reads a boolean out of text. Anything starting with `1`, `y`, `t` or `on`
/// is true, everything else is false.
pub fn parse_bool(text: &str) -> bool {
    TRUE_PATTERN.is_match(text)
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

fn parse_double(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Narrows an integer to the requested width, or `None` when it does not fit.
fn int_as(primitive: Primitive, value: i64) -> Option<Value> {
    match primitive {
        Primitive::Byte => i8::try_from(value).ok().map(Value::Byte),
        Primitive::I16  => i16::try_from(value).ok().map(Value::I16),
        Primitive::I32  => i32::try_from(value).ok().map(Value::I32),
        Primitive::I64  => Some(Value::I64(value)),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match *value {
        Value::Byte(v) => Some(v as i64),
        Value::I16(v)  => Some(v as i64),
        Value::I32(v)  => Some(v as i64),
        Value::I64(v)  => Some(v),
        _ => None,
    }
}

/// The textual form of a scalar, as sent when a string is expected.
pub fn render(value: &Value) -> Option<String> {
    match *value {
        Value::Bool(v)           => Some(v.to_string()),
        Value::Byte(v)           => Some(v.to_string()),
        Value::I16(v)            => Some(v.to_string()),
        Value::I32(v)            => Some(v.to_string()),
        Value::I64(v)            => Some(v.to_string()),
        Value::Double(v)         => Some(format!("{:?}", v)),
        Value::String(ref v)     => Some(v.clone()),
        Value::Enum(_, ref v)    => Some(v.clone()),
        _ => None,
    }
}

fn enum_from_text(def: &EnumDescriptor, text: &str) -> Option<Value> {
    if def.code_of(text).is_some() {
        return Some(Value::Enum(def.name.clone(), text.to_owned()));
    }
    let code = i32::try_from(parse_int(text)?).ok()?;
    def.member_of(code).map(|member| Value::Enum(def.name.clone(), member.to_owned()))
}

/// Parses text into the expected scalar. Unparseable text yields `None`.
fn from_text(resolved: Resolved, text: &str) -> Option<Value> {
    match resolved {
        Resolved::Primitive(Primitive::Bool)   => Some(Value::Bool(parse_bool(text))),
        Resolved::Primitive(Primitive::Double) => parse_double(text).map(Value::Double),
        Resolved::Primitive(Primitive::String) => Some(Value::String(text.to_owned())),
        Resolved::Primitive(Primitive::Binary) => Some(Value::Binary(text.as_bytes().to_vec())),
        Resolved::Primitive(p)                 => int_as(p, parse_int(text)?),
        Resolved::Enum(def)                    => enum_from_text(def, text),
        _ => None,
    }
}

/// Reads a scalar of wire type `observed` and renders it as text. Other wire
/// types are skipped.
fn read_as_text(protocol: &mut dyn Protocol, observed: WireType) -> Result<Option<String>, CodecError> {
    let text = match observed {
        WireType::Bool   => protocol.read_bool()?.to_string(),
        WireType::Byte   => protocol.read_byte()?.to_string(),
        WireType::I16    => protocol.read_i16()?.to_string(),
        WireType::I32    => protocol.read_i32()?.to_string(),
        WireType::I64    => protocol.read_i64()?.to_string(),
        WireType::Double => format!("{:?}", protocol.read_double()?),
        other => {
            protocol.skip(other)?;
            return Ok(None);
        }
    };
    Ok(Some(text))
}

impl<'s> Codec<'s> {
    /// Reads a value the wire announced as `observed` into the type `ty`,
    /// coercing between strings and scalars where needed.
    pub fn read_coerced(&self, protocol: &mut dyn Protocol, ty: &TypeRef, observed: WireType) -> Result<Option<Value>, CodecError> {
        self.read_coerced_at(protocol, ty, observed, MAX_DECODE_DEPTH)
    }

    pub(crate) fn read_coerced_at(
        &self,
        protocol: &mut dyn Protocol,
        ty: &TypeRef,
        observed: WireType,
        depth: usize,
    ) -> Result<Option<Value>, CodecError> {
        if observed == WireType::Stop {
            return Ok(None);
        }

        let resolved = self.resolve(ty)?;
        let expected = resolved.wire_type();

        if expected == observed {
            self.read_direct(protocol, resolved, depth)
        } else if expected == WireType::String {
            let text = read_as_text(protocol, observed)?;
            Ok(text.and_then(|text| from_text(resolved, &text)))
        } else if observed == WireType::String {
            let bytes = protocol.read_binary()?;
            Ok(std::str::from_utf8(&bytes).ok().and_then(|text| from_text(resolved, text)))
        } else {
            protocol.skip(observed)?;
            Ok(None)
        }
    }

    /// Coerces `value` into the shape `ty` describes, so that writing it can
    /// not fail halfway through.
    pub fn prepare(&self, ty: &TypeRef, value: &Value) -> Result<Value, CodecError> {
        let resolved = self.resolve(ty)?;
        let mismatch = || CodecError::mismatch(ty, value.kind_name());

        match resolved {
            Resolved::Primitive(Primitive::Bool) => match *value {
                Value::Bool(v)       => Ok(Value::Bool(v)),
                Value::String(ref s) => Ok(Value::Bool(parse_bool(s))),
                _ => as_integer(value).map(|v| Value::Bool(v != 0)).ok_or_else(mismatch),
            },

            Resolved::Primitive(p @ (Primitive::Byte | Primitive::I16 | Primitive::I32 | Primitive::I64)) => {
                let wide = match *value {
                    Value::String(ref s) => parse_int(s),
                    Value::Double(d) if d.is_finite() && d.trunc() >= i64::MIN as f64 && d.trunc() <= i64::MAX as f64 => {
                        Some(d.trunc() as i64)
                    }
                    _ => as_integer(value),
                };
                wide.and_then(|v| int_as(p, v)).ok_or_else(mismatch)
            }

            Resolved::Primitive(Primitive::Double) => match *value {
                Value::Double(v)     => Ok(Value::Double(v)),
                Value::String(ref s) => parse_double(s).map(Value::Double).ok_or_else(mismatch),
                _ => as_integer(value).map(|v| Value::Double(v as f64)).ok_or_else(mismatch),
            },

            Resolved::Primitive(Primitive::String) => match *value {
                Value::Binary(ref bytes) => String::from_utf8(bytes.clone()).map(Value::String).map_err(|_| mismatch()),
                _ => render(value).map(Value::String).ok_or_else(mismatch),
            },

            Resolved::Primitive(Primitive::Binary) => match *value {
                Value::Binary(ref bytes) => Ok(Value::Binary(bytes.clone())),
                Value::String(ref s)     => Ok(Value::Binary(s.as_bytes().to_vec())),
                _ => Err(mismatch()),
            },

            Resolved::Enum(def) => {
                let prepared = match *value {
                    Value::Enum(ref name, ref member) if *name == def.name && def.code_of(member).is_some() => {
                        Some(value.clone())
                    }
                    Value::String(ref s) => enum_from_text(def, s),
                    // A code no member owned when it was decoded goes back out as is.
                    Value::I32(UNKNOWN_ENUM_CODE) => Some(Value::I32(UNKNOWN_ENUM_CODE)),
                    _ => as_integer(value)
                        .and_then(|code| i32::try_from(code).ok())
                        .and_then(|code| def.member_of(code))
                        .map(|member| Value::Enum(def.name.clone(), member.to_owned())),
                };
                prepared.ok_or_else(mismatch)
            }

            Resolved::Struct(def) => self.prepare_struct(def, value),

            Resolved::List(elem) => match *value {
                Value::List(ref values) | Value::Set(ref values) => Ok(Value::List(
                    values.iter().map(|v| self.prepare(elem, v)).collect::<Result<_, _>>()?,
                )),
                _ => Err(mismatch()),
            },

            Resolved::Set(elem) => match *value {
                Value::List(ref values) | Value::Set(ref values) => {
                    let mut set = Value::Set(Vec::with_capacity(values.len()));
                    for v in values {
                        set.push(self.prepare(elem, v)?);
                    }
                    Ok(set)
                }
                _ => Err(mismatch()),
            },

            Resolved::Map(key_ty, value_ty) => match *value {
                Value::Map(ref entries) => Ok(Value::Map(
                    entries
                        .iter()
                        .map(|(k, v)| -> Result<(Value, Value), CodecError> {
                            Ok((self.prepare(key_ty, k)?, self.prepare(value_ty, v)?))
                        })
                        .collect::<Result<_, _>>()?,
                )),
                _ => Err(mismatch()),
            },
        }
    }

    /// Checks a struct value against `def` and prepares each present field.
    /// The result lists fields in declaration order.
    pub fn prepare_struct(&self, def: &StructDescriptor, value: &Value) -> Result<Value, CodecError> {
        let fields = match *value {
            Value::Struct(ref name, ref fields) if *name == def.name => fields,
            _ => return Err(CodecError::mismatch(&def.name, value.kind_name())),
        };

        if let Some(unknown) = fields.keys().find(|name| def.field_by_name(name).is_none()) {
            return Err(CodecError::UnknownField {
                owner: def.name.clone(),
                field: unknown.clone(),
            });
        }

        let mut prepared = IndexMap::with_capacity(fields.len());
        for field in def.fields.values() {
            if let Some(v) = fields.get(&field.name) {
                prepared.insert(field.name.clone(), self.prepare(&field.type_ref, v)?);
            }
        }
        Ok(Value::Struct(def.name.clone(), prepared))
    }
}
