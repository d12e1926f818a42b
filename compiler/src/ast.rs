use brine_thrift_schema::{ConstValue, Requiredness, StructKind, TypeRef};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub index:        Option<i64>,
    pub requiredness: Option<Requiredness>,
    pub field_type:   TypeRef,
    pub name:         String,
    pub default:      Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name:        String,
    pub return_type: Option<TypeRef>,
    pub arguments:   Vec<Field>,
    pub throws:      Vec<Field>,
    pub oneway:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name:  String,
    pub value: Option<i64>,
}

/// One top-level element of a source file, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum AstNode {
    Comment   { text: String },
    Namespace { lang: Option<String>, name: String },
    Include   { path: String },
    Const     { name: String, const_type: TypeRef, value: ConstValue },
    Typedef   { name: String, target: TypeRef },
    Enum      { name: String, members: Vec<EnumMember> },
    Senum     { name: String, values: Vec<String> },
    Struct    { kind: StructKind, name: String, fields: Vec<Field> },
    Exception { name: String, fields: Vec<Field> },
    Service   { name: String, extends: Option<String>, functions: Vec<Function> },
}

impl AstNode {
    /// The name a definition registers, if this node is one.
    pub fn definition_name(&self) -> Option<&str> {
        match self {
            AstNode::Const { name, .. }
            | AstNode::Typedef { name, .. }
            | AstNode::Enum { name, .. }
            | AstNode::Senum { name, .. }
            | AstNode::Struct { name, .. }
            | AstNode::Exception { name, .. }
            | AstNode::Service { name, .. } => Some(name),
            _ => None,
        }
    }
}
