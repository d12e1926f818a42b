use crate::{
    ast::{AstNode, EnumMember, Field, Function},
    error::ParseError,
    lexer::{
        line_column, parse_int, scan, scan_keyword, scan_literal, BLOCK_COMMENT, DUB_CONSTANT,
        HEX_CONSTANT, IDENTIFIER, INT_CONSTANT, LINE_COMMENT, WHITESPACE,
    },
    packrat::{apply, Memo, Packrat},
    utils::quote,
};
use brine_thrift_schema::{ConstValue, Primitive, Requiredness, StructKind, TypeRef};

/// Parses IDL source text into its top-level nodes.
pub fn parse(source: &str) -> Result<Vec<AstNode>, ParseError> {
    Parser::new(source).parse()
}

/// A backtracking parser over IDL source.
///
/// Every token rule skips leading whitespace and comments first. Only the
/// top level turns comments into [AstNode::Comment] nodes; inside a
/// definition they are skipped. The list rules are left-recursive and go
/// through [apply].
pub struct Parser<'a> {
    source:   &'a str,
    pos:      usize,
    memo:     Memo,
    furthest: usize,
    expected: Vec<String>,
}

impl Packrat for Parser<'_> {
    fn memo(&mut self) -> &mut Memo {
        &mut self.memo
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            source,
            pos:      0,
            memo:     Memo::new(),
            furthest: 0,
            expected: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.source.len() {
                return Ok(nodes);
            }
            if let Some(text) = self.comment() {
                nodes.push(AstNode::Comment { text });
                continue;
            }
            match self.element() {
                Some(node) => nodes.push(node),
                None => return Err(self.error()),
            }
        }
    }

    fn error(&self) -> ParseError {
        let (line, column) = line_column(self.source, self.furthest);
        let found = match self.source[self.furthest..].chars().next() {
            Some(c) => quote(&c.to_string()),
            None => "end of input".to_owned(),
        };
        let expected = if self.expected.is_empty() {
            "definition".to_owned()
        } else {
            self.expected.join(" or ")
        };
        ParseError { line, column, expected, found }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn fail<T>(&mut self, expected: String) -> Option<T> {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest && !self.expected.contains(&expected) {
            self.expected.push(expected);
        }
        None
    }

    /// Runs `rule`, rewinding to the starting position if it fails.
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = rule(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    // Tokens

    fn skip_whitespace(&mut self) {
        if let Some(ws) = scan(&WHITESPACE, self.rest()) {
            self.pos += ws.len();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            match scan(&BLOCK_COMMENT, rest).or_else(|| scan(&LINE_COMMENT, rest)) {
                Some(comment) => self.pos += comment.len(),
                None => break,
            }
        }
    }

    fn comment(&mut self) -> Option<String> {
        let rest = self.rest();
        let caps = BLOCK_COMMENT.captures(rest).or_else(|| LINE_COMMENT.captures(rest))?;
        self.pos += caps[0].len();
        Some(caps[1].trim().to_owned())
    }

    fn keyword(&mut self, word: &'static str) -> Option<()> {
        self.skip_trivia();
        if scan_keyword(word, self.rest()) {
            self.pos += word.len();
            Some(())
        } else {
            self.fail(quote(word))
        }
    }

    fn symbol(&mut self, symbol: &'static str) -> Option<()> {
        self.skip_trivia();
        if self.rest().starts_with(symbol) {
            self.pos += symbol.len();
            Some(())
        } else {
            self.fail(quote(symbol))
        }
    }

    fn identifier(&mut self) -> Option<String> {
        self.skip_trivia();
        match scan(&IDENTIFIER, self.rest()) {
            Some(name) => {
                self.pos += name.len();
                Some(name.to_owned())
            }
            None => self.fail("identifier".to_owned()),
        }
    }

    /// An integer in decimal or hex, or `true` / `false` as 1 / 0.
    fn int_constant(&mut self) -> Option<i64> {
        self.skip_trivia();
        let rest = self.rest();
        let text = scan(&HEX_CONSTANT, rest).or_else(|| scan(&INT_CONSTANT, rest));
        match text.and_then(|text| parse_int(text).map(|value| (text.len(), value))) {
            Some((len, value)) => {
                self.pos += len;
                Some(value)
            }
            None => self
                .attempt(|p| p.keyword("true").map(|_| 1))
                .or_else(|| self.attempt(|p| p.keyword("false").map(|_| 0)))
                .or_else(|| self.fail("integer".to_owned())),
        }
    }

    fn double_constant(&mut self) -> Option<f64> {
        self.skip_trivia();
        let parsed = scan(&DUB_CONSTANT, self.rest())
            .and_then(|text| text.parse::<f64>().ok().map(|value| (text.len(), value)));
        match parsed {
            Some((len, value)) => {
                self.pos += len;
                Some(value)
            }
            None => self.fail("double".to_owned()),
        }
    }

    fn literal(&mut self) -> Option<String> {
        self.skip_trivia();
        match scan_literal(self.rest()) {
            Some((text, len)) => {
                self.pos += len;
                Some(text)
            }
            None => self.fail("string literal".to_owned()),
        }
    }

    fn separator(&mut self) {
        if self.attempt(|p| p.symbol(",")).is_none() {
            self.attempt(|p| p.symbol(";"));
        }
    }

    /// `(key = "value", ...)`, accepted and dropped.
    fn annotations(&mut self) {
        self.attempt(|p| {
            p.symbol("(")?;
            while p
                .attempt(|p| {
                    p.identifier()?;
                    p.symbol("=")?;
                    p.literal()?;
                    p.separator();
                    Some(())
                })
                .is_some()
            {}
            p.symbol(")")
        });
    }

    // Top level

    fn element(&mut self) -> Option<AstNode> {
        self.attempt(Self::include)
            .or_else(|| self.attempt(Self::namespace))
            .or_else(|| self.attempt(Self::const_definition))
            .or_else(|| self.attempt(Self::typedef))
            .or_else(|| self.attempt(Self::enum_definition))
            .or_else(|| self.attempt(Self::senum))
            .or_else(|| self.attempt(Self::struct_definition))
            .or_else(|| self.attempt(Self::exception))
            .or_else(|| self.attempt(Self::service))
    }

    fn include(&mut self) -> Option<AstNode> {
        self.keyword("include")?;
        let path = self.literal()?;
        Some(AstNode::Include { path })
    }

    fn namespace(&mut self) -> Option<AstNode> {
        self.keyword("namespace")?;
        let lang = match self.attempt(|p| p.symbol("*")) {
            Some(()) => None,
            None => Some(self.identifier()?),
        };
        let name = self.identifier()?;
        Some(AstNode::Namespace { lang, name })
    }

    fn const_definition(&mut self) -> Option<AstNode> {
        self.keyword("const")?;
        let const_type = self.field_type()?;
        let name = self.identifier()?;
        self.symbol("=")?;
        let value = self.const_value()?;
        self.separator();
        Some(AstNode::Const { name, const_type, value })
    }

    fn typedef(&mut self) -> Option<AstNode> {
        self.keyword("typedef")?;
        let target = self.field_type()?;
        let name = self.identifier()?;
        self.annotations();
        self.separator();
        Some(AstNode::Typedef { name, target })
    }

    fn enum_definition(&mut self) -> Option<AstNode> {
        self.keyword("enum")?;
        let name = self.identifier()?;
        self.symbol("{")?;
        let members = self.enum_def_list().unwrap_or_default();
        self.symbol("}")?;
        self.annotations();
        Some(AstNode::Enum { name, members })
    }

    fn enum_def_list(&mut self) -> Option<Vec<EnumMember>> {
        apply(self, "EnumDefList", Self::enum_def_list_body)
    }

    fn enum_def_list_body(&mut self) -> Option<Vec<EnumMember>> {
        let grown = self.attempt(|p| {
            let mut members = p.enum_def_list()?;
            members.push(p.enum_member()?);
            Some(members)
        });
        grown.or_else(|| self.enum_member().map(|member| vec![member]))
    }

    fn enum_member(&mut self) -> Option<EnumMember> {
        let name = self.identifier()?;
        let value = self.attempt(|p| {
            p.symbol("=")?;
            p.int_constant()
        });
        self.annotations();
        self.separator();
        Some(EnumMember { name, value })
    }

    fn senum(&mut self) -> Option<AstNode> {
        self.keyword("senum")?;
        let name = self.identifier()?;
        self.symbol("{")?;
        let values = self.senum_def_list().unwrap_or_default();
        self.symbol("}")?;
        Some(AstNode::Senum { name, values })
    }

    fn senum_def_list(&mut self) -> Option<Vec<String>> {
        apply(self, "SenumDefList", Self::senum_def_list_body)
    }

    fn senum_def_list_body(&mut self) -> Option<Vec<String>> {
        let grown = self.attempt(|p| {
            let mut values = p.senum_def_list()?;
            values.push(p.literal()?);
            p.separator();
            Some(values)
        });
        grown.or_else(|| Some(Vec::new()))
    }

    fn struct_definition(&mut self) -> Option<AstNode> {
        let kind = match self.attempt(|p| p.keyword("struct")) {
            Some(()) => StructKind::Struct,
            None => {
                self.keyword("union")?;
                StructKind::Union
            }
        };
        let name = self.identifier()?;
        self.attempt(|p| p.keyword("xsd_all"));
        self.symbol("{")?;
        let fields = self.field_list().unwrap_or_default();
        self.symbol("}")?;
        self.annotations();
        Some(AstNode::Struct { kind, name, fields })
    }

    fn exception(&mut self) -> Option<AstNode> {
        self.keyword("exception")?;
        let name = self.identifier()?;
        self.symbol("{")?;
        let fields = self.field_list().unwrap_or_default();
        self.symbol("}")?;
        self.annotations();
        Some(AstNode::Exception { name, fields })
    }

    fn service(&mut self) -> Option<AstNode> {
        self.keyword("service")?;
        let name = self.identifier()?;
        let extends = self.attempt(|p| {
            p.keyword("extends")?;
            p.identifier()
        });
        self.symbol("{")?;
        let functions = self.function_list().unwrap_or_default();
        self.symbol("}")?;
        self.annotations();
        Some(AstNode::Service { name, extends, functions })
    }

    // Services

    fn function_list(&mut self) -> Option<Vec<Function>> {
        apply(self, "FunctionList", Self::function_list_body)
    }

    fn function_list_body(&mut self) -> Option<Vec<Function>> {
        let grown = self.attempt(|p| {
            let mut functions = p.function_list()?;
            functions.push(p.function()?);
            Some(functions)
        });
        grown.or_else(|| self.function().map(|function| vec![function]))
    }

    fn function(&mut self) -> Option<Function> {
        let oneway = self
            .attempt(|p| p.keyword("oneway"))
            .or_else(|| self.attempt(|p| p.keyword("async")))
            .is_some();
        let return_type = match self.attempt(|p| p.keyword("void")) {
            Some(()) => None,
            None => Some(self.field_type()?),
        };
        let name = self.identifier()?;
        self.symbol("(")?;
        let arguments = self.field_list().unwrap_or_default();
        self.symbol(")")?;
        let throws = self
            .attempt(|p| {
                p.keyword("throws")?;
                p.symbol("(")?;
                let throws = p.field_list().unwrap_or_default();
                p.symbol(")")?;
                Some(throws)
            })
            .unwrap_or_default();
        self.annotations();
        self.separator();
        Some(Function { name, return_type, arguments, throws, oneway })
    }

    // Fields

    fn field_list(&mut self) -> Option<Vec<Field>> {
        apply(self, "FieldList", Self::field_list_body)
    }

    fn field_list_body(&mut self) -> Option<Vec<Field>> {
        let grown = self.attempt(|p| {
            let mut fields = p.field_list()?;
            fields.push(p.field()?);
            Some(fields)
        });
        grown.or_else(|| self.field().map(|field| vec![field]))
    }

    fn field(&mut self) -> Option<Field> {
        let index = self.attempt(|p| {
            let index = p.int_constant()?;
            p.symbol(":")?;
            Some(index)
        });
        let requiredness = self
            .attempt(|p| p.keyword("required").map(|_| Requiredness::Required))
            .or_else(|| self.attempt(|p| p.keyword("optional").map(|_| Requiredness::Optional)));
        let field_type = self.field_type()?;
        let name = self.identifier()?;
        let default = self.attempt(|p| {
            p.symbol("=")?;
            p.const_value()
        });
        self.annotations();
        self.separator();
        Some(Field { index, requiredness, field_type, name, default })
    }

    fn field_type(&mut self) -> Option<TypeRef> {
        let field_type = match self.attempt(Self::container_type) {
            Some(container) => container,
            None => {
                let name = self.identifier()?;
                match Primitive::from_keyword(&name) {
                    Some(primitive) => TypeRef::Primitive(primitive),
                    None => TypeRef::Named(name),
                }
            }
        };
        self.annotations();
        Some(field_type)
    }

    fn container_type(&mut self) -> Option<TypeRef> {
        self.attempt(|p| {
            p.keyword("map")?;
            p.cpp_type();
            p.symbol("<")?;
            let key = p.field_type()?;
            p.symbol(",")?;
            let value = p.field_type()?;
            p.symbol(">")?;
            Some(TypeRef::Map(Box::new(key), Box::new(value)))
        })
        .or_else(|| {
            self.attempt(|p| {
                p.keyword("set")?;
                p.cpp_type();
                p.symbol("<")?;
                let elem = p.field_type()?;
                p.symbol(">")?;
                Some(TypeRef::Set(Box::new(elem)))
            })
        })
        .or_else(|| {
            self.attempt(|p| {
                p.keyword("list")?;
                p.symbol("<")?;
                let elem = p.field_type()?;
                p.symbol(">")?;
                p.cpp_type();
                Some(TypeRef::List(Box::new(elem)))
            })
        })
    }

    fn cpp_type(&mut self) {
        self.attempt(|p| {
            p.keyword("cpp_type")?;
            p.literal()
        });
    }

    // Constants

    fn const_value(&mut self) -> Option<ConstValue> {
        self.attempt(|p| p.double_constant().map(ConstValue::Double))
            .or_else(|| self.attempt(|p| p.int_constant().map(ConstValue::Int)))
            .or_else(|| self.attempt(|p| p.literal().map(ConstValue::String)))
            .or_else(|| self.attempt(|p| p.identifier().map(ConstValue::Identifier)))
            .or_else(|| self.attempt(Self::const_list))
            .or_else(|| self.attempt(Self::const_map))
    }

    fn const_list(&mut self) -> Option<ConstValue> {
        self.symbol("[")?;
        let mut values = Vec::new();
        while let Some(value) = self.attempt(Self::const_value) {
            values.push(value);
            self.separator();
        }
        self.symbol("]")?;
        Some(ConstValue::List(values))
    }

    fn const_map(&mut self) -> Option<ConstValue> {
        self.symbol("{")?;
        let mut entries = Vec::new();
        while let Some(entry) = self.attempt(|p| {
            let key = p.const_value()?;
            p.symbol(":")?;
            let value = p.const_value()?;
            p.separator();
            Some((key, value))
        }) {
            entries.push(entry);
        }
        self.symbol("}")?;
        Some(ConstValue::Map(entries))
    }
}
