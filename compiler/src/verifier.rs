use std::collections::HashSet;

use crate::{
    ast::{AstNode, Field},
    error::CompileError,
};

/// Checks that no definition name is used twice across the expanded program.
pub fn verify_definitions<'a>(nodes: impl IntoIterator<Item = &'a AstNode>) -> Result<(), CompileError> {
    let mut defined: HashSet<&str> = HashSet::new();
    for name in nodes.into_iter().filter_map(AstNode::definition_name) {
        if !defined.insert(name) {
            return Err(CompileError::DuplicateType(name.to_owned()));
        }
    }
    Ok(())
}

/// Works out the wire index of every field in a list.
///
/// A field without an explicit index takes its 1-based position in the
/// list. Indices must fit in `i16` and, like names, be unique.
pub fn assign_indices(owner: &str, fields: &[Field]) -> Result<Vec<i16>, CompileError> {
    let mut indices: Vec<i16> = Vec::with_capacity(fields.len());
    let mut names: HashSet<&str> = HashSet::new();

    for (position, field) in fields.iter().enumerate() {
        let wanted = field.index.unwrap_or(position as i64 + 1);
        let index = i16::try_from(wanted).map_err(|_| CompileError::InvalidFieldIndex {
            owner: owner.to_owned(),
            field: field.name.clone(),
            index: wanted,
        })?;
        if indices.contains(&index) {
            return Err(CompileError::DuplicateFieldIndex { owner: owner.to_owned(), index: wanted });
        }
        if !names.insert(&field.name) {
            return Err(CompileError::DuplicateFieldName {
                owner: owner.to_owned(),
                field: field.name.clone(),
            });
        }
        indices.push(index);
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn fields_of(source: &str) -> Vec<Field> {
        match parse(source).unwrap().into_iter().next() {
            Some(AstNode::Struct { fields, .. }) => fields,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn duplicate_types() {
        let nodes = parse("struct A {}\nenum B { X }\nexception A {}").unwrap();
        assert!(matches!(verify_definitions(&nodes), Err(CompileError::DuplicateType(ref n)) if n == "A"));
        let nodes = parse("struct A {}\nenum B { X }").unwrap();
        assert!(verify_definitions(&nodes).is_ok());
    }

    #[test]
    fn implicit_indices() {
        let fields = fields_of("struct S { i32 a, i32 b, 5: i32 c, i32 d }");
        assert_eq!(assign_indices("S", &fields).unwrap(), vec![1, 2, 5, 4]);
    }

    #[test]
    fn implicit_index_collision() {
        let fields = fields_of("struct S { 2: i32 a, i32 b }");
        let err = assign_indices("S", &fields).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateFieldIndex { index: 2, .. }));
        assert_eq!(err.to_string(), "The index 2 is used twice in S");
    }

    #[test]
    fn duplicate_names() {
        let fields = fields_of("struct S { 1: i32 a, 2: string a }");
        assert!(matches!(
            assign_indices("S", &fields),
            Err(CompileError::DuplicateFieldName { ref field, .. }) if field == "a"
        ));
    }

    #[test]
    fn index_range() {
        let fields = fields_of("struct S { 40000: i32 big }");
        assert!(matches!(
            assign_indices("S", &fields),
            Err(CompileError::InvalidFieldIndex { index: 40000, .. })
        ));
        let fields = fields_of("struct S { -1: i32 neg }");
        assert_eq!(assign_indices("S", &fields).unwrap(), vec![-1]);
    }
}
