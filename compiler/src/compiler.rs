use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use brine_thrift_schema::{
    ConstDescriptor, EnumDescriptor, FieldDescriptor, FunctionDescriptor, Primitive, Schema,
    ServiceDescriptor, StructDescriptor, StructKind, TypeRef,
};

use crate::{
    ast::{AstNode, Field, Function},
    config::CompilerConfig,
    error::CompileError,
    include::{FsIncludeResolver, IncludeResolver},
    parser::parse,
    utils::{last_segment, namespace_segments},
    verifier::{assign_indices, verify_definitions},
};

/// Compiles parsed source with the default configuration.
pub fn compile(ast: Vec<AstNode>, resolver: &mut dyn IncludeResolver) -> Result<Schema, CompileError> {
    compile_with(ast, resolver, &CompilerConfig::default())
}

/// Compiles parsed source, pulling `include`d files through `resolver`.
pub fn compile_with(
    ast: Vec<AstNode>,
    resolver: &mut dyn IncludeResolver,
    config: &CompilerConfig,
) -> Result<Schema, CompileError> {
    build(None, ast, resolver, config)
}

/// Parses and compiles source text. Includes are looked up on disk.
pub fn compile_str(text: &str) -> Result<Schema, CompileError> {
    let ast = parse(text).map_err(|source| CompileError::Parse {
        path: PathBuf::from("<input>"),
        source,
    })?;
    let config = CompilerConfig::default();
    let mut resolver = FsIncludeResolver::new(config.include_dirs.clone());
    compile_with(ast, &mut resolver, &config)
}

pub fn compile_file(path: impl AsRef<Path>) -> Result<Schema, CompileError> {
    compile_file_with(path, &CompilerConfig::default())
}

/// Compiles the file at `path`. Any error names the file it arose in.
pub fn compile_file_with(path: impl AsRef<Path>, config: &CompilerConfig) -> Result<Schema, CompileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CompileError::from(e).in_file(path))?;
    let ast = parse(&text).map_err(|source| CompileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let root = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut resolver = FsIncludeResolver::new(config.include_dirs.clone());
    if let Some(dir) = root.parent() {
        resolver.add_search_dir(dir);
    }
    build(Some(root), ast, &mut resolver, config).map_err(|e| e.in_file(path))
}

fn build(
    root: Option<PathBuf>,
    ast: Vec<AstNode>,
    resolver: &mut dyn IncludeResolver,
    config: &CompilerConfig,
) -> Result<Schema, CompileError> {
    let mut expander = Expander {
        resolver,
        stack: Vec::new(),
        expanded: HashSet::new(),
        root_depth: 0,
    };
    if let Some(root) = root {
        expander.expanded.insert(root.clone());
        expander.stack.push(root);
        expander.root_depth = 1;
    }
    let mut nodes = Vec::with_capacity(ast.len());
    expander.expand(ast, &mut nodes)?;

    verify_definitions(nodes.iter().map(|located| &located.node))?;

    let mut builder = SchemaBuilder { config, schema: Schema::new() };
    for Located { origin, node } in nodes {
        builder.add(node).map_err(|e| match origin {
            Some(ref path) => e.in_file(path),
            None => e,
        })?;
    }
    Ok(builder.schema)
}

/// A node and the included file it came from. Nodes of the file being
/// compiled have no origin.
struct Located {
    origin: Option<PathBuf>,
    node:   AstNode,
}

/// Splices included files into the node list, depth first.
struct Expander<'r> {
    resolver:   &'r mut dyn IncludeResolver,
    /// Files whose expansion is in progress.
    stack:      Vec<PathBuf>,
    /// Files already spliced in once.
    expanded:   HashSet<PathBuf>,
    root_depth: usize,
}

impl Expander<'_> {
    fn expand(&mut self, nodes: Vec<AstNode>, out: &mut Vec<Located>) -> Result<(), CompileError> {
        let origin = if self.stack.len() > self.root_depth { self.stack.last().cloned() } else { None };
        for node in nodes {
            match node {
                AstNode::Include { path } => self.include(&path, out)?,
                node => out.push(Located { origin: origin.clone(), node }),
            }
        }
        Ok(())
    }

    fn include(&mut self, path: &str, out: &mut Vec<Located>) -> Result<(), CompileError> {
        let source = self.resolver.read(path)?;

        if self.stack.contains(&source.path) {
            let mut chain = self.stack.clone();
            chain.push(source.path);
            return Err(CompileError::IncludeCycle(chain));
        }
        if !self.expanded.insert(source.path.clone()) {
            debug!(path = %source.path.display(), "include already expanded, skipping");
            return Ok(());
        }

        debug!(path = %source.path.display(), "expanding include");
        let nodes = parse(&source.text).map_err(|e| CompileError::Parse {
            path:   source.path.clone(),
            source: e,
        })?;

        self.stack.push(source.path.clone());
        let result = self.expand(nodes, out).map_err(|e| e.in_file(&source.path));
        self.stack.pop();
        result
    }
}

/// Registers definitions in order. A name resolves only against what has
/// been registered before it, plus the definition being built.
struct SchemaBuilder<'c> {
    config: &'c CompilerConfig,
    schema: Schema,
}

impl SchemaBuilder<'_> {
    fn add(&mut self, node: AstNode) -> Result<(), CompileError> {
        match node {
            AstNode::Comment { .. } | AstNode::Include { .. } => {}

            AstNode::Namespace { lang, name } => match lang {
                Some(lang) if lang != self.config.namespace_lang => {
                    debug!(lang = %lang, namespace = %name, "ignoring namespace for another language");
                }
                _ => self.schema.namespace = namespace_segments(&name),
            },

            AstNode::Const { name, const_type, value } => {
                let type_ref = self.resolve(&const_type)?;
                self.schema.constants.insert(name, ConstDescriptor { type_ref, value });
            }

            AstNode::Typedef { name, target } => {
                let target = self.resolve(&target)?;
                self.schema.typedefs.insert(name, target);
            }

            AstNode::Enum { name, members } => {
                for (code, member) in members.iter().enumerate() {
                    if let Some(literal) = member.value {
                        if literal != code as i64 {
                            debug!(
                                enum_name = %name,
                                member = %member.name,
                                literal,
                                code,
                                "ignoring explicit enum value, members are numbered by position"
                            );
                        }
                    }
                }
                let members = members.into_iter().map(|m| m.name).collect();
                self.schema.enums.insert(name.clone(), EnumDescriptor::new(&name, members));
            }

            AstNode::Senum { name, .. } => {
                self.schema.typedefs.insert(name, TypeRef::Primitive(Primitive::String));
            }

            AstNode::Struct { kind, name, fields } => {
                self.schema
                    .structs
                    .insert(name.clone(), StructDescriptor::new(&name, kind, Vec::new()));
                let fields = self.fields(&name, fields)?;
                self.schema.structs.insert(name.clone(), StructDescriptor::new(&name, kind, fields));
            }

            AstNode::Exception { name, fields } => {
                let kind = StructKind::Exception;
                self.schema
                    .exceptions
                    .insert(name.clone(), StructDescriptor::new(&name, kind, Vec::new()));
                let fields = self.fields(&name, fields)?;
                self.schema.exceptions.insert(name.clone(), StructDescriptor::new(&name, kind, fields));
            }

            AstNode::Service { name, extends, functions } => {
                let functions = functions
                    .into_iter()
                    .map(|function| self.function(&name, function))
                    .collect::<Result<Vec<_>, _>>()?;
                self.schema.services.push(ServiceDescriptor { name, extends, functions });
            }
        }
        Ok(())
    }

    fn function(&self, service: &str, function: Function) -> Result<FunctionDescriptor, CompileError> {
        let owner = format!("{}.{}", service, function.name);
        let return_type = match function.return_type {
            Some(ref ty) => Some(self.resolve(ty)?),
            None => None,
        };
        let arguments = self.fields(&owner, function.arguments)?;
        let throws = self.fields(&format!("{} throws", owner), function.throws)?;
        Ok(FunctionDescriptor {
            name: function.name,
            return_type,
            arguments,
            throws,
            oneway: function.oneway,
        })
    }

    fn fields(&self, owner: &str, fields: Vec<Field>) -> Result<Vec<FieldDescriptor>, CompileError> {
        let indices = assign_indices(owner, &fields)?;
        fields
            .into_iter()
            .zip(indices)
            .map(|(field, index)| {
                Ok(FieldDescriptor {
                    index,
                    type_ref: self.resolve(&field.field_type)?,
                    name: field.name,
                    default: field.default,
                    requiredness: field.requiredness,
                })
            })
            .collect()
    }

    fn resolve(&self, type_ref: &TypeRef) -> Result<TypeRef, CompileError> {
        Ok(match type_ref {
            TypeRef::Primitive(p) => TypeRef::Primitive(*p),
            TypeRef::Named(name) => self.resolve_name(name)?,
            TypeRef::List(elem) => TypeRef::List(Box::new(self.resolve(elem)?)),
            TypeRef::Set(elem) => TypeRef::Set(Box::new(self.resolve(elem)?)),
            TypeRef::Map(key, value) => {
                TypeRef::Map(Box::new(self.resolve(key)?), Box::new(self.resolve(value)?))
            }
        })
    }

    /// Typedefs are replaced by their target; `shared.Thing` falls back to
    /// `Thing`.
    fn resolve_name(&self, name: &str) -> Result<TypeRef, CompileError> {
        let lookup = |name: &str| -> Option<TypeRef> {
            if let Some(target) = self.schema.typedefs.get(name) {
                return Some(target.clone());
            }
            self.schema.lookup(name).map(|_| TypeRef::Named(name.to_owned()))
        };
        lookup(name)
            .or_else(|| if name.contains('.') { lookup(last_segment(name)) } else { None })
            .ok_or_else(|| CompileError::UnknownType(name.to_owned()))
    }
}
