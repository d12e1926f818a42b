use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {line}, column {column}: expected {expected}, found {found}")]
pub struct ParseError {
    pub line:     usize,
    pub column:   usize,
    pub expected: String,
    pub found:    String,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", .path.display())]
    Parse {
        path:   PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Unknown type <{0}>")]
    UnknownType(String),

    #[error("Include not found: {0}")]
    IncludeNotFound(String),

    #[error("Include cycle: {}", display_chain(.0))]
    IncludeCycle(Vec<PathBuf>),

    #[error("The type {0} is defined twice")]
    DuplicateType(String),

    #[error("The index {index} is used twice in {owner}")]
    DuplicateFieldIndex { owner: String, index: i64 },

    #[error("The field {field} is defined twice in {owner}")]
    DuplicateFieldName { owner: String, field: String },

    #[error("The index of field {field} in {owner} does not fit in i16: {index}")]
    InvalidFieldIndex { owner: String, field: String, index: i64 },

    #[error("In {}: {source}", .path.display())]
    InFile {
        path:   PathBuf,
        #[source]
        source: Box<CompileError>,
    },
}

fn display_chain(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl CompileError {
    /// Attaches the file being compiled, unless the error already names one.
    pub fn in_file(self, path: &std::path::Path) -> CompileError {
        match self {
            CompileError::Parse { .. } | CompileError::InFile { .. } => self,
            other => CompileError::InFile {
                path:   path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with file context peeled off.
    pub fn root(&self) -> &CompileError {
        match self {
            CompileError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}
