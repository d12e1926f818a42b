use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::CompileError;

/// A file handed back by an [IncludeResolver].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Identifies the file across includes; two reads of the same file must
    /// return the same path.
    pub path: PathBuf,
    pub text: String,
}

/// Looks up the files named by `include` lines.
pub trait IncludeResolver {
    fn read(&mut self, path: &str) -> Result<Source, CompileError>;
}

/// Reads includes from disk.
///
/// A relative include is tried against the configured directories, then the
/// working directory, then the directory of every file read so far, in that
/// order.
#[derive(Debug, Clone)]
pub struct FsIncludeResolver {
    search_dirs: Vec<PathBuf>,
}

impl FsIncludeResolver {
    pub fn new(include_dirs: Vec<PathBuf>) -> FsIncludeResolver {
        let mut resolver = FsIncludeResolver { search_dirs: Vec::new() };
        for dir in include_dirs {
            resolver.add_search_dir(dir);
        }
        resolver.add_search_dir(PathBuf::from("."));
        resolver
    }

    pub fn add_search_dir(&mut self, dir: impl Into<PathBuf>) {
        let mut dir = dir.into();
        if dir.as_os_str().is_empty() {
            dir = PathBuf::from(".");
        }
        if !self.search_dirs.contains(&dir) {
            self.search_dirs.push(dir);
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(requested))
            .find(|candidate| candidate.is_file())
    }
}

impl Default for FsIncludeResolver {
    fn default() -> Self {
        FsIncludeResolver::new(Vec::new())
    }
}

impl IncludeResolver for FsIncludeResolver {
    fn read(&mut self, path: &str) -> Result<Source, CompileError> {
        let found = self
            .locate(path)
            .ok_or_else(|| CompileError::IncludeNotFound(path.to_owned()))?;
        let text = fs::read_to_string(&found)?;
        let found = fs::canonicalize(&found).unwrap_or(found);
        debug!(include = path, path = %found.display(), "read include");
        if let Some(dir) = found.parent() {
            self.add_search_dir(dir);
        }
        Ok(Source { path: found, text })
    }
}

/// Serves includes from a map of path to text.
#[derive(Debug, Clone, Default)]
pub struct MemoryIncludeResolver {
    files: HashMap<PathBuf, String>,
}

impl MemoryIncludeResolver {
    pub fn new() -> MemoryIncludeResolver {
        MemoryIncludeResolver::default()
    }

    pub fn with_file(mut self, path: &str, text: &str) -> MemoryIncludeResolver {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: &str, text: &str) {
        self.files.insert(PathBuf::from(path), text.to_owned());
    }
}

impl IncludeResolver for MemoryIncludeResolver {
    fn read(&mut self, path: &str) -> Result<Source, CompileError> {
        let key = PathBuf::from(path);
        match self.files.get(&key) {
            Some(text) => Ok(Source { path: key, text: text.clone() }),
            None => Err(CompileError::IncludeNotFound(path.to_owned())),
        }
    }
}
