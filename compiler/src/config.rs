use std::path::PathBuf;

/// Namespace language tag selected when none is configured.
pub const DEFAULT_NAMESPACE_LANG: &str = "rs";

/// Settings for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Searched for `include` targets before the working directory.
    pub include_dirs:   Vec<PathBuf>,
    /// `namespace <lang> ...` lines with this tag (or `*`) set the schema
    /// namespace; all others are ignored.
    pub namespace_lang: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            include_dirs:   Vec::new(),
            namespace_lang: DEFAULT_NAMESPACE_LANG.to_owned(),
        }
    }
}

impl CompilerConfig {
    pub fn new() -> CompilerConfig {
        CompilerConfig::default()
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> CompilerConfig {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn namespace_lang(mut self, lang: &str) -> CompilerConfig {
        self.namespace_lang = lang.to_owned();
        self
    }
}
