use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(
        "Content and Templates directories cannot be empty: {content_dir}, {template_dir}"
    )]
    EmptyContentOrTemplates {
        content_dir: PathBuf,
        template_dir: PathBuf,
    },

    #[error("Frontmatter of {path} malformed: {reason}")]
    MalformedFrontmatter { path: PathBuf, reason: String },

    #[error("Template {name} not found")]
    TemplateMissing { name: String },

    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error while {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk error in {path}: {message}")]
    WalkDir { path: PathBuf, message: String },

    #[error("Not a resma project: {path}")]
    NotAProject { path: PathBuf },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

impl BuildError {
    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedFrontmatter {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

pub trait IoContext<T> {
    fn io_context(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| BuildError::Io {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}
