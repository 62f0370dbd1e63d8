use crate::error::{BuildError, IoContext, Result};
use crate::paths::{folders_to_go_up, relative_prefix};
use regex::Regex;
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

static IMAGE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]*)\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenBody {
    pub body: String,
    pub copied: usize,
}

/// Copies the local images a page references into the static output
/// directory and points the references at the copies.
pub struct AssetRewriter<'a> {
    content_dir: &'a Path,
    static_output_dir: &'a Path,
}

impl<'a> AssetRewriter<'a> {
    pub fn new(content_dir: &'a Path, static_output_dir: &'a Path) -> Self {
        Self {
            content_dir,
            static_output_dir,
        }
    }

    /// Rewrites every `![alt](path)` in `body`. Remote references and
    /// references to files that do not exist are left as they are.
    pub fn rewrite(&self, file: &Path, body: &str) -> Result<RewrittenBody> {
        let prefix = relative_prefix(folders_to_go_up(file, self.content_dir)?);
        let static_dir_name = self
            .static_output_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                BuildError::Other(format!(
                    "static output directory has no name: {}",
                    self.static_output_dir.display()
                ))
            })?;

        let mut rewritten = body.to_string();
        let mut copied = 0;
        let mut cursor = 0;

        for reference in image_references(body) {
            if reference.contains("http") {
                continue;
            }

            let source = self.resolve(file, &reference);
            let Some(file_name) = source.file_name().filter(|_| source.is_file()) else {
                debug!(
                    "Skipping missing image {} referenced from {}",
                    source.display(),
                    file.display()
                );
                continue;
            };

            fs::create_dir_all(self.static_output_dir)
                .io_context("creating directory", self.static_output_dir)?;
            let destination = self.static_output_dir.join(file_name);
            copy_with_metadata(&source, &destination)?;
            copied += 1;
            debug!("Copied {} to {}", source.display(), destination.display());

            let new_path = format!(
                "{prefix}{static_dir_name}/{}",
                file_name.to_string_lossy()
            );
            if let Some(offset) = rewritten[cursor..].find(reference.as_str()) {
                let start = cursor + offset;
                rewritten.replace_range(start..start + reference.len(), &new_path);
                cursor = start + new_path.len();
            }
        }

        Ok(RewrittenBody {
            body: rewritten,
            copied,
        })
    }

    fn resolve(&self, file: &Path, reference: &str) -> PathBuf {
        match file.parent() {
            Some(parent) if parent != self.content_dir => parent.join(reference),
            _ => self.content_dir.join(reference),
        }
    }
}

/// Paths of the image references in `body`, in order of appearance.
pub fn image_references(body: &str) -> Vec<String> {
    IMAGE_REFERENCE
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|target| reference_path(target.as_str()))
        .filter(|path| !path.is_empty())
        .collect()
}

// `![alt](<a b.png> "title")` and `![alt](a.png "title")` both name a path
// before the optional title.
fn reference_path(target: &str) -> String {
    let target = target.trim();

    if let Some(inner) = target.strip_prefix('<')
        && let Some(end) = inner.find('>')
    {
        return inner[..end].to_string();
    }

    target
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

/// Copies contents, permissions and access/modification times.
pub fn copy_with_metadata(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination).io_context("copying", source)?;

    let metadata = fs::metadata(source).io_context("reading metadata of", source)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    fs::OpenOptions::new()
        .write(true)
        .open(destination)
        .and_then(|file| file.set_times(times))
        .io_context("setting file times on", destination)?;

    Ok(())
}

/// Mirrors `source` into `destination`, returning the number of files copied.
/// A missing `source` copies nothing.
pub fn copy_dir_all(source: &Path, destination: &Path) -> Result<usize> {
    if !source.is_dir() {
        debug!("Nothing to copy from {}", source.display());
        return Ok(0);
    }

    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|error| BuildError::WalkDir {
            path: source.to_path_buf(),
            message: error.to_string(),
        })?;

        let path = entry.path();
        let relative = path.strip_prefix(source).map_err(|_| {
            BuildError::Other(format!("{} escaped {}", path.display(), source.display()))
        })?;
        let dest = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).io_context("creating directory", &dest)?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).io_context("creating directory", parent)?;
        }
        copy_with_metadata(path, &dest)?;
        copied += 1;
    }

    Ok(copied)
}
