//! Path arithmetic shared by the asset rewriter, the template helper and
//! the site writer. Nothing here touches the filesystem.

use crate::error::{BuildError, Result};
use crate::types::{PageKind, STATIC_DIR_NAME, STYLES_DIR_NAME};
use std::path::{Component, Path};
use std::str::FromStr;

const PUBLIC_PREFIX: &str = "public";

/// Number of path segments of `file` below `root`, filename included.
pub fn segment_count(file: &Path, root: &Path) -> Result<usize> {
    let relative = file.strip_prefix(root).map_err(|_| {
        BuildError::Other(format!(
            "{} is not inside {}",
            file.display(),
            root.display()
        ))
    })?;

    Ok(relative
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count())
}

/// Nesting level of a content file; 0 for files directly under `root`.
pub fn depth(file: &Path, root: &Path) -> Result<usize> {
    Ok(segment_count(file, root)?.saturating_sub(1))
}

/// Directory segments between `root` and `file`, minus one. Negative for
/// files directly under `root`.
pub fn folders_to_go_up(file: &Path, root: &Path) -> Result<isize> {
    let directories = segment_count(file, root)?.saturating_sub(1) as isize;
    Ok(directories - 1)
}

pub fn relative_prefix(folders_to_go_up: isize) -> String {
    if folders_to_go_up > 0 {
        "../".repeat(folders_to_go_up as usize)
    } else {
        "./".to_string()
    }
}

pub fn output_file_name(path: &Path, kind: PageKind) -> String {
    match kind {
        PageKind::Index => "index.html".to_string(),
        PageKind::Leaf => format!("{}.html", file_stem(path)),
    }
}

/// `<section>/` for an index, the file stem for a leaf.
pub fn page_url(path: &Path, kind: PageKind, section: Option<&str>) -> String {
    match kind {
        PageKind::Index => format!("{}/", section.unwrap_or("")),
        PageKind::Leaf => file_stem(path),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Static,
    Style,
}

impl ResourceKind {
    fn dir_name(self) -> &'static str {
        match self {
            ResourceKind::Static => STATIC_DIR_NAME,
            ResourceKind::Style => STYLES_DIR_NAME,
        }
    }
}

impl FromStr for ResourceKind {
    type Err = BuildError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "static" => Ok(ResourceKind::Static),
            "style" => Ok(ResourceKind::Style),
            other => Err(BuildError::InvalidArgument {
                argument: "resource_kind".to_string(),
                message: format!("must be either static or style, got '{other}'"),
            }),
        }
    }
}

/// Link from a page at `depth` to a file under `public/styles` or `public/static`.
pub fn rel_path(depth: usize, file_path: &str, kind: ResourceKind) -> String {
    format!(
        "{}{}/{}/{}",
        "../".repeat(depth),
        PUBLIC_PREFIX,
        kind.dir_name(),
        file_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_depth() {
        let root = Path::new("content");
        assert_eq!(depth(Path::new("content/about.md"), root).unwrap(), 0);
        assert_eq!(depth(Path::new("content/blog/post.md"), root).unwrap(), 1);
        assert_eq!(depth(Path::new("content/a/b/c.md"), root).unwrap(), 2);
    }

    #[test]
    fn test_depth_outside_root_fails() {
        let error = depth(Path::new("elsewhere/about.md"), Path::new("content")).unwrap_err();
        assert!(matches!(error, BuildError::Other(_)));
    }

    #[test]
    fn test_folders_to_go_up() {
        let root = Path::new("site/content");
        assert_eq!(folders_to_go_up(Path::new("site/content/a.md"), root).unwrap(), -1);
        assert_eq!(folders_to_go_up(Path::new("site/content/blog/a.md"), root).unwrap(), 0);
        assert_eq!(folders_to_go_up(Path::new("site/content/x/y/a.md"), root).unwrap(), 1);
        assert_eq!(folders_to_go_up(Path::new("site/content/x/y/z/a.md"), root).unwrap(), 2);
    }

    #[test]
    fn test_relative_prefix() {
        assert_eq!(relative_prefix(-1), "./");
        assert_eq!(relative_prefix(0), "./");
        assert_eq!(relative_prefix(1), "../");
        assert_eq!(relative_prefix(3), "../../../");
    }

    #[test]
    fn test_output_file_name() {
        let index = PathBuf::from("content/blog/_index.md");
        let leaf = PathBuf::from("content/blog/first-post.md");
        assert_eq!(output_file_name(&index, PageKind::Index), "index.html");
        assert_eq!(output_file_name(&leaf, PageKind::Leaf), "first-post.html");
    }

    #[test]
    fn test_page_url() {
        let index = PathBuf::from("content/blog/_index.md");
        let leaf = PathBuf::from("content/blog/first-post.md");
        assert_eq!(page_url(&index, PageKind::Index, Some("blog")), "blog/");
        assert_eq!(page_url(&index, PageKind::Index, None), "/");
        assert_eq!(page_url(&leaf, PageKind::Leaf, Some("blog")), "first-post");
    }

    #[test]
    fn test_rel_path() {
        assert_eq!(rel_path(0, "main.css", ResourceKind::Style), "public/styles/main.css");
        assert_eq!(
            rel_path(2, "img/logo.png", ResourceKind::Static),
            "../../public/static/img/logo.png"
        );
    }

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!("static".parse::<ResourceKind>().unwrap(), ResourceKind::Static);
        assert_eq!("style".parse::<ResourceKind>().unwrap(), ResourceKind::Style);

        let error = "styles".parse::<ResourceKind>().unwrap_err();
        assert!(matches!(error, BuildError::InvalidArgument { .. }));
        assert!(error.to_string().contains("static or style"));
    }
}
