use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CONTENT_EXTENSION: &str = "md";
pub const INDEX_FILE_NAME: &str = "_index.md";
pub const STATIC_DIR_NAME: &str = "static";
pub const STYLES_DIR_NAME: &str = "styles";

/// Keys computed at context-build time. Frontmatter values under these
/// names are shadowed by the computed ones.
const COMPUTED_KEYS: [&str; 4] = ["content", "depth", "url", "pages"];

/// The five roots a build reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub content_dir: PathBuf,
    pub template_dir: PathBuf,
    pub styles_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl SitePaths {
    /// Conventional layout of a project created by `resma start`.
    pub fn for_project(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            content_dir: root.join("content"),
            template_dir: root.join("templates"),
            styles_dir: root.join(STYLES_DIR_NAME),
            static_dir: root.join(STATIC_DIR_NAME),
            output_dir: root.join("public"),
        }
    }

    pub fn with_output(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Where copied images land.
    pub fn static_output_dir(&self) -> PathBuf {
        self.output_dir.join(STATIC_DIR_NAME)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages_written: usize,
    pub assets_copied: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub raw: Map<String, Value>,
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Output naming is decided once, when the walker classifies a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Leaf,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub index: Option<PathBuf>,
    pub pages: Vec<PathBuf>,
}

/// A top-level entry of the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEntry {
    LeafPage(PathBuf),
    SectionIndex(PathBuf),
    Section(Section),
}

/// Everything a template sees as `page`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub template: String,
    pub title: String,
    pub frontmatter: Frontmatter,
    pub content: String,
    pub depth: usize,
    pub url: String,
    pub pages: Option<Vec<PageContext>>,
}

impl Serialize for PageContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        for (key, value) in &self.frontmatter.raw {
            match key.as_str() {
                "template" => map.serialize_entry(key, &self.template)?,
                "title" => map.serialize_entry(key, &self.title)?,
                computed if COMPUTED_KEYS.contains(&computed) => {}
                _ => map.serialize_entry(key, value)?,
            }
        }

        map.serialize_entry("content", &self.content)?;
        map.serialize_entry("depth", &self.depth)?;
        map.serialize_entry("url", &self.url)?;
        if let Some(pages) = &self.pages {
            map.serialize_entry("pages", pages)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(frontmatter: Value) -> PageContext {
        let raw = frontmatter.as_object().cloned().unwrap();
        PageContext {
            template: "post.html".to_string(),
            title: "Hello".to_string(),
            frontmatter: Frontmatter { raw },
            content: "<p>Hi</p>\n".to_string(),
            depth: 1,
            url: "hello".to_string(),
            pages: None,
        }
    }

    #[test]
    fn test_passthrough_keys_keep_their_order() {
        let page = context(json!({
            "title": "Hello",
            "tags": ["a", "b"],
            "template": "post.html",
            "draft": false,
        }));

        let value = serde_json::to_value(&page).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(
            keys,
            ["title", "tags", "template", "draft", "content", "depth", "url"]
        );
        assert_eq!(value["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_computed_fields_shadow_frontmatter() {
        let page = context(json!({
            "title": "Hello",
            "template": "post.html",
            "url": "https://elsewhere.example",
            "depth": 42,
        }));

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["url"], json!("hello"));
        assert_eq!(value["depth"], json!(1));
        assert!(value.get("pages").is_none());
    }

    #[test]
    fn test_pages_serialized_only_when_present() {
        let child = context(json!({"title": "Hello", "template": "post.html"}));
        let mut index = context(json!({"title": "Blog", "template": "list.html"}));
        index.pages = Some(vec![child]);

        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["pages"][0]["title"], json!("Hello"));
        assert_eq!(value["pages"][0]["content"], json!("<p>Hi</p>\n"));
    }

    #[test]
    fn test_project_layout() {
        let paths = SitePaths::for_project("site");
        assert_eq!(paths.content_dir, PathBuf::from("site/content"));
        assert_eq!(paths.template_dir, PathBuf::from("site/templates"));
        assert_eq!(paths.output_dir, PathBuf::from("site/public"));
        assert_eq!(paths.static_output_dir(), PathBuf::from("site/public/static"));

        let paths = paths.with_output("dist");
        assert_eq!(paths.output_dir, PathBuf::from("dist"));
    }
}
