use crate::assets::{AssetRewriter, copy_dir_all};
use crate::error::{BuildError, IoContext, Result};
use crate::parsing::{MarkdownRenderer, extract_frontmatter, validate_frontmatter};
use crate::paths::{depth, output_file_name, page_url};
use crate::theme::TemplateEngine;
use crate::types::{
    BuildReport, CONTENT_EXTENSION, ContentEntry, INDEX_FILE_NAME, PageContext, PageKind,
    STATIC_DIR_NAME, STYLES_DIR_NAME, Section, SitePaths,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A content file as read from disk, dropped once its page is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub path: PathBuf,
    pub raw: String,
}

impl ContentFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).io_context("reading content file", path)?;
        Ok(Self {
            path: path.to_path_buf(),
            raw,
        })
    }
}

struct SourcePage<'a> {
    path: &'a Path,
    kind: PageKind,
    output_dir: &'a Path,
    section: Option<&'a str>,
}

pub struct SiteBuilder {
    paths: SitePaths,
    renderer: MarkdownRenderer,
}

impl SiteBuilder {
    pub fn new(paths: SitePaths) -> Self {
        Self {
            paths,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Runs one full build. The first fatal error stops it; pages written
    /// before that stay on disk.
    pub fn build(&self) -> Result<BuildReport> {
        self.check_roots()?;

        info!(
            "Building {} into {}",
            self.paths.content_dir.display(),
            self.paths.output_dir.display()
        );

        let engine = TemplateEngine::from_directory(&self.paths.template_dir)?;
        let entries = discover(&self.paths.content_dir)?;

        let output_dir = &self.paths.output_dir;
        fs::create_dir_all(output_dir).io_context("creating directory", output_dir)?;
        copy_dir_all(&self.paths.styles_dir, &output_dir.join(STYLES_DIR_NAME))?;
        copy_dir_all(&self.paths.static_dir, &output_dir.join(STATIC_DIR_NAME))?;

        let mut report = BuildReport::default();

        for entry in &entries {
            match entry {
                ContentEntry::LeafPage(path) => {
                    let page = SourcePage {
                        path,
                        kind: PageKind::Leaf,
                        output_dir,
                        section: None,
                    };
                    self.build_page(&engine, &page, None, &mut report)?;
                }
                ContentEntry::SectionIndex(path) => {
                    let page = SourcePage {
                        path,
                        kind: PageKind::Index,
                        output_dir,
                        section: None,
                    };
                    self.build_page(&engine, &page, None, &mut report)?;
                }
                ContentEntry::Section(section) => {
                    self.build_section(&engine, section, &mut report)?;
                }
            }
        }

        info!(
            "Wrote {} pages and copied {} images",
            report.pages_written, report.assets_copied
        );

        Ok(report)
    }

    fn check_roots(&self) -> Result<()> {
        if is_non_empty_dir(&self.paths.content_dir) && is_non_empty_dir(&self.paths.template_dir)
        {
            Ok(())
        } else {
            Err(BuildError::EmptyContentOrTemplates {
                content_dir: self.paths.content_dir.clone(),
                template_dir: self.paths.template_dir.clone(),
            })
        }
    }

    /// Leaves first, in enumeration order, then the index with the leaves'
    /// contexts sorted by title, descending.
    fn build_section(
        &self,
        engine: &TemplateEngine,
        section: &Section,
        report: &mut BuildReport,
    ) -> Result<()> {
        let section_dir = self.paths.output_dir.join(&section.name);
        fs::create_dir_all(&section_dir).io_context("creating directory", &section_dir)?;

        let mut children = Vec::with_capacity(section.pages.len());
        for path in &section.pages {
            let page = SourcePage {
                path,
                kind: PageKind::Leaf,
                output_dir: &section_dir,
                section: Some(section.name.as_str()),
            };
            children.push(self.build_page(engine, &page, None, report)?);
        }

        if let Some(index) = &section.index {
            sort_by_title_descending(&mut children);
            let page = SourcePage {
                path: index,
                kind: PageKind::Index,
                output_dir: &section_dir,
                section: Some(section.name.as_str()),
            };
            self.build_page(engine, &page, Some(children), report)?;
        }

        Ok(())
    }

    fn build_page(
        &self,
        engine: &TemplateEngine,
        page: &SourcePage<'_>,
        pages: Option<Vec<PageContext>>,
        report: &mut BuildReport,
    ) -> Result<PageContext> {
        let file = ContentFile::read(page.path)?;
        let (frontmatter, body) = extract_frontmatter(&file.raw, &file.path)?;
        let (template, title) = validate_frontmatter(&frontmatter, &file.path)?;

        let static_output_dir = self.paths.static_output_dir();
        let rewritten = AssetRewriter::new(&self.paths.content_dir, &static_output_dir)
            .rewrite(&file.path, &body)?;
        report.assets_copied += rewritten.copied;

        let context = PageContext {
            template,
            title,
            frontmatter,
            content: self.renderer.render(&rewritten.body),
            depth: depth(&file.path, &self.paths.content_dir)?,
            url: page_url(&file.path, page.kind, page.section),
            pages,
        };

        let html = engine.resolve(&context.template)?.render(&context)?;

        let output_path = page
            .output_dir
            .join(output_file_name(&file.path, page.kind));
        write_page(&output_path, &html)?;
        report.pages_written += 1;
        debug!("Wrote {}", output_path.display());

        Ok(context)
    }
}

/// Builds the site under the five given roots.
pub fn build(
    content_dir: impl AsRef<Path>,
    template_dir: impl AsRef<Path>,
    styles_dir: impl AsRef<Path>,
    static_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<BuildReport> {
    SiteBuilder::new(SitePaths {
        content_dir: content_dir.as_ref().to_path_buf(),
        template_dir: template_dir.as_ref().to_path_buf(),
        styles_dir: styles_dir.as_ref().to_path_buf(),
        static_dir: static_dir.as_ref().to_path_buf(),
        output_dir: output_dir.as_ref().to_path_buf(),
    })
    .build()
}

/// Classifies the top-level entries of `content_dir`, sorted by file name.
pub fn discover(content_dir: &Path) -> Result<Vec<ContentEntry>> {
    let mut entries = Vec::new();

    for path in list_dir(content_dir)? {
        if path.is_dir() {
            entries.push(ContentEntry::Section(discover_section(&path)?));
        } else if is_content_file(&path) {
            if is_index_file(&path) {
                entries.push(ContentEntry::SectionIndex(path));
            } else {
                entries.push(ContentEntry::LeafPage(path));
            }
        }
    }

    Ok(entries)
}

fn discover_section(dir: &Path) -> Result<Section> {
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| BuildError::Other(format!("section has no name: {}", dir.display())))?;

    let mut index = None;
    let mut pages = Vec::new();

    for path in list_dir(dir)? {
        if !path.is_file() || !is_content_file(&path) {
            continue;
        }

        if is_index_file(&path) {
            index = Some(path);
        } else {
            pages.push(path);
        }
    }

    Ok(Section {
        name,
        index,
        pages,
    })
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|error| BuildError::WalkDir {
            path: dir.to_path_buf(),
            message: error.to_string(),
        })?;
        paths.push(entry.into_path());
    }

    Ok(paths)
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension == CONTENT_EXTENSION)
        .unwrap_or(false)
}

fn is_index_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name == INDEX_FILE_NAME)
        .unwrap_or(false)
}

fn is_non_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

pub fn sort_by_title_descending(pages: &mut [PageContext]) {
    pages.sort_by(|a, b| b.title.cmp(&a.title));
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).io_context("creating directory", parent)?;
    }
    fs::write(path, html).io_context("writing page", path)
}

pub fn clean_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).io_context("removing output directory", output_dir)?;
    }
    Ok(())
}
