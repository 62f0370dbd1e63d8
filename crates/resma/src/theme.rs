use crate::error::{BuildError, Result};
use crate::paths::{ResourceKind, rel_path};
use crate::types::PageContext;
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tera::{Context, Function, Tera, Value};
use walkdir::WalkDir;

pub const REL_PATH_FUNCTION: &str = "rel_path";

const TEMPLATE_EXTENSIONS: [&str; 6] = ["html", "htm", "xml", "txt", "tera", "jinja"];

/// Every template under one search root, loaded once per build and shared
/// by reference with each render.
pub struct TemplateEngine {
    tera: Tera,
    // One copy per page depth, each with `rel_path` bound to that depth.
    by_depth: RefCell<HashMap<usize, Tera>>,
}

impl TemplateEngine {
    /// Loads the template files under `template_dir`, named by their path
    /// relative to it. Other files, such as images or `.DS_Store`, are ignored.
    pub fn from_directory(template_dir: &Path) -> Result<Self> {
        let mut files = Vec::new();

        for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|error| BuildError::WalkDir {
                path: template_dir.to_path_buf(),
                message: error.to_string(),
            })?;

            if !entry.file_type().is_file() || !is_template_file(entry.path()) {
                continue;
            }

            let name = template_name(template_dir, entry.path())?;
            files.push((entry.into_path(), Some(name)));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_template_files(files)?;

        Ok(Self {
            tera,
            by_depth: RefCell::new(HashMap::new()),
        })
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    pub fn resolve<'e>(&'e self, name: &str) -> Result<ResolvedTemplate<'e>> {
        if self.tera.get_template_names().any(|n| n == name) {
            Ok(ResolvedTemplate {
                engine: self,
                name: name.to_string(),
            })
        } else {
            Err(BuildError::TemplateMissing {
                name: name.to_string(),
            })
        }
    }

    fn render_at_depth(&self, name: &str, depth: usize, context: &Context) -> Result<String> {
        let mut by_depth = self.by_depth.borrow_mut();
        let tera = by_depth.entry(depth).or_insert_with(|| {
            let mut tera = self.tera.clone();
            tera.register_function(REL_PATH_FUNCTION, RelPath { depth });
            tera
        });

        tera.render(name, context).map_err(lift_invalid_argument)
    }
}

pub struct ResolvedTemplate<'e> {
    engine: &'e TemplateEngine,
    name: String,
}

impl ResolvedTemplate<'_> {
    /// Renders with `page` bound as the only context value. `rel_path` is
    /// bound to this page's depth.
    pub fn render(&self, page: &PageContext) -> Result<String> {
        let mut context = Context::new();
        context.insert("page", page);

        self.engine.render_at_depth(&self.name, page.depth, &context)
    }
}

fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| TEMPLATE_EXTENSIONS.contains(&extension))
        .unwrap_or(false)
}

fn template_name(template_dir: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(template_dir).map_err(|_| {
        BuildError::Other(format!("{} escaped {}", path.display(), template_dir.display()))
    })?;

    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

// A bad `rel_path` argument surfaces as the typed error rather than a
// generic template failure.
fn lift_invalid_argument(error: tera::Error) -> BuildError {
    let mut source = error.source();
    while let Some(inner) = source {
        if let Some(BuildError::InvalidArgument { argument, message }) =
            inner.downcast_ref::<BuildError>()
        {
            return BuildError::InvalidArgument {
                argument: argument.clone(),
                message: message.clone(),
            };
        }
        source = inner.source();
    }
    BuildError::Template(error)
}

/// `rel_path(file_path="main.css", resource_kind="style")`
struct RelPath {
    depth: usize,
}

impl Function for RelPath {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let file_path = string_arg(args, &["file_path"])?;
        let kind = string_arg(args, &["resource_kind", "resource_type"])?;
        let kind: ResourceKind = kind
            .parse()
            .map_err(|error: BuildError| tera::Error::chain(error.to_string(), error))?;

        Ok(Value::String(rel_path(self.depth, &file_path, kind)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

fn string_arg(args: &HashMap<String, Value>, names: &[&str]) -> tera::Result<String> {
    names
        .iter()
        .find_map(|name| args.get(*name))
        .and_then(|value| value.as_str())
        .map(String::from)
        .ok_or_else(|| {
            let error = BuildError::InvalidArgument {
                argument: names[0].to_string(),
                message: format!("{REL_PATH_FUNCTION} needs a string '{}'", names[0]),
            };
            tera::Error::chain(error.to_string(), error)
        })
}
