use crate::error::{BuildError, Result};
use crate::types::Frontmatter;
use pulldown_cmark::{Options, Parser, html};
use serde_json::Value;
use std::path::Path;

const YAML_DELIMITER: &str = "---";
const TOML_DELIMITER: &str = "+++";

pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    pub fn render(&self, content: &str) -> String {
        let parser = Parser::new_ext(content, self.options);
        let mut html_output = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

/// Splits a content file into its metadata block and markdown body.
///
/// A file without a leading `---` or `+++` line yields an empty
/// [`Frontmatter`] and the whole text as body; validation rejects it later.
pub fn extract_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let content = content.replace("\r\n", "\n");
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let first_line = content.lines().next().unwrap_or("").trim();

    if first_line == TOML_DELIMITER {
        let (block, body) = split_block(content, TOML_DELIMITER, path)?;
        let value: Value = toml::from_str(block)
            .map_err(|error| BuildError::malformed(path, error.to_string()))?;
        Ok((into_frontmatter(value, path)?, body.trim().to_string()))
    } else if first_line == YAML_DELIMITER {
        let (block, body) = split_block(content, YAML_DELIMITER, path)?;
        if block.trim().is_empty() {
            return Ok((Frontmatter::default(), body.trim().to_string()));
        }
        let value: Value = serde_yml::from_str(block)
            .map_err(|error| BuildError::malformed(path, error.to_string()))?;
        Ok((into_frontmatter(value, path)?, body.trim().to_string()))
    } else {
        Ok((Frontmatter::default(), content.to_string()))
    }
}

/// Checks the two keys every page needs and returns `(template, title)`.
pub fn validate_frontmatter(frontmatter: &Frontmatter, path: &Path) -> Result<(String, String)> {
    if frontmatter.is_empty() {
        return Err(BuildError::malformed(path, "no frontmatter block"));
    }

    let template = required_string(frontmatter, "template", path)?;
    let title = required_string(frontmatter, "title", path)?;

    Ok((template, title))
}

fn required_string(frontmatter: &Frontmatter, key: &str, path: &Path) -> Result<String> {
    match frontmatter.raw.get(key) {
        None | Some(Value::Null) => Err(BuildError::malformed(path, format!("missing '{key}'"))),
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        Some(Value::String(_)) => Err(BuildError::malformed(path, format!("empty '{key}'"))),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(true)) => Ok("true".to_string()),
        Some(Value::Bool(false)) => Err(BuildError::malformed(path, format!("missing '{key}'"))),
        Some(_) => Err(BuildError::malformed(
            path,
            format!("'{key}' must be a string"),
        )),
    }
}

fn into_frontmatter(value: Value, path: &Path) -> Result<Frontmatter> {
    match value {
        Value::Object(raw) => Ok(Frontmatter { raw }),
        _ => Err(BuildError::malformed(path, "frontmatter is not a mapping")),
    }
}

fn split_block<'a>(content: &'a str, delimiter: &str, path: &Path) -> Result<(&'a str, &'a str)> {
    let rest = content.split_once('\n').map(|(_, rest)| rest).unwrap_or("");

    let end_index = find_closing_delimiter(rest, delimiter)
        .ok_or_else(|| BuildError::malformed(path, "unterminated frontmatter block"))?;

    let block = &rest[..end_index];
    let body = rest[end_index..]
        .split_once('\n')
        .map(|(_, body)| body)
        .unwrap_or("");

    Ok((block, body))
}

fn find_closing_delimiter(content: &str, delimiter: &str) -> Option<usize> {
    let mut position = 0;

    for line in content.lines() {
        if line.trim() == delimiter {
            return Some(position);
        }
        position += line.len() + 1;
    }

    None
}
