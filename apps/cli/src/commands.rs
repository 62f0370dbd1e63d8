use axum::Router;
use axum::extract::{Request, State};
use axum::http::Uri;
use axum::middleware;
use resma::{CONFIG_FILE_NAME, ProjectConfig, SiteBuilder, SitePaths, clean_output_dir};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;
use tracing::info;

const PROJECT_DIRS: [&str; 4] = ["content", "templates", "static", "styles"];

fn escape_toml_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '\\' => output.push_str("\\\\"),
            '"' => output.push_str("\\\""),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            control if control < '\u{0020}' => {
                output.push_str(&format!("\\u{:04X}", control as u32));
            }
            other => output.push(other),
        }
    }
    output
}

pub fn start_project(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let project_dir = Path::new(name);

    if project_dir.exists() {
        return Err(format!("File already exists: {}", project_dir.display()).into());
    }

    for dir in PROJECT_DIRS {
        fs::create_dir_all(project_dir.join(dir))?;
    }

    let project_name = project_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let config = format!("[resma]\nname = \"{}\"\n", escape_toml_string(&project_name));
    fs::write(project_dir.join(CONFIG_FILE_NAME), config)?;

    println!("Project {project_name} created successfully");

    Ok(())
}

pub fn build_site(
    input: Option<&Path>,
    output: Option<&Path>,
    clean: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = input.unwrap_or(Path::new("."));
    ProjectConfig::load(input_dir)?;

    let mut paths = SitePaths::for_project(input_dir);
    if let Some(output) = output {
        paths = paths.with_output(output);
    }

    if clean {
        clean_output_dir(&paths.output_dir)?;
    }

    let start = Instant::now();
    let report = SiteBuilder::new(paths.clone()).build()?;

    println!(
        "Site built successfully: {} pages, {} images to {} in {:.2?}",
        report.pages_written,
        report.assets_copied,
        paths.output_dir.display(),
        start.elapsed()
    );

    Ok(())
}

pub async fn serve_site(
    input: Option<&Path>,
    output: Option<&Path>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = input.unwrap_or(Path::new("."));
    let output_dir = match output {
        Some(output) => output.to_path_buf(),
        None => SitePaths::for_project(input_dir).output_dir,
    };

    if !output_dir.is_dir() {
        return Err(format!(
            "public folder not found at {}. Run `resma build` before running `resma serve` again",
            output_dir.display()
        )
        .into());
    }

    let root = Arc::new(output_dir.clone());
    let serve_dir = ServeDir::new(&output_dir).append_index_html_on_directories(true);
    let app = Router::new()
        .fallback_service(serve_dir)
        .layer(middleware::map_request_with_state(root, rewrite_clean_urls));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Serving {}", output_dir.display());
    println!("Serving at http://{addr}");
    println!("Press Ctrl+C to stop");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn rewrite_clean_urls(State(root): State<Arc<PathBuf>>, mut request: Request) -> Request {
    if let Some(target) = clean_url_target(&root, request.uri().path()) {
        let rewritten = match request.uri().query() {
            Some(query) => format!("{target}?{query}"),
            None => target,
        };
        if let Ok(uri) = rewritten.parse::<Uri>() {
            *request.uri_mut() = uri;
        }
    }
    request
}

/// `/about` is served from `about.html`, and so is `/about/` when no
/// `about/` directory exists. Static and style assets are never rewritten.
fn clean_url_target(root: &Path, request_path: &str) -> Option<String> {
    if let Some(stripped) = request_path.strip_suffix('/') {
        let relative = stripped.trim_start_matches('/');
        if !relative.is_empty() && root.join(format!("{relative}.html")).is_file() {
            return Some(format!("{stripped}.html"));
        }
        return None;
    }

    if request_path.contains("static") || request_path.contains("styles") {
        return None;
    }

    let relative = request_path.trim_start_matches('/');
    if Path::new(relative).extension().is_some() || root.join(relative).is_dir() {
        return None;
    }

    Some(format!("{request_path}.html"))
}
