mod commands;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resma")]
#[command(about = "Resma static site generator", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new project
    Start { name: String },

    /// Build your site to the public folder
    Build {
        #[arg(long, short)]
        input: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,
    },

    /// Run a http server from the public folder
    Serve {
        #[arg(long, short)]
        input: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use `resma --help` to see the available commands");
        return;
    };

    let result = match command {
        Commands::Start { name } => commands::start_project(&name),
        Commands::Build {
            input,
            output,
            clean,
        } => commands::build_site(input.as_deref(), output.as_deref(), clean),
        Commands::Serve {
            input,
            output,
            port,
        } => commands::serve_site(input.as_deref(), output.as_deref(), port).await,
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        let mut source = error.source();
        while let Some(inner) = source {
            eprintln!("  caused by: {inner}");
            source = inner.source();
        }
        std::process::exit(1);
    }
}
