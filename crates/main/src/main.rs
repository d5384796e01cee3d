use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use expense_report::config::AppConfig;
use expense_report::server::{self, AppState};
use expense_report::{PdfRenderer, ReportBuilder, ReportRequest};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serves expense report PDFs over HTTP or renders them from JSON files.
///
/// Fonts are looked up in `--fonts-dir`, then `EXPENSE_REPORT_FONTS_DIR`, then `assets/fonts`
/// next to the binary or the library crate, and finally common system font directories.
#[derive(Parser)]
#[command(author, version, about = "Expense report PDF service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FontArgs {
    /// Directory holding the Roboto font files.
    #[arg(long, env = "EXPENSE_REPORT_FONTS_DIR")]
    fonts_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Address to bind to.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        fonts: FontArgs,
    },

    /// Render a JSON report request to a PDF file.
    Render {
        /// Path of the JSON request body.
        #[arg(long, short)]
        input: PathBuf,

        /// Directory the PDF is written to.
        #[arg(long, short, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        fonts: FontArgs,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expense_report=debug,main=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn report_builder(config: &AppConfig, fonts: FontArgs) -> anyhow::Result<ReportBuilder> {
    let fonts_dir = fonts.fonts_dir.or_else(|| config.fonts.dir.clone());
    let renderer = PdfRenderer::from_fonts_dir(fonts_dir.as_deref())?;
    Ok(ReportBuilder::new(Arc::new(renderer)))
}

async fn serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    fonts: FontArgs,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let builder = report_builder(&config, fonts)?;
    let state = AppState::new(builder).with_body_limit(config.server.body_limit_bytes);

    server::serve(&config.server.bind_address(), state)
        .await
        .with_context(|| format!("Server on {} failed", config.server.bind_address()))?;

    info!("Server stopped");
    Ok(())
}

fn render(
    config: &AppConfig,
    input: PathBuf,
    output_dir: PathBuf,
    fonts: FontArgs,
) -> anyhow::Result<()> {
    let body = fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let request = ReportRequest::from_json(&body)
        .with_context(|| format!("{} is not a valid report request", input.display()))?;

    let document = report_builder(config, fonts)?.build(&request)?;

    fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join(&document.file_name);
    fs::write(&output_path, &document.bytes)?;
    println!(
        "Generated {} ({} bytes)",
        output_path.display(),
        document.bytes.len()
    );
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port, fonts } => serve(config, host, port, fonts).await,
        Commands::Render {
            input,
            output_dir,
            fonts,
        } => render(&config, input, output_dir, fonts),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
