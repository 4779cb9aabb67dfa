// Main binary that starts the bootlace core services
use bootlace_server::ServerConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Network boot orchestration: decides which boot script a machine gets
/// and tracks where it is in its boot sequence.
#[derive(Parser, Debug)]
#[command(author, version, about = "Bootlace network boot orchestrator", long_about = None)]
struct Cli {
    /// Root of the data directory holding mappings and templates
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Mappings file name, relative to the data directory
    #[arg(long, default_value = "mappings.yaml")]
    mappings_file: String,

    /// Environment-overrides directory name, relative to the data directory
    #[arg(long, default_value = "env_overrides")]
    env_dir: String,

    /// File extension of dynamic boot script templates
    #[arg(long, default_value = ".slc")]
    template_extension: String,

    /// Verbose output - shows debug logs
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG when set; the debug flag only changes the default
    let default_level = if cli.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let config = ServerConfig::new(cli.data_dir)
        .with_mappings_file(cli.mappings_file)
        .with_env_dir(cli.env_dir)
        .with_template_extension(cli.template_extension);

    info!(data_dir = %config.data_dir.display(), "starting bootlace");
    bootlace_server::run(config).await
}
