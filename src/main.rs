use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use socialcast::cli::{commands, Cli, Commands};
use socialcast::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Watch {
            url,
            platform,
            headful,
        } => {
            commands::watch(config, &url, platform.as_deref(), headful).await?;
        }
        Commands::Chunk { file, max } => {
            commands::chunk_text(file.as_deref(), max)?;
        }
        Commands::Voices => commands::list_voices(&config),
        Commands::Platforms => commands::list_platforms(&config),
    }

    Ok(())
}
