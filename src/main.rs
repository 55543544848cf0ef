use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weighbridge::app::AppContext;
use weighbridge::cli::{commands, Cli, Commands};
use weighbridge::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs on stderr; stdout carries results
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }

    let ctx = AppContext::new(config, cli.db.clone())?;

    match cli.command {
        Commands::Enrich {
            ids,
            input,
            json,
            no_store,
        } => {
            commands::enrich(&ctx, ids, input.as_deref(), json, no_store).await?;
        }
        Commands::Get { id } => {
            commands::get(&ctx, &id).await?;
        }
        Commands::Stored => {
            commands::list_stored(&ctx)?;
        }
        Commands::Forget { id } => {
            commands::forget(&ctx, id.as_deref())?;
        }
    }

    Ok(())
}
