use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use markly::cli::Cli;
use markly::logging::init_logging;
use markly::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional
    dotenvy::dotenv().ok();

    let (log_path, _guard) = init_logging()?;
    tracing::info!("markly starting, logging to {}", log_path.display());

    let (settings, service) = markly_auth::connect()?;
    let store = markly_api::Client::new(&settings.supabase_url, &settings.anon_key);

    let mut stdout = std::io::stdout();
    App::new(Arc::new(service), Arc::new(store), settings)
        .run(cli.command, &mut stdout)
        .await
}
