use ecotech::{cli, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "ecotech=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // stdout belongs to the menu
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let app_state = AppState::init().await?;
    tracing::info!(provider = %app_state.indicators.source(), "ecotech started");

    let mut session = app_state.session();
    cli::run(&mut session, tokio::io::stdin(), tokio::io::stdout()).await?;

    Ok(())
}
