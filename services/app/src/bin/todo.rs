//! services/app/src/bin/todo.rs

use app_lib::{
    adapters::{SupabaseAuthAdapter, SupabaseEndpoint, SupabaseTodoAdapter},
    config::Config,
    error::AppError,
    shell::Shell,
};
use std::sync::Arc;
use todo_core::ports::AuthService;
use todo_core::session::SessionContext;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    // Logs go to stderr; stdout belongs to the shell.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded for {}", config.supabase_url);

    // --- 2. Initialize Service Adapters ---
    let endpoint = SupabaseEndpoint::from_config(&config)?;
    let auth: Arc<dyn AuthService> = Arc::new(SupabaseAuthAdapter::new(endpoint.clone()));
    let store = Arc::new(SupabaseTodoAdapter::new(
        endpoint,
        config.todos_table.clone(),
        auth.clone(),
    ));

    // --- 3. Build the Session Context ---
    let ctx = SessionContext::start(auth).await;

    // --- 4. Run the Shell ---
    let mut shell = Shell::new(ctx, store);
    shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Shell closed.");
    Ok(())
}
