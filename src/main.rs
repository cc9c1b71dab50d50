// src/main.rs
//! Sparklab Execution Engine
//!
//! Development harness: runs one snippet through the engine and prints its
//! event stream as JSON lines. The IDE server embeds the library instead of
//! shelling out to this binary.

use anyhow::{bail, Context, Result};
use sparklab_executor::{
    ExecutionRequest, ExecutorConfig, NotifierHub, Predicate, SessionRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (language, path) = match (args.next(), args.next()) {
        (Some(language), Some(path)) => (language, path),
        _ => bail!("usage: sparklab-executor <language> <source-file>"),
    };

    let source = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path))?;

    let config = ExecutorConfig::load()?;
    info!(
        "Starting executor v{} (workspace root {:?})",
        sparklab_executor::VERSION,
        config.workspace_root
    );

    let hub = Arc::new(NotifierHub::new(config.subscriber_buffer));
    let registry = Arc::new(SessionRegistry::new(config, Arc::clone(&hub)));

    let mut sub = hub.subscribe(Predicate::All);
    let id = registry.submit(ExecutionRequest::new(language, source))?;
    info!("Session {} submitted", id);

    while let Some(event) = sub.receiver.recv().await {
        println!("{}", serde_json::to_string(&event)?);
        if event.session_id == id && event.is_terminal() {
            break;
        }
    }

    let session = registry.status(&id)?;
    info!("Session {} ended: {:?}", id, session.state);

    std::process::exit(match session.exit_code {
        Some(code) => code,
        None => 1,
    });
}
