use std::sync::Arc;

use anyhow::Context;

use portfolio_chat::config::ChatConfig;
use portfolio_chat::dialogue::Interpreter;
use portfolio_chat::host::{CliHost, spawn_stdin_reader};
use portfolio_chat::session::ChatSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ChatConfig::try_from_env().context("reading PORTFOLIO_CHAT_* configuration")?;

    // Logs go to a file when configured, so they do not interleave with the chat.
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let _log_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "portfolio-chat.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    };

    let graph = config.load_graph().context("loading step graph")?;

    eprintln!("💬 Portfolio Chat v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Script: {} ({} steps)",
        config
            .graph_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string()),
        graph.len()
    );
    eprintln!(
        "   Delays: reveal {}ms, navigation {}ms",
        config.reveal_delay.as_millis(),
        config.navigation_delay.as_millis()
    );
    eprintln!("   Commands: /open /close /reset /whatsapp /quit\n");

    let interpreter = Interpreter::new(Arc::new(graph));
    let host = Arc::new(CliHost::new("DenisBot"));
    let session = ChatSession::new(interpreter, host, config.delays())
        .with_whatsapp(config.whatsapp.clone())
        .with_contact_bubble();

    session
        .run(spawn_stdin_reader())
        .await
        .context("chat session failed")?;

    Ok(())
}
