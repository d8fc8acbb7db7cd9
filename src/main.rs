use std::sync::Arc;

use anyhow::Context;
use koreai_connector::{
    cli::config_path_from_args,
    config::Config,
    connector::{facade::Connector, sink::JsonLinesDeliverySink, types::OutboundTurn},
    logging::init_tracing,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let connector = Connector::new(config.connector, Arc::new(JsonLinesDeliverySink))
        .context("failed to create connector")?;
    let mut session = connector
        .start_session()
        .await
        .context("failed to start session")?;
    tracing::info!(
        target: "connector",
        run_id = %logging_guard.run_id(),
        "reading_turns_from_stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "connector", "shutdown_signal_received");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let utterance = line.trim_end_matches('\r');
        if utterance.is_empty() {
            continue;
        }
        if let Err(err) = connector
            .send_turn(&mut session, OutboundTurn::new(utterance))
            .await
        {
            tracing::error!(
                target: "connector",
                kind = ?err.kind,
                error = %err,
                "turn_failed"
            );
        }
    }

    connector.stop_session(&mut session);
    Ok(())
}
