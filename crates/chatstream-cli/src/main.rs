//! Sends one message to a chat backend and prints the conversation as the
//! run streams in. Ctrl-C stops the run and keeps what arrived so far.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::watch;

use chatstream_core::prelude::*;
use chatstream_core::{observability, projector};

#[derive(Parser, Debug)]
#[command(name = "chatstream", version, about)]
struct Cli {
    /// Thread the run belongs to.
    #[arg(long)]
    thread: String,
    /// Backend base URL. Falls back to `CHATSTREAM_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,
    /// Extra run config, as a JSON object.
    #[arg(long)]
    config: Option<String>,
    /// Message to send.
    message: String,
}

fn load_env() {
    let _ = dotenvy::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    dotenvy::dotenv().ok();
}

fn run_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let base = match &cli.config {
        Some(raw) => RunConfig::new(serde_json::from_str(raw).context("--config must be valid JSON")?),
        None => RunConfig::default(),
    };
    Ok(base.with_configurable("thread_id", cli.thread.as_str()))
}

fn render_line(message: &Message) -> String {
    let kind = message.kind().unwrap_or("message");
    match message.content() {
        Some(text) => format!("{kind}: {text}"),
        None => format!("{kind}: {}", message.as_value()),
    }
}

/// Prints projected messages past `printed` and returns the new count.
fn print_new(
    rx: &watch::Receiver<Option<StreamState>>,
    history: &ConversationHistory,
    printed: usize,
) -> usize {
    let state = rx.borrow();
    let Some(messages) = projector::project(history, state.as_ref()) else {
        return printed;
    };
    for message in messages.iter().skip(printed) {
        println!("{}", render_line(message));
    }
    messages.len().max(printed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    observability::init_observability();
    let cli = Cli::parse();

    let client_config = match &cli.base_url {
        Some(url) => ClientConfig::new(url.as_str()),
        None => ClientConfig::from_env()?,
    };
    let transport = HttpTransport::new(client_config)?;
    let controller = StreamController::new(Arc::new(transport));
    let history = ConversationHistory::loaded(cli.thread.as_str(), Vec::new());

    let mut rx = controller.subscribe();
    let mut printed = 0;
    let mut interrupted = false;
    let run = controller.start_stream(Message::human(cli.message.as_str()), run_config(&cli)?);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            changed = rx.changed() => {
                if changed.is_ok() {
                    printed = print_new(&rx, &history, printed);
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                tracing::info!("interrupt received, stopping stream");
                controller.stop_stream(false);
            }
        }
    };
    print_new(&rx, &history, printed);

    let status = result?;
    if let Some(run_id) = controller.stream().and_then(|s| s.run_id) {
        eprintln!("run {run_id}: {status:?}");
    } else {
        eprintln!("{status:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_thread_and_message() {
        let cli = Cli::try_parse_from(["chatstream", "--thread", "t1", "hello"]).expect("parse");
        assert_eq!(cli.thread, "t1");
        assert_eq!(cli.message, "hello");
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn run_config_merges_thread_into_user_config() {
        let cli = Cli::try_parse_from([
            "chatstream",
            "--thread",
            "t1",
            "--config",
            r#"{"configurable":{"type":"agent"}}"#,
            "hi",
        ])
        .expect("parse");
        let config = run_config(&cli).expect("config");
        assert_eq!(config.thread_id(), Some(ThreadId::new("t1")));
        assert_eq!(config.as_value()["configurable"]["type"], "agent");
    }

    #[test]
    fn invalid_config_json_is_rejected() {
        let cli = Cli::try_parse_from(["chatstream", "--thread", "t1", "--config", "{", "hi"])
            .expect("parse");
        assert!(run_config(&cli).is_err());
    }

    #[test]
    fn render_line_prefers_text_content() {
        assert_eq!(render_line(&Message::human("hey")), "human: hey");
        assert_eq!(render_line(&Message::from("bare")), "message: bare");
        let structured = Message::new(serde_json::json!({"type": "ai", "content": [1]}));
        assert!(render_line(&structured).starts_with("ai: {"));
    }
}
