use std::sync::Arc;

use anyhow::Context;
use courier_core::SessionTurn;
use courier_engine::{AskOutcome, OrchestratorClient, QueryError, QuerySession};
use courier_logging::{courier_debug, courier_warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::render::format_turn;

const CHAT_HELP: &str = "Ask a question. /clear empties the history, /reset starts over, /quit exits.";

fn session_for(config: &AppConfig) -> anyhow::Result<QuerySession> {
    let client = OrchestratorClient::new(config.client.clone())?;
    Ok(QuerySession::new(Arc::new(client)))
}

pub(super) async fn ask_once(
    config: &AppConfig,
    query: String,
    domain: Option<String>,
) -> anyhow::Result<()> {
    let session = session_for(config)?;
    if let AskOutcome::Answered(turn) = session.ask(query, domain.as_deref()).await? {
        print_turn(&turn);
    }
    Ok(())
}

/// Line-oriented session: every line is a question, and a new one
/// replaces whatever is still being answered.
pub(super) async fn chat(config: &AppConfig, domain: Option<String>) -> anyhow::Result<()> {
    let session = session_for(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<JoinHandle<()>> = None;
    eprintln!("{CHAT_HELP}");

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => {
                session.cancel();
                break;
            }
            "/clear" => {
                session.clear();
                eprintln!("History cleared.");
            }
            "/reset" => {
                session.reset();
                eprintln!("Session reset.");
            }
            "/help" => eprintln!("{CHAT_HELP}"),
            query => {
                let session = session.clone();
                let domain = domain.clone();
                let query = query.to_string();
                pending = Some(tokio::spawn(async move {
                    answer(&session, query, domain.as_deref()).await;
                }));
            }
        }
    }

    if let Some(task) = pending {
        let _ = task.await;
    }
    Ok(())
}

async fn answer(session: &QuerySession, query: String, domain: Option<&str>) {
    match session.ask(query, domain).await {
        Ok(AskOutcome::Answered(turn)) => print_turn(&turn),
        Ok(AskOutcome::Superseded) => courier_debug!("Question replaced before it was answered"),
        Err(QueryError::Transport(err)) => eprintln!("Query failed: {}", err.reason()),
    }
}

fn print_turn(turn: &SessionTurn) {
    let dangling = turn.dangling_citations();
    if !dangling.is_empty() {
        courier_warn!("Answer cites {:?} without matching sources", dangling);
    }
    println!("{}\n", format_turn(turn));
}
