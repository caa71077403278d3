// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive conversation REPL.
//!
//! One conversation per shell session; each line is routed as a chat-mode
//! turn. `:voice` toggles voice mode, `:quit` exits.

use std::time::Duration;

use colored::Colorize;
use mnemos_config::MnemosConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::types::{ChatMode, TurnRequest};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::wiring;

pub async fn run(config: &MnemosConfig) -> Result<(), MnemosError> {
    let app = wiring::build(config).await?;
    let conversation_id = uuid::Uuid::new_v4().to_string();
    let mut mode = ChatMode::Chat;

    println!(
        "{} interactive shell - {} to exit, {} to toggle voice mode",
        config.agent.name.bold(),
        ":quit".cyan(),
        ":voice".cyan()
    );

    let mut editor = DefaultEditor::new().map_err(|e| MnemosError::Internal(e.to_string()))?;
    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == ":quit" || line == ":q" {
                    break;
                }
                if line == ":voice" {
                    mode = match mode {
                        ChatMode::Chat => ChatMode::Voice,
                        ChatMode::Voice => ChatMode::Chat,
                    };
                    println!("mode: {}", mode.to_string().yellow());
                    continue;
                }
                let _ = editor.add_history_entry(line);

                let request = TurnRequest {
                    text: line.to_string(),
                    conversation_id: conversation_id.clone(),
                    user_id: whoami(),
                    mode,
                    message_id: Some(uuid::Uuid::new_v4().to_string()),
                };
                let response = app.agent.route(request, None).await;
                println!("{} {}", "mnemos>".green().bold(), response.response);
                if let Some(error) = response.error {
                    eprintln!("{} {}", "error:".red(), error);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(MnemosError::Internal(format!("readline failed: {e}")));
            }
        }
    }

    println!("draining background work...");
    app.agent.shutdown(Duration::from_secs(5)).await;
    println!(
        "graph: {} entities, {} relations",
        app.store.entity_count().await,
        app.store.relation_count().await
    );
    Ok(())
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "local-user".to_string())
}
