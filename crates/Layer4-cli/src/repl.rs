//! Interactive terminal
//!
//! Stdin lines go to the session verbatim (newline-terminated); program output
//! is printed as it arrives. EOF, Ctrl-C, or the server closing ends the session.

use crate::app::App;
use anyhow::Result;
use codexec_foundation::Language;
use codexec_task::{CloseReason, ModeSelector, SessionEvent};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

pub async fn run(app: &App, language: Language) -> Result<()> {
    let mut selector = ModeSelector::new(language);
    selector.enter_interactive()?;

    app.require_login().await?;

    let mut session = app.bridge().start(selector.language()).await?;
    println!("Interactive session started...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(SessionEvent::Output(text)) => {
                    print!("{}", text);
                    stdout.flush()?;
                }
                Some(SessionEvent::Closed(CloseReason::TransportError(reason))) => {
                    eprintln!("\nError: Could not connect to interactive session. ({})", reason);
                    break;
                }
                Some(SessionEvent::Closed(_)) | None => break,
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Err(e) = session.send_input(&format!("{}\n", line)) {
                        eprintln!("\nError: {}", e.user_message());
                        break;
                    }
                }
                Ok(None) => {
                    session.exit();
                    break;
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    session.exit();
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                session.exit();
                break;
            }
        }
    }

    drop(session);
    println!("\nInteractive session closed.");
    Ok(())
}
