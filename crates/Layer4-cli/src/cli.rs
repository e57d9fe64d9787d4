//! Batch CLI mode: run, submissions, languages

use crate::app::App;
use crate::files::resolve_language;
use anyhow::{anyhow, bail, Context, Result};
use codexec_foundation::{DeliveryMode, Language, SubmitRequest};
use codexec_task::JobPhase;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source code from a file, or stdin for `-`
fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read code from stdin")?;
        return Ok(code);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Submit one file and wait for the result
pub async fn run_once(
    app: &App,
    path: &Path,
    language: Option<Language>,
    stdin: Option<String>,
    stdin_file: Option<PathBuf>,
    delivery: Option<DeliveryMode>,
) -> Result<()> {
    let language = if path == Path::new("-") {
        language.ok_or_else(|| anyhow!("--language is required when reading code from stdin"))?
    } else {
        resolve_language(path, language)?
    };
    let code = read_source(path)?;

    let stdin = match stdin_file {
        Some(file) => Some(
            std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?,
        ),
        None => stdin,
    };

    app.require_login().await?;

    let mut request = SubmitRequest::new(code, language);
    if let Some(input) = stdin {
        request = request.with_stdin(input);
    }

    let controller = app.jobs(delivery);
    debug!("Running {} via {}", language, controller.observer_name());

    let mut handle = controller.spawn(request);
    let mut updates = handle.subscribe();
    let mut last_phase = JobPhase::Idle;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.phase != last_phase {
                    last_phase = snapshot.phase;
                    match &snapshot.id {
                        Some(id) => eprintln!("{} {} ({})", snapshot.phase.symbol(), snapshot.phase, id),
                        None => eprintln!("{} {}", snapshot.phase.symbol(), snapshot.phase),
                    }
                }
                if snapshot.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.abandon();
                bail!("Interrupted; stopped following the job.");
            }
        }
    }

    let snapshot = handle.wait().await?;
    match snapshot.phase {
        JobPhase::Completed => {
            print!("{}", snapshot.display_output());
            if !snapshot.display_output().ends_with('\n') {
                println!();
            }
            Ok(())
        }
        _ => Err(anyhow!(snapshot
            .failure_message()
            .unwrap_or("Execution failed")
            .to_string())),
    }
}

pub async fn submissions(app: &App, limit: usize) -> Result<()> {
    app.require_login().await?;
    let jobs = app.jobs(None).submissions().await?;

    if jobs.is_empty() {
        println!("No submissions yet.");
        return Ok(());
    }

    println!("{:<38} {:<11} {:<12}", "ID", "Status", "Language");
    println!("{}", "-".repeat(62));
    for job in jobs.iter().take(limit) {
        let language = job.language.map(|l| l.display_name()).unwrap_or("-");
        println!("{:<38} {:<11} {:<12}", job.id.as_str(), format!("{:?}", job.status), language);
    }
    if jobs.len() > limit {
        println!("\n... {} more", jobs.len() - limit);
    }
    Ok(())
}

pub fn languages() {
    println!("{:<12} {:<12} {:<11} {}", "Tag", "Name", "File", "Interactive");
    println!("{}", "-".repeat(48));
    for language in Language::ALL {
        println!(
            "{:<12} {:<12} {:<11} {}",
            language.as_str(),
            language.display_name(),
            language.source_file(),
            if language.is_interactive() { "yes" } else { "no" }
        );
    }
}

pub fn starter(language: Language) {
    println!("{}", language.starter_code());
}
