//! codexec CLI - Main entry point

mod account;
mod app;
mod cli;
mod files;
mod repl;

use app::App;
use clap::{Parser, Subcommand};
use codexec_foundation::{ClientConfig, DeliveryMode, Language};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// codexec - write, save, share and run code on a remote execution service
#[derive(Parser, Debug)]
#[command(name = "codexec")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Server base URL (overrides env and config)
    #[arg(long, global = true)]
    server: Option<String>,

    /// API path prefix, e.g. /api
    #[arg(long, global = true)]
    api_prefix: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        /// Prompted when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign in and remember the credential
    Login {
        #[arg(short, long)]
        username: String,
        /// Prompted when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the saved credential
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage saved files
    #[command(subcommand)]
    Files(FilesCommand),
    /// Run a source file as a batch job
    Run {
        /// Source file, or `-` for stdin
        path: PathBuf,
        /// Language tag (inferred from the extension when omitted)
        #[arg(short, long)]
        language: Option<Language>,
        /// Text passed to the program's stdin
        #[arg(long, conflicts_with = "stdin_file")]
        stdin: Option<String>,
        /// File passed to the program's stdin
        #[arg(long)]
        stdin_file: Option<PathBuf>,
        /// Follow status over a push stream
        #[arg(long, conflicts_with = "poll")]
        push: bool,
        /// Follow status by polling
        #[arg(long)]
        poll: bool,
    },
    /// List past submissions
    Submissions {
        /// Number of submissions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Start an interactive session
    Repl {
        #[arg(short, long, default_value = "python")]
        language: Language,
    },
    /// List supported languages
    Languages,
    /// Print the starter template for a language
    Starter { language: Language },
}

#[derive(Subcommand, Debug)]
enum FilesCommand {
    /// List saved files
    List,
    /// Save a local file
    Save {
        path: PathBuf,
        /// Stored filename (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        language: Option<Language>,
    },
    /// Print or download a saved file
    Open {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved file
    Delete { id: String },
    /// Create a share link
    Share { id: String },
    /// Open a share link (no login needed)
    Shared {
        /// Share URL or share id
        link: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        match e.downcast_ref::<codexec_foundation::Error>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // 오프라인 명령
    match &args.command {
        Command::Languages => {
            cli::languages();
            return Ok(());
        }
        Command::Starter { language } => {
            cli::starter(*language);
            return Ok(());
        }
        _ => {}
    }

    // Load configuration
    let mut config = ClientConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        ClientConfig::new()
    });
    if let Some(server) = args.server {
        config = config.server_url(server);
    }
    if let Some(prefix) = args.api_prefix {
        config = config.api_prefix(prefix);
    }
    tracing::debug!("Using server: {:?}", config.server_url);

    let app = App::new(config)?;

    match args.command {
        Command::Register { username, password } => account::register(&app, &username, password).await,
        Command::Login { username, password } => account::login(&app, &username, password).await,
        Command::Logout => account::logout(&app).await,
        Command::Whoami => account::whoami(&app).await,
        Command::Files(command) => match command {
            FilesCommand::List => files::list(&app).await,
            FilesCommand::Save { path, name, language } => files::save(&app, &path, name, language).await,
            FilesCommand::Open { id, output } => files::open(&app, &id, output).await,
            FilesCommand::Delete { id } => files::delete(&app, &id).await,
            FilesCommand::Share { id } => files::share(&app, &id).await,
            FilesCommand::Shared { link, output } => files::shared(&app, &link, output).await,
        },
        Command::Run {
            path,
            language,
            stdin,
            stdin_file,
            push,
            poll,
        } => {
            let delivery = match (push, poll) {
                (true, _) => Some(DeliveryMode::Push),
                (_, true) => Some(DeliveryMode::Poll),
                _ => None,
            };
            cli::run_once(&app, &path, language, stdin, stdin_file, delivery).await
        }
        Command::Submissions { limit } => cli::submissions(&app, limit).await,
        Command::Repl { language } => repl::run(&app, language).await,
        Command::Languages | Command::Starter { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_run() {
        let args = Args::try_parse_from(["codexec", "run", "main.py", "--push", "--stdin", "3"]).unwrap();
        match args.command {
            Command::Run { path, push, poll, stdin, .. } => {
                assert_eq!(path, PathBuf::from("main.py"));
                assert!(push);
                assert!(!poll);
                assert_eq!(stdin.as_deref(), Some("3"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_reject_unknown_language() {
        assert!(Args::try_parse_from(["codexec", "repl", "--language", "ruby"]).is_err());
        assert!(Args::try_parse_from(["codexec", "run", "a.py", "--push", "--poll"]).is_err());
    }

    #[test]
    fn test_files_subcommand() {
        let args = Args::try_parse_from(["codexec", "--server", "http://h:8000", "files", "share", "7"]).unwrap();
        assert_eq!(args.server.as_deref(), Some("http://h:8000"));
        assert!(matches!(args.command, Command::Files(FilesCommand::Share { ref id }) if id == "7"));
    }
}
