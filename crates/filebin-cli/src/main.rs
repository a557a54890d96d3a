//! filebin-cli - upload, list, delete and watch files on a filebin server
//!
//! ```bash
//! export FILEBIN_URL=https://bin.example.org FILEBIN_USERNAME=me FILEBIN_PASSWORD=...
//! filebin-cli upload notes.txt screenshot.png
//! filebin-cli list
//! filebin-cli delete abcd1234
//! filebin-cli wait && filebin-cli list
//! ```

use clap::{Parser, Subcommand};
use filebin_cli::{CliError, EventOutcome, FilebinClient, ListedFile};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filebin-cli")]
#[command(about = "Command line client for a filebin server")]
struct Cli {
    /// Server URL
    #[arg(long, env = "FILEBIN_URL", default_value = "http://localhost:8000")]
    url: String,

    /// Basic-auth username
    #[arg(long, env = "FILEBIN_USERNAME")]
    username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "FILEBIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files and print their URLs
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored files
    List,
    /// Delete files by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Wait until a file is added or removed; exits 1 if nothing changed
    Wait,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let client = FilebinClient::new(&cli.url, cli.username, cli.password)?;

    match cli.command {
        Command::Upload { files } => {
            let mut failed = false;
            for file in files {
                match client.upload(&file).await {
                    Ok(url) => println!("{}", url),
                    Err(e) => {
                        eprintln!("{}: {}", file.display(), e);
                        failed = true;
                    }
                }
            }
            Ok(exit_code(!failed))
        }
        Command::List => {
            let files = client.list().await?;
            for line in format_listing(&files) {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { ids } => {
            let mut failed = false;
            for id in ids {
                if let Err(e) = client.delete(&id).await {
                    eprintln!("{}: {}", id, e);
                    failed = true;
                }
            }
            Ok(exit_code(!failed))
        }
        Command::Wait => match client.wait_for_event().await? {
            EventOutcome::Changed => Ok(ExitCode::SUCCESS),
            EventOutcome::TimedOut => Ok(ExitCode::FAILURE),
        },
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn format_listing(files: &[ListedFile]) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            format!(
                "{}  {}  {:>10}  {:<28}  {}",
                file.created_at.format("%Y-%m-%d %H:%M:%S"),
                file.id,
                file.size,
                file.mimetype,
                file.filename
            )
        })
        .collect()
}
