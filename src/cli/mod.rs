use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod export;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8000")]
        port: String,
    },
    /// Fetch every conversation in the inbox and print it as JSON
    Export {
        /// Path to a JSON file with `cookies` and `bearer_token`
        #[arg(long)]
        auth: PathBuf,

        /// Only fetch this conversation
        #[arg(long)]
        conversation_id: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Export {
            auth,
            conversation_id,
        }) => {
            export::run(&auth, conversation_id).await?;
        }
        None => {}
    }

    Ok(())
}
