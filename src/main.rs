use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use krishna_voice::Config;
use krishna_voice::api::ApiServer;

/// Krishna - Hinglish voice companion offering spiritual guidance
#[derive(Parser)]
#[command(name = "krishna", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Port to listen on (overrides KRISHNA_PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Reply to a single utterance and print the answer
    Reply {
        /// What the user said
        text: String,
    },
    /// Run one spoken turn from a recorded audio file
    Converse {
        /// Recording (WAV or WebM)
        audio: PathBuf,
        /// Where to write the spoken reply (MP3)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,krishna_voice=info",
        1 => "info,krishna_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(model = %config.llm.model, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Reply { text } => reply(&config, &text).await,
        Command::Converse { audio, out } => converse(&config, &audio, out.as_deref()).await,
    }
}

async fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let replies = config.reply_service()?;
    let conversation = config.conversation(replies.clone())?;
    let port = port.unwrap_or(config.server.port);

    tracing::info!(port, voice = conversation.is_some(), "starting krishna");

    let server = ApiServer::new(replies, conversation, port);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

async fn reply(config: &Config, text: &str) -> anyhow::Result<()> {
    let replies = config.reply_service()?;
    let reply = replies.respond(text).await;

    tracing::debug!(outcome = ?reply.outcome, "reply produced");
    println!("{}", reply.text);
    Ok(())
}

async fn converse(config: &Config, audio: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let replies = config.reply_service()?;
    let Some(conversation) = config.conversation(replies)? else {
        anyhow::bail!("voice not configured: set OPENAI_API_KEY and ELEVENLABS_API_KEY");
    };

    let recording = tokio::fs::read(audio).await?;
    let turn = conversation.turn(&recording).await?;

    println!("You: {}", turn.transcript);
    println!("Krishna: {}", turn.reply.text);

    match (turn.audio, out) {
        (Some(mp3), Some(path)) => {
            tokio::fs::write(path, &mp3).await?;
            println!("Spoken reply written to {}", path.display());
        }
        (Some(mp3), None) => println!("Got {} bytes of spoken reply (use --out to save)", mp3.len()),
        (None, _) => {
            if let Some(err) = turn.synthesis_error {
                println!("Speech synthesis failed: {err}");
            }
        }
    }

    Ok(())
}
