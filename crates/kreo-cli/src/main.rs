//! Kreo CLI - run the backend or chat with a local model from the terminal.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

mod commands;

/// Kreo - a local-first LLM chat client
#[derive(Parser)]
#[command(name = "kreo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ollama server URL (default: KREO_OLLAMA_URL or http://localhost:11434)
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Data directory (default: KREO_DATA_DIR or ~/.kreo)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP backend for the web client
    Serve {
        /// Address to listen on (default: KREO_BIND or 127.0.0.1:3001)
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Skip loading the default model at start
        #[arg(long)]
        no_warm: bool,
    },

    /// Ask a question, streaming the answer
    Ask {
        /// The message to send
        #[arg(required = true)]
        text: Vec<String>,
        /// Continue an existing chat
        #[arg(long)]
        chat: Option<String>,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Attach a file or image
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Your name, as shown to the model
        #[arg(long)]
        user: Option<String>,
    },

    /// Show how a message would be routed
    Route {
        /// The message to classify
        #[arg(required = true)]
        text: Vec<String>,
        /// Model used for the router check
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List models available on the Ollama server
    Models,

    /// Load a model into memory
    Warm {
        /// Model to warm (default: the configured model)
        model: Option<String>,
    },

    /// Teach a fact to the knowledge base
    Learn {
        question: String,
        answer: String,
    },

    /// Search the knowledge base
    Recall {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Manage stored chats
    Chats {
        #[command(subcommand)]
        action: ChatsAction,
    },

    /// Show configuration and store information
    Info,
}

#[derive(Subcommand)]
enum ChatsAction {
    /// List chats grouped by recency
    List,
    /// Print a chat
    Show { id: String },
    /// Delete a chat
    Delete { id: String },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var("KREO_LOG").unwrap_or_else(|_| "warn".to_string())
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let config = commands::load_config(cli.ollama_url, cli.data_dir)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Serve { bind, no_warm } => runtime.block_on(commands::serve::run(config, bind, no_warm)),
        Commands::Ask {
            text,
            chat,
            model,
            file,
            user,
        } => runtime.block_on(commands::ask::run(
            config,
            commands::ask::AskArgs {
                text: text.join(" "),
                chat,
                model,
                file,
                user,
            },
        )),
        Commands::Route { text, model } => {
            runtime.block_on(commands::route::run(config, &text.join(" "), model))
        }
        Commands::Models => runtime.block_on(commands::model::list(config)),
        Commands::Warm { model } => runtime.block_on(commands::model::warm(config, model)),
        Commands::Learn { question, answer } => commands::knowledge::learn(config, &question, &answer),
        Commands::Recall { query } => commands::knowledge::recall(config, &query.join(" ")),
        Commands::Chats { action } => match action {
            ChatsAction::List => commands::chats::list(config),
            ChatsAction::Show { id } => commands::chats::show(config, &id),
            ChatsAction::Delete { id } => commands::chats::delete(config, &id),
        },
        Commands::Info => commands::info::run(config),
    }
}
