use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use studymate::commands::CommandHandler;
use studymate::config::RagConfig;
use studymate::providers::traits::{CompletionProvider, EmbeddingProvider};
use studymate::providers::{GroqProvider, OpenAIEmbeddings, OpenAIProvider};
use studymate::{api, Session};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Groq API key (falls back to GROQ_API_KEY)
    #[arg(short, long)]
    api_key: Option<String>,

    /// Documents to ingest at startup
    #[arg(long)]
    load: Vec<String>,

    /// Run the HTTP API instead of the interactive CLI
    #[arg(long)]
    api: bool,

    #[arg(long, default_value = "3000")]
    port: u16,

    /// Override the chunk window size in tokens
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Override the chunk overlap in tokens
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    colored::control::set_override(true);
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = RagConfig::from_env();
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(chunk_overlap) = args.chunk_overlap {
        config.chunk_overlap = chunk_overlap;
    }
    // Invalid chunking parameters must fail here, not at first use.
    config.validate()?;

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAIEmbeddings::from_env()?);
    let generator = build_generator(&args)?;

    if args.api {
        run_api_server(args, embedder, generator, config).await
    } else {
        run_cli_mode(args, embedder, generator, config).await
    }
}

/// Groq is the primary generator; OpenAI chat is the backup when no Groq key
/// is configured.
fn build_generator(
    args: &Args,
) -> Result<Arc<dyn CompletionProvider>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(api_key) = &args.api_key {
        return Ok(Arc::new(GroqProvider::new(api_key.clone())));
    }
    if let Ok(provider) = GroqProvider::from_env() {
        return Ok(Arc::new(provider));
    }
    if let Ok(provider) = OpenAIProvider::from_env() {
        log::info!("GROQ_API_KEY not set, using OpenAI chat completions");
        return Ok(Arc::new(provider));
    }
    Err("No completion provider configured: set GROQ_API_KEY (or pass --api-key) or OPENAI_API_KEY".into())
}

async fn run_cli_mode(
    args: Args,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn CompletionProvider>,
    config: RagConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut command_handler = CommandHandler::new(embedder, generator, config)?;

    println!("{}", "📚 Welcome to StudyMate".bright_yellow().bold());
    println!("{}", "Upload your study materials, ask questions, and learn smarter 🎯".white());

    if !args.load.is_empty() {
        let load_command = format!("load {}", args.load.join(" "));
        if let Err(e) = command_handler.handle_command(&load_command).await {
            println!("{}", e.red());
        }
    }

    command_handler.handle_command("help").await?;

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    loop {
        match rl.readline("❓ ") {
            Ok(line) => {
                let input = line.trim();
                let _ = rl.add_history_entry(input);

                if let Err(e) = command_handler.handle_command(input).await {
                    println!("{}", e.red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    summarize_session(command_handler.session());
    Ok(())
}

fn summarize_session(session: &Session) {
    if !session.history.is_empty() {
        println!(
            "👋 Goodbye! {} question(s) answered this session.",
            session.history.len()
        );
    }
}

async fn run_api_server(
    args: Args,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn CompletionProvider>,
    config: RagConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let host = env::var("STUDYMATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let addr: SocketAddr = format!("{}:{}", host, args.port)
        .parse()
        .map_err(|e| format!("Failed to parse address: {}", e))?;

    println!("Starting StudyMate API on {}", addr);

    let app = api::create_api(embedder, generator, config)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("Server successfully bound to {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
