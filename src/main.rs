use anyhow::{Context, Result, bail};
use clap::{ArgAction, ArgGroup, Parser};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use docqa_cli::{
    ChatHistory, Command, display_banner, format_history, parse_command, print_help, print_result,
    read_query,
};
use docqa_core::{LLMProvider, PipelineConfig, VectorIndex};
use docqa_groq::GroqClient;
use docqa_rag::{HashEmbedder, LocalVectorIndex, QdrantVectorIndex, RagPipeline};

#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask questions about your indexed PDF documents", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["index", "qdrant_url"])))]
struct Cli {
    /// JSON snapshot of indexed passages
    #[arg(long)]
    index: Option<PathBuf>,

    /// Qdrant server holding the indexed passages
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Qdrant collection name
    #[arg(long, default_value = "documents")]
    collection: String,

    /// Groq model, overrides GROQ_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Answer a single question and exit
    #[arg(short, long)]
    query: Option<String>,

    /// Directory for chat and feedback logs
    #[arg(long, default_value = ".docqa")]
    history_dir: PathBuf,

    /// Judge groundedness from the question and answer only
    #[arg(long)]
    evaluator_without_context: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

type Pipeline = RagPipeline<GroqClient, dyn VectorIndex>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut groq = GroqClient::from_env().context("Groq client configuration failed")?;
    if let Some(model) = &cli.model {
        groq = groq.with_model(model.clone());
    }
    let llm = Arc::new(groq);

    let config = PipelineConfig {
        model_id: llm.model_id().to_string(),
        evaluator_includes_context: !cli.evaluator_without_context,
        timeout: llm.timeout(),
        ..Default::default()
    };
    let model_id = config.model_id.clone();

    let (index, index_description) = open_index(&cli).await?;
    let pipeline: Pipeline = RagPipeline::new(llm, index, config);

    let history = ChatHistory::open(&cli.history_dir)
        .await
        .with_context(|| format!("Cannot open history in {}", cli.history_dir.display()))?;
    let conversation_id = Uuid::new_v4();

    if let Some(query) = &cli.query {
        if query.trim().is_empty() {
            bail!("Query must not be empty");
        }
        ask(&pipeline, &history, conversation_id, query).await?;
        return Ok(());
    }

    display_banner(&index_description, &model_id);

    let mut input_history = Vec::new();
    let mut answered = false;

    loop {
        let line = read_query(&mut input_history)?;

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                continue;
            }
        };

        match command {
            Command::Empty => continue,
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Command::Help => print_help(),
            Command::History => match history.read_chats().await {
                Ok(chats) => print!("{}", format_history(&chats)),
                Err(e) => println!("{} {}", "✗".red(), e),
            },
            Command::Feedback { rating, comment } => {
                if !answered {
                    println!("{}", "Ask a question before leaving feedback".yellow());
                    continue;
                }
                match history.record_feedback(conversation_id, rating, comment).await {
                    Ok(_) => println!("{}", "Thanks for the feedback".green()),
                    Err(e) => println!("{} {}", "✗".red(), e),
                }
            }
            Command::Ask(query) => match ask(&pipeline, &history, conversation_id, &query).await {
                Ok(()) => answered = true,
                Err(e) => println!("{} {:#}", "✗".red(), e),
            },
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_index(cli: &Cli) -> Result<(Arc<dyn VectorIndex>, String)> {
    if let Some(path) = &cli.index {
        let index = LocalVectorIndex::load(path)
            .await
            .context("Failed to load the passage index")?;
        let passages = index.count().await?;
        let description = format!("{} ({} passages)", path.display(), passages);
        return Ok((Arc::new(index), description));
    }

    let Some(url) = &cli.qdrant_url else {
        bail!("Either --index or --qdrant-url is required");
    };

    let api_key = std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty());
    let index = QdrantVectorIndex::connect(
        url,
        api_key,
        cli.collection.clone(),
        Arc::new(HashEmbedder::default()),
    )
    .context("Failed to connect to Qdrant")?;
    let passages = index
        .count()
        .await
        .context("Failed to read the Qdrant collection")?;
    let description = format!("{} / {} ({} passages)", url, index.collection_name(), passages);

    Ok((Arc::new(index), description))
}

async fn ask(pipeline: &Pipeline, history: &ChatHistory, conversation_id: Uuid, query: &str) -> Result<()> {
    println!("{}", "Searching documents...".dimmed());

    let state = pipeline.run(query).await.context("Document search failed")?;
    print_result(&state);

    if let Err(e) = history.record_chat(conversation_id, &state).await {
        warn!(error = %e, "Could not write chat history");
    }

    Ok(())
}
