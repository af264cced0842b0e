//! docrag - Main CLI entry point

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docrag::cli::{Args, Commands};
use docrag::config::RagConfig;
use docrag::embedding::OllamaEmbeddingClient;
use docrag::generation::{GenerationOptions, OllamaGenerationClient, StreamParser};
use docrag::index::{EmbeddingIndex, ProgressFn};
use docrag::ingest::{DocumentIngestor, DocumentSource};
use docrag::pipeline::QueryPipeline;
use docrag::prompt::PromptAssembler;
use docrag::retrieval::{Retriever, SearchParams};
use docrag::retry::RetryPolicy;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(message) = args.validate() {
        eprintln!("{}", message.red());
        std::process::exit(2);
    }

    let config = load_config(&args)?;

    match &args.command {
        Some(Commands::Models) => run_models(&config).await,
        Some(Commands::Config) => run_config(&args, &config),
        None => run_ask(&args, &config).await,
    }
}

/// Load the config file and apply CLI overrides
fn load_config(args: &Args) -> Result<RagConfig> {
    let mut config = match &args.config {
        Some(path) => RagConfig::load_from(path)?,
        None => RagConfig::load()?,
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = &args.model {
        config.models.generate = model.clone();
    }
    if let Some(embed_model) = &args.embed_model {
        config.models.embed = embed_model.clone();
    }
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(max_fragment_chars) = args.max_fragment_chars {
        config.ingest.max_fragment_chars = max_fragment_chars;
    }
    if let Some(overlap_chars) = args.overlap_chars {
        config.ingest.overlap_chars = overlap_chars;
    }

    config.validate()?;
    Ok(config)
}

/// List models installed on the server
async fn run_models(config: &RagConfig) -> Result<()> {
    let client = OllamaGenerationClient::with_config(&config.base_url(), &config.models.generate)?;

    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models installed. Pull one with: ollama pull <model>");
        return Ok(());
    }

    println!("{}", "Installed models:".bold());
    for model in models {
        println!("  {}", model);
    }
    Ok(())
}

/// Show the active configuration
fn run_config(args: &Args, config: &RagConfig) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => RagConfig::config_path()?,
    };

    println!("{} {}", "Config file:".bold(), path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Ingest the document, build the index, and answer the question
async fn run_ask(args: &Args, config: &RagConfig) -> Result<()> {
    let question = args.question.as_deref().expect("validated");
    let source = resolve_source(args.source.as_deref().expect("validated"));
    let verbosity = args.verbosity();

    let generation_options = GenerationOptions {
        temperature: config.generation.temperature,
        top_k: config.generation.top_k,
        top_p: config.generation.top_p,
        num_ctx: config.generation.num_ctx,
        stop: config.generation.stop.clone(),
    };
    let retry = RetryPolicy::with_retries(config.generation.max_retries);

    let generator = OllamaGenerationClient::builder(
        &config.base_url(),
        &config.models.generate,
        generation_options,
        retry.clone(),
        Duration::from_secs(config.generation.timeout_secs),
    )?;

    if !generator.health_check().await? {
        return Err(anyhow!(
            "Ollama is not reachable at {}. Start it with: ollama serve",
            config.base_url()
        ));
    }

    let ingestor = DocumentIngestor::new(
        config.ingest.max_fragment_chars,
        config.ingest.overlap_chars,
    )?;
    let fragments = ingestor.ingest(&source).await?;

    if verbosity.show_progress() {
        eprintln!(
            "{} {} fragments from {}",
            "Ingested".cyan(),
            fragments.len(),
            source.describe()
        );
    }

    let embedder = Arc::new(
        OllamaEmbeddingClient::with_config(&config.base_url(), &config.models.embed)?
            .with_retry(retry),
    );

    let index = build_index(fragments, embedder.as_ref(), verbosity.show_progress()).await?;

    // A short document can yield fewer fragments than the configured top-k
    let top_k = config.retrieval.top_k.min(index.len());

    let retriever = Retriever::with_params(Arc::new(index), embedder, SearchParams { top_k })?;

    let assembler = PromptAssembler::new();
    let pipeline = QueryPipeline::new(retriever, assembler, Arc::new(generator.clone()));

    if args.stream {
        stream_answer(&pipeline, &generator, question, args.show_context).await
    } else {
        print_answer(&pipeline, question, args.show_context).await
    }
}

/// A URL-looking source is fetched; anything else is a file path
fn resolve_source(source: &str) -> DocumentSource {
    if source.starts_with("http://") || source.starts_with("https://") {
        DocumentSource::Url(source.to_string())
    } else {
        DocumentSource::File(PathBuf::from(source))
    }
}

/// Build the index with a progress bar
async fn build_index(
    fragments: Vec<docrag::Fragment>,
    embedder: &dyn docrag::embedding::Embedder,
    show_progress: bool,
) -> Result<EmbeddingIndex> {
    let progress: Option<ProgressFn> = if show_progress {
        let bar = ProgressBar::new(fragments.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                .expect("static template")
                .progress_chars("=> "),
        );
        bar.set_message("Embedding fragments");
        Some(Box::new(move |done, _total| {
            bar.set_position(done as u64);
            if done as u64 == bar.length().unwrap_or(0) {
                bar.finish_and_clear();
            }
        }))
    } else {
        None
    };

    let index = EmbeddingIndex::build_with_progress(fragments, embedder, progress).await?;
    Ok(index)
}

/// Non-streaming answer path
async fn print_answer(pipeline: &QueryPipeline, question: &str, show_context: bool) -> Result<()> {
    let outcome = pipeline.answer_with_context(question).await?;

    if show_context {
        print_context(&outcome.retrieved);
    }

    println!("{}", outcome.answer.text.trim());
    Ok(())
}

/// Streaming answer path: print tokens as the server produces them
async fn stream_answer(
    pipeline: &QueryPipeline,
    generator: &OllamaGenerationClient,
    question: &str,
    show_context: bool,
) -> Result<()> {
    let (prompt, retrieved) = pipeline.assemble_prompt(question).await?;

    if show_context {
        print_context(&retrieved);
    }

    let mut stream = generator.generate_stream(&prompt).await?;
    let mut parser = StreamParser::new();
    let mut stdout = std::io::stdout();

    while let Some(bytes) = stream.next().await {
        for chunk in parser.feed(&bytes?)? {
            write!(stdout, "{}", chunk.response)?;
            stdout.flush()?;
        }
    }
    if let Some(chunk) = parser.finish()? {
        write!(stdout, "{}", chunk.response)?;
    }
    writeln!(stdout)?;

    Ok(())
}

fn print_context(retrieved: &[docrag::ScoredFragment]) {
    eprintln!("{}", "Retrieved context:".bold());
    for scored in retrieved {
        eprintln!(
            "  {} {}",
            format!("[{:.3}]", scored.score).dimmed(),
            scored.fragment.text.replace('\n', " ")
        );
    }
    eprintln!();
}
