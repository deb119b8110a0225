use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use docmind::cli::{Cli, Command, MindmapArgs, QuizArgs};
use docmind::chunking::ChunkingConfig;
use docmind::data_dir::DataDir;
use docmind::indexer;
use docmind::llm::{OllamaClient, OllamaConfig};
use docmind::schema::{MindmapNode, Quiz};
use docmind::store::IndexStore;
use docmind::{Assistant, Error, Result};

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("DOCMIND_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Environment variables fill in whatever the command line leaves unset.
fn resolve_config(cli: &Cli) -> OllamaConfig {
    let mut config = OllamaConfig::from_env();
    if let Some(ref url) = cli.ollama_url {
        config.base_url = url.clone();
    }
    if let Some(ref model) = cli.model {
        config.chat_model = model.clone();
    }
    if let Some(ref model) = cli.embed_model {
        config.embed_model = model.clone();
    }
    config
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions(ref args) = cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let store = IndexStore::open(&data_dir.index_db())?;
    let client = OllamaClient::new(resolve_config(&cli));

    match cli.command {
        Command::Index(args) => {
            if !args.dir.is_dir() {
                return Err(Error::Config(format!(
                    "not a directory: {}",
                    args.dir.display()
                )));
            }
            if args.chunk_overlap >= args.chunk_size {
                return Err(Error::Config(
                    "chunk overlap must be smaller than chunk size".into(),
                ));
            }

            let chunking = ChunkingConfig {
                chunk_size: args.chunk_size,
                overlap: args.chunk_overlap,
            };
            let report = indexer::index_directory(
                &client,
                &store,
                &client.config().embed_model,
                &args.dir,
                chunking,
                true,
            )?;
            println!(
                "Indexed {} documents ({} pages, {} chunks)",
                report.documents, report.pages, report.chunks
            );
        }
        Command::Summarize(args) => {
            let assistant =
                Assistant::new(&client, &client, &store).with_top_k(args.top_k);
            println!("{}", assistant.summarize(&args.topic)?);
        }
        Command::Ask(args) => {
            let assistant =
                Assistant::new(&client, &client, &store).with_top_k(args.top_k);
            println!("{}", assistant.answer(&args.query)?);
        }
        Command::Quiz(args) => {
            let assistant =
                Assistant::new(&client, &client, &store).with_top_k(args.top_k);
            cmd_quiz(&assistant, &args)?;
        }
        Command::Mindmap(args) => {
            let assistant =
                Assistant::new(&client, &client, &store).with_top_k(args.top_k);
            cmd_mindmap(&assistant, &args)?;
        }
        Command::Status(args) => {
            cmd_status(&store, &client, &data_dir, args.json)?;
        }
        Command::Completions(_) => {} // handled above
    }

    Ok(())
}

fn cmd_quiz(assistant: &Assistant<'_>, args: &QuizArgs) -> Result<()> {
    match assistant.quiz(&args.topic)? {
        Some(quiz) => print_quiz(&quiz, args)?,
        None => eprintln!(
            "Could not generate a quiz for '{}'; try again or broaden the topic.",
            args.topic
        ),
    }
    Ok(())
}

fn print_quiz(quiz: &Quiz, args: &QuizArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(quiz)?);
        return Ok(());
    }

    for (i, qa) in quiz.questions.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}. {}", i + 1, qa.question);
        if !args.no_answers {
            println!("   {}", qa.answer);
        }
    }
    Ok(())
}

fn cmd_mindmap(assistant: &Assistant<'_>, args: &MindmapArgs) -> Result<()> {
    match assistant.mindmap(&args.topic)? {
        Some(tree) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_tree(&tree, !args.no_descriptions);
            }
        }
        None => eprintln!(
            "Could not build a mindmap for '{}'; try again or broaden the topic.",
            args.topic
        ),
    }
    Ok(())
}

fn print_tree(root: &MindmapNode, descriptions: bool) {
    println!("{}", node_line(root, descriptions));
    print_children(&root.children, "", descriptions);
}

fn print_children(children: &[MindmapNode], prefix: &str, descriptions: bool) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        println!("{prefix}{connector}{}", node_line(child, descriptions));

        let child_prefix = if last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        print_children(&child.children, &child_prefix, descriptions);
    }
}

fn node_line(node: &MindmapNode, descriptions: bool) -> String {
    if descriptions && !node.description.is_empty() {
        format!("{}: {}", node.label, node.description)
    } else {
        node.label.clone()
    }
}

fn cmd_status(
    store: &IndexStore,
    client: &OllamaClient,
    data_dir: &DataDir,
    json: bool,
) -> Result<()> {
    let stats = store.stats()?;
    let models = client.probe().ok();

    if json {
        let value = serde_json::json!({
            "data_dir": data_dir.root().display().to_string(),
            "ollama_url": client.config().base_url,
            "reachable": models.is_some(),
            "chat_model": client.config().chat_model,
            "embed_model": client.config().embed_model,
            "documents": stats.documents,
            "chunks": stats.chunks,
            "index_embed_model": stats.embed_model,
            "dimension": stats.dimension,
        });
        println!("{value}");
        return Ok(());
    }

    println!("Data directory: {}", data_dir.root().display());
    match &models {
        Some(names) => println!(
            "Ollama server: {} ({} models available)",
            client.config().base_url,
            names.len()
        ),
        None => println!(
            "Ollama server: {} (unreachable)",
            client.config().base_url
        ),
    }
    println!("Chat model: {}", client.config().chat_model);
    println!("Embedding model: {}", client.config().embed_model);
    println!("Documents: {}", stats.documents);
    println!("Chunks: {}", stats.chunks);
    if let Some(dim) = stats.dimension {
        println!("Vector dimension: {dim}");
    }
    if let Some(ref indexed_with) = stats.embed_model
        && *indexed_with != client.config().embed_model
    {
        println!(
            "Warning: index was built with '{indexed_with}'; \
             queries will embed with '{}'",
            client.config().embed_model
        );
    }
    Ok(())
}
