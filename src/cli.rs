use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "docmind",
    about = "A retrieval-augmented study assistant for your documents"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the Ollama base URL
    #[arg(long, global = true)]
    pub ollama_url: Option<String>,

    /// Override the chat model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Override the embedding model name
    #[arg(long, global = true)]
    pub embed_model: Option<String>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index the PDF files under a directory (replaces the index)
    Index(IndexArgs),
    /// Summarize what the indexed documents say about a topic
    Summarize(SummarizeArgs),
    /// Answer a question from the indexed documents
    Ask(AskArgs),
    /// Generate a quiz about a topic
    Quiz(QuizArgs),
    /// Arrange the concepts of a topic into a mindmap
    Mindmap(MindmapArgs),
    /// Show index statistics and server reachability
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index --

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Directory to scan for PDF files
    pub dir: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = crate::chunking::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[arg(long, default_value_t = crate::chunking::DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,
}

// -- Summarize --

#[derive(Debug, Parser)]
pub struct SummarizeArgs {
    /// Topic to summarize
    pub topic: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = crate::retriever::DEFAULT_TOP_K)]
    pub top_k: usize,
}

// -- Ask --

#[derive(Debug, Parser)]
pub struct AskArgs {
    /// The question to answer
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = crate::retriever::DEFAULT_TOP_K)]
    pub top_k: usize,
}

// -- Quiz --

#[derive(Debug, Parser)]
pub struct QuizArgs {
    /// Topic the quiz questions must relate to
    pub topic: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = crate::retriever::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Print questions only, without the answers
    #[arg(long)]
    pub no_answers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Mindmap --

#[derive(Debug, Parser)]
pub struct MindmapArgs {
    /// Topic to map
    pub topic: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = crate::retriever::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Hide the per-node descriptions
    #[arg(long)]
    pub no_descriptions: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docmind",
            &mut std::io::stdout(),
        );
    }
}
