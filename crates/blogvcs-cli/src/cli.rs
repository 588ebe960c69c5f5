use std::net::SocketAddr;
use std::path::PathBuf;

use blogvcs_diff::Granularity;
use clap::{ArgGroup, Args, Parser, Subcommand};

pub const DEFAULT_STORE: &str = ".blogvcs/journal.jsonl";

#[derive(Parser)]
#[command(
    name = "blogvcs",
    about = "blogvcs -- version history, diffs, and reverts for blog posts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Journal file holding documents and versions
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STORE))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum GranularityArg {
    Char,
    Word,
    Line,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Char => Granularity::Char,
            GranularityArg::Word => Granularity::Word,
            GranularityArg::Line => Granularity::Line,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Save a new version of a post (creates the post without --doc)
    Save(SaveArgs),
    /// Show a post's version history, newest first
    Log(LogArgs),
    /// Show a single version
    Show(ShowArgs),
    /// Compare two versions
    Diff(DiffArgs),
    /// Restore an earlier version as the newest one
    Revert(RevertArgs),
    /// List posts, most recently updated first
    Docs(DocsArgs),
    /// Start the HTTP API server
    Serve(ServeArgs),
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "content"])))]
pub struct SaveArgs {
    #[arg(short, long)]
    pub title: String,
    /// Read content from a file (`-` for stdin)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    #[arg(short, long)]
    pub content: Option<String>,
    /// Existing post to update
    #[arg(long)]
    pub doc: Option<String>,
    /// Fail unless the post is still at this revision
    #[arg(long, requires = "doc")]
    pub expect_revision: Option<u64>,
}

#[derive(Args)]
pub struct LogArgs {
    pub doc: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub version: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Source version
    pub a: String,
    /// Target version
    pub b: String,
    /// Print inline HTML markup instead of coloured text
    #[arg(long)]
    pub html: bool,
    #[arg(long, value_enum)]
    pub granularity: Option<GranularityArg>,
}

#[derive(Args)]
pub struct RevertArgs {
    pub doc: String,
    pub version: String,
}

#[derive(Args)]
pub struct DocsArgs {}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}
