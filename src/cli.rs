use clap::Parser;
use vidsum::summarize::DetailLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "vidsum", about = "YouTube video summarizer", version)]
pub struct Cli {
    /// YouTube video URL (starts an interactive session if omitted)
    pub url: Option<String>,

    /// Summary detail level [default: from config, else medium]
    #[arg(short, long, value_enum)]
    pub level: Option<DetailLevel>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Network timeout in seconds for each upstream request
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show progress and configuration details
    #[arg(short, long)]
    pub verbose: bool,
}
