use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ivn",
    version,
    about = "Batch tooling for the enabling/dependent component workbook"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download PDFs and extract legal citations with inferred sections.
    Citations(CitationsArgs),
    /// Re-normalize an existing citation workbook.
    CleanCitations(CleanCitationsArgs),
    /// Fill missing component URLs and check that every URL resolves.
    CheckUrls(CheckUrlsArgs),
    /// Fill missing component IDs with SHA-256 digests.
    AssignIds(AssignIdsArgs),
    /// Clean component text and merge near-duplicate entries.
    Scrub(ScrubArgs),
    /// Scrape the opening words of executive orders.
    ExecutiveOrders(ExecutiveOrdersArgs),
    /// Draft recommendations for component pairs with a chat model.
    Recommend(RecommendArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CitationsArgs {
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// File with one URL per line; blank lines and `#` comments are ignored.
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    #[arg(long, default_value = "extracted_citations.xlsx")]
    pub output: PathBuf,

    #[arg(long, default_value = "failed_downloads.txt")]
    pub failed_downloads: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,

    #[arg(long, default_value_t = 5.0)]
    pub backoff_factor_secs: f64,

    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 3.0)]
    pub pause_secs: f64,

    #[arg(long, default_value_t = 10)]
    pub toc_pages: usize,

    #[arg(long, default_value_t = 100)]
    pub context_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct CleanCitationsArgs {
    #[arg(long, default_value = "extracted_citations.xlsx")]
    pub input: PathBuf,

    /// Defaults to rewriting the input in place.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckUrlsArgs {
    #[arg(long, default_value = "ivntest.xlsx")]
    pub input: PathBuf,

    #[arg(long, default_value = "ivntest_checked.xlsx")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 100)]
    pub progress_every: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AssignIdsArgs {
    #[arg(long, default_value = "IVN-public-version.xlsx")]
    pub input: PathBuf,

    #[arg(long, default_value = "IVN-public-with-IDs.xlsx")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ScrubArgs {
    #[arg(long, default_value = "ivntest.xlsx")]
    pub input: PathBuf,

    #[arg(long, default_value = "IVN_Dataset_Cleaned.xlsx")]
    pub output: PathBuf,

    /// Minimum similarity (0-100) for two entries to be merged.
    #[arg(long, default_value_t = 90.0)]
    pub score_cutoff: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ExecutiveOrdersArgs {
    #[arg(long, default_value_t = 14147)]
    pub start: u32,

    #[arg(long, default_value_t = 14257)]
    pub end: u32,

    #[arg(long, default_value = "https://www.federalregister.gov/executive-order/")]
    pub base_url: String,

    #[arg(long, default_value = "executive_orders_300_words.xlsx")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 300)]
    pub word_limit: usize,

    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 1.0)]
    pub pause_secs: f64,
}

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    #[arg(long, default_value = "ivntest.xlsx")]
    pub input: PathBuf,

    #[arg(long, default_value = "generated_recommendations.xlsx")]
    pub output: PathBuf,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
    pub endpoint: String,

    #[arg(long, default_value = "gpt-4")]
    pub model: String,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f64,

    #[arg(long, default_value_t = 250)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = 5)]
    pub save_interval: usize,

    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,

    #[arg(long, default_value_t = 60.0)]
    pub rate_limit_cooldown_secs: f64,

    #[arg(long, default_value_t = 30.0)]
    pub api_error_cooldown_secs: f64,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}
