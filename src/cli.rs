use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "nodesel",
    version,
    about = "Run selector-based rules over JSON syntax trees"
)]
pub struct Args {
    /// Tree files (JSON) or directories to search for `*.json`
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Report nodes matching PATTERN (repeatable); reported as Adhoc/Selector
    #[arg(short, long = "selector", value_name = "PATTERN")]
    pub selectors: Vec<String>,

    /// Run only the specified rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exclude the specified rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub except: Vec<String>,

    /// Enable debug logging (overrides NODESEL_LOG)
    #[arg(long)]
    pub debug: bool,

    /// List enabled rule names, one per line, then exit
    #[arg(long)]
    pub list_rules: bool,

    /// Print each registered selector with its parsed form and type hint, then exit
    #[arg(long)]
    pub explain: bool,

    /// Stop after first file with diagnostics
    #[arg(short = 'F', long)]
    pub fail_fast: bool,
}
