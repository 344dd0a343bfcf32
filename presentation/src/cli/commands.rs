//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every provider's answer followed by the final answer
    Full,
    /// Only the final answer
    Answer,
    /// JSON output
    Json,
}

/// CLI arguments for superai
#[derive(Parser, Debug)]
#[command(name = "superai")]
#[command(author, version, about = "Ask several AI providers at once and get one combined answer")]
#[command(long_about = r#"
superai sends one prompt to several AI providers in parallel and combines
their answers into a single response.

Each provider's answer is cleaned and shown as soon as it arrives. Once the
configured trigger is satisfied (by default: DeepSeek and Gemini both
answered), an aggregator model synthesizes the final answer. If synthesis is
impossible the best single answer or an explanatory message is returned.

Configuration files are loaded from (in priority order):
1. SUPERAI_* environment variables
2. --config <path>     Explicit config file
3. ./superai.toml      Project-level config
4. ~/.config/superai/config.toml   Global config

Example:
  superai ask "What's the best way to handle errors in Rust?"
  superai ask -p gpt -p gemini -o json "Compare async runtimes"
  superai serve --bind 0.0.0.0:3000
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Ask every provider one question and print the combined answer
    Ask {
        /// The question to ask
        question: String,

        /// Providers to ask (can be specified multiple times; default: all enabled)
        #[arg(short, long = "provider", value_name = "PROVIDER")]
        providers: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,

        /// Record the turn in history under this user id
        #[arg(long, value_name = "ID")]
        user: Option<String>,
    },

    /// List a user's past turns, newest first
    History {
        /// User id the turns were recorded under
        user: String,

        /// Only show turns from this conversation
        #[arg(short, long)]
        conversation: Option<String>,

        /// Maximum number of turns to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}
