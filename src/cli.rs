use crate::github::DEFAULT_API_URL;
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghtrack")]
#[command(about = "Day-by-day tracker for your GitHub commits, pull requests, and issues")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "GHTRACK_DB", help = "Path to activity database")]
    pub db: Option<PathBuf>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token (falls back to `gh auth token`)")]
    pub token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, help = "GitHub REST API base URL")]
    pub api_url: String,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug)")]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch activity from GitHub and store one record per day
    Sync {
        #[arg(long, requires = "end", help = "First day to sync (YYYY-MM-DD)")]
        start: Option<String>,

        #[arg(long, requires = "start", help = "Last day to sync (YYYY-MM-DD)")]
        end: Option<String>,

        #[arg(long, conflicts_with_all = ["start", "end"], help = "Sync this many days back from today [default: 30]")]
        days_back: Option<u32>,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// List stored daily activity, newest first
    Activity {
        #[arg(long, help = "Only days on or after this date (YYYY-MM-DD)")]
        start: Option<String>,

        #[arg(long, help = "Only days on or before this date (YYYY-MM-DD)")]
        end: Option<String>,

        #[arg(long, conflicts_with_all = ["start", "end"], help = "Only days in this month (YYYY-MM)")]
        month: Option<String>,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, conflicts_with = "json", help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// List the months that have stored activity
    Months {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show commits and pull requests for a single day
    Show {
        #[arg(help = "Day to show (YYYY-MM-DD or DD-MM-YYYY)")]
        date: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sync { start, end, days_back, json } => {
                crate::sync::exec(self.common, start, end, days_back, json)
            }
            Commands::Activity { start, end, month, json, ndjson } => {
                crate::report::activity(self.common, start, end, month, json, ndjson)
            }
            Commands::Months { json } => crate::report::months(self.common, json),
            Commands::Show { date, json } => crate::report::show(self.common, &date, json),
        }
    }
}
