use crate::aggregate::fetch_activity;
use crate::cli::CommonArgs;
use crate::date;
use crate::error::{Result, TrackerError};
use crate::github::{resolve_token, GitHubApi, RestClient};
use crate::model::{DailyStats, SyncOutput, SCHEMA_VERSION};
use crate::report::output::output_days;
use crate::store::Store;
use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_DAYS_BACK: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncWindow {
    /// An explicit ISO range, or `days_back` days up to and including `today`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        days_back: Option<u32>,
        today: NaiveDate,
    ) -> Result<Self> {
        match (start, end) {
            (Some(s), Some(e)) => Ok(Self {
                start: date::parse_iso(s)?,
                end: date::parse_iso(e)?,
            }),
            (None, None) => {
                let back = days_back.unwrap_or(DEFAULT_DAYS_BACK);
                let start = today.checked_sub_days(Days::new(back as u64)).ok_or_else(|| {
                    TrackerError::InvalidDate(format!("{back} days before {today} is out of range"))
                })?;
                Ok(Self { start, end: today })
            }
            _ => Err(TrackerError::InvalidDate(
                "start and end must be given together".to_string(),
            )),
        }
    }
}

pub struct SyncOutcome {
    pub window: SyncWindow,
    pub days_synced: usize,
    pub stats: DailyStats,
}

/// Aggregates the whole window first; storage is only touched once that succeeds.
pub fn run_sync(
    api: &dyn GitHubApi,
    store: &mut Store,
    window: SyncWindow,
    now: DateTime<Utc>,
) -> Result<SyncOutcome> {
    let stats = fetch_activity(api, window.start, window.end)?;
    let records: Vec<_> = stats.records().cloned().collect();
    let days_synced = store.upsert_many(&records, now)?;
    info!("synced {days_synced} days ({} to {})", window.start, window.end);
    Ok(SyncOutcome {
        window,
        days_synced,
        stats,
    })
}

pub fn exec(
    common: CommonArgs,
    start: Option<String>,
    end: Option<String>,
    days_back: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let window = SyncWindow::resolve(start.as_deref(), end.as_deref(), days_back, now.date_naive())
        .context("Failed to resolve sync window")?;

    let token = resolve_token(common.token.as_deref()).context("Failed to find a GitHub token")?;
    let client = RestClient::new(&common.api_url, &token).context("Failed to build GitHub client")?;
    let mut store = Store::open(common.db.as_deref()).context("Failed to open activity database")?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching GitHub activity {} to {}", window.start, window.end));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let outcome = run_sync(&client, &mut store, window, now);
    spinner.finish_and_clear();
    let outcome = outcome.context("Failed to sync GitHub activity")?;

    let message = format!("Synced {} days", outcome.days_synced);
    if json {
        let output = SyncOutput {
            version: SCHEMA_VERSION,
            generated_at: now,
            start: date::format_iso(outcome.window.start),
            end: date::format_iso(outcome.window.end),
            days_synced: outcome.days_synced,
            message,
            data: &outcome.stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", style(message).bold());
        let mut active: Vec<_> = outcome
            .stats
            .records()
            .filter(|r| r.has_activity())
            .cloned()
            .collect();
        if active.is_empty() {
            println!("No activity in this window");
        } else {
            active.reverse();
            output_days(&active);
        }
    }

    Ok(())
}
