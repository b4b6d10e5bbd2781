use crate::date;
use crate::error::Result;
use crate::model::{ActivitySummary, DailyActivityRecord, MonthOption};
use crate::store::Store;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Stored records within the optional inclusive bounds, newest first.
pub fn list_activity(
    store: &Store,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<DailyActivityRecord>> {
    Ok(filter_records(store.find_all()?, start, end))
}

pub fn filter_records(
    records: Vec<DailyActivityRecord>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<DailyActivityRecord> {
    let mut filtered: Vec<_> = records
        .into_iter()
        .filter(|r| start.map_or(true, |s| r.date >= s))
        .filter(|r| end.map_or(true, |e| r.date <= e))
        .collect();
    filtered.sort_by(|a, b| b.date.cmp(&a.date));
    filtered
}

/// Distinct months present in storage, newest first.
pub fn list_months(store: &Store) -> Result<Vec<MonthOption>> {
    months_from_dates(store.find_dates()?)
}

pub fn months_from_dates(mut dates: Vec<NaiveDate>) -> Result<Vec<MonthOption>> {
    dates.sort_by(|a, b| b.cmp(a));

    let mut seen = HashSet::new();
    let mut months = Vec::new();
    for key in dates.into_iter().map(date::month_key) {
        if seen.insert(key.clone()) {
            let label = date::month_label(&key)?;
            months.push(MonthOption { value: key, label });
        }
    }
    Ok(months)
}

/// Totals plus PRs per active working day (a weekday with at least one commit).
pub fn compute_summary(records: &[DailyActivityRecord]) -> ActivitySummary {
    let total_commits = records.iter().map(|r| r.commits).sum();
    let total_prs: u64 = records.iter().map(|r| r.prs).sum();
    let total_issues = records.iter().map(|r| r.issues).sum();
    let active_working_days = records
        .iter()
        .filter(|r| r.commits > 0 && !date::is_weekend(r.date))
        .count();

    let pr_frequency = if active_working_days == 0 {
        "0.00".to_string()
    } else {
        // halves round up, not to even
        let per_day = total_prs as f64 / active_working_days as f64;
        format!("{:.2}", (per_day * 100.0).round() / 100.0)
    };

    ActivitySummary {
        total_commits,
        total_prs,
        total_issues,
        active_working_days,
        pr_frequency,
    }
}
