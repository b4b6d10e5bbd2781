use super::{output_activity_json, output_activity_ndjson, output_calendar, output_day, output_months};
use crate::cli::CommonArgs;
use crate::date;
use crate::error::Result;
use crate::model::{MonthsOutput, SCHEMA_VERSION};
use crate::query::{compute_summary, list_activity, list_months};
use crate::store::Store;
use anyhow::Context;
use chrono::{NaiveDate, Utc};

/// Resolves `--month` or `--start`/`--end` into inclusive bounds.
pub fn resolve_bounds(
    start: Option<&str>,
    end: Option<&str>,
    month: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    if let Some(key) = month {
        let (first, last) = date::month_range(key)?;
        return Ok((Some(first), Some(last)));
    }
    let start = start.map(date::parse_iso).transpose()?;
    let end = end.map(date::parse_iso).transpose()?;
    Ok((start, end))
}

pub fn activity(
    common: CommonArgs,
    start: Option<String>,
    end: Option<String>,
    month: Option<String>,
    json: bool,
    ndjson: bool,
) -> anyhow::Result<()> {
    let (start, end) = resolve_bounds(start.as_deref(), end.as_deref(), month.as_deref())
        .context("Failed to resolve date range")?;
    let store = Store::open(common.db.as_deref()).context("Failed to open activity database")?;

    let records = list_activity(&store, start, end).context("Failed to load activity")?;
    let summary = compute_summary(&records);

    if json {
        output_activity_json(records, summary, start, end)?;
    } else if ndjson {
        output_activity_ndjson(&records)?;
    } else {
        output_calendar(&records, &summary, start, end)?;
    }

    Ok(())
}

pub fn months(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let store = Store::open(common.db.as_deref()).context("Failed to open activity database")?;
    let months = list_months(&store).context("Failed to load months")?;

    if json {
        let output = MonthsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            months,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_months(&months, &date::current_month(Utc::now().date_naive()))?;
    }

    Ok(())
}

pub fn show(common: CommonArgs, day: &str, json: bool) -> anyhow::Result<()> {
    let day = date::parse_any(day).context("Failed to parse date")?;
    let store = Store::open(common.db.as_deref()).context("Failed to open activity database")?;
    let record = store.get(day).context("Failed to load day")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    match record {
        Some(record) => output_day(&record)?,
        None => println!("No activity recorded for {}", date::format_canonical(day)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_expands_to_full_range() {
        let bounds = resolve_bounds(None, None, Some("2024-02")).unwrap();
        assert_eq!(bounds, (Some(ymd(2024, 2, 1)), Some(ymd(2024, 2, 29))));
    }

    #[test]
    fn open_ended_bounds() {
        assert_eq!(resolve_bounds(None, None, None).unwrap(), (None, None));
        assert_eq!(
            resolve_bounds(Some("2024-01-05"), None, None).unwrap(),
            (Some(ymd(2024, 1, 5)), None)
        );
    }

    #[test]
    fn bad_bounds_are_rejected() {
        assert!(resolve_bounds(Some("05-01-2024"), None, None).is_err());
        assert!(resolve_bounds(None, None, Some("2024")).is_err());
    }
}
