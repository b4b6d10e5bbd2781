use crate::date;
use crate::model::{ActivityOutput, ActivitySummary, DailyActivityRecord, MonthOption, SCHEMA_VERSION};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use console::style;

pub fn output_activity_json(
    records: Vec<DailyActivityRecord>,
    summary: ActivitySummary,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let output = ActivityOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        start: start.map(date::format_iso),
        end: end.map(date::format_iso),
        summary,
        records,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_activity_ndjson(records: &[DailyActivityRecord]) -> Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn intensity(value: u64, max: u64) -> u32 {
    ((value as f64 / max.max(1) as f64) * 5.0) as u32
}

fn commit_glyph(level: u32) -> &'static str {
    match level {
        0 => " ",
        1 => "▁",
        2 => "▃",
        3 => "▅",
        4 => "▇",
        _ => "█",
    }
}

fn lines_glyph(level: u32) -> &'static str {
    match level {
        0 => " ",
        1 => "░",
        2 => "▒",
        3 => "▓",
        _ => "█",
    }
}

/// Calendar rows with intensities relative to the busiest day shown.
pub fn output_days(records: &[DailyActivityRecord]) {
    let max_commits = records.iter().map(|r| r.commits).max().unwrap_or(1);
    let max_lines = records
        .iter()
        .map(|r| r.lines_added + r.lines_deleted)
        .max()
        .unwrap_or(1);

    for record in records {
        print_day_line(record, max_commits, max_lines);
    }
}

fn print_day_line(record: &DailyActivityRecord, max_commits: u64, max_lines: u64) {
    let lines = record.lines_added + record.lines_deleted;
    let day = format!("{} {}", record.date.format("%a"), date::format_canonical(record.date));
    let day = if date::is_weekend(record.date) {
        style(day).dim()
    } else {
        style(day)
    };

    println!(
        "{} {} {} commits: {:>3}, PRs: {:>2}, issues: {:>2}, {} {}  {}",
        day,
        style(commit_glyph(intensity(record.commits, max_commits))).green(),
        style(lines_glyph(intensity(lines, max_lines))).blue(),
        record.commits,
        record.prs,
        record.issues,
        style(format!("+{:<5}", record.lines_added)).green(),
        style(format!("-{:<5}", record.lines_deleted)).red(),
        style(record.repositories.join(", ")).dim()
    );
}

pub fn output_calendar(
    records: &[DailyActivityRecord],
    summary: &ActivitySummary,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    if records.is_empty() {
        println!("No activity stored for this range. Run `ghtrack sync` first.");
        return Ok(());
    }

    match (start, end) {
        (Some(s), Some(e)) => println!("Activity from {} to {}", s, e),
        (Some(s), None) => println!("Activity since {}", s),
        (None, Some(e)) => println!("Activity until {}", e),
        (None, None) => {}
    }

    println!("{}", style("Daily GitHub Activity").bold());
    println!("{}", "─".repeat(50));
    output_days(records);

    println!("\n{}", style("Summary").bold());
    println!("  Total commits: {}", style(summary.total_commits).cyan());
    println!("  Total PRs: {}", style(summary.total_prs).cyan());
    println!("  Total issues: {}", style(summary.total_issues).cyan());
    println!(
        "  PR frequency: {} per active working day ({} days)",
        style(&summary.pr_frequency).yellow(),
        summary.active_working_days
    );

    println!("\n{}", style("Legend").bold());
    println!("  {} commits intensity", style("▁▃▅▇█").green());
    println!("  {} lines intensity", style("░▒▓█").blue());

    Ok(())
}

fn month_line(month: &MonthOption, current: &str) -> String {
    if month.value == current {
        format!("{}  {} (current)", month.value, month.label)
    } else {
        format!("{}  {}", month.value, month.label)
    }
}

/// `current` is the `YYYY-MM` key of today's month.
pub fn output_months(months: &[MonthOption], current: &str) -> Result<()> {
    if months.is_empty() {
        println!("No months with stored activity");
        return Ok(());
    }
    for month in months {
        let line = month_line(month, current);
        if month.value == current {
            println!("{}", style(line).cyan().bold());
        } else {
            println!("{}", style(line).cyan());
        }
    }
    Ok(())
}

pub fn output_day(record: &DailyActivityRecord) -> Result<()> {
    println!("{}", style(record.date.format("%A, %d-%m-%Y")).bold());
    println!("{}", "─".repeat(50));
    println!(
        "Commits: {}  PRs: {}  Issues: {}  Lines: {} {}  Files: {}",
        style(record.commits).cyan(),
        style(record.prs).cyan(),
        style(record.issues).cyan(),
        style(format!("+{}", record.lines_added)).green(),
        style(format!("-{}", record.lines_deleted)).red(),
        record.files_changed
    );
    if !record.repositories.is_empty() {
        println!("Repositories: {}", record.repositories.join(", "));
    }

    if !record.commit_details.is_empty() {
        println!("\n{}", style("Commits").bold());
        for commit in &record.commit_details {
            println!(
                "  {} {} {:<20} {} {}  {}",
                style(&commit.sha).yellow(),
                commit.timestamp.format("%H:%M"),
                commit.repository,
                style(format!("+{}", commit.additions)).green(),
                style(format!("-{}", commit.deletions)).red(),
                commit.message.lines().next().unwrap_or("")
            );
        }
    }

    if !record.pr_details.is_empty() {
        println!("\n{}", style("Pull requests").bold());
        for pr in &record.pr_details {
            let state = if pr.merged {
                style("merged").magenta()
            } else {
                style(pr.state.as_str()).green()
            };
            let labels = if pr.labels.is_empty() {
                String::new()
            } else {
                format!(" [{}]", pr.labels.join(", "))
            };
            println!(
                "  #{:<5} {:<7} {:<20} {}{}",
                pr.number,
                state,
                pr.repository,
                pr.title,
                style(labels).dim()
            );
        }
    }

    Ok(())
}
