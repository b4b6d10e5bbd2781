use crate::date;
use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub message: String,
    pub repository: String,
    pub url: String,
    pub additions: u64,
    pub deletions: u64,
    pub files_changed: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrDetail {
    pub number: u64,
    pub title: String,
    pub repository: String,
    pub state: PrState,
    pub url: String,
    pub merged: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub comments: u64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityRecord {
    #[serde(with = "date::canonical")]
    pub date: NaiveDate,
    pub commits: u64,
    pub prs: u64,
    pub issues: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub files_changed: u64,
    pub repositories: Vec<String>,
    pub commit_details: Vec<CommitDetail>,
    pub pr_details: Vec<PrDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyActivityRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            commits: 0,
            prs: 0,
            issues: 0,
            lines_added: 0,
            lines_deleted: 0,
            files_changed: 0,
            repositories: Vec::new(),
            commit_details: Vec::new(),
            pr_details: Vec::new(),
            updated_at: None,
        }
    }

    /// Appends `name` unless it was already seen today; keeps first-seen order.
    pub fn touch_repository(&mut self, name: &str) {
        if !self.repositories.iter().any(|r| r == name) {
            self.repositories.push(name.to_string());
        }
    }

    pub fn add_commit(&mut self, detail: CommitDetail) {
        self.commits += 1;
        self.lines_added += detail.additions;
        self.lines_deleted += detail.deletions;
        self.files_changed += detail.files_changed;
        self.touch_repository(&detail.repository);
        self.commit_details.push(detail);
    }

    pub fn add_pr(&mut self, detail: PrDetail) {
        self.prs += 1;
        self.touch_repository(&detail.repository);
        self.pr_details.push(detail);
    }

    pub fn has_activity(&self) -> bool {
        self.commits > 0 || self.prs > 0 || self.issues > 0
    }

    pub fn canonical_date(&self) -> String {
        date::format_canonical(self.date)
    }
}

/// Per-day aggregates for one sync window, iterated in calendar order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    days: BTreeMap<NaiveDate, DailyActivityRecord>,
}

impl DailyStats {
    pub fn seeded(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let days = days
            .into_iter()
            .map(|d| (d, DailyActivityRecord::empty(d)))
            .collect();
        Self { days }
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&DailyActivityRecord> {
        self.days.get(date)
    }

    /// Only days inside the seeded window are returned.
    pub fn get_mut(&mut self, date: &NaiveDate) -> Option<&mut DailyActivityRecord> {
        self.days.get_mut(date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &DailyActivityRecord> {
        self.days.values()
    }

    pub fn into_records(self) -> Vec<DailyActivityRecord> {
        self.days.into_values().collect()
    }
}

impl Serialize for DailyStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, record) in &self.days {
            map.serialize_entry(&date::format_canonical(*day), record)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_commits: u64,
    pub total_prs: u64,
    pub total_issues: u64,
    pub active_working_days: usize,
    pub pr_frequency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutput<'a> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub start: String,
    pub end: String,
    pub days_synced: usize,
    pub message: String,
    pub data: &'a DailyStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub summary: ActivitySummary,
    pub records: Vec<DailyActivityRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub months: Vec<MonthOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(repo: &str, additions: u64) -> CommitDetail {
        CommitDetail {
            sha: "abc1234".to_string(),
            message: "fix".to_string(),
            repository: repo.to_string(),
            url: String::new(),
            additions,
            deletions: 1,
            files_changed: 2,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn add_commit_keeps_counts_and_details_in_step() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut record = DailyActivityRecord::empty(day);
        record.add_commit(commit("api", 10));
        record.add_commit(commit("web", 5));
        record.add_commit(commit("api", 1));

        assert_eq!(record.commits, 3);
        assert_eq!(record.commit_details.len(), 3);
        assert_eq!(record.lines_added, 16);
        assert_eq!(record.lines_deleted, 3);
        assert_eq!(record.files_changed, 6);
        assert_eq!(record.repositories, vec!["api", "web"]);
    }

    #[test]
    fn record_serializes_canonical_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let json = serde_json::to_value(DailyActivityRecord::empty(day)).unwrap();
        assert_eq!(json["date"], "09-03-2024");
        assert!(json.get("updated_at").is_none());

        let back: DailyActivityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.date, day);
    }

    #[test]
    fn daily_stats_serializes_in_calendar_order() {
        let start = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let stats = DailyStats::seeded(date::days_between(start, start + chrono::Days::new(2)));
        let json = serde_json::to_string(&stats).unwrap();
        let first = json.find("31-12-2023").unwrap();
        let last = json.find("02-01-2024").unwrap();
        assert!(first < last);
        assert_eq!(stats.len(), 3);
    }
}
