pub mod client;
pub mod mock;

use crate::error::Result;
use crate::model::PrState;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use client::{resolve_token, RestClient, DEFAULT_API_URL};
pub use mock::MockGitHub;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSignature {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    pub message: String,
    pub author: Option<GitSignature>,
    pub committer: Option<GitSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitPayload,
}

impl CommitSummary {
    /// Authorship time, falling back to the committer when the author is absent.
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .or(self.commit.committer.as_ref())
            .map(|sig| sig.date)
    }

    pub fn short_sha(&self) -> String {
        self.sha.chars().take(7).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitTotals {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitStatsResponse {
    pub stats: Option<CommitTotals>,
    #[serde(default)]
    pub files: Vec<ChangedFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub html_url: String,
    pub repository_url: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub pull_request: Option<PullRequestRef>,
}

impl SearchItem {
    /// Repository name is the last path segment of `repository_url`.
    pub fn repository_name(&self) -> &str {
        self.repository_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.pull_request.as_ref().and_then(|pr| pr.merged_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
}

/// The slice of the GitHub REST API the tracker depends on.
pub trait GitHubApi {
    fn authenticated_user(&self) -> Result<User>;

    /// Repositories where the user is owner, collaborator, or organization member.
    fn list_repositories(&self) -> Result<Vec<Repository>>;

    fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>>;

    fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitStatsResponse>;

    /// Issue/PR search with the raw `q` string, all pages.
    fn search_issues(&self, query: &str) -> Result<Vec<SearchItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_item_parses_pull_request_payload() {
        let raw = r#"{
            "number": 42,
            "title": "Add calendar view",
            "state": "closed",
            "html_url": "https://github.com/octo/dash/pull/42",
            "repository_url": "https://api.github.com/repos/octo/dash",
            "created_at": "2024-01-15T10:00:00Z",
            "closed_at": "2024-01-16T09:00:00Z",
            "comments": 3,
            "labels": [{"name": "feature"}, {"name": "ui"}],
            "pull_request": {"merged_at": "2024-01-16T09:00:00Z"}
        }"#;
        let item: SearchItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.repository_name(), "dash");
        assert_eq!(item.state, PrState::Closed);
        assert!(item.merged_at().is_some());
        assert_eq!(item.labels.len(), 2);
    }

    #[test]
    fn commit_summary_falls_back_to_committer_date() {
        let raw = r#"{
            "sha": "0123456789abcdef",
            "html_url": "https://github.com/octo/dash/commit/0123456789abcdef",
            "commit": {
                "message": "init",
                "author": null,
                "committer": {"date": "2024-01-15T10:00:00Z"}
            }
        }"#;
        let commit: CommitSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(commit.short_sha(), "0123456");
        assert_eq!(commit.authored_at().unwrap().to_rfc3339(), "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn commit_stats_tolerates_missing_fields() {
        let stats: CommitStatsResponse = serde_json::from_str("{}").unwrap();
        assert!(stats.stats.is_none());
        assert!(stats.files.is_empty());
    }
}
