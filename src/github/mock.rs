use super::{
    ChangedFile, CommitPayload, CommitStatsResponse, CommitSummary, CommitTotals, GitHubApi,
    GitSignature, Label, Owner, PullRequestRef, Repository, SearchItem, User,
};
use crate::error::{Result, TrackerError};
use crate::model::PrState;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory [`GitHubApi`] with canned responses and injectable failures.
#[derive(Default)]
pub struct MockGitHub {
    login: Option<String>,
    repositories: Vec<Repository>,
    /// key: "{owner}/{repo}"
    commits: HashMap<String, Vec<CommitSummary>>,
    failing_commit_lists: HashSet<String>,
    /// key: full sha; a missing entry fails the lookup
    commit_stats: HashMap<String, CommitStatsResponse>,
    /// key: leading qualifier of the query, e.g. "is:pr"
    searches: HashMap<String, Vec<SearchItem>>,
    failing_searches: HashSet<String>,
    /// Every call, in order
    pub calls: Mutex<Vec<String>>,
}

impl MockGitHub {
    pub fn new(login: &str) -> Self {
        Self {
            login: Some(login.to_string()),
            ..Self::default()
        }
    }

    pub fn with_repository(mut self, owner: &str, name: &str) -> Self {
        self.repositories.push(Repository {
            name: name.to_string(),
            owner: Owner {
                login: owner.to_string(),
            },
        });
        self
    }

    pub fn with_commit(mut self, full_name: &str, commit: CommitSummary) -> Self {
        self.commits.entry(full_name.to_string()).or_default().push(commit);
        self
    }

    pub fn with_commit_stats(mut self, sha: &str, additions: u64, deletions: u64, files: usize) -> Self {
        let files = (0..files)
            .map(|i| ChangedFile {
                filename: format!("file{i}.rs"),
            })
            .collect();
        self.commit_stats.insert(
            sha.to_string(),
            CommitStatsResponse {
                stats: Some(CommitTotals { additions, deletions }),
                files,
            },
        );
        self
    }

    pub fn failing_commit_list(mut self, full_name: &str) -> Self {
        self.failing_commit_lists.insert(full_name.to_string());
        self
    }

    pub fn with_search_result(mut self, qualifier: &str, item: SearchItem) -> Self {
        self.searches.entry(qualifier.to_string()).or_default().push(item);
        self
    }

    pub fn failing_search(mut self, qualifier: &str) -> Self {
        self.failing_searches.insert(qualifier.to_string());
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn not_found(what: &str) -> TrackerError {
        TrackerError::GitHub {
            status: 404,
            message: format!("Not Found: {what}"),
        }
    }
}

impl GitHubApi for MockGitHub {
    fn authenticated_user(&self) -> Result<User> {
        self.record("user".to_string());
        self.login
            .clone()
            .map(|login| User { login })
            .ok_or_else(|| TrackerError::GitHub {
                status: 401,
                message: "Bad credentials".to_string(),
            })
    }

    fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.record("repos".to_string());
        Ok(self.repositories.clone())
    }

    fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>> {
        let key = format!("{owner}/{repo}");
        self.record(format!("commits {key} author={author}"));
        if self.failing_commit_lists.contains(&key) {
            return Err(TrackerError::GitHub {
                status: 409,
                message: "Git Repository is empty.".to_string(),
            });
        }
        Ok(self
            .commits
            .get(&key)
            .map(|commits| {
                commits
                    .iter()
                    .filter(|c| c.authored_at().is_some_and(|t| t >= since && t <= until))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitStatsResponse> {
        self.record(format!("commit {owner}/{repo}@{sha}"));
        self.commit_stats
            .get(sha)
            .cloned()
            .ok_or_else(|| Self::not_found(sha))
    }

    fn search_issues(&self, query: &str) -> Result<Vec<SearchItem>> {
        self.record(format!("search {query}"));
        let qualifier = query.split_whitespace().next().unwrap_or_default();
        if self.failing_searches.contains(qualifier) {
            return Err(TrackerError::GitHub {
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }
        Ok(self.searches.get(qualifier).cloned().unwrap_or_default())
    }
}

pub fn commit_summary(sha: &str, authored_at: DateTime<Utc>, message: &str) -> CommitSummary {
    CommitSummary {
        sha: sha.to_string(),
        html_url: format!("https://github.com/commit/{sha}"),
        commit: CommitPayload {
            message: message.to_string(),
            author: Some(GitSignature { date: authored_at }),
            committer: None,
        },
    }
}

pub fn pull_request(
    number: u64,
    repo: &str,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    labels: &[&str],
) -> SearchItem {
    SearchItem {
        number,
        title: format!("PR #{number}"),
        state: if merged_at.is_some() {
            PrState::Closed
        } else {
            PrState::Open
        },
        html_url: format!("https://github.com/octo/{repo}/pull/{number}"),
        repository_url: format!("https://api.github.com/repos/octo/{repo}"),
        created_at,
        closed_at: merged_at,
        comments: 0,
        labels: labels
            .iter()
            .map(|name| Label {
                name: name.to_string(),
            })
            .collect(),
        pull_request: Some(PullRequestRef { merged_at }),
    }
}

pub fn issue(number: u64, repo: &str, created_at: DateTime<Utc>) -> SearchItem {
    SearchItem {
        number,
        title: format!("Issue #{number}"),
        state: PrState::Open,
        html_url: format!("https://github.com/octo/{repo}/issues/{number}"),
        repository_url: format!("https://api.github.com/repos/octo/{repo}"),
        created_at,
        closed_at: None,
        comments: 0,
        labels: Vec::new(),
        pull_request: None,
    }
}
