use crate::date;
use crate::error::{Result, TrackerError};
use crate::github::{CommitSummary, GitHubApi, Repository, SearchItem};
use crate::model::{CommitDetail, DailyStats, PrDetail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};

/// Builds one record per day in `[start, end]` from the user's GitHub activity.
///
/// Identity and repository listing failures abort; a failing repository,
/// commit lookup, or search only loses its own contribution.
pub fn fetch_activity(api: &dyn GitHubApi, start: NaiveDate, end: NaiveDate) -> Result<DailyStats> {
    let mut stats = DailyStats::seeded(date::days_between(start, end));
    if stats.is_empty() {
        debug!("empty window {start}..{end}, nothing to fetch");
        return Ok(stats);
    }

    let login = api.authenticated_user()?.login;
    info!("aggregating activity for {login} from {start} to {end}");

    let (since, until) = window_bounds(start, end)?;
    let repos = api.list_repositories()?;
    debug!("{} accessible repositories", repos.len());

    for repo in &repos {
        match api.list_commits(&repo.owner.login, &repo.name, &login, since, until) {
            Ok(commits) => {
                for commit in &commits {
                    record_commit(api, &mut stats, repo, commit);
                }
            }
            Err(e) => warn!("Error fetching commits for {}: {e}", repo.name),
        }
    }

    let created = format!("created:{}..{}", date::format_iso(start), date::format_iso(end));

    match api.search_issues(&format!("is:pr author:{login} {created}")) {
        Ok(prs) => {
            for pr in &prs {
                record_pr(&mut stats, pr);
            }
        }
        Err(e) => warn!("Error fetching PRs: {e}"),
    }

    match api.search_issues(&format!("is:issue author:{login} {created}")) {
        Ok(issues) => {
            for issue in &issues {
                if let Some(day) = stats.get_mut(&issue.created_at.date_naive()) {
                    day.issues += 1;
                }
            }
        }
        Err(e) => warn!("Error fetching issues: {e}"),
    }

    Ok(stats)
}

/// Start of the first day through the last second of the final day, UTC.
fn window_bounds(start: NaiveDate, end: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (Some(start_of_day), Some(end_of_day)) =
        (NaiveTime::from_hms_opt(0, 0, 0), NaiveTime::from_hms_opt(23, 59, 59))
    else {
        return Err(TrackerError::Other("invalid day boundary".to_string()));
    };
    Ok((
        start.and_time(start_of_day).and_utc(),
        end.and_time(end_of_day).and_utc(),
    ))
}

fn record_commit(api: &dyn GitHubApi, stats: &mut DailyStats, repo: &Repository, commit: &CommitSummary) {
    let Some(authored_at) = commit.authored_at() else {
        warn!("commit {} in {} has no author date, skipping", commit.sha, repo.name);
        return;
    };
    let Some(day) = stats.get_mut(&authored_at.date_naive()) else {
        return;
    };

    let (additions, deletions, files_changed) =
        match api.get_commit(&repo.owner.login, &repo.name, &commit.sha) {
            Ok(detail) => {
                let totals = detail.stats.unwrap_or_default();
                (totals.additions, totals.deletions, detail.files.len() as u64)
            }
            Err(e) => {
                warn!("Error fetching commit details for {}: {e}", commit.sha);
                (0, 0, 0)
            }
        };

    day.add_commit(CommitDetail {
        sha: commit.short_sha(),
        message: commit.commit.message.clone(),
        repository: repo.name.clone(),
        url: commit.html_url.clone(),
        additions,
        deletions,
        files_changed,
        timestamp: authored_at,
    });
}

fn record_pr(stats: &mut DailyStats, pr: &SearchItem) {
    let Some(day) = stats.get_mut(&pr.created_at.date_naive()) else {
        return;
    };
    let merged_at = pr.merged_at();
    day.add_pr(PrDetail {
        number: pr.number,
        title: pr.title.clone(),
        repository: pr.repository_name().to_string(),
        state: pr.state,
        url: pr.html_url.clone(),
        merged: merged_at.is_some(),
        created_at: pr.created_at,
        closed_at: pr.closed_at,
        merged_at,
        comments: pr.comments,
        labels: pr.labels.iter().map(|l| l.name.clone()).collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::mock::{commit_summary, issue, pull_request};
    use crate::github::MockGitHub;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn quiet_window_still_yields_a_record_per_day() {
        let api = MockGitHub::new("octo").with_repository("octo", "dash");
        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();

        assert_eq!(stats.len(), 5);
        assert!(stats.records().all(|r| !r.has_activity() && r.repositories.is_empty()));
    }

    #[test]
    fn empty_window_makes_no_calls() {
        let api = MockGitHub::new("octo");
        let stats = fetch_activity(&api, ymd(2024, 1, 5), ymd(2024, 1, 1)).unwrap();
        assert!(stats.is_empty());
        assert!(api.recorded_calls().is_empty());
    }

    #[test]
    fn commits_are_grouped_by_authorship_day() {
        let api = MockGitHub::new("octo")
            .with_repository("octo", "dash")
            .with_repository("acme", "api")
            .with_commit("octo/dash", commit_summary("aaaaaaaaaa", at(2024, 1, 2, 9), "first"))
            .with_commit("octo/dash", commit_summary("bbbbbbbbbb", at(2024, 1, 2, 17), "second"))
            .with_commit("acme/api", commit_summary("cccccccccc", at(2024, 1, 2, 12), "third"))
            .with_commit("acme/api", commit_summary("dddddddddd", at(2024, 1, 3, 23), "late"))
            .with_commit_stats("aaaaaaaaaa", 10, 2, 1)
            .with_commit_stats("bbbbbbbbbb", 5, 5, 3)
            .with_commit_stats("cccccccccc", 1, 0, 1)
            .with_commit_stats("dddddddddd", 7, 7, 2);

        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 3)).unwrap();

        let day = stats.get(&ymd(2024, 1, 2)).unwrap();
        assert_eq!(day.commits, 3);
        assert_eq!(day.lines_added, 16);
        assert_eq!(day.lines_deleted, 7);
        assert_eq!(day.files_changed, 5);
        assert_eq!(day.repositories, vec!["dash", "api"]);
        let shas: Vec<_> = day.commit_details.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["aaaaaaa", "bbbbbbb", "ccccccc"]);

        // 23:00 on the last day is still inside the window
        assert_eq!(stats.get(&ymd(2024, 1, 3)).unwrap().commits, 1);
        assert_eq!(stats.get(&ymd(2024, 1, 1)).unwrap().commits, 0);
    }

    #[test]
    fn failed_commit_lookup_still_counts_the_commit() {
        let api = MockGitHub::new("octo")
            .with_repository("octo", "dash")
            .with_commit("octo/dash", commit_summary("deadbeef00", at(2024, 1, 2, 9), "no stats"))
            .with_commit("octo/dash", commit_summary("cafebabe00", at(2024, 1, 2, 10), "stats"))
            .with_commit_stats("cafebabe00", 4, 1, 2);

        let stats = fetch_activity(&api, ymd(2024, 1, 2), ymd(2024, 1, 2)).unwrap();
        let day = stats.get(&ymd(2024, 1, 2)).unwrap();

        assert_eq!(day.commits, 2);
        let failed = &day.commit_details[0];
        assert_eq!(failed.sha, "deadbee");
        assert_eq!((failed.additions, failed.deletions, failed.files_changed), (0, 0, 0));
        assert_eq!(day.lines_added, 4);
        assert_eq!(day.files_changed, 2);
    }

    #[test]
    fn failing_repository_does_not_abort_the_sync() {
        let api = MockGitHub::new("octo")
            .with_repository("octo", "empty")
            .with_repository("octo", "dash")
            .failing_commit_list("octo/empty")
            .with_commit("octo/dash", commit_summary("aaaaaaaaaa", at(2024, 1, 2, 9), "ok"))
            .with_commit_stats("aaaaaaaaaa", 1, 1, 1);

        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 2)).unwrap();
        assert_eq!(stats.get(&ymd(2024, 1, 2)).unwrap().commits, 1);
    }

    #[test]
    fn prs_are_keyed_by_creation_day() {
        let api = MockGitHub::new("octo")
            .with_search_result(
                "is:pr",
                pull_request(12, "dash", at(2024, 1, 1, 8), Some(at(2024, 1, 3, 8)), &["bug", "ui"]),
            )
            .with_search_result("is:pr", pull_request(13, "api", at(2024, 1, 1, 9), None, &[]));

        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 3)).unwrap();
        let day = stats.get(&ymd(2024, 1, 1)).unwrap();

        assert_eq!(day.prs, 2);
        assert_eq!(day.pr_details.len(), 2);
        assert_eq!(day.repositories, vec!["dash", "api"]);
        assert!(day.pr_details[0].merged);
        assert_eq!(day.pr_details[0].labels, vec!["bug", "ui"]);
        assert!(!day.pr_details[1].merged);
        assert_eq!(stats.get(&ymd(2024, 1, 3)).unwrap().prs, 0);
    }

    #[test]
    fn issues_only_bump_the_counter() {
        let api = MockGitHub::new("octo")
            .with_search_result("is:issue", issue(1, "dash", at(2024, 1, 2, 8)))
            .with_search_result("is:issue", issue(2, "dash", at(2024, 1, 2, 9)));

        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 2)).unwrap();
        let day = stats.get(&ymd(2024, 1, 2)).unwrap();
        assert_eq!(day.issues, 2);
        assert!(day.pr_details.is_empty());
        assert!(day.repositories.is_empty());
    }

    #[test]
    fn search_failures_degrade_to_zero() {
        let api = MockGitHub::new("octo")
            .failing_search("is:pr")
            .with_search_result("is:issue", issue(1, "dash", at(2024, 1, 1, 8)));

        let stats = fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 1)).unwrap();
        let day = stats.get(&ymd(2024, 1, 1)).unwrap();
        assert_eq!(day.prs, 0);
        assert_eq!(day.issues, 1);
    }

    #[test]
    fn search_queries_name_user_and_window() {
        let api = MockGitHub::new("octo");
        fetch_activity(&api, ymd(2024, 2, 1), ymd(2024, 2, 29)).unwrap();
        let calls = api.recorded_calls();
        assert!(calls.contains(&"search is:pr author:octo created:2024-02-01..2024-02-29".to_string()));
        assert!(calls.contains(&"search is:issue author:octo created:2024-02-01..2024-02-29".to_string()));
    }

    #[test]
    fn unknown_identity_aborts() {
        let api = MockGitHub::default();
        assert!(fetch_activity(&api, ymd(2024, 1, 1), ymd(2024, 1, 2)).is_err());
    }
}
