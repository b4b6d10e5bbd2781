use super::{
    CommitStatsResponse, CommitSummary, GitHubApi, Repository, SearchItem, SearchPage, User,
};
use crate::error::{Result, TrackerError};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: &str = "100";
const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Blocking GitHub REST client with `Link`-header pagination.
pub struct RestClient {
    http: Client,
    base_url: String,
    token: String,
}

impl RestClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ghtrack/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut request = self.http.get(url).bearer_auth(&self.token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let start = Instant::now();
        let response = request.send()?;
        let status = response.status();
        debug!(
            "[github] GET {} -> {} ({}ms)",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            return Err(TrackerError::GitHub {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(&self.url(path), &[])?;
        Ok(response.json()?)
    }

    /// Follows `rel="next"` links until exhausted, flattening each page with `extract`.
    fn paginate<P, T>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        extract: impl Fn(P) -> Vec<T>,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
    {
        query.push(("per_page", PER_PAGE.to_string()));

        let mut items = Vec::new();
        let mut next = Some(self.url(path));
        let mut first = true;
        while let Some(url) = next.take() {
            let response = if first {
                self.send(&url, &query)?
            } else {
                self.send(&url, &[])?
            };
            first = false;

            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);
            let page: P = response.json()?;
            items.extend(extract(page));
        }
        Ok(items)
    }
}

impl GitHubApi for RestClient {
    fn authenticated_user(&self) -> Result<User> {
        self.get_json("/user")
    }

    fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.paginate(
            "/user/repos",
            vec![("affiliation", "owner,collaborator,organization_member".to_string())],
            |page: Vec<Repository>| page,
        )
    }

    fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>> {
        self.paginate(
            &format!("/repos/{owner}/{repo}/commits"),
            vec![
                ("author", author.to_string()),
                ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ],
            |page: Vec<CommitSummary>| page,
        )
    }

    fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitStatsResponse> {
        self.get_json(&format!("/repos/{owner}/{repo}/commits/{sha}"))
    }

    fn search_issues(&self, query: &str) -> Result<Vec<SearchItem>> {
        self.paginate(
            "/search/issues",
            vec![("q", query.to_string())],
            |page: SearchPage| page.items,
        )
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Explicit token (flag or `GITHUB_TOKEN`) first, then `gh auth token`.
pub fn resolve_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    match std::process::Command::new("gh").args(["auth", "token"]).output() {
        Ok(output) if output.status.success() => {
            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !token.is_empty() {
                debug!("using token from `gh auth token`");
                return Ok(token);
            }
        }
        Ok(output) => warn!(
            "`gh auth token` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => debug!("gh CLI unavailable: {e}"),
    }

    Err(TrackerError::Auth(
        "no GitHub token: pass --token, set GITHUB_TOKEN, or run `gh auth login`".to_string(),
    ))
}
