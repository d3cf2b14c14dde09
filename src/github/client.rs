use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::{models, params, Octocrab};
use tracing::{debug, info, warn};

use super::types::{ApiCommit, ApiComparison, CommitInfo, MergeCommit, PullRequestInfo};
use crate::changelog::source::{CommitHistorySource, PullRequestSource};
use crate::error::{ChangelogError, Result};

const PAGE_SIZE: u8 = 100;

pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    pub async fn new(token: String) -> Result<Self> {
        let client = Octocrab::builder().personal_token(token).build()?;
        Ok(Self { client })
    }

    /// Client for a GitHub Enterprise instance or a test server.
    pub async fn with_base_uri(token: Option<String>, base_uri: &str) -> Result<Self> {
        let mut builder = Octocrab::builder().base_uri(base_uri)?;
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Up to `max_tags` tag names, in the order GitHub lists them.
    pub async fn list_tags(&self, owner: &str, repo: &str, max_tags: usize) -> Result<Vec<String>> {
        let mut tags = Vec::new();
        let mut page: u32 = 1;

        while tags.len() < max_tags {
            let items = self
                .client
                .repos(owner, repo)
                .list_tags()
                .per_page(PAGE_SIZE)
                .page(page)
                .send()
                .await?
                .items;

            let exhausted = items.len() < PAGE_SIZE as usize;
            tags.extend(items.into_iter().map(|tag: models::repos::Tag| tag.name));
            if exhausted {
                break;
            }
            page += 1;
        }

        tags.truncate(max_tags);
        Ok(tags)
    }

    /// The tag released right before `to_tag`, searched among the latest `max_tags` tags.
    pub async fn previous_tag(&self, owner: &str, repo: &str, to_tag: &str, max_tags: usize) -> Result<Option<String>> {
        let mut tags = self.list_tags(owner, repo, max_tags).await?;
        debug!("Fetched {} tags", tags.len());
        sort_tags(&mut tags);
        Ok(preceding_tag(&tags, to_tag))
    }

    pub async fn commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitInfo> {
        let commit: ApiCommit = self
            .client
            .get(format!("/repos/{}/{}/commits/{}", owner, repo, sha), None::<&()>)
            .await?;
        Ok(commit.into())
    }

    async fn merge_commit(&self, owner: &str, repo: &str, sha: &str, merged_at: DateTime<Utc>) -> MergeCommit {
        match self.commit(owner, repo, sha).await {
            Ok(commit) => commit.into(),
            Err(e) => {
                // SHA matching still works without the commit details.
                warn!("Could not fetch merge commit {}: {}", sha, e);
                MergeCommit {
                    sha: sha.to_string(),
                    author: None,
                    message: String::new(),
                    summary: String::new(),
                    date: merged_at,
                    author_date: merged_at,
                }
            }
        }
    }
}

fn tag_version(tag: &str) -> Option<semver::Version> {
    semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// Orders version tags newest first; other tags follow in their listed order.
fn sort_tags(tags: &mut [String]) {
    tags.sort_by_cached_key(|tag| Reverse(tag_version(tag)));
}

/// GitHub answers 404 for unknown refs and 422 for refs without shared history.
fn is_unresolvable_ref(message: &str) -> bool {
    message.contains("Not Found") || message.contains("No common ancestor")
}

fn preceding_tag(tags: &[String], to_tag: &str) -> Option<String> {
    let position = tags.iter().position(|t| t == to_tag)?;
    tags.get(position + 1).cloned()
}

fn logins(authors: Option<Vec<models::Author>>) -> Vec<String> {
    authors
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.login)
        .collect()
}

#[async_trait]
impl CommitHistorySource for GitHubClient {
    async fn diff(&self, owner: &str, repo: &str, from_ref: &str, to_ref: &str) -> Result<Vec<CommitInfo>> {
        let route = format!("/repos/{}/{}/compare/{}...{}", owner, repo, from_ref, to_ref);
        let result: octocrab::Result<ApiComparison> = self.client.get(route, None::<&()>).await;

        match result {
            Ok(comparison) => {
                if comparison.total_commits > comparison.commits.len() {
                    warn!(
                        "Comparison of {}...{} lists {} of {} commits, later changes are missing",
                        from_ref,
                        to_ref,
                        comparison.commits.len(),
                        comparison.total_commits
                    );
                }
                Ok(comparison.commits.into_iter().map(CommitInfo::from).collect())
            }
            Err(octocrab::Error::GitHub { source, .. }) if is_unresolvable_ref(&source.message) => {
                Err(ChangelogError::RefResolution {
                    from: from_ref.to_string(),
                    to: to_ref.to_string(),
                    reason: source.message,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn between_dates(
        &self,
        owner: &str,
        repo: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<PullRequestInfo>> {
        let mut merged = Vec::new();
        let mut page: u32 = 1;

        'pages: loop {
            let items = self
                .client
                .pulls(owner, repo)
                .list()
                .state(params::State::Closed)
                .sort(params::pulls::Sort::Updated)
                .direction(params::Direction::Descending)
                .per_page(PAGE_SIZE)
                .page(page)
                .send()
                .await?
                .items;
            let exhausted = items.len() < PAGE_SIZE as usize;

            for pr in items {
                // Sorted by last update; a pull request merged in the window was updated after it opened.
                if pr.updated_at.map_or(false, |updated| updated < from) {
                    break 'pages;
                }

                let (Some(merged_at), Some(sha)) = (pr.merged_at, pr.merge_commit_sha.clone()) else {
                    continue;
                };
                if merged_at < from || merged_at > to {
                    continue;
                }

                let merge_commit = self.merge_commit(owner, repo, &sha, merged_at).await;
                merged.push(PullRequestInfo {
                    number: pr.number,
                    title: pr.title.unwrap_or_default(),
                    html_url: pr.html_url.map(|url| url.to_string()),
                    merged_at,
                    author: pr.user.map(|user| user.login),
                    labels: pr
                        .labels
                        .unwrap_or_default()
                        .into_iter()
                        .map(|label| label.name)
                        .collect(),
                    milestone: pr.milestone.map(|milestone| milestone.title),
                    body: pr.body,
                    assignees: logins(pr.assignees),
                    requested_reviewers: logins(pr.requested_reviewers),
                    merge_commit: Some(merge_commit),
                });

                if merged.len() >= max_count {
                    break 'pages;
                }
            }

            if exhausted {
                break;
            }
            page += 1;
        }

        info!(
            "Found {} pull requests merged between {} and {}",
            merged.len(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COMPARISON: &str = r#"{
        "status": "ahead",
        "commits": [
            {
                "sha": "a1",
                "commit": {
                    "message": "Initial",
                    "author": { "name": "jane", "date": "2024-01-01T12:00:00Z" },
                    "committer": { "name": "jane", "date": "2024-01-01T12:00:00Z" }
                }
            },
            {
                "sha": "a2",
                "commit": {
                    "message": "Merge pull request #42 from acme/x\n\nAdd X",
                    "author": { "name": "jane", "date": "2024-01-05T12:00:00Z" },
                    "committer": { "name": "GitHub", "date": "2024-01-05T12:00:00Z" }
                }
            }
        ]
    }"#;

    #[test]
    fn finds_preceding_tag() {
        let tags: Vec<String> = ["v1.2.0", "v1.1.0", "v1.0.0"].iter().map(|t| t.to_string()).collect();

        assert_eq!(preceding_tag(&tags, "v1.2.0"), Some("v1.1.0".to_string()));
        assert_eq!(preceding_tag(&tags, "v1.0.0"), None);
        assert_eq!(preceding_tag(&tags, "v9.9.9"), None);
    }

    #[test]
    fn sorts_tags_by_version() {
        let mut tags: Vec<String> = ["v1.9.0", "v1.10.0", "nightly", "v1.1.0", "2.0.0-rc.1"]
            .iter()
            .map(|t| t.to_string())
            .collect();

        sort_tags(&mut tags);

        assert_eq!(tags, vec!["2.0.0-rc.1", "v1.10.0", "v1.9.0", "v1.1.0", "nightly"]);
        assert_eq!(preceding_tag(&tags, "v1.10.0"), Some("v1.9.0".to_string()));
    }

    #[tokio::test]
    async fn diff_reads_compare_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/app/compare/v1.0.0...v1.1.0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(COMPARISON)
            .create_async()
            .await;

        let client = GitHubClient::with_base_uri(None, &server.url()).await.unwrap();
        let commits = client.diff("acme", "app", "v1.0.0", "v1.1.0").await.unwrap();

        mock.assert_async().await;
        let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a1", "a2"]);
        assert_eq!(commits[1].summary, "Merge pull request #42 from acme/x");
        assert_eq!(commits[1].author.as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn unknown_ref_is_a_resolution_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/app/compare/v0.0.0...v1.1.0")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "message": "Not Found", "documentation_url": "https://docs.github.com/rest" }"#)
            .create_async()
            .await;

        let client = GitHubClient::with_base_uri(None, &server.url()).await.unwrap();
        let result = client.diff("acme", "app", "v0.0.0", "v1.1.0").await;

        match result {
            Err(ChangelogError::RefResolution { from, to, reason }) => {
                assert_eq!(from, "v0.0.0");
                assert_eq!(to, "v1.1.0");
                assert_eq!(reason, "Not Found");
            }
            other => panic!("expected a resolution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_credentials_are_not_hidden() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/app/compare/v1.0.0...v1.1.0")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "message": "Bad credentials", "documentation_url": "https://docs.github.com/rest" }"#)
            .create_async()
            .await;

        let client = GitHubClient::with_base_uri(None, &server.url()).await.unwrap();
        let result = client.diff("acme", "app", "v1.0.0", "v1.1.0").await;

        assert!(matches!(result, Err(ChangelogError::GitHub(_))), "got {:?}", result);
    }

    #[tokio::test]
    async fn truncated_comparison_still_returns_listed_commits() {
        let mut server = mockito::Server::new_async().await;
        let body = COMPARISON.replacen(r#""status": "ahead","#, r#""status": "ahead", "total_commits": 300,"#, 1);
        server
            .mock("GET", "/repos/acme/app/compare/v1.0.0...v1.1.0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = GitHubClient::with_base_uri(None, &server.url()).await.unwrap();
        let commits = client.diff("acme", "app", "v1.0.0", "v1.1.0").await.unwrap();

        assert_eq!(commits.len(), 2);
    }

    #[tokio::test]
    async fn fetches_single_commit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/app/commits/a2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "sha": "a2",
                    "commit": {
                        "message": "Add X",
                        "author": { "name": "jane", "date": "2024-01-05T10:00:00Z" },
                        "committer": { "name": "GitHub", "date": "2024-01-05T12:00:00Z" }
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = GitHubClient::with_base_uri(None, &server.url()).await.unwrap();
        let merge = MergeCommit::from(client.commit("acme", "app", "a2").await.unwrap());

        assert_eq!(merge.sha, "a2");
        assert_eq!(merge.message, "Add X");
        assert_eq!(merge.date.to_rfc3339(), "2024-01-05T12:00:00+00:00");
        assert_eq!(merge.author_date.to_rfc3339(), "2024-01-05T10:00:00+00:00");
    }
}
