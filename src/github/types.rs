use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single commit of the release diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    /// First line of `message`.
    pub summary: String,
    pub message: String,
    pub author: Option<String>,
    /// Committer timestamp.
    pub date: DateTime<Utc>,
    pub author_date: DateTime<Utc>,
}

impl CommitInfo {
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        author: Option<String>,
        date: DateTime<Utc>,
    ) -> Self {
        let message = message.into();
        Self {
            sha: sha.into(),
            summary: summary_of(&message),
            message,
            author,
            date,
            author_date: date,
        }
    }
}

/// The commit created when a pull request was merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeCommit {
    pub sha: String,
    pub author: Option<String>,
    pub message: String,
    pub summary: String,
    pub date: DateTime<Utc>,
    pub author_date: DateTime<Utc>,
}

impl From<CommitInfo> for MergeCommit {
    fn from(commit: CommitInfo) -> Self {
        Self {
            sha: commit.sha,
            author: commit.author,
            message: commit.message,
            summary: commit.summary,
            date: commit.date,
            author_date: commit.author_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// `0` for entries synthesized from raw commits.
    pub number: u64,
    pub title: String,
    pub html_url: Option<String>,
    pub merged_at: DateTime<Utc>,
    pub author: Option<String>,
    pub labels: Vec<String>,
    pub milestone: Option<String>,
    pub body: Option<String>,
    pub assignees: Vec<String>,
    pub requested_reviewers: Vec<String>,
    /// `None` for synthesized entries, which can never be matched by SHA.
    pub merge_commit: Option<MergeCommit>,
}

pub fn summary_of(message: &str) -> String {
    message.lines().next().unwrap_or("").trim().to_string()
}

// Wire representations of the REST endpoints the client reads without typed models.

#[derive(Debug, Deserialize)]
pub struct ApiComparison {
    #[serde(default)]
    pub total_commits: usize,
    pub commits: Vec<ApiCommit>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub commit: ApiCommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommitDetail {
    pub message: String,
    pub author: Option<ApiSignature>,
    pub committer: Option<ApiSignature>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSignature {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl From<ApiCommit> for CommitInfo {
    fn from(commit: ApiCommit) -> Self {
        let detail = commit.commit;
        let author_date = detail.author.as_ref().and_then(|a| a.date);
        let committer_date = detail.committer.as_ref().and_then(|c| c.date);
        let date = committer_date.or(author_date).unwrap_or_else(Utc::now);

        CommitInfo {
            sha: commit.sha,
            summary: summary_of(&detail.message),
            author: detail
                .author
                .and_then(|a| a.name)
                .filter(|name| !name.is_empty()),
            message: detail.message,
            date,
            author_date: author_date.unwrap_or(date),
        }
    }
}
