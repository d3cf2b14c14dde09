use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::github::types::{CommitInfo, PullRequestInfo};

/// Commit history between two references.
#[async_trait]
pub trait CommitHistorySource: Send + Sync {
    /// Commits reachable from `to_ref` but not from `from_ref`, oldest first.
    ///
    /// Fails with `ChangelogError::RefResolution` when either reference is unknown.
    async fn diff(
        &self,
        owner: &str,
        repo: &str,
        from_ref: &str,
        to_ref: &str,
    ) -> Result<Vec<CommitInfo>>;
}

/// Merged pull requests of a repository.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Pull requests merged within `[from, to]`, at most `max_count` of them.
    async fn between_dates(
        &self,
        owner: &str,
        repo: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<PullRequestInfo>>;

    /// Drops merge commits whose source branch matches one of `exclude_patterns`.
    fn filter_commits(&self, commits: Vec<CommitInfo>, exclude_patterns: &[String]) -> Vec<CommitInfo> {
        filter_merge_branches(commits, exclude_patterns)
    }
}

enum BranchPattern {
    Regex(Regex),
    Literal(String),
}

impl BranchPattern {
    fn parse(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => BranchPattern::Regex(re),
            Err(_) => BranchPattern::Literal(pattern.to_string()),
        }
    }

    fn is_match(&self, branch: &str) -> bool {
        match self {
            BranchPattern::Regex(re) => re.is_match(branch),
            BranchPattern::Literal(literal) => branch.contains(literal.as_str()),
        }
    }
}

/// Source branch of a merge commit summary, if the summary is one.
///
/// Understands `Merge pull request #12 from owner/branch` and `Merge branch 'branch'`.
pub fn merged_branch(summary: &str) -> Option<&str> {
    if let Some(rest) = summary.strip_prefix("Merge pull request #") {
        let (_, source) = rest.split_once(" from ")?;
        let source = source.split_whitespace().next()?;
        // `owner/branch`; the branch itself may contain slashes
        return Some(source.split_once('/').map_or(source, |(_, branch)| branch));
    }

    let rest = summary.strip_prefix("Merge branch '")?;
    rest.split_once('\'').map(|(branch, _)| branch)
}

pub fn filter_merge_branches(commits: Vec<CommitInfo>, exclude_patterns: &[String]) -> Vec<CommitInfo> {
    if exclude_patterns.is_empty() {
        return commits;
    }

    let patterns: Vec<BranchPattern> = exclude_patterns.iter().map(|p| BranchPattern::parse(p)).collect();

    commits
        .into_iter()
        .filter(|commit| match merged_branch(&commit.summary) {
            Some(branch) if patterns.iter().any(|p| p.is_match(branch)) => {
                debug!(sha = %commit.sha, branch, "Excluding merge from excluded branch");
                false
            }
            _ => true,
        })
        .collect()
}
