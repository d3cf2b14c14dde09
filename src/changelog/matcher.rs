use std::collections::HashSet;

use tracing::{debug, info};

use super::fingerprint;
use crate::config::{Configuration, FingerprintTimestamp};
use crate::github::types::{CommitInfo, PullRequestInfo};

/// How a commit of the release diff is paired with a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// The pull request's merge commit SHA is part of the diff.
    Sha,
    /// The merge commit's author, message and timestamp match a commit of the diff.
    Fingerprint(FingerprintTimestamp),
}

impl MatchStrategy {
    pub fn from_config(config: &Configuration) -> Self {
        if config.use_metadata_hash {
            MatchStrategy::Fingerprint(config.fingerprint_timestamp)
        } else {
            MatchStrategy::Sha
        }
    }

    pub fn commit_key(&self, commit: &CommitInfo) -> String {
        match self {
            MatchStrategy::Sha => commit.sha.clone(),
            MatchStrategy::Fingerprint(timestamp) => fingerprint::of_commit(commit, *timestamp),
        }
    }

    /// `None` when the pull request carries no merge commit to key on.
    pub fn pull_request_key(&self, pull_request: &PullRequestInfo) -> Option<String> {
        let merge = pull_request.merge_commit.as_ref()?;
        match self {
            MatchStrategy::Sha if merge.sha.is_empty() => None,
            MatchStrategy::Sha => Some(merge.sha.clone()),
            MatchStrategy::Fingerprint(timestamp) => Some(fingerprint::of_merge_commit(merge, *timestamp)),
        }
    }
}

pub struct PullRequestMatcher {
    strategy: MatchStrategy,
}

impl PullRequestMatcher {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    /// Keeps the candidates whose merge corresponds to one of `commits`, in candidate order.
    ///
    /// Duplicates among the candidates are not collapsed.
    pub fn matches(&self, commits: &[CommitInfo], candidates: Vec<PullRequestInfo>) -> Vec<PullRequestInfo> {
        if commits.is_empty() {
            return Vec::new();
        }

        let release_keys: HashSet<String> = commits.iter().map(|c| self.strategy.commit_key(c)).collect();
        let candidate_count = candidates.len();

        let matched: Vec<PullRequestInfo> = candidates
            .into_iter()
            .filter(|pr| match self.strategy.pull_request_key(pr) {
                Some(key) if release_keys.contains(&key) => true,
                _ => {
                    debug!(number = pr.number, "Pull request is not part of the release");
                    false
                }
            })
            .collect();

        info!(
            strategy = ?self.strategy,
            "Matched {} of {} pull requests against {} commits",
            matched.len(),
            candidate_count,
            commits.len()
        );
        matched
    }
}
