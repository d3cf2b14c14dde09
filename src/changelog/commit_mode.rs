use crate::github::types::{CommitInfo, PullRequestInfo};

/// Turns every commit into a changelog entry, for repositories not merging through pull requests.
pub fn synthesize(commits: &[CommitInfo]) -> Vec<PullRequestInfo> {
    commits
        .iter()
        .map(|commit| PullRequestInfo {
            number: 0,
            title: commit.summary.clone(),
            html_url: None,
            merged_at: commit.date,
            author: commit.author.clone(),
            labels: vec![],
            milestone: None,
            body: Some(commit.message.clone()),
            assignees: vec![],
            requested_reviewers: vec![],
            merge_commit: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn one_entry_per_commit() {
        let date = Utc.with_ymd_and_hms(2024, 2, 2, 2, 2, 2).unwrap();
        let commits = vec![
            CommitInfo::new("a1", "Add X\n\nDetails", Some("jane".into()), date),
            CommitInfo::new("a2", "Fix Y", None, date),
        ];

        let entries = synthesize(&commits);

        assert_eq!(entries.len(), commits.len());
        for (entry, commit) in entries.iter().zip(&commits) {
            assert_eq!(entry.number, 0);
            assert_eq!(entry.title, commit.summary);
            assert_eq!(entry.body.as_deref(), Some(commit.message.as_str()));
            assert_eq!(entry.author, commit.author);
            assert_eq!(entry.merged_at, commit.date);
            assert_eq!(entry.merge_commit, None);
            assert!(entry.labels.is_empty());
            assert_eq!(entry.html_url, None);
        }
        assert_eq!(entries[0].title, "Add X");
    }
}
