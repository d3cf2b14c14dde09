use sha2::{Digest, Sha256};

use crate::config::FingerprintTimestamp;
use crate::github::types::{CommitInfo, MergeCommit};

/// Content-based commit identity that survives rebases keeping author, message and time.
pub fn fingerprint(author: &str, message: &str, unix_seconds: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(author.as_bytes());
    hasher.update(message.as_bytes());
    hasher.update(unix_seconds.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn of_commit(commit: &CommitInfo, timestamp: FingerprintTimestamp) -> String {
    let date = match timestamp {
        FingerprintTimestamp::Committer => commit.date,
        FingerprintTimestamp::Author => commit.author_date,
    };
    fingerprint(commit.author.as_deref().unwrap_or(""), &commit.message, date.timestamp())
}

pub fn of_merge_commit(merge: &MergeCommit, timestamp: FingerprintTimestamp) -> String {
    let date = match timestamp {
        FingerprintTimestamp::Committer => merge.date,
        FingerprintTimestamp::Author => merge.author_date,
    };
    fingerprint(merge.author.as_deref().unwrap_or(""), &merge.message, date.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn known_digest() {
        // sha256("janefix1700000000")
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"janefix1700000000");
            format!("{:x}", hasher.finalize())
        };

        assert_eq!(fingerprint("jane", "fix", 1_700_000_000), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn deterministic_and_sensitive() {
        let base = fingerprint("jane", "Add X", 1_700_000_000);

        assert_eq!(base, fingerprint("jane", "Add X", 1_700_000_000));
        assert_ne!(base, fingerprint("john", "Add X", 1_700_000_000));
        assert_ne!(base, fingerprint("jane", "Add Y", 1_700_000_000));
        assert_ne!(base, fingerprint("jane", "Add X", 1_700_000_001));
    }

    #[test]
    fn commit_and_merge_commit_agree() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let commit = CommitInfo::new("aaa", "Add X (#42)", Some("jane".into()), date);
        let mut merge = MergeCommit::from(commit.clone());
        merge.sha = "rebased".into();

        assert_eq!(
            of_commit(&commit, FingerprintTimestamp::Committer),
            of_merge_commit(&merge, FingerprintTimestamp::Committer)
        );
    }

    #[test]
    fn timestamp_source_is_selectable() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut commit = CommitInfo::new("aaa", "Add X", Some("jane".into()), date);
        commit.author_date = date - Duration::hours(5);

        assert_ne!(
            of_commit(&commit, FingerprintTimestamp::Committer),
            of_commit(&commit, FingerprintTimestamp::Author)
        );
        assert_eq!(
            of_commit(&commit, FingerprintTimestamp::Author),
            fingerprint("jane", "Add X", commit.author_date.timestamp())
        );
    }
}
