use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::github::types::CommitInfo;

/// Date range bounding which pull requests belong to a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReleaseWindow {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Computes the window spanned by `commits` (oldest first), narrowed so that it
/// reaches back at most `max_days` from its newest commit.
///
/// Returns `None` for an empty commit list.
pub fn resolve(commits: &[CommitInfo], max_days: i64) -> Option<ReleaseWindow> {
    let first = commits.first()?.date;
    let last = commits.last()?.date;
    // Clock skew between committers can invert the ends of the diff.
    let (mut from, to) = if first <= last { (first, last) } else { (last, first) };

    // A lookback reaching past the representable range never narrows the window.
    let max_from = Duration::try_days(max_days).and_then(|lookback| to.checked_sub_signed(lookback));
    if let Some(max_from) = max_from.filter(|max_from| *max_from > from) {
        info!(
            "Release window exceeds {} days, only considering changes since {}",
            max_days,
            max_from.format("%Y-%m-%d %H:%M:%S")
        );
        from = max_from;
    }

    Some(ReleaseWindow { from, to })
}
