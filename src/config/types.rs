use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TAGS_TO_FETCH: usize = 200;
pub const DEFAULT_MAX_PULL_REQUESTS: usize = 200;
pub const DEFAULT_MAX_BACK_TRACK_TIME_DAYS: i64 = 90;

/// Run configuration. Loaded once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub max_tags_to_fetch: usize,
    pub max_pull_requests: usize,
    pub max_back_track_time_days: i64,
    pub exclude_merge_branches: Vec<String>,
    pub sort: Sort,
    pub template: String,
    pub pr_template: String,
    pub empty_template: String,
    /// Evaluated in order, the first category sharing a label with a pull request wins.
    pub categories: Vec<Category>,
    /// Applied in order to every rendered pull request entry.
    pub transformers: Vec<Transformer>,
    pub ignore_labels: Vec<String>,
    pub use_metadata_hash: bool,
    pub fingerprint_timestamp: FingerprintTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub labels: Vec<String>,
}

impl Category {
    pub fn new(title: &str, labels: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn matches(&self, labels: &[String]) -> bool {
        self.labels.iter().any(|l| labels.contains(l))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformer {
    pub pattern: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sort {
    #[default]
    #[serde(rename = "ASC", alias = "asc", alias = "Asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc", alias = "Desc")]
    Desc,
}

/// Which commit timestamp feeds the metadata fingerprint.
///
/// Squash and rebase workflows usually rewrite the committer date while
/// keeping the author date, so `Author` tolerates more history rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintTimestamp {
    #[default]
    Committer,
    Author,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            max_tags_to_fetch: DEFAULT_MAX_TAGS_TO_FETCH,
            max_pull_requests: DEFAULT_MAX_PULL_REQUESTS,
            max_back_track_time_days: DEFAULT_MAX_BACK_TRACK_TIME_DAYS,
            exclude_merge_branches: vec![],
            sort: Sort::Asc,
            template: "${{CHANGELOG}}".to_string(),
            pr_template: "- ${{TITLE}}\n   - PR: #${{NUMBER}}".to_string(),
            empty_template: "- no changes".to_string(),
            categories: vec![
                Category::new("## 🚀 Features", &["feature"]),
                Category::new("## 🐛 Fixes", &["fix", "bug"]),
                Category::new("## 🧪 Tests", &["test"]),
            ],
            transformers: vec![],
            ignore_labels: vec![],
            use_metadata_hash: false,
            fingerprint_timestamp: FingerprintTimestamp::Committer,
        }
    }
}
