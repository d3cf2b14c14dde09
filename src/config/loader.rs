use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use super::types::Configuration;
use crate::error::{ChangelogError, Result};

/// Resolves the run configuration.
///
/// An inline JSON document wins over a file; with neither the defaults are used.
pub fn load(path: Option<&Path>, inline_json: Option<&str>) -> Result<Configuration> {
    let config = match (inline_json, path) {
        (Some(json), _) => {
            info!("Using inline configuration");
            from_json(json)?
        }
        (None, Some(path)) => {
            info!(path = %path.display(), "Loading configuration");
            from_file(path)?
        }
        (None, None) => {
            info!("No configuration provided, using defaults");
            Configuration::default()
        }
    };

    validate(&config)?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

pub fn from_json(json: &str) -> Result<Configuration> {
    Ok(serde_json::from_str(json)?)
}

pub fn from_file(path: &Path) -> Result<Configuration> {
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(toml::from_str(&content)?),
        Some("json") | None => from_json(&content),
        Some(other) => Err(ChangelogError::Config(format!(
            "unsupported configuration format `.{}` (expected .json or .toml)",
            other
        ))),
    }
}

fn validate(config: &Configuration) -> Result<()> {
    if config.max_tags_to_fetch == 0 {
        return Err(ChangelogError::Config("max_tags_to_fetch must be greater than 0".into()));
    }
    if config.max_pull_requests == 0 {
        return Err(ChangelogError::Config("max_pull_requests must be greater than 0".into()));
    }
    if config.max_back_track_time_days <= 0 {
        return Err(ChangelogError::Config(
            "max_back_track_time_days must be greater than 0".into(),
        ));
    }

    for transformer in &config.transformers {
        Regex::new(&transformer.pattern).map_err(|source| ChangelogError::InvalidPattern {
            pattern: transformer.pattern.clone(),
            source,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Sort;
    use pretty_assertions::assert_eq;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("release-changelog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_without_sources() {
        assert_eq!(load(None, None).unwrap(), Configuration::default());
    }

    #[test]
    fn inline_json_takes_precedence_over_file() {
        let path = temp_file("precedence.json", r#"{ "sort": "DESC" }"#);

        let config = load(Some(&path), Some(r#"{ "max_pull_requests": 10 }"#)).unwrap();

        assert_eq!(config.max_pull_requests, 10);
        assert_eq!(config.sort, Sort::Asc);
    }

    #[test]
    fn reads_toml_by_extension() {
        let path = temp_file(
            "config.toml",
            r###"
max_back_track_time_days = 30
exclude_merge_branches = ["develop"]

[[categories]]
title = "## Docs"
labels = ["docs"]
"###,
        );

        let config = load(Some(&path), None).unwrap();

        assert_eq!(config.max_back_track_time_days, 30);
        assert_eq!(config.exclude_merge_branches, vec!["develop".to_string()]);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].title, "## Docs");
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = temp_file("config.yaml", "sort: ASC");

        assert!(matches!(load(Some(&path), None), Err(ChangelogError::Config(_))));
    }

    #[test]
    fn rejects_invalid_transformer_pattern() {
        let json = r#"{ "transformers": [{ "pattern": "(unclosed", "target": "" }] }"#;

        assert!(matches!(
            load(None, Some(json)),
            Err(ChangelogError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn rejects_zero_bounds() {
        assert!(matches!(
            load(None, Some(r#"{ "max_pull_requests": 0 }"#)),
            Err(ChangelogError::Config(_))
        ));
    }
}
