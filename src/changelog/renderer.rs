use std::collections::HashMap;

use regex::{Captures, Regex};
use tracing::debug;

use crate::config::{Configuration, Sort};
use crate::error::{ChangelogError, Result};
use crate::github::types::PullRequestInfo;

/// Release identity exposed to the global templates.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub owner: String,
    pub repo: String,
    pub from_tag: String,
    pub to_tag: String,
}

impl RenderContext {
    pub fn release_diff_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/compare/{}...{}",
            self.owner, self.repo, self.from_tag, self.to_tag
        )
    }

    fn placeholders(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("OWNER", self.owner.clone()),
            ("REPO", self.repo.clone()),
            ("FROM_TAG", self.from_tag.clone()),
            ("TO_TAG", self.to_tag.clone()),
            ("RELEASE_DIFF", self.release_diff_url()),
        ])
    }
}

pub trait ChangelogRenderer: Send + Sync {
    /// Classifies `pull_requests` into the configured categories and renders the document.
    fn render(
        &self,
        pull_requests: &[PullRequestInfo],
        config: &Configuration,
        context: &RenderContext,
    ) -> Result<String>;

    /// Document for a release without any entry.
    fn render_empty(&self, config: &Configuration, context: &RenderContext) -> String {
        fill(&config.empty_template, &context.placeholders())
    }
}

/// Renders `${{PLACEHOLDER}}` templates.
#[derive(Debug, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChangelogRenderer for TemplateRenderer {
    fn render(
        &self,
        pull_requests: &[PullRequestInfo],
        config: &Configuration,
        context: &RenderContext,
    ) -> Result<String> {
        let transformers = compile_transformers(config)?;

        let mut included: Vec<&PullRequestInfo> = pull_requests
            .iter()
            .filter(|pr| {
                let ignored = pr.labels.iter().any(|l| config.ignore_labels.contains(l));
                if ignored {
                    debug!(number = pr.number, "Ignoring pull request by label");
                }
                !ignored
            })
            .collect();

        if included.is_empty() {
            return Ok(self.render_empty(config, context));
        }

        match config.sort {
            Sort::Asc => included.sort_by_key(|pr| pr.merged_at),
            Sort::Desc => included.sort_by(|a, b| b.merged_at.cmp(&a.merged_at)),
        }

        let mut sections: Vec<Vec<String>> = vec![Vec::new(); config.categories.len()];
        let mut uncategorized = Vec::new();

        for pr in included {
            let entry = transform(&fill(&config.pr_template, &pull_request_placeholders(pr)), &transformers);
            match config.categories.iter().position(|c| c.matches(&pr.labels)) {
                Some(index) => sections[index].push(entry),
                None => uncategorized.push(entry),
            }
        }

        let categorized_count: usize = sections.iter().map(Vec::len).sum();
        let changelog = config
            .categories
            .iter()
            .zip(&sections)
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(category, entries)| format!("{}\n{}", category.title, entries.join("\n")))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut placeholders = context.placeholders();
        placeholders.insert("CHANGELOG", changelog);
        placeholders.insert("UNCATEGORIZED", uncategorized.join("\n"));
        placeholders.insert("CATEGORIZED_COUNT", categorized_count.to_string());
        placeholders.insert("UNCATEGORIZED_COUNT", uncategorized.len().to_string());

        Ok(fill(&config.template, &placeholders))
    }
}

fn pull_request_placeholders(pr: &PullRequestInfo) -> HashMap<&'static str, String> {
    HashMap::from([
        ("NUMBER", pr.number.to_string()),
        ("TITLE", pr.title.clone()),
        ("URL", pr.html_url.clone().unwrap_or_default()),
        ("MERGED_AT", pr.merged_at.to_rfc3339()),
        ("AUTHOR", pr.author.clone().unwrap_or_default()),
        ("LABELS", pr.labels.join(", ")),
        ("MILESTONE", pr.milestone.clone().unwrap_or_default()),
        ("BODY", pr.body.clone().unwrap_or_default()),
        ("ASSIGNEES", pr.assignees.join(", ")),
        ("REVIEWERS", pr.requested_reviewers.join(", ")),
        (
            "MERGE_SHA",
            pr.merge_commit.as_ref().map(|m| m.sha.clone()).unwrap_or_default(),
        ),
    ])
}

/// Substitutes `${{KEY}}` placeholders. Unknown keys are left as written.
pub fn fill(template: &str, values: &HashMap<&'static str, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{\{([A-Z_]+)\}\}").expect("valid placeholder regex"))
}

fn compile_transformers(config: &Configuration) -> Result<Vec<(Regex, String)>> {
    config
        .transformers
        .iter()
        .map(|t| {
            Regex::new(&t.pattern)
                .map(|re| (re, t.target.clone()))
                .map_err(|source| ChangelogError::InvalidPattern {
                    pattern: t.pattern.clone(),
                    source,
                })
        })
        .collect()
}

fn transform(entry: &str, transformers: &[(Regex, String)]) -> String {
    transformers
        .iter()
        .fold(entry.to_string(), |acc, (re, target)| re.replace_all(&acc, target.as_str()).into_owned())
}
