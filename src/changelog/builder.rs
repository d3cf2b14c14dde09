use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::commit_mode;
use super::matcher::{MatchStrategy, PullRequestMatcher};
use super::renderer::{ChangelogRenderer, RenderContext, TemplateRenderer};
use super::source::{CommitHistorySource, PullRequestSource};
use super::window;
use crate::config::Configuration;
use crate::error::{ChangelogError, Result};
use crate::github::types::{CommitInfo, PullRequestInfo};

#[derive(Debug, Clone)]
pub struct ReleaseNotesOptions {
    pub owner: String,
    pub repo: String,
    pub from_tag: String,
    pub to_tag: String,
    /// Use raw commits as entries instead of pull requests.
    pub commit_mode: bool,
    /// Abort on unresolvable tags instead of treating the release as empty.
    pub fail_on_error: bool,
    pub configuration: Configuration,
}

impl ReleaseNotesOptions {
    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            from_tag: self.from_tag.clone(),
            to_tag: self.to_tag.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ReleaseNotes {
    pub changelog: String,
    pub pull_requests: Vec<PullRequestInfo>,
}

pub struct ReleaseNotesBuilder {
    history: Arc<dyn CommitHistorySource>,
    pull_requests: Arc<dyn PullRequestSource>,
    renderer: Box<dyn ChangelogRenderer>,
    matcher: PullRequestMatcher,
    options: ReleaseNotesOptions,
}

impl ReleaseNotesBuilder {
    pub fn new(
        history: Arc<dyn CommitHistorySource>,
        pull_requests: Arc<dyn PullRequestSource>,
        options: ReleaseNotesOptions,
    ) -> Self {
        let matcher = PullRequestMatcher::new(MatchStrategy::from_config(&options.configuration));
        Self {
            history,
            pull_requests,
            renderer: Box::new(TemplateRenderer::new()),
            matcher,
            options,
        }
    }

    #[cfg(test)]
    pub fn with_renderer<R: ChangelogRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[cfg(test)]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.matcher = PullRequestMatcher::new(strategy);
        self
    }

    /// The rendered changelog, or `None` when the release has no entries.
    pub async fn pull(&self) -> Result<Option<String>> {
        Ok(self.build().await?.map(|notes| notes.changelog))
    }

    #[instrument(skip(self), fields(owner = %self.options.owner, repo = %self.options.repo))]
    pub async fn build(&self) -> Result<Option<ReleaseNotes>> {
        let options = &self.options;
        let config = &options.configuration;

        let commits = self.fetch_history().await?;
        let Some(window) = window::resolve(&commits, config.max_back_track_time_days) else {
            warn!(
                "No commits found between {} and {}",
                options.from_tag, options.to_tag
            );
            return Ok(None);
        };
        info!(
            "Release window {} - {}",
            window.from.format("%Y-%m-%d %H:%M:%S"),
            window.to.format("%Y-%m-%d %H:%M:%S")
        );

        let commits: Vec<CommitInfo> = commits.into_iter().filter(|c| window.contains(c.date)).collect();
        let commits = self
            .pull_requests
            .filter_commits(commits, &config.exclude_merge_branches);

        let pull_requests = if options.commit_mode {
            info!("Using {} commits as changelog entries", commits.len());
            commit_mode::synthesize(&commits)
        } else if commits.is_empty() {
            Vec::new()
        } else {
            let candidates = self
                .pull_requests
                .between_dates(
                    &options.owner,
                    &options.repo,
                    window.from,
                    window.to,
                    config.max_pull_requests,
                )
                .await?;
            info!("Retrieved {} merged pull requests", candidates.len());
            self.matcher.matches(&commits, candidates)
        };

        if pull_requests.is_empty() {
            warn!(
                "No pull requests found between {} and {}",
                options.from_tag, options.to_tag
            );
            return Ok(None);
        }

        let changelog = self
            .renderer
            .render(&pull_requests, config, &options.render_context())?;

        Ok(Some(ReleaseNotes {
            changelog,
            pull_requests,
        }))
    }

    async fn fetch_history(&self) -> Result<Vec<CommitInfo>> {
        let options = &self.options;
        let result = self
            .history
            .diff(&options.owner, &options.repo, &options.from_tag, &options.to_tag)
            .await;

        match result {
            Ok(commits) => {
                info!(
                    "Found {} commits between {} and {}",
                    commits.len(),
                    options.from_tag,
                    options.to_tag
                );
                Ok(commits)
            }
            Err(e @ ChangelogError::RefResolution { .. }) if !options.fail_on_error => {
                error!("{}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
