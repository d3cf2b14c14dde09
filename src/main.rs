use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod changelog;
mod config;
mod error;
mod github;

use changelog::output::{self, OutputFormat};
use changelog::{ChangelogRenderer, ReleaseNotesBuilder, ReleaseNotesOptions, TemplateRenderer};

#[derive(Parser)]
#[command(name = "release-changelog")]
#[command(about = "Build a categorized changelog from the pull requests merged between two tags")]
struct Cli {
    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// Repository as `owner/repo`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Repository owner, overrides `--repository`
    #[arg(long)]
    owner: Option<String>,

    /// Repository name, overrides `--repository`
    #[arg(long)]
    repo: Option<String>,

    /// Tag the release starts from (defaults to the tag preceding `--to-tag`)
    #[arg(long)]
    from_tag: Option<String>,

    /// Tag of the release
    #[arg(long)]
    to_tag: String,

    /// Configuration file (.json or .toml)
    #[arg(short, long)]
    configuration: Option<PathBuf>,

    /// Inline JSON configuration, takes precedence over `--configuration`
    #[arg(long)]
    configuration_json: Option<String>,

    /// Use commits instead of pull requests as changelog entries
    #[arg(long)]
    commit_mode: bool,

    /// Fail instead of producing an empty changelog when a tag cannot be resolved
    #[arg(long)]
    fail_on_error: bool,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, default_value = "markdown")]
    format: OutputFormat,
}

impl Cli {
    fn owner_and_repo(&self) -> Result<(String, String)> {
        let (default_owner, default_repo) = match &self.repository {
            Some(repository) => match repository.split_once('/') {
                Some((owner, repo)) => (Some(owner.to_string()), Some(repo.to_string())),
                None => bail!("repository `{}` is not of the form owner/repo", repository),
            },
            None => (None, None),
        };

        let owner = self.owner.clone().or(default_owner).context("missing --owner or --repository")?;
        let repo = self.repo.clone().or(default_repo).context("missing --repo or --repository")?;
        Ok((owner, repo))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, the changelog to stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (owner, repo) = cli.owner_and_repo()?;
    let configuration = config::loader::load(cli.configuration.as_deref(), cli.configuration_json.as_deref())?;

    let github_client = Arc::new(github::GitHubClient::new(cli.token.clone()).await?);

    let from_tag = match &cli.from_tag {
        Some(tag) => tag.clone(),
        None => github_client
            .previous_tag(&owner, &repo, &cli.to_tag, configuration.max_tags_to_fetch)
            .await?
            .with_context(|| format!("no tag found before `{}`, pass --from-tag", cli.to_tag))?,
    };
    tracing::info!("Building changelog for {}/{} from {} to {}", owner, repo, from_tag, cli.to_tag);

    let options = ReleaseNotesOptions {
        owner,
        repo,
        from_tag,
        to_tag: cli.to_tag.clone(),
        commit_mode: cli.commit_mode,
        fail_on_error: cli.fail_on_error,
        configuration: configuration.clone(),
    };
    let context = options.render_context();

    let builder = ReleaseNotesBuilder::new(github_client.clone(), github_client, options);
    let (changelog, pull_requests) = match builder.build().await? {
        Some(notes) => (notes.changelog, notes.pull_requests),
        None => (TemplateRenderer::new().render_empty(&configuration, &context), Vec::new()),
    };

    let content = output::format(cli.format, &context.to_tag, &changelog, &pull_requests)?;

    if let Some(output_path) = cli.output {
        std::fs::write(&output_path, content)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        eprintln!("Changelog written to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
