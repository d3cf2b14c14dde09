use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::github::types::PullRequestInfo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Wraps a rendered changelog for output.
pub fn format(
    format: OutputFormat,
    title: &str,
    changelog: &str,
    pull_requests: &[PullRequestInfo],
) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(changelog.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "title": title,
            "changelog": changelog,
            "pull_requests": pull_requests,
        }))?),
        OutputFormat::Html => Ok(to_html(title, changelog)),
    }
}

fn to_html(title: &str, changelog: &str) -> String {
    let parser = pulldown_cmark::Parser::new(changelog);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; }}
        h1, h2, h3 {{ border-bottom: 1px solid #e1e4e8; padding-bottom: 0.3em; }}
    </style>
</head>
<body>
    {}
</body>
</html>"#,
        escape_html(title),
        html
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
