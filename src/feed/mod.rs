pub mod gnews;
pub mod news_api;
pub mod twitter;
pub mod types;

use crate::config::Settings;
use crate::dataset::{self, Article};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait ArticleSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, query: &str) -> Result<Vec<Article>>;
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    /// (source name, articles returned) for every source that answered.
    pub per_source: Vec<(String, usize)>,
    pub failed_sources: Vec<String>,
    /// Articles written after de-duplication.
    pub total: usize,
}

/// Queries every source for a topic and persists the merged raw dataset.
pub struct Collector {
    sources: Vec<Box<dyn ArticleSource>>,
}

impl Collector {
    pub fn new(sources: Vec<Box<dyn ArticleSource>>) -> Self {
        Self { sources }
    }

    /// NewsAPI, GNews and Twitter sharing one HTTP client.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let src = &settings.config.sources;
        let creds = &settings.credentials;
        let client = Client::builder()
            .timeout(Duration::from_millis(src.request_timeout_ms))
            .pool_max_idle_per_host(4)
            .build()
            .context("failed to build HTTP client")?;

        let collector = Self::new(vec![
            Box::new(news_api::NewsApi::new(
                client.clone(),
                creds.news_api_key.clone(),
                &src.newsapi_base_url,
                &src.language,
                src.page_size,
            )),
            Box::new(gnews::GNews::new(
                client.clone(),
                creds.gnews_api_key.clone(),
                &src.gnews_base_url,
                &src.language,
                src.page_size,
            )),
            Box::new(twitter::Twitter::new(
                client,
                creds.twitter_bearer_token.clone(),
                &src.twitter_base_url,
                &src.language,
                src.page_size,
            )),
        ]);
        tracing::info!(sources = ?collector.source_names(), "collector ready");
        Ok(collector)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch from all sources concurrently, merge, de-duplicate and write to
    /// `output`. A source that errors is skipped; the pass fails only when no
    /// usable article remains.
    pub async fn run(&self, query: &str, output: &Path) -> Result<CollectionReport> {
        let results = join_all(self.sources.iter().map(|s| s.fetch(query))).await;

        let mut report = CollectionReport::default();
        let mut merged: Vec<Article> = Vec::new();

        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(articles) => {
                    tracing::info!(source = source.name(), count = articles.len(), "source fetched");
                    report.per_source.push((source.name().to_string(), articles.len()));
                    merged.extend(articles);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %format!("{:#}", e), "source failed");
                    report.failed_sources.push(source.name().to_string());
                }
            }
        }

        let articles = dedupe(merged);
        if articles.is_empty() {
            anyhow::bail!(
                "no articles found for {:?} ({} of {} sources failed)",
                query,
                report.failed_sources.len(),
                self.sources.len()
            );
        }

        dataset::write_articles(output, &articles)?;
        report.total = articles.len();
        tracing::info!(total = report.total, path = %output.display(), "raw dataset written");
        Ok(report)
    }
}

/// Drop empty and repeated articles, oldest first. Identity is the URL, or
/// the title when a source gives no URL.
/// Scheme and host compare case-insensitively; path and query do not.
fn url_key(raw: &str) -> String {
    let raw = raw.trim();
    match reqwest::Url::parse(raw) {
        Ok(url) => url.as_str().trim_end_matches('/').to_string(),
        Err(_) => raw.trim_end_matches('/').to_string(),
    }
}

fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Article> = articles
        .into_iter()
        .filter(|a| a.has_text())
        .filter(|a| {
            let key = if a.url.trim().is_empty() {
                format!("title:{}", a.title.trim().to_lowercase())
            } else {
                format!("url:{}", url_key(&a.url))
            };
            seen.insert(key)
        })
        .collect();
    out.sort_by_key(|a| a.published_at);
    out
}
