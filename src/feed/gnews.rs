use super::types::*;
use super::ArticleSource;
use crate::dataset::{parse_timestamp, Article};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

pub struct GNews {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
    max_results: u32,
}

impl GNews {
    pub fn new(client: Client, api_key: String, base_url: &str, language: &str, max_results: u32) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            max_results: max_results.clamp(1, 100),
        }
    }
}

pub fn parse_gnews_response(json: &str) -> Result<Vec<Article>> {
    let resp: GNewsResponse = serde_json::from_str(json)
        .context("failed to parse GNews response")?;

    let articles = resp
        .articles
        .into_iter()
        .filter_map(|a| {
            let published_at = parse_timestamp(a.published_at.as_deref()?)?;
            Some(Article {
                source: a.source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "GNews".to_string()),
                title: a.title.unwrap_or_default(),
                description: a.description.unwrap_or_default(),
                url: a.url.unwrap_or_default(),
                published_at,
                content: a.content.unwrap_or_default(),
            })
        })
        .collect();

    Ok(articles)
}

#[async_trait]
impl ArticleSource for GNews {
    fn name(&self) -> &str {
        "GNews"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        let url = format!("{}/api/v4/search", self.base_url);
        let max = self.max_results.to_string();

        let resp = self.client.get(&url)
            .query(&[
                ("q", query),
                ("lang", self.language.as_str()),
                ("max", max.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("GNews request failed")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("GNews ({}): {}", status, body);
        }

        parse_gnews_response(&body)
    }
}
