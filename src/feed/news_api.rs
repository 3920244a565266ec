use super::types::*;
use super::ArticleSource;
use crate::dataset::{parse_timestamp, Article};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// NewsAPI replaces takedown-requested articles with this placeholder.
const REMOVED_MARKER: &str = "[Removed]";

pub struct NewsApi {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
    page_size: u32,
}

impl NewsApi {
    pub fn new(client: Client, api_key: String, base_url: &str, language: &str, page_size: u32) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            page_size: page_size.clamp(1, 100),
        }
    }
}

pub fn parse_newsapi_response(json: &str) -> Result<Vec<Article>> {
    let resp: NewsApiResponse = serde_json::from_str(json)
        .context("failed to parse NewsAPI response")?;
    if resp.status != "ok" {
        anyhow::bail!(
            "NewsAPI returned status {}: {}",
            resp.status,
            resp.message.unwrap_or_default()
        );
    }

    let articles = resp
        .articles
        .into_iter()
        .filter(|a| a.title.as_deref() != Some(REMOVED_MARKER))
        .filter_map(|a| {
            let published_at = parse_timestamp(a.published_at.as_deref()?)?;
            Some(Article {
                source: a.source.name.unwrap_or_else(|| "NewsAPI".to_string()),
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
impl ArticleSource for NewsApi {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = self.page_size.to_string();

        let resp = self.client.get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("language", self.language.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("NewsAPI request failed")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("NewsAPI ({}): {}", status, body);
        }

        parse_newsapi_response(&body)
    }
}
