use super::types::*;
use super::ArticleSource;
use crate::dataset::{parse_timestamp, Article};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Recent search accepts 10..=100 results per page.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

pub struct Twitter {
    client: Client,
    bearer_token: String,
    base_url: String,
    language: String,
    max_results: u32,
}

impl Twitter {
    pub fn new(client: Client, bearer_token: String, base_url: &str, language: &str, max_results: u32) -> Self {
        Self {
            client,
            bearer_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            max_results: max_results.clamp(MIN_RESULTS, MAX_RESULTS),
        }
    }

    fn search_query(&self, query: &str) -> String {
        format!("{} -is:retweet lang:{}", query, self.language)
    }
}

pub fn parse_tweet_search(json: &str) -> Result<Vec<Article>> {
    let resp: TweetSearchResponse = serde_json::from_str(json)
        .context("failed to parse Twitter search response")?;

    let articles = resp
        .data
        .into_iter()
        .filter_map(|t| {
            let published_at = parse_timestamp(t.created_at.as_deref()?)?;
            Some(Article {
                source: "Twitter".to_string(),
                title: String::new(),
                description: String::new(),
                url: format!("https://twitter.com/i/web/status/{}", t.id),
                published_at,
                content: t.text,
            })
        })
        .collect();

    Ok(articles)
}

#[async_trait]
impl ArticleSource for Twitter {
    fn name(&self) -> &str {
        "Twitter"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let search = self.search_query(query);
        let max = self.max_results.to_string();

        let resp = self.client.get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", search.as_str()),
                ("max_results", max.as_str()),
                ("tweet.fields", "created_at"),
            ])
            .send()
            .await
            .context("Twitter request failed")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Twitter ({}): {}", status, body);
        }

        parse_tweet_search(&body)
    }
}
