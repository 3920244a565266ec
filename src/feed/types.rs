use serde::Deserialize;

/// Provider response shapes. Each source maps these onto the
/// provider-agnostic `dataset::Article`.

/// newsapi.org `/v2/everything`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub source: NewsApiSource,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// gnews.io `/api/v4/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GNewsResponse {
    #[serde(default)]
    pub articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GNewsArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<GNewsSource>,
}

#[derive(Debug, Deserialize)]
pub struct GNewsSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// Twitter API v2 `/2/tweets/search/recent`. `data` is absent when the
/// search matched nothing.
#[derive(Debug, Deserialize)]
pub struct TweetSearchResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}
