//! Row/column interchange files shared between pipeline stages.
//!
//! The raw dataset is written by the collector and read by the analyzer; the
//! enriched dataset is written by the analyzer and read by the forecaster and
//! the render stage. Both are CSV with a header row and an RFC 3339
//! `publishedAt` column.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "publishedAt", with = "published_at")]
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
}

impl Article {
    /// Text fed to the sentiment scorer.
    pub fn text(&self) -> String {
        [self.title.as_str(), self.description.as_str(), self.content.as_str()]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(". ")
    }

    pub fn has_text(&self) -> bool {
        !(self.title.trim().is_empty()
            && self.description.trim().is_empty()
            && self.content.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        };
        f.write_str(s)
    }
}

/// An article row augmented with its sentiment. Kept flat (no nested
/// `Article`) because the csv serializer cannot flatten structs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "publishedAt", with = "published_at")]
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

impl ScoredArticle {
    pub fn new(article: Article, score: f64, label: SentimentLabel) -> Self {
        Self {
            source: article.source,
            title: article.title,
            description: article.description,
            url: article.url,
            published_at: article.published_at,
            content: article.content,
            sentiment_score: score,
            sentiment_label: label,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.published_at.date_naive()
    }
}

/// Parse the timestamp shapes the article sources emit: RFC 3339 (with or
/// without fractional seconds), or a naive `YYYY-MM-DD[ T]HH:MM:SS` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

mod published_at {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid publishedAt: {:?}", raw)))
    }
}

/// True when `err` (or anything in its cause chain) is a file-not-found.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    })
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for row in rows {
        writer.serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        // +2: records start after the header, lines are 1-based
        let row: T = result
            .with_context(|| format!("{}: malformed row at line {}", path.display(), idx + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_articles(path: &Path, articles: &[Article]) -> Result<()> {
    write_rows(path, articles)
}

pub fn read_articles(path: &Path) -> Result<Vec<Article>> {
    read_rows(path)
}

pub fn write_scored(path: &Path, rows: &[ScoredArticle]) -> Result<()> {
    write_rows(path, rows)
}

pub fn read_scored(path: &Path) -> Result<Vec<ScoredArticle>> {
    read_rows(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str) -> Article {
        Article {
            source: "NewsAPI".to_string(),
            title: title.to_string(),
            description: "A description, with a comma".to_string(),
            url: "https://example.com/a".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            content: String::new(),
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_scored_file_keeps_timestamp_and_score() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("analyzed.csv");
        let rows = vec![ScoredArticle::new(article("Stocks rally"), 0.42, SentimentLabel::Positive)];

        write_scored(&path, &rows).unwrap();
        let back = read_scored(&path).unwrap();

        assert_eq!(back, rows);
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(
            "source,title,description,url,publishedAt,content,sentiment_score,sentiment_label"
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_scored(&dir.path().join("absent.csv")).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_malformed_timestamp_is_error_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(
            &path,
            "source,title,description,url,publishedAt,content\nGNews,t,d,u,not-a-date,c\n",
        )
        .unwrap();
        let err = read_articles(&path).unwrap_err();
        assert!(!is_not_found(&err));
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_article_text_skips_blank_parts() {
        let a = article("Headline");
        assert_eq!(a.text(), "Headline. A description, with a comma");
        let blank = Article { title: " ".into(), description: String::new(), ..article("") };
        assert!(!blank.has_text());
    }
}
