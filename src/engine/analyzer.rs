use super::sentiment::SentimentAnalyzer;
use crate::dataset::{self, ScoredArticle, SentimentLabel};
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub mean_score: f64,
}

/// Scores every raw article and writes the enriched dataset.
pub struct Analyzer {
    scorer: SentimentAnalyzer,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            scorer: SentimentAnalyzer::new(),
        }
    }

    pub fn score_articles(&self, articles: Vec<dataset::Article>) -> Vec<ScoredArticle> {
        articles
            .into_iter()
            .map(|a| {
                let s = self.scorer.score(&a.text());
                ScoredArticle::new(a, s.compound, s.label)
            })
            .collect()
    }

    pub fn run(&self, raw: &Path, enriched: &Path) -> Result<AnalysisReport> {
        let articles = dataset::read_articles(raw)?;
        if articles.is_empty() {
            anyhow::bail!("raw dataset {} has no rows", raw.display());
        }

        let scored = self.score_articles(articles);
        dataset::write_scored(enriched, &scored)?;

        let report = summarize(&scored);
        tracing::info!(
            total = report.total,
            positive = report.positive,
            neutral = report.neutral,
            negative = report.negative,
            mean = format!("{:.3}", report.mean_score),
            "enriched dataset written"
        );
        Ok(report)
    }
}

pub fn summarize(rows: &[ScoredArticle]) -> AnalysisReport {
    let mut report = AnalysisReport {
        total: rows.len(),
        ..Default::default()
    };
    for row in rows {
        match row.sentiment_label {
            SentimentLabel::Positive => report.positive += 1,
            SentimentLabel::Neutral => report.neutral += 1,
            SentimentLabel::Negative => report.negative += 1,
        }
    }
    if !rows.is_empty() {
        report.mean_score = rows.iter().map(|r| r.sentiment_score).sum::<f64>() / rows.len() as f64;
    }
    report
}
