// Full runs with the real analyzer, forecaster and presenter; only the news
// sources and the alert webhook are replaced.

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chimera_dash::config::{Config, Credentials, Settings};
    use chimera_dash::dashboard::Presenter;
    use chimera_dash::dataset::{self, Article, SentimentLabel};
    use chimera_dash::engine::{AlertLevel, Analyzer, Forecaster, HoltModel, Notifier};
    use chimera_dash::feed::{ArticleSource, Collector};
    use chimera_dash::pipeline::{ForecastHorizon, RunOutcome, RunParams, RunState, Sequencer, Stages};
    use chimera_dash::tui::state::{AppState, MessageKind};
    use chrono::{TimeZone, Utc};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const WEBHOOK: &str = "https://hooks.slack.test/services/T000/B000/XXXX";

    type Sent = Arc<Mutex<Vec<(String, String)>>>;

    struct StaticSource {
        name: &'static str,
        headline: &'static str,
    }

    #[async_trait]
    impl ArticleSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
            Ok((1..=6u32)
                .map(|day| Article {
                    source: self.name.to_string(),
                    title: format!("{}: {}", query, self.headline),
                    description: String::new(),
                    url: format!("https://{}.test/{}", self.name.to_lowercase(), day),
                    published_at: Utc.with_ymd_and_hms(2024, 4, day, 8, 30, 0).unwrap(),
                    content: String::new(),
                })
                .collect())
        }
    }

    struct DownSource;

    #[async_trait]
    impl ArticleSource for DownSource {
        fn name(&self) -> &str {
            "Twitter"
        }

        async fn fetch(&self, _query: &str) -> Result<Vec<Article>> {
            anyhow::bail!("401 Unauthorized")
        }
    }

    struct RecordingNotifier {
        sent: Sent,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, target: &str, message: &str) -> Result<()> {
            self.sent.lock().unwrap().push((target.to_string(), message.to_string()));
            if self.fail {
                anyhow::bail!("webhook returned 500");
            }
            Ok(())
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        let toml = format!(
            r#"
[paths]
raw_news_file = "{raw}"
analyzed_news_file = "{analyzed}"

[query]
topic = "artificial intelligence"

[alerts]
positive_threshold = 0.35
negative_threshold = -0.35
"#,
            raw = dir.join("data").join("raw_news.csv").display(),
            analyzed = dir.join("data").join("analyzed_news.csv").display(),
        );
        let credentials = Credentials::from_lookup(|name| match name {
            "SLACK_WEBHOOK_URL" => Some(WEBHOOK.to_string()),
            _ => Some("test-key".to_string()),
        })
        .unwrap();
        Settings::new(Config::from_toml_str(&toml).unwrap(), credentials).unwrap()
    }

    fn sequencer(dir: &Path, headline: &'static str, sent: &Sent, notifier_fails: bool) -> Sequencer {
        let settings = Arc::new(settings_in(dir));
        let stages = Stages {
            collector: Box::new(Collector::new(vec![
                Box::new(StaticSource { name: "NewsAPI", headline }),
                Box::new(DownSource),
            ])),
            analyzer: Box::new(Analyzer::new()),
            forecaster: Box::new(Forecaster::new(
                HoltModel::default(),
                Box::new(RecordingNotifier { sent: sent.clone(), fail: notifier_fails }),
            )),
            presenter: Box::new(Presenter),
        };
        Sequencer::new(settings, stages)
    }

    #[tokio::test]
    async fn test_positive_news_raises_one_alert() {
        let dir = tempfile::tempdir().unwrap();
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let seq = sequencer(dir.path(), "great progress and excellent results", &sent, false);
        let params = RunParams::new("artificial intelligence", "artificial intelligence", ForecastHorizon::Week);

        let outcome = seq.run(&params, |_| {}).await;
        let RunOutcome::Done { figure, forecast, .. } = outcome else {
            panic!("run did not complete");
        };

        assert_eq!(forecast.points.len(), 7);
        assert_eq!(forecast.alert, AlertLevel::Positive);
        assert_eq!(figure.article_count, 6);
        assert_eq!(figure.label_counts.positive, 6);
        assert_eq!(figure.observed.len(), 6);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, WEBHOOK);
        assert!(sent[0].1.starts_with("Positive sentiment alert"));

        let enriched = dataset::read_scored(&dir.path().join("data").join("analyzed_news.csv")).unwrap();
        assert_eq!(enriched.len(), 6);
        assert!(enriched.iter().all(|r| r.sentiment_label == SentimentLabel::Positive));
    }

    #[tokio::test]
    async fn test_neutral_news_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let seq = sequencer(dir.path(), "officials published the quarterly schedule", &sent, false);
        let params = RunParams::new("", "artificial intelligence", ForecastHorizon::Month);

        let outcome = seq.run(&params, |_| {}).await;
        assert_eq!(outcome.final_state(), RunState::Done);
        if let RunOutcome::Done { forecast, .. } = &outcome {
            assert_eq!(forecast.points.len(), 30);
            assert_eq!(forecast.alert, AlertLevel::None);
        }
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_failure_does_not_fail_run() {
        let dir = tempfile::tempdir().unwrap();
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let seq = sequencer(dir.path(), "great progress and excellent results", &sent, true);
        let params = RunParams::new("ai", "artificial intelligence", ForecastHorizon::HalfMonth);

        let outcome = seq.run(&params, |_| {}).await;
        assert_eq!(outcome.final_state(), RunState::Done);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_state_follows_run() {
        let dir = tempfile::tempdir().unwrap();
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let seq = sequencer(dir.path(), "great progress and excellent results", &sent, false);
        let params = RunParams::new("artificial intelligence", "artificial intelligence", ForecastHorizon::Week);

        let mut state = AppState::new();
        state.begin_run(&params);
        let outcome = seq.run(&params, |e| state.apply_event(e)).await;
        state.finish(outcome);

        assert_eq!(state.run_state, RunState::Done);
        assert_eq!(state.error_count(), 0);
        assert!(state.figure.is_some());
        assert_eq!(state.forecast_rows.len(), 7);
        assert!(state.messages.iter().all(|m| m.kind == MessageKind::Success));
        assert_eq!(
            state.messages.last().map(|m| m.text.as_str()),
            Some("Dashboard generated successfully!")
        );
    }
}
