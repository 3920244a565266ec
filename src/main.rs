use anyhow::Result;
use chimera_dash::config::Settings;
use chimera_dash::pipeline::{ForecastHorizon, RunEvent, RunOutcome, RunParams, Sequencer};
use chimera_dash::tui::{self, state::AppState, TuiCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chimera-dash",
    about = "News sentiment collection, analysis and forecasting dashboard"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal dashboard (default).
    Dashboard,
    /// Run the pipeline once and print the forecast.
    Report {
        /// Topic to search for. Defaults to query.topic from the config.
        #[arg(long)]
        topic: Option<String>,

        /// Forecast horizon in days: 7, 15 or 30.
        #[arg(long)]
        horizon: Option<ForecastHorizon>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = std::fs::File::create("chimera-dash.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chimera_dash=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let settings = match Settings::resolve(&cli.config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!();
            eprintln!("  Configuration Error: Could not load settings from {}", cli.config.display());
            eprintln!("  {:#}", e);
            eprintln!();
            eprintln!("  Check config.toml and set NEWS_API_KEY, GNEWS_API_KEY,");
            eprintln!("  TWITTER_BEARER_TOKEN and SLACK_WEBHOOK_URL (env vars or .env).");
            tracing::error!(error = %format!("{:#}", e), "configuration failed");
            std::process::exit(2);
        }
    };
    tracing::info!(config = %cli.config.display(), topic = settings.default_topic(), "settings loaded");

    let sequencer = Sequencer::from_settings(settings.clone())?;

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => run_dashboard(sequencer).await,
        Commands::Report { topic, horizon } => {
            let params = RunParams::new(
                topic.as_deref().unwrap_or_default(),
                settings.default_topic(),
                horizon.unwrap_or(settings.default_horizon),
            );
            if !run_report(&sequencer, &params).await {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn run_dashboard(sequencer: Sequencer) -> Result<()> {
    let default_topic = sequencer.settings().default_topic().to_string();
    let default_horizon = sequencer.settings().default_horizon;
    let (state_tx, state_rx) = watch::channel(AppState::new());
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TuiCommand>(16);

    // Engine: one run at a time, in the order they were requested
    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                TuiCommand::Quit => return,
                TuiCommand::Generate(params) => {
                    state_tx.send_modify(|s| s.begin_run(&params));
                    let outcome = sequencer
                        .run(&params, |event| state_tx.send_modify(|s| s.apply_event(event)))
                        .await;
                    state_tx.send_modify(|s| s.finish(outcome));
                }
            }
        }
    });

    tui::run_tui(state_rx, cmd_tx, default_topic, default_horizon).await
}

/// Headless single run. Returns whether the run reached `Done`.
async fn run_report(sequencer: &Sequencer, params: &RunParams) -> bool {
    println!();
    println!("  Topic: {}  Horizon: {}", params.topic, params.horizon);
    println!();

    let outcome = sequencer
        .run(params, |event| match event {
            RunEvent::Started { message, .. } => println!("  ... {}", message),
            RunEvent::Completed { message, .. } => println!("  ok  {}", message),
            RunEvent::Failed { error, .. } => eprintln!("  ERR {}", error),
        })
        .await;

    match outcome {
        RunOutcome::Done { figure, forecast, elapsed } => {
            println!();
            println!("  {}", figure.title);
            println!(
                "  Articles: {} (+{} ={} -{})",
                figure.article_count,
                figure.label_counts.positive,
                figure.label_counts.neutral,
                figure.label_counts.negative,
            );
            println!();
            println!("  {:<12} {:>8} {:>8} {:>8}", "date", "yhat", "lower", "upper");
            for p in &forecast.points {
                println!(
                    "  {:<12} {:>+8.3} {:>+8.3} {:>+8.3}",
                    p.date.format("%Y-%m-%d"),
                    p.yhat,
                    p.yhat_lower,
                    p.yhat_upper
                );
            }
            println!();
            println!(
                "  Outlook: {:+.3} ({:?})  in {:.1}s",
                forecast.aggregate,
                forecast.alert,
                elapsed.as_secs_f64()
            );
            true
        }
        RunOutcome::Failed { .. } => false,
    }
}
