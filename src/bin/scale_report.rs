use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use viola_analytics::chart::{ChartMeta, ChartSeries};
use viola_analytics::config::{AnalyticsConfig, AnalyticsContext};
use viola_analytics::stats::MetricFormat;

/// Reads one value per line (file argument or stdin) and prints the chart
/// metadata the dashboard would attach to them.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let args = ReportArgs::parse(std::env::args().skip(1));
    let config = AnalyticsConfig::from_env();
    let ctx = AnalyticsContext::load(&config)?;

    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read values from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read values from stdin")?;
            buf
        }
    };
    let values = parse_values(&raw);
    tracing::debug!(lines = values.len(), "values read");

    let catalog = if args.player {
        &ctx.player_catalog
    } else {
        &ctx.team_catalog
    };
    let mut def = catalog.metric_definition(&args.metric);
    if let Some(format) = args.format {
        def.format = format;
    }
    let competition = args.competition.as_deref().unwrap_or(&config.benchmark_competition);
    let bench = ctx.benchmark.overlay(competition, &args.metric);

    let series = vec![ChartSeries::new(def.label, values.iter().copied())];
    let meta = ChartMeta::build(&args.metric, def, &series, &values, bench);
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

#[derive(Debug, Default)]
struct ReportArgs {
    metric: String,
    format: Option<MetricFormat>,
    competition: Option<String>,
    player: bool,
    input: Option<PathBuf>,
}

impl ReportArgs {
    fn parse(args: impl Iterator<Item = String>) -> Self {
        let mut out = Self {
            metric: "value".to_string(),
            ..Self::default()
        };
        for arg in args {
            if let Some(v) = arg.strip_prefix("--metric=") {
                let v = v.trim();
                if !v.is_empty() {
                    out.metric = v.to_string();
                }
            } else if let Some(v) = arg.strip_prefix("--format=") {
                out.format = Some(MetricFormat::parse(v.trim()));
            } else if let Some(v) = arg.strip_prefix("--competition=") {
                out.competition = Some(v.trim().to_string()).filter(|s| !s.is_empty());
            } else if arg == "--player" {
                out.player = true;
            } else if !arg.starts_with("--") && !arg.trim().is_empty() {
                out.input = Some(PathBuf::from(arg));
            }
        }
        out
    }
}

/// Blank lines are skipped; anything else that is not a number is a
/// missing value.
fn parse_values(raw: &str) -> Vec<Option<f64>> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.parse::<f64>().ok())
        .collect()
}
