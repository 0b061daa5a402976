use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::benchmark::Benchmark;
use crate::competition::CompetitionLabels;
use crate::labels::LabelCatalog;

/// Always-available team category.
pub const CORE_CATEGORY: &str = "Core_ALLE";
/// Pseudo category that switches on the matchday overview instead of charts.
pub const MATCHDAY_CATEGORY: &str = "Spieltag_Übersicht";

const DEFAULT_COMPETITION: &str = "Bundesliga";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub benchmark_csv: Option<PathBuf>,
    pub benchmark_competition: String,
    pub team_labels_path: Option<PathBuf>,
    pub player_labels_path: Option<PathBuf>,
    pub default_categories: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            benchmark_csv: None,
            benchmark_competition: DEFAULT_COMPETITION.to_string(),
            team_labels_path: None,
            player_labels_path: None,
            default_categories: vec![CORE_CATEGORY.to_string(), MATCHDAY_CATEGORY.to_string()],
        }
    }
}

impl AnalyticsConfig {
    /// Reads `.env.local` and `.env` first; values already in the
    /// environment win.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let default_categories = value("DEFAULT_CATEGORIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|cats| !cats.is_empty())
            .unwrap_or(defaults.default_categories);

        Self {
            benchmark_csv: value("BENCHMARK_CSV").map(PathBuf::from),
            benchmark_competition: value("BENCHMARK_COMPETITION")
                .unwrap_or(defaults.benchmark_competition),
            team_labels_path: value("TEAM_LABELS_PATH").map(PathBuf::from),
            player_labels_path: value("PLAYER_LABELS_PATH").map(PathBuf::from),
            default_categories,
        }
    }
}

/// Catalogs, competition labels and the benchmark, loaded once at startup
/// and shared by every request.
#[derive(Debug)]
pub struct AnalyticsContext {
    pub team_catalog: LabelCatalog,
    pub player_catalog: LabelCatalog,
    pub competitions: CompetitionLabels,
    pub benchmark: Benchmark,
    pub default_categories: Vec<String>,
}

/// Categories to chart, plus whether the matchday overview was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    pub categories: Vec<String>,
    pub want_matchday: bool,
}

impl AnalyticsContext {
    /// Catalog overrides must parse; a broken benchmark only logs a warning.
    pub fn load(config: &AnalyticsConfig) -> Result<Self> {
        let team_catalog = match config.team_labels_path.as_deref() {
            Some(path) => load_catalog(path)?,
            None => LabelCatalog::team_default()?,
        };
        let player_catalog = match config.player_labels_path.as_deref() {
            Some(path) => load_catalog(path)?,
            None => LabelCatalog::player_default()?,
        };
        let competitions = CompetitionLabels::default_table()?;
        let benchmark = Benchmark::load_or_empty(
            config.benchmark_csv.as_deref(),
            Some(config.benchmark_competition.clone()),
        );
        tracing::info!(
            team_metrics = team_catalog.labels().len(),
            player_metrics = player_catalog.labels().len(),
            benchmark_metrics = benchmark.len(),
            "analytics context ready"
        );
        Ok(Self {
            team_catalog,
            player_catalog,
            competitions,
            benchmark,
            default_categories: config.default_categories.clone(),
        })
    }

    /// Empty requests fall back to the configured defaults; the matchday
    /// pseudo category is split off and the core category fills an empty
    /// remainder.
    pub fn category_selection(&self, selected: &[String]) -> CategorySelection {
        category_selection(selected, &self.default_categories)
    }
}

pub fn category_selection(selected: &[String], defaults: &[String]) -> CategorySelection {
    let source = if selected.is_empty() { defaults } else { selected };
    let want_matchday = source.iter().any(|c| c == MATCHDAY_CATEGORY);
    let mut categories: Vec<String> = source
        .iter()
        .filter(|c| c.as_str() != MATCHDAY_CATEGORY)
        .cloned()
        .collect();
    if categories.is_empty() {
        categories.push(CORE_CATEGORY.to_string());
    }
    CategorySelection {
        categories,
        want_matchday,
    }
}

fn load_catalog(path: &Path) -> Result<LabelCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read label catalog {}", path.display()))?;
    LabelCatalog::from_json(&raw).with_context(|| format!("parse label catalog {}", path.display()))
}
