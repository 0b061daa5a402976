use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::benchmark::BenchOverlay;
use crate::labels::{LabelCatalog, MetricDefinition};
use crate::matchday::{MatchdayRow, date_label, non_empty_or};
use crate::row::{MetricRow, get_metric};
use crate::stats::{self, MetricFormat, Quantiles, ScaleHints};

/// Team metric that gets the opponent's raw pressures drawn next to it.
pub const OPPONENT_PRESSURE_REGAINS: &str = "opponent_pressure_regains";
const OPPONENT_PRESSURES: &str = "opponent_pressures";
const OPPONENT_PRESSURES_LABEL: &str = "Pressures Gegner";

/// One bar/line dataset of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, data: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            label: label.into(),
            data: data.into_iter().map(|v| v.map(stats::round6)).collect(),
        }
    }
}

/// Everything a chart needs besides the datasets themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMeta {
    pub metric: String,
    pub pretty_metric: String,
    pub legend: Option<String>,
    pub metric_format: MetricFormat,
    pub league_mean: Option<f64>,
    pub team_mean: Option<f64>,
    pub quantiles: Option<Quantiles>,
    pub scale_hints: ScaleHints,
    pub bench: Option<BenchOverlay>,
}

impl ChartMeta {
    /// `series` are the plotted datasets (first one is the subject's own),
    /// `population` the league-wide sample the quantile bands come from.
    pub fn build(
        key: &str,
        def: MetricDefinition<'_>,
        series: &[ChartSeries],
        population: &[Option<f64>],
        bench: Option<BenchOverlay>,
    ) -> Self {
        let plotted = series.iter().flat_map(|s| s.data.iter().copied());
        let sorted_population = stats::sorted_present(population.iter().copied());
        Self {
            metric: key.to_string(),
            pretty_metric: def.label.to_string(),
            legend: def.legend.map(str::to_string),
            metric_format: def.format,
            league_mean: stats::mean(population.iter().copied()),
            team_mean: series
                .first()
                .and_then(|s| stats::mean(s.data.iter().copied())),
            quantiles: stats::quantiles(&sorted_population),
            scale_hints: stats::scale_hints(plotted, def.format),
            bench,
        }
    }

    /// League comparison: one value per team, which is also the population.
    pub fn league_comparison(
        key: &str,
        def: MetricDefinition<'_>,
        team_values: &[(String, f64)],
        bench: Option<BenchOverlay>,
    ) -> (ChartSeries, Self) {
        let series = ChartSeries::new(
            format!("{} – Teammittel", def.label),
            team_values.iter().map(|(_, v)| Some(*v)),
        );
        let population = series.data.clone();
        let mut meta = Self::build(key, def, std::slice::from_ref(&series), &population, bench);
        meta.team_mean = None;
        (series, meta)
    }
}

/// Category axis plus datasets, the shape bar and line charts consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

/// One team's value per match, oldest first, labelled `Opponent – dd.mm.yyyy`.
/// Matches without a value are dropped; `None` when nothing is left.
pub fn team_series(
    catalog: &LabelCatalog,
    key: &str,
    team: &str,
    rows: &[MatchdayRow],
) -> Option<ChartData> {
    let mut ordered: Vec<&MatchdayRow> = rows.iter().collect();
    ordered.sort_by_key(|m| m.row.match_date);

    let with_overlay = key == OPPONENT_PRESSURE_REGAINS;
    let mut labels = Vec::new();
    let mut values = Vec::new();
    let mut overlay = Vec::new();
    for m in ordered {
        let Some(value) = get_metric(&m.row, key) else {
            continue;
        };
        let opponent = non_empty_or(m.opponent(team), "?");
        labels.push(format!("{opponent} – {}", date_label(&m.row)));
        values.push(Some(value));
        if with_overlay {
            overlay.push(get_metric(&m.row, OPPONENT_PRESSURES));
        }
    }
    if labels.is_empty() {
        return None;
    }

    let def = catalog.metric_definition(key);
    let mut datasets = vec![ChartSeries::new(format!("{} – {team}", def.label), values)];
    if overlay.iter().any(Option::is_some) {
        let label = catalog
            .labels()
            .get(OPPONENT_PRESSURES)
            .map(|e| e.label.as_str())
            .unwrap_or(OPPONENT_PRESSURES_LABEL);
        datasets.push(ChartSeries::new(label, overlay));
    }
    Some(ChartData { labels, datasets })
}

/// Players side by side over a fixed list of season metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonChart {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
    pub formats: Vec<MetricFormat>,
}

/// One dataset per player row, one point per metric in `metrics` order.
pub fn season_chart(catalog: &LabelCatalog, metrics: &[String], rows: &[MetricRow]) -> SeasonChart {
    let defs: Vec<MetricDefinition<'_>> =
        metrics.iter().map(|m| catalog.metric_definition(m)).collect();
    SeasonChart {
        labels: defs.iter().map(|d| d.label.to_string()).collect(),
        formats: defs.iter().map(|d| d.format).collect(),
        datasets: rows
            .iter()
            .map(|row| ChartSeries {
                label: row.display_name(),
                data: metrics.iter().map(|m| get_metric(row, m)).collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDatasets {
    pub key: String,
    pub label: String,
    pub datasets: Vec<ChartSeries>,
}

/// Per-match player values pivoted onto a shared date axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchChart {
    pub labels: Vec<String>,
    pub metrics: Vec<MetricDatasets>,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PlayerKey<'a> {
    Id(u64),
    Name(&'a str),
}

/// Dates are the sorted union over all rows (`YYYY-MM-DD`); a player without
/// a match on a date gets `None` there. Datasets are ordered by player name,
/// `players` keeps first-seen order. Rows without a date are ignored.
pub fn match_chart(catalog: &LabelCatalog, metrics: &[String], rows: &[MetricRow]) -> MatchChart {
    if rows.is_empty() {
        return MatchChart::default();
    }

    let dates: BTreeSet<NaiveDate> = rows.iter().filter_map(|r| r.match_date).collect();
    let date_index: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let labels: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();

    let mut players: Vec<(PlayerKey<'_>, String)> = Vec::new();
    let mut cells: HashMap<(PlayerKey<'_>, usize), &MetricRow> = HashMap::new();
    for row in rows {
        let Some(idx) = row.match_date.and_then(|d| date_index.get(&d).copied()) else {
            continue;
        };
        let player = match row.subject_id {
            Some(id) => PlayerKey::Id(id),
            None => PlayerKey::Name(&row.subject),
        };
        let name = row.display_name();
        match players.iter_mut().find(|(k, _)| *k == player) {
            Some(slot) => slot.1 = name,
            None => players.push((player, name)),
        }
        cells.insert((player, idx), row);
    }

    let mut by_name: Vec<&(PlayerKey<'_>, String)> = players.iter().collect();
    by_name.sort_by(|a, b| a.1.cmp(&b.1));

    let metrics = metrics
        .iter()
        .map(|key| MetricDatasets {
            key: key.clone(),
            label: catalog.metric_definition(key).label.to_string(),
            datasets: by_name
                .iter()
                .map(|(player, name)| ChartSeries {
                    label: name.clone(),
                    data: (0..labels.len())
                        .map(|i| cells.get(&(*player, i)).and_then(|row| get_metric(row, key)))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    MatchChart {
        labels,
        metrics,
        players: players.into_iter().map(|(_, name)| name).collect(),
    }
}

/// Descriptive summary of one metric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub key: String,
    pub label: String,
    pub format: MetricFormat,
    pub count: usize,
    pub mean: Option<f64>,
    pub mean_display: String,
    pub quantiles: Option<Quantiles>,
    pub scale_hints: ScaleHints,
}

pub fn summarize_column(catalog: &LabelCatalog, key: &str, values: &[Option<f64>]) -> MetricSummary {
    let def = catalog.metric_definition(key);
    let sorted = stats::sorted_present(values.iter().copied());
    let mean = stats::mean(values.iter().copied());
    MetricSummary {
        key: key.to_string(),
        label: def.label.to_string(),
        format: def.format,
        count: sorted.len(),
        mean,
        mean_display: stats::format_value(mean, def.format),
        quantiles: stats::quantiles(&sorted),
        scale_hints: stats::scale_hints(values.iter().copied(), def.format),
    }
}

/// Columns are independent, so they are summarized in parallel; output keeps
/// input order.
pub fn summarize_columns(
    catalog: &LabelCatalog,
    columns: &[(String, Vec<Option<f64>>)],
) -> Vec<MetricSummary> {
    columns
        .par_iter()
        .map(|(key, values)| summarize_column(catalog, key, values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelEntry;

    fn catalog() -> LabelCatalog {
        let table = HashMap::from([(
            "possession".to_string(),
            LabelEntry::new("Ballbesitz", None, MetricFormat::Percent),
        )]);
        LabelCatalog::new(&[table], &[], HashMap::new(), Vec::new(), Vec::<String>::new())
    }

    #[test]
    fn team_view_uses_population_for_bands() {
        let catalog = catalog();
        let def = catalog.metric_definition("possession");
        let series = vec![ChartSeries::new("Ballbesitz – Rapid", vec![Some(0.5), None, Some(0.6)])];
        let population = vec![Some(0.3), Some(0.4), Some(0.5), Some(0.6), Some(0.7), None];
        let meta = ChartMeta::build("possession", def, &series, &population, None);
        assert_eq!(meta.pretty_metric, "Ballbesitz");
        assert_eq!(meta.metric_format, MetricFormat::Percent);
        assert!((meta.team_mean.unwrap() - 0.55).abs() < 1e-12);
        assert!((meta.league_mean.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(meta.quantiles.unwrap().p25, 0.4);
        let hints = meta.scale_hints;
        assert!(hints.suggested_min.unwrap() >= 0.0);
        assert!(hints.suggested_max.unwrap() <= 1.0);
    }

    #[test]
    fn empty_chart_has_no_hints() {
        let catalog = catalog();
        let meta = ChartMeta::build("ppda", catalog.metric_definition("ppda"), &[], &[], None);
        assert_eq!(meta.pretty_metric, "ppda");
        assert!(meta.scale_hints.is_empty());
        assert!(meta.quantiles.is_none());
        assert!(meta.team_mean.is_none());
    }

    #[test]
    fn league_comparison_meta() {
        let catalog = catalog();
        let teams = vec![("A".to_string(), 9.0), ("B".to_string(), 7.0), ("C".to_string(), 5.0)];
        let (series, meta) =
            ChartMeta::league_comparison("ppda", catalog.metric_definition("ppda"), &teams, None);
        assert_eq!(series.label, "ppda – Teammittel");
        assert_eq!(series.data, vec![Some(9.0), Some(7.0), Some(5.0)]);
        assert_eq!(meta.league_mean, Some(7.0));
        assert!(meta.team_mean.is_none());
    }

    #[test]
    fn summaries_keep_order_and_format() {
        let catalog = catalog();
        let columns = vec![
            ("possession".to_string(), vec![Some(0.5), Some(0.25)]),
            ("goals".to_string(), vec![None, None]),
        ];
        let out = summarize_columns(&catalog, &columns);
        assert_eq!(out[0].key, "possession");
        assert_eq!(out[0].mean_display, "37.5 %");
        assert_eq!(out[1].count, 0);
        assert_eq!(out[1].mean_display, "");
        assert!(out[1].scale_hints.is_empty());
    }

    fn team_match(id: u64, day: u32, opponent: &str, value: Option<f64>, pressures: Option<f64>) -> MatchdayRow {
        let mut row = MetricRow::new("Rapid")
            .with_metric(OPPONENT_PRESSURE_REGAINS, value)
            .with_metric(OPPONENT_PRESSURES, pressures);
        row.match_id = Some(id);
        row.match_date = NaiveDate::from_ymd_opt(2024, 8, day);
        MatchdayRow {
            row,
            home_team: "Rapid".to_string(),
            away_team: opponent.to_string(),
        }
    }

    #[test]
    fn team_series_drops_gaps_and_adds_pressure_overlay() {
        let catalog = catalog();
        let rows = vec![
            team_match(3, 24, "", Some(31.0), Some(140.0)),
            team_match(1, 3, "Sturm", Some(28.5), None),
            team_match(2, 10, "LASK", None, Some(120.0)),
        ];
        let chart = team_series(&catalog, OPPONENT_PRESSURE_REGAINS, "Rapid", &rows).unwrap();
        assert_eq!(chart.labels, vec!["Sturm – 03.08.2024", "? – 24.08.2024"]);
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].label, "opponent_pressure_regains – Rapid");
        assert_eq!(chart.datasets[0].data, vec![Some(28.5), Some(31.0)]);
        assert_eq!(chart.datasets[1].label, OPPONENT_PRESSURES_LABEL);
        assert_eq!(chart.datasets[1].data, vec![None, Some(140.0)]);
    }

    #[test]
    fn team_series_without_overlay_or_values() {
        let catalog = catalog();
        let rows = vec![team_match(1, 3, "Sturm", None, Some(99.0))];
        assert!(team_series(&catalog, OPPONENT_PRESSURE_REGAINS, "Rapid", &rows).is_none());

        let rows = vec![team_match(1, 3, "Sturm", Some(2.0), None)];
        let chart = team_series(&catalog, OPPONENT_PRESSURE_REGAINS, "Rapid", &rows).unwrap();
        assert_eq!(chart.datasets.len(), 1);

        let row = rows[0].clone();
        let mut other = row.clone();
        other.row = other.row.with_metric("possession", Some(0.5));
        let chart = team_series(&catalog, "possession", "Rapid", &[other]).unwrap();
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].label, "Ballbesitz – Rapid");
    }

    #[test]
    fn season_chart_one_dataset_per_player() {
        let catalog = catalog();
        let metrics = vec!["possession".to_string(), "npg_90".to_string()];
        let rows = vec![
            MetricRow::new("Grüll")
                .with_subject_id(7)
                .with_metric("possession", Some(0.4))
                .with_metric("npg_90", Some(0.31)),
            MetricRow::new("").with_subject_id(9).with_metric("possession", None),
        ];
        let chart = season_chart(&catalog, &metrics, &rows);
        assert_eq!(chart.labels, vec!["Ballbesitz", "npg_90"]);
        assert_eq!(chart.formats, vec![MetricFormat::Percent, MetricFormat::Number]);
        assert_eq!(chart.datasets[0].data, vec![Some(0.4), Some(0.31)]);
        assert_eq!(chart.datasets[1].label, "Player 9");
        assert_eq!(chart.datasets[1].data, vec![None, None]);
    }

    fn player_match(id: u64, name: &str, day: u32, xg: Option<f64>) -> MetricRow {
        let mut row = MetricRow::new(name).with_subject_id(id).with_metric("np_xg", xg);
        row.match_date = NaiveDate::from_ymd_opt(2024, 9, day);
        row
    }

    #[test]
    fn match_chart_pivots_on_date_union() {
        let catalog = catalog();
        let metrics = vec!["np_xg".to_string()];
        let mut undated = player_match(5, "Zwarts", 1, Some(9.0));
        undated.match_date = None;
        let rows = vec![
            player_match(5, "Zwarts", 14, Some(0.4)),
            player_match(2, "Burgstaller", 7, Some(0.2)),
            player_match(2, "Burgstaller", 14, None),
            player_match(5, "Zwarts", 21, Some(0.1)),
            undated,
        ];
        let chart = match_chart(&catalog, &metrics, &rows);
        assert_eq!(chart.labels, vec!["2024-09-07", "2024-09-14", "2024-09-21"]);
        assert_eq!(chart.players, vec!["Zwarts", "Burgstaller"]);

        let xg = &chart.metrics[0];
        assert_eq!(xg.key, "np_xg");
        assert_eq!(xg.datasets[0].label, "Burgstaller");
        assert_eq!(xg.datasets[0].data, vec![Some(0.2), None, None]);
        assert_eq!(xg.datasets[1].label, "Zwarts");
        assert_eq!(xg.datasets[1].data, vec![None, Some(0.4), Some(0.1)]);

        let empty = match_chart(&catalog, &metrics, &[]);
        assert!(empty.labels.is_empty() && empty.metrics.is_empty() && empty.players.is_empty());
    }
}
