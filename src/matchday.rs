use serde::Serialize;

use crate::row::{MetricRow, get_metric};
use crate::stats;

/// One team-match row plus the fixture it belongs to.
#[derive(Debug, Clone)]
pub struct MatchdayRow {
    pub row: MetricRow,
    pub home_team: String,
    pub away_team: String,
}

impl MatchdayRow {
    pub fn is_home(&self, team: &str) -> bool {
        self.home_team == team
    }

    pub fn opponent(&self, team: &str) -> &str {
        if self.is_home(team) {
            &self.away_team
        } else {
            &self.home_team
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchdayOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    pub date: String,
    pub home_away: &'static str,
    pub opponent: String,
    pub goals: i64,
    pub opp_goals: i64,
    pub xg: f64,
    pub opp_xg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Pie,
    Bars,
}

/// Display format of a tile: counts are whole numbers, unlike chart metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    Int,
    Float,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    #[serde(rename = "type")]
    pub kind: TileKind,
    pub key: &'static str,
    pub label: &'static str,
    pub format: TileFormat,
    pub team: Option<f64>,
    pub opp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchdayOverview {
    pub matchdays: Vec<MatchdayOption>,
    pub selected_match_id: Option<String>,
    pub fixture: Option<Fixture>,
    pub tiles: Vec<Tile>,
    pub error: Option<String>,
}

const NO_MATCHES: &str = "Keine Spiele für dieses Team gefunden.";

/// (kind, key, label, format, team columns, opponent columns); multi-column
/// tiles are sums.
const TILE_SPECS: &[(TileKind, &str, &str, TileFormat, &[&str], &[&str])] = &[
    (TileKind::Pie, "possession", "Ballbesitz", TileFormat::Percent, &["possession"], &["opponent_possession"]),
    (TileKind::Bars, "successful_passes", "Erfolgreiche Pässe", TileFormat::Int, &["successful_passes"], &["opponent_successful_passes"]),
    (TileKind::Bars, "xg_total", "xG gesamt", TileFormat::Float, &["op_xg", "sp_xg"], &["opponent_op_xg", "opponent_sp_xg"]),
    (TileKind::Bars, "deep_progressions", "Deep Progressions", TileFormat::Int, &["deep_progressions"], &["opponent_deep_progressions"]),
    (TileKind::Bars, "deep_completions", "Deep Completions", TileFormat::Int, &["deep_completions"], &["opponent_deep_completions"]),
    (TileKind::Bars, "shots_all", "Schüsse (alle)", TileFormat::Int, &["op_shots", "sp_shots"], &["opponent_op_shots", "opponent_sp_shots"]),
    (TileKind::Bars, "pressure_regain_rate", "Pressure-Erfolgsquote", TileFormat::Percent, &["pressure_regain_rate"], &["opponent_pressure_regain_rate"]),
    (TileKind::Bars, "obv", "OBV gesamt", TileFormat::Float, &["obv"], &["opponent_obv"]),
];

pub(crate) fn date_label(row: &MetricRow) -> String {
    row.match_date
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

/// `MD03 – H – Opponent – 24.08.2024` for each match, in the given order.
pub fn matchday_options(rows: &[MatchdayRow], team: &str) -> Vec<MatchdayOption> {
    rows.iter()
        .enumerate()
        .map(|(i, m)| {
            let ha = if m.is_home(team) { "H" } else { "A" };
            let opponent = non_empty_or(m.opponent(team), "?");
            MatchdayOption {
                id: match_id_string(&m.row),
                label: format!("MD{:02} – {ha} – {opponent} – {}", i + 1, date_label(&m.row)),
            }
        })
        .collect()
}

/// Index of the requested match, or of the most recent one.
pub fn select_matchday(rows: &[MatchdayRow], requested: Option<&str>) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    requested
        .filter(|id| !id.is_empty())
        .and_then(|id| rows.iter().position(|m| match_id_string(&m.row) == id))
        .or(Some(rows.len() - 1))
}

/// Sorts by date then match id and builds the overview for the selected match.
pub fn matchday_overview(
    mut rows: Vec<MatchdayRow>,
    team: &str,
    requested: Option<&str>,
) -> MatchdayOverview {
    rows.sort_by(|a, b| {
        a.row
            .match_date
            .cmp(&b.row.match_date)
            .then(a.row.match_id.cmp(&b.row.match_id))
    });
    let Some(idx) = select_matchday(&rows, requested) else {
        return MatchdayOverview {
            matchdays: Vec::new(),
            selected_match_id: None,
            fixture: None,
            tiles: Vec::new(),
            error: Some(NO_MATCHES.to_string()),
        };
    };
    let selected = &rows[idx];
    MatchdayOverview {
        matchdays: matchday_options(&rows, team),
        selected_match_id: Some(match_id_string(&selected.row)),
        fixture: Some(fixture(selected, team)),
        tiles: tiles(&selected.row),
        error: None,
    }
}

fn fixture(m: &MatchdayRow, team: &str) -> Fixture {
    let row = &m.row;
    Fixture {
        date: date_label(row),
        home_away: if m.is_home(team) { "H" } else { "A" },
        opponent: non_empty_or(m.opponent(team), "?").to_string(),
        goals: count_or_zero(row, &["goals"]),
        opp_goals: count_or_zero(row, &["opponent_goals"]),
        xg: stats::round6(sum_or_zero(row, &["op_xg", "sp_xg"])),
        opp_xg: stats::round6(sum_or_zero(row, &["opponent_op_xg", "opponent_sp_xg"])),
    }
}

pub fn tiles(row: &MetricRow) -> Vec<Tile> {
    TILE_SPECS
        .iter()
        .map(|(kind, key, label, format, team_cols, opp_cols)| Tile {
            kind: *kind,
            key: *key,
            label: *label,
            format: *format,
            team: tile_value(row, *format, team_cols),
            opp: tile_value(row, *format, opp_cols),
        })
        .collect()
}

/// Percent tiles keep missing values; the others read missing as zero and
/// int tiles truncate every column before summing.
fn tile_value(row: &MetricRow, format: TileFormat, cols: &[&str]) -> Option<f64> {
    match format {
        TileFormat::Percent => cols.first().and_then(|c| get_metric(row, c)),
        TileFormat::Int => Some(count_or_zero(row, cols) as f64),
        TileFormat::Float => Some(stats::round6(sum_or_zero(row, cols))),
    }
}

fn sum_or_zero(row: &MetricRow, cols: &[&str]) -> f64 {
    cols.iter().map(|c| get_metric(row, c).unwrap_or(0.0)).sum()
}

fn count_or_zero(row: &MetricRow, cols: &[&str]) -> i64 {
    cols.iter()
        .map(|c| get_metric(row, c).unwrap_or(0.0).trunc() as i64)
        .sum()
}

fn match_id_string(row: &MetricRow) -> String {
    row.match_id.map(|id| id.to_string()).unwrap_or_default()
}

pub(crate) fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.trim().is_empty() { fallback } else { s }
}
