use std::collections::HashMap;

use chrono::NaiveDate;

/// One row handed over by the data layer: a team-match, a player-season or
/// a player-match, with its metric columns keyed by metric key.
#[derive(Debug, Clone, Default)]
pub struct MetricRow {
    pub subject: String,
    /// Upstream id of the subject (the player id for player rows).
    pub subject_id: Option<u64>,
    pub match_id: Option<u64>,
    pub match_date: Option<NaiveDate>,
    pub metrics: HashMap<String, Option<f64>>,
}

impl MetricRow {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn with_subject_id(mut self, id: u64) -> Self {
        self.subject_id = Some(id);
        self
    }

    /// Subject name, or `Player <id>` when the name is blank.
    pub fn display_name(&self) -> String {
        match self.subject_id {
            Some(id) if self.subject.is_empty() => format!("Player {id}"),
            _ => self.subject.clone(),
        }
    }

    pub fn with_metric(mut self, key: &str, value: Option<f64>) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }
}

/// Unknown keys and stored nulls both read as `None`.
pub fn get_metric(row: &MetricRow, key: &str) -> Option<f64> {
    row.metrics.get(key).copied().flatten()
}

/// One metric across many rows, in row order.
pub fn column<'a>(rows: &'a [MetricRow], key: &'a str) -> impl Iterator<Item = Option<f64>> + 'a {
    rows.iter().map(move |row| get_metric(row, key))
}

/// Averages of `key` per subject, highest first; subjects without a value
/// are left out.
pub fn subject_means(rows: &[MetricRow], key: &str) -> Vec<(String, f64)> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for row in rows {
        let Some(v) = get_metric(row, key).filter(|v| v.is_finite()) else {
            continue;
        };
        let slot = sums.entry(row.subject.as_str()).or_insert_with(|| {
            order.push(row.subject.as_str());
            (0.0, 0)
        });
        slot.0 += v;
        slot.1 += 1;
    }
    let mut out: Vec<(String, f64)> = order
        .into_iter()
        .map(|s| {
            let (sum, n) = sums[s];
            (s.to_string(), sum / n as f64)
        })
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_read_as_none() {
        let row = MetricRow::new("Rapid")
            .with_metric("op_xg", Some(1.25))
            .with_metric("ppda", None);
        assert_eq!(get_metric(&row, "op_xg"), Some(1.25));
        assert_eq!(get_metric(&row, "ppda"), None);
        assert_eq!(get_metric(&row, "unknown"), None);
    }

    #[test]
    fn subject_means_rank_descending() {
        let rows = vec![
            MetricRow::new("A").with_metric("goals", Some(1.0)),
            MetricRow::new("B").with_metric("goals", Some(3.0)),
            MetricRow::new("A").with_metric("goals", Some(2.0)),
            MetricRow::new("C").with_metric("goals", None),
        ];
        let means = subject_means(&rows, "goals");
        assert_eq!(means, vec![("B".to_string(), 3.0), ("A".to_string(), 1.5)]);
        let col: Vec<Option<f64>> = column(&rows, "goals").collect();
        assert_eq!(col, vec![Some(1.0), Some(3.0), Some(2.0), None]);
    }

    #[test]
    fn blank_names_fall_back_to_id() {
        assert_eq!(MetricRow::new("").with_subject_id(42).display_name(), "Player 42");
        assert_eq!(MetricRow::new("Grüll").with_subject_id(42).display_name(), "Grüll");
        assert_eq!(MetricRow::new("").display_name(), "");
    }
}
