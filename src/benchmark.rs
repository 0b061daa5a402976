use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

pub const BENCHMARK_LABEL: &str = "CSV-Referenz";

/// Reference values for a metric overlay, built once and handed to callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Benchmark {
    competition: Option<String>,
    values: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchOverlay {
    pub label: String,
    pub value: f64,
}

impl Benchmark {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `competition = None` applies the values to every competition.
    pub fn new(competition: Option<String>, values: HashMap<String, f64>) -> Self {
        Self {
            competition,
            values,
        }
    }

    pub fn load_csv(path: &Path, competition: Option<String>) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("open benchmark csv {}", path.display()))?;
        let values = parse_benchmark_csv(file)
            .with_context(|| format!("parse benchmark csv {}", path.display()))?;
        tracing::info!(path = %path.display(), metrics = values.len(), "benchmark loaded");
        Ok(Self::new(competition, values))
    }

    /// Missing path, missing file or unreadable csv all give an empty benchmark.
    pub fn load_or_empty(path: Option<&Path>, competition: Option<String>) -> Self {
        let Some(path) = path else {
            tracing::debug!("no benchmark csv configured");
            return Self::empty();
        };
        if !path.exists() {
            tracing::warn!(path = %path.display(), "benchmark csv not found");
            return Self::empty();
        }
        match Self::load_csv(path, competition) {
            Ok(bench) => bench,
            Err(err) => {
                tracing::warn!("benchmark csv ignored: {err:#}");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn competition(&self) -> Option<&str> {
        self.competition.as_deref()
    }

    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    /// Overlay for `metric` when the benchmark covers `competition`.
    pub fn overlay(&self, competition: &str, metric: &str) -> Option<BenchOverlay> {
        if let Some(scope) = self.competition.as_deref()
            && scope != competition
        {
            return None;
        }
        self.value(metric).map(|value| BenchOverlay {
            label: BENCHMARK_LABEL.to_string(),
            value,
        })
    }
}

/// Reads either a long table (`metric,value` / `key,mean|avg`) or a wide one
/// (metric names as header, values in the next row). Cells that are not
/// numbers are skipped.
pub fn parse_benchmark_csv<R: Read>(reader: R) -> Result<HashMap<String, f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record.context("read benchmark row")?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let mut mapping = HashMap::new();
    let Some((header, body)) = rows.split_first() else {
        return Ok(mapping);
    };
    let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    let mut skipped = 0usize;
    if is_long_format(&header) {
        for row in body {
            if row.len() < 2 {
                continue;
            }
            match parse_cell(&row[1]) {
                Some(v) => {
                    mapping.insert(row[0].trim().to_string(), v);
                }
                None => skipped += 1,
            }
        }
    } else if let Some(values) = body.first() {
        for (key, cell) in header.iter().zip(values) {
            if key.is_empty() {
                continue;
            }
            match parse_cell(cell) {
                Some(v) => {
                    mapping.insert(key.clone(), v);
                }
                None => skipped += 1,
            }
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "benchmark cells without a number");
    }
    Ok(mapping)
}

fn is_long_format(header: &[String]) -> bool {
    header.len() >= 2
        && matches!(header[0].to_lowercase().as_str(), "metric" | "key")
        && matches!(header[1].to_lowercase().as_str(), "value" | "mean" | "avg")
}

fn parse_cell(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}
