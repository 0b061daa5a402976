use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::stats::MetricFormat;

/// Metrics shown when neither the request nor the defaults match anything.
pub const FALLBACK_SELECTION_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub label: String,
    pub legend: Option<String>,
    pub format: MetricFormat,
}

impl LabelEntry {
    pub fn new(label: impl Into<String>, legend: Option<&str>, format: MetricFormat) -> Self {
        Self {
            label: label.into(),
            legend: legend.map(str::to_string),
            format,
        }
    }
}

pub type LabelTable = HashMap<String, LabelEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub label: String,
    pub categories: Vec<String>,
}

/// Label, legend and format for one metric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDefinition<'a> {
    pub label: &'a str,
    pub legend: Option<&'a str>,
    pub format: MetricFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricOption {
    pub key: String,
    pub label: String,
}

/// Later tables override earlier ones key by key.
pub fn merge_label_tables<'a, I>(tables: I) -> LabelTable
where
    I: IntoIterator<Item = &'a LabelTable>,
{
    tables.into_iter().fold(LabelTable::new(), |mut merged, table| {
        merged.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    })
}

/// Unions categories that appear more than once (season + match catalogs)
/// and drops repeated metric keys inside a category, keeping the first.
pub fn flatten_categories(table: &[CategoryEntry]) -> Vec<CategoryEntry> {
    let mut out: Vec<CategoryEntry> = Vec::new();
    let mut seen: Vec<HashSet<String>> = Vec::new();
    for entry in table {
        let idx = match out.iter().position(|c| c.key == entry.key) {
            Some(idx) => idx,
            None => {
                out.push(CategoryEntry {
                    key: entry.key.clone(),
                    metrics: Vec::new(),
                });
                seen.push(HashSet::new());
                out.len() - 1
            }
        };
        for metric in &entry.metrics {
            if seen[idx].insert(metric.clone()) {
                out[idx].metrics.push(metric.clone());
            }
        }
    }
    out
}

/// Ordered union of every metric listed by `categories`, first occurrence wins.
pub fn metric_union(categories: &[CategoryEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .flat_map(|c| c.metrics.iter())
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}

/// Requested keys that the allowed categories know about, falling back to
/// the defaults and then to the head of the allowed set.
pub fn resolve_metric_selection(
    requested: &[String],
    allowed_categories: &[CategoryEntry],
    defaults: &[String],
) -> Vec<String> {
    let allowed = metric_union(allowed_categories);
    let allowed_set: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    let keep = |keys: &[String]| -> Vec<String> {
        keys.iter()
            .filter(|k| allowed_set.contains(k.as_str()))
            .cloned()
            .collect()
    };

    let picked = keep(requested);
    if !picked.is_empty() {
        return picked;
    }
    let picked = keep(defaults);
    if !picked.is_empty() {
        return picked;
    }
    allowed.into_iter().take(FALLBACK_SELECTION_LEN).collect()
}

/// Requested metric if it is on offer, else the first option.
pub fn select_metric<'a>(requested: Option<&str>, options: &'a [MetricOption]) -> Option<&'a str> {
    if let Some(key) = requested
        && let Some(opt) = options.iter().find(|o| o.key == key)
    {
        return Some(opt.key.as_str());
    }
    options.first().map(|o| o.key.as_str())
}

/// Merged label, category and grouping metadata for one dashboard.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: LabelTable,
    categories: Vec<CategoryEntry>,
    category_labels: HashMap<String, String>,
    groups: Vec<CategoryGroup>,
    hidden: HashSet<String>,
}

impl LabelCatalog {
    pub fn new(
        label_tables: &[LabelTable],
        category_tables: &[Vec<CategoryEntry>],
        category_labels: HashMap<String, String>,
        groups: Vec<CategoryGroup>,
        hidden: impl IntoIterator<Item = String>,
    ) -> Self {
        let all_categories: Vec<CategoryEntry> = category_tables.iter().flatten().cloned().collect();
        Self {
            labels: merge_label_tables(label_tables),
            categories: flatten_categories(&all_categories),
            category_labels,
            groups,
            hidden: hidden.into_iter().collect(),
        }
    }

    pub fn team_default() -> Result<Self> {
        Self::from_json(include_str!("../assets/team_catalog.json"))
            .context("parse embedded team catalog")
    }

    pub fn player_default() -> Result<Self> {
        Self::from_json(include_str!("../assets/player_catalog.json"))
            .context("parse embedded player catalog")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let source = serde_json::from_str::<CatalogSource>(raw).context("invalid catalog json")?;
        let catalog = source.into_catalog();
        tracing::debug!(
            metrics = catalog.labels.len(),
            categories = catalog.categories.len(),
            hidden = catalog.hidden.len(),
            "label catalog loaded"
        );
        Ok(catalog)
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn categories(&self) -> &[CategoryEntry] {
        &self.categories
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    /// Unknown keys label themselves and default to a plain number.
    pub fn metric_definition<'a>(&'a self, key: &'a str) -> MetricDefinition<'a> {
        match self.labels.get(key) {
            Some(entry) => MetricDefinition {
                label: &entry.label,
                legend: entry.legend.as_deref(),
                format: entry.format,
            },
            None => MetricDefinition {
                label: key,
                legend: None,
                format: MetricFormat::Number,
            },
        }
    }

    pub fn category_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.category_labels
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// `(group, [(category key, category label)])` for the category picker.
    pub fn grouped_categories(&self) -> Vec<(&str, Vec<(&str, &str)>)> {
        self.groups
            .iter()
            .map(|g| {
                let cats = g
                    .categories
                    .iter()
                    .map(|c| (c.as_str(), self.category_label(c)))
                    .collect();
                (g.label.as_str(), cats)
            })
            .collect()
    }

    /// Catalog entries for the named categories, in request order.
    pub fn allowed_categories<S: AsRef<str>>(&self, keys: &[S]) -> Vec<CategoryEntry> {
        keys.iter()
            .filter_map(|k| self.categories.iter().find(|c| c.key == k.as_ref()))
            .cloned()
            .collect()
    }

    pub fn category_metrics<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        metric_union(&self.allowed_categories(keys))
    }

    /// Chartable metrics of the categories, sorted by label (case-insensitive).
    pub fn metric_options<S: AsRef<str>>(&self, keys: &[S]) -> Vec<MetricOption> {
        let mut options: Vec<MetricOption> = self
            .category_metrics(keys)
            .into_iter()
            .filter(|k| !self.is_hidden(k))
            .filter_map(|k| {
                let label = self.labels.get(&k)?.label.clone();
                Some(MetricOption { key: k, label })
            })
            .collect();
        options.sort_by_cached_key(|o| o.label.to_lowercase());
        options
    }

    pub fn resolve_selection<S: AsRef<str>>(
        &self,
        requested: &[String],
        categories: &[S],
        defaults: &[String],
    ) -> Vec<String> {
        resolve_metric_selection(requested, &self.allowed_categories(categories), defaults)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogSource {
    tables: Vec<NamedLabelTable>,
    #[serde(default)]
    hidden: Vec<String>,
    #[serde(default)]
    categories: Vec<NamedCategoryTable>,
    #[serde(default)]
    category_labels: HashMap<String, String>,
    #[serde(default)]
    groups: Vec<CategoryGroup>,
}

#[derive(Debug, Deserialize)]
struct NamedLabelTable {
    #[allow(dead_code)]
    name: String,
    labels: HashMap<String, RawLabel>,
}

#[derive(Debug, Deserialize)]
struct NamedCategoryTable {
    #[allow(dead_code)]
    name: String,
    entries: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    legend: Option<String>,
    #[serde(default)]
    format: MetricFormat,
}

impl CatalogSource {
    fn into_catalog(self) -> LabelCatalog {
        let tables: Vec<LabelTable> = self
            .tables
            .into_iter()
            .map(|t| {
                t.labels
                    .into_iter()
                    .map(|(key, raw)| {
                        let label = raw.label.unwrap_or_else(|| key.clone());
                        let entry = LabelEntry {
                            label,
                            legend: raw.legend,
                            format: raw.format,
                        };
                        (key, entry)
                    })
                    .collect()
            })
            .collect();
        let category_tables: Vec<Vec<CategoryEntry>> =
            self.categories.into_iter().map(|t| t.entries).collect();
        LabelCatalog::new(
            &tables,
            &category_tables,
            self.category_labels,
            self.groups,
            self.hidden,
        )
    }
}
