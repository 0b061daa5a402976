pub mod benchmark;
pub mod chart;
pub mod competition;
pub mod config;
pub mod labels;
pub mod matchday;
pub mod row;
pub mod stats;

pub use benchmark::{BenchOverlay, Benchmark};
pub use competition::{CompetitionLabels, label_for_competition, normalize_competition_key};
pub use config::{AnalyticsConfig, AnalyticsContext};
pub use labels::{
    LabelCatalog, LabelEntry, LabelTable, MetricDefinition, flatten_categories,
    merge_label_tables, resolve_metric_selection,
};
pub use stats::{MetricFormat, ScaleHints, format_value, percentile, scale_hints};
