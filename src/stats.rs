use serde::{Deserialize, Serialize};

const PERCENT_PAD: f64 = 0.02;
const PERCENT_MIN_SPAN: f64 = 0.20;
const NUMBER_PAD_RATIO: f64 = 0.15;
const FLAT_PAD_RATIO: f64 = 0.10;
const MIN_RANGE: f64 = 1e-9;

/// Display/scaling format of a metric.
///
/// Source catalogs carry tags like `"int"`, `"float"`, `"string"` or `"date"`;
/// everything that is not `"percent"` behaves like a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricFormat {
    #[default]
    Number,
    Percent,
}

impl MetricFormat {
    pub fn parse(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("percent") {
            MetricFormat::Percent
        } else {
            MetricFormat::Number
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricFormat::Number => "number",
            MetricFormat::Percent => "percent",
        }
    }
}

impl From<String> for MetricFormat {
    fn from(tag: String) -> Self {
        MetricFormat::parse(&tag)
    }
}

impl From<MetricFormat> for String {
    fn from(format: MetricFormat) -> Self {
        format.as_str().to_string()
    }
}

/// Suggested chart axis range. `min`/`max` mirror the suggested bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScaleHints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(rename = "suggestedMin")]
    pub suggested_min: Option<f64>,
    #[serde(rename = "suggestedMax")]
    pub suggested_max: Option<f64>,
}

impl ScaleHints {
    pub fn empty() -> Self {
        Self::default()
    }

    fn bounded(lo: f64, hi: f64) -> Self {
        Self {
            min: Some(lo),
            max: Some(hi),
            suggested_min: Some(lo),
            suggested_max: Some(hi),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggested_min.is_none() && self.suggested_max.is_none()
    }
}

/// Benchmark quantiles used for the reference bands behind a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

pub fn format_value(x: Option<f64>, format: MetricFormat) -> String {
    let Some(x) = x else {
        return String::new();
    };
    match format {
        MetricFormat::Percent => format!("{:.1} %", x * 100.0),
        MetricFormat::Number => format!("{x:.2}"),
    }
}

/// Missing entries (`None`, NaN, infinities) are dropped.
pub fn present_values<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

pub fn sorted_present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut vals = present_values(values);
    vals.sort_by(f64::total_cmp);
    vals
}

pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let vals = present_values(values);
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().sum::<f64>() / vals.len() as f64)
}

/// Percentile by linear interpolation between the closest ranks.
/// `sorted_values` must already be in ascending order.
pub fn percentile(sorted_values: &[f64], p: f64) -> Option<f64> {
    let n = sorted_values.len();
    match n {
        0 => None,
        1 => Some(sorted_values[0]),
        _ => {
            let x = (n - 1) as f64 * p;
            let i = (x.floor() as usize).min(n - 1);
            let j = (x.ceil() as usize).min(n - 1);
            if i == j {
                return Some(sorted_values[i]);
            }
            let w = x - i as f64;
            Some(sorted_values[i] * (1.0 - w) + sorted_values[j] * w)
        }
    }
}

pub fn quantiles(sorted_values: &[f64]) -> Option<Quantiles> {
    Some(Quantiles {
        p10: percentile(sorted_values, 0.10)?,
        p25: percentile(sorted_values, 0.25)?,
        p75: percentile(sorted_values, 0.75)?,
        p90: percentile(sorted_values, 0.90)?,
    })
}

/// Chart values are shipped with six decimals.
pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Axis bounds for a chart of `values`.
///
/// The 5th/95th bounds come from truncated index lookups, not from
/// [`percentile`].
pub fn scale_hints<I>(values: I, format: MetricFormat) -> ScaleHints
where
    I: IntoIterator<Item = Option<f64>>,
{
    let vals = sorted_present(values);
    if vals.is_empty() {
        return ScaleHints::empty();
    }

    let (lo_idx, hi_idx) = trim_indices(vals.len());
    let lo = vals[lo_idx];
    let hi = vals[hi_idx];

    match format {
        MetricFormat::Percent => {
            let mut smin = (lo - PERCENT_PAD).clamp(0.0, 1.0);
            let mut smax = (hi + PERCENT_PAD).clamp(0.0, 1.0);
            if smax - smin < PERCENT_MIN_SPAN {
                let mid = (smin + smax) / 2.0;
                smin = (mid - PERCENT_MIN_SPAN / 2.0).max(0.0);
                smax = (mid + PERCENT_MIN_SPAN / 2.0).min(1.0);
            }
            ScaleHints::bounded(smin, smax)
        }
        MetricFormat::Number => {
            if lo == hi {
                let base = if hi == 0.0 { 1.0 } else { hi.abs() };
                let pad = FLAT_PAD_RATIO * base;
                return ScaleHints::bounded(saturate(hi - pad), saturate(hi + pad));
            }
            let range = (hi - lo).max(MIN_RANGE);
            let pad = NUMBER_PAD_RATIO * range;
            ScaleHints::bounded(saturate(lo - pad), saturate(hi + pad))
        }
    }
}

/// Padding around values near the float limits must not overflow to infinity.
fn saturate(x: f64) -> f64 {
    x.clamp(f64::MIN, f64::MAX)
}

fn trim_indices(n: usize) -> (usize, usize) {
    let last = n.saturating_sub(1);
    let lo_idx = ((0.05 * n as f64) as usize).min(last);
    let hi_idx = ((0.95 * n as f64) as usize).saturating_sub(1).min(last);
    (lo_idx, hi_idx)
}
