//! Choropleth classification of a numeric column into ordered value classes.

mod jenks;
pub mod stats;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{GeoDataError, Result},
    types::EntityId,
};

pub use stats::{SummaryStats, summarize};

/// How class boundaries are derived from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassMethod {
    /// `k` classes of equal width between min and max.
    EqualInterval,
    /// `k` classes holding roughly the same number of values.
    Quantile,
    /// `k` bands around the mean, one standard deviation wide where they fit.
    StdDev,
    /// Jenks natural breaks, minimizing within-class variance.
    NaturalBreaks,
}

impl ClassMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            ClassMethod::EqualInterval => "equal_interval",
            ClassMethod::Quantile => "quantile",
            ClassMethod::StdDev => "std_dev",
            ClassMethod::NaturalBreaks => "natural_breaks",
        }
    }
}

impl fmt::Display for ClassMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for ClassMethod {
    type Err = GeoDataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equal_interval" | "equal" => Ok(ClassMethod::EqualInterval),
            "quantile" | "quantiles" => Ok(ClassMethod::Quantile),
            "std_dev" | "stddev" | "standard_deviation" => Ok(ClassMethod::StdDev),
            "natural_breaks" | "jenks" => Ok(ClassMethod::NaturalBreaks),
            other => Err(GeoDataError::Config(format!("unknown classification method: {other}"))),
        }
    }
}

/// Ascending class boundaries: class `i` spans `breaks[i]..=breaks[i + 1]`.
///
/// Breaks are strictly increasing, except for the single class `[v, v]`
/// produced when every value is equal. The first class is closed on both
/// ends, later classes are open below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBreaks {
    method: ClassMethod,
    breaks: Vec<f64>,
}

impl ClassBreaks {
    #[inline] pub fn method(&self) -> ClassMethod { self.method }

    #[inline] pub fn breaks(&self) -> &[f64] { &self.breaks }

    #[inline] pub fn is_empty(&self) -> bool { self.breaks.is_empty() }

    #[inline] pub fn num_classes(&self) -> usize { self.breaks.len().saturating_sub(1) }

    /// (lower, upper) bounds of each class.
    pub fn ranges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.breaks.windows(2).map(|w| (w[0], w[1]))
    }

    /// Index of the class holding `value`, or `None` outside the covered range.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        let (&first, &last) = (self.breaks.first()?, self.breaks.last()?);
        if !(first..=last).contains(&value) {
            return None;
        }
        let upper = &self.breaks[1..];
        Some(upper.partition_point(|&b| b < value).min(upper.len().saturating_sub(1)))
    }
}

/// Breaks for a column plus the ids that could not be classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub breaks: ClassBreaks,
    /// Number of values in each class.
    pub counts: Vec<usize>,
    /// Entities whose value is null or not finite.
    pub null_ids: Vec<EntityId>,
}

/// Classify a column into (at most) `k` classes.
///
/// Null and non-finite values are excluded and reported in `null_ids`.
/// A column without any value yields empty breaks.
pub fn classify(values: &[(EntityId, Option<f64>)], method: ClassMethod, k: usize) -> Result<Classification> {
    let (present, null_ids): (Vec<_>, Vec<_>) = values.iter()
        .copied()
        .partition(|(_, value)| value.is_some_and(f64::is_finite));
    let present: Vec<f64> = present.into_iter().filter_map(|(_, value)| value).collect();
    let null_ids: Vec<EntityId> = null_ids.into_iter().map(|(id, _)| id).collect();

    let breaks = classify_values(&present, method, k)?;
    let mut counts = vec![0; breaks.num_classes()];
    for &value in &present {
        if let Some(class) = breaks.class_of(value) {
            counts[class] += 1;
        }
    }

    tracing::debug!(method = %method, k, classes = counts.len(), nulls = null_ids.len(), "classified column");
    Ok(Classification { breaks, counts, null_ids })
}

/// Compute class breaks for raw values. Non-finite values are ignored.
pub fn classify_values(values: &[f64], method: ClassMethod, k: usize) -> Result<ClassBreaks> {
    if k < 2 {
        return Err(GeoDataError::InvalidClassCount(k));
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let breaks = match (sorted.first(), sorted.last()) {
        (None, _) | (_, None) => Vec::new(),
        (Some(&min), Some(&max)) if min == max => vec![min, max],
        (Some(&min), Some(&max)) => {
            let mut breaks = match method {
                ClassMethod::EqualInterval => equal_interval(min, max, k),
                ClassMethod::Quantile => quantile(&sorted, k),
                ClassMethod::StdDev => std_dev(&sorted, k),
                ClassMethod::NaturalBreaks => jenks::natural_breaks(&sorted, k),
            };
            // Repeated values give repeated quantiles, and nearly equal floats
            // can round two breaks onto one value. Those classes collapse.
            breaks.dedup();
            breaks
        }
    };
    Ok(ClassBreaks { method, breaks })
}

fn equal_interval(min: f64, max: f64, k: usize) -> Vec<f64> {
    let width = (max - min) / k as f64;
    let mut breaks: Vec<f64> = (0..k)
        .map(|i| {
            let t = i as f64 / k as f64;
            // `max - min` overflows for ranges wider than f64::MAX.
            if width.is_finite() { min + width * i as f64 } else { min * (1.0 - t) + max * t }
        })
        .collect();
    breaks.push(max);
    breaks
}

fn quantile(sorted: &[f64], k: usize) -> Vec<f64> {
    (0..=k)
        .map(|i| stats::quantile_sorted(sorted, i as f64 / k as f64))
        .collect()
}

/// `k` classes centred on the mean: interior breaks at `mean + tw` for
/// `t = j - k/2`, bracketed by min and max.
///
/// The band width `w` is the population σ, narrowed when `k` bands of that
/// width would reach past the data, so the two outer classes keep at least
/// half a band each.
fn std_dev(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len() as f64;
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let mean = sorted.iter().map(|v| v / n).sum::<f64>();
    let sigma = (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

    let outer = k as f64 / 2.0 - 1.0;
    let width = sigma
        .min((mean - min) / (outer + 0.5))
        .min((max - mean) / (outer + 0.5));
    if !(width.is_finite() && width > 0.0) {
        return equal_interval(min, max, k);
    }

    let mut breaks = vec![min];
    breaks.extend((1..k).map(|j| mean + (j as f64 - k as f64 / 2.0) * width));
    breaks.push(max);
    breaks
}
