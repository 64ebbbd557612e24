use serde::Serialize;

/// Descriptive statistics of a numeric column, nulls excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (`n - 1` denominator); zero for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

/// Summarize the finite values of `values`, or `None` if there are none.
pub fn summarize(values: impl IntoIterator<Item = Option<f64>>) -> Option<SummaryStats> {
    let mut sorted: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std_dev = if count > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(SummaryStats {
        count,
        mean,
        median: quantile_sorted(&sorted, 0.5),
        std_dev,
        min: sorted[0],
        max: sorted[count - 1],
        q25: quantile_sorted(&sorted, 0.25),
        q75: quantile_sorted(&sorted, 0.75),
    })
}

/// Linearly interpolated quantile of a non-empty ascending slice.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    (sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)).min(sorted[hi])
}
