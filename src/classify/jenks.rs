//! Jenks natural breaks via Fisher's exact dynamic program.

/// Breaks for `k` natural classes of an ascending, non-empty slice.
///
/// Classes never split a run of equal values, so every interior break is the
/// midpoint between one class's maximum and the next class's minimum.
pub(super) fn natural_breaks(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
    if distinct <= k {
        return distinct_midpoints(sorted);
    }

    // Shift by the mean so the sums of squares stay well conditioned.
    let shift = sorted.iter().sum::<f64>() / n as f64;
    let mut sum = vec![0.0; n + 1];
    let mut sum_sq = vec![0.0; n + 1];
    for (i, v) in sorted.iter().enumerate() {
        let x = v - shift;
        sum[i + 1] = sum[i] + x;
        sum_sq[i + 1] = sum_sq[i] + x * x;
    }
    // Sum of squared deviations of sorted[i..=j].
    let ssd = |i: usize, j: usize| {
        let m = (j - i + 1) as f64;
        let s = sum[j + 1] - sum[i];
        (sum_sq[j + 1] - sum_sq[i] - s * s / m).max(0.0)
    };

    // cost[c][j]: best total SSD of sorted[..=j] in c + 1 classes.
    // start[c][j]: first index of the last of those classes.
    let mut cost = vec![vec![f64::INFINITY; n]; k];
    let mut start = vec![vec![0usize; n]; k];
    for j in 0..n {
        cost[0][j] = ssd(0, j);
    }
    for c in 1..k {
        for j in c..n {
            for i in c..=j {
                if sorted[i] == sorted[i - 1] || !cost[c - 1][i - 1].is_finite() {
                    continue;
                }
                let total = cost[c - 1][i - 1] + ssd(i, j);
                if total < cost[c][j] {
                    cost[c][j] = total;
                    start[c][j] = i;
                }
            }
        }
    }

    let mut starts = Vec::with_capacity(k - 1);
    let mut j = n - 1;
    for c in (1..k).rev() {
        let i = start[c][j];
        starts.push(i);
        j = i - 1;
    }
    starts.reverse();

    let mut breaks = Vec::with_capacity(k + 1);
    breaks.push(sorted[0]);
    breaks.extend(starts.iter().map(|&i| (sorted[i - 1] + sorted[i]) / 2.0));
    breaks.push(sorted[n - 1]);
    breaks
}

/// One class per distinct value.
pub(super) fn distinct_midpoints(sorted: &[f64]) -> Vec<f64> {
    let mut distinct = sorted.to_vec();
    distinct.dedup();

    let (first, last) = (distinct[0], distinct[distinct.len() - 1]);
    let mut breaks = Vec::with_capacity(distinct.len() + 1);
    breaks.push(first);
    breaks.extend(distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    breaks.push(last);
    breaks
}
