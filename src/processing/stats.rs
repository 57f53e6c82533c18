//! Range statistics used by the reduction engine.
//!
//! Every function works on `data[start..end]`. Weights, when given, cover the whole of `data`
//! and are indexed the same way; an empty weight slice means "unweighted". Degenerate input
//! (empty range, zero total weight, too few samples for `ddof`) yields NaN rather than an error.

use std::ops::Range;

/// Downstream row ceiling. Larger results are forced through a point-count reduction.
pub const MAX_ROWS: usize = 1_048_576;

/// Downstream column ceiling.
pub const MAX_COLS: usize = 16_384;

/// Plain or weighted mean of `data[start..end]`.
pub fn mean(data: &[f64], start: usize, end: usize, weights: &[f64]) -> f64 {
    let Some(values) = data.get(start..end) else {
        return f64::NAN;
    };
    if values.is_empty() {
        return f64::NAN;
    }
    if weights.is_empty() {
        return values.iter().sum::<f64>() / values.len() as f64;
    }
    let Some(w) = weights.get(start..end) else {
        return f64::NAN;
    };
    let sum_w: f64 = w.iter().sum();
    if sum_w == 0.0 {
        return f64::NAN;
    }
    values.iter().zip(w).map(|(x, w)| x * w).sum::<f64>() / sum_w
}

/// Standard deviation of `data[start..end]` about `center`.
///
/// Unweighted: `sqrt(sum((x - c)^2) / (n - ddof))`. Weighted: the reliability-weighted sample
/// deviation `sqrt(sum(w (x - c)^2) / ((m - 1) / m * sum(w)))`, where `m` counts non-zero
/// weights.
pub fn stdev(data: &[f64], start: usize, end: usize, center: f64, weights: &[f64], ddof: usize) -> f64 {
    let Some(values) = data.get(start..end) else {
        return f64::NAN;
    };
    if weights.is_empty() {
        let n = values.len();
        if n <= ddof {
            return f64::NAN;
        }
        let ss: f64 = values.iter().map(|x| (x - center) * (x - center)).sum();
        return (ss / (n - ddof) as f64).sqrt();
    }
    let Some(w) = weights.get(start..end) else {
        return f64::NAN;
    };
    let non_zero = w.iter().filter(|&&w| w != 0.0).count();
    let sum_w: f64 = w.iter().sum();
    if non_zero < 2 || sum_w == 0.0 {
        return f64::NAN;
    }
    let ss: f64 = values
        .iter()
        .zip(w)
        .map(|(x, w)| w * (x - center) * (x - center))
        .sum();
    let m = non_zero as f64;
    (ss / ((m - 1.0) * sum_w / m)).sqrt()
}

/// Median of `data[start..end]`; the two central values are averaged on even lengths.
///
/// Weights are accepted for signature parity with [`mean`] and ignored.
pub fn median(data: &[f64], start: usize, end: usize, _weights: &[f64]) -> f64 {
    let Some(values) = data.get(start..end) else {
        return f64::NAN;
    };
    if values.is_empty() {
        return f64::NAN;
    }
    let mut tmp = values.to_vec();
    let mid = tmp.len() / 2;
    let (lower, upper, _) = tmp.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if values.len() % 2 == 1 {
        return upper;
    }
    let lower = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lower + upper) / 2.0
}

/// Narrow `[start, end)` to its interquartile sub-range.
///
/// Ranges shorter than four samples, or whose quarter points coincide, are returned unchanged.
pub fn stable_period_convert(start: usize, end: usize) -> (usize, usize) {
    if end < start || end - start < 4 {
        return (start, end);
    }
    let mid = start + (end - start) / 2;
    let quarter = start + (mid - start) / 2;
    let three_quarter = mid + (end - mid) / 2;
    if quarter == three_quarter {
        (start, end)
    } else {
        (quarter, three_quarter)
    }
}

pub fn stable_mean(data: &[f64], start: usize, end: usize, weights: &[f64]) -> f64 {
    let (s, e) = stable_period_convert(start, end);
    mean(data, s, e, weights)
}

pub fn stable_median(data: &[f64], start: usize, end: usize, weights: &[f64]) -> f64 {
    let (s, e) = stable_period_convert(start, end);
    median(data, s, e, weights)
}

pub fn stable_stdev(
    data: &[f64],
    start: usize,
    end: usize,
    center: f64,
    weights: &[f64],
    ddof: usize,
) -> f64 {
    let (s, e) = stable_period_convert(start, end);
    stdev(data, s, e, center, weights, ddof)
}

/// Signature shared by the averaging functions.
pub type AverageFn = fn(&[f64], usize, usize, &[f64]) -> f64;

/// Signature shared by the dispersion functions.
pub type DispersionFn = fn(&[f64], usize, usize, f64, &[f64], usize) -> f64;

/// How a range of samples is collapsed to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AveragingKind {
    /// Mean of the interquartile sub-range.
    #[default]
    StableMean,
    /// Mean of the whole range.
    OverallMean,
    /// Median of the interquartile sub-range.
    StableMedian,
    /// Median of the whole range.
    OverallMedian,
}

impl AveragingKind {
    pub const ALL: [AveragingKind; 4] = [
        Self::StableMean,
        Self::OverallMean,
        Self::StableMedian,
        Self::OverallMedian,
    ];

    /// The (average, dispersion) pair for this kind.
    pub fn functions(self) -> (AverageFn, DispersionFn) {
        match self {
            Self::StableMean => (stable_mean, stable_stdev),
            Self::OverallMean => (mean, stdev),
            Self::StableMedian => (stable_median, stable_stdev),
            Self::OverallMedian => (median, stdev),
        }
    }

    /// Average and dispersion of `data[range]` (dispersion with `ddof = 0`).
    pub fn summarize(self, data: &[f64], range: Range<usize>, weights: &[f64]) -> (f64, f64) {
        let (average, dispersion) = self.functions();
        let center = average(data, range.start, range.end, weights);
        let spread = dispersion(data, range.start, range.end, center, weights, 0);
        (center, spread)
    }
}

/// Split `[start, end)` into consecutive chunks of at most `size` rows.
///
/// `size == 0` means "no limit" and yields the whole range.
pub fn sub_range_split(start: usize, end: usize, size: usize) -> Vec<Range<usize>> {
    if size == 0 || end <= start {
        return vec![start..end];
    }
    (start..end)
        .step_by(size)
        .map(|s| s..(s + size).min(end))
        .collect()
}

/// `n` rows split into exactly `points` groups; the trailing `n % points` groups hold one
/// extra row each.
pub fn point_groups(n: usize, points: usize) -> Vec<Range<usize>> {
    if points == 0 {
        return Vec::new();
    }
    let size = n / points;
    let overflow = n % points;
    let mut out = Vec::with_capacity(points);
    let mut at = 0;
    for i in 0..points {
        let len = if i >= points - overflow { size + 1 } else { size };
        out.push(at..at + len);
        at += len;
    }
    out
}
