use std::collections::BTreeMap;

use crate::ir::{Bar, BoxSummary, HistogramBin, TrendLine};

/// Bin count used for every numeric distribution.
pub const HISTOGRAM_BINS: usize = 20;

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    Some((min, max))
}

/// Linear-interpolated percentile of already sorted data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Equal-width histogram with exactly `bin_count` bins.
///
/// Bins are half-open except the last, which also holds the maximum. A
/// constant column gets bins spanning one unit centred on the value. Edges
/// stay finite even when `max - min` exceeds `f64::MAX`.
pub fn histogram(values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = min_max(values) else { return Vec::new() };
    let bin_count = bin_count.max(1);
    let n = bin_count as f64;

    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };

    // Work on halved values when the full span overflows
    let span = hi - lo;
    let (scale, width) = if span.is_finite() {
        (1.0, span / n)
    } else {
        (0.5, (hi * 0.5 - lo * 0.5) / n)
    };
    let edge = |i: usize| {
        if span.is_finite() {
            lo + i as f64 * width
        } else {
            let t = i as f64 / n;
            (lo * (1.0 - t) + hi * t).clamp(lo, hi)
        }
    };

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let pos = ((v * scale - lo * scale) / width).floor();
        let idx = if pos.is_finite() && pos > 0.0 { pos as usize } else { 0 };
        counts[idx.min(bin_count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: edge(i),
            end: edge(i + 1),
            count,
        })
        .collect()
}

/// Occurrences per distinct value, most frequent first, ties by value.
pub fn value_counts<'a, I>(values: I) -> Vec<Bar>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }

    let mut bars: Vec<Bar> = counts
        .into_iter()
        .map(|(label, count)| Bar { label: label.to_string(), count })
        .collect();
    bars.sort_by(|a, b| b.count.cmp(&a.count));
    bars
}

/// Quartiles, 1.5 IQR whiskers and outliers of one group.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut ys = values.to_vec();
    ys.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: range of data within fences
    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxSummary {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// Ordinary least squares fit of `ys` on `xs`.
///
/// `None` with fewer than two points, when every x is the same, or when the
/// fit overflows.
pub fn least_squares(xs: &[f64], ys: &[f64]) -> Option<TrendLine> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let sxx: f64 = xs.iter().map(|&x| (x - mean_x).powi(2)).sum();
    let sxy: f64 = xs.iter().zip(ys).map(|(&x, &y)| (x - mean_x) * (y - mean_y)).sum();
    let syy: f64 = ys.iter().map(|&y| (y - mean_y).powi(2)).sum();

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };
    if !(slope.is_finite() && intercept.is_finite() && r_squared.is_finite()) {
        return None;
    }
    let (x_min, x_max) = min_max(xs)?;

    Some(TrendLine {
        slope,
        intercept,
        r_squared,
        x_min,
        x_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.5), 2.5);
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 1.0), 4.0);
    }

    #[test]
    fn test_histogram_fixed_bins() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let bins = histogram(&values, HISTOGRAM_BINS);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[19].end, 100.0);
        // The maximum lands in the last bin
        assert_eq!(bins[19].count, 6);
    }

    #[test]
    fn test_histogram_constant_values() {
        let bins = histogram(&[7.0, 7.0, 7.0], HISTOGRAM_BINS);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        let hit = bins.iter().find(|b| b.count == 3).unwrap();
        assert!(hit.start <= 7.0 + 1e-9 && 7.0 < hit.end + 1e-9);
    }

    #[test]
    fn test_histogram_span_beyond_f64_max() {
        let bins = histogram(&[-1e308, 5.0, 1e308], HISTOGRAM_BINS);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert!(bins.iter().all(|b| b.start.is_finite() && b.end.is_finite()));
        assert!(bins.windows(2).all(|w| w[0].end == w[1].start && w[0].start < w[0].end));
        assert_eq!(bins[0].start, -1e308);
        assert_eq!(bins[19].end, 1e308);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[19].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_value_counts_order() {
        let bars = value_counts(["b", "a", "b", "c", "a", "b"]);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(bars[0].count, 3);
    }

    #[test]
    fn test_box_summary_outlier() {
        let summary = box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.outliers, vec![100.0]);
    }

    #[test]
    fn test_least_squares_exact_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        let fit = least_squares(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!((fit.x_min, fit.x_max), (1.0, 4.0));
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_least_squares_degenerate() {
        assert!(least_squares(&[1.0], &[2.0]).is_none());
        assert!(least_squares(&[2.0, 2.0], &[1.0, 3.0]).is_none());
        assert!(least_squares(&[1e308, 1.7e308, -1e308], &[1.0, 2.0, 3.0]).is_none());
    }
}
