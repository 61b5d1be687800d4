use nalgebra as na;
use num_traits::Float;

/// `|a - b| <= atol + rtol * |b|`, asymmetric like the usual `isclose`.
#[inline]
pub fn is_close<T: Float>(a: T, b: T, rtol: T, atol: T) -> bool {
    if a == b {
        return true;
    }

    if !a.is_finite() || !b.is_finite() {
        return false;
    }

    (a - b).abs() <= atol + rtol * b.abs()
}

/// Standard normal density.
#[inline]
pub fn std_normal_pdf<T: Float>(x: T) -> T {
    let two = T::from(2.0).unwrap();
    let norm = T::from(std::f64::consts::TAU).unwrap().sqrt().recip();

    norm * (-(x * x) / two).exp()
}

#[inline]
pub fn effective_sample_size<T: Float>(weights: &[T]) -> T {
    let sq = weights.iter().fold(T::zero(), |acc, &w| acc + w * w);

    sq.recip()
}

/// Running sum of `weights` with the last entry pinned to exactly 1.
pub fn cumulative_weights<T: Float>(weights: &[T]) -> Vec<T> {
    let mut acc = T::zero();
    let mut out: Vec<T> = weights
        .iter()
        .map(|&w| {
            acc = acc + w;
            acc
        })
        .collect();

    if let Some(last) = out.last_mut() {
        *last = T::one();
    }

    out
}

/// First index `i` with `cumsum[i] >= u`, clamped to the last index.
#[inline]
pub fn search_sorted<T: Float>(cumsum: &[T], u: T) -> usize {
    cumsum
        .partition_point(|&c| c < u)
        .min(cumsum.len().saturating_sub(1))
}

pub fn weighted_mean(points: &[na::Point2<f64>], weights: &[f64]) -> Option<na::Point2<f64>> {
    let total: f64 = weights.iter().sum();

    if points.is_empty() || total <= 0.0 || !total.is_finite() {
        return None;
    }

    let sum = points
        .iter()
        .zip(weights)
        .fold(na::Vector2::zeros(), |acc, (p, &w)| acc + p.coords * w);

    Some((sum / total).into())
}
