//! Gramian Angular Fields.
//!
//! ```text
//! x[T] ─ PAA ─→ x̃[m] ─ min-max → [-1, 1] ─ φ = arccos(x̃) ─┬─ GASF[i,j] = cos(φi + φj)
//!                                                           └─ GADF[i,j] = sin(φi − φj)
//! ```
//! Matches `pyts.image.GramianAngularField(image_size=m, method=…)` with
//! non-overlapping PAA segments.
use std::fmt;

use ndarray::{Array2, Array3, ArrayView2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GafKind {
    Summation,
    Difference,
}

impl fmt::Display for GafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GafKind::Summation => "summation",
            GafKind::Difference => "difference",
        })
    }
}

/// Piecewise aggregate approximation to `m` segment means. Segment `i`
/// covers `floor(i·n/m) .. floor((i+1)·n/m)`; `m` must not exceed `n`.
pub fn paa(x: &[f64], m: usize) -> Vec<f64> {
    let n = x.len();
    if m == 0 || n == 0 {
        return Vec::new();
    }
    if m >= n {
        return x.to_vec();
    }
    (0..m)
        .map(|i| {
            let a = i * n / m;
            let b = (i + 1) * n / m;
            x[a..b].iter().sum::<f64>() / (b - a) as f64
        })
        .collect()
}

/// Min-max scale to `[-1, 1]` in place. A constant series becomes all `-1`.
pub fn scale_to_unit(x: &mut [f64]) {
    let (lo, hi) = x.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    for v in x.iter_mut() {
        *v = if span > 0.0 { 2.0 * (*v - lo) / span - 1.0 } else { -1.0 };
    }
}

/// GAF of one series at side `size` (clamped to the series length).
pub fn gaf_1d(x: &[f64], size: usize, kind: GafKind) -> Array2<f64> {
    let mut r = paa(x, size.min(x.len()));
    scale_to_unit(&mut r);
    // cos φ = x, sin φ = √(1 − x²) since φ ∈ [0, π].
    let cos: Vec<f64> = r.iter().map(|v| v.clamp(-1.0, 1.0)).collect();
    let sin: Vec<f64> = cos.iter().map(|c| (1.0 - c * c).max(0.0).sqrt()).collect();
    let m = cos.len();
    match kind {
        GafKind::Summation => Array2::from_shape_fn((m, m), |(i, j)| cos[i] * cos[j] - sin[i] * sin[j]),
        GafKind::Difference => Array2::from_shape_fn((m, m), |(i, j)| sin[i] * cos[j] - cos[i] * sin[j]),
    }
}

/// Per-channel GAF of a `[C, T]` window → `[C, s, s]`, `s = min(size, T)`.
pub fn gaf(window: ArrayView2<'_, f64>, size: usize, kind: GafKind) -> Array3<f64> {
    let (n_ch, n_t) = window.dim();
    let s = size.min(n_t);
    let mut out = Array3::<f64>::zeros((n_ch, s, s));
    for (c, row) in window.rows().into_iter().enumerate() {
        let x: Vec<f64> = row.to_vec();
        out.index_axis_mut(ndarray::Axis(0), c).assign(&gaf_1d(&x, s, kind));
    }
    out
}
