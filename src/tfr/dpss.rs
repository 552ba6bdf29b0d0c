//! Discrete prolate spheroidal (Slepian) sequences.
//!
//! The tapers are the leading eigenvectors of the symmetric tridiagonal
//! matrix (Percival & Walden 1993, §8.3), with `W = NW / N`:
//!
//! ```text
//! diag[i]   = ((N − 1 − 2i) / 2)² · cos(2πW)      i = 0 … N−1
//! off[i−1]  = i · (N − i) / 2                     i = 1 … N−1
//! ```
//! Matches `scipy.signal.windows.dpss(N, NW, Kmax, sym)` including its
//! sign convention: even tapers have a positive sum, odd tapers start with
//! a positive lobe.
use std::f64::consts::PI;

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;

/// `k` DPSS tapers of length `n`, shape `[k, n]`, unit L2 norm.
///
/// `periodic` computes `n + 1` points and drops the last one (`sym=False`),
/// which is what MNE uses for multitaper wavelets.
pub fn dpss(n: usize, half_bandwidth: f64, k: usize, periodic: bool) -> Array2<f64> {
    if n == 0 || k == 0 {
        return Array2::zeros((k, n));
    }
    let m = if periodic { n + 1 } else { n };
    let k = k.min(m);
    let w = half_bandwidth / m as f64;
    let cos_w = (2.0 * PI * w).cos();

    let mut mat = DMatrix::<f64>::zeros(m, m);
    for i in 0..m {
        let d = (m as f64 - 1.0 - 2.0 * i as f64) / 2.0;
        mat[(i, i)] = d * d * cos_w;
        if i > 0 {
            let off = i as f64 * (m - i) as f64 / 2.0;
            mat[(i, i - 1)] = off;
            mat[(i - 1, i)] = off;
        }
    }

    let eig = SymmetricEigen::new(mat);
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let mut tapers = Array2::<f64>::zeros((k, m));
    for (row, &col) in order.iter().take(k).enumerate() {
        let v = eig.eigenvectors.column(col);
        let norm = v.norm();
        for i in 0..m {
            tapers[[row, i]] = v[i] / norm;
        }
    }

    fix_signs(&mut tapers);
    if periodic {
        tapers.slice_axis(ndarray::Axis(1), ndarray::Slice::from(0..n)).to_owned()
    } else {
        tapers
    }
}

fn fix_signs(tapers: &mut Array2<f64>) {
    let m = tapers.ncols();
    let thresh = (1.0 / m as f64).max(1e-7);
    for (k, mut row) in tapers.rows_mut().into_iter().enumerate() {
        let flip = if k % 2 == 0 {
            row.sum() < 0.0
        } else {
            row.iter().find(|v| *v * *v > thresh).is_some_and(|&v| v < 0.0)
        };
        if flip {
            row.mapv_inplace(|v| -v);
        }
    }
}
