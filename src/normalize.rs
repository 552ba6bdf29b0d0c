//! Baseline correction of time-frequency power.
//!
//! `percent_baseline_inplace` matches `mne.baseline.rescale(mode="percent")`:
//!   for every lane along the time axis,
//!   μ = mean(power[t]) over `bmin ≤ t ≤ bmax`
//!   power = (power − μ) / μ
use anyhow::{bail, Result};
use ndarray::{Array, Axis, Dimension};

/// Time indices inside the closed interval `[bmin, bmax]`.
pub fn baseline_indices(times: &[f64], bmin: f64, bmax: f64) -> Vec<usize> {
    // Half a microsecond of slack so grid points computed as i / sfreq match.
    const EPS: f64 = 5e-7;
    (0..times.len())
        .filter(|&i| times[i] >= bmin - EPS && times[i] <= bmax + EPS)
        .collect()
}

/// Percent baseline correction along the last axis of `power`.
///
/// `times` labels the last axis. Fails when no sample lies in the interval.
pub fn percent_baseline_inplace<D: Dimension>(
    power: &mut Array<f64, D>,
    times: &[f64],
    baseline: (f64, f64),
) -> Result<()> {
    let Some(last) = power.ndim().checked_sub(1) else {
        bail!("cannot baseline-correct a 0-d array");
    };
    if power.len_of(Axis(last)) != times.len() {
        bail!("time axis has {} samples but {} times were given", power.len_of(Axis(last)), times.len());
    }
    let idx = baseline_indices(times, baseline.0, baseline.1);
    if idx.is_empty() {
        bail!(
            "baseline {:?} s contains no samples (times span {:?} .. {:?})",
            baseline,
            times.first(),
            times.last()
        );
    }
    let inv_n = 1.0 / idx.len() as f64;
    for mut lane in power.lanes_mut(Axis(last)) {
        let mean = idx.iter().map(|&i| lane[i]).sum::<f64>() * inv_n;
        lane.mapv_inplace(|v| (v - mean) / mean);
    }
    Ok(())
}
