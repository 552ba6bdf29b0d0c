//! Wavelet construction for both TFR kernels.
use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use super::dpss::dpss;

pub type Wavelet = Vec<Complex<f64>>;

/// Scale `w` so that `‖w‖ = √2`, i.e. divide by `√0.5 · ‖w‖`.
fn normalize(w: &mut [Complex<f64>]) {
    let norm = w.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    if norm > 0.0 {
        let s = 1.0 / (0.5f64.sqrt() * norm);
        w.iter_mut().for_each(|c| *c *= s);
    }
}

/// Zero-mean complex Morlet wavelet at `freq` Hz, spanning ±5σ with
/// `σ = n_cycles / (2π f)`, as `mne.time_frequency.morlet(zero_mean=True)`.
pub fn morlet(sfreq: f64, freq: f64, n_cycles: f64) -> Wavelet {
    let sigma = n_cycles / (2.0 * PI * freq);
    let half: Vec<f64> = (0..)
        .map(|i| i as f64 / sfreq)
        .take_while(|&t| t < 5.0 * sigma)
        .collect();
    let t: Vec<f64> = half.iter().rev().map(|&v| -v).chain(half.iter().skip(1).copied()).collect();
    let real_offset = (-2.0 * (PI * freq * sigma).powi(2)).exp();

    let mut w: Wavelet = t
        .iter()
        .map(|&t| {
            let osc = Complex::from_polar(1.0, 2.0 * PI * freq * t) - real_offset;
            osc * (-t * t / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    normalize(&mut w);
    w
}

/// DPSS-tapered wavelets at `freq` Hz, one per taper, as MNE's `_make_dpss`.
///
/// Each lasts `n_cycles / freq` seconds and uses `floor(time_bandwidth − 1)`
/// tapers with half bandwidth `time_bandwidth / 2`.
pub fn multitaper(sfreq: f64, freq: f64, n_cycles: f64, time_bandwidth: f64) -> Vec<Wavelet> {
    let t_win = n_cycles / freq;
    let n = ((t_win * sfreq) - 1e-9).ceil().max(1.0) as usize;
    let n_tapers = (time_bandwidth - 1.0).floor().max(1.0) as usize;
    let tapers = dpss(n, time_bandwidth / 2.0, n_tapers, true);

    tapers
        .rows()
        .into_iter()
        .map(|taper| {
            let mut w: Wavelet = (0..n)
                .map(|i| {
                    let t = i as f64 / sfreq - t_win / 2.0;
                    Complex::from_polar(1.0, 2.0 * PI * freq * t) * taper[i]
                })
                .collect();
            let mean = w.iter().sum::<Complex<f64>>() / n as f64;
            w.iter_mut().for_each(|c| *c -= mean);
            normalize(&mut w);
            w
        })
        .collect()
}
