//! Time–frequency power of epoched data.
//!
//! ```text
//! epochs [E, C, T]
//!   │  for every frequency f: wavelets W_f,k (k tapers; 1 for Morlet)
//!   ├─ FFT convolution, "same" mode       c = x ⊛ W_f,k
//!   ├─ power                              P_f = mean_k |c|²
//!   └─ decimate                           keep samples 0, d, 2d, …
//!        │
//!        └─→ power [E, C, F, ⌈T/d⌉]
//! ```
//! Equivalent to `mne.time_frequency.tfr_multitaper` / `tfr_morlet` with
//! `use_fft=True, average=False, return_itc=False`.
pub mod dpss;
pub mod morlet;

pub use dpss::dpss;
pub use morlet::{morlet, multitaper, Wavelet};

use anyhow::{bail, Result};
use ndarray::{s, Array3, Array4, Axis};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::{ErspConfig, NCycles, TfrKernel};

/// Wavelet bank for one sampling rate.
#[derive(Debug, Clone)]
pub struct TfrPlan {
    pub freqs: Vec<f64>,
    /// `wavelets[f]` holds one wavelet per taper.
    pub wavelets: Vec<Vec<Wavelet>>,
    pub decim: usize,
}

impl TfrPlan {
    pub fn new(
        sfreq: f64,
        freqs: &[f64],
        n_cycles: NCycles,
        kernel: TfrKernel,
        time_bandwidth: f64,
        decim: usize,
    ) -> Self {
        let wavelets = freqs
            .iter()
            .map(|&f| match kernel {
                TfrKernel::Multitaper => multitaper(sfreq, f, n_cycles.at(f), time_bandwidth),
                TfrKernel::Morlet => vec![morlet(sfreq, f, n_cycles.at(f))],
            })
            .collect();
        Self { freqs: freqs.to_vec(), wavelets, decim: decim.max(1) }
    }

    pub fn from_config(cfg: &ErspConfig, sfreq: f64) -> Self {
        Self::new(sfreq, &cfg.freqs(), cfg.n_cycles, cfg.kernel, cfg.time_bandwidth, cfg.decim)
    }

    /// Longest wavelet in samples.
    pub fn max_len(&self) -> usize {
        self.wavelets.iter().flatten().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of samples kept after decimating `n_times`.
    #[inline]
    pub fn n_out(&self, n_times: usize) -> usize {
        n_times.div_ceil(self.decim)
    }

    /// Power `[E, C, F, T']` of `epochs` (`[E, C, T]`).
    ///
    /// Fails when a wavelet is longer than the epochs.
    pub fn power(&self, epochs: &Array3<f64>) -> Result<Array4<f64>> {
        let (n_e, n_c, n_t) = epochs.dim();
        let max_len = self.max_len();
        if max_len > n_t {
            bail!(
                "at least one of the wavelets ({max_len} samples) is longer than the signal ({n_t} samples); \
                 use a longer epoch or fewer cycles"
            );
        }
        let n_f = self.freqs.len();
        let n_fft = (n_t + max_len - 1).next_power_of_two();
        let mut out = Array4::<f64>::zeros((n_e, n_c, n_f, self.n_out(n_t)));
        if n_e == 0 || n_f == 0 {
            return Ok(out);
        }

        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);
        let mut scratch = vec![Complex::default(); fwd.get_inplace_scratch_len().max(inv.get_inplace_scratch_len())];

        // Wavelet spectra at the common FFT size.
        let spectra: Vec<Vec<Vec<Complex<f64>>>> = self
            .wavelets
            .iter()
            .map(|tapers| {
                tapers
                    .iter()
                    .map(|w| {
                        let mut buf = vec![Complex::default(); n_fft];
                        buf[..w.len()].copy_from_slice(w);
                        fwd.process_with_scratch(&mut buf, &mut scratch);
                        buf
                    })
                    .collect()
            })
            .collect();

        let scale = 1.0 / n_fft as f64;
        let mut x_fft = vec![Complex::default(); n_fft];
        let mut prod = vec![Complex::default(); n_fft];
        let mut acc = vec![0.0f64; n_t];
        for e in 0..n_e {
            for c in 0..n_c {
                x_fft.iter_mut().for_each(|v| *v = Complex::default());
                for (v, &x) in x_fft.iter_mut().zip(epochs.slice(s![e, c, ..])) {
                    v.re = x;
                }
                fwd.process_with_scratch(&mut x_fft, &mut scratch);

                for (fi, tapers) in spectra.iter().enumerate() {
                    acc.iter_mut().for_each(|v| *v = 0.0);
                    for (ws, w) in tapers.iter().zip(&self.wavelets[fi]) {
                        for ((p, a), b) in prod.iter_mut().zip(&x_fft).zip(ws) {
                            *p = a * b;
                        }
                        inv.process_with_scratch(&mut prod, &mut scratch);
                        // "same" mode: centre of the full n_t + len − 1 output.
                        let start = (w.len() - 1) / 2;
                        for (a, p) in acc.iter_mut().zip(&prod[start..start + n_t]) {
                            *a += (*p * scale).norm_sqr();
                        }
                    }
                    let inv_k = 1.0 / tapers.len() as f64;
                    let mut row = out.slice_mut(s![e, c, fi, ..]);
                    for (o, v) in row.iter_mut().zip(acc.iter().step_by(self.decim)) {
                        *o = v * inv_k;
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Mean over the epoch axis: `[E, C, F, T] → [C, F, T]`.
pub fn average_epochs(power: &Array4<f64>) -> Option<Array3<f64>> {
    power.mean_axis(Axis(0))
}

/// Decimated sample times for epochs starting at `tmin`.
pub fn decimated_times(tmin: f64, sfreq: f64, n_times: usize, decim: usize) -> Vec<f64> {
    (0..n_times).step_by(decim.max(1)).map(|i| tmin + i as f64 / sfreq).collect()
}
