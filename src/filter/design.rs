//! FIR band-pass design following MNE's `create_filter` defaults.
//!
//! For a band-pass `l_freq – h_freq` at `sfreq`:
//!   • lower transition = min(max(0.25 · l_freq, 2), l_freq)
//!   • upper transition = min(max(0.25 · h_freq, 2), nyq − h_freq)
//!   • length N         = ceil(3.3 / min(transitions) · sfreq), rounded to odd
//!   • taps             = lowpass(h_freq + ½ upper) − lowpass(l_freq − ½ lower),
//!                        each a Hamming-windowed sinc with unit DC gain
use std::f64::consts::PI;

use anyhow::{bail, Result};

/// Hamming main-lobe factor used for the length rule.
const HAMMING_FACTOR: f64 = 3.3;

/// Lower transition bandwidth: `min(max(0.25 · l_freq, 2.0), l_freq)`.
pub fn lower_transition(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Upper transition bandwidth: `min(max(0.25 · h_freq, 2.0), nyq − h_freq)`.
pub fn upper_transition(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Odd number of taps for the narrowest transition band.
pub fn filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (HAMMING_FACTOR / trans_bw * sfreq).ceil() as usize;
    n | 1
}

/// Design a zero-phase band-pass.
///
/// Fails when the band does not fit below Nyquist.
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    if !(sfreq.is_finite() && sfreq > 0.0) {
        bail!("sampling rate must be finite and positive, got {sfreq} Hz");
    }
    let nyq = sfreq / 2.0;
    if !(l_freq > 0.0 && l_freq < h_freq) {
        bail!("band-pass edges must satisfy 0 < l_freq < h_freq, got {l_freq} – {h_freq} Hz");
    }
    if h_freq >= nyq {
        bail!("h_freq {h_freq} Hz must be below Nyquist ({nyq} Hz at {sfreq} Hz)");
    }
    let l_tb = lower_transition(l_freq);
    let h_tb = upper_transition(h_freq, sfreq);
    let n = filter_length(l_tb.min(h_tb), sfreq);

    let high = lowpass(n, h_freq + h_tb / 2.0, sfreq);
    let low = lowpass(n, l_freq - l_tb / 2.0, sfreq);
    log::debug!(
        "band-pass {l_freq}–{h_freq} Hz @ {sfreq} Hz: {n} taps, transitions {l_tb} / {h_tb} Hz"
    );
    Ok(high.iter().zip(&low).map(|(h, l)| h - l).collect())
}

/// Windowed-sinc lowpass with `cutoff_hz` at −6 dB, normalised to unit DC gain.
/// `n` must be odd.
pub fn lowpass(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz / (sfreq / 2.0);
    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();
    let s: f64 = h.iter().sum();
    if s != 0.0 {
        h.iter_mut().for_each(|v| *v /= s);
    }
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}
