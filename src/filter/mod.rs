//! FIR band-pass filtering.
//!
//! - [`design`]: Hamming-windowed sinc band-pass, matching
//!   `mne.filter.create_filter(fir_window='hamming', phase='zero')` defaults.
//! - [`apply`]: overlap-add zero-phase convolution of `[C, T]` data.

pub mod apply;
pub mod design;

pub use apply::ZeroPhaseFir;
pub use design::{design_bandpass, filter_length, hamming, lower_transition, lowpass, upper_transition};

use anyhow::Result;
use ndarray::Array2;

/// Design and apply a `l_freq – h_freq` band-pass to every row of `data`.
pub fn bandpass_inplace(data: &mut Array2<f64>, sfreq: f64, l_freq: f64, h_freq: f64) -> Result<()> {
    let fir = ZeroPhaseFir::new(design_bandpass(l_freq, h_freq, sfreq)?)?;
    fir.apply(data);
    Ok(())
}
