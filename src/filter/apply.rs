//! Overlap-add zero-phase FIR convolution.
//!
//! Zero phase comes from shifting the output left by `(N-1)/2` samples of a
//! symmetric kernel. Edges are padded with an odd reflection of `N-1`
//! samples (zeros beyond the signal length), like MNE's `_smart_pad`.
use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// A symmetric FIR kernel ready to filter rows of `[C, T]` data.
#[derive(Debug, Clone)]
pub struct ZeroPhaseFir {
    taps: Vec<f64>,
}

impl ZeroPhaseFir {
    /// `taps` must have odd length.
    pub fn new(taps: Vec<f64>) -> Result<Self> {
        if taps.len() % 2 == 0 {
            bail!("zero-phase FIR needs an odd number of taps, got {}", taps.len());
        }
        Ok(Self { taps })
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Filter every row of `data` in place.
    pub fn apply(&self, data: &mut Array2<f64>) {
        if data.ncols() == 0 {
            return;
        }
        let n_h = self.taps.len();
        let n_ext = data.ncols() + 2 * (n_h - 1);
        let n_fft = choose_fft_len(n_h, n_ext);

        let mut planner: FftPlanner<f64> = FftPlanner::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft = zero_padded(&self.taps, n_fft);
        fwd.process(&mut h_fft);

        for mut row in data.rows_mut() {
            let x: Vec<f64> = row.to_vec();
            let y = self.overlap_add(&x, &h_fft, n_fft, &*fwd, &*inv);
            row.assign(&ArrayView1::from(&y));
        }
    }

    /// Filter one signal, same length out.
    pub fn filter(&self, x: &[f64]) -> Vec<f64> {
        let mut a = Array2::from_shape_vec((1, x.len()), x.to_vec()).unwrap_or_else(|_| Array2::zeros((1, 0)));
        self.apply(&mut a);
        a.into_raw_vec_and_offset().0
    }

    fn overlap_add(
        &self,
        x: &[f64],
        h_fft: &[Complex<f64>],
        n_fft: usize,
        fwd: &dyn rustfft::Fft<f64>,
        inv: &dyn rustfft::Fft<f64>,
    ) -> Vec<f64> {
        let n_h = self.taps.len();
        let n_edge = n_h - 1;
        let shift = n_edge / 2;
        let ext = odd_reflect_pad(x, n_edge);
        let n_ext = ext.len();

        let n_seg = n_fft - n_h + 1;
        let scale = 1.0 / n_fft as f64;
        let mut out = vec![0.0; n_ext];
        let mut buf = vec![Complex::<f64>::default(); n_fft];

        for start in (0..n_ext).step_by(n_seg) {
            let stop = (start + n_seg).min(n_ext);
            buf.iter_mut().for_each(|b| *b = Complex::default());
            for (b, &v) in buf.iter_mut().zip(&ext[start..stop]) {
                b.re = v;
            }
            fwd.process(&mut buf);
            buf.iter_mut().zip(h_fft).for_each(|(b, &h)| *b *= h);
            inv.process(&mut buf);

            // Output sample o takes product sample o − start + shift.
            let first = start.saturating_sub(shift);
            let skip = shift.saturating_sub(start);
            for (o, p) in (first..n_ext.min(first + n_fft)).zip(skip..n_fft) {
                out[o] += buf[p].re * scale;
            }
        }
        out[n_edge..n_edge + x.len()].to_vec()
    }
}

/// Pad both sides with `n` samples: odd reflection around the end samples,
/// zeros where the signal is too short to reflect.
fn odd_reflect_pad(x: &[f64], n: usize) -> Vec<f64> {
    let len = x.len();
    let avail = n.min(len.saturating_sub(1));
    let first = x[0];
    let last = x[len - 1];

    let mut out = Vec::with_capacity(len + 2 * n);
    out.extend(std::iter::repeat(0.0).take(n - avail));
    out.extend((1..=avail).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=avail).map(|i| 2.0 * last - x[len - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n - avail));
    out
}

/// Power-of-two block size minimising MNE's overlap-add cost
/// `ceil(n_x / (N − n_h + 1)) · N · (log2 N + 1) + 4e-5 · N · n_x`.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    (min_pow..=max_pow)
        .map(|pow| {
            let n = 1usize << pow;
            let cost = (n_x as f64 / (n - n_h + 1) as f64).ceil() * n as f64 * (pow as f64 + 1.0)
                + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
        .unwrap_or(1 << max_pow)
}

fn zero_padded(h: &[f64], n_fft: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::default(); n_fft];
    for (b, &v) in buf.iter_mut().zip(h) {
        b.re = v;
    }
    buf
}
