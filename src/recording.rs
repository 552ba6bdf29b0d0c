//! Format-independent view of a loaded recording.
//!
//! `open_recording` dispatches on the file extension and converts decoder
//! failures into [`ConvertError::Read`]; everything downstream works on
//! [`Recording`] only.
use std::path::{Path, PathBuf};

use ndarray::{s, Array2, Axis};

use crate::annotation::Annotation;
use crate::channels::duplicate_names;
use crate::edf::open_edf;
use crate::error::{ConvertError, Result};
use crate::gdf::open_gdf;

#[derive(Debug, Clone)]
pub struct Recording {
    /// `[n_channels, n_times]` in volts.
    pub data: Array2<f64>,
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    /// Chronological.
    pub annotations: Vec<Annotation>,
    pub path: PathBuf,
}

/// Load a `.gdf` or `.edf` file.
pub fn open_recording<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let read_err = |source: anyhow::Error| ConvertError::Read { path: path.to_path_buf(), source };

    let rec = match ext.as_str() {
        "gdf" => {
            let raw = open_gdf(path).map_err(read_err)?;
            Recording {
                data: raw.data,
                ch_names: raw.ch_names,
                sfreq: raw.sfreq,
                annotations: raw.annotations,
                path: raw.path,
            }
        }
        "edf" => {
            let raw = open_edf(path).map_err(read_err)?;
            Recording {
                data: raw.data,
                ch_names: raw.ch_names,
                sfreq: raw.sfreq,
                annotations: raw.annotations,
                path: raw.path,
            }
        }
        _ => return Err(ConvertError::UnsupportedFormat(path.to_path_buf())),
    };

    if !(rec.sfreq.is_finite() && rec.sfreq > 0.0) {
        return Err(ConvertError::malformed(rec.file_name(), format!("invalid sampling rate {} Hz", rec.sfreq)));
    }
    let dups = duplicate_names(&rec.ch_names);
    if !dups.is_empty() {
        return Err(ConvertError::malformed(rec.file_name(), format!("duplicate channel names {dups:?}")));
    }
    log::debug!(
        "{}: {} channels @ {} Hz, {} samples, {} annotations",
        rec.file_name(),
        rec.n_channels(),
        rec.sfreq,
        rec.n_times(),
        rec.annotations.len()
    );
    Ok(rec)
}

impl Recording {
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    /// File name with extension, used in log lines and errors.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File name without extension, used in output image names.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Keep only the rows in `picks`, in that order.
    pub fn pick_channels(&mut self, picks: &[usize]) {
        self.data = self.data.select(Axis(0), picks);
        self.ch_names = picks.iter().map(|&i| self.ch_names[i].clone()).collect();
    }

    /// Samples `round(start·sfreq) ..= round(end·sfreq)`, clamped to the data.
    pub fn crop(&self, start: f64, end: f64) -> Result<Array2<f64>> {
        let n = self.n_times();
        let first = (start * self.sfreq).round().max(0.0) as usize;
        let last = ((end * self.sfreq).round().max(0.0) as usize).min(n.saturating_sub(1));
        if first >= n || last < first + 1 {
            return Err(ConvertError::malformed(
                self.file_name(),
                format!(
                    "window {start:.3}–{end:.3} s does not cover at least two samples of the {:.3} s recording",
                    self.duration_secs()
                ),
            ));
        }
        Ok(self.data.slice(s![.., first..=last]).to_owned())
    }
}
