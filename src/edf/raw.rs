//! EDF / EDF+ data-record reader.
//!
//! # Layout
//! After the header come `n_records` data records. Each record stores, for
//! every signal in header order, `samples_per_record` little-endian `i16`
//! values. The `EDF Annotations` signal reuses the same 2-byte slots as raw
//! bytes holding TALs.
//!
//! # Calibration
//! ```text
//! physical = digital × gain + offset        (see SignalHeader::gain)
//! volts    = physical × unit_scale(phys_dim)
//! ```
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use super::header::{read_header, EdfHeader};
use super::tal::parse_tals;
use crate::annotation::{Annotation, Description};

/// A fully loaded EDF recording (annotation signal removed).
#[derive(Debug, Clone)]
pub struct RawEdf {
    pub header: EdfHeader,
    pub path: PathBuf,
    /// `[n_signals, n_times]` in volts.
    pub data: Array2<f64>,
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    pub annotations: Vec<Annotation>,
}

/// Open an EDF/EDF+ file and load every data record.
pub fn open_edf<P: AsRef<Path>>(path: P) -> Result<RawEdf> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader)?;
    let record_bytes = header.record_bytes();
    if record_bytes == 0 {
        bail!("EDF records are empty");
    }

    let n_records = if header.n_records >= 0 {
        header.n_records as usize
    } else {
        // Unfinished recording: infer from file size.
        (file_len.saturating_sub(header.header_bytes as u64) / record_bytes as u64) as usize
    };

    let data_idx: Vec<usize> = (0..header.signals.len())
        .filter(|&i| !header.signals[i].is_annotation())
        .collect();
    let ann_idx: Vec<usize> = (0..header.signals.len())
        .filter(|&i| header.signals[i].is_annotation())
        .collect();
    if data_idx.is_empty() {
        bail!("EDF file has no data signals");
    }

    let spr = header.signals[data_idx[0]].samples_per_record;
    if let Some(&odd) = data_idx.iter().find(|&&i| header.signals[i].samples_per_record != spr) {
        bail!(
            "mixed sampling rates are not supported: {:?} has {} samples/record, {:?} has {spr}",
            header.signals[odd].label,
            header.signals[odd].samples_per_record,
            header.signals[data_idx[0]].label,
        );
    }
    if !(header.record_duration.is_finite() && header.record_duration > 0.0) {
        bail!("non-positive record duration {}", header.record_duration);
    }
    let sfreq = spr as f64 / header.record_duration;

    let available = file_len.saturating_sub(header.header_bytes as u64);
    let needed = (n_records as u64).checked_mul(record_bytes as u64);
    if !matches!(needed, Some(n) if n <= available) {
        bail!(
            "header declares {n_records} records of {record_bytes} bytes but only {available} bytes follow the header"
        );
    }

    let n_ch = data_idx.len();
    let n_times = n_records * spr;
    let mut data = Array2::<f64>::zeros((n_ch, n_times));
    let cals: Vec<(f64, f64)> = data_idx
        .iter()
        .map(|&i| {
            let s = &header.signals[i];
            let scale = unit_scale(&s.physical_dim);
            (s.gain() * scale, s.offset() * scale)
        })
        .collect();

    let mut annotations = Vec::new();
    let mut record = vec![0u8; record_bytes];
    for r in 0..n_records {
        reader
            .read_exact(&mut record)
            .with_context(|| format!("read data record {r} of {n_records}"))?;

        let mut pos = 0usize;
        let mut row = 0usize;
        for (sig_i, sig) in header.signals.iter().enumerate() {
            let n_bytes = sig.samples_per_record * 2;
            let bytes = &record[pos..pos + n_bytes];
            pos += n_bytes;

            if ann_idx.contains(&sig_i) {
                for tal in parse_tals(bytes).with_context(|| format!("record {r}: annotations"))? {
                    for text in &tal.texts {
                        annotations.push(Annotation::new(
                            tal.onset,
                            tal.duration.unwrap_or(0.0),
                            Description::Text(text.clone()),
                        ));
                    }
                }
                continue;
            }

            let (gain, offset) = cals[row];
            let t0 = r * spr;
            for (k, pair) in bytes.chunks_exact(2).enumerate() {
                let digital = i16::from_le_bytes([pair[0], pair[1]]) as f64;
                data[[row, t0 + k]] = digital * gain + offset;
            }
            row += 1;
        }
    }

    // TAL onsets are relative to the file start; records may list them out of order.
    annotations.sort_by(|a, b| a.onset.total_cmp(&b.onset));

    let ch_names = data_idx.iter().map(|&i| header.signals[i].label.clone()).collect();
    Ok(RawEdf { header, path: path.to_path_buf(), data, ch_names, sfreq, annotations })
}

/// Multiplier from a physical-dimension string to volts (1.0 when unknown).
pub fn unit_scale(dim: &str) -> f64 {
    match dim.trim() {
        "uV" | "µV" | "μV" | "microV" => 1e-6,
        "nV" => 1e-9,
        "mV" => 1e-3,
        _ => 1.0,
    }
}
