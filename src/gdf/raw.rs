//! GDF data-record reader.
//!
//! Each record holds, for every channel in header order,
//! `samples_per_record` values of that channel's [`SampleType`].
//! The event table follows the last record.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use super::events::{read_event_table, EventTable};
use super::header::{read_header, GdfHeader};
use super::types::SampleType;
use crate::annotation::Annotation;

/// A fully loaded GDF recording.
#[derive(Debug, Clone)]
pub struct RawGdf {
    pub header: GdfHeader,
    pub path: PathBuf,
    /// `[n_channels, n_times]` in volts.
    pub data: Array2<f64>,
    pub ch_names: Vec<String>,
    pub sfreq: f64,
    pub events: EventTable,
    pub annotations: Vec<Annotation>,
}

/// Open a GDF file, load every record and the event table.
pub fn open_gdf<P: AsRef<Path>>(path: P) -> Result<RawGdf> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader).context("parse GDF header")?;
    if header.n_records < 0 {
        bail!("unknown number of data records ({})", header.n_records);
    }
    if header.channels.is_empty() {
        bail!("GDF file has no channels");
    }
    let n_records = header.n_records as usize;

    let spr = header.channels[0].samples_per_record;
    if let Some(odd) = header.channels.iter().find(|c| c.samples_per_record != spr) {
        bail!(
            "mixed sampling rates are not supported: {:?} has {} samples/record, {:?} has {spr}",
            odd.label,
            odd.samples_per_record,
            header.channels[0].label,
        );
    }
    if !(header.record_duration.is_finite() && header.record_duration > 0.0) {
        bail!("non-positive record duration {}", header.record_duration);
    }
    let sfreq = spr as f64 / header.record_duration;

    let record_bytes = header.record_bytes();
    let available = file_len.saturating_sub(header.header_bytes as u64);
    let needed = (n_records as u64).checked_mul(record_bytes as u64);
    if !matches!(needed, Some(n) if n <= available) {
        bail!(
            "header declares {n_records} records of {record_bytes} bytes but only {available} bytes follow the header"
        );
    }

    let layout: Vec<(SampleType, f64, f64)> = header
        .channels
        .iter()
        .map(|c| {
            let scale = c.unit_scale();
            (c.sample_type, c.gain() * scale, c.offset() * scale)
        })
        .collect();

    let n_ch = header.channels.len();
    let mut data = Array2::<f64>::zeros((n_ch, n_records * spr));
    let mut record = vec![0u8; record_bytes];
    for r in 0..n_records {
        reader
            .read_exact(&mut record)
            .with_context(|| format!("read data record {r} of {n_records}"))?;
        let mut pos = 0usize;
        for (ch, &(ty, gain, offset)) in layout.iter().enumerate() {
            let size = ty.size();
            let t0 = r * spr;
            for k in 0..spr {
                let raw = ty.decode(&record[pos..pos + size]);
                data[[ch, t0 + k]] = raw * gain + offset;
                pos += size;
            }
        }
    }

    let events = read_event_table(&mut reader, header.version).context("parse GDF event table")?;
    if events.sample_rate > 0.0 && (events.sample_rate - sfreq).abs() > 1e-6 {
        log::warn!(
            "{}: event table rate {} Hz differs from signal rate {sfreq} Hz; using the signal rate",
            path.display(),
            events.sample_rate
        );
    }
    let annotations = events.to_annotations(sfreq);
    let ch_names = header.channels.iter().map(|c| c.label.clone()).collect();

    Ok(RawGdf { header, path: path.to_path_buf(), data, ch_names, sfreq, events, annotations })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_has_path_context() {
        let err = open_gdf("/nonexistent/A01T.gdf").unwrap_err();
        assert!(format!("{err:#}").contains("A01T.gdf"));
    }
}
