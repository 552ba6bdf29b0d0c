//! EDF / EDF+ header.
//!
//! The header is pure ASCII, space padded:
//!
//! ```text
//! ┌─────────────────────────── fixed part (256 bytes) ───────────────────────┐
//! │ version 8 │ patient 80 │ recording 80 │ date 8 │ time 8 │ header bytes 8 │
//! │ reserved 44 ("EDF+C" / "EDF+D") │ n_records 8 │ record secs 8 │ ns 4      │
//! ├──────────────────── per-signal part (ns × 256 bytes) ────────────────────┤
//! │ label 16 │ transducer 80 │ phys dim 8 │ phys min 8 │ phys max 8          │
//! │ dig min 8 │ dig max 8 │ prefilter 80 │ samples/record 8 │ reserved 32    │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every per-signal field is stored for all signals before the next field.
use std::io::Read;

use anyhow::{bail, Context, Result};

/// Label of the EDF+ annotation pseudo-signal.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

#[derive(Debug, Clone)]
pub struct EdfHeader {
    pub version: String,
    pub patient_id: String,
    pub recording_id: String,
    pub start_date: String,
    pub start_time: String,
    pub header_bytes: usize,
    pub reserved: String,
    /// `-1` when the writer did not finalise the file.
    pub n_records: i64,
    pub record_duration: f64,
    pub signals: Vec<SignalHeader>,
}

#[derive(Debug, Clone)]
pub struct SignalHeader {
    pub label: String,
    pub transducer: String,
    pub physical_dim: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: f64,
    pub digital_max: f64,
    pub prefiltering: String,
    pub samples_per_record: usize,
}

impl SignalHeader {
    #[inline]
    pub fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_LABEL
    }

    /// Physical units per digital step.
    pub fn gain(&self) -> f64 {
        let span = self.digital_max - self.digital_min;
        if span == 0.0 { 1.0 } else { (self.physical_max - self.physical_min) / span }
    }

    pub fn offset(&self) -> f64 {
        self.physical_min - self.gain() * self.digital_min
    }
}

impl EdfHeader {
    /// `true` for EDF+ files (reserved field starts with `EDF+`).
    pub fn is_edf_plus(&self) -> bool {
        self.reserved.starts_with("EDF+")
    }

    /// Bytes in one data record (16-bit samples).
    pub fn record_bytes(&self) -> usize {
        self.signals.iter().map(|s| s.samples_per_record * 2).sum()
    }
}

/// Read and parse the full header (fixed part + signal headers).
pub fn read_header<R: Read>(reader: &mut R) -> Result<EdfHeader> {
    let mut fixed = [0u8; 256];
    reader.read_exact(&mut fixed).context("read EDF fixed header")?;

    let version = ascii(&fixed[0..8]);
    if version != "0" {
        bail!("not an EDF file (version field {version:?})");
    }
    let header_bytes = number::<usize>(&fixed[184..192], "header bytes")?;
    let n_records = number::<i64>(&fixed[236..244], "number of records")?;
    let record_duration = number::<f64>(&fixed[244..252], "record duration")?;
    let ns = number::<usize>(&fixed[252..256], "number of signals")?;
    if header_bytes != 256 * (ns + 1) {
        bail!("header length {header_bytes} inconsistent with {ns} signals");
    }

    let mut block = vec![0u8; ns * 256];
    reader.read_exact(&mut block).context("read EDF signal headers")?;
    let mut cursor = 0usize;
    let mut field = |width: usize| -> Vec<String> {
        let out = (0..ns)
            .map(|i| ascii(&block[cursor + i * width..cursor + (i + 1) * width]))
            .collect();
        cursor += ns * width;
        out
    };
    let labels = field(16);
    let transducers = field(80);
    let dims = field(8);
    let pmins = field(8);
    let pmaxs = field(8);
    let dmins = field(8);
    let dmaxs = field(8);
    let prefilters = field(80);
    let sprs = field(8);

    let mut signals = Vec::with_capacity(ns);
    for i in 0..ns {
        let parse_f = |v: &str, what: &str| -> Result<f64> {
            v.parse::<f64>()
                .with_context(|| format!("signal {i} ({}): invalid {what} {v:?}", labels[i]))
        };
        signals.push(SignalHeader {
            label: labels[i].clone(),
            transducer: transducers[i].clone(),
            physical_dim: dims[i].clone(),
            physical_min: parse_f(&pmins[i], "physical minimum")?,
            physical_max: parse_f(&pmaxs[i], "physical maximum")?,
            digital_min: parse_f(&dmins[i], "digital minimum")?,
            digital_max: parse_f(&dmaxs[i], "digital maximum")?,
            prefiltering: prefilters[i].clone(),
            samples_per_record: sprs[i]
                .parse::<usize>()
                .with_context(|| format!("signal {i}: invalid samples per record {:?}", sprs[i]))?,
        });
    }

    log::debug!(
        "EDF header: {} signals, {} records × {} s, reserved={:?}",
        ns, n_records, record_duration, ascii(&fixed[192..236])
    );

    Ok(EdfHeader {
        version,
        patient_id: ascii(&fixed[8..88]),
        recording_id: ascii(&fixed[88..168]),
        start_date: ascii(&fixed[168..176]),
        start_time: ascii(&fixed[176..184]),
        header_bytes,
        reserved: ascii(&fixed[192..236]),
        n_records,
        record_duration,
        signals,
    })
}

/// ASCII (Latin-1 tolerant) field with space and NUL padding removed.
pub(crate) fn ascii(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

fn number<T: std::str::FromStr>(raw: &[u8], what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s = ascii(raw);
    s.parse::<T>().with_context(|| format!("invalid {what} {s:?}"))
}
