//! GDF 1.x / 2.x header.
//!
//! ```text
//! ┌──────────────────────── fixed part (256 bytes) ──────────────────────────┐
//! │ "GDF x.yy" 8 │ patient … │ recording id … │ @184 header length          │
//! │ @236 n_records i64 │ @244 record duration u32/u32 │ @252 ns              │
//! ├─────────────────── per-channel part (ns × 256 bytes) ────────────────────┤
//! │ v1: label 16 │ transducer 80 │ dim 8 │ pmin f64 │ pmax f64               │
//! │     dmin i64 │ dmax i64 │ prefilter 80 │ spr u32 │ type u32 │ rsv 32     │
//! │ v2: label 16 │ transducer 80 │ dim 6 │ dim code u16 │ pmin pmax f64      │
//! │     dmin dmax f64 │ prefilter 68 │ lp hp notch f32 │ spr u32 │ type u32  │
//! │     position 3×f32 │ sensor info 20                                      │
//! ├──────────────────── v2 only: variable header (TLV) ──────────────────────┤
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//! v1 stores the header length in bytes (i64) and `ns` as u32; v2 stores the
//! header length in 256-byte blocks (u16) and `ns` as u16.
use std::io::{self, Read};

use anyhow::{bail, Context, Result};

use super::types::SampleType;
use crate::edf::header::ascii;
use crate::edf::raw::unit_scale;

/// First version using the v2 header layout.
const V2_LAYOUT: f64 = 1.9;

/// SI code of the volt in the GDF physical-dimension table.
const DIM_VOLT: u16 = 4256;

#[derive(Debug, Clone)]
pub struct GdfHeader {
    /// Numeric version, e.g. `1.25` or `2.20`.
    pub version: f64,
    pub patient_id: String,
    pub recording_id: String,
    pub header_bytes: usize,
    pub n_records: i64,
    pub record_duration: f64,
    pub channels: Vec<GdfChannel>,
}

#[derive(Debug, Clone)]
pub struct GdfChannel {
    pub label: String,
    pub transducer: String,
    pub physical_dim: String,
    /// v2 only.
    pub dim_code: Option<u16>,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: f64,
    pub digital_max: f64,
    pub prefiltering: String,
    pub samples_per_record: usize,
    pub sample_type: SampleType,
}

impl GdfChannel {
    pub fn gain(&self) -> f64 {
        let span = self.digital_max - self.digital_min;
        if span == 0.0 { 1.0 } else { (self.physical_max - self.physical_min) / span }
    }

    pub fn offset(&self) -> f64 {
        self.physical_min - self.gain() * self.digital_min
    }

    /// Multiplier to volts, from the dimension code when present.
    pub fn unit_scale(&self) -> f64 {
        match self.dim_code {
            Some(code) if code & !31 == DIM_VOLT => match code & 31 {
                18 => 1e-3,
                19 => 1e-6,
                20 => 1e-9,
                _ => 1.0,
            },
            _ => unit_scale(&self.physical_dim),
        }
    }
}

impl GdfHeader {
    #[inline]
    pub fn is_v2(&self) -> bool {
        self.version >= V2_LAYOUT
    }

    pub fn record_bytes(&self) -> usize {
        self.channels.iter().map(|c| c.samples_per_record * c.sample_type.size()).sum()
    }
}

/// Read the header, leaving `reader` at the first data record.
pub fn read_header<R: Read>(reader: &mut R) -> Result<GdfHeader> {
    let mut fixed = [0u8; 256];
    reader.read_exact(&mut fixed).context("read GDF fixed header")?;

    let magic = ascii(&fixed[0..8]);
    let version = magic
        .strip_prefix("GDF")
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .with_context(|| format!("not a GDF file (version field {magic:?})"))?;
    let v2 = version >= V2_LAYOUT;

    let (header_bytes, ns) = if v2 {
        (u16_at(&fixed, 184) as usize * 256, u16_at(&fixed, 252) as usize)
    } else {
        let hb = i64_at(&fixed, 184);
        if hb < 0 {
            bail!("negative header length {hb}");
        }
        (hb as usize, u32_at(&fixed, 252) as usize)
    };
    if header_bytes < 256 * (ns + 1) {
        bail!("header length {header_bytes} too short for {ns} channels");
    }

    let n_records = i64_at(&fixed, 236);
    let (num, den) = (u32_at(&fixed, 244), u32_at(&fixed, 248));
    if den == 0 {
        bail!("record duration has a zero denominator");
    }
    let record_duration = num as f64 / den as f64;

    let mut block = vec![0u8; ns * 256];
    reader.read_exact(&mut block).context("read GDF channel headers")?;
    let channels = if v2 { parse_v2(&block, ns)? } else { parse_v1(&block, ns)? };

    // Skip the v2 variable header.
    let rest = (header_bytes - 256 * (ns + 1)) as u64;
    if rest > 0 {
        let skipped = io::copy(&mut reader.by_ref().take(rest), &mut io::sink()).context("skip variable header")?;
        if skipped != rest {
            bail!("file ends inside the variable header");
        }
    }

    log::debug!(
        "GDF {version}: {ns} channels, {n_records} records × {record_duration} s, header {header_bytes} bytes"
    );

    Ok(GdfHeader {
        version,
        patient_id: ascii(&fixed[8..if v2 { 74 } else { 88 }]),
        recording_id: ascii(&fixed[88..if v2 { 152 } else { 168 }]),
        header_bytes,
        n_records,
        record_duration,
        channels,
    })
}

/// Column-major view over the per-channel block.
struct Fields<'a> {
    block: &'a [u8],
    ns: usize,
    cursor: usize,
}

impl<'a> Fields<'a> {
    fn new(block: &'a [u8], ns: usize) -> Self {
        Self { block, ns, cursor: 0 }
    }

    fn next(&mut self, width: usize) -> Vec<&'a [u8]> {
        let base = self.cursor;
        let block = self.block;
        self.cursor += self.ns * width;
        (0..self.ns).map(|i| &block[base + i * width..base + (i + 1) * width]).collect()
    }
}

fn parse_v1(block: &[u8], ns: usize) -> Result<Vec<GdfChannel>> {
    let mut f = Fields::new(block, ns);
    let labels = f.next(16);
    let transducers = f.next(80);
    let dims = f.next(8);
    let pmins = f.next(8);
    let pmaxs = f.next(8);
    let dmins = f.next(8);
    let dmaxs = f.next(8);
    let prefilters = f.next(80);
    let sprs = f.next(4);
    let types = f.next(4);

    (0..ns)
        .map(|i| {
            Ok(GdfChannel {
                label: ascii(labels[i]),
                transducer: ascii(transducers[i]),
                physical_dim: ascii(dims[i]),
                dim_code: None,
                physical_min: f64_at(pmins[i], 0),
                physical_max: f64_at(pmaxs[i], 0),
                digital_min: i64_at(dmins[i], 0) as f64,
                digital_max: i64_at(dmaxs[i], 0) as f64,
                prefiltering: ascii(prefilters[i]),
                samples_per_record: u32_at(sprs[i], 0) as usize,
                sample_type: SampleType::from_code(u32_at(types[i], 0))
                    .with_context(|| format!("channel {i} ({})", ascii(labels[i])))?,
            })
        })
        .collect()
}

fn parse_v2(block: &[u8], ns: usize) -> Result<Vec<GdfChannel>> {
    let mut f = Fields::new(block, ns);
    let labels = f.next(16);
    let transducers = f.next(80);
    let dims = f.next(6);
    let dim_codes = f.next(2);
    let pmins = f.next(8);
    let pmaxs = f.next(8);
    let dmins = f.next(8);
    let dmaxs = f.next(8);
    let prefilters = f.next(68);
    let _lowpass = f.next(4);
    let _highpass = f.next(4);
    let _notch = f.next(4);
    let sprs = f.next(4);
    let types = f.next(4);

    (0..ns)
        .map(|i| {
            Ok(GdfChannel {
                label: ascii(labels[i]),
                transducer: ascii(transducers[i]),
                physical_dim: ascii(dims[i]),
                dim_code: Some(u16_at(dim_codes[i], 0)),
                physical_min: f64_at(pmins[i], 0),
                physical_max: f64_at(pmaxs[i], 0),
                digital_min: f64_at(dmins[i], 0),
                digital_max: f64_at(dmaxs[i], 0),
                prefiltering: ascii(prefilters[i]),
                samples_per_record: u32_at(sprs[i], 0) as usize,
                sample_type: SampleType::from_code(u32_at(types[i], 0))
                    .with_context(|| format!("channel {i} ({})", ascii(labels[i])))?,
            })
        })
        .collect()
}

// ── little-endian field access ────────────────────────────────────────────

#[inline]
pub(crate) fn u16_at(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

#[inline]
pub(crate) fn u32_at(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[inline]
pub(crate) fn f32_at(b: &[u8], at: usize) -> f32 {
    f32::from_bits(u32_at(b, at))
}

#[inline]
fn u64_at(b: &[u8], at: usize) -> u64 {
    (u32_at(b, at) as u64) | ((u32_at(b, at + 4) as u64) << 32)
}

#[inline]
fn i64_at(b: &[u8], at: usize) -> i64 {
    u64_at(b, at) as i64
}

#[inline]
fn f64_at(b: &[u8], at: usize) -> f64 {
    f64::from_bits(u64_at(b, at))
}
