//! GDF event table.
//!
//! Located right after the last data record:
//!
//! ```text
//! mode u8 │ < 1.94: rate u24, n u32      │ pos u32×n │ typ u16×n │ [chn u16×n │ dur u32×n]
//!         │ ≥ 1.94: n u24,    rate f32   │           │           │  (mode 3 only)
//! ```
//! Positions are 1-based sample indices.
use std::io::Read;

use anyhow::{bail, Context, Result};

use super::header::{f32_at, u16_at, u32_at};
use crate::annotation::{Annotation, Description};

/// Version from which the count and rate fields swap places.
const COUNT_FIRST: f64 = 1.94;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub mode: u8,
    /// Rate declared by the table; 0 when the writer left it blank.
    pub sample_rate: f64,
    /// 0-based sample positions.
    pub positions: Vec<u32>,
    pub types: Vec<u16>,
    /// Mode 3 only; empty otherwise.
    pub channels: Vec<u16>,
    /// In samples. Mode 3 only; empty otherwise.
    pub durations: Vec<u32>,
}

impl EventTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// One numeric annotation per event, timed with the signal rate `sfreq`.
    pub fn to_annotations(&self, sfreq: f64) -> Vec<Annotation> {
        (0..self.len())
            .map(|i| {
                let dur = self.durations.get(i).copied().unwrap_or(0);
                Annotation::new(
                    self.positions[i] as f64 / sfreq,
                    dur as f64 / sfreq,
                    Description::Code(self.types[i] as i64),
                )
            })
            .collect()
    }
}

/// Read the event table at the current position. A file that ends before the
/// table, or whose mode is neither 1 nor 3, has no events.
pub fn read_event_table<R: Read>(reader: &mut R, version: f64) -> Result<EventTable> {
    let mut mode = [0u8; 1];
    if reader.read(&mut mode).context("read event table mode")? == 0 {
        log::debug!("no GDF event table");
        return Ok(EventTable::default());
    }
    let mode = mode[0];
    if mode != 1 && mode != 3 {
        log::warn!("ignoring GDF event table with unknown mode {mode}");
        return Ok(EventTable { mode, ..Default::default() });
    }

    let mut head = [0u8; 7];
    reader.read_exact(&mut head).context("read event table header")?;
    let u24 = |b: &[u8]| b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16;
    let (n, sample_rate) = if version < COUNT_FIRST {
        (u32_at(&head, 3) as usize, u24(&head[0..3]) as f64)
    } else {
        (u24(&head[0..3]) as usize, f32_at(&head, 3) as f64)
    };

    let per_event = if mode == 3 { 12 } else { 6 };
    let mut body = vec![0u8; n * per_event];
    reader
        .read_exact(&mut body)
        .with_context(|| format!("read {n} events"))?;

    let positions: Vec<u32> = (0..n)
        .map(|i| u32_at(&body, 4 * i).saturating_sub(1))
        .collect();
    let typ_at = 4 * n;
    let types = (0..n).map(|i| u16_at(&body, typ_at + 2 * i)).collect();
    let (channels, durations) = if mode == 3 {
        let chn_at = 6 * n;
        let dur_at = 8 * n;
        (
            (0..n).map(|i| u16_at(&body, chn_at + 2 * i)).collect(),
            (0..n).map(|i| u32_at(&body, dur_at + 4 * i)).collect(),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    if !sample_rate.is_finite() || sample_rate < 0.0 {
        bail!("invalid event table rate {sample_rate}");
    }
    Ok(EventTable { mode, sample_rate, positions, types, channels, durations })
}
