/// Shared helpers: synthetic GDF 2.x and EDF+ recordings written to disk.
///
/// Signals are given in µV and stored as i16 with a 0.1 µV step over
/// ±3276.7 µV, so a read-back value is within 0.05 µV of the input.
use ndarray::Array2;
use std::f64::consts::PI;
use std::path::Path;

pub const PHYS: f64 = 3276.7;
pub const DIG: f64 = 32767.0;

/// One cue: onset and duration in seconds, event code.
#[derive(Debug, Clone, Copy)]
pub struct Cue {
    pub onset: f64,
    pub duration: f64,
    pub code: u16,
}

#[allow(unused)]
pub fn cue(onset: f64, duration: f64, code: u16) -> Cue {
    Cue { onset, duration, code }
}

/// BCI-IV-like trial sequence: every `spacing` s a 768 trial start, a
/// 769/770 cue one second later (alternating, 1.25 s long), and a 32766
/// run marker before the first trial.
#[allow(unused)]
pub fn bci_trials(n: usize, first: f64, spacing: f64) -> Vec<Cue> {
    let mut cues = vec![cue(0.5, 0.0, 32766)];
    for i in 0..n {
        let t = first + i as f64 * spacing;
        cues.push(cue(t, 0.0, 768));
        cues.push(cue(t + 1.0, 1.25, if i % 2 == 0 { 769 } else { 770 }));
    }
    cues
}

/// `[n_ch, n_times]` µV: per-channel 10 Hz and 22 Hz sines plus a slow drift.
#[allow(unused)]
pub fn synthetic_uv(n_ch: usize, n_times: usize, sfreq: f64) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_times), |(c, t)| {
        let x = t as f64 / sfreq;
        let c = c as f64;
        20.0 * (2.0 * PI * 10.0 * x + c).sin()
            + (5.0 + 3.0 * c) * (2.0 * PI * 22.0 * x).sin()
            + 40.0 * (2.0 * PI * 0.1 * x).sin()
    })
}

fn digital(v_uv: f64) -> i16 {
    (v_uv / PHYS * DIG).round().clamp(-DIG, DIG) as i16
}

fn field(out: &mut Vec<u8>, value: &str, width: usize) {
    let mut b = value.as_bytes().to_vec();
    b.resize(width, b' ');
    out.extend_from_slice(&b[..width]);
}

fn zero_field(out: &mut Vec<u8>, value: &[u8], width: usize) {
    let mut b = value.to_vec();
    b.resize(width, 0);
    out.extend_from_slice(&b[..width]);
}

// ── GDF 2.20 ──────────────────────────────────────────────────────────────

/// GDF 2.20, i16 samples, 1 s records, mode-3 event table.
/// `data_uv.ncols()` must be a multiple of `sfreq`.
#[allow(unused)]
pub fn write_gdf(path: &Path, labels: &[&str], sfreq: usize, data_uv: &Array2<f64>, cues: &[Cue]) {
    let ns = labels.len();
    assert_eq!(data_uv.nrows(), ns);
    assert_eq!(data_uv.ncols() % sfreq, 0, "whole records only");
    let n_records = data_uv.ncols() / sfreq;

    let mut b = Vec::new();
    zero_field(&mut b, b"GDF 2.20", 8);
    zero_field(&mut b, b"X synthetic", 66); // patient
    zero_field(&mut b, &[], 14); // 74..88
    zero_field(&mut b, b"synthetic recording", 64); // 88..152
    zero_field(&mut b, &[], 32); // 152..184
    b.extend_from_slice(&((ns + 1) as u16).to_le_bytes()); // 184..186
    zero_field(&mut b, &[], 50); // 186..236
    b.extend_from_slice(&(n_records as i64).to_le_bytes()); // 236..244
    b.extend_from_slice(&1u32.to_le_bytes()); // 244..248 duration num
    b.extend_from_slice(&1u32.to_le_bytes()); // 248..252 duration den
    b.extend_from_slice(&(ns as u16).to_le_bytes()); // 252..254
    zero_field(&mut b, &[], 2);
    assert_eq!(b.len(), 256);

    for l in labels {
        zero_field(&mut b, l.as_bytes(), 16);
    }
    for _ in labels {
        zero_field(&mut b, &[], 80);
    }
    for _ in labels {
        zero_field(&mut b, "uV".as_bytes(), 6);
    }
    for _ in labels {
        b.extend_from_slice(&4275u16.to_le_bytes());
    }
    for v in [-PHYS, PHYS, -DIG, DIG] {
        for _ in labels {
            b.extend_from_slice(&v.to_le_bytes());
        }
    }
    for _ in labels {
        zero_field(&mut b, &[], 68);
    }
    for _ in 0..3 {
        for _ in labels {
            b.extend_from_slice(&0f32.to_le_bytes());
        }
    }
    for _ in labels {
        b.extend_from_slice(&(sfreq as u32).to_le_bytes());
    }
    for _ in labels {
        b.extend_from_slice(&3u32.to_le_bytes()); // int16
    }
    for _ in labels {
        zero_field(&mut b, &[], 32);
    }
    assert_eq!(b.len(), 256 * (ns + 1));

    for r in 0..n_records {
        for c in 0..ns {
            for k in 0..sfreq {
                b.extend_from_slice(&digital(data_uv[[c, r * sfreq + k]]).to_le_bytes());
            }
        }
    }

    let n = cues.len() as u32;
    b.push(3);
    b.extend_from_slice(&[n as u8, (n >> 8) as u8, (n >> 16) as u8]);
    b.extend_from_slice(&(sfreq as f32).to_le_bytes());
    for c in cues {
        let pos = (c.onset * sfreq as f64).round() as u32 + 1;
        b.extend_from_slice(&pos.to_le_bytes());
    }
    for c in cues {
        b.extend_from_slice(&c.code.to_le_bytes());
    }
    for _ in cues {
        b.extend_from_slice(&0u16.to_le_bytes());
    }
    for c in cues {
        let dur = (c.duration * sfreq as f64).round() as u32;
        b.extend_from_slice(&dur.to_le_bytes());
    }
    std::fs::write(path, b).unwrap();
}

// ── GDF 1.25 ──────────────────────────────────────────────────────────────

/// Physical range of [`write_gdf_v1`] channels is shifted by this many µV,
/// so reading back exercises the offset as well as the gain.
#[allow(unused)]
pub const V1_OFFSET_UV: f64 = 100.0;

/// GDF 1.25, i16 samples, 1 s records, text dimension `uV`, mode-1 event
/// table (no durations).
#[allow(unused)]
pub fn write_gdf_v1(path: &Path, labels: &[&str], sfreq: usize, data_uv: &Array2<f64>, cues: &[Cue]) {
    let ns = labels.len();
    assert_eq!(data_uv.nrows(), ns);
    assert_eq!(data_uv.ncols() % sfreq, 0, "whole records only");
    let n_records = data_uv.ncols() / sfreq;

    let mut b = Vec::new();
    zero_field(&mut b, b"GDF 1.25", 8);
    zero_field(&mut b, b"X synthetic", 80); // 8..88 patient
    zero_field(&mut b, b"synthetic v1 recording", 80); // 88..168
    zero_field(&mut b, b"20200101000000000", 16); // 168..184 start
    b.extend_from_slice(&(256 * (ns as i64 + 1)).to_le_bytes()); // 184..192 header bytes
    zero_field(&mut b, &[], 44); // 192..236 equipment, lab, tech, reserved
    b.extend_from_slice(&(n_records as i64).to_le_bytes()); // 236..244
    b.extend_from_slice(&1u32.to_le_bytes()); // 244..248
    b.extend_from_slice(&1u32.to_le_bytes()); // 248..252
    b.extend_from_slice(&(ns as u32).to_le_bytes()); // 252..256
    assert_eq!(b.len(), 256);

    for l in labels {
        zero_field(&mut b, l.as_bytes(), 16);
    }
    for _ in labels {
        zero_field(&mut b, &[], 80);
    }
    for _ in labels {
        zero_field(&mut b, b"uV", 8);
    }
    for v in [V1_OFFSET_UV - PHYS, V1_OFFSET_UV + PHYS] {
        for _ in labels {
            b.extend_from_slice(&v.to_le_bytes());
        }
    }
    for v in [-DIG as i64, DIG as i64] {
        for _ in labels {
            b.extend_from_slice(&v.to_le_bytes());
        }
    }
    for _ in labels {
        zero_field(&mut b, &[], 80);
    }
    for _ in labels {
        b.extend_from_slice(&(sfreq as u32).to_le_bytes());
    }
    for _ in labels {
        b.extend_from_slice(&3u32.to_le_bytes()); // int16
    }
    for _ in labels {
        zero_field(&mut b, &[], 32);
    }
    assert_eq!(b.len(), 256 * (ns + 1));

    for r in 0..n_records {
        for c in 0..ns {
            for k in 0..sfreq {
                let v = data_uv[[c, r * sfreq + k]] - V1_OFFSET_UV;
                b.extend_from_slice(&digital(v).to_le_bytes());
            }
        }
    }

    b.push(1);
    let rate = sfreq as u32;
    b.extend_from_slice(&[rate as u8, (rate >> 8) as u8, (rate >> 16) as u8]);
    b.extend_from_slice(&(cues.len() as u32).to_le_bytes());
    for c in cues {
        let pos = (c.onset * sfreq as f64).round() as u32 + 1;
        b.extend_from_slice(&pos.to_le_bytes());
    }
    for c in cues {
        b.extend_from_slice(&c.code.to_le_bytes());
    }
    std::fs::write(path, b).unwrap();
}

/// Overwrite `bytes` at `offset` of an existing file.
#[allow(unused)]
pub fn patch_file(path: &Path, offset: usize, bytes: &[u8]) {
    let mut b = std::fs::read(path).unwrap();
    b[offset..offset + bytes.len()].copy_from_slice(bytes);
    std::fs::write(path, b).unwrap();
}

// ── EDF+ ──────────────────────────────────────────────────────────────────

/// EDF+C with 1 s records and an `EDF Annotations` signal. All annotation
/// TALs go into the first record.
#[allow(unused)]
pub fn write_edf(path: &Path, labels: &[&str], sfreq: usize, data_uv: &Array2<f64>, annotations: &[(f64, f64, &str)]) {
    assert_eq!(data_uv.ncols() % sfreq, 0, "whole records only");
    let n_records = data_uv.ncols() / sfreq;

    let tal = |onset: f64, rest: &str| -> Vec<u8> {
        let mut t = format!("+{onset}").into_bytes();
        t.extend_from_slice(rest.as_bytes());
        t.push(0);
        t
    };
    let mut first = tal(0.0, "\x14\x14");
    for &(onset, dur, text) in annotations {
        first.extend(tal(onset, &format!("\x15{dur}\x14{text}\x14")));
    }
    let ann_spr = first.len().div_ceil(2).max(30);

    let ns = labels.len() + 1;
    let mut b = Vec::new();
    field(&mut b, "0", 8);
    field(&mut b, "X X X X", 80);
    field(&mut b, "Startdate 01-JAN-2020 X X X", 80);
    field(&mut b, "01.01.20", 8);
    field(&mut b, "00.00.00", 8);
    field(&mut b, &(256 * (ns + 1)).to_string(), 8);
    field(&mut b, "EDF+C", 44);
    field(&mut b, &n_records.to_string(), 8);
    field(&mut b, "1", 8);
    field(&mut b, &ns.to_string(), 4);

    let all: Vec<&str> = labels.iter().copied().chain(["EDF Annotations"]).collect();
    let is_ann = |i: usize| i == ns - 1;
    for l in &all {
        field(&mut b, l, 16);
    }
    for _ in &all {
        field(&mut b, "", 80);
    }
    for i in 0..ns {
        field(&mut b, if is_ann(i) { "" } else { "uV" }, 8);
    }
    for i in 0..ns {
        field(&mut b, if is_ann(i) { "-1" } else { "-3276.7" }, 8);
    }
    for i in 0..ns {
        field(&mut b, if is_ann(i) { "1" } else { "3276.7" }, 8);
    }
    for _ in &all {
        field(&mut b, "-32767", 8);
    }
    for _ in &all {
        field(&mut b, "32767", 8);
    }
    for _ in &all {
        field(&mut b, "", 80);
    }
    for i in 0..ns {
        field(&mut b, &(if is_ann(i) { ann_spr } else { sfreq }).to_string(), 8);
    }
    for _ in &all {
        field(&mut b, "", 32);
    }
    assert_eq!(b.len(), 256 * (ns + 1));

    for r in 0..n_records {
        for c in 0..labels.len() {
            for k in 0..sfreq {
                b.extend_from_slice(&digital(data_uv[[c, r * sfreq + k]]).to_le_bytes());
            }
        }
        let mut ann = if r == 0 { first.clone() } else { tal(r as f64, "\x14\x14") };
        ann.resize(ann_spr * 2, 0);
        b.extend_from_slice(&ann);
    }
    std::fs::write(path, b).unwrap();
}
