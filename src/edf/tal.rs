//! EDF+ time-stamped annotation lists (TALs).
//!
//! Each data record's `EDF Annotations` signal holds one or more TALs:
//!
//! ```text
//! +onset [0x15 duration] 0x14 text 0x14 [text 0x14 …] 0x00
//! ```
//! The first TAL of every record is a time-keeping entry with no text;
//! unused bytes after the last TAL are zero.
use anyhow::{bail, Context, Result};

const SEP_DURATION: u8 = 0x15;
const SEP_TEXT: u8 = 0x14;

/// One parsed TAL.
#[derive(Debug, Clone, PartialEq)]
pub struct Tal {
    pub onset: f64,
    pub duration: Option<f64>,
    pub texts: Vec<String>,
}

impl Tal {
    /// Time-keeping TALs carry no annotation text.
    #[inline]
    pub fn is_timekeeping(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Parse every TAL in one record's annotation bytes.
pub fn parse_tals(bytes: &[u8]) -> Result<Vec<Tal>> {
    let mut out = Vec::new();
    for chunk in bytes.split(|&b| b == 0) {
        if chunk.is_empty() {
            continue;
        }
        out.push(parse_one(chunk)?);
    }
    Ok(out)
}

fn parse_one(chunk: &[u8]) -> Result<Tal> {
    let mut parts = chunk.split(|&b| b == SEP_TEXT);
    let stamp = parts.next().unwrap_or_default();
    let (onset_raw, duration_raw) = match stamp.iter().position(|&b| b == SEP_DURATION) {
        Some(p) => (&stamp[..p], Some(&stamp[p + 1..])),
        None => (stamp, None),
    };

    let onset_str = latin1(onset_raw);
    if !onset_str.starts_with('+') && !onset_str.starts_with('-') {
        bail!("TAL onset must be signed, got {onset_str:?}");
    }
    let onset = onset_str
        .parse::<f64>()
        .with_context(|| format!("invalid TAL onset {onset_str:?}"))?;
    let duration = match duration_raw {
        Some(d) if !d.is_empty() => {
            let s = latin1(d);
            Some(s.parse::<f64>().with_context(|| format!("invalid TAL duration {s:?}"))?)
        }
        _ => None,
    };

    let texts = parts
        .filter(|t| !t.is_empty())
        .map(|t| String::from_utf8_lossy(t).into_owned())
        .collect();
    Ok(Tal { onset, duration, texts })
}

fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}
