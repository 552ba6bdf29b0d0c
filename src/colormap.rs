//! Colour maps for rendering scalar images.
//!
//! Every map takes a value already normalised to `[0, 1]` (out-of-range
//! input is clamped) and returns an RGB triple.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMap {
    /// Perceptually uniform, matplotlib's default. Used for GAF images.
    Viridis,
    Magma,
    Gray,
    /// Diverging red → white → blue; zero sits on white when the value
    /// range is symmetric. Used for ERSP images.
    RdBu,
}

impl ColorMap {
    pub fn to_rgb(self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            ColorMap::Viridis => viridis(t),
            ColorMap::Magma => magma(t),
            ColorMap::Gray => {
                let g = (t * 255.0).round() as u8;
                [g, g, g]
            }
            ColorMap::RdBu => lerp_table(&RDBU, t),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorMap::Viridis => "viridis",
            ColorMap::Magma => "magma",
            ColorMap::Gray => "gray",
            ColorMap::RdBu => "rdbu",
        }
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMap {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "viridis" => Ok(ColorMap::Viridis),
            "magma" => Ok(ColorMap::Magma),
            "gray" | "grey" | "grayscale" => Ok(ColorMap::Gray),
            "rdbu" => Ok(ColorMap::RdBu),
            other => Err(format!("unknown colour map {other:?} (viridis, magma, gray, rdbu)")),
        }
    }
}

fn to_u8(r: f64, g: f64, b: f64) -> [u8; 3] {
    let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [c(r), c(g), c(b)]
}

// Polynomial fits of the matplotlib maps.
fn viridis(t: f64) -> [u8; 3] {
    let r = 0.267004 + t * (0.003991 + t * (1.096452 + t * (-2.146305 + t * 1.167419)));
    let g = 0.004874 + t * (1.015861 + t * (-0.107203 + t * (-0.449175 + t * 0.539506)));
    let b = 0.329415 + t * (1.421511 + t * (-2.482568 + t * (1.871714 + t * (-0.140092))));
    to_u8(r, g, b)
}

fn magma(t: f64) -> [u8; 3] {
    let r = 0.001462 + t * (0.169823 + t * (2.240361 + t * (-1.106994)));
    let g = 0.000466 + t * (0.100897 + t * (0.699060 + t * 0.203185));
    let b = 0.013866 + t * (0.563622 + t * (-0.543021 + t * 0.966020));
    to_u8(r, g, b)
}

/// ColorBrewer RdBu, 11 classes.
const RDBU: [[u8; 3]; 11] = [
    [103, 0, 31],
    [178, 24, 43],
    [214, 96, 77],
    [244, 165, 130],
    [253, 219, 199],
    [247, 247, 247],
    [209, 229, 240],
    [146, 197, 222],
    [67, 147, 195],
    [33, 102, 172],
    [5, 48, 97],
];

fn lerp_table(table: &[[u8; 3]], t: f64) -> [u8; 3] {
    let pos = t * (table.len() - 1) as f64;
    let i = (pos.floor() as usize).min(table.len() - 2);
    let frac = pos - i as f64;
    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = table[i][c] as f64;
        let b = table[i + 1][c] as f64;
        out[c] = (a + (b - a) * frac).round() as u8;
    }
    out
}
