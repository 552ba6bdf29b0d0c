//! Conversion configuration.
//!
//! [`ConversionConfig`] holds every tunable parameter of a batch run. The
//! defaults reproduce the BCI Competition IV 2a/2b settings: cues 769/770,
//! C3/C4/Cz, 1–40 Hz band-pass, 32 × 32 GAF tiles upsampled to 256 px,
//! multitaper ERSP over 1–39 Hz.
//!
//! Every field has a serde default, so a JSON file only needs the keys it
//! changes:
//!
//! ```json
//! { "method": "ersp", "accepted_codes": [769, 770, 771, 772] }
//! ```
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::{LabelCode, LabelMap, WindowPadding};
use crate::batch::FileFilter;
use crate::channels::{bci_competition_iv_rules, ChannelRule};
use crate::colormap::ColorMap;
use crate::error::{ConvertError, Result};
use crate::render::ValueScale;

// ── Method ────────────────────────────────────────────────────────────────

/// Window-to-image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Gramian Angular Field of each cue window.
    Gaf,
    /// Event-related spectral perturbation averaged per class.
    Ersp,
}

impl Method {
    /// Top-level output folder. GAF difference images get their own folder.
    pub fn folder(self, difference: bool) -> &'static str {
        match (self, difference) {
            (Method::Gaf, false) => "GAF",
            (Method::Gaf, true) => "GAF-difference",
            (Method::Ersp, _) => "ERSP",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Gaf => "gaf",
            Method::Ersp => "ersp",
        })
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaf" => Ok(Method::Gaf),
            "ersp" => Ok(Method::Ersp),
            other => Err(format!("unknown method {other:?} (gaf, ersp)")),
        }
    }
}

// ── Sub-configs ───────────────────────────────────────────────────────────

/// Zero-phase FIR band-pass applied to the picked channels before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bandpass {
    /// Lower pass-band edge in Hz.
    pub l_freq: f64,
    /// Upper pass-band edge in Hz.
    pub h_freq: f64,
}

/// GAF encoder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GafConfig {
    /// Side of each per-channel field after PAA. Windows shorter than this
    /// use their own length.
    ///
    /// Default: `32`.
    pub image_size: usize,

    /// Also write Gramian Angular Difference Fields (to `GAF-difference/`).
    ///
    /// Default: `false`.
    pub difference_images: bool,
}

impl Default for GafConfig {
    fn default() -> Self {
        Self { image_size: 32, difference_images: false }
    }
}

/// Time-frequency kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TfrKernel {
    /// DPSS multitaper, as `mne.time_frequency.tfr_multitaper`.
    Multitaper,
    /// Complex Morlet wavelet, as `mne.time_frequency.tfr_morlet`.
    Morlet,
}

/// Cycles per wavelet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NCycles {
    /// `n_cycles = freq`: every wavelet lasts one second.
    PerFrequency,
    Fixed(f64),
}

impl NCycles {
    #[inline]
    pub fn at(self, freq: f64) -> f64 {
        match self {
            NCycles::PerFrequency => freq,
            NCycles::Fixed(n) => n,
        }
    }
}

/// ERSP encoder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErspConfig {
    /// Epoch start relative to the cue, seconds. Default: `-1.0`.
    pub tmin: f64,
    /// Epoch end relative to the cue, seconds (inclusive). Default: `4.0`.
    pub tmax: f64,
    /// First analysed frequency in Hz. Default: `1.0`.
    pub fmin: f64,
    /// Exclusive upper bound of the frequency grid. Default: `40.0`.
    pub fmax: f64,
    /// Grid step in Hz. Default: `1.0`.
    pub fstep: f64,
    /// Default: [`NCycles::PerFrequency`].
    pub n_cycles: NCycles,
    /// Multitaper time-bandwidth product; `floor(tb - 1)` tapers are used.
    /// Default: `4.0`.
    pub time_bandwidth: f64,
    /// Keep every `decim`-th power sample. Default: `2`.
    pub decim: usize,
    /// Percent-baseline interval in seconds; `None` disables the correction.
    /// Default: `Some((-1.0, 0.0))`.
    pub baseline: Option<(f64, f64)>,
    /// Default: [`TfrKernel::Multitaper`].
    pub kernel: TfrKernel,
}

impl Default for ErspConfig {
    fn default() -> Self {
        Self {
            tmin: -1.0,
            tmax: 4.0,
            fmin: 1.0,
            fmax: 40.0,
            fstep: 1.0,
            n_cycles: NCycles::PerFrequency,
            time_bandwidth: 4.0,
            decim: 2,
            baseline: Some((-1.0, 0.0)),
            kernel: TfrKernel::Multitaper,
        }
    }
}

impl ErspConfig {
    /// `fmin, fmin + fstep, …` strictly below `fmax`.
    ///
    /// ```
    /// use ts2image::ErspConfig;
    /// let freqs = ErspConfig::default().freqs();
    /// assert_eq!(freqs.len(), 39);
    /// assert_eq!(freqs[0], 1.0);
    /// assert_eq!(freqs[38], 39.0);
    /// ```
    pub fn freqs(&self) -> Vec<f64> {
        if self.fstep <= 0.0 || self.fmax <= self.fmin {
            return Vec::new();
        }
        let n = ((self.fmax - self.fmin) / self.fstep).ceil() as usize;
        (0..n)
            .map(|i| self.fmin + i as f64 * self.fstep)
            .filter(|&f| f < self.fmax)
            .collect()
    }
}

/// Which images to write per window (GAF) or per class (ERSP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// One image with all channels stacked vertically. Default: `true`.
    pub merge_channels: bool,
    /// One image per channel, suffixed `-Ch-{n}`. Default: `false`.
    pub intermediate_images: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { merge_channels: true, intermediate_images: false }
    }
}

/// Rendering overrides. `None` picks the method's default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// GAF: viridis. ERSP: rdbu.
    pub colormap: Option<ColorMap>,
    /// GAF: auto. ERSP: fixed −1 … 1.
    pub scale: Option<ValueScale>,
    /// Images with fewer rows are resized to `min_size × min_size`;
    /// `Some(0)` disables. GAF: 256. ERSP: disabled.
    pub min_size: Option<u32>,
    /// Also write each array as `{stem}.safetensors`.
    pub export_arrays: bool,
}

/// Rendering parameters after per-method defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub colormap: ColorMap,
    pub scale: ValueScale,
    pub min_size: Option<u32>,
    pub export_arrays: bool,
}

impl RenderConfig {
    pub fn resolve(&self, method: Method) -> RenderSettings {
        let (cmap, scale, min_size) = match method {
            Method::Gaf => (ColorMap::Viridis, ValueScale::Auto, Some(256)),
            Method::Ersp => (ColorMap::RdBu, ValueScale::Fixed { vmin: -1.0, vmax: 1.0 }, None),
        };
        RenderSettings {
            colormap: self.colormap.unwrap_or(cmap),
            scale: self.scale.unwrap_or(scale),
            min_size: match self.min_size {
                Some(0) => None,
                Some(n) => Some(n),
                None => min_size,
            },
            export_arrays: self.export_arrays,
        }
    }
}

// ── Top level ─────────────────────────────────────────────────────────────

/// Configuration for a batch conversion.
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use ts2image::{ConversionConfig, Method};
///
/// let cfg = ConversionConfig {
///     method: Method::Ersp,
///     bandpass: None,          // feed raw data to the encoder
///     ..ConversionConfig::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Default: [`Method::Gaf`].
    pub method: Method,

    /// Event codes that produce windows; everything else is ignored.
    ///
    /// Default: `{769, 770}` (cue left / cue right).
    pub accepted_codes: BTreeSet<LabelCode>,

    /// Code → class name; names become output folders.
    ///
    /// Default: [`LabelMap::bci_competition_iv`].
    pub labels: LabelMap,

    /// File-name prefix → channel names. First match wins.
    ///
    /// Default: [`bci_competition_iv_rules`].
    pub channel_rules: Vec<ChannelRule>,

    /// Channels for files no rule matches. `None` makes an unmatched file a
    /// configuration error; `Some(vec![])` keeps every channel.
    ///
    /// Default: `None`.
    pub default_channels: Option<Vec<String>>,

    /// Which files of the input directory are converted.
    pub file_filter: FileFilter,

    /// Default: 1–40 Hz.
    pub bandpass: Option<Bandpass>,

    /// Seconds added around each GAF cue window. Default: none.
    pub padding: WindowPadding,

    pub gaf: GafConfig,
    pub ersp: ErspConfig,
    pub images: ImageOptions,
    pub render: RenderConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            method: Method::Gaf,
            accepted_codes: [769, 770].into_iter().map(LabelCode).collect(),
            labels: LabelMap::bci_competition_iv(),
            channel_rules: bci_competition_iv_rules(),
            default_channels: None,
            file_filter: FileFilter::default(),
            bandpass: Some(Bandpass { l_freq: 1.0, h_freq: 40.0 }),
            padding: WindowPadding::default(),
            gaf: GafConfig::default(),
            ersp: ErspConfig::default(),
            images: ImageOptions::default(),
            render: RenderConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Read a JSON file; absent keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| ConvertError::InvalidConfig(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check parameter ranges that do not depend on a recording.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(ConvertError::InvalidConfig(msg));

        if let Some(bp) = self.bandpass {
            if !(bp.l_freq > 0.0 && bp.h_freq > bp.l_freq) {
                return bad(format!("band-pass needs 0 < l_freq < h_freq, got {} – {}", bp.l_freq, bp.h_freq));
            }
        }
        if self.padding.before < 0.0 || self.padding.after < 0.0 {
            return bad(format!("negative window padding {:?}", self.padding));
        }
        if self.gaf.image_size == 0 {
            return bad("gaf.image_size must be at least 1".into());
        }
        if !self.images.merge_channels && !self.images.intermediate_images {
            return bad("images: enable merge_channels, intermediate_images or both".into());
        }

        let e = &self.ersp;
        if e.tmin >= e.tmax {
            return bad(format!("ersp.tmin ({}) must be below ersp.tmax ({})", e.tmin, e.tmax));
        }
        if e.fstep <= 0.0 || e.fmin <= 0.0 || e.fmax <= e.fmin {
            return bad(format!("ersp frequency grid {}:{}:{} is empty", e.fmin, e.fstep, e.fmax));
        }
        if e.decim == 0 {
            return bad("ersp.decim must be at least 1".into());
        }
        if let NCycles::Fixed(n) = e.n_cycles {
            if n <= 0.0 {
                return bad(format!("ersp.n_cycles must be positive, got {n}"));
            }
        }
        if e.kernel == TfrKernel::Multitaper && e.time_bandwidth < 2.0 {
            return bad(format!("ersp.time_bandwidth must be at least 2.0, got {}", e.time_bandwidth));
        }
        if let Some((a, b)) = e.baseline {
            if a >= b || a < e.tmin || b > e.tmax {
                return bad(format!("ersp.baseline ({a}, {b}) must be an interval inside [{}, {}]", e.tmin, e.tmax));
            }
        }
        if let Some(ValueScale::Fixed { vmin, vmax }) = self.render.scale {
            if vmin >= vmax {
                return bad(format!("render.scale: vmin ({vmin}) must be below vmax ({vmax})"));
            }
        }
        if self.accepted_codes.is_empty() {
            log::warn!("no accepted label codes: nothing will be converted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ConversionConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.accepted_codes.len(), 2);
        assert_eq!(cfg.labels.get(LabelCode(769)), Some("Cue onset left (class 1)"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ConversionConfig =
            serde_json::from_str(r#"{ "method": "ersp", "ersp": { "decim": 4 } }"#).unwrap();
        assert_eq!(cfg.method, Method::Ersp);
        assert_eq!(cfg.ersp.decim, 4);
        assert_eq!(cfg.ersp.tmax, 4.0);
        assert_eq!(cfg.gaf.image_size, 32);
    }

    #[test]
    fn label_map_from_json_object() {
        let cfg: ConversionConfig = serde_json::from_str(
            r#"{ "accepted_codes": [1, 2], "labels": { "1": "Left", "2": "Right" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.labels.get(LabelCode(2)), Some("Right"));
        assert!(cfg.accepted_codes.contains(&LabelCode(1)));
    }

    #[test]
    fn json_round_trip() {
        let cfg = ConversionConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: ConversionConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn inverted_band_rejected() {
        let cfg = ConversionConfig {
            bandpass: Some(Bandpass { l_freq: 40.0, h_freq: 1.0 }),
            ..ConversionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn baseline_outside_epoch_rejected() {
        let mut cfg = ConversionConfig::default();
        cfg.ersp.baseline = Some((-2.0, 0.0));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn render_defaults_per_method() {
        let r = RenderConfig::default();
        let gaf = r.resolve(Method::Gaf);
        assert_eq!(gaf.colormap, ColorMap::Viridis);
        assert_eq!(gaf.min_size, Some(256));
        let ersp = r.resolve(Method::Ersp);
        assert_eq!(ersp.colormap, ColorMap::RdBu);
        assert_eq!(ersp.scale, ValueScale::Fixed { vmin: -1.0, vmax: 1.0 });
        assert_eq!(ersp.min_size, None);

        let off = RenderConfig { min_size: Some(0), ..RenderConfig::default() };
        assert_eq!(off.resolve(Method::Gaf).min_size, None);
    }

    #[test]
    fn method_folders() {
        assert_eq!(Method::Gaf.folder(false), "GAF");
        assert_eq!(Method::Gaf.folder(true), "GAF-difference");
        assert_eq!(Method::Ersp.folder(false), "ERSP");
        assert_eq!("ERSP".parse::<Method>(), Ok(Method::Ersp));
    }

    #[test]
    fn freq_grid_excludes_fmax() {
        let e = ErspConfig { fmin: 4.0, fmax: 8.0, fstep: 2.0, ..ErspConfig::default() };
        assert_eq!(e.freqs(), vec![4.0, 6.0]);
    }
}
