//! Batch driver: directory → filtered file list → images.
//!
//! ```text
//! input_dir
//!   │  discover()                 FileFilter, sorted by name
//!   ▼
//! for each file (sequential, isolated)
//!   ├─ open_recording()           GDF / EDF(+) → Recording
//!   ├─ channels_for_file()        naming convention → channel names
//!   ├─ select + pick              [C, T]
//!   ├─ band-pass (optional)       zero-phase FIR
//!   ├─ extract + label windows    accepted cues → class names
//!   └─ encode + write
//!        GAF:  crop → gaf() → {root}/GAF[-difference]/{class}/{stem}-{i}[-Ch-{c}].png
//!        ERSP: epochs → TFR → baseline → mean per code → {root}/ERSP/{class}/{stem}-{i}[-Ch-{c}].png
//! ```
//! A failing file is logged and recorded in the [`BatchReport`]; the batch
//! continues with the next one.
use std::path::{Path, PathBuf};

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::annotation::{extract_windows, extract_windows_padded, label_windows, LabeledWindow};
use crate::channels::{channels_for_file, select_channels};
use crate::config::{ConversionConfig, Method};
use crate::epoch::{epochs_around, events_from_windows};
use crate::error::{ConvertError, Result};
use crate::filter::bandpass_inplace;
use crate::gaf::{gaf, GafKind};
use crate::normalize::percent_baseline_inplace;
use crate::recording::{open_recording, Recording};
use crate::render::{sanitize_segment, stack_channels, ImageWriter};
use crate::tfr::{average_epochs, decimated_times, TfrPlan};

// ── File filter ───────────────────────────────────────────────────────────

/// Which files of the input directory are converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    /// Allowed extensions, case-insensitive, without the dot. Empty = any.
    ///
    /// Default: `["gdf"]`.
    pub extensions: Vec<String>,
    /// Keep only training sessions (stem ends with `T`). Default: `true`.
    pub training_only: bool,
    /// File name must start with one of these. Empty = any.
    pub prefixes: Vec<String>,
    /// Exact file names to skip.
    pub exclude: Vec<String>,
    /// File-name endings to skip.
    pub exclude_suffixes: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            extensions: vec!["gdf".into()],
            training_only: true,
            prefixes: Vec::new(),
            exclude: Vec::new(),
            exclude_suffixes: Vec::new(),
        }
    }
}

impl FileFilter {
    /// BCI Competition IV 2b without the smiley-feedback sessions.
    pub fn bci_iv_2b() -> Self {
        Self {
            prefixes: vec!["B".into()],
            exclude_suffixes: vec!["03T.gdf".into(), "04E.gdf".into(), "05E.gdf".into()],
            ..Self::default()
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let path = Path::new(file_name);
        if !self.extensions.is_empty() {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
            if !self.extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)) {
                return false;
            }
        }
        if self.training_only {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if !stem.ends_with('T') {
                return false;
            }
        }
        if !self.prefixes.is_empty() && !self.prefixes.iter().any(|p| file_name.starts_with(p.as_str())) {
            return false;
        }
        if self.exclude.iter().any(|e| e == file_name) {
            return false;
        }
        !self.exclude_suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
    }
}

/// Regular files in `dir` accepted by `filter`, sorted by name.
pub fn discover(dir: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if filter.matches(name) {
            files.push(path);
        } else {
            log::debug!("skipping {name}: excluded by file filter");
        }
    }
    files.sort();
    Ok(files)
}

// ── Report ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: PathBuf,
    /// [`ConvertError::kind`] of the error.
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
    /// Images written over all processed files.
    pub images: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

// ── Driver ────────────────────────────────────────────────────────────────

/// Converts recordings with one fixed configuration.
#[derive(Debug, Clone)]
pub struct BatchDriver {
    config: ConversionConfig,
    output_root: PathBuf,
    writer: ImageWriter,
}

impl BatchDriver {
    /// Validates `config` up front so a bad parameter fails once, not per file.
    pub fn new(config: ConversionConfig, output_root: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        let writer = ImageWriter::new(config.render.resolve(config.method));
        Ok(Self { config, output_root: output_root.into(), writer })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Convert every matching file of `input_dir`.
    ///
    /// Only discovery failures abort; per-file errors land in the report.
    pub fn run(&self, input_dir: &Path) -> Result<BatchReport> {
        let files = discover(input_dir, &self.config.file_filter)?;
        log::info!("{} file(s) to convert in {}", files.len(), input_dir.display());
        Ok(self.run_files(&files))
    }

    /// Convert `files` in order, isolating failures.
    pub fn run_files(&self, files: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, path) in files.iter().enumerate() {
            let name = display_name(path);
            log::info!("[{}/{}] {name}: started ({})", i + 1, files.len(), self.config.method);
            match self.process_file(path) {
                Ok(images) => {
                    log::info!("[{}/{}] {name}: finished, {} image(s)", i + 1, files.len(), images.len());
                    report.images += images.len();
                    report.processed.push(path.clone());
                }
                Err(e) => {
                    log::error!("[{}/{}] {name}: failed: {e}", i + 1, files.len());
                    report.failed.push(FailedFile { path: path.clone(), kind: e.kind(), message: e.to_string() });
                }
            }
        }
        log::info!(
            "processed {}, failed {} ({} images under {})",
            report.processed.len(),
            report.failed.len(),
            report.images,
            self.output_root.display()
        );
        report
    }

    /// Convert one recording; returns the written image paths.
    pub fn process_file(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let (rec, windows) = self.prepare(path)?;
        if windows.is_empty() {
            log::warn!("{}: no accepted cues", rec.file_name());
            return Ok(Vec::new());
        }
        match self.config.method {
            Method::Gaf => self.gaf_images(&rec, &windows),
            Method::Ersp => self.ersp_images(&rec, &windows),
        }
    }

    /// Load, pick, filter and label. Shared by both methods.
    fn prepare(&self, path: &Path) -> Result<(Recording, Vec<LabeledWindow>)> {
        let cfg = &self.config;
        let mut rec = open_recording(path)?;
        let file = rec.file_name();

        let wanted = channels_for_file(&file, &cfg.channel_rules, cfg.default_channels.as_deref())?;
        let picks = select_channels(&rec.ch_names, &wanted, &file)?;
        rec.pick_channels(&picks);
        log::debug!("{file}: channels {:?}", rec.ch_names);

        if let Some(bp) = cfg.bandpass {
            bandpass_inplace(&mut rec.data, rec.sfreq, bp.l_freq, bp.h_freq)
                .map_err(|e| ConvertError::configuration(&file, format!("{e:#}")))?;
        }

        let windows = match cfg.method {
            Method::Gaf => extract_windows_padded(&rec.annotations, &cfg.accepted_codes, cfg.padding),
            Method::Ersp => extract_windows(&rec.annotations, &cfg.accepted_codes),
        };
        let labeled = label_windows(&windows, &cfg.labels, &file)?;
        log::info!("{file}: {} accepted cue(s) of {} annotations", labeled.len(), rec.annotations.len());
        Ok((rec, labeled))
    }

    fn gaf_images(&self, rec: &Recording, windows: &[LabeledWindow]) -> Result<Vec<PathBuf>> {
        let stem = rec.file_stem();
        let mut kinds = vec![GafKind::Summation];
        if self.config.gaf.difference_images {
            kinds.push(GafKind::Difference);
        }

        let mut written = Vec::new();
        for lw in windows {
            let w = &lw.window;
            let data = rec.crop(w.start_time, w.end_time)?;
            log::info!(
                "{}: cue #{} ({}) {:.3}–{:.3} s, {} samples",
                rec.file_name(),
                w.index,
                lw.label_name,
                w.start_time,
                w.end_time,
                data.ncols()
            );
            for &kind in &kinds {
                let fields = gaf(data.view(), self.config.gaf.image_size, kind);
                let folder = self
                    .output_root
                    .join(Method::Gaf.folder(kind == GafKind::Difference))
                    .join(sanitize_segment(&lw.label_name));
                written.extend(self.write_channels(&fields, &folder, &format!("{stem}-{}", w.index))?);
            }
        }
        Ok(written)
    }

    fn ersp_images(&self, rec: &Recording, windows: &[LabeledWindow]) -> Result<Vec<PathBuf>> {
        let cfg = &self.config.ersp;
        let file = rec.file_name();
        let cues: Vec<_> = windows.iter().map(|lw| lw.window).collect();

        let events = events_from_windows(&cues, rec.sfreq, &file)?;
        let epochs = epochs_around(&rec.data, &events, rec.sfreq, cfg.tmin, cfg.tmax);
        if epochs.is_empty() {
            log::warn!("{file}: every epoch fell outside the recording");
            return Ok(Vec::new());
        }

        let plan = TfrPlan::from_config(cfg, rec.sfreq);
        let times = decimated_times(epochs.tmin, epochs.sfreq, epochs.n_times(), plan.decim);
        let stem = rec.file_stem();
        let mut written = Vec::new();
        for (position, &code) in self.config.accepted_codes.iter().enumerate() {
            let selected = epochs.select(code);
            if selected.is_empty() {
                continue;
            }
            let mut power = plan
                .power(&selected)
                .map_err(|e| ConvertError::configuration(&file, format!("{e:#}")))?;
            if let Some(baseline) = cfg.baseline {
                percent_baseline_inplace(&mut power, &times, baseline)
                    .map_err(|e| ConvertError::configuration(&file, format!("{e:#}")))?;
            }
            let Some(avg) = average_epochs(&power) else {
                continue;
            };
            let name = self.config.labels.name_of(code, &file)?;
            log::info!("{file}: {name}: {} epoch(s) averaged, power {:?}", selected.dim().0, avg.dim());
            let folder = self.output_root.join(Method::Ersp.folder(false)).join(sanitize_segment(name));
            written.extend(self.write_channels(&avg, &folder, &format!("{stem}-{position}"))?);
        }
        Ok(written)
    }

    /// Merged `[C·R, cols]` image and/or one image per channel.
    fn write_channels(&self, a: &Array3<f64>, folder: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if self.config.images.merge_channels {
            written.push(self.writer.write(stack_channels(a).view(), folder, stem)?);
        }
        if self.config.images.intermediate_images {
            for (c, channel) in a.outer_iter().enumerate() {
                written.push(self.writer.write(channel, folder, &format!("{stem}-Ch-{c}"))?);
            }
        }
        Ok(written)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
