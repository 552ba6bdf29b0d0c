//! # ts2image: EEG recordings to classifier training images
//!
//! `ts2image` converts cue-labelled EEG recordings (GDF 1.x/2.x, EDF/EDF+)
//! into 2-D images: one Gramian Angular Field per cue window, or one
//! event-related spectral perturbation (ERSP) map per class and file. The
//! images land in a folder tree keyed by class name, ready for an image
//! classifier.
//!
//! Every numeric step is native Rust on [`ndarray`] and
//! [RustFFT](https://crates.io/crates/rustfft), following the behaviour of
//! MNE-Python (filtering, multitaper/Morlet TFR, percent baseline) and pyts
//! (GAF).
//!
//! ## Pipeline overview
//!
//! ```text
//! A01T.gdf
//!   │
//!   ├─ recording::open_recording()   native GDF / EDF(+) reader → [C, T] volts + annotations
//!   ├─ channels                      file-name rule → picked channels
//!   ├─ filter                        zero-phase FIR band-pass (default 1–40 Hz)
//!   ├─ annotation                    accepted cue codes → CueWindow → class name
//!   │
//!   ├─ GAF                           crop → PAA → GASF / GADF      [C, 32, 32]
//!   └─ ERSP                          epochs → multitaper power → % baseline → mean per class
//!        │                                                         [C, F, T']
//!        └─→ render::ImageWriter     colour map → {root}/{GAF|GAF-difference|ERSP}/{class}/{stem}-{i}.png
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use ts2image::{BatchDriver, ConversionConfig, Method};
//!
//! let cfg = ConversionConfig { method: Method::Ersp, ..ConversionConfig::default() };
//! let driver = BatchDriver::new(cfg, "images")?;
//! let report = driver.run(Path::new("datasets/bci-iv-2a"))?;
//! println!("processed {}, failed {}", report.processed.len(), report.failed.len());
//! # Ok::<(), ts2image::ConvertError>(())
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use ts2image::{extract_windows, gaf, open_recording, GafKind, LabelCode};
//!
//! let mut rec = open_recording("A01T.gdf")?;
//! ts2image::filter::bandpass_inplace(&mut rec.data, rec.sfreq, 1.0, 40.0)
//!     .map_err(|e| ts2image::ConvertError::configuration(rec.file_name(), e.to_string()))?;
//!
//! let accepted: BTreeSet<LabelCode> = [LabelCode(769), LabelCode(770)].into();
//! for w in extract_windows(&rec.annotations, &accepted) {
//!     let window = rec.crop(w.start_time, w.end_time)?;
//!     let fields = gaf(window.view(), 32, GafKind::Summation); // [C, 32, 32]
//!     println!("cue {} → {:?}", w.index, fields.dim());
//! }
//! # Ok::<(), ts2image::ConvertError>(())
//! ```

pub mod annotation;
pub mod batch;
pub mod channels;
pub mod colormap;
pub mod config;
pub mod edf;
pub mod epoch;
pub mod error;
pub mod filter;
pub mod gaf;
pub mod gdf;
pub mod io;
pub mod normalize;
pub mod recording;
pub mod render;
pub mod tfr;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `ts2image::Foo` without having to know the internal module layout.

// annotation
pub use annotation::{
    extract_windows, extract_windows_padded, label_windows, normalize_label,
    Annotation, CueWindow, Description, LabelCode, LabelMap, LabeledWindow, WindowPadding,
};

// batch
pub use batch::{discover, BatchDriver, BatchReport, FailedFile, FileFilter};

// channels
pub use channels::{bci_competition_iv_rules, channels_for_file, select_channels, ChannelRule};

// config
pub use colormap::ColorMap;
pub use config::{
    Bandpass, ConversionConfig, ErspConfig, GafConfig, ImageOptions, Method, NCycles,
    RenderConfig, RenderSettings, TfrKernel,
};

// epoch
pub use epoch::{epochs_around, events_from_windows, Epochs, Event};

// error
pub use error::{ConvertError, Result};

// encoders
pub use gaf::{gaf, gaf_1d, GafKind};
pub use normalize::percent_baseline_inplace;
pub use tfr::{average_epochs, decimated_times, TfrPlan};

// readers
pub use edf::{open_edf, RawEdf};
pub use gdf::{open_gdf, RawGdf};
pub use recording::{open_recording, Recording};

// render
pub use render::{sanitize_segment, stack_channels, ImageWriter, ValueScale};
