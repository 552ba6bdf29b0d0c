//! European Data Format reader (EDF and EDF+).
//!
//! # Quick start
//! ```no_run
//! use ts2image::edf::open_edf;
//!
//! let raw = open_edf("data/S001R04.edf").unwrap();
//! println!("{} channels @ {} Hz, {} annotations",
//!     raw.ch_names.len(), raw.sfreq, raw.annotations.len());
//! ```
pub mod header;
pub mod raw;
pub mod tal;

pub use header::{read_header, EdfHeader, SignalHeader, ANNOTATION_LABEL};
pub use raw::{open_edf, unit_scale, RawEdf};
pub use tal::{parse_tals, Tal};
