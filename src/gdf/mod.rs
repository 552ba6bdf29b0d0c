//! General Data Format reader (GDF 1.x and 2.x), as used by the
//! BCI Competition IV datasets.
//!
//! # Quick start
//! ```no_run
//! use ts2image::gdf::open_gdf;
//!
//! let raw = open_gdf("data/B0101T.gdf").unwrap();
//! println!("GDF {}: {} channels @ {} Hz, {} events",
//!     raw.header.version, raw.ch_names.len(), raw.sfreq, raw.events.len());
//! ```
pub mod events;
pub mod header;
pub mod raw;
pub mod types;

pub use events::{read_event_table, EventTable};
pub use header::{read_header, GdfChannel, GdfHeader};
pub use raw::{open_gdf, RawGdf};
pub use types::SampleType;
