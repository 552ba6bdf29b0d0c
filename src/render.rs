//! Image writer: scalar array → colour-mapped PNG.
//!
//! ```text
//! [rows, cols] f64
//!   ├─ ValueScale          auto (min/max) or fixed (clamped) → [0, 1]
//!   ├─ resize              rows < min_size → min_size × min_size (bilinear)
//!   ├─ ColorMap            [0, 1] → RGB
//!   └─ PNG                 {folder}/{stem}.png   (+ {stem}.safetensors)
//! ```
//! Row 0 is the top of the image.
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;
use crate::config::RenderSettings;
use crate::error::{ConvertError, Result};
use crate::io::TensorFile;

/// Mapping of array values onto the colour map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueScale {
    /// Array minimum → 0, maximum → 1. A constant array renders at 0.
    Auto,
    /// `vmin` → 0, `vmax` → 1; values outside are clamped.
    Fixed { vmin: f64, vmax: f64 },
}

impl ValueScale {
    /// `(lo, hi)` for `values`, ignoring NaN.
    pub fn bounds<'a>(self, values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
        match self {
            ValueScale::Fixed { vmin, vmax } => (vmin, vmax),
            ValueScale::Auto => {
                let (lo, hi) = values
                    .filter(|v| !v.is_nan())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                if lo.is_finite() { (lo, hi) } else { (0.0, 0.0) }
            }
        }
    }
}

/// Replace path separators so a class name is a single folder.
pub fn sanitize_segment(name: &str) -> String {
    name.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }).collect()
}

/// Stack the channels of `[C, R, cols]` vertically into `[C·R, cols]`,
/// channel 0 on top.
pub fn stack_channels(a: &Array3<f64>) -> Array2<f64> {
    let (c, r, cols) = a.dim();
    if r == 0 {
        return Array2::zeros((0, cols));
    }
    Array2::from_shape_fn((c * r, cols), |(i, j)| a[[i / r, i % r, j]])
}

/// Renders arrays to PNG files with fixed settings.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    settings: RenderSettings,
}

impl ImageWriter {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Write `array` as `{folder}/{file_stem}.png`, creating `folder`.
    /// An existing file is overwritten.
    pub fn write(&self, array: ArrayView2<'_, f64>, folder: &Path, file_stem: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(folder).map_err(|e| ConvertError::io(folder, e))?;
        let path = folder.join(format!("{file_stem}.png"));

        let img = self.render(array);
        img.save_with_format(&path, ImageFormat::Png)
            .map_err(|source| ConvertError::Image { path: path.clone(), source })?;

        if self.settings.export_arrays {
            let tensor_path = folder.join(format!("{file_stem}.safetensors"));
            let mut tf = TensorFile::new();
            tf.add("image", array.into_dyn());
            tf.meta("colormap", self.settings.colormap.name());
            tf.write(&tensor_path).map_err(|e| {
                ConvertError::io(&tensor_path, std::io::Error::other(format!("{e:#}")))
            })?;
        }
        log::trace!("wrote {}", path.display());
        Ok(path)
    }

    /// Colour-mapped RGB image, resized when the array is shorter than
    /// `min_size` rows.
    pub fn render(&self, array: ArrayView2<'_, f64>) -> RgbImage {
        let (rows, cols) = array.dim();
        let (lo, hi) = self.settings.scale.bounds(array.iter());
        let span = hi - lo;
        let unit: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
            let v = array[[y as usize, x as usize]];
            let t = if span > 0.0 { ((v - lo) / span).clamp(0.0, 1.0) } else { 0.0 };
            Luma([t as f32])
        });

        let unit = match self.settings.min_size {
            Some(side) if (rows as u32) < side => imageops::resize(&unit, side, side, FilterType::Triangle),
            _ => unit,
        };

        let cmap: ColorMap = self.settings.colormap;
        ImageBuffer::from_fn(unit.width(), unit.height(), |x, y| {
            Rgb(cmap.to_rgb(unit.get_pixel(x, y)[0] as f64))
        })
    }
}
