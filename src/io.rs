//! Raw-array export in the safetensors layout.
//!
//! ```text
//! ┌ u64 LE: header length N ┐┌ N bytes JSON header, space padded to 8 ┐┌ tensor bytes … ┐
//! ```
//! The header maps each tensor name to `{dtype, shape, data_offsets}` and may
//! carry a `__metadata__` object of string pairs. Only `F64` is written,
//! which is what the encoders produce.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, ArrayViewD, IxDyn};

/// Collects tensors and writes them as one safetensors file.
///
/// ```no_run
/// use ndarray::Array2;
/// use ts2image::io::TensorFile;
///
/// let img = Array2::<f64>::zeros((96, 32));
/// let mut f = TensorFile::new();
/// f.add("image", img.view().into_dyn());
/// f.meta("class", "Cue onset left (class 1)");
/// f.write("out/A01T-0.safetensors").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct TensorFile {
    tensors: Vec<(String, Vec<usize>, Vec<u8>)>,
    metadata: BTreeMap<String, String>,
}

impl TensorFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, array: ArrayViewD<'_, f64>) {
        let bytes = array.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.tensors.push((name.to_string(), array.shape().to_vec(), bytes));
    }

    pub fn meta(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut header = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header.insert("__metadata__".into(), serde_json::to_value(&self.metadata)?);
        }
        let mut offset = 0usize;
        for (name, shape, bytes) in &self.tensors {
            header.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": "F64",
                    "shape": shape,
                    "data_offsets": [offset, offset + bytes.len()],
                }),
            );
            offset += bytes.len();
        }
        let mut head = serde_json::to_vec(&header)?;
        head.resize(head.len().next_multiple_of(8), b' ');

        let mut f = std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?,
        );
        f.write_all(&(head.len() as u64).to_le_bytes())?;
        f.write_all(&head)?;
        for (_, _, bytes) in &self.tensors {
            f.write_all(bytes)?;
        }
        f.flush()?;
        Ok(())
    }
}

/// Read one `F64` tensor back, e.g. the `image` array exported next to a PNG.
pub fn read_tensor<P: AsRef<Path>>(path: P, name: &str) -> Result<ArrayD<f64>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    if bytes.len() < 8 {
        bail!("{}: file too small for a safetensors header", path.display());
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    let head_end = 8usize.checked_add(n).filter(|&e| e <= bytes.len()).context("header length out of range")?;
    let header: serde_json::Value =
        serde_json::from_slice(&bytes[8..head_end]).context("parse safetensors header")?;

    let entry = header.get(name).with_context(|| format!("no tensor {name:?}"))?;
    if entry["dtype"] != "F64" {
        bail!("tensor {name:?} has dtype {}, expected F64", entry["dtype"]);
    }
    let shape: Vec<usize> = entry["shape"]
        .as_array()
        .context("shape is not an array")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad dimension"))
        .collect::<Result<_>>()?;
    let offsets = entry["data_offsets"].as_array().context("data_offsets is not an array")?;
    let (s, e) = match (offsets.first().and_then(|v| v.as_u64()), offsets.get(1).and_then(|v| v.as_u64())) {
        (Some(s), Some(e)) => (head_end + s as usize, head_end + e as usize),
        _ => bail!("bad data_offsets for {name:?}"),
    };
    if e > bytes.len() || s > e {
        bail!("tensor {name:?} data out of range");
    }
    let data: Vec<f64> = bytes[s..e]
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), data)?)
}
