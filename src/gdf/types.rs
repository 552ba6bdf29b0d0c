//! GDF sample data types.
//!
//! | code | type | bytes |
//! |------|------|-------|
//! | 1    | i8   | 1     |
//! | 2    | u8   | 1     |
//! | 3    | i16  | 2     |
//! | 4    | u16  | 2     |
//! | 5    | i32  | 4     |
//! | 6    | u32  | 4     |
//! | 7    | i64  | 8     |
//! | 8    | u64  | 8     |
//! | 16   | f32  | 4     |
//! | 17   | f64  | 8     |
//!
//! All values are little-endian.
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl SampleType {
    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            1 => SampleType::I8,
            2 => SampleType::U8,
            3 => SampleType::I16,
            4 => SampleType::U16,
            5 => SampleType::I32,
            6 => SampleType::U32,
            7 => SampleType::I64,
            8 => SampleType::U64,
            16 => SampleType::F32,
            17 => SampleType::F64,
            other => bail!("unsupported GDF data type {other}"),
        })
    }

    /// Bytes per sample.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            SampleType::I8 | SampleType::U8 => 1,
            SampleType::I16 | SampleType::U16 => 2,
            SampleType::I32 | SampleType::U32 | SampleType::F32 => 4,
            SampleType::I64 | SampleType::U64 | SampleType::F64 => 8,
        }
    }

    /// Decode one sample; `b` must hold exactly [`size`](Self::size) bytes.
    #[inline]
    pub fn decode(self, b: &[u8]) -> f64 {
        match self {
            SampleType::I8 => b[0] as i8 as f64,
            SampleType::U8 => b[0] as f64,
            SampleType::I16 => i16::from_le_bytes([b[0], b[1]]) as f64,
            SampleType::U16 => u16::from_le_bytes([b[0], b[1]]) as f64,
            SampleType::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            SampleType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            SampleType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            SampleType::I64 => i64::from_le_bytes(le8(b)) as f64,
            SampleType::U64 => u64::from_le_bytes(le8(b)) as f64,
            SampleType::F64 => f64::from_le_bytes(le8(b)),
        }
    }
}

#[inline]
fn le8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}
