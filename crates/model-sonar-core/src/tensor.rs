//! Tensor descriptor types
//!
//! Descriptors only: this crate reads tensor names, shapes and types from
//! the GGUF descriptor table but never touches tensor data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tensor quantization/storage type
///
/// Open enumeration over the ggml type tags. Tags this crate does not know
/// are preserved as `Unknown` instead of failing the parse, so a file
/// carrying a newer quantization scheme still gets its descriptors listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorType {
    F32,
    F16,
    Q4_0,
    Q4_1,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2K,
    Q3K,
    Q4K,
    Q5K,
    Q6K,
    Q8K,
    I8,
    I16,
    I32,
    I64,
    F64,
    BF16,
    Mxfp4,
    /// Tag not in this enumeration; raw value preserved
    Unknown(u32),
}

impl TensorType {
    /// Decode a ggml type tag. Never fails: unrecognized tags map to `Unknown`.
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            0 => TensorType::F32,
            1 => TensorType::F16,
            2 => TensorType::Q4_0,
            3 => TensorType::Q4_1,
            6 => TensorType::Q5_0,
            7 => TensorType::Q5_1,
            8 => TensorType::Q8_0,
            9 => TensorType::Q8_1,
            10 => TensorType::Q2K,
            11 => TensorType::Q3K,
            12 => TensorType::Q4K,
            13 => TensorType::Q5K,
            14 => TensorType::Q6K,
            15 => TensorType::Q8K,
            24 => TensorType::I8,
            25 => TensorType::I16,
            26 => TensorType::I32,
            27 => TensorType::I64,
            28 => TensorType::F64,
            30 => TensorType::BF16,
            39 => TensorType::Mxfp4,
            other => TensorType::Unknown(other),
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(
            self,
            TensorType::Q4_0
                | TensorType::Q4_1
                | TensorType::Q5_0
                | TensorType::Q5_1
                | TensorType::Q8_0
                | TensorType::Q8_1
                | TensorType::Q2K
                | TensorType::Q3K
                | TensorType::Q4K
                | TensorType::Q5K
                | TensorType::Q6K
                | TensorType::Q8K
                | TensorType::Mxfp4
        )
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TensorType::F32 => "F32",
            TensorType::F16 => "F16",
            TensorType::Q4_0 => "Q4_0",
            TensorType::Q4_1 => "Q4_1",
            TensorType::Q5_0 => "Q5_0",
            TensorType::Q5_1 => "Q5_1",
            TensorType::Q8_0 => "Q8_0",
            TensorType::Q8_1 => "Q8_1",
            TensorType::Q2K => "Q2_K",
            TensorType::Q3K => "Q3_K",
            TensorType::Q4K => "Q4_K",
            TensorType::Q5K => "Q5_K",
            TensorType::Q6K => "Q6_K",
            TensorType::Q8K => "Q8_K",
            TensorType::I8 => "I8",
            TensorType::I16 => "I16",
            TensorType::I32 => "I32",
            TensorType::I64 => "I64",
            TensorType::F64 => "F64",
            TensorType::BF16 => "BF16",
            TensorType::Mxfp4 => "MXFP4",
            TensorType::Unknown(tag) => return write!(f, "unknown({})", tag),
        };
        f.write_str(name)
    }
}

/// Tensor descriptor (metadata about one tensor in the file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorDesc {
    /// Tensor name (e.g., "blk.0.attn_q.weight")
    pub name: String,
    /// Dimensions, in file order
    pub dims: Vec<u64>,
    /// Quantization/storage type
    pub dtype: TensorType,
    /// Byte offset of this tensor's data, relative to the data section
    pub offset: u64,
}

impl TensorDesc {
    /// Total number of elements in the tensor
    pub fn element_count(&self) -> u64 {
        self.dims.iter().product()
    }
}
