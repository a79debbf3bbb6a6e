//! GGUF (GPT-Generated Unified Format) streaming metadata reader
//!
//! Specification: <https://github.com/ggerganov/ggml/blob/master/docs/gguf.md>
//!
//! Reads the fixed header, the metadata key/value section (all value types,
//! arrays included) and the tensor descriptor table, then records where the
//! tensor data section begins. Tensor data itself is never read.
//!
//! All multi-byte fields are little-endian. Counts from the header are
//! trusted as given; truncated files surface as IO errors mid-parse.

use crate::error::{Error, Result};
use crate::tensor::{TensorDesc, TensorType};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Seek};

/// GGUF magic number ("GGUF" in little-endian)
pub const GGUF_MAGIC: u32 = 0x4655_4747;

/// Default alignment of the tensor data section, overridable by the
/// `general.alignment` metadata key.
pub const GGUF_DEFAULT_ALIGNMENT: u64 = 32;

/// GGUF file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GGUFHeader {
    /// Format version
    pub version: u32,
    /// Number of tensors in the file
    pub tensor_count: u64,
    /// Number of metadata key-value pairs
    pub metadata_kv_count: u64,
}

/// GGUF metadata value types (closed set, per format spec)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Bool,
    String,
    Array,
    UInt64,
    Int64,
    Float64,
}

impl ValueType {
    /// Decode a value-type tag, rejecting tags outside the known set.
    ///
    /// Unlike tensor types there is no open fallback here: an unknown value
    /// type makes every later stream offset unknowable, so the caller must
    /// stop (or hand over to the salvage walker).
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(ValueType::UInt8),
            1 => Ok(ValueType::Int8),
            2 => Ok(ValueType::UInt16),
            3 => Ok(ValueType::Int16),
            4 => Ok(ValueType::UInt32),
            5 => Ok(ValueType::Int32),
            6 => Ok(ValueType::Float32),
            7 => Ok(ValueType::Bool),
            8 => Ok(ValueType::String),
            9 => Ok(ValueType::Array),
            10 => Ok(ValueType::UInt64),
            11 => Ok(ValueType::Int64),
            12 => Ok(ValueType::Float64),
            other => Err(Error::UnsupportedValueType(other)),
        }
    }
}

/// A decoded metadata value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    Float32(f32),
    Bool(bool),
    String(String),
    Array(Vec<MetadataValue>),
    UInt64(u64),
    Int64(i64),
    Float64(f64),
}

impl MetadataValue {
    /// String payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload widened to u64, if this is a non-negative integer
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            MetadataValue::UInt8(v) => Some(u64::from(v)),
            MetadataValue::UInt16(v) => Some(u64::from(v)),
            MetadataValue::UInt32(v) => Some(u64::from(v)),
            MetadataValue::UInt64(v) => Some(v),
            MetadataValue::Int8(v) => u64::try_from(v).ok(),
            MetadataValue::Int16(v) => u64::try_from(v).ok(),
            MetadataValue::Int32(v) => u64::try_from(v).ok(),
            MetadataValue::Int64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::UInt8(v) => write!(f, "{}", v),
            MetadataValue::Int8(v) => write!(f, "{}", v),
            MetadataValue::UInt16(v) => write!(f, "{}", v),
            MetadataValue::Int16(v) => write!(f, "{}", v),
            MetadataValue::UInt32(v) => write!(f, "{}", v),
            MetadataValue::Int32(v) => write!(f, "{}", v),
            MetadataValue::Float32(v) => write!(f, "{}", v),
            MetadataValue::Bool(v) => write!(f, "{}", v),
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::UInt64(v) => write!(f, "{}", v),
            MetadataValue::Int64(v) => write!(f, "{}", v),
            MetadataValue::Float64(v) => write!(f, "{}", v),
            MetadataValue::Array(items) => {
                // Vocabulary arrays run to tens of thousands of entries;
                // show a short prefix only.
                const SHOWN: usize = 4;
                write!(f, "[")?;
                for (i, item) in items.iter().take(SHOWN).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() > SHOWN {
                    write!(f, ", ... {} total", items.len())?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Parsed model metadata: header fields, key/value entries, tensor descriptors
#[derive(Debug, Clone, Serialize)]
pub struct ModelMeta {
    /// Format version
    pub version: u32,
    /// Number of tensors declared in the header
    pub tensor_count: u64,
    /// Number of metadata entries declared in the header
    pub metadata_kv_count: u64,
    /// Key/value entries, in file order
    pub metadata: Vec<(String, MetadataValue)>,
    /// Tensor descriptors, in file order
    pub tensors: Vec<TensorDesc>,
    /// Absolute byte offset where the tensor data section begins
    pub data_offset: u64,
}

impl ModelMeta {
    /// Look up a metadata value by key
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value of `general.architecture`, if present
    pub fn architecture(&self) -> Option<&str> {
        self.get("general.architecture").and_then(MetadataValue::as_str)
    }

    /// Transformer block count, looked up under `{architecture}.block_count`
    pub fn block_count(&self) -> Option<u64> {
        let arch = self.architecture()?;
        self.get(&format!("{}.block_count", arch)).and_then(MetadataValue::as_u64)
    }
}

/// GGUF streaming parser
pub struct GGUFParser<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> GGUFParser<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parse header, metadata entries and tensor descriptors.
    ///
    /// The stream must be positioned at offset 0. On success the stream is
    /// left at the end of the descriptor table; `data_offset` in the result
    /// accounts for the file's alignment padding.
    ///
    /// # Errors
    ///
    /// - `BadMagic` if the file does not start with "GGUF"
    /// - `UnsupportedValueType` on a value-type tag outside the format's set
    /// - `InvalidKey` / `ParseError` on malformed UTF-8
    /// - `Io` on short reads (truncated file)
    pub fn parse(&mut self) -> Result<ModelMeta> {
        let header = read_header(&mut self.reader)?;

        #[cfg(feature = "log")]
        log::debug!(
            "GGUF header: version {}, {} tensors, {} metadata entries",
            header.version,
            header.tensor_count,
            header.metadata_kv_count
        );

        let mut metadata = Vec::new();
        for _ in 0..header.metadata_kv_count {
            let key = read_key(&mut self.reader)?;
            let value_type = ValueType::from_tag(read_u32(&mut self.reader)?)?;
            let value = read_value(&mut self.reader, value_type)?;
            metadata.push((key, value));
        }

        let mut tensors = Vec::new();
        for _ in 0..header.tensor_count {
            tensors.push(read_tensor_desc(&mut self.reader)?);
        }

        // The data section is aligned; padding sits between the descriptor
        // table and the first tensor.
        // Alignment must be a power of two; anything else in the file is
        // ignored in favor of the format default.
        let alignment = metadata
            .iter()
            .find(|(k, _)| k == "general.alignment")
            .and_then(|(_, v)| v.as_u64())
            .filter(|a| a.is_power_of_two())
            .unwrap_or(GGUF_DEFAULT_ALIGNMENT);
        let end_of_descriptors = self.reader.stream_position()?;
        let data_offset = end_of_descriptors.div_ceil(alignment) * alignment;

        Ok(ModelMeta {
            version: header.version,
            tensor_count: header.tensor_count,
            metadata_kv_count: header.metadata_kv_count,
            metadata,
            tensors,
            data_offset,
        })
    }
}

// Wire-level helpers, shared with the salvage walker.

pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<GGUFHeader> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if u32::from_le_bytes(magic) != GGUF_MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let version = read_u32(reader)?;
    let tensor_count = read_u64(reader)?;
    let metadata_kv_count = read_u64(reader)?;

    Ok(GGUFHeader { version, tensor_count, metadata_kv_count })
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a u64 length prefix followed by that many raw bytes
pub(crate) fn read_len_prefixed<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len_u64 = read_u64(reader)?;
    let len = usize::try_from(len_u64)
        .map_err(|_| Error::ParseError(format!("length {} exceeds platform usize", len_u64)))?;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Read a metadata key: length-prefixed, strictly UTF-8.
///
/// Keys locate every later byte of the stream, so a malformed key is fatal;
/// only value strings tolerate invalid UTF-8 (in the salvage walker).
pub(crate) fn read_key<R: Read>(reader: &mut R) -> Result<String> {
    let bytes = read_len_prefixed(reader)?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidKey(e.to_string()))
}

fn read_value<R: Read>(reader: &mut R, value_type: ValueType) -> Result<MetadataValue> {
    let mut b1 = [0u8; 1];
    let mut b2 = [0u8; 2];
    let mut b4 = [0u8; 4];
    let mut b8 = [0u8; 8];

    match value_type {
        ValueType::UInt8 => {
            reader.read_exact(&mut b1)?;
            Ok(MetadataValue::UInt8(b1[0]))
        }
        ValueType::Int8 => {
            reader.read_exact(&mut b1)?;
            Ok(MetadataValue::Int8(i8::from_le_bytes(b1)))
        }
        ValueType::UInt16 => {
            reader.read_exact(&mut b2)?;
            Ok(MetadataValue::UInt16(u16::from_le_bytes(b2)))
        }
        ValueType::Int16 => {
            reader.read_exact(&mut b2)?;
            Ok(MetadataValue::Int16(i16::from_le_bytes(b2)))
        }
        ValueType::UInt32 => {
            reader.read_exact(&mut b4)?;
            Ok(MetadataValue::UInt32(u32::from_le_bytes(b4)))
        }
        ValueType::Int32 => {
            reader.read_exact(&mut b4)?;
            Ok(MetadataValue::Int32(i32::from_le_bytes(b4)))
        }
        ValueType::Float32 => {
            reader.read_exact(&mut b4)?;
            Ok(MetadataValue::Float32(f32::from_le_bytes(b4)))
        }
        ValueType::Bool => {
            reader.read_exact(&mut b1)?;
            Ok(MetadataValue::Bool(b1[0] != 0))
        }
        ValueType::String => {
            let bytes = read_len_prefixed(reader)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| Error::ParseError(format!("invalid UTF-8 in string value: {}", e)))?;
            Ok(MetadataValue::String(s))
        }
        ValueType::Array => {
            // element type (u32) + element count (u64) + elements
            let element_type = ValueType::from_tag(read_u32(reader)?)?;
            let len_u64 = read_u64(reader)?;
            let len = usize::try_from(len_u64).map_err(|_| {
                Error::ParseError(format!("array length {} exceeds platform usize", len_u64))
            })?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(read_value(reader, element_type)?);
            }
            Ok(MetadataValue::Array(items))
        }
        ValueType::UInt64 => {
            reader.read_exact(&mut b8)?;
            Ok(MetadataValue::UInt64(u64::from_le_bytes(b8)))
        }
        ValueType::Int64 => {
            reader.read_exact(&mut b8)?;
            Ok(MetadataValue::Int64(i64::from_le_bytes(b8)))
        }
        ValueType::Float64 => {
            reader.read_exact(&mut b8)?;
            Ok(MetadataValue::Float64(f64::from_le_bytes(b8)))
        }
    }
}

fn read_tensor_desc<R: Read>(reader: &mut R) -> Result<TensorDesc> {
    let name = read_key(reader)?;
    let n_dims = read_u32(reader)?;

    let mut dims = Vec::with_capacity(n_dims as usize);
    for _ in 0..n_dims {
        dims.push(read_u64(reader)?);
    }

    let dtype = TensorType::from_tag(read_u32(reader)?);
    let offset = read_u64(reader)?;

    Ok(TensorDesc { name, dims, dtype, offset })
}
