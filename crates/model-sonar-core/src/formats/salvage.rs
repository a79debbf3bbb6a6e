//! Raw fallback metadata walker
//!
//! Salvages human-readable key/value pairs from GGUF files that the full
//! reader rejects (unknown value types, malformed string values). It decodes
//! the scalar value types only and streams each pair to the caller as soon
//! as it is decoded.
//!
//! The walker never guesses payload sizes: an array or unrecognized value
//! type yields one descriptive stub entry and ends the walk, because the
//! next key's offset cannot be located without type-specific skip logic.
//! Everything decoded before that point is kept. This trades completeness
//! for never crashing on inputs that break stricter readers.

use crate::error::Result;
use crate::formats::gguf::{read_header, read_key, read_len_prefixed, read_u32, read_u64, GGUFHeader};
use std::fmt;
use std::io::Read;

/// One salvaged metadata entry
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub key: String,
    pub value: RawValue,
}

/// A decoded scalar value, or a stub for a value the walker will not cross
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Bool(bool),
    /// Invalid UTF-8 sequences are replaced, never fatal
    String(String),
    /// Array header; the payload is not skipped and the walk ends here
    ArrayStub { elem_type: u32, len: u64 },
    /// Unrecognized value type; payload length unknown, the walk ends here
    UnknownStub { value_type: u32 },
}

impl RawValue {
    /// True for the stub variants that terminate the walk
    pub fn is_stub(&self) -> bool {
        matches!(self, RawValue::ArrayStub { .. } | RawValue::UnknownStub { .. })
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::UInt32(v) => write!(f, "{}", v),
            RawValue::Int32(v) => write!(f, "{}", v),
            RawValue::UInt64(v) => write!(f, "{}", v),
            RawValue::Int64(v) => write!(f, "{}", v),
            RawValue::Float32(v) => write!(f, "{}", v),
            RawValue::Bool(v) => write!(f, "{}", v),
            RawValue::String(s) => f.write_str(s),
            RawValue::ArrayStub { elem_type, len } => {
                write!(f, "[array of {} items, element type {}]", len, elem_type)
            }
            RawValue::UnknownStub { value_type } => write!(f, "[unknown value type {}]", value_type),
        }
    }
}

/// Streaming fallback walker over the metadata section.
///
/// Yields `Result<RawEntry>` in file order. After a stub entry or any error
/// the iterator is exhausted; there is no resumption and no partial-entry
/// recovery.
pub struct SalvageReader<R: Read> {
    reader: R,
    header: GGUFHeader,
    remaining: u64,
    done: bool,
}

impl<R: Read> SalvageReader<R> {
    /// Read and validate the fixed header. The stream must be at offset 0.
    ///
    /// # Errors
    ///
    /// `BadMagic` if the file does not start with "GGUF"; `Io` on a short
    /// read. Counts are trusted as given, no bounds validation is done.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = read_header(&mut reader)?;
        Ok(Self { reader, remaining: header.metadata_kv_count, header, done: false })
    }

    pub fn header(&self) -> &GGUFHeader {
        &self.header
    }

    fn read_entry(&mut self) -> Result<RawEntry> {
        // A malformed key is fatal: without it the rest of the stream has
        // no usable content to report.
        let key = read_key(&mut self.reader)?;
        let tag = read_u32(&mut self.reader)?;

        let value = match tag {
            4 => RawValue::UInt32(read_u32(&mut self.reader)?),
            5 => {
                let mut buf = [0u8; 4];
                self.reader.read_exact(&mut buf)?;
                RawValue::Int32(i32::from_le_bytes(buf))
            }
            6 => {
                let mut buf = [0u8; 4];
                self.reader.read_exact(&mut buf)?;
                RawValue::Float32(f32::from_le_bytes(buf))
            }
            7 => {
                let mut buf = [0u8; 1];
                self.reader.read_exact(&mut buf)?;
                RawValue::Bool(buf[0] != 0)
            }
            8 => {
                let bytes = read_len_prefixed(&mut self.reader)?;
                RawValue::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            10 => RawValue::UInt64(read_u64(&mut self.reader)?),
            11 => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                RawValue::Int64(i64::from_le_bytes(buf))
            }
            9 => {
                // Array payload size is element-type dependent; report the
                // shape of what is here and stop.
                let elem_type = read_u32(&mut self.reader)?;
                let len = read_u64(&mut self.reader)?;
                self.done = true;
                RawValue::ArrayStub { elem_type, len }
            }
            other => {
                self.done = true;
                RawValue::UnknownStub { value_type: other }
            }
        };

        Ok(RawEntry { key, value })
    }
}

impl<R: Read> Iterator for SalvageReader<R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match self.read_entry() {
            Ok(entry) => Some(Ok(entry)),
            Err(err) => {
                #[cfg(feature = "log")]
                log::debug!("salvage walk ended early: {}", err);
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
