//! Core parsing primitives for model-sonar
//!
//! This crate provides the format-level building blocks for diagnosing
//! locally-stored model files:
//! - GGUF metadata reading (full reader and raw fallback walker)
//! - Tensor descriptor types with an open quantization-type enumeration
//! - The error taxonomy shared by both readers
//!
//! It is generic over `std::io::Read` streams and never prints; path
//! resolution and console output belong to the CLI crate.

pub mod error;
pub mod formats;
pub mod tensor;

pub use error::{Error, Result};
pub use formats::gguf::{GGUFHeader, GGUFParser, MetadataValue, ModelMeta, ValueType, GGUF_MAGIC};
pub use formats::salvage::{RawEntry, RawValue, SalvageReader};
pub use tensor::{TensorDesc, TensorType};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
