use thiserror::Error;

/// Core error types for model-sonar
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a GGUF file (bad magic): found {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata key is not valid UTF-8: {0}")]
    InvalidKey(String),

    #[error("Unsupported metadata value type: {0}")]
    UnsupportedValueType(u32),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
