//! GGUF inspection: full parse first, raw salvage walk as the fallback.

use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use model_sonar_core::{Error, GGUFParser, ModelMeta, SalvageReader};

/// Environment variable consulted when no path argument is given
pub const DEFAULT_MODEL_ENV: &str = "MODEL_SONAR_MODEL";

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the GGUF model file (falls back to $MODEL_SONAR_MODEL)
    pub path: Option<PathBuf>,

    /// Maximum number of metadata entries to list
    #[arg(long, default_value_t = 20)]
    pub kv_limit: usize,

    /// Maximum number of tensor descriptors to list
    #[arg(long, default_value_t = 10)]
    pub tensor_limit: usize,

    /// Emit the parsed summary as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let path = match resolve_path(args) {
        Some(path) => path,
        None => return Ok(()),
    };

    // Pre-check before any read attempt.
    if !path.exists() {
        println!("Error: file not found at {}", path.display());
        println!("Provide a valid path as an argument or set ${}.", DEFAULT_MODEL_ENV);
        return Ok(());
    }

    println!("Inspecting GGUF file: {}", path.display());

    match parse_full(&path) {
        Ok(meta) => {
            if args.json {
                match serde_json::to_string_pretty(&meta) {
                    Ok(json) => println!("{}", json),
                    Err(err) => println!("Error serializing summary: {}", err),
                }
            } else {
                print!("{}", render_meta(&meta, args.kv_limit, args.tensor_limit));
            }
        }
        // A second read of the same bytes cannot do better than this.
        Err(Error::BadMagic(found)) => {
            println!("Not a GGUF file (bad magic): found {:02X?}", found);
        }
        Err(err) => {
            println!("Error reading GGUF metadata: {}", err);
            println!("Falling back to raw metadata walk...");
            salvage(&path);
        }
    }

    Ok(())
}

fn resolve_path(args: &InspectArgs) -> Option<PathBuf> {
    if let Some(path) = &args.path {
        return Some(path.clone());
    }
    match std::env::var_os(DEFAULT_MODEL_ENV) {
        Some(value) => {
            let path = PathBuf::from(value);
            println!("No path argument. Using ${}: {}", DEFAULT_MODEL_ENV, path.display());
            Some(path)
        }
        None => {
            println!("No path argument and ${} is not set.", DEFAULT_MODEL_ENV);
            println!("Usage: model-sonar inspect <path-to-model.gguf>");
            None
        }
    }
}

fn parse_full(path: &Path) -> model_sonar_core::Result<ModelMeta> {
    let file = File::open(path)?;
    GGUFParser::new(BufReader::new(file)).parse()
}

fn render_meta(meta: &ModelMeta, kv_limit: usize, tensor_limit: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "GGUF version: {}", meta.version);
    let _ = writeln!(out, "Tensor count: {}", meta.tensor_count);
    let _ = writeln!(out, "KV count: {}", meta.metadata_kv_count);
    if let Some(arch) = meta.architecture() {
        let _ = writeln!(out, "Architecture: {}", arch);
    }
    if let Some(blocks) = meta.block_count() {
        let _ = writeln!(out, "Layers (block count): {}", blocks);
    }

    let shown = meta.metadata.len().min(kv_limit);
    let _ = writeln!(out, "\n--- Metadata (first {} of {}) ---", shown, meta.metadata.len());
    for (key, value) in meta.metadata.iter().take(kv_limit) {
        let _ = writeln!(out, "{}: {}", key, value);
    }
    if meta.metadata.len() > kv_limit {
        let _ = writeln!(out, "... ({} more)", meta.metadata.len() - kv_limit);
    }

    let shown = meta.tensors.len().min(tensor_limit);
    let _ = writeln!(out, "\n--- Tensors (first {} of {}) ---", shown, meta.tensors.len());
    for tensor in meta.tensors.iter().take(tensor_limit) {
        let _ = writeln!(out, "{} | shape {:?} | type {}", tensor.name, tensor.dims, tensor.dtype);
    }
    if meta.tensors.len() > tensor_limit {
        let _ = writeln!(out, "... ({} more)", meta.tensors.len() - tensor_limit);
    }

    let _ = writeln!(out, "\nTensor data begins at byte offset {}", meta.data_offset);
    out
}

/// Stream whatever the raw walker can decode, printing each pair as it
/// arrives. Any mid-walk failure is reported and ends the walk.
fn salvage(path: &Path) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            println!("Error reopening file: {}", err);
            return;
        }
    };

    let reader = match SalvageReader::new(BufReader::new(file)) {
        Ok(reader) => reader,
        Err(err) => {
            println!("Error reading header: {}", err);
            return;
        }
    };

    let header = *reader.header();
    println!("[raw walk mode]");
    println!("GGUF version: {}", header.version);
    println!("Tensor count: {}", header.tensor_count);
    println!("KV count: {}", header.metadata_kv_count);
    println!("\n--- Metadata ---");

    for entry in reader {
        match entry {
            Ok(entry) if entry.value.is_stub() => {
                println!("{}: {} (stopping raw walk)", entry.key, entry.value);
            }
            Ok(entry) => println!("{}: {}", entry.key, entry.value),
            Err(err) => println!("Error parsing metadata entry: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_sonar_core::{MetadataValue, TensorDesc, TensorType};

    fn sample_meta() -> ModelMeta {
        ModelMeta {
            version: 3,
            tensor_count: 2,
            metadata_kv_count: 3,
            metadata: vec![
                (
                    "general.architecture".to_string(),
                    MetadataValue::String("llama".to_string()),
                ),
                ("llama.block_count".to_string(), MetadataValue::UInt32(22)),
                ("llama.context_length".to_string(), MetadataValue::UInt32(4096)),
            ],
            tensors: vec![
                TensorDesc {
                    name: "token_embd.weight".to_string(),
                    dims: vec![2048, 32000],
                    dtype: TensorType::Q4K,
                    offset: 0,
                },
                TensorDesc {
                    name: "output_norm.weight".to_string(),
                    dims: vec![2048],
                    dtype: TensorType::F32,
                    offset: 4096,
                },
            ],
            data_offset: 8192,
        }
    }

    #[test]
    fn test_render_includes_header_and_accessors() {
        let out = render_meta(&sample_meta(), 20, 10);
        assert!(out.contains("GGUF version: 3"));
        assert!(out.contains("Architecture: llama"));
        assert!(out.contains("Layers (block count): 22"));
        assert!(out.contains("token_embd.weight | shape [2048, 32000] | type Q4_K"));
        assert!(out.contains("byte offset 8192"));
    }

    #[test]
    fn test_render_bounds_the_listings() {
        let out = render_meta(&sample_meta(), 1, 1);
        assert!(out.contains("--- Metadata (first 1 of 3) ---"));
        assert!(out.contains("... (2 more)"));
        assert!(out.contains("--- Tensors (first 1 of 2) ---"));
        assert!(!out.contains("output_norm.weight"));
    }
}
