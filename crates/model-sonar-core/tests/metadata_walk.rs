//! Integration coverage over synthetic in-memory GGUF streams: the full
//! reader and the salvage walker must agree wherever both can decode.

use model_sonar_core::{GGUFParser, MetadataValue, RawValue, SalvageReader, TensorType};
use std::io::Cursor;

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// A small but realistic file: scalar metadata, a vocabulary array, and a
/// couple of tensor descriptors (one with a quantization tag this crate
/// does not know).
fn fixture() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"GGUF");
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&2u64.to_le_bytes()); // tensors
    data.extend_from_slice(&4u64.to_le_bytes()); // kv entries

    put_str(&mut data, "general.architecture");
    data.extend_from_slice(&8u32.to_le_bytes());
    put_str(&mut data, "llama");

    put_str(&mut data, "llama.block_count");
    data.extend_from_slice(&4u32.to_le_bytes());
    data.extend_from_slice(&26u32.to_le_bytes());

    put_str(&mut data, "llama.attention.layer_norm_rms_epsilon");
    data.extend_from_slice(&6u32.to_le_bytes());
    data.extend_from_slice(&1e-5f32.to_le_bytes());

    put_str(&mut data, "tokenizer.ggml.tokens");
    data.extend_from_slice(&9u32.to_le_bytes());
    data.extend_from_slice(&8u32.to_le_bytes());
    data.extend_from_slice(&2u64.to_le_bytes());
    put_str(&mut data, "<s>");
    put_str(&mut data, "</s>");

    put_str(&mut data, "token_embd.weight");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&2048u64.to_le_bytes());
    data.extend_from_slice(&32000u64.to_le_bytes());
    data.extend_from_slice(&12u32.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());

    put_str(&mut data, "blk.0.ffn_up.weight");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&2048u64.to_le_bytes());
    data.extend_from_slice(&5632u64.to_le_bytes());
    data.extend_from_slice(&39u32.to_le_bytes());
    data.extend_from_slice(&4096u64.to_le_bytes());

    data
}

#[test]
fn full_reader_covers_the_whole_file() {
    let meta = GGUFParser::new(Cursor::new(fixture())).parse().unwrap();

    assert_eq!(meta.version, 3);
    assert_eq!(meta.architecture(), Some("llama"));
    assert_eq!(meta.block_count(), Some(26));
    assert_eq!(meta.metadata.len(), 4);
    assert!(matches!(
        meta.get("tokenizer.ggml.tokens"),
        Some(MetadataValue::Array(items)) if items.len() == 2
    ));

    assert_eq!(meta.tensors.len(), 2);
    assert_eq!(meta.tensors[0].dtype, TensorType::Q4K);
    assert_eq!(meta.tensors[1].dtype, TensorType::Mxfp4);
    assert_eq!(meta.data_offset % 32, 0);
    assert!(meta.data_offset >= fixture().len() as u64);
}

#[test]
fn salvage_walker_stops_at_the_array() {
    let entries: Vec<_> =
        SalvageReader::new(Cursor::new(fixture())).unwrap().map(|e| e.unwrap()).collect();

    // Three scalar entries precede the vocabulary array; the array itself
    // becomes a stub and nothing follows it.
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].value, RawValue::String("llama".to_string()));
    assert_eq!(entries[1].value, RawValue::UInt32(26));
    assert_eq!(entries[2].value, RawValue::Float32(1e-5));
    assert_eq!(entries[3].value, RawValue::ArrayStub { elem_type: 8, len: 2 });
}

#[test]
fn readers_agree_on_the_scalar_prefix() {
    let meta = GGUFParser::new(Cursor::new(fixture())).parse().unwrap();
    let salvaged: Vec<_> =
        SalvageReader::new(Cursor::new(fixture())).unwrap().map(|e| e.unwrap()).collect();

    for entry in salvaged.iter().filter(|e| !e.value.is_stub()) {
        let full = meta.get(&entry.key).expect("salvaged key missing from full parse");
        match (&entry.value, full) {
            (RawValue::String(a), MetadataValue::String(b)) => assert_eq!(a, b),
            (RawValue::UInt32(a), MetadataValue::UInt32(b)) => assert_eq!(a, b),
            (RawValue::Float32(a), MetadataValue::Float32(b)) => assert_eq!(a, b),
            (raw, full) => panic!("mismatched decode for {}: {:?} vs {:?}", entry.key, raw, full),
        }
    }
}
