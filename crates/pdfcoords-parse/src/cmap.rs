//! ToUnicode CMap parsing.
//!
//! A ToUnicode stream is PostScript-like, so it is run through the content
//! stream [`tokenize`] and the `endbfchar` / `endbfrange` operators pick up
//! their source/destination strings as operands.

use std::collections::HashMap;

use crate::error::BackendError;
use crate::tokenizer::{Operand, tokenize};

/// Mapping from character codes to Unicode text.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    mappings: HashMap<u32, String>,
}

/// Ranges wider than this are clipped; no real font needs more.
const MAX_RANGE_LEN: u32 = 0x1_0000;

impl CMap {
    /// Parse a ToUnicode CMap stream.
    ///
    /// Malformed entries are skipped; only a stream that cannot be tokenized
    /// at all is an error.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let mut mappings = HashMap::new();
        for op in tokenize(data)? {
            match op.name.as_str() {
                "endbfchar" => {
                    for pair in op.operands.chunks_exact(2) {
                        if let (Some(src), Some(dst)) = (pair[0].as_bytes(), pair[1].as_bytes()) {
                            mappings.insert(code_of(src), utf16be_to_string(dst));
                        }
                    }
                }
                "endbfrange" => {
                    for triple in op.operands.chunks_exact(3) {
                        let (Some(lo), Some(hi)) = (triple[0].as_bytes(), triple[1].as_bytes())
                        else {
                            continue;
                        };
                        insert_range(&mut mappings, code_of(lo), code_of(hi), &triple[2]);
                    }
                }
                _ => {}
            }
        }
        Ok(CMap { mappings })
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn insert_range(mappings: &mut HashMap<u32, String>, lo: u32, hi: u32, dst: &Operand) {
    if hi < lo {
        return;
    }
    let hi = hi.min(lo.saturating_add(MAX_RANGE_LEN - 1));
    match dst {
        // Consecutive codes map to consecutive values of the last code unit.
        Operand::String(start) => {
            let mut units = utf16_units(start);
            let Some(last) = units.last().copied() else {
                return;
            };
            for (offset, code) in (lo..=hi).enumerate() {
                let Ok(offset) = u16::try_from(offset) else {
                    break;
                };
                if let Some(slot) = units.last_mut() {
                    *slot = last.wrapping_add(offset);
                }
                mappings.insert(code, String::from_utf16_lossy(&units));
            }
        }
        Operand::Array(items) => {
            for (code, item) in (lo..=hi).zip(items) {
                if let Some(bytes) = item.as_bytes() {
                    mappings.insert(code, utf16be_to_string(bytes));
                }
            }
        }
        _ => {}
    }
}

/// Big-endian code value of a source string.
fn code_of(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

fn utf16be_to_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}
