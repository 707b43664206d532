//! Octal text boot images.
//!
//! The format is one 18-bit octal word per line, placed at consecutive
//! addresses from the load origin. `#` starts a comment (whole-line or
//! trailing). A line of the form `addr: word` moves the location counter,
//! so an image can scatter-load fault vectors and data blocks:
//!
//! ```text
//! # bootstrap
//! 073005      # ILA 5
//! 017002      # STA 104
//! 443: 071100 # illegal-opcode trap: TRA 100
//! ```

use crate::cpu::Memory;
use crate::word::{MASK15, MASK18};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: bad octal word {text:?}")]
    BadWord { line: usize, text: String },

    #[error("line {line}: bad octal address {text:?}")]
    BadAddress { line: usize, text: String },

    #[error("line {line}: word {value:#o} exceeds 18 bits")]
    WordRange { line: usize, value: u32 },

    #[error("line {line}: address {value:#o} exceeds 15 bits")]
    AddressRange { line: usize, value: u32 },
}

/// A parsed image: (address, word) pairs in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub entries: Vec<(u32, u32)>,
}

impl Image {
    pub fn apply(&self, mem: &mut Memory) {
        for &(addr, word) in &self.entries {
            mem.write_word(addr, word);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_octal(text: &str, line: usize, is_addr: bool) -> Result<u32, LoadError> {
    let value = u32::from_str_radix(text, 8).map_err(|_| {
        if is_addr {
            LoadError::BadAddress { line, text: text.to_string() }
        } else {
            LoadError::BadWord { line, text: text.to_string() }
        }
    })?;
    if is_addr && value > MASK15 {
        return Err(LoadError::AddressRange { line, value });
    }
    if !is_addr && value > MASK18 {
        return Err(LoadError::WordRange { line, value });
    }
    Ok(value)
}

/// Parse image text with the location counter starting at `origin`.
pub fn parse_image(source: &str, origin: u32) -> Result<Image, LoadError> {
    let mut entries = Vec::new();
    let mut loc = origin & MASK15;

    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw_line.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let word_text = if let Some((addr_text, rest)) = text.split_once(':') {
            loc = parse_octal(addr_text.trim(), line, true)?;
            rest.trim()
        } else {
            text
        };

        let word = parse_octal(word_text, line, false)?;
        entries.push((loc, word));
        loc = (loc + 1) & MASK15;
    }

    Ok(Image { entries })
}

/// Read and parse an image file.
pub fn load_image<P: AsRef<Path>>(path: P, origin: u32) -> Result<Image, LoadError> {
    let source = std::fs::read_to_string(path)?;
    parse_image(&source, origin)
}
