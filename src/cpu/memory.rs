//! Character-addressed memory.
//!
//! The store is 32K flat 18-bit words, but every access names a character
//! class alongside the word address: the full word, the 36-bit double word
//! pair, one of two 9-bit characters, or one of three 6-bit characters.
//! Sub-word operands move to and from memory right justified; a sub-word
//! store is a read-modify-write that leaves every other bit of the word
//! untouched.

use crate::cpu::fault::Fault;
use crate::word::{MASK15, MASK18, MASK3, MASK36, MEM_SIZE};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Character class codes carried in the 3-bit C field of an address.
///
/// The fractional interpretations of the hardware manual: `Byte0`/`Byte1`
/// are the halves ("0/2", "1/2"), `Char0`..`Char2` the thirds ("0/3".."2/3")
/// of a word. Class 7 is the canonical illegal access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CharClass {
    /// 000: single 18-bit word.
    Word = 0,
    /// 001: double (36-bit) word.
    Double = 1,
    /// 010: 9-bit character 0, bits 0-8.
    Byte0 = 2,
    /// 011: 9-bit character 1, bits 9-17.
    Byte1 = 3,
    /// 100: 6-bit character 0, bits 0-5.
    Char0 = 4,
    /// 101: 6-bit character 1, bits 6-11.
    Char1 = 5,
    /// 110: 6-bit character 2, bits 12-17.
    Char2 = 6,
    /// 111: illegal.
    Illegal = 7,
}

impl CharClass {
    /// Decode the low 3 bits of a C field.
    pub fn from_bits(c: u32) -> Self {
        match c & MASK3 {
            0 => CharClass::Word,
            1 => CharClass::Double,
            2 => CharClass::Byte0,
            3 => CharClass::Byte1,
            4 => CharClass::Char0,
            5 => CharClass::Char1,
            6 => CharClass::Char2,
            _ => CharClass::Illegal,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Per-class operand descriptor: bit width, extraction mask for the
/// right-justified operand, in-word mask for the occupied field, and the
/// shift that right-justifies it.
struct CharInfo {
    width: u32,
    mask: u32,
    field: u32,
    shift: u32,
}

/// Indexed by character class. `Double` and `Illegal` carry no slice
/// descriptor; accesses through them never reach the table.
static CINFO: [CharInfo; 8] = [
    CharInfo { width: 18, mask: 0o777777, field: 0o777777, shift: 0 },
    CharInfo { width: 36, mask: 0, field: 0, shift: 0 },
    CharInfo { width: 9, mask: 0o777, field: 0o777000, shift: 9 },
    CharInfo { width: 9, mask: 0o777, field: 0o000777, shift: 0 },
    CharInfo { width: 6, mask: 0o77, field: 0o770000, shift: 12 },
    CharInfo { width: 6, mask: 0o77, field: 0o007700, shift: 6 },
    CharInfo { width: 6, mask: 0o77, field: 0o000077, shift: 0 },
    CharInfo { width: 0, mask: 0, field: 0, shift: 0 },
];

/// Operand bit width of a character class (0 for `Illegal`).
pub fn class_width(c: CharClass) -> u32 {
    CINFO[c as usize].width
}

/// Main memory: 32K 18-bit words.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    words: Vec<u32>,
}

impl Memory {
    pub fn new() -> Self {
        Self { words: vec![0; MEM_SIZE] }
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Raw word read. The address wraps into the 15-bit space.
    #[inline]
    pub fn read_word(&self, addr: u32) -> u32 {
        self.words[(addr & MASK15) as usize] & MASK18
    }

    /// Raw word write. The address wraps into the 15-bit space and the
    /// value is masked to 18 bits.
    #[inline]
    pub fn write_word(&mut self, addr: u32, value: u32) {
        self.words[(addr & MASK15) as usize] = value & MASK18;
    }

    /// One-shot boot handoff: copy a word image into memory starting at
    /// `origin`, before the first instruction fetch.
    pub fn load_image(&mut self, origin: u32, image: &[u32]) {
        for (i, &w) in image.iter().enumerate() {
            self.write_word(origin + i as u32, w);
        }
    }

    /// Character-addressed load of an 18-bit-or-narrower operand.
    ///
    /// Classes 2-6 return the slice right justified and zero extended.
    /// `Double` is not a single-word access and faults here; use
    /// [`Memory::load_double`] for 36-bit operands.
    pub fn load(&self, addr: u32, class: CharClass) -> Result<u32, Fault> {
        let addr = addr & MASK15;
        match class {
            CharClass::Word => {
                let data = self.read_word(addr);
                trace!(addr = format_args!("{addr:05o}"), data = format_args!("{data:06o}"), "read");
                Ok(data)
            }
            CharClass::Double | CharClass::Illegal => {
                Err(Fault::IllegalCharAddress { context: "single-word load" })
            }
            _ => {
                let ci = &CINFO[class as usize];
                let data = (self.read_word(addr) & ci.field) >> ci.shift;
                trace!(addr = format_args!("{addr:05o}"), data = format_args!("{data:06o}"), "read");
                Ok(data & ci.mask)
            }
        }
    }

    /// Character-addressed load of an operand up to 36 bits wide.
    ///
    /// `Double` reads the pair (addr with the low bit cleared, addr with
    /// the low bit set) regardless of the address's own parity; the even
    /// word is the most significant half.
    pub fn load_double(&self, addr: u32, class: CharClass) -> Result<u64, Fault> {
        let addr = addr & MASK15;
        match class {
            CharClass::Double => {
                let even = self.read_word(addr & 0o77776) as u64;
                let odd = self.read_word(addr | 0o00001) as u64;
                trace!(
                    even = format_args!("{:05o}", addr & 0o77776),
                    odd = format_args!("{:05o}", addr | 1),
                    data = format_args!("{:012o}", even << 18 | odd),
                    "read pair"
                );
                Ok((even << 18 | odd) & MASK36)
            }
            CharClass::Illegal => Err(Fault::IllegalCharAddress { context: "double-word load" }),
            _ => Ok(self.load(addr, class)? as u64),
        }
    }

    /// Character-addressed store of an 18-bit-or-narrower operand.
    ///
    /// For classes 2-6 this is a read-modify-write: the target field is
    /// cleared and the right-justified value inserted; all other bits of
    /// the word are preserved exactly.
    pub fn store(&mut self, addr: u32, class: CharClass, value: u32) -> Result<(), Fault> {
        let addr = addr & MASK15;
        match class {
            CharClass::Word => {
                self.write_word(addr, value);
                trace!(addr = format_args!("{addr:05o}"), data = format_args!("{:06o}", value & MASK18), "write");
                Ok(())
            }
            CharClass::Double | CharClass::Illegal => {
                Err(Fault::IllegalStore { context: "single-word store" })
            }
            _ => {
                let ci = &CINFO[class as usize];
                let old = self.read_word(addr);
                let new = (old & !ci.field) | ((value & ci.mask) << ci.shift);
                self.write_word(addr, new);
                trace!(addr = format_args!("{addr:05o}"), data = format_args!("{new:06o}"), "write");
                Ok(())
            }
        }
    }

    /// Character-addressed store of an operand up to 36 bits wide.
    ///
    /// `Double` splits the value into two words and writes both
    /// unconditionally, even word first as the most significant half.
    pub fn store_double(&mut self, addr: u32, class: CharClass, value: u64) -> Result<(), Fault> {
        let addr = addr & MASK15;
        match class {
            CharClass::Double => {
                let even = ((value >> 18) as u32) & MASK18;
                let odd = (value as u32) & MASK18;
                self.write_word(addr & 0o77776, even);
                self.write_word(addr | 0o00001, odd);
                trace!(
                    even = format_args!("{:05o}", addr & 0o77776),
                    odd = format_args!("{:05o}", addr | 1),
                    data = format_args!("{value:012o}"),
                    "write pair"
                );
                Ok(())
            }
            CharClass::Illegal => Err(Fault::IllegalStore { context: "double-word store" }),
            _ => self.store(addr, class, value as u32),
        }
    }

    /// Dump a memory range (for the host inspection surface).
    pub fn dump(&self, start: u32, count: u32) -> Vec<(u32, u32)> {
        (start..start.saturating_add(count).min(MEM_SIZE as u32))
            .map(|a| (a, self.read_word(a)))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.words.iter().filter(|&&w| w != 0).count();
        f.debug_struct("Memory")
            .field("non_zero_words", &used)
            .field("total_words", &MEM_SIZE)
            .finish()
    }
}
