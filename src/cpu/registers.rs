//! DATANET-355 register file.
//!
//! - IC: 15-bit instruction counter (wraps modulo 2^15)
//! - A, Q: 18-bit accumulators, addressable together as the 36-bit AQ pair
//! - X1..X3: 18-bit index registers (3-bit character class, 15-bit word address)
//! - I: 8-bit indicator register
//! - S: 6-bit I/O channel select register
//! - II: interrupt inhibit bit

use crate::word::{MASK15, MASK18, MASK36, MASK6};
use serde::{Deserialize, Serialize};

/// The 8-bit indicator register.
///
/// Bit 0 is the most significant bit, per the LDI/STI layout:
/// zero, negative, carry, overflow, interrupt inhibit, parity fault
/// inhibit, overflow fault inhibit, parity error.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Indicators(u8);

impl Indicators {
    pub const ZERO: u8 = 0o200;
    pub const NEG: u8 = 0o100;
    pub const CARRY: u8 = 0o040;
    pub const OVF: u8 = 0o020;
    pub const INT_INHIBIT: u8 = 0o010;
    pub const PARITY_FAULT_INHIBIT: u8 = 0o004;
    pub const OVF_FAULT_INHIBIT: u8 = 0o002;
    pub const PARITY_ERROR: u8 = 0o001;

    pub const fn new() -> Self {
        Self(0)
    }

    /// Build from the low 8 bits of a memory word (LDI).
    pub fn from_word(w: u32) -> Self {
        Self((w & 0o377) as u8)
    }

    /// The register as a zero-extended memory word (STI).
    pub fn to_word(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn get(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    #[inline]
    pub fn set(&mut self, mask: u8, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn zero(self) -> bool {
        self.get(Self::ZERO)
    }

    pub fn negative(self) -> bool {
        self.get(Self::NEG)
    }

    pub fn carry(self) -> bool {
        self.get(Self::CARRY)
    }

    pub fn overflow(self) -> bool {
        self.get(Self::OVF)
    }
}

impl std::fmt::Debug for Indicators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}{}{}{}]",
            if self.zero() { 'Z' } else { '-' },
            if self.negative() { 'N' } else { '-' },
            if self.carry() { 'C' } else { '-' },
            if self.overflow() { 'V' } else { '-' },
        )
    }
}

/// The register file. Owned by the execution engine; individually
/// readable/writable by the host for debugging and state seeding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registers {
    /// 15-bit instruction counter.
    pub ic: u32,
    /// Accumulator A.
    pub a: u32,
    /// Accumulator Q.
    pub q: u32,
    /// Index registers X1, X2, X3.
    pub x: [u32; 3],
    /// Indicator register.
    pub ind: Indicators,
    /// I/O channel select register.
    pub s: u32,
    /// Interrupt inhibit.
    pub ii: bool,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            ic: 0,
            a: 0,
            q: 0,
            x: [0; 3],
            ind: Indicators::new(),
            s: 0,
            ii: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Index register Xn, n in 1..=3.
    #[inline]
    pub fn x(&self, n: u32) -> u32 {
        debug_assert!((1..=3).contains(&n));
        self.x[(n - 1) as usize]
    }

    /// Write index register Xn, n in 1..=3. Masked to 18 bits.
    #[inline]
    pub fn set_x(&mut self, n: u32, value: u32) {
        debug_assert!((1..=3).contains(&n));
        self.x[(n - 1) as usize] = value & MASK18;
    }

    /// The 36-bit AQ pair, A as the high half.
    #[inline]
    pub fn aq(&self) -> u64 {
        ((self.a as u64) << 18 | self.q as u64) & MASK36
    }

    /// Split a 36-bit value into A (high) and Q (low).
    #[inline]
    pub fn set_aq(&mut self, value: u64) {
        self.a = ((value >> 18) as u32) & MASK18;
        self.q = (value as u32) & MASK18;
    }

    /// Write the channel select register. Masked to 6 bits.
    pub fn set_s(&mut self, value: u32) {
        self.s = value & MASK6;
    }

    /// Advance the instruction counter by one, wrapping modulo 2^15.
    pub fn next_ic(&self) -> u32 {
        (self.ic + 1) & MASK15
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
