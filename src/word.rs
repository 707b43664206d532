//! 18-bit word primitives.
//!
//! The DATANET-355 is an 18-bit machine with 15-bit word addresses.
//! Words are carried in `u32` (double words in `u64`) and masked down
//! at the boundaries; these helpers keep the masking and two's-complement
//! sign handling in one place.
//!
//! Bit numbering follows the hardware manuals: bit 0 is the most
//! significant bit of the 18-bit word, bit 17 the least.

/// Low 2 bits.
pub const MASK2: u32 = 0o3;
/// Low 3 bits.
pub const MASK3: u32 = 0o7;
/// Low 6 bits.
pub const MASK6: u32 = 0o77;
/// Low 9 bits.
pub const MASK9: u32 = 0o777;
/// Low 12 bits.
pub const MASK12: u32 = 0o7777;
/// Low 15 bits: a full word address.
pub const MASK15: u32 = 0o77777;
/// Low 18 bits: a full word.
pub const MASK18: u32 = 0o777777;
/// Low 36 bits: a double word.
pub const MASK36: u64 = 0o777777777777;

/// Sign bit of an 18-bit word (bit 0).
pub const SIGN18: u32 = 0o400000;
/// Sign bit of a 36-bit double word.
pub const SIGN36: u64 = 0o400000000000;

/// Words of memory: 32K.
pub const MEM_SIZE: usize = 1 << 15;

/// Sign-extend a 6-bit two's-complement value to `i32`.
#[inline]
pub fn sign_ext6(x: u32) -> i32 {
    let x = x & MASK6;
    if x & 0o40 != 0 {
        (x | !MASK6) as i32
    } else {
        x as i32
    }
}

/// Sign-extend a 9-bit two's-complement value to `i32`.
#[inline]
pub fn sign_ext9(x: u32) -> i32 {
    let x = x & MASK9;
    if x & 0o400 != 0 {
        (x | !MASK9) as i32
    } else {
        x as i32
    }
}

/// Sign-extend a 12-bit two's-complement value to `i32`.
#[inline]
pub fn sign_ext12(x: u32) -> i32 {
    let x = x & MASK12;
    if x & 0o4000 != 0 {
        (x | !MASK12) as i32
    } else {
        x as i32
    }
}

/// Interpret an 18-bit word as a signed value.
#[inline]
pub fn to_signed18(x: u32) -> i32 {
    let x = x & MASK18;
    if x & SIGN18 != 0 {
        (x | !MASK18) as i32
    } else {
        x as i32
    }
}

/// Interpret a 36-bit double word as a signed value.
#[inline]
pub fn to_signed36(x: u64) -> i64 {
    let x = x & MASK36;
    if x & SIGN36 != 0 {
        (x | !MASK36) as i64
    } else {
        x as i64
    }
}

/// Extract `n` bits starting at bit position `p` of an 18-bit word
/// (bit 0 = most significant).
#[inline]
pub fn getbits18(x: u32, p: u32, n: u32) -> u32 {
    debug_assert!(p + n <= 18, "getbits18: bad field ({p},{n})");
    let shift = 18 - p - n;
    (x >> shift) & !(!0u32 << n)
}

/// Replace `n` bits starting at bit position `p` of an 18-bit word
/// (bit 0 = most significant) with the low `n` bits of `val`.
#[inline]
pub fn setbits18(x: u32, p: u32, n: u32, val: u32) -> u32 {
    debug_assert!(p + n <= 18, "setbits18: bad field ({p},{n})");
    let shift = 18 - p - n;
    let mask = !(!0u32 << n) << shift;
    (x & !mask) | ((val << shift) & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_ext9() {
        assert_eq!(sign_ext9(0), 0);
        assert_eq!(sign_ext9(0o377), 255);
        assert_eq!(sign_ext9(0o777), -1);
        assert_eq!(sign_ext9(0o400), -256);
    }

    #[test]
    fn test_sign_ext6() {
        assert_eq!(sign_ext6(0o37), 31);
        assert_eq!(sign_ext6(0o77), -1);
        assert_eq!(sign_ext6(0o40), -32);
    }

    #[test]
    fn test_sign_ext12() {
        assert_eq!(sign_ext12(0o3777), 2047);
        assert_eq!(sign_ext12(0o7777), -1);
        assert_eq!(sign_ext12(0o4000), -2048);
    }

    #[test]
    fn test_to_signed18() {
        assert_eq!(to_signed18(0o377777), 131071);
        assert_eq!(to_signed18(0o777777), -1);
        assert_eq!(to_signed18(0o400000), -131072);
    }

    #[test]
    fn test_getbits18() {
        // Opcode field of a memory-reference instruction: bits 3-8.
        let ins = 0o712345; // 111 001 010 011 100 101
        assert_eq!(getbits18(ins, 3, 6), 0o12);
        assert_eq!(getbits18(ins, 0, 1), 1); // indirect bit
        assert_eq!(getbits18(ins, 1, 2), 0o3); // tag field
        assert_eq!(getbits18(ins, 9, 9), 0o345); // displacement
    }

    #[test]
    fn test_setbits18() {
        assert_eq!(setbits18(0, 3, 6, 0o77), 0o077000);
        assert_eq!(setbits18(0, 9, 9, 0o345), 0o345);
        assert_eq!(setbits18(0o777777, 9, 9, 0), 0o777000);
        // Oversized values are masked down.
        assert_eq!(setbits18(0, 0, 1, 0o3), 0o400000);
    }
}
