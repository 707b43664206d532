//! 18- and 36-bit two's-complement arithmetic with indicator updates.
//!
//! Operands are sign-extended by one guard bit before the operation, so the
//! sum can never overflow the working integer: overflow is then the XOR of
//! the guard bit and the sign bit of the truncated result, and carry is the
//! bit above the guard. Subtraction uses the inverted carry convention of
//! the hardware: carry-in asserted means "no borrow", and the carry
//! indicator records the negation of the raw borrow-out.
//!
//! Each of the zero/negative/carry/overflow indicators is touched only if
//! the caller's selection mask asks for it; the overflow indicator is only
//! ever set, never cleared, by these routines.

use crate::cpu::registers::Indicators;
use crate::word::{MASK18, MASK36, SIGN18, SIGN36};

/// Update mask covering all four arithmetic indicators.
pub const FLAGS_ALL: u8 =
    Indicators::ZERO | Indicators::NEG | Indicators::CARRY | Indicators::OVF;

/// Update mask for compare operations: zero, negative and carry.
pub const FLAGS_CMP: u8 = Indicators::ZERO | Indicators::NEG | Indicators::CARRY;

/// Update mask for pure load/logic results: zero and negative.
pub const FLAGS_ZN: u8 = Indicators::ZERO | Indicators::NEG;

const BIT19: u32 = 1 << 18; // guard bit for 18-bit operands
const BIT20: u32 = 1 << 19; // carry-out bit for 18-bit operands
const BIT37: u64 = 1 << 36; // guard bit for 36-bit operands
const BIT38: u64 = 1 << 37; // carry-out bit for 36-bit operands

fn commit18(res: u32, cry: bool, ovf: bool, invert_carry: bool, set: u8, ind: &mut Indicators) {
    if set & Indicators::CARRY != 0 {
        ind.set(Indicators::CARRY, cry ^ invert_carry);
    }
    if set & Indicators::OVF != 0 && ovf {
        ind.set(Indicators::OVF, true);
    }
    if set & Indicators::ZERO != 0 {
        ind.set(Indicators::ZERO, res == 0);
    }
    if set & Indicators::NEG != 0 {
        ind.set(Indicators::NEG, res & SIGN18 != 0);
    }
}

fn commit36(res: u64, cry: bool, ovf: bool, invert_carry: bool, set: u8, ind: &mut Indicators) {
    if set & Indicators::CARRY != 0 {
        ind.set(Indicators::CARRY, cry ^ invert_carry);
    }
    if set & Indicators::OVF != 0 && ovf {
        ind.set(Indicators::OVF, true);
    }
    if set & Indicators::ZERO != 0 {
        ind.set(Indicators::ZERO, res == 0);
    }
    if set & Indicators::NEG != 0 {
        ind.set(Indicators::NEG, res & SIGN36 != 0);
    }
}

/// 18-bit add with explicit carry-in. Returns the truncated 18-bit sum and
/// updates the indicators selected by `set`.
pub fn add18(op1: u32, op2: u32, carry_in: bool, set: u8, ind: &mut Indicators) -> u32 {
    let mut op1e = op1 & MASK18;
    let mut op2e = op2 & MASK18;
    if op1e & SIGN18 != 0 {
        op1e |= BIT19;
    }
    if op2e & SIGN18 != 0 {
        op2e |= BIT19;
    }

    let res = op1e.wrapping_add(op2e).wrapping_add(carry_in as u32);

    let ovf = (res & BIT19 != 0) ^ (res & SIGN18 != 0);
    let cry = res & BIT20 != 0;
    let res = res & MASK18;

    commit18(res, cry, ovf, false, set, ind);
    res
}

/// 18-bit subtract (`op1 - op2`) with the borrow carried in inverted sense:
/// `carry_in` asserted means no borrow. The carry indicator, when selected,
/// records the negation of the raw borrow-out.
pub fn sub18(op1: u32, op2: u32, carry_in: bool, set: u8, ind: &mut Indicators) -> u32 {
    let mut op1e = op1 & MASK18;
    let mut op2e = op2 & MASK18;
    if op1e & SIGN18 != 0 {
        op1e |= BIT19;
    }
    if op2e & SIGN18 != 0 {
        op2e |= BIT19;
    }

    let borrow = !carry_in as u32;
    let res = op1e.wrapping_sub(op2e).wrapping_sub(borrow);

    let ovf = (res & BIT19 != 0) ^ (res & SIGN18 != 0);
    let cry = res & BIT20 != 0;
    let res = res & MASK18;

    commit18(res, cry, ovf, true, set, ind);
    res
}

/// 36-bit add with explicit carry-in.
pub fn add36(op1: u64, op2: u64, carry_in: bool, set: u8, ind: &mut Indicators) -> u64 {
    let mut op1e = op1 & MASK36;
    let mut op2e = op2 & MASK36;
    if op1e & SIGN36 != 0 {
        op1e |= BIT37;
    }
    if op2e & SIGN36 != 0 {
        op2e |= BIT37;
    }

    let res = op1e.wrapping_add(op2e).wrapping_add(carry_in as u64);

    let ovf = (res & BIT37 != 0) ^ (res & SIGN36 != 0);
    let cry = res & BIT38 != 0;
    let res = res & MASK36;

    commit36(res, cry, ovf, false, set, ind);
    res
}

/// 36-bit subtract, inverted borrow convention as [`sub18`].
pub fn sub36(op1: u64, op2: u64, carry_in: bool, set: u8, ind: &mut Indicators) -> u64 {
    let mut op1e = op1 & MASK36;
    let mut op2e = op2 & MASK36;
    if op1e & SIGN36 != 0 {
        op1e |= BIT37;
    }
    if op2e & SIGN36 != 0 {
        op2e |= BIT37;
    }

    let borrow = !carry_in as u64;
    let res = op1e.wrapping_sub(op2e).wrapping_sub(borrow);

    let ovf = (res & BIT37 != 0) ^ (res & SIGN36 != 0);
    let cry = res & BIT38 != 0;
    let res = res & MASK36;

    commit36(res, cry, ovf, true, set, ind);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add18_basic() {
        let mut ind = Indicators::new();
        assert_eq!(add18(100, 50, false, FLAGS_ALL, &mut ind), 150);
        assert!(!ind.zero());
        assert!(!ind.negative());
        assert!(!ind.carry());
        assert!(!ind.overflow());
    }

    #[test]
    fn test_add18_carry_out() {
        let mut ind = Indicators::new();
        // -1 + 1 carries out of the 18-bit field.
        let r = add18(0o777777, 1, false, FLAGS_ALL, &mut ind);
        assert_eq!(r, 0);
        assert!(ind.carry());
        assert!(ind.zero());
        assert!(!ind.overflow());
    }

    #[test]
    fn test_add18_overflow() {
        let mut ind = Indicators::new();
        // Largest positive + 1 overflows to the most negative value.
        let r = add18(0o377777, 1, false, FLAGS_ALL, &mut ind);
        assert_eq!(r, 0o400000);
        assert!(ind.overflow());
        assert!(ind.negative());
        assert!(!ind.carry());
    }

    #[test]
    fn test_overflow_indicator_is_sticky() {
        let mut ind = Indicators::new();
        ind.set(Indicators::OVF, true);
        // A non-overflowing add leaves the indicator set.
        add18(1, 1, false, FLAGS_ALL, &mut ind);
        assert!(ind.overflow());
    }

    #[test]
    fn test_flag_selection_mask() {
        let mut ind = Indicators::new();
        add18(0o777777, 1, false, FLAGS_ZN, &mut ind);
        // Carry happened but was not requested.
        assert!(!ind.carry());
        assert!(ind.zero());
    }

    #[test]
    fn test_sub18_inverted_borrow() {
        let mut ind = Indicators::new();
        // 5 - 3 produces no borrow; the carry indicator records the
        // negation of the borrow-out and ends up set.
        let r = sub18(5, 3, true, FLAGS_ALL, &mut ind);
        assert_eq!(r, 2);
        assert!(ind.carry());

        // 3 - 5 borrows, so the indicator clears.
        let r = sub18(3, 5, true, FLAGS_ALL, &mut ind);
        assert_eq!(r, 0o777776);
        assert!(!ind.carry());
        assert!(ind.negative());
    }

    #[test]
    fn test_sub18_without_carry_in() {
        let mut ind = Indicators::new();
        // Carry-in clear means an extra borrow: 5 - 3 - 1.
        assert_eq!(sub18(5, 3, false, FLAGS_ALL, &mut ind), 1);
    }

    #[test]
    fn test_add36_basic() {
        let mut ind = Indicators::new();
        let r = add36(0o377777777777, 1, false, FLAGS_ALL, &mut ind);
        assert_eq!(r, 0o400000000000);
        assert!(ind.overflow());
        assert!(ind.negative());
    }

    #[test]
    fn test_sub36_zero_result() {
        let mut ind = Indicators::new();
        let r = sub36(0o123456654321, 0o123456654321, true, FLAGS_ALL, &mut ind);
        assert_eq!(r, 0);
        assert!(ind.zero());
        // No borrow on an equal subtraction, so the indicator is set.
        assert!(ind.carry());
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_is_identity(a in 0u32..=MASK18, b in 0u32..=MASK18) {
            let mut ind = Indicators::new();
            let sum = add18(a, b, false, FLAGS_ALL, &mut ind);
            let back = sub18(sum, b, true, FLAGS_ALL, &mut ind);
            prop_assert_eq!(back, a);
        }

        #[test]
        fn prop_add36_then_sub36_is_identity(a in 0u64..=MASK36, b in 0u64..=MASK36) {
            let mut ind = Indicators::new();
            let sum = add36(a, b, false, FLAGS_ALL, &mut ind);
            let back = sub36(sum, b, true, FLAGS_ALL, &mut ind);
            prop_assert_eq!(back, a);
        }

        #[test]
        fn prop_add18_matches_wide_arithmetic(a in 0u32..=MASK18, b in 0u32..=MASK18) {
            let mut ind = Indicators::new();
            let r = add18(a, b, false, FLAGS_ALL, &mut ind);
            prop_assert_eq!(r, (a + b) & MASK18);
            prop_assert_eq!(ind.carry(), a + b > MASK18);
        }
    }
}
