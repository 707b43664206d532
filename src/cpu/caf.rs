//! Character address formation.
//!
//! Effective addresses are (word address, character class) pairs. Forming
//! one adds the instruction's displacement to a base drawn from an index
//! register or the instruction counter; the two character classes combine
//! through the character address addition rules matrix, which may also
//! carry one into the word address (e.g. 9-bit char 1 + 9-bit char 1 is
//! 9-bit char 0 of the next word). Indirect words chain the process until
//! one with a clear indirect bit is reached.

use crate::cpu::fault::Fault;
use crate::cpu::memory::{CharClass, Memory};
use crate::cpu::registers::Registers;
use crate::word::{getbits18, sign_ext12, sign_ext6, sign_ext9, MASK12, MASK15, MASK3, MASK6, MASK9};
use tracing::debug;

/// Character address addition rules matrix, indexed by
/// (base class, displacement class). The low 3 bits of an entry are the
/// combined class; `0o10` flags a carry into the word address. Class 7
/// anywhere means the combination is illegal.
static CAAR: [[u32; 8]; 8] = [
    [0, 7, 7, 7, 7, 7, 7, 7],
    [7, 7, 7, 7, 7, 7, 7, 7],
    [7, 7, 2, 3, 7, 7, 7, 7],
    [7, 7, 3, 0o12, 7, 7, 7, 7],
    [7, 7, 7, 7, 4, 5, 6, 7],
    [7, 7, 7, 7, 5, 6, 0o14, 7],
    [7, 7, 7, 7, 6, 0o14, 0o15, 7],
    [7, 7, 7, 7, 7, 7, 7, 7],
];

/// Add two character addresses.
///
/// Word parts are taken as sign-extended values; the classes combine
/// through the rules matrix, with any fractional carry folded into the
/// 15-bit word sum.
pub fn addr_add(
    wx: i32,
    cx: CharClass,
    wy: i32,
    cy: CharClass,
) -> Result<(u32, CharClass), Fault> {
    let entry = CAAR[cx as usize][cy as usize];
    if entry & MASK3 == 7 {
        return Err(Fault::IllegalCharAddress { context: "character address addition" });
    }
    let mut w = wx.wrapping_add(wy);
    if entry & 0o10 != 0 {
        w = w.wrapping_add(1);
    }
    Ok(((w as u32) & MASK15, CharClass::from_bits(entry)))
}

/// Base (word address, class) selected by a tag field: the given
/// IC-or-zero value for T=0, otherwise index register X1..X3.
fn tag_base(regs: &Registers, t: u32, ic_or_zero: u32) -> (u32, CharClass) {
    match t & 0o3 {
        0 => (ic_or_zero & MASK15, CharClass::Word),
        n => {
            let x = regs.x(n);
            (x & MASK15, CharClass::from_bits((x >> 15) & MASK3))
        }
    }
}

/// Resolve an instruction's (I, T, D) fields into the final effective
/// (word address, character class) pair, following any indirect chain.
///
/// `max_indirect` bounds the chain; the hardware defines no limit, so a
/// chain deeper than the bound faults rather than looping forever.
pub fn resolve(
    regs: &Registers,
    mem: &Memory,
    i: bool,
    t: u32,
    d: u32,
    max_indirect: usize,
) -> Result<(u32, CharClass), Fault> {
    debug!(i, t, d = format_args!("{d:03o}"), "caf entry");

    let mut ct = CharClass::Word;
    let mut wt;

    if t == 0 {
        // Word addressing: the displacement is all 9 bits, IC relative.
        wt = (sign_ext9(d & MASK9).wrapping_add(regs.ic as i32) as u32) & MASK15;
    } else {
        // Possible character addressing: 6-bit word displacement plus a
        // 3-bit class displacement, combined with the index register.
        let (bw, bc) = tag_base(regs, t, regs.ic);
        let w6 = sign_ext6(d & MASK6);
        let c6 = CharClass::from_bits((d >> 6) & MASK3);
        let (w, c) = addr_add(bw as i32, bc, w6, c6)?;
        wt = w;
        ct = c;
        if !(ct == CharClass::Word && i) {
            // No indirection cycle required.
            debug!(w = format_args!("{wt:05o}"), c = ct.bits(), "caf exit");
            return Ok((wt, ct));
        }
    }

    let mut indirect = i;
    let mut depth = 0usize;
    while indirect {
        if depth >= max_indirect {
            return Err(Fault::IndirectDepthExceeded { limit: max_indirect, addr: wt });
        }
        depth += 1;

        let cy = mem.read_word(wt);
        let t = getbits18(cy, 1, 2);
        if t == 0 {
            // Word addressing: all 15 bits of Y are the address.
            wt = cy & MASK15;
            ct = CharClass::Word;
        } else {
            // Index-register combination with a 12-bit displacement and
            // the indirect word's own 3-bit class field.
            let (bw, bc) = tag_base(regs, t, 0);
            let w12 = sign_ext12(cy & MASK12);
            let c12 = CharClass::from_bits((cy >> 12) & MASK3);
            let (w, c) = addr_add(bw as i32, bc, w12, c12)?;
            wt = w;
            ct = c;
        }
        indirect = cy & 0o400000 != 0;
    }

    debug!(w = format_args!("{wt:05o}"), c = ct.bits(), "caf exit");
    Ok((wt, ct))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Registers, Memory) {
        (Registers::new(), Memory::new())
    }

    /// Pack an index register value: class in the top 3 bits, word
    /// address in the low 15.
    fn xreg(c: u32, w: u32) -> u32 {
        (c & MASK3) << 15 | (w & MASK15)
    }

    #[test]
    fn test_addr_add_word_classes() {
        let (w, c) = addr_add(0o100, CharClass::Word, 0o20, CharClass::Word).unwrap();
        assert_eq!(w, 0o120);
        assert_eq!(c, CharClass::Word);
    }

    #[test]
    fn test_addr_add_fractional_carry() {
        // char 1 + char 1 of the 9-bit pair wraps to char 0 of the next word.
        let (w, c) = addr_add(0o100, CharClass::Byte1, 0, CharClass::Byte1).unwrap();
        assert_eq!(w, 0o101);
        assert_eq!(c, CharClass::Byte0);

        // 6-bit char 2 + char 2 wraps to char 1 of the next word.
        let (w, c) = addr_add(0o200, CharClass::Char2, 0, CharClass::Char2).unwrap();
        assert_eq!(w, 0o201);
        assert_eq!(c, CharClass::Char1);
    }

    #[test]
    fn test_addr_add_mixed_widths_fault() {
        // 9-bit and 6-bit characters never combine.
        assert!(addr_add(0, CharClass::Byte0, 0, CharClass::Char0).is_err());
        // Class 7 in either position always faults.
        assert!(addr_add(0, CharClass::Illegal, 0, CharClass::Word).is_err());
        assert!(addr_add(0, CharClass::Char1, 0, CharClass::Illegal).is_err());
        // Double word combines with nothing, itself included.
        assert!(addr_add(0, CharClass::Double, 0, CharClass::Double).is_err());
    }

    #[test]
    fn test_resolve_ic_relative() {
        let (mut regs, mem) = setup();
        regs.ic = 0o1000;
        let (w, c) = resolve(&regs, &mem, false, 0, 0o005, 64).unwrap();
        assert_eq!(w, 0o1005);
        assert_eq!(c, CharClass::Word);

        // Negative displacement: 0o777 is -1.
        let (w, _) = resolve(&regs, &mem, false, 0, 0o777, 64).unwrap();
        assert_eq!(w, 0o777);
    }

    #[test]
    fn test_resolve_indexed_character() {
        let (mut regs, mem) = setup();
        // X2 points at word 0o2000, 6-bit char 1.
        regs.set_x(2, xreg(CharClass::Char1.bits(), 0o2000));
        // D: class displacement char 1, word displacement +3.
        let d = (CharClass::Char1.bits() << 6) | 0o3;
        let (w, c) = resolve(&regs, &mem, false, 2, d, 64).unwrap();
        assert_eq!(w, 0o2003);
        assert_eq!(c, CharClass::Char2);
    }

    #[test]
    fn test_resolve_indexed_negative_displacement() {
        let (mut regs, mem) = setup();
        regs.set_x(1, xreg(0, 0o2000));
        // 6-bit word displacement -2, word class.
        let (w, c) = resolve(&regs, &mem, false, 1, 0o76, 64).unwrap();
        assert_eq!(w, 0o1776);
        assert_eq!(c, CharClass::Word);
    }

    #[test]
    fn test_resolve_indirect_word_chain() {
        let (mut regs, mut mem) = setup();
        regs.ic = 0o100;
        // Instruction: I=1 T=0 D=0o10 -> fetch indirect at 0o110.
        // Indirect word at 0o110: I=0 T=0 Y=0o4321.
        mem.write_word(0o110, 0o4321);
        let (w, c) = resolve(&regs, &mem, true, 0, 0o10, 64).unwrap();
        assert_eq!(w, 0o4321);
        assert_eq!(c, CharClass::Word);
    }

    #[test]
    fn test_resolve_indirect_tagged_word() {
        let (mut regs, mut mem) = setup();
        regs.ic = 0o100;
        regs.set_x(3, xreg(CharClass::Byte0.bits(), 0o3000));
        // Indirect word at 0o101: I=0, T=3, C=Byte1, W12=+5.
        let iword = (0o3 << 15) | (CharClass::Byte1.bits() << 12) | 0o5;
        mem.write_word(0o101, iword);
        let (w, c) = resolve(&regs, &mem, true, 0, 0o1, 64).unwrap();
        assert_eq!(w, 0o3005);
        assert_eq!(c, CharClass::Byte1);
    }

    #[test]
    fn test_resolve_multi_level_indirect() {
        let (mut regs, mut mem) = setup();
        regs.ic = 0;
        // 0o20 -> indirect again at 0o30 -> terminates at 0o40.
        mem.write_word(0o20, 0o400000 | 0o30);
        mem.write_word(0o30, 0o40);
        let (w, c) = resolve(&regs, &mem, true, 0, 0o20, 64).unwrap();
        assert_eq!(w, 0o40);
        assert_eq!(c, CharClass::Word);
    }

    #[test]
    fn test_resolve_depth_bound_faults() {
        let (mut regs, mut mem) = setup();
        regs.ic = 0;
        // Self-referential indirect word: would loop forever.
        mem.write_word(0o20, 0o400000 | 0o20);
        let err = resolve(&regs, &mem, true, 0, 0o20, 8).unwrap_err();
        assert!(matches!(err, Fault::IndirectDepthExceeded { limit: 8, .. }));
    }

    #[test]
    fn test_resolve_never_yields_double_or_illegal() {
        let (mut regs, mut mem) = setup();
        regs.ic = 0o100;
        regs.set_x(1, xreg(CharClass::Char0.bits(), 0o500));
        mem.write_word(0o110, 0o4321);
        for (i, t, d) in [
            (false, 0, 0o5),
            (true, 0, 0o10),
            (false, 1, (CharClass::Char2.bits() << 6) | 0o2),
        ] {
            let (_, c) = resolve(&regs, &mem, i, t, d, 64).unwrap();
            assert!(c != CharClass::Double && c != CharClass::Illegal);
        }
    }

    #[test]
    fn test_resolve_illegal_index_class_faults() {
        let (mut regs, mem) = setup();
        regs.set_x(1, xreg(7, 0o100));
        let err = resolve(&regs, &mem, false, 1, 0, 64).unwrap_err();
        assert!(matches!(err, Fault::IllegalCharAddress { .. }));
    }
}
