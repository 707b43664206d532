//! Instruction decode: the opcode table and the per-cycle workspace.
//!
//! INSTRUCTION FORMATS (bit 0 = most significant of the 18-bit word)
//!
//! Memory reference:
//! ```text
//! | I |   T   |  OPCODE (3-8)  |        D (9-17)        |
//! ```
//! Group 1 non-memory:
//! ```text
//! |   S1  (0-2)   |  OPCODE    |        D (9-17)        |
//! ```
//! Group 2 non-memory:
//! ```text
//! |   S1  (0-2)   |  OPCODE    | S2 (9-11) |  K (12-17) |
//! ```
//!
//! Each of the 64 opcode slots carries a handler record: mnemonic, group,
//! operand access pattern and width, and the execute entry point. Dispatch
//! is a table walk, not a branch tree.

use crate::cpu::execute::ops;
use crate::cpu::execute::{Cpu, CpuError};
use crate::cpu::memory::CharClass;
use crate::cpu::registers::Indicators;
use crate::word::getbits18;

/// Opcode group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpGroup {
    /// Unassigned slot; faults before any field extraction.
    Illegal,
    /// Memory reference: I/T/D fields, effective address required.
    Mem,
    /// Non-memory group 1 (S1 + D), four table slots: 073, 022, 052, 012.
    Grp1a,
    Grp1b,
    Grp1c,
    Grp1d,
    /// Non-memory group 2 (S1 + S2 + K), slot 033.
    Grp2,
}

/// Operand access pattern of a memory-reference opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Effective address only (transfers) or no operand at all.
    None,
    Read,
    Write,
    ReadWrite,
}

/// Operand width of a memory-reference opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Single,
    Double,
}

/// Handler entry point: executes one opcode's semantics against the
/// per-cycle workspace.
pub type ExecFn = fn(&mut Cpu, &mut Workspace) -> Result<(), CpuError>;

/// One slot of the opcode table.
pub struct Op {
    pub mnemonic: &'static str,
    pub group: OpGroup,
    pub access: Access,
    pub width: Width,
    pub exec: ExecFn,
}

/// Per-cycle decode workspace. Fully re-initialized at the start of every
/// cycle; nothing survives into the next instruction.
#[derive(Debug)]
pub struct Workspace {
    /// Raw instruction word.
    pub raw: u32,
    /// 6-bit opcode, bits 3-8.
    pub opcode: u32,
    /// Indirect bit.
    pub i: bool,
    /// Tag field.
    pub t: u32,
    /// 9-bit displacement (memory reference and group 1).
    pub d: u32,
    /// Suboperation codes (group 1 and 2).
    pub s1: u32,
    pub s2: u32,
    /// Operation value, e.g. a shift count (group 2).
    pub k: u32,
    /// Resolved effective word address.
    pub w: u32,
    /// Resolved character class.
    pub c: CharClass,
    /// Fetched operand (18 or 36 bits, right justified).
    pub operand: u64,
    /// Result to commit through the memory layer, for write and
    /// read-modify-write opcodes.
    pub result: Option<u64>,
    /// Working copy of the indicator register; committed after any
    /// operand store-back.
    pub ind: Indicators,
    /// Provisional next instruction counter; transfers overwrite it.
    pub next_ic: u32,
}

impl Workspace {
    pub fn new(raw: u32, ind: Indicators, next_ic: u32) -> Self {
        Self {
            raw,
            opcode: getbits18(raw, 3, 6),
            i: false,
            t: 0,
            d: 0,
            s1: 0,
            s2: 0,
            k: 0,
            w: 0,
            c: CharClass::Word,
            operand: 0,
            result: None,
            ind,
            next_ic,
        }
    }

    /// Extract the memory-reference fields I, T, D.
    pub fn extract_mem(&mut self) {
        self.i = getbits18(self.raw, 0, 1) != 0;
        self.t = getbits18(self.raw, 1, 2);
        self.d = getbits18(self.raw, 9, 9);
    }

    /// Extract the group-1 fields S1, D.
    pub fn extract_grp1(&mut self) {
        self.s1 = getbits18(self.raw, 0, 3);
        self.d = getbits18(self.raw, 9, 9);
    }

    /// Extract the group-2 fields S1, S2, K.
    pub fn extract_grp2(&mut self) {
        self.s1 = getbits18(self.raw, 0, 3);
        self.s2 = getbits18(self.raw, 9, 3);
        self.k = getbits18(self.raw, 12, 6);
    }
}

/// Look up the handler record for a 6-bit opcode.
pub fn lookup(opcode: u32) -> &'static Op {
    &OPCODES[(opcode & 0o77) as usize]
}

/// Render one instruction word for trace output.
pub fn disassemble(raw: u32) -> String {
    let op = lookup(getbits18(raw, 3, 6));
    match op.group {
        OpGroup::Illegal => format!("ill {raw:06o}"),
        OpGroup::Mem => {
            let i = getbits18(raw, 0, 1);
            let t = getbits18(raw, 1, 2);
            let d = getbits18(raw, 9, 9);
            let star = if i != 0 { "*" } else { "" };
            if t != 0 {
                format!("{}{} {:03o},{}", op.mnemonic, star, d, t)
            } else {
                format!("{}{} {:03o}", op.mnemonic, star, d)
            }
        }
        OpGroup::Grp2 => {
            let s1 = getbits18(raw, 0, 3);
            let s2 = getbits18(raw, 9, 3);
            let k = getbits18(raw, 12, 6);
            format!("{} {}/{} {:02o}", op.mnemonic, s1, s2, k)
        }
        _ => {
            let s1 = getbits18(raw, 0, 3);
            let d = getbits18(raw, 9, 9);
            format!("{} {} {:03o}", op.mnemonic, s1, d)
        }
    }
}

macro_rules! op {
    ($mn:literal, $grp:ident, $acc:ident, $w:ident, $exec:path) => {
        Op {
            mnemonic: $mn,
            group: OpGroup::$grp,
            access: Access::$acc,
            width: Width::$w,
            exec: $exec,
        }
    };
}

/// The 64-entry opcode table, indexed by the 6-bit opcode.
pub static OPCODES: [Op; 64] = [
    // 00 - 07
    op!("ill", Illegal, None, Single, ops::illegal),
    op!("MPF", Mem, Read, Single, ops::mpf),
    op!("ADCX2", Mem, Read, Single, ops::adcx2),
    op!("LDX2", Mem, Read, Single, ops::ldx2),
    op!("LDAQ", Mem, Read, Double, ops::ldaq),
    op!("ill", Illegal, None, Single, ops::illegal),
    op!("ADA", Mem, Read, Single, ops::ada),
    op!("LDA", Mem, Read, Single, ops::lda),
    // 10 - 17
    op!("TSY", Mem, Write, Single, ops::tsy),
    op!("ill", Illegal, None, Single, ops::illegal),
    op!("grp1d", Grp1d, None, Single, ops::grp1d),
    op!("STX2", Mem, Write, Single, ops::stx2),
    op!("STAQ", Mem, Write, Double, ops::staq),
    op!("ADAQ", Mem, Read, Double, ops::adaq),
    op!("ASA", Mem, ReadWrite, Single, ops::asa),
    op!("STA", Mem, Write, Single, ops::sta),
    // 20 - 27
    op!("SZN", Mem, Read, Single, ops::szn),
    op!("DVF", Mem, Read, Single, ops::dvf),
    op!("grp1b", Grp1b, None, Single, ops::grp1b),
    op!("CMPX2", Mem, Read, Single, ops::cmpx2),
    op!("SBAQ", Mem, Read, Double, ops::sbaq),
    op!("ill", Illegal, None, Single, ops::illegal),
    op!("SBA", Mem, Read, Single, ops::sba),
    op!("CMPA", Mem, Read, Single, ops::cmpa),
    // 30 - 37
    op!("LDEX", Mem, Read, Single, ops::ldex),
    op!("CANA", Mem, Read, Single, ops::cana),
    op!("ANSA", Mem, ReadWrite, Single, ops::ansa),
    op!("grp2", Grp2, None, Single, ops::grp2),
    op!("ANA", Mem, Read, Single, ops::ana),
    op!("ERA", Mem, Read, Single, ops::era),
    op!("SSA", Mem, ReadWrite, Single, ops::ssa),
    op!("ORA", Mem, Read, Single, ops::ora),
    // 40 - 47
    op!("ADCX3", Mem, Read, Single, ops::adcx3),
    op!("LDX3", Mem, Read, Single, ops::ldx3),
    op!("ADCX1", Mem, Read, Single, ops::adcx1),
    op!("LDX1", Mem, Read, Single, ops::ldx1),
    op!("LDI", Mem, Read, Single, ops::ldi),
    op!("TNC", Mem, None, Single, ops::tnc),
    op!("ADQ", Mem, Read, Single, ops::adq),
    op!("LDQ", Mem, Read, Single, ops::ldq),
    // 50 - 57
    op!("STX3", Mem, Write, Single, ops::stx3),
    op!("ill", Illegal, None, Single, ops::illegal),
    op!("grp1c", Grp1c, None, Single, ops::grp1c),
    op!("STX1", Mem, Write, Single, ops::stx1),
    op!("STI", Mem, Write, Single, ops::sti),
    op!("TOV", Mem, None, Single, ops::tov),
    op!("STZ", Mem, Write, Single, ops::stz),
    op!("STQ", Mem, Write, Single, ops::stq),
    // 60 - 67
    op!("CIOC", Mem, Read, Single, ops::cioc),
    op!("CMPX3", Mem, Read, Single, ops::cmpx3),
    op!("ERSA", Mem, ReadWrite, Single, ops::ersa),
    op!("CMPX1", Mem, Read, Single, ops::cmpx1),
    op!("TNZ", Mem, None, Single, ops::tnz),
    op!("TPL", Mem, None, Single, ops::tpl),
    op!("SBQ", Mem, Read, Single, ops::sbq),
    op!("CMPQ", Mem, Read, Single, ops::cmpq),
    // 70 - 77
    op!("STEX", Mem, Write, Single, ops::stex),
    op!("TRA", Mem, None, Single, ops::tra),
    op!("ORSA", Mem, ReadWrite, Single, ops::orsa),
    op!("grp1a", Grp1a, None, Single, ops::grp1a),
    op!("TZE", Mem, None, Single, ops::tze),
    op!("TMI", Mem, None, Single, ops::tmi),
    op!("AOS", Mem, ReadWrite, Single, ops::aos),
    op!("ill", Illegal, None, Single, ops::illegal),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_fully_populated() {
        assert_eq!(OPCODES.len(), 64);
        let illegal: Vec<usize> = OPCODES
            .iter()
            .enumerate()
            .filter(|(_, op)| op.group == OpGroup::Illegal)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(illegal, vec![0o00, 0o05, 0o11, 0o25, 0o51, 0o77]);
    }

    #[test]
    fn test_lookup_known_opcodes() {
        assert_eq!(lookup(0o07).mnemonic, "LDA");
        assert_eq!(lookup(0o17).mnemonic, "STA");
        assert_eq!(lookup(0o04).width, Width::Double);
        assert_eq!(lookup(0o76).access, Access::ReadWrite);
        assert_eq!(lookup(0o71).access, Access::None);
        assert_eq!(lookup(0o73).group, OpGroup::Grp1a);
    }

    #[test]
    fn test_extract_mem_fields() {
        // I=1, T=2, opcode LDA (07), D=0o123.
        let raw = 0o400000 | (0o2 << 15) | (0o07 << 9) | 0o123;
        let mut ws = Workspace::new(raw, Indicators::new(), 0);
        assert_eq!(ws.opcode, 0o07);
        ws.extract_mem();
        assert!(ws.i);
        assert_eq!(ws.t, 2);
        assert_eq!(ws.d, 0o123);
    }

    #[test]
    fn test_extract_grp2_fields() {
        // S1=1, opcode 033, S2=2, K=0o11.
        let raw = (0o1 << 15) | (0o33 << 9) | (0o2 << 6) | 0o11;
        let mut ws = Workspace::new(raw, Indicators::new(), 0);
        assert_eq!(ws.opcode, 0o33);
        ws.extract_grp2();
        assert_eq!(ws.s1, 1);
        assert_eq!(ws.s2, 2);
        assert_eq!(ws.k, 0o11);
    }

    #[test]
    fn test_disassemble() {
        let lda = (0o07 << 9) | 0o345;
        assert_eq!(disassemble(lda), "LDA 345");
        let lda_ind = 0o400000 | (0o1 << 15) | (0o07 << 9) | 0o345;
        assert_eq!(disassemble(lda_ind), "LDA* 345,1");
        assert_eq!(disassemble(0o777777), "ill 777777");
    }
}
