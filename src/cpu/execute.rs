//! The fetch/decode/execute engine.
//!
//! One call to [`Cpu::step`] runs one instruction to completion, in order:
//! fetch, group classification, field extraction, effective-address
//! resolution, operand fetch, opcode semantics, operand store-back,
//! indicator commit, instruction-counter commit. A fault unwinds as an `Err`
//! before anything has been committed; the host loop decides whether to
//! stop or vector through the fault table and resume.

use crate::cpu::arith::{self, FLAGS_ALL, FLAGS_CMP};
use crate::cpu::caf;
use crate::cpu::decode::{self, Access, Op, OpGroup, Width, Workspace};
use crate::cpu::fault::Fault;
use crate::cpu::memory::{CharClass, Memory};
use crate::cpu::registers::{Indicators, Registers};
use crate::word::{
    getbits18, sign_ext6, sign_ext9, to_signed18, to_signed36, MASK15, MASK18, MASK3, MASK36,
    SIGN18, SIGN36,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Engine state between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    Running,
    /// Host-requested stop; clear with [`Cpu::resume`].
    Stopped,
    /// Stopped on a hard fault.
    Faulted,
}

/// An I/O connect latched by CIOC for the channel layer to pick up.
/// The core hands control over at this single trigger point; device
/// dispatch itself is the host's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoRequest {
    /// Channel select register at the time of the connect.
    pub channel: u32,
    /// The connect word fetched from the effective address.
    pub connect: u32,
}

/// One executed instruction, for trace output.
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    pub ic: u32,
    pub raw: u32,
    pub mnemonic: &'static str,
}

/// Errors surfaced from the execution loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CpuError {
    #[error("fault: {0}")]
    Fault(#[from] Fault),

    #[error("opcode {opcode:02o} ({mnemonic}, sub {sub}) not implemented")]
    NotImplemented {
        mnemonic: &'static str,
        opcode: u32,
        sub: u32,
    },

    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),
}

/// The processor: register file plus memory, driven one instruction at a
/// time by the host loop. No ambient global state; everything lives here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    pub regs: Registers,
    pub mem: Memory,
    pub state: CpuState,
    /// Instructions executed since reset.
    pub cycles: u64,
    /// Safety bound on indirect-address chains. The hardware defines no
    /// limit; exceeding this faults instead of looping forever.
    pub max_indirect: usize,
    /// Connect latched by the last CIOC, if the host has not taken it.
    pub pending_io: Option<IoRequest>,
}

impl Cpu {
    pub const DEFAULT_MAX_INDIRECT: usize = 64;

    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            max_indirect: Self::DEFAULT_MAX_INDIRECT,
            pending_io: None,
        }
    }

    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.pending_io = None;
    }

    /// Boot handoff: copy an image into memory and point the instruction
    /// counter at the start address. Must precede the first `step`.
    pub fn load_image(&mut self, origin: u32, image: &[u32], start: u32) {
        self.mem.load_image(origin, image);
        self.regs.ic = start & MASK15;
    }

    /// Host-requested stop, honored between instructions.
    pub fn request_stop(&mut self) {
        if self.state == CpuState::Running {
            self.state = CpuState::Stopped;
        }
    }

    /// Clear a stop or fault condition and continue from the current IC.
    pub fn resume(&mut self) {
        self.state = CpuState::Running;
    }

    /// Trap through the fault vector table: point the IC at the fault's
    /// trap location and resume. The word there is conventionally a
    /// transfer into the fault handler.
    pub fn vector_fault(&mut self, fault: &Fault) {
        self.regs.ic = fault.vector().address() & MASK15;
        self.state = CpuState::Running;
    }

    /// Take the I/O connect latched by CIOC, if any.
    pub fn take_io(&mut self) -> Option<IoRequest> {
        self.pending_io.take()
    }

    /// Execute a single instruction.
    ///
    /// On a fault the engine stops with no partial commit: registers,
    /// indicators, memory and the instruction counter are exactly as they
    /// were before the instruction began.
    pub fn step(&mut self) -> Result<StepInfo, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let ic = self.regs.ic;
        let raw = self.mem.read_word(ic);
        debug!(
            ic = format_args!("{ic:05o}"),
            ins = format_args!("{raw:06o}"),
            "{}",
            decode::disassemble(raw)
        );

        let op = decode::lookup(getbits18(raw, 3, 6));
        match self.execute_cycle(op, raw) {
            Ok(()) => {
                self.cycles += 1;
                Ok(StepInfo { ic, raw, mnemonic: op.mnemonic })
            }
            Err(e) => {
                self.state = match e {
                    CpuError::Fault(_) => CpuState::Faulted,
                    _ => CpuState::Stopped,
                };
                Err(e)
            }
        }
    }

    /// Run until stop, fault, or `max_cycles` instructions. Returns the
    /// number of instructions executed.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start = self.cycles;
        let limit = self.cycles + max_cycles;
        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }
        Ok(self.cycles - start)
    }

    fn execute_cycle(&mut self, op: &'static Op, raw: u32) -> Result<(), CpuError> {
        // Illegal slots fault before any field extraction.
        if op.group == OpGroup::Illegal {
            return Err(Fault::IllegalOpcode { opcode: getbits18(raw, 3, 6), ic: self.regs.ic }.into());
        }

        let mut ws = Workspace::new(raw, self.regs.ind, self.regs.next_ic());

        match op.group {
            OpGroup::Mem => {
                ws.extract_mem();
                let (w, c) =
                    caf::resolve(&self.regs, &self.mem, ws.i, ws.t, ws.d, self.max_indirect)?;
                ws.w = w;
                // A double-width opcode addresses the pair even when the
                // resolved class is plain word addressing.
                ws.c = if op.width == Width::Double && c == CharClass::Word {
                    CharClass::Double
                } else {
                    c
                };
                if matches!(op.access, Access::Read | Access::ReadWrite) {
                    ws.operand = match op.width {
                        Width::Single => self.mem.load(w, ws.c)? as u64,
                        Width::Double => self.mem.load_double(w, ws.c)?,
                    };
                }
            }
            OpGroup::Grp2 => ws.extract_grp2(),
            _ => ws.extract_grp1(),
        }

        (op.exec)(self, &mut ws)?;

        // Operand store-back precedes the indicator and IC commits.
        if matches!(op.access, Access::Write | Access::ReadWrite) {
            debug_assert!(ws.result.is_some(), "{}: write opcode left no result", op.mnemonic);
            if let Some(value) = ws.result {
                match op.width {
                    Width::Single => self.mem.store(ws.w, ws.c, value as u32)?,
                    Width::Double => self.mem.store_double(ws.w, ws.c, value)?,
                }
            }
        }

        self.regs.ind = ws.ind;
        self.regs.ic = ws.next_ic & MASK15;
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

fn set_zn18(ind: &mut Indicators, value: u32) {
    ind.set(Indicators::ZERO, value & MASK18 == 0);
    ind.set(Indicators::NEG, value & SIGN18 != 0);
}

fn set_zn36(ind: &mut Indicators, value: u64) {
    ind.set(Indicators::ZERO, value & MASK36 == 0);
    ind.set(Indicators::NEG, value & SIGN36 != 0);
}

/// Arithmetic shift right of an 18-bit value.
fn asr18(value: u32, count: u32) -> u32 {
    ((to_signed18(value) >> count.min(31)) as u32) & MASK18
}

/// Arithmetic shift right of a 36-bit value.
fn asr36(value: u64, count: u32) -> u64 {
    ((to_signed36(value) >> count.min(63)) as u64) & MASK36
}

fn shl18(value: u32, count: u32) -> u32 {
    if count >= 18 {
        0
    } else {
        (value << count) & MASK18
    }
}

fn shl36(value: u64, count: u32) -> u64 {
    if count >= 36 {
        0
    } else {
        (value << count) & MASK36
    }
}

/// Rotate an 18-bit value left.
fn rol18(value: u32, count: u32) -> u32 {
    let r = count % 18;
    if r == 0 {
        value & MASK18
    } else {
        ((value << r) | ((value & MASK18) >> (18 - r))) & MASK18
    }
}

/// Opcode handlers. Each runs one opcode's semantics against the cycle
/// workspace; dispatch has already resolved the address and fetched the
/// operand when the opcode table asked for it.
pub(crate) mod ops {
    use super::*;

    type R = Result<(), CpuError>;

    pub fn illegal(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        // Dispatch faults on the group before getting here; kept so every
        // table slot has an entry point.
        Err(Fault::IllegalOpcode { opcode: ws.opcode, ic: cpu.regs.ic }.into())
    }

    // ---- load/store ----

    pub fn lda(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a = ws.operand as u32 & MASK18;
        set_zn18(&mut ws.ind, cpu.regs.a);
        Ok(())
    }

    pub fn ldq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.q = ws.operand as u32 & MASK18;
        set_zn18(&mut ws.ind, cpu.regs.q);
        Ok(())
    }

    pub fn ldaq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.set_aq(ws.operand);
        set_zn36(&mut ws.ind, ws.operand);
        Ok(())
    }

    fn ldx(cpu: &mut Cpu, ws: &mut Workspace, n: u32) -> R {
        cpu.regs.set_x(n, ws.operand as u32);
        set_zn18(&mut ws.ind, cpu.regs.x(n));
        Ok(())
    }

    pub fn ldx1(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ldx(cpu, ws, 1)
    }

    pub fn ldx2(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ldx(cpu, ws, 2)
    }

    pub fn ldx3(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ldx(cpu, ws, 3)
    }

    pub fn ldi(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        ws.ind = Indicators::from_word(ws.operand as u32);
        Ok(())
    }

    pub fn ldex(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.set_s(ws.operand as u32);
        Ok(())
    }

    pub fn sta(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ws.result = Some(cpu.regs.a as u64);
        Ok(())
    }

    pub fn stq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ws.result = Some(cpu.regs.q as u64);
        Ok(())
    }

    pub fn staq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ws.result = Some(cpu.regs.aq());
        Ok(())
    }

    fn stx(cpu: &mut Cpu, ws: &mut Workspace, n: u32) -> R {
        ws.result = Some(cpu.regs.x(n) as u64);
        Ok(())
    }

    pub fn stx1(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        stx(cpu, ws, 1)
    }

    pub fn stx2(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        stx(cpu, ws, 2)
    }

    pub fn stx3(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        stx(cpu, ws, 3)
    }

    pub fn sti(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        ws.result = Some(ws.ind.to_word() as u64);
        Ok(())
    }

    pub fn stex(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        ws.result = Some(cpu.regs.s as u64);
        Ok(())
    }

    pub fn stz(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        ws.result = Some(0);
        Ok(())
    }

    // ---- arithmetic ----

    pub fn ada(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a = arith::add18(cpu.regs.a, ws.operand as u32, false, FLAGS_ALL, &mut ws.ind);
        Ok(())
    }

    pub fn sba(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a = arith::sub18(cpu.regs.a, ws.operand as u32, true, FLAGS_ALL, &mut ws.ind);
        Ok(())
    }

    pub fn adq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.q = arith::add18(cpu.regs.q, ws.operand as u32, false, FLAGS_ALL, &mut ws.ind);
        Ok(())
    }

    pub fn sbq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.q = arith::sub18(cpu.regs.q, ws.operand as u32, true, FLAGS_ALL, &mut ws.ind);
        Ok(())
    }

    pub fn adaq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let aq = arith::add36(cpu.regs.aq(), ws.operand, false, FLAGS_ALL, &mut ws.ind);
        cpu.regs.set_aq(aq);
        Ok(())
    }

    pub fn sbaq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let aq = arith::sub36(cpu.regs.aq(), ws.operand, true, FLAGS_ALL, &mut ws.ind);
        cpu.regs.set_aq(aq);
        Ok(())
    }

    pub fn asa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let sum = arith::add18(ws.operand as u32, cpu.regs.a, false, FLAGS_ALL, &mut ws.ind);
        ws.result = Some(sum as u64);
        Ok(())
    }

    pub fn ssa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let diff = arith::sub18(ws.operand as u32, cpu.regs.a, true, FLAGS_ALL, &mut ws.ind);
        ws.result = Some(diff as u64);
        Ok(())
    }

    pub fn aos(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        let sum = arith::add18(ws.operand as u32, 1, false, FLAGS_ALL, &mut ws.ind);
        ws.result = Some(sum as u64);
        Ok(())
    }

    /// Fractional multiply: A times the operand into AQ, product left
    /// shifted one place so the double sign bit collapses.
    pub fn mpf(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let prod =
            (to_signed18(cpu.regs.a) as i64).wrapping_mul(to_signed18(ws.operand as u32) as i64);
        let aq = ((prod << 1) as u64) & MASK36;
        cpu.regs.set_aq(aq);
        set_zn36(&mut ws.ind, aq);
        Ok(())
    }

    /// Fractional divide: AQ by the operand, quotient to A, remainder
    /// to Q. A zero divisor or a quotient wider than 18 bits is a divide
    /// check.
    pub fn dvf(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let divisor = to_signed18(ws.operand as u32) as i64;
        if divisor == 0 {
            return Err(Fault::DivideCheck.into());
        }
        let dividend = to_signed36(cpu.regs.aq());
        let quot = dividend / divisor;
        let rem = dividend % divisor;
        if !(-0o400000..=0o377777).contains(&quot) {
            return Err(Fault::DivideCheck.into());
        }
        cpu.regs.a = (quot as u32) & MASK18;
        cpu.regs.q = (rem as u32) & MASK18;
        set_zn18(&mut ws.ind, cpu.regs.a);
        Ok(())
    }

    /// Character address addition of the operand into an index register:
    /// both are (class, word) pairs combined through the rules matrix.
    fn adcx(cpu: &mut Cpu, ws: &mut Workspace, n: u32) -> R {
        let x = cpu.regs.x(n);
        let y = ws.operand as u32;
        let (w, c) = caf::addr_add(
            (x & MASK15) as i32,
            CharClass::from_bits(x >> 15),
            (y & MASK15) as i32,
            CharClass::from_bits(y >> 15),
        )?;
        cpu.regs.set_x(n, c.bits() << 15 | w);
        Ok(())
    }

    pub fn adcx1(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        adcx(cpu, ws, 1)
    }

    pub fn adcx2(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        adcx(cpu, ws, 2)
    }

    pub fn adcx3(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        adcx(cpu, ws, 3)
    }

    // ---- logic ----

    pub fn ana(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a &= ws.operand as u32;
        set_zn18(&mut ws.ind, cpu.regs.a);
        Ok(())
    }

    pub fn ora(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a |= ws.operand as u32 & MASK18;
        set_zn18(&mut ws.ind, cpu.regs.a);
        Ok(())
    }

    pub fn era(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.regs.a ^= ws.operand as u32 & MASK18;
        set_zn18(&mut ws.ind, cpu.regs.a);
        Ok(())
    }

    /// Comparative AND: sets indicators from A AND the operand without
    /// changing either.
    pub fn cana(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        set_zn18(&mut ws.ind, cpu.regs.a & ws.operand as u32);
        Ok(())
    }

    pub fn ansa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let v = cpu.regs.a & ws.operand as u32;
        set_zn18(&mut ws.ind, v);
        ws.result = Some(v as u64);
        Ok(())
    }

    pub fn orsa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let v = (cpu.regs.a | ws.operand as u32) & MASK18;
        set_zn18(&mut ws.ind, v);
        ws.result = Some(v as u64);
        Ok(())
    }

    pub fn ersa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let v = (cpu.regs.a ^ ws.operand as u32) & MASK18;
        set_zn18(&mut ws.ind, v);
        ws.result = Some(v as u64);
        Ok(())
    }

    // ---- compare/test ----

    pub fn cmpa(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        arith::sub18(cpu.regs.a, ws.operand as u32, true, FLAGS_CMP, &mut ws.ind);
        Ok(())
    }

    pub fn cmpq(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        arith::sub18(cpu.regs.q, ws.operand as u32, true, FLAGS_CMP, &mut ws.ind);
        Ok(())
    }

    fn cmpx(cpu: &mut Cpu, ws: &mut Workspace, n: u32) -> R {
        arith::sub18(cpu.regs.x(n), ws.operand as u32, true, FLAGS_CMP, &mut ws.ind);
        Ok(())
    }

    pub fn cmpx1(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cmpx(cpu, ws, 1)
    }

    pub fn cmpx2(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cmpx(cpu, ws, 2)
    }

    pub fn cmpx3(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cmpx(cpu, ws, 3)
    }

    /// Set zero/negative from the operand alone.
    pub fn szn(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        set_zn18(&mut ws.ind, ws.operand as u32);
        Ok(())
    }

    // ---- transfers ----

    pub fn tra(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        ws.next_ic = ws.w;
        Ok(())
    }

    pub fn tze(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if ws.ind.zero() {
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    pub fn tnz(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if !ws.ind.zero() {
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    pub fn tmi(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if ws.ind.negative() {
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    pub fn tpl(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if !ws.ind.negative() {
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    /// Transfer on overflow; a taken transfer clears the indicator.
    pub fn tov(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if ws.ind.overflow() {
            ws.ind.set(Indicators::OVF, false);
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    pub fn tnc(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        if !ws.ind.carry() {
            ws.next_ic = ws.w;
        }
        Ok(())
    }

    /// Transfer and set Y: stores the return address (IC+1) at Y, then
    /// transfers to Y+1.
    pub fn tsy(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        ws.result = Some(ws.next_ic as u64);
        ws.next_ic = (ws.w + 1) & MASK15;
        Ok(())
    }

    // ---- I/O ----

    /// Connect I/O channel: latch the connect word and selected channel
    /// for the external channel layer; the core does no device dispatch.
    pub fn cioc(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        cpu.pending_io = Some(IoRequest {
            channel: cpu.regs.s,
            connect: ws.operand as u32,
        });
        Ok(())
    }

    // ---- non-memory groups ----

    /// Group 1a: immediate operations on the sign-extended 9-bit D field.
    pub fn grp1a(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let imm = (sign_ext9(ws.d) as u32) & MASK18;
        match ws.s1 {
            0 => {
                // ILA
                cpu.regs.a = imm;
                set_zn18(&mut ws.ind, cpu.regs.a);
            }
            1 => {
                // ILQ
                cpu.regs.q = imm;
                set_zn18(&mut ws.ind, cpu.regs.q);
            }
            2 => {
                // IAA
                cpu.regs.a = arith::add18(cpu.regs.a, imm, false, FLAGS_ALL, &mut ws.ind);
            }
            3 => {
                // IAQ
                cpu.regs.q = arith::add18(cpu.regs.q, imm, false, FLAGS_ALL, &mut ws.ind);
            }
            4..=6 => {
                // IACX1..IACX3: D splits into a class and a word
                // displacement, combined into the index register.
                let n = ws.s1 - 3;
                let x = cpu.regs.x(n);
                let (w, c) = caf::addr_add(
                    (x & MASK15) as i32,
                    CharClass::from_bits(x >> 15),
                    sign_ext6(ws.d),
                    CharClass::from_bits((ws.d >> 6) & MASK3),
                )?;
                cpu.regs.set_x(n, c.bits() << 15 | w);
            }
            _ => {
                return Err(CpuError::NotImplemented {
                    mnemonic: "grp1a",
                    opcode: ws.opcode,
                    sub: ws.s1,
                })
            }
        }
        Ok(())
    }

    pub fn grp1b(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        Err(CpuError::NotImplemented { mnemonic: "grp1b", opcode: ws.opcode, sub: ws.s1 })
    }

    pub fn grp1c(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        Err(CpuError::NotImplemented { mnemonic: "grp1c", opcode: ws.opcode, sub: ws.s1 })
    }

    pub fn grp1d(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        let _ = cpu;
        Err(CpuError::NotImplemented { mnemonic: "grp1d", opcode: ws.opcode, sub: ws.s1 })
    }

    /// Group 2: shifts. S1 picks the direction (0 right, 1 left), S2 the
    /// target (0 A, 1 Q, 2 AQ long, 3 A rotate), K the count. Right
    /// shifts are arithmetic.
    pub fn grp2(cpu: &mut Cpu, ws: &mut Workspace) -> R {
        match (ws.s1, ws.s2) {
            (0, 0) => {
                cpu.regs.a = asr18(cpu.regs.a, ws.k);
                set_zn18(&mut ws.ind, cpu.regs.a);
            }
            (0, 1) => {
                cpu.regs.q = asr18(cpu.regs.q, ws.k);
                set_zn18(&mut ws.ind, cpu.regs.q);
            }
            (0, 2) => {
                let aq = asr36(cpu.regs.aq(), ws.k);
                cpu.regs.set_aq(aq);
                set_zn36(&mut ws.ind, aq);
            }
            (1, 0) => {
                cpu.regs.a = shl18(cpu.regs.a, ws.k);
                set_zn18(&mut ws.ind, cpu.regs.a);
            }
            (1, 1) => {
                cpu.regs.q = shl18(cpu.regs.q, ws.k);
                set_zn18(&mut ws.ind, cpu.regs.q);
            }
            (1, 2) => {
                let aq = shl36(cpu.regs.aq(), ws.k);
                cpu.regs.set_aq(aq);
                set_zn36(&mut ws.ind, aq);
            }
            (0, 3) => {
                cpu.regs.a = rol18(cpu.regs.a, 18 - ws.k % 18);
                set_zn18(&mut ws.ind, cpu.regs.a);
            }
            (1, 3) => {
                cpu.regs.a = rol18(cpu.regs.a, ws.k);
                set_zn18(&mut ws.ind, cpu.regs.a);
            }
            _ => {
                return Err(CpuError::NotImplemented {
                    mnemonic: "grp2",
                    opcode: ws.opcode,
                    sub: ws.s1 << 3 | ws.s2,
                })
            }
        }
        Ok(())
    }
}
