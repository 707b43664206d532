//! Processor faults and the fault vector table.
//!
//! A hard fault aborts the current instruction before anything has been
//! committed and unwinds back to the execution loop as an `Err`. Each fault
//! names one of the eight fixed trap locations in low memory; the host
//! decides whether to stop or to vector through the table and resume.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The eight fixed fault trap locations in low memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum FaultVector {
    PowerShutdown = 0o440,
    Restart = 0o441,
    Parity = 0o442,
    IllegalOpcode = 0o443,
    Overflow = 0o444,
    IllegalStore = 0o445,
    DivideCheck = 0o446,
    IllegalProgramInt = 0o447,
}

impl FaultVector {
    /// Memory address of this trap location.
    pub fn address(self) -> u32 {
        self as u32
    }
}

/// Hard processor faults. Fatal to the current instruction: no partial
/// register or memory change from that instruction is committed.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    #[error("illegal opcode {opcode:02o} at {ic:05o}")]
    IllegalOpcode { opcode: u32, ic: u32 },

    #[error("illegal character address (class 7): {context}")]
    IllegalCharAddress { context: &'static str },

    #[error("illegal store target (class 7): {context}")]
    IllegalStore { context: &'static str },

    #[error("indirect chain exceeded {limit} levels at {addr:05o}")]
    IndirectDepthExceeded { limit: usize, addr: u32 },

    #[error("divide check")]
    DivideCheck,
}

impl Fault {
    /// The trap location this fault vectors through.
    ///
    /// The indirect-chain bound is an emulator safety limit with no
    /// architectural vector of its own; it reports through the
    /// illegal-program-interrupt slot.
    pub fn vector(&self) -> FaultVector {
        match self {
            Fault::IllegalOpcode { .. } => FaultVector::IllegalOpcode,
            Fault::IllegalCharAddress { .. } => FaultVector::IllegalStore,
            Fault::IllegalStore { .. } => FaultVector::IllegalStore,
            Fault::IndirectDepthExceeded { .. } => FaultVector::IllegalProgramInt,
            Fault::DivideCheck => FaultVector::DivideCheck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_addresses() {
        assert_eq!(FaultVector::PowerShutdown.address(), 0o440);
        assert_eq!(FaultVector::IllegalProgramInt.address(), 0o447);
        let f = Fault::IllegalOpcode { opcode: 0o77, ic: 0o100 };
        assert_eq!(f.vector().address(), 0o443);
    }

    #[test]
    fn test_char_faults_share_store_vector() {
        let a = Fault::IllegalCharAddress { context: "load" };
        let b = Fault::IllegalStore { context: "store" };
        assert_eq!(a.vector(), FaultVector::IllegalStore);
        assert_eq!(b.vector(), FaultVector::IllegalStore);
    }

    #[test]
    fn test_fault_displays_diagnostic() {
        let f = Fault::IndirectDepthExceeded { limit: 64, addr: 0o1234 };
        let msg = f.to_string();
        assert!(msg.contains("64"));
        assert!(msg.contains("01234"));
    }
}
