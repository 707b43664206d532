//! Instruction-execution core for the DATANET-355/6600 front end.
//!
//! This module implements the complete processor architecture:
//! - 32K 18-bit words, character addressable down to 6-bit slices
//! - registers: IC, A, Q (pairing into AQ), X1..X3, indicators, channel select
//! - 64-slot opcode table with memory-reference and non-memory groups
//! - fault vectors at 440..447 octal

pub mod arith;
pub mod caf;
pub mod decode;
pub mod execute;
pub mod fault;
pub mod memory;
pub mod registers;

pub use decode::{disassemble, Access, Op, OpGroup, Width};
pub use execute::{Cpu, CpuError, CpuState, IoRequest, StepInfo};
pub use fault::{Fault, FaultVector};
pub use memory::{CharClass, Memory};
pub use registers::{Indicators, Registers};
