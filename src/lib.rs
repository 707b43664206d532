//! # DATANET-355 Emulator
//!
//! An instruction-level emulator of the DATANET-355/6600 front-end
//! processor: an 18-bit, word-addressed machine whose memory is also
//! addressable in 9-bit bytes and 6-bit characters, with character
//! arithmetic carrying fractionally into the word address.
//!
//! The [`cpu`] module is the core; [`loader`] reads octal text boot
//! images for it. Device channels are out of scope: the core stops at
//! the CIOC connect, which the host picks up via [`cpu::Cpu::take_io`].

pub mod cpu;
pub mod loader;
pub mod word;

// Re-export commonly used types
pub use cpu::{CharClass, Cpu, CpuError, CpuState, Fault, Indicators, Memory, Registers};
pub use loader::{load_image, Image, LoadError};
