//! The CHIP-8 virtual machine: its state, the cycle that drives it,
//! and the seams a host plugs its keyboard, screen and speaker into.

pub mod config;
pub mod cpu;
#[allow(clippy::module_inception)]
pub mod emulator;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod keypad;
pub mod machine;
pub mod output;

pub use config::Config;
pub use cpu::{Cpu, CycleReport};
pub use emulator::Emulator;
pub use error::EmulatorError;
pub use machine::Machine;
