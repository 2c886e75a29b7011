//! A machine and the cpu that drives it, bundled for hosts that want one value to hold on to.

use crate::emulator::config::Config;
use crate::emulator::cpu::{Cpu, CycleReport};
use crate::emulator::error::Result;
use crate::emulator::input::EmulatorInput;
use crate::emulator::instruction::Instruction;
use crate::emulator::machine::Machine;
use crate::emulator::output::EmulatorOutput;

pub struct Emulator {
    machine: Machine,
    cpu: Cpu,
}

impl Emulator {
    /// Create a new emulator with the standard behavior.
    pub fn new() -> Emulator {
        Emulator::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Emulator {
        Emulator {
            machine: Machine::new(),
            cpu: Cpu::new(config),
        }
    }

    /// Reset the machine and copy a program into memory at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.machine.reset();
        self.machine.load(program)
    }

    /// Perform a single cycle.
    pub fn step(&mut self) -> Result<CycleReport> {
        self.cpu.cycle(&mut self.machine)
    }

    /// Sample the keys, perform a single cycle,
    /// then hand the screen and beep to the output if needed.
    pub fn step_with_io<I, O>(&mut self, input: &I, output: &mut O) -> Result<CycleReport>
    where
        I: EmulatorInput,
        O: EmulatorOutput,
    {
        self.machine.keypad_mut().set_all(input.keys());
        let report = self.step()?;
        if report.beep {
            output.beep();
        }
        if let Some(screen) = self.machine.take_frame() {
            output.draw(screen);
        }
        Ok(report)
    }

    /// Execute a single instruction without fetching it from memory.
    pub fn execute_single(&mut self, instruction: Instruction) -> Result<CycleReport> {
        self.cpu.execute(&mut self.machine, instruction)
    }

    /// Execute instructions in order, stopping at the first error.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.execute_single(*instruction)?;
        }
        Ok(())
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn config(&self) -> &Config {
        self.cpu.config()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
