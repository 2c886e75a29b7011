//! The complete state of one CHIP-8 machine, as described at
//! https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.

use crate::emulator::error::{EmulatorError, Result};
use crate::emulator::framebuffer::Framebuffer;
use crate::emulator::keypad::Keypad;

pub const MEM_SIZE: usize = 4096;
pub const NUM_REGISTERS: usize = 16;
pub const STACK_SIZE: usize = 16;
pub const PC_START: u16 = 0x200;
pub const MAX_ROM_SIZE: usize = MEM_SIZE - PC_START as usize;
pub const FLAG: usize = 0xF;
pub const FONT_GLYPH_SIZE: u16 = 5;
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Memory, registers, stack, timers, screen and keys of a CHIP-8.
///
/// Fields are open to the cycle engine in this crate.
/// Everything outside goes through the accessors, which check bounds.
#[derive(Clone)]
pub struct Machine {
    pub(crate) memory: [u8; MEM_SIZE],
    pub(crate) registers: [u8; NUM_REGISTERS],
    pub(crate) i: u16,
    pub(crate) program_counter: u16,
    pub(crate) stack: [u16; STACK_SIZE],
    pub(crate) stack_pointer: usize,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) screen: Framebuffer,
    pub(crate) keypad: Keypad,
    pub(crate) draw_flag: bool,
}

impl Machine {
    /// Create a machine that has already been reset.
    pub fn new() -> Machine {
        let mut machine = Machine {
            memory: [0; MEM_SIZE],
            registers: [0; NUM_REGISTERS],
            i: 0,
            program_counter: PC_START,
            stack: [0; STACK_SIZE],
            stack_pointer: 0,
            delay_timer: 0,
            sound_timer: 0,
            screen: Framebuffer::new(),
            keypad: Keypad::new(),
            draw_flag: true,
        };
        machine.reset();
        machine
    }

    /// Zero everything, then load the font and point PC at the program area.
    pub fn reset(&mut self) {
        self.memory = [0; MEM_SIZE];
        self.memory[..FONT.len()].copy_from_slice(&FONT);
        self.registers = [0; NUM_REGISTERS];
        self.i = 0;
        self.program_counter = PC_START;
        self.stack = [0; STACK_SIZE];
        self.stack_pointer = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.screen.clear();
        self.keypad = Keypad::new();
        self.draw_flag = true;
        log::debug!("Machine reset");
    }

    /// Copy a program into memory at 0x200.
    ///
    /// Programs that do not fit are rejected without touching memory.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_ROM_SIZE {
            return Err(EmulatorError::RomTooLarge {
                size: program.len(),
                max_size: MAX_ROM_SIZE,
            });
        }
        let start = PC_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        log::debug!("Loaded {} bytes at {:#06x}", program.len(), PC_START);
        Ok(())
    }

    /// Read the big-endian instruction word at PC.
    pub fn fetch(&self) -> Result<u16> {
        let pc = self.program_counter as usize;
        match (self.memory.get(pc), self.memory.get(pc + 1)) {
            (Some(high), Some(low)) => Ok(((*high as u16) << 8) | *low as u16),
            _ => Err(EmulatorError::InvalidFetch {
                address: self.program_counter,
            }),
        }
    }

    pub fn read_byte(&self, address: usize) -> Result<u8> {
        self.memory
            .get(address)
            .copied()
            .ok_or(EmulatorError::MemoryOutOfBounds { address })
    }

    /// Write a byte anywhere but the font.
    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<()> {
        self.check_writable(address, 1)?;
        self.memory[address] = value;
        Ok(())
    }

    /// `len` bytes starting at `address`.
    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8]> {
        self.check_readable(address, len)?;
        Ok(&self.memory[address..address + len])
    }

    /// Fails unless `address..address + len` lies within memory.
    /// An empty range may only start at the very end.
    pub(crate) fn check_readable(&self, address: usize, len: usize) -> Result<()> {
        if address + len > MEM_SIZE {
            return Err(EmulatorError::MemoryOutOfBounds {
                address: address.max(MEM_SIZE),
            });
        }
        Ok(())
    }

    /// Like `check_readable`, but the font region is off limits too.
    pub(crate) fn check_writable(&self, address: usize, len: usize) -> Result<()> {
        if len > 0 && address < FONT.len() {
            return Err(EmulatorError::ProtectedWrite {
                address: address as u16,
            });
        }
        self.check_readable(address, len)
    }

    /// Push a return address onto the call stack.
    pub fn push(&mut self, address: u16) -> Result<()> {
        let slot = self
            .stack
            .get_mut(self.stack_pointer)
            .ok_or(EmulatorError::StackOverflow { address })?;
        *slot = address;
        self.stack_pointer += 1;
        Ok(())
    }

    /// Pop the most recent return address off the call stack.
    pub fn pop(&mut self) -> Result<u16> {
        if self.stack_pointer == 0 {
            return Err(EmulatorError::StackUnderflow);
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer])
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn register(&self, x: u8) -> u8 {
        self.registers[x as usize & 0xF]
    }

    pub fn set_register(&mut self, x: u8, value: u8) {
        self.registers[x as usize & 0xF] = value;
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn set_index(&mut self, i: u16) {
        self.i = i;
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn set_program_counter(&mut self, pc: u16) {
        self.program_counter = pc;
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack_pointer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    pub fn screen(&self) -> &Framebuffer {
        &self.screen
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Written by the host between cycles.
    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    /// Whether the screen has changed since the host last took it.
    pub fn needs_redraw(&self) -> bool {
        self.draw_flag
    }

    /// Clears the redraw flag, handing back the screen if it had changed.
    pub fn take_frame(&mut self) -> Option<&Framebuffer> {
        if std::mem::replace(&mut self.draw_flag, false) {
            Some(&self.screen)
        } else {
            None
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("registers", &self.registers)
            .field("i", &format_args!("{:#06x}", self.i))
            .field("program_counter", &format_args!("{:#06x}", self.program_counter))
            .field("stack", &&self.stack[..self.stack_pointer])
            .field("delay_timer", &self.delay_timer)
            .field("sound_timer", &self.sound_timer)
            .field("screen", &self.screen)
            .finish()
    }
}
