//! The fetch-decode-execute cycle.

use crate::emulator::config::Config;
use crate::emulator::error::{EmulatorError, Result};
use crate::emulator::instruction::*;
use crate::emulator::machine::{Machine, FLAG, FONT_GLYPH_SIZE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ADDRESS_MASK: u16 = 0x0FFF;
const LEGACY_JUMP_MASK: u16 = 0x0F00;

/// What happened during one cycle, for the host to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// The framebuffer was modified and should be redrawn.
    pub display_changed: bool,
    /// The sound timer ran out this cycle.
    pub beep: bool,
    /// The instruction is waiting for a key, and will run again next cycle.
    pub waiting_for_key: bool,
    /// An instruction word that was skipped because it means nothing.
    pub unknown_opcode: Option<u16>,
}

/// How the program counter moves after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Skip,
    JumpTo(u16),
    Stay,
}

impl Flow {
    fn skip_if(condition: bool) -> Flow {
        if condition {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

/// Runs cycles on a `Machine` it borrows for each call.
pub struct Cpu {
    config: Config,
    rng: StdRng,
}

impl Cpu {
    pub fn new(config: Config) -> Cpu {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Cpu { config, rng }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch, decode and execute one instruction, then tick the timers.
    ///
    /// A fatal error leaves the machine as it was before the cycle.
    pub fn cycle(&mut self, machine: &mut Machine) -> Result<CycleReport> {
        let word = machine.fetch()?;
        let mut report = match Instruction::from_u16(word) {
            Some(instruction) => {
                log::trace!("{:#06x}: {:04X} {}", machine.program_counter, word, instruction);
                self.execute(machine, instruction)?
            }
            None => {
                log::warn!("Unknown opcode {:#06x} at {:#06x}", word, machine.program_counter);
                machine.program_counter = machine.program_counter.wrapping_add(2);
                CycleReport {
                    unknown_opcode: Some(word),
                    ..CycleReport::default()
                }
            }
        };

        report.beep = tick_timers(machine);

        match report.unknown_opcode {
            Some(opcode) if self.config.strict_opcodes => Err(EmulatorError::UnknownOpcode { opcode }),
            _ => Ok(report),
        }
    }

    /// Execute a single decoded instruction, without touching the timers.
    ///
    /// Operands are first cut down to what an instruction word can hold.
    pub fn execute(&mut self, machine: &mut Machine, instruction: Instruction) -> Result<CycleReport> {
        let instruction = instruction.canonical();
        let mut report = CycleReport::default();
        let pc = machine.program_counter;
        let v = &mut machine.registers;

        let flow = match instruction {
            Instruction::ClearScreen => {
                machine.screen.clear();
                report.display_changed = true;
                Flow::Next
            }

            // Return to the instruction after the call site
            Instruction::Return => Flow::JumpTo(machine.pop()?.wrapping_add(2)),

            Instruction::Jump(Addr(addr)) => {
                let mask = if self.config.legacy_jump_mask {
                    LEGACY_JUMP_MASK
                } else {
                    ADDRESS_MASK
                };
                Flow::JumpTo(addr & mask)
            }

            // The stored address is the call itself, `Return` steps over it
            Instruction::Call(Addr(addr)) => {
                machine.push(pc)?;
                Flow::JumpTo(addr)
            }

            Instruction::SkipIfEqConst(Reg(x), Const(n)) => Flow::skip_if(v[x as usize] == n),
            Instruction::SkipIfNeqConst(Reg(x), Const(n)) => Flow::skip_if(v[x as usize] != n),
            Instruction::SkipIfEqReg(Reg(x), Reg(y)) => Flow::skip_if(v[x as usize] == v[y as usize]),
            Instruction::SkipIfNeqReg(Reg(x), Reg(y)) => Flow::skip_if(v[x as usize] != v[y as usize]),

            Instruction::SetConst(Reg(x), Const(n)) => {
                v[x as usize] = n;
                Flow::Next
            }

            // No carry flag here
            Instruction::AddConst(Reg(x), Const(n)) => {
                v[x as usize] = v[x as usize].wrapping_add(n);
                Flow::Next
            }

            Instruction::SetReg(Reg(x), Reg(y)) => {
                v[x as usize] = v[y as usize];
                Flow::Next
            }

            Instruction::Or(Reg(x), Reg(y)) => {
                v[x as usize] |= v[y as usize];
                Flow::Next
            }

            Instruction::And(Reg(x), Reg(y)) => {
                v[x as usize] &= v[y as usize];
                Flow::Next
            }

            Instruction::Xor(Reg(x), Reg(y)) => {
                v[x as usize] ^= v[y as usize];
                Flow::Next
            }

            // The flag is written last so it wins when X is VF
            Instruction::AddReg(Reg(x), Reg(y)) => {
                let (sum, carry) = v[x as usize].overflowing_add(v[y as usize]);
                v[x as usize] = sum;
                v[FLAG] = carry as u8;
                Flow::Next
            }

            Instruction::SubReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vx.wrapping_sub(vy);
                v[FLAG] = (vx >= vy) as u8;
                Flow::Next
            }

            Instruction::ShiftRight(Reg(x)) => {
                let vx = v[x as usize];
                v[x as usize] = vx >> 1;
                v[FLAG] = vx & 0x01;
                Flow::Next
            }

            Instruction::SubFromReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (v[x as usize], v[y as usize]);
                v[x as usize] = vy.wrapping_sub(vx);
                v[FLAG] = (vy >= vx) as u8;
                Flow::Next
            }

            Instruction::ShiftLeft(Reg(x)) => {
                let vx = v[x as usize];
                v[x as usize] = vx << 1;
                v[FLAG] = vx >> 7;
                Flow::Next
            }

            Instruction::SetIndex(Addr(addr)) => {
                machine.i = addr;
                Flow::Next
            }

            Instruction::JumpPlusV0(Addr(addr)) => Flow::JumpTo(addr.wrapping_add(v[0] as u16)),

            Instruction::Random(Reg(x), Const(n)) => {
                v[x as usize] = self.rng.gen::<u8>() & n;
                Flow::Next
            }

            Instruction::Draw(Reg(x), Reg(y), Const(height)) => {
                let collision = draw_sprite(machine, x, y, height)?;
                machine.registers[FLAG] = collision as u8;
                report.display_changed = true;
                Flow::Next
            }

            Instruction::SkipIfKey(Reg(x)) => Flow::skip_if(machine.keypad.is_pressed(v[x as usize])),
            Instruction::SkipIfNotKey(Reg(x)) => Flow::skip_if(!machine.keypad.is_pressed(v[x as usize])),

            Instruction::GetDelayTimer(Reg(x)) => {
                v[x as usize] = machine.delay_timer;
                Flow::Next
            }

            // Polls instead of blocking, the host calls again next cycle
            Instruction::WaitForKey(Reg(x)) => match machine.keypad.first_pressed() {
                Some(key) => {
                    v[x as usize] = key;
                    Flow::Next
                }
                None => {
                    log::debug!("Waiting for a key at {:#06x}", pc);
                    report.waiting_for_key = true;
                    Flow::Stay
                }
            },

            Instruction::SetDelayTimer(Reg(x)) => {
                machine.delay_timer = v[x as usize];
                Flow::Next
            }

            Instruction::SetSoundTimer(Reg(x)) => {
                machine.sound_timer = v[x as usize];
                Flow::Next
            }

            Instruction::AddToIndex(Reg(x)) => {
                let sum = machine.i as u32 + v[x as usize] as u32;
                v[FLAG] = (sum > ADDRESS_MASK as u32) as u8;
                machine.i = if self.config.mask_index_overflow {
                    sum as u16 & ADDRESS_MASK
                } else {
                    sum as u16
                };
                Flow::Next
            }

            // Each font glyph is 5 bytes
            Instruction::SetIndexToGlyph(Reg(x)) => {
                machine.i = FONT_GLYPH_SIZE * v[x as usize] as u16;
                Flow::Next
            }

            Instruction::StoreBcd(Reg(x)) => {
                let value = v[x as usize];
                let i = machine.i as usize;
                machine.check_writable(i, 3)?;
                machine.memory[i] = value / 100;
                machine.memory[i + 1] = value / 10 % 10;
                machine.memory[i + 2] = value % 10;
                Flow::Next
            }

            // Dump register values up to Vx
            Instruction::StoreRegisters(Reg(x)) => {
                let count = x as usize + 1;
                let i = machine.i as usize;
                machine.check_writable(i, count)?;
                machine.memory[i..i + count].copy_from_slice(&machine.registers[..count]);
                machine.i = machine.i.wrapping_add(count as u16);
                Flow::Next
            }

            // Load register values up to Vx
            Instruction::LoadRegisters(Reg(x)) => {
                let count = x as usize + 1;
                let i = machine.i as usize;
                machine.check_readable(i, count)?;
                machine.registers[..count].copy_from_slice(&machine.memory[i..i + count]);
                machine.i = machine.i.wrapping_add(count as u16);
                Flow::Next
            }
        };

        machine.program_counter = match flow {
            Flow::Next => pc.wrapping_add(2),
            Flow::Skip => pc.wrapping_add(4),
            Flow::JumpTo(addr) => addr,
            Flow::Stay => pc,
        };
        if report.display_changed {
            machine.draw_flag = true;
        }

        Ok(report)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new(Config::default())
    }
}

/// XOR `height` rows of sprite data from memory at I onto the screen at (Vx, Vy).
/// Returns true if any set pixel was erased.
fn draw_sprite(machine: &mut Machine, x: u8, y: u8, height: u8) -> Result<bool> {
    let x_coord = machine.registers[x as usize] as usize;
    let y_coord = machine.registers[y as usize] as usize;

    let sprite_addr = machine.i as usize;
    machine.check_readable(sprite_addr, height as usize)?;
    let sprite = &machine.memory[sprite_addr..sprite_addr + height as usize];

    let mut any_collisions = false;
    for (row, bits) in sprite.iter().enumerate() {
        for column in 0..8 {
            if bits & (0x80 >> column) != 0 {
                any_collisions |= machine.screen.flip(x_coord + column, y_coord + row);
            }
        }
    }

    Ok(any_collisions)
}

/// Count both timers down by one.
/// Returns true if the sound timer just ran out.
fn tick_timers(machine: &mut Machine) -> bool {
    if machine.delay_timer > 0 {
        machine.delay_timer -= 1;
    }

    let mut beep = false;
    if machine.sound_timer > 0 {
        if machine.sound_timer == 1 {
            log::info!("Beep");
            beep = true;
        }
        machine.sound_timer -= 1;
    }
    beep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::machine::{PC_START, STACK_SIZE};
    use proptest::prelude::*;
    use test_case::test_case;

    fn setup(program: &[Instruction]) -> (Cpu, Machine) {
        let mut machine = Machine::new();
        machine.load(&Instruction::assemble(program)).unwrap();
        (Cpu::new(Config::new().seed(0)), machine)
    }

    fn run(instruction: Instruction, registers: &[(u8, u8)]) -> Machine {
        let (mut cpu, mut machine) = setup(&[instruction]);
        for (x, value) in registers {
            machine.set_register(*x, *value);
        }
        cpu.cycle(&mut machine).unwrap();
        machine
    }

    #[test]
    fn jump_sets_pc_without_advancing() {
        let machine = run(Instruction::Jump(Addr(0x250)), &[]);
        assert_eq!(machine.program_counter, 0x250);
    }

    #[test]
    fn legacy_jump_drops_the_low_byte() {
        let (_, mut machine) = setup(&[Instruction::Jump(Addr(0x234))]);
        let mut cpu = Cpu::new(Config::new().legacy_jump_mask(true));
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.program_counter, 0x200);
    }

    #[test]
    fn return_resumes_after_the_call() {
        let mut machine = Machine::new();
        let program = [
            0x22, 0x06, // 0x200, call 0x206
            0x00, 0x00, // 0x202
            0x00, 0x00, // 0x204
            0x00, 0xEE, // 0x206, return
        ];
        machine.load(&program).unwrap();
        let mut cpu = Cpu::default();

        cpu.cycle(&mut machine).unwrap(); // Call 0x206
        assert_eq!(machine.program_counter, 0x206);
        assert_eq!(machine.stack_pointer, 1);
        cpu.cycle(&mut machine).unwrap(); // Return to 0x202
        assert_eq!(machine.program_counter, 0x202);
        assert_eq!(machine.stack_pointer, 0);
    }

    #[test]
    fn return_with_empty_stack_underflows() {
        let (mut cpu, mut machine) = setup(&[Instruction::Return]);
        assert_eq!(cpu.cycle(&mut machine), Err(EmulatorError::StackUnderflow));
        assert_eq!(machine.program_counter, PC_START);
    }

    #[test]
    fn seventeenth_call_overflows() {
        // Calls itself until the stack is full
        let (mut cpu, mut machine) = setup(&[Instruction::Call(Addr(0x200))]);
        for _ in 0..STACK_SIZE {
            cpu.cycle(&mut machine).unwrap();
        }
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::StackOverflow { address: 0x200 })
        );
        assert_eq!(machine.stack_pointer, STACK_SIZE);
    }

    #[test_case(Instruction::SkipIfEqConst(Reg(1), Const(5)), 5 => 0x204 ; "eq const taken")]
    #[test_case(Instruction::SkipIfEqConst(Reg(1), Const(5)), 6 => 0x202 ; "eq const not taken")]
    #[test_case(Instruction::SkipIfNeqConst(Reg(1), Const(5)), 6 => 0x204 ; "neq const taken")]
    #[test_case(Instruction::SkipIfNeqConst(Reg(1), Const(5)), 5 => 0x202 ; "neq const not taken")]
    #[test_case(Instruction::SkipIfEqReg(Reg(1), Reg(2)), 7 => 0x204 ; "eq reg taken")]
    #[test_case(Instruction::SkipIfEqReg(Reg(1), Reg(2)), 8 => 0x202 ; "eq reg not taken")]
    #[test_case(Instruction::SkipIfNeqReg(Reg(1), Reg(2)), 8 => 0x204 ; "neq reg taken")]
    #[test_case(Instruction::SkipIfNeqReg(Reg(1), Reg(2)), 7 => 0x202 ; "neq reg not taken")]
    fn skips(instruction: Instruction, v1: u8) -> u16 {
        run(instruction, &[(1, v1), (2, 7)]).program_counter
    }

    #[test]
    fn add_with_carry_sets_flag() {
        let machine = run(Instruction::AddReg(Reg(1), Reg(2)), &[(1, 0xFF), (2, 0x01)]);
        assert_eq!(machine.registers[1], 0x00);
        assert_eq!(machine.registers[FLAG], 1);

        let machine = run(Instruction::AddReg(Reg(1), Reg(2)), &[(1, 0x01), (2, 0x01), (0xF, 9)]);
        assert_eq!(machine.registers[1], 0x02);
        assert_eq!(machine.registers[FLAG], 0);
    }

    #[test]
    fn subtract_sets_not_borrow() {
        let machine = run(Instruction::SubReg(Reg(1), Reg(2)), &[(1, 5), (2, 3)]);
        assert_eq!(machine.registers[1], 2);
        assert_eq!(machine.registers[FLAG], 1);

        let machine = run(Instruction::SubReg(Reg(1), Reg(2)), &[(1, 3), (2, 5)]);
        assert_eq!(machine.registers[1], 254);
        assert_eq!(machine.registers[FLAG], 0);
    }

    #[test]
    fn reverse_subtract_sets_not_borrow() {
        let machine = run(Instruction::SubFromReg(Reg(1), Reg(2)), &[(1, 3), (2, 5)]);
        assert_eq!(machine.registers[1], 2);
        assert_eq!(machine.registers[FLAG], 1);

        let machine = run(Instruction::SubFromReg(Reg(1), Reg(2)), &[(1, 5), (2, 3)]);
        assert_eq!(machine.registers[1], 254);
        assert_eq!(machine.registers[FLAG], 0);
    }

    #[test]
    fn shifts_move_the_lost_bit_into_vf() {
        let machine = run(Instruction::ShiftRight(Reg(3)), &[(3, 0b0000_0101)]);
        assert_eq!(machine.registers[3], 0b0000_0010);
        assert_eq!(machine.registers[FLAG], 1);

        let machine = run(Instruction::ShiftLeft(Reg(3)), &[(3, 0b1000_0001)]);
        assert_eq!(machine.registers[3], 0b0000_0010);
        assert_eq!(machine.registers[FLAG], 1);

        let machine = run(Instruction::ShiftLeft(Reg(3)), &[(3, 0b0100_0000), (0xF, 1)]);
        assert_eq!(machine.registers[3], 0b1000_0000);
        assert_eq!(machine.registers[FLAG], 0);
    }

    #[test]
    fn add_const_wraps_without_flag() {
        let machine = run(Instruction::AddConst(Reg(2), Const(0x02)), &[(2, 0xFF), (0xF, 7)]);
        assert_eq!(machine.registers[2], 0x01);
        assert_eq!(machine.registers[FLAG], 7);
    }

    #[test]
    fn bitwise_operations() {
        let machine = run(Instruction::Or(Reg(0), Reg(1)), &[(0, 0b1100), (1, 0b1010)]);
        assert_eq!(machine.registers[0], 0b1110);
        let machine = run(Instruction::And(Reg(0), Reg(1)), &[(0, 0b1100), (1, 0b1010)]);
        assert_eq!(machine.registers[0], 0b1000);
        let machine = run(Instruction::Xor(Reg(0), Reg(1)), &[(0, 0b1100), (1, 0b1010)]);
        assert_eq!(machine.registers[0], 0b0110);
        let machine = run(Instruction::SetReg(Reg(0), Reg(1)), &[(0, 0b1100), (1, 0b1010)]);
        assert_eq!(machine.registers[0], 0b1010);
    }

    #[test]
    fn jump_plus_v0_is_absolute() {
        let machine = run(Instruction::JumpPlusV0(Addr(0x300)), &[(0, 0x10)]);
        assert_eq!(machine.program_counter, 0x310);
    }

    #[test]
    fn oversized_operands_are_cut_to_instruction_width() {
        let (mut cpu, mut machine) = setup(&[]);
        machine.registers[0] = 1;
        cpu.execute(&mut machine, Instruction::JumpPlusV0(Addr(0xFFFF))).unwrap();
        assert_eq!(machine.program_counter, 0x1000);

        let (mut cpu, mut machine) = setup(&[]);
        cpu.execute(&mut machine, Instruction::SetConst(Reg(0x12), Const(7))).unwrap();
        assert_eq!(machine.registers[2], 7);
        assert_eq!(machine.program_counter, PC_START + 2);
    }

    #[test]
    fn random_is_masked() {
        let machine = run(Instruction::Random(Reg(4), Const(0x0F)), &[(4, 0xFF)]);
        assert_eq!(machine.registers[4] & 0xF0, 0);
    }

    #[test]
    fn random_is_reproducible_with_a_seed() {
        let first = run(Instruction::Random(Reg(4), Const(0xFF)), &[]);
        let second = run(Instruction::Random(Reg(4), Const(0xFF)), &[]);
        assert_eq!(first.registers[4], second.registers[4]);
    }

    #[test]
    fn drawing_twice_erases_and_collides() {
        let (mut cpu, mut machine) = setup(&[
            Instruction::Draw(Reg(0), Reg(1), Const(1)),
            Instruction::Draw(Reg(0), Reg(1), Const(1)),
        ]);
        machine.memory[0x300] = 0b1000_0000;
        machine.i = 0x300;
        machine.registers[0] = 10;
        machine.registers[1] = 5;

        let report = cpu.cycle(&mut machine).unwrap();
        assert!(report.display_changed);
        assert_eq!(machine.screen.get(10, 5), 1);
        assert_eq!(machine.registers[FLAG], 0);

        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.screen.get(10, 5), 0);
        assert_eq!(machine.registers[FLAG], 1);
    }

    #[test]
    fn sprites_wrap_around_the_right_edge() {
        let (mut cpu, mut machine) = setup(&[Instruction::Draw(Reg(0), Reg(1), Const(1))]);
        machine.memory[0x300] = 0xFF;
        machine.i = 0x300;
        machine.registers[0] = 63;
        machine.registers[1] = 0;

        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.screen.get(63, 0), 1);
        assert_eq!(&machine.screen.cells()[..7], &[1; 7]);
        assert_eq!(machine.screen.get(7, 0), 0);
        assert_eq!(machine.registers[FLAG], 0);
    }

    #[test]
    fn sprites_wrap_around_the_bottom_edge() {
        let (mut cpu, mut machine) = setup(&[Instruction::Draw(Reg(0), Reg(1), Const(2))]);
        machine.memory[0x300] = 0x80;
        machine.memory[0x301] = 0x80;
        machine.i = 0x300;
        machine.registers[1] = 31;

        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.screen.get(0, 31), 1);
        assert_eq!(machine.screen.get(0, 0), 1);
    }

    #[test]
    fn sprite_past_memory_fails_without_drawing() {
        let (mut cpu, mut machine) = setup(&[Instruction::Draw(Reg(0), Reg(1), Const(4))]);
        machine.i = 0xFFE;
        machine.draw_flag = false;
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::MemoryOutOfBounds { address: 0x1000 })
        );
        assert!(!machine.needs_redraw());
        assert_eq!(machine.program_counter, PC_START);
    }

    #[test]
    fn clear_screen_turns_off_every_pixel() {
        let (mut cpu, mut machine) = setup(&[Instruction::ClearScreen]);
        machine.screen.flip(0, 0);
        machine.draw_flag = false;
        let report = cpu.cycle(&mut machine).unwrap();
        assert!(report.display_changed);
        assert!(machine.needs_redraw());
        assert_eq!(machine.screen.get(0, 0), 0);
    }

    #[test]
    fn key_skips_follow_the_keypad() {
        let (mut cpu, mut machine) = setup(&[Instruction::SkipIfKey(Reg(0))]);
        machine.registers[0] = 0xA;
        machine.keypad.press(0xA);
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.program_counter, 0x204);

        let (mut cpu, mut machine) = setup(&[Instruction::SkipIfNotKey(Reg(0))]);
        machine.registers[0] = 0xA;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.program_counter, 0x204);
    }

    #[test_case(Instruction::SkipIfKey(Reg(0)), 0xA, None => 0x202 ; "key not pressed")]
    #[test_case(Instruction::SkipIfKey(Reg(0)), 0xA, Some(0xB) => 0x202 ; "other key pressed")]
    #[test_case(Instruction::SkipIfNotKey(Reg(0)), 0xA, Some(0xA) => 0x202 ; "not key while pressed")]
    #[test_case(Instruction::SkipIfKey(Reg(0)), 0x1A, Some(0xA) => 0x202 ; "key past f is never pressed")]
    #[test_case(Instruction::SkipIfNotKey(Reg(0)), 0x1A, Some(0xA) => 0x204 ; "not key past f always skips")]
    fn key_skips_not_taken(instruction: Instruction, v0: u8, held: Option<u8>) -> u16 {
        let (mut cpu, mut machine) = setup(&[instruction]);
        machine.registers[0] = v0;
        if let Some(key) = held {
            machine.keypad.press(key);
        }
        cpu.cycle(&mut machine).unwrap();
        machine.program_counter
    }

    #[test]
    fn wait_for_key_stays_until_pressed() {
        let (mut cpu, mut machine) = setup(&[Instruction::WaitForKey(Reg(5))]);
        machine.registers[5] = 0x42;

        for _ in 0..3 {
            let report = cpu.cycle(&mut machine).unwrap();
            assert!(report.waiting_for_key);
            assert_eq!(machine.program_counter, PC_START);
            assert_eq!(machine.registers[5], 0x42);
        }

        machine.keypad.press(0xE);
        machine.keypad.press(0x7);
        let report = cpu.cycle(&mut machine).unwrap();
        assert!(!report.waiting_for_key);
        assert_eq!(machine.registers[5], 0x7);
        assert_eq!(machine.program_counter, PC_START + 2);
    }

    #[test]
    fn timers_count_down_and_beep_once() {
        let (mut cpu, mut machine) = setup(&[Instruction::Jump(Addr(0x200))]);
        machine.delay_timer = 2;
        machine.sound_timer = 1;

        let report = cpu.cycle(&mut machine).unwrap();
        assert!(report.beep);
        assert_eq!(machine.sound_timer, 0);
        assert_eq!(machine.delay_timer, 1);

        let report = cpu.cycle(&mut machine).unwrap();
        assert!(!report.beep);
        assert_eq!(machine.delay_timer, 0);
    }

    #[test]
    fn silent_sound_timer_never_beeps() {
        let (mut cpu, mut machine) = setup(&[Instruction::Jump(Addr(0x200))]);
        for _ in 0..5 {
            assert!(!cpu.cycle(&mut machine).unwrap().beep);
        }
    }

    #[test]
    fn timer_registers_transfer() {
        let (mut cpu, mut machine) = setup(&[
            Instruction::SetDelayTimer(Reg(1)),
            Instruction::SetSoundTimer(Reg(1)),
            Instruction::GetDelayTimer(Reg(2)),
        ]);
        machine.registers[1] = 10;
        cpu.cycle(&mut machine).unwrap();
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.sound_timer, 9);
        cpu.cycle(&mut machine).unwrap();
        // Ticked once after each of the first two cycles
        assert_eq!(machine.registers[2], 8);
        assert_eq!(machine.delay_timer, 7);
    }

    #[test]
    fn add_to_index_flags_overflow_and_keeps_it() {
        let machine = run(Instruction::AddToIndex(Reg(1)), &[(1, 0x02)]);
        assert_eq!(machine.registers[FLAG], 0);

        let (mut cpu, mut machine) = setup(&[Instruction::AddToIndex(Reg(1))]);
        machine.i = 0xFFF;
        machine.registers[1] = 0x02;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.i, 0x1001);
        assert_eq!(machine.registers[FLAG], 1);
    }

    #[test]
    fn add_to_index_flags_overflow_past_sixteen_bits() {
        let (mut cpu, mut machine) = setup(&[Instruction::AddToIndex(Reg(1))]);
        machine.i = 0xFFFF;
        machine.registers[1] = 0x02;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.i, 0x0001);
        assert_eq!(machine.registers[FLAG], 1);
    }

    #[test]
    fn empty_sprite_past_memory_fails() {
        let (mut cpu, mut machine) = setup(&[
            Instruction::SetIndex(Addr(0xFFF)),
            Instruction::SetConst(Reg(1), Const(2)),
            Instruction::AddToIndex(Reg(1)),
            Instruction::Draw(Reg(0), Reg(1), Const(0)),
        ]);
        for _ in 0..3 {
            cpu.cycle(&mut machine).unwrap();
        }
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::MemoryOutOfBounds { address: 0x1001 })
        );
        assert_eq!(machine.program_counter, 0x206);
    }

    #[test]
    fn unmasked_index_makes_later_reads_fail() {
        let (mut cpu, mut machine) = setup(&[
            Instruction::AddToIndex(Reg(1)),
            Instruction::LoadRegisters(Reg(0)),
        ]);
        machine.i = 0xFFF;
        machine.registers[1] = 0x02;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::MemoryOutOfBounds { address: 0x1001 })
        );
    }

    #[test]
    fn masked_index_wraps_to_twelve_bits() {
        let (_, mut machine) = setup(&[Instruction::AddToIndex(Reg(1))]);
        let mut cpu = Cpu::new(Config::new().mask_index_overflow(true));
        machine.i = 0xFFF;
        machine.registers[1] = 0x02;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.i, 0x001);
        assert_eq!(machine.registers[FLAG], 1);
    }

    #[test]
    fn glyph_address_is_five_bytes_per_digit() {
        let machine = run(Instruction::SetIndexToGlyph(Reg(0)), &[(0, 0xA)]);
        assert_eq!(machine.i, 50);
        assert_eq!(&machine.memory[50..55], &[0xF0, 0x90, 0xF0, 0x90, 0x90]);
    }

    #[test]
    fn bcd_splits_decimal_digits() {
        let (mut cpu, mut machine) = setup(&[Instruction::StoreBcd(Reg(0))]);
        machine.registers[0] = 254;
        machine.i = 0x300;
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(&machine.memory[0x300..0x303], &[2, 5, 4]);
    }

    #[test]
    fn bcd_into_the_font_is_refused() {
        let (mut cpu, mut machine) = setup(&[Instruction::StoreBcd(Reg(0))]);
        machine.i = 0x10;
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::ProtectedWrite { address: 0x10 })
        );
    }

    #[test]
    fn registers_are_stored_and_loaded_through_index() {
        let (mut cpu, mut machine) = setup(&[
            Instruction::StoreRegisters(Reg(2)),
            Instruction::LoadRegisters(Reg(2)),
        ]);
        machine.registers[..4].copy_from_slice(&[1, 2, 3, 4]);
        machine.i = 0x300;

        cpu.cycle(&mut machine).unwrap();
        assert_eq!(&machine.memory[0x300..0x304], &[1, 2, 3, 0]);
        assert_eq!(machine.i, 0x303);

        machine.memory[0x303..0x306].copy_from_slice(&[7, 8, 9]);
        cpu.cycle(&mut machine).unwrap();
        assert_eq!(&machine.registers[..4], &[7, 8, 9, 4]);
        assert_eq!(machine.i, 0x306);
    }

    #[test]
    fn unknown_opcodes_are_stepped_over() {
        let mut machine = Machine::new();
        machine.load(&[0x5A, 0xB1, 0x61, 0x23]).unwrap();
        let mut cpu = Cpu::default();

        let report = cpu.cycle(&mut machine).unwrap();
        assert_eq!(report.unknown_opcode, Some(0x5AB1));
        assert_eq!(machine.program_counter, 0x202);

        cpu.cycle(&mut machine).unwrap();
        assert_eq!(machine.registers[1], 0x23);
    }

    #[test]
    fn strict_mode_reports_unknown_opcodes_as_errors() {
        let mut machine = Machine::new();
        machine.load(&[0x00, 0x00]).unwrap();
        let mut cpu = Cpu::new(Config::new().strict_opcodes(true));
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::UnknownOpcode { opcode: 0x0000 })
        );
        assert_eq!(machine.program_counter, 0x202);
    }

    #[test]
    fn fetch_past_memory_is_fatal() {
        let mut machine = Machine::new();
        let mut cpu = Cpu::default();
        machine.program_counter = 0xFFF;
        assert_eq!(
            cpu.cycle(&mut machine),
            Err(EmulatorError::InvalidFetch { address: 0xFFF })
        );
    }

    proptest! {
        #[test]
        fn set_const_loads_and_advances(x in 0u8..16, n in any::<u8>()) {
            let machine = run(Instruction::SetConst(Reg(x), Const(n)), &[]);
            prop_assert_eq!(machine.registers[x as usize], n);
            prop_assert_eq!(machine.program_counter, PC_START + 2);
        }

        #[test]
        fn add_reg_carries(a in any::<u8>(), b in any::<u8>()) {
            let machine = run(Instruction::AddReg(Reg(1), Reg(2)), &[(1, a), (2, b)]);
            prop_assert_eq!(machine.registers[1], a.wrapping_add(b));
            prop_assert_eq!(machine.registers[FLAG], ((a as u16 + b as u16) > 255) as u8);
        }

        #[test]
        fn sub_reg_flags_no_borrow(a in any::<u8>(), b in any::<u8>()) {
            let machine = run(Instruction::SubReg(Reg(1), Reg(2)), &[(1, a), (2, b)]);
            prop_assert_eq!(machine.registers[1], a.wrapping_sub(b));
            prop_assert_eq!(machine.registers[FLAG], (a >= b) as u8);
        }

        #[test]
        fn bcd_digits_recombine(value in any::<u8>()) {
            let (mut cpu, mut machine) = setup(&[Instruction::StoreBcd(Reg(0))]);
            machine.registers[0] = value;
            machine.i = 0x300;
            cpu.cycle(&mut machine).unwrap();
            let digits = &machine.memory[0x300..0x303];
            prop_assert!(digits.iter().all(|d| *d < 10));
            prop_assert_eq!(digits[0] as u16 * 100 + digits[1] as u16 * 10 + digits[2] as u16, value as u16);
        }

        #[test]
        fn flag_is_always_zero_or_one(a in any::<u8>(), f in any::<u8>()) {
            for instruction in &[
                Instruction::AddReg(Reg(1), Reg(2)),
                Instruction::SubReg(Reg(1), Reg(2)),
                Instruction::ShiftRight(Reg(1)),
                Instruction::SubFromReg(Reg(1), Reg(2)),
                Instruction::ShiftLeft(Reg(1)),
            ] {
                let machine = run(*instruction, &[(1, a), (2, a ^ 0x5A), (0xF, f)]);
                prop_assert!(machine.registers[FLAG] <= 1);
            }
        }
    }
}
