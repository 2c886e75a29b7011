use crate::util::nibbles::Nibbles;
use std::fmt;

/// A wrapper for addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr(pub u16);

/// A wrapper for registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

/// A wrapper for constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Const(pub u8);

/// A single instruction from the CHIP-8 instruction set.
/// Two bytes written in hexadecimal, with the following special characters:
/// - NNN: address
/// - NN: 8-bit constant
/// - N: 4-bit constant
/// - X and Y: 4-bit register identifier
/// - I: 16 bit register for memory address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,                // 00E0
    Return,                     // 00EE
    Jump(Addr),                 // 1NNN
    Call(Addr),                 // 2NNN
    SkipIfEqConst(Reg, Const),  // 3XNN
    SkipIfNeqConst(Reg, Const), // 4XNN
    SkipIfEqReg(Reg, Reg),      // 5XY0
    SetConst(Reg, Const),       // 6XNN
    AddConst(Reg, Const),       // 7XNN
    SetReg(Reg, Reg),           // 8XY0
    Or(Reg, Reg),               // 8XY1
    And(Reg, Reg),              // 8XY2
    Xor(Reg, Reg),              // 8XY3
    AddReg(Reg, Reg),           // 8XY4
    SubReg(Reg, Reg),           // 8XY5
    ShiftRight(Reg),            // 8XY6
    SubFromReg(Reg, Reg),       // 8XY7
    ShiftLeft(Reg),             // 8XYE
    SkipIfNeqReg(Reg, Reg),     // 9XY0
    SetIndex(Addr),             // ANNN
    JumpPlusV0(Addr),           // BNNN
    Random(Reg, Const),         // CXNN
    Draw(Reg, Reg, Const),      // DXYN
    SkipIfKey(Reg),             // EX9E
    SkipIfNotKey(Reg),          // EXA1
    GetDelayTimer(Reg),         // FX07
    WaitForKey(Reg),            // FX0A
    SetDelayTimer(Reg),         // FX15
    SetSoundTimer(Reg),         // FX18
    AddToIndex(Reg),            // FX1E
    SetIndexToGlyph(Reg),       // FX29
    StoreBcd(Reg),              // FX33
    StoreRegisters(Reg),        // FX55
    LoadRegisters(Reg),         // FX65
}

impl Instruction {
    /// Decode an instruction word, or `None` if it is not part of the instruction set.
    pub fn from_u16(value: u16) -> Option<Instruction> {
        Instruction::decode(Nibbles::from_u16(value))
    }

    pub fn from_two_u8(high: u8, low: u8) -> Option<Instruction> {
        Instruction::decode(Nibbles::new(high, low))
    }

    fn decode(word: Nibbles) -> Option<Instruction> {
        use Instruction::*;

        let nn = Const(word.nn());
        let nnn = Addr(word.nnn());
        let instruction = match word.as_four_u8() {
            (0, 0, 0xE, 0) => ClearScreen,
            (0, 0, 0xE, 0xE) => Return,
            (1, _, _, _) => Jump(nnn),
            (2, _, _, _) => Call(nnn),
            (3, x, _, _) => SkipIfEqConst(Reg(x), nn),
            (4, x, _, _) => SkipIfNeqConst(Reg(x), nn),
            (5, x, y, 0) => SkipIfEqReg(Reg(x), Reg(y)),
            (6, x, _, _) => SetConst(Reg(x), nn),
            (7, x, _, _) => AddConst(Reg(x), nn),
            (8, x, y, 0) => SetReg(Reg(x), Reg(y)),
            (8, x, y, 1) => Or(Reg(x), Reg(y)),
            (8, x, y, 2) => And(Reg(x), Reg(y)),
            (8, x, y, 3) => Xor(Reg(x), Reg(y)),
            (8, x, y, 4) => AddReg(Reg(x), Reg(y)),
            (8, x, y, 5) => SubReg(Reg(x), Reg(y)),
            (8, x, _, 6) => ShiftRight(Reg(x)),
            (8, x, y, 7) => SubFromReg(Reg(x), Reg(y)),
            (8, x, _, 0xE) => ShiftLeft(Reg(x)),
            (9, x, y, 0) => SkipIfNeqReg(Reg(x), Reg(y)),
            (0xA, _, _, _) => SetIndex(nnn),
            (0xB, _, _, _) => JumpPlusV0(nnn),
            (0xC, x, _, _) => Random(Reg(x), nn),
            (0xD, x, y, n) => Draw(Reg(x), Reg(y), Const(n)),
            (0xE, x, 9, 0xE) => SkipIfKey(Reg(x)),
            (0xE, x, 0xA, 1) => SkipIfNotKey(Reg(x)),
            (0xF, x, 0, 7) => GetDelayTimer(Reg(x)),
            (0xF, x, 0, 0xA) => WaitForKey(Reg(x)),
            (0xF, x, 1, 5) => SetDelayTimer(Reg(x)),
            (0xF, x, 1, 8) => SetSoundTimer(Reg(x)),
            (0xF, x, 1, 0xE) => AddToIndex(Reg(x)),
            (0xF, x, 2, 9) => SetIndexToGlyph(Reg(x)),
            (0xF, x, 3, 3) => StoreBcd(Reg(x)),
            (0xF, x, 5, 5) => StoreRegisters(Reg(x)),
            (0xF, x, 6, 5) => LoadRegisters(Reg(x)),
            _ => return None,
        };
        Some(instruction)
    }

    /// Encode back into an instruction word.
    /// Shifts are encoded with Y set to 0, since they ignore it.
    pub fn to_u16(&self) -> u16 {
        use Instruction::*;

        fn xnn(family: u16, Reg(x): Reg, Const(nn): Const) -> u16 {
            family << 12 | (x as u16 & 0xF) << 8 | nn as u16
        }
        fn xyn(family: u16, Reg(x): Reg, Reg(y): Reg, n: u16) -> u16 {
            family << 12 | (x as u16 & 0xF) << 8 | (y as u16 & 0xF) << 4 | (n & 0xF)
        }
        fn fx(x: Reg, low: u8) -> u16 {
            xnn(0xF, x, Const(low))
        }

        match *self {
            ClearScreen => 0x00E0,
            Return => 0x00EE,
            Jump(Addr(a)) => 0x1000 | (a & 0x0FFF),
            Call(Addr(a)) => 0x2000 | (a & 0x0FFF),
            SkipIfEqConst(x, nn) => xnn(3, x, nn),
            SkipIfNeqConst(x, nn) => xnn(4, x, nn),
            SkipIfEqReg(x, y) => xyn(5, x, y, 0),
            SetConst(x, nn) => xnn(6, x, nn),
            AddConst(x, nn) => xnn(7, x, nn),
            SetReg(x, y) => xyn(8, x, y, 0),
            Or(x, y) => xyn(8, x, y, 1),
            And(x, y) => xyn(8, x, y, 2),
            Xor(x, y) => xyn(8, x, y, 3),
            AddReg(x, y) => xyn(8, x, y, 4),
            SubReg(x, y) => xyn(8, x, y, 5),
            ShiftRight(x) => xyn(8, x, Reg(0), 6),
            SubFromReg(x, y) => xyn(8, x, y, 7),
            ShiftLeft(x) => xyn(8, x, Reg(0), 0xE),
            SkipIfNeqReg(x, y) => xyn(9, x, y, 0),
            SetIndex(Addr(a)) => 0xA000 | (a & 0x0FFF),
            JumpPlusV0(Addr(a)) => 0xB000 | (a & 0x0FFF),
            Random(x, nn) => xnn(0xC, x, nn),
            Draw(x, y, Const(n)) => xyn(0xD, x, y, n as u16),
            SkipIfKey(x) => xnn(0xE, x, Const(0x9E)),
            SkipIfNotKey(x) => xnn(0xE, x, Const(0xA1)),
            GetDelayTimer(x) => fx(x, 0x07),
            WaitForKey(x) => fx(x, 0x0A),
            SetDelayTimer(x) => fx(x, 0x15),
            SetSoundTimer(x) => fx(x, 0x18),
            AddToIndex(x) => fx(x, 0x1E),
            SetIndexToGlyph(x) => fx(x, 0x29),
            StoreBcd(x) => fx(x, 0x33),
            StoreRegisters(x) => fx(x, 0x55),
            LoadRegisters(x) => fx(x, 0x65),
        }
    }

    /// The same instruction with registers cut to 4 bits, addresses to 12 bits
    /// and the sprite height to 4 bits, as decoding would produce.
    pub fn canonical(&self) -> Instruction {
        Instruction::from_u16(self.to_u16()).unwrap_or(*self)
    }

    /// Assemble a sequence of instructions into program bytes.
    pub fn assemble(instructions: &[Instruction]) -> Vec<u8> {
        instructions
            .iter()
            .flat_map(|instruction| instruction.to_u16().to_be_bytes().to_vec())
            .collect()
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{:X}", self.0)
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

/// Mnemonics as in Cowgod's CHIP-8 technical reference.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP {}", a),
            Call(a) => write!(f, "CALL {}", a),
            SkipIfEqConst(x, nn) => write!(f, "SE {}, {}", x, nn),
            SkipIfNeqConst(x, nn) => write!(f, "SNE {}, {}", x, nn),
            SkipIfEqReg(x, y) => write!(f, "SE {}, {}", x, y),
            SetConst(x, nn) => write!(f, "LD {}, {}", x, nn),
            AddConst(x, nn) => write!(f, "ADD {}, {}", x, nn),
            SetReg(x, y) => write!(f, "LD {}, {}", x, y),
            Or(x, y) => write!(f, "OR {}, {}", x, y),
            And(x, y) => write!(f, "AND {}, {}", x, y),
            Xor(x, y) => write!(f, "XOR {}, {}", x, y),
            AddReg(x, y) => write!(f, "ADD {}, {}", x, y),
            SubReg(x, y) => write!(f, "SUB {}, {}", x, y),
            ShiftRight(x) => write!(f, "SHR {}", x),
            SubFromReg(x, y) => write!(f, "SUBN {}, {}", x, y),
            ShiftLeft(x) => write!(f, "SHL {}", x),
            SkipIfNeqReg(x, y) => write!(f, "SNE {}, {}", x, y),
            SetIndex(a) => write!(f, "LD I, {}", a),
            JumpPlusV0(a) => write!(f, "JP V0, {}", a),
            Random(x, nn) => write!(f, "RND {}, {}", x, nn),
            Draw(x, y, Const(n)) => write!(f, "DRW {}, {}, {}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP {}", x),
            SkipIfNotKey(x) => write!(f, "SKNP {}", x),
            GetDelayTimer(x) => write!(f, "LD {}, DT", x),
            WaitForKey(x) => write!(f, "LD {}, K", x),
            SetDelayTimer(x) => write!(f, "LD DT, {}", x),
            SetSoundTimer(x) => write!(f, "LD ST, {}", x),
            AddToIndex(x) => write!(f, "ADD I, {}", x),
            SetIndexToGlyph(x) => write!(f, "LD F, {}", x),
            StoreBcd(x) => write!(f, "LD B, {}", x),
            StoreRegisters(x) => write!(f, "LD [I], {}", x),
            LoadRegisters(x) => write!(f, "LD {}, [I]", x),
        }
    }
}
