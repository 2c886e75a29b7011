/// A 16-bit instruction word viewed as the fields
/// the CHIP-8 instruction set is built from.
///
/// ```text
///  F    X    Y    N
/// |----|----|----|----|
///           |   NN    |
///      |     NNN      |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nibbles(u8, u8);

impl Nibbles {
    pub fn from_u16(value: u16) -> Nibbles {
        Nibbles((value >> 8) as u8, (value & 0x00FF) as u8)
    }

    /// Combine two bytes read from memory, the first one being the most significant.
    pub fn new(high: u8, low: u8) -> Nibbles {
        Nibbles(high, low)
    }

    pub fn as_u16(&self) -> u16 {
        ((self.0 as u16) << 8) | self.1 as u16
    }

    /// All four nibbles from most to least significant.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.family(), self.x(), self.y(), self.n())
    }

    /// The top nibble, which selects the instruction family.
    pub fn family(&self) -> u8 {
        self.0 >> 4
    }

    pub fn x(&self) -> u8 {
        self.0 & 0x0F
    }

    pub fn y(&self) -> u8 {
        self.1 >> 4
    }

    pub fn n(&self) -> u8 {
        self.1 & 0x0F
    }

    pub fn nn(&self) -> u8 {
        self.1
    }

    pub fn nnn(&self) -> u16 {
        self.as_u16() & 0x0FFF
    }
}
