pub const NUM_KEYS: usize = 16;

/// State of the hexadecimal keypad, one flag per key 0x0..=0xF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    /// Replace the whole key state, as sampled by the host.
    pub fn set_all(&mut self, keys: [bool; NUM_KEYS]) {
        self.keys = keys;
    }

    pub fn press(&mut self, key: u8) {
        if let Some(k) = self.keys.get_mut(key as usize) {
            *k = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(k) = self.keys.get_mut(key as usize) {
            *k = false;
        }
    }

    /// Keys outside the keypad are never pressed.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// The lowest pressed key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|k| *k).map(|k| k as u8)
    }

    pub fn as_array(&self) -> [bool; NUM_KEYS] {
        self.keys
    }
}

impl From<[bool; NUM_KEYS]> for Keypad {
    fn from(keys: [bool; NUM_KEYS]) -> Self {
        Keypad { keys }
    }
}
