use crate::emulator::keypad::NUM_KEYS;

/// Represents an input device that reports which of the keys 0x0..=0xF are held down.
pub trait EmulatorInput {
    fn keys(&self) -> [bool; NUM_KEYS];
}

/// An input device that never provides any input
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn keys(&self) -> [bool; NUM_KEYS] {
        [false; NUM_KEYS]
    }
}

/// An input device holding the same keys down forever.
pub struct HeldKeys(pub [bool; NUM_KEYS]);

impl HeldKeys {
    pub fn new(pressed: &[u8]) -> HeldKeys {
        let mut keys = [false; NUM_KEYS];
        for key in pressed {
            if let Some(k) = keys.get_mut(*key as usize) {
                *k = true;
            }
        }
        HeldKeys(keys)
    }
}

impl EmulatorInput for HeldKeys {
    fn keys(&self) -> [bool; NUM_KEYS] {
        self.0
    }
}
