/// Switches for behavior that differs between CHIP-8 interpreters.
///
/// The defaults describe the standard instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Report unknown opcodes as errors instead of only logging them.
    /// The program counter is advanced past them either way.
    pub strict_opcodes: bool,

    /// Make `1NNN` jump to `NNN & 0xF00`, as some buggy interpreters do.
    pub legacy_jump_mask: bool,

    /// Keep I within 12 bits after `FX1E` overflows.
    pub mask_index_overflow: bool,

    /// Seed for the random number generator used by `CXNN`.
    pub seed: Option<u64>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn strict_opcodes(mut self, strict: bool) -> Config {
        self.strict_opcodes = strict;
        self
    }

    pub fn legacy_jump_mask(mut self, legacy: bool) -> Config {
        self.legacy_jump_mask = legacy;
        self
    }

    pub fn mask_index_overflow(mut self, mask: bool) -> Config {
        self.mask_index_overflow = mask;
        self
    }

    pub fn seed(mut self, seed: u64) -> Config {
        self.seed = Some(seed);
        self
    }
}
