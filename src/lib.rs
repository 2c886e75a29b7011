/*!

A CHIP-8 virtual machine as specified at https://en.wikipedia.org/wiki/CHIP-8.

The crate only contains the machine itself. Windows, keyboards and speakers belong
to the host, which feeds the machine program bytes and key states, and reads back
the screen whenever it changes.

# Headless runner

If you want to try the machine on some programs, there is a runner without any display
you can start with `cargo run --release --bin headless -- <program>`.
Use `RUST_LOG=trace` to see every executed instruction, and `--dump` to print the final screen.

# Library

The main way of running a program is to load it as bytes and step through it,
one cycle per call. How often to call is up to you; 60 times a second keeps the timers accurate.

```rust
use chip_8::emulator::Emulator;

let mut emulator = Emulator::new();

// Load a program at address 0x200.
let clear_display = [0x00, 0xE0];
emulator.load(&clear_display).unwrap();
let report = emulator.step().unwrap(); // Will now clear the display
assert!(report.display_changed);
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip_8::emulator::Emulator;
use chip_8::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen).unwrap();

// Or many sequentially
emulator.execute_many(&[
    Instruction::Jump(Addr(0x250)),
    Instruction::SetConst(Reg(0xA), Const(35)),
    Instruction::SetReg(Reg(0xB), Reg(0xA))
]).unwrap();
assert_eq!(emulator.machine().register(0xB), 35);
```

The machine and the cpu can also be held separately,
with the cpu borrowing the machine for each cycle.

```rust
use chip_8::emulator::{Config, Cpu, Machine};

let mut machine = Machine::new();
let mut cpu = Cpu::new(Config::new().seed(42));
machine.load(&[0x60, 0x07]).unwrap();
cpu.cycle(&mut machine).unwrap();
assert_eq!(machine.register(0), 7);
```

## Custom input and output

To connect a real keyboard and screen, implement `EmulatorInput` and `EmulatorOutput`,
which represent somewhere to get the key states from and a screen respectively.
Take a look at `src/emulator/input.rs` and `src/emulator/output.rs` to see how to implement this, then do the following.

```ignore
use chip_8::emulator::Emulator;

let mut emulator = Emulator::new();
let mut screen = MyOutput::new();
emulator.step_with_io(&MyInput::new(), &mut screen)?;
```
*/

pub mod emulator;
pub mod util;
