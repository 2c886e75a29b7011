use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use structopt::StructOpt;

use chip_8::emulator::input::DummyInput;
use chip_8::emulator::instruction::Instruction;
use chip_8::emulator::machine::PC_START;
use chip_8::emulator::output::RecordingOutput;
use chip_8::emulator::{Config, Emulator};

/// Run a CHIP-8 program without a display or keyboard.
#[derive(StructOpt, Debug)]
#[structopt(name = "headless")]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Stop after this many cycles, or run forever if not given
    #[structopt(short, long)]
    cycles: Option<u64>,

    /// Cycles per second, 0 runs as fast as possible
    #[structopt(long, default_value = "60")]
    hz: u64,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,

    /// Stop on unknown opcodes instead of skipping them
    #[structopt(long)]
    strict: bool,

    /// Jump to NNN & 0xF00 on 1NNN, like some broken interpreters
    #[structopt(long)]
    legacy_jump: bool,

    /// Keep I within 12 bits when FX1E overflows
    #[structopt(long)]
    mask_index: bool,

    /// Print the screen when the program stops
    #[structopt(short, long)]
    dump: bool,

    /// Print the program as mnemonics instead of running it
    #[structopt(long)]
    disassemble: bool,
}

impl Opt {
    fn config(&self) -> Config {
        let config = Config::new()
            .strict_opcodes(self.strict)
            .legacy_jump_mask(self.legacy_jump)
            .mask_index_overflow(self.mask_index);
        match self.seed {
            Some(seed) => config.seed(seed),
            None => config,
        }
    }
}

fn disassemble(program: &[u8]) {
    for (n, word) in program.chunks(2).enumerate() {
        let address = PC_START as usize + 2 * n;
        match word {
            [high, low] => match Instruction::from_two_u8(*high, *low) {
                Some(instruction) => println!("{:#06x}  {:02X}{:02X}  {}", address, high, low, instruction),
                None => println!("{:#06x}  {:02X}{:02X}  ???", address, high, low),
            },
            [odd] => println!("{:#06x}  {:02X}", address, odd),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
    let program = std::fs::read(&opt.input).with_context(|| format!("Could not read {:?}", opt.input))?;

    if opt.disassemble {
        disassemble(&program);
        return Ok(());
    }

    // Load instructions into emulator memory
    let mut emulator = Emulator::with_config(opt.config());
    emulator.load(&program)?;

    let delay = match opt.hz {
        0 => None,
        hz => Some(Duration::from_micros(1_000_000 / hz)),
    };
    let mut output = RecordingOutput::new();

    // Start execution
    let mut executed = 0;
    while opt.cycles.map_or(true, |limit| executed < limit) {
        if let Err(error) = emulator.step_with_io(&DummyInput, &mut output) {
            log::error!("Stopped after {} cycles: {}", executed, error);
            log::debug!("{:?}", emulator.machine());
            if opt.dump {
                print!("{}", emulator.machine().screen());
            }
            return Err(error.into());
        }
        executed += 1;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }

    log::info!(
        "Ran {} cycles, {} frames and {} beeps",
        executed,
        output.frames,
        output.beeps
    );
    if opt.dump {
        print!("{}", emulator.machine().screen());
    }

    Ok(())
}
