use crate::emulator::framebuffer::Framebuffer;

/// Represents an output device that shows the screen and plays the beep.
pub trait EmulatorOutput {
    /// Called with the whole screen whenever it has changed.
    fn draw(&mut self, screen: &Framebuffer);

    /// Called once for every cycle where the sound timer ran out.
    fn beep(&mut self) {}
}

/// An output device that discards everything.
pub struct DummyOutput;

impl EmulatorOutput for DummyOutput {
    fn draw(&mut self, _: &Framebuffer) {}
}

/// A simple output device that keeps the latest frame and counts events.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub frame: Option<Framebuffer>,
    pub frames: usize,
    pub beeps: usize,
}

impl RecordingOutput {
    pub fn new() -> RecordingOutput {
        RecordingOutput::default()
    }
}

impl EmulatorOutput for RecordingOutput {
    fn draw(&mut self, screen: &Framebuffer) {
        self.frame = Some(screen.clone());
        self.frames += 1;
    }

    fn beep(&mut self) {
        self.beeps += 1;
    }
}
