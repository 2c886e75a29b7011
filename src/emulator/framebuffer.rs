use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const SCREEN_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// The 64x32 monochrome screen, stored row by row with one byte per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    cells: [u8; SCREEN_SIZE],
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            cells: [0; SCREEN_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.cells = [0; SCREEN_SIZE];
    }

    /// The pixel at `(x, y)`, with both coordinates wrapping around the screen.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[Self::index(x, y)]
    }

    /// XOR a single pixel onto the screen.
    /// Returns true if a set pixel was erased.
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        let cell = &mut self.cells[Self::index(x, y)];
        *cell ^= 1;
        *cell == 0
    }

    /// All cells, row-major, 0 for off and 1 for on.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(SCREEN_WIDTH)
    }

    fn index(x: usize, y: usize) -> usize {
        (y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for c in row.iter() {
                write!(f, "{}", if *c == 1 { "#" } else { " " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.cells.iter().filter(|c| **c == 1).count();
        write!(f, "Framebuffer {{ lit: {} }}", lit)
    }
}
