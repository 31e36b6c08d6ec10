/// Machine and driver settings. The core only cares about the screen
/// geometry (it decides which stores get forwarded); the rest paces the
/// terminal driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// text screen height in characters
    pub rows: usize,
    /// text screen width in characters
    pub columns: usize,
    /// instructions per second of wall-clock time
    pub clock_hz: u32,
    /// how many instructions to run before stopping
    pub steps: u64,
}

/// the LEM-era 32x12 text screen
const DEFAULT_ROWS: usize = 12;
const DEFAULT_COLUMNS: usize = 32;

/// nominal DCPU-16 speed
const DEFAULT_CLOCK_HZ: u32 = 100_000;

/// about ten minutes at the default clock
const DEFAULT_STEPS: u64 = 60_000_000;

/// how often the driver repaints and polls the keyboard
pub const FRAMES_PER_SECOND: u32 = 60;

impl Config {
    /// number of words in the video window starting at 0x8000
    pub fn video_words(&self) -> usize {
        self.rows * self.columns
    }

    /// instructions the driver runs between repaints; never zero
    pub fn steps_per_frame(&self) -> u64 {
        (self.clock_hz / FRAMES_PER_SECOND).max(1) as u64
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            clock_hz: DEFAULT_CLOCK_HZ,
            steps: DEFAULT_STEPS,
        }
    }
}
