use crate::config::Config;
use crate::display::Display;
use crate::error::{Error, Result};
use crate::memory::{Address, AddressSpace, Memory, Word, VIDEO_ADDR};

/// Memory that nobody else can see. Stores only ever touch the AddressSpace,
/// so given the same program and the same number of steps, the interpreter
/// always ends up in the same place.
pub struct PureBackend {
    space: AddressSpace,
}

impl PureBackend {
    pub fn new() -> Self {
        PureBackend {
            space: AddressSpace::new(),
        }
    }

    pub fn load_program(&mut self, words: &[Word]) {
        self.space.load_program(words)
    }
}

impl Default for PureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for PureBackend {
    fn load(&self, addr: Address) -> Word {
        self.space.load(addr)
    }

    fn store(&mut self, addr: Address, value: Word) -> Result<()> {
        self.space.store(addr, value);
        Ok(())
    }
}

/// Memory wired to a screen. Every store that lands in the video window is
/// passed on to the display, straight after the write and in the order the
/// writes happen.
pub struct IoBackend<'a> {
    space: AddressSpace,
    display: &'a mut dyn Display,
    video_words: usize,
}

impl<'a> IoBackend<'a> {
    pub fn new(display: &'a mut dyn Display, config: &Config) -> Self {
        IoBackend {
            space: AddressSpace::new(),
            display,
            video_words: config.video_words(),
        }
    }

    /// NB. this doesn't go through the display; loading a program isn't
    ///     the machine storing anything
    pub fn load_program(&mut self, words: &[Word]) {
        self.space.load_program(words)
    }

    /// the display, e.g. for the driver to repaint between slices of steps
    pub fn display(&mut self) -> &mut dyn Display {
        &mut *self.display
    }

    /// offset into the video window, if `addr` is in it
    fn video_offset(&self, addr: Address) -> Option<usize> {
        match addr {
            Address::Ram(o) if o >= VIDEO_ADDR => {
                let offset = (o - VIDEO_ADDR) as usize;
                (offset < self.video_words).then(|| offset)
            }
            _ => None,
        }
    }
}

impl Memory for IoBackend<'_> {
    fn load(&self, addr: Address) -> Word {
        self.space.load(addr)
    }

    fn store(&mut self, addr: Address, value: Word) -> Result<()> {
        self.space.store(addr, value);
        match self.video_offset(addr) {
            Some(offset) => self
                .display
                .on_store(offset, value)
                .map_err(Error::Display),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DummyDisplay, RecordingDisplay};
    use std::io;

    /// says no to everything
    struct BrokenDisplay;

    impl Display for BrokenDisplay {
        fn on_store(&mut self, _offset: usize, _value: Word) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "screen unplugged"))
        }
    }

    #[test]
    fn test_pure_store_then_load() -> Result<()> {
        let mut m = PureBackend::new();
        m.store(Address::Ram(0x8000), 0x1234)?;
        m.store(Address::Register(3), 0x5678)?;
        assert_eq!(m.load(Address::Ram(0x8000)), 0x1234);
        assert_eq!(m.load(Address::Register(3)), 0x5678);
        Ok(())
    }

    #[test]
    fn test_io_store_then_load() -> Result<()> {
        let mut display = DummyDisplay::new()?;
        let mut m = IoBackend::new(&mut display, &Config::default());
        m.store(Address::Ram(0x8001), 0xf041)?;
        m.store(Address::StackPointer, 0xfffe)?;
        assert_eq!(m.load(Address::Ram(0x8001)), 0xf041);
        assert_eq!(m.load(Address::StackPointer), 0xfffe);
        Ok(())
    }

    #[test]
    fn test_video_window_edges() -> Result<()> {
        let mut display = RecordingDisplay::new();
        {
            let mut m = IoBackend::new(&mut display, &Config::default());
            m.store(Address::Ram(0x7fff), 1)?;
            m.store(Address::Ram(0x8000), 2)?;
            m.store(Address::Ram(0x817f), 3)?;
            m.store(Address::Ram(0x8180), 4)?;
            m.store(Address::Register(0), 5)?;
            m.store(Address::ProgramCounter, 0x8000)?;
        }
        assert_eq!(display.stores, vec![(0, 2), (0x17f, 3)]);
        Ok(())
    }

    #[test]
    fn test_video_window_follows_config() -> Result<()> {
        let mut display = RecordingDisplay::new();
        let config = Config {
            rows: 1,
            columns: 2,
            ..Config::default()
        };
        {
            let mut m = IoBackend::new(&mut display, &config);
            m.store(Address::Ram(0x8001), 1)?;
            m.store(Address::Ram(0x8002), 2)?;
        }
        assert_eq!(display.stores, vec![(1, 1)]);
        Ok(())
    }

    #[test]
    fn test_program_load_not_forwarded() {
        let mut display = RecordingDisplay::new();
        {
            let mut m = IoBackend::new(&mut display, &Config::default());
            let mut prog = vec![0; 0x8001];
            prog[0x8000] = 0xf041;
            m.load_program(&prog);
            assert_eq!(m.load(Address::Ram(0x8000)), 0xf041);
        }
        assert!(display.stores.is_empty());
    }

    #[test]
    fn test_display_failure_keeps_store() {
        let mut display = BrokenDisplay;
        let mut m = IoBackend::new(&mut display, &Config::default());
        let r = m.store(Address::Ram(0x8010), 0xabcd);
        assert!(matches!(r, Err(Error::Display(_))));
        assert_eq!(m.load(Address::Ram(0x8010)), 0xabcd);
        // nothing outside the window asks the display anything
        assert!(m.store(Address::Ram(0x1000), 1).is_ok());
    }
}
