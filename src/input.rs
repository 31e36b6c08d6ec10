use crate::error::Result;
use crate::memory::{Address, Memory, Word, KEYBOARD_ADDR, KEYBOARD_RING_WORDS};
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::io;
use std::time::Duration;
use tracing::warn;

/// something that happened on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// a key the DCPU-16 program should see, as the code it expects
    Code(Word),
    /// the user wants out of the emulator
    Quit,
}

/// codes for keys that don't have an ASCII value of their own
const KEY_BACKSPACE: Word = 0x08;
const KEY_ENTER: Word = 0x0a;
const KEY_LEFT: Word = 37;
const KEY_UP: Word = 38;
const KEY_RIGHT: Word = 39;
const KEY_DOWN: Word = 40;

/// reads keypresses
pub trait Keyboard {
    /// everything pressed since the last call, oldest first; never blocks
    fn poll_keys(&mut self) -> Result<Vec<Key>, io::Error>;
}

/// keyboard of the terminal we're running in, via crossterm
///
/// NB. expects the terminal to be in raw mode already (TermDisplay does that)
pub struct TermKeyboard;

impl TermKeyboard {
    pub fn new() -> Self {
        TermKeyboard {}
    }

    fn map(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Quit),
            KeyCode::Esc => Some(Key::Quit),
            KeyCode::Char(c) if c.is_ascii() => Some(Key::Code(c as Word)),
            KeyCode::Enter => Some(Key::Code(KEY_ENTER)),
            KeyCode::Backspace => Some(Key::Code(KEY_BACKSPACE)),
            KeyCode::Left => Some(Key::Code(KEY_LEFT)),
            KeyCode::Up => Some(Key::Code(KEY_UP)),
            KeyCode::Right => Some(Key::Code(KEY_RIGHT)),
            KeyCode::Down => Some(Key::Code(KEY_DOWN)),
            _ => None,
        }
    }
}

impl Default for TermKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard for TermKeyboard {
    fn poll_keys(&mut self) -> Result<Vec<Key>, io::Error> {
        let mut keys = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match TermKeyboard::map(evt.code, evt.modifiers) {
                    Some(key) => keys.push(key),
                    None => warn!(code = ?evt.code, "can't map key to a DCPU-16 key code"),
                },
                // resizes and the like; the screen is a fixed size anyway
                _ => {}
            }
        }
        Ok(keys)
    }
}

/// dummy Keyboard implementation for testing: hands over its keys once
pub struct DummyKeyboard {
    keys: Vec<Key>,
}

impl DummyKeyboard {
    pub fn new(keys: &[Key]) -> Self {
        DummyKeyboard {
            keys: Vec::from(keys),
        }
    }
}

impl Keyboard for DummyKeyboard {
    fn poll_keys(&mut self) -> Result<Vec<Key>, io::Error> {
        Ok(std::mem::take(&mut self.keys))
    }
}

/// The 16-word keyboard ring at 0x9000. Keys go into successive slots; a
/// program takes a key by reading a non-zero slot and writing zero back. A
/// slot that still holds an unread key means the ring is full.
#[derive(Debug, Default)]
pub struct KeyRing {
    next: Word,
}

impl KeyRing {
    pub fn new() -> Self {
        KeyRing { next: 0 }
    }

    /// store `key` in the next slot; returns false (and drops the key) if
    /// the program hasn't emptied that slot yet
    pub fn push<M: Memory + ?Sized>(&mut self, mem: &mut M, key: Word) -> Result<bool> {
        let slot = Address::Ram(KEYBOARD_ADDR + self.next);
        if mem.load(slot) != 0 {
            warn!(key, "keyboard ring full; key dropped");
            return Ok(false);
        }
        mem.store(slot, key)?;
        self.next = (self.next + 1) % KEYBOARD_RING_WORDS;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PureBackend;

    #[test]
    fn test_map_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(TermKeyboard::map(KeyCode::Char('a'), none), Some(Key::Code(0x61)));
        assert_eq!(TermKeyboard::map(KeyCode::Enter, none), Some(Key::Code(0x0a)));
        assert_eq!(TermKeyboard::map(KeyCode::Up, none), Some(Key::Code(38)));
        assert_eq!(TermKeyboard::map(KeyCode::Esc, none), Some(Key::Quit));
        assert_eq!(
            TermKeyboard::map(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Key::Quit)
        );
        assert_eq!(TermKeyboard::map(KeyCode::Char('é'), none), None);
        assert_eq!(TermKeyboard::map(KeyCode::F(1), none), None);
    }

    #[test]
    fn test_dummy_keyboard_drains() -> Result<(), io::Error> {
        let mut k = DummyKeyboard::new(&[Key::Code(0x41), Key::Quit]);
        assert_eq!(k.poll_keys()?, vec![Key::Code(0x41), Key::Quit]);
        assert!(k.poll_keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_ring_fills_slots_in_order() -> Result<()> {
        let mut m = PureBackend::new();
        let mut ring = KeyRing::new();
        assert!(ring.push(&mut m, 0x41)?);
        assert!(ring.push(&mut m, 0x42)?);
        assert_eq!(m.load(Address::Ram(0x9000)), 0x41);
        assert_eq!(m.load(Address::Ram(0x9001)), 0x42);
        Ok(())
    }

    #[test]
    fn test_ring_full_drops_key() -> Result<()> {
        let mut m = PureBackend::new();
        let mut ring = KeyRing::new();
        for k in 0..16 {
            assert!(ring.push(&mut m, 0x30 + k)?);
        }
        assert!(!ring.push(&mut m, 0x7a)?);
        assert_eq!(m.load(Address::Ram(0x9000)), 0x30);

        // program consumes the first slot; the ring wraps round into it
        m.store(Address::Ram(0x9000), 0)?;
        assert!(ring.push(&mut m, 0x7a)?);
        assert_eq!(m.load(Address::Ram(0x9000)), 0x7a);
        Ok(())
    }
}
