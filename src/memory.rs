use crate::error::Result;

// NB. everything the CPU can see is a Word; offsets into RAM are Words too so
//     wrapping at the top of memory falls out of u16 arithmetic

/// a 16-bit machine word; arithmetic on it wraps
pub type Word = u16;

/// how much RAM we have, in words
pub const RAM_SIZE_WORDS: usize = 0x10000;

/// how many general purpose registers (A, B, C, X, Y, Z, I, J)
pub const REGISTER_COUNT: usize = 8;

/// start of the memory-mapped text screen
pub const VIDEO_ADDR: Word = 0x8000;

/// start of the 16-word keyboard ring buffer
pub const KEYBOARD_ADDR: Word = 0x9000;
pub const KEYBOARD_RING_WORDS: Word = 0x10;

/// Names a single cell of machine state. There's no such thing as an invalid
/// address: register indices wrap onto the eight registers and RAM offsets
/// are already confined to 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    ProgramCounter,
    StackPointer,
    /// the O register, set by arithmetic that overflows
    Overflow,
    Register(u8),
    Ram(Word),
}

/// Represents something the interpreter can read and write through. The
/// interpreter only ever talks to this, so it never knows whether its stores
/// stay private or end up on a screen somewhere.
///
/// Implementations must make a `store` followed by a `load` of the same
/// address return the stored value, and stores to one address must never
/// show up at another.
pub trait Memory {
    /// read any cell
    fn load(&self, addr: Address) -> Word;

    /// write any cell; the write itself cannot fail, but whatever an
    /// implementation does after the write might
    fn store(&mut self, addr: Address, value: Word) -> Result<()>;

    /// copy out the whole machine state as plain values
    fn snapshot(&self) -> Snapshot {
        let mut registers = [0; REGISTER_COUNT];
        for (i, r) in registers.iter_mut().enumerate() {
            *r = self.load(Address::Register(i as u8));
        }
        Snapshot {
            registers,
            pc: self.load(Address::ProgramCounter),
            sp: self.load(Address::StackPointer),
            overflow: self.load(Address::Overflow),
            ram: (0..RAM_SIZE_WORDS)
                .map(|o| self.load(Address::Ram(o as Word)))
                .collect(),
        }
    }
}

/// owned copy of a machine's state, safe to hand out of any backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub registers: [Word; REGISTER_COUNT],
    pub pc: Word,
    pub sp: Word,
    pub overflow: Word,
    pub ram: Vec<Word>,
}

/// The DCPU-16 state proper:
///   0x0000-0x7fff  program and data
///   0x8000-0x817f  text screen (32x12 by default)
///   0x9000-0x900f  keyboard ring
///   0xffff down    stack (SP starts at 0, the first push lands on 0xffff)
///
/// none of these regions are special to AddressSpace itself; the backends
/// decide what, if anything, a store to them means
pub struct AddressSpace {
    ram: Box<[Word]>,
    registers: [Word; REGISTER_COUNT],
    program_counter: Word,
    stack_pointer: Word,
    overflow: Word,
}

impl AddressSpace {
    /// everything zeroed
    pub fn new() -> Self {
        AddressSpace {
            ram: vec![0; RAM_SIZE_WORDS].into_boxed_slice(),
            registers: [0; REGISTER_COUNT],
            program_counter: 0x0000,
            stack_pointer: 0x0000,
            overflow: 0x0000,
        }
    }

    pub fn load(&self, addr: Address) -> Word {
        match addr {
            Address::ProgramCounter => self.program_counter,
            Address::StackPointer => self.stack_pointer,
            Address::Overflow => self.overflow,
            Address::Register(i) => self.registers[i as usize % REGISTER_COUNT],
            Address::Ram(o) => self.ram[o as usize],
        }
    }

    pub fn store(&mut self, addr: Address, value: Word) {
        let cell = match addr {
            Address::ProgramCounter => &mut self.program_counter,
            Address::StackPointer => &mut self.stack_pointer,
            Address::Overflow => &mut self.overflow,
            Address::Register(i) => &mut self.registers[i as usize % REGISTER_COUNT],
            Address::Ram(o) => &mut self.ram[o as usize],
        };
        *cell = value;
    }

    /// copy a program into RAM from 0x0000; registers, PC, SP and O are left
    /// alone, and anything past the end of RAM is dropped
    pub fn load_program(&mut self, words: &[Word]) {
        let len = words.len().min(RAM_SIZE_WORDS);
        self.ram[..len].copy_from_slice(&words[..len]);
    }

    /// r/o view of RAM
    pub fn ram(&self) -> &[Word] {
        &self.ram
    }

    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        &self.registers
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_kind_of_address() -> [Address; 8] {
        [
            Address::ProgramCounter,
            Address::StackPointer,
            Address::Overflow,
            Address::Register(0),
            Address::Register(7),
            Address::Ram(0x0000),
            Address::Ram(0x8000),
            Address::Ram(0xffff),
        ]
    }

    #[test]
    fn test_memory_zeroed() {
        let m = AddressSpace::new();
        assert!(m.ram().iter().all(|w| *w == 0));
        assert_eq!(m.registers(), &[0; REGISTER_COUNT]);
        assert_eq!(m.load(Address::ProgramCounter), 0);
        assert_eq!(m.load(Address::StackPointer), 0);
        assert_eq!(m.load(Address::Overflow), 0);
    }

    #[test]
    fn test_store_then_load() {
        for addr in every_kind_of_address() {
            let mut m = AddressSpace::new();
            m.store(addr, 0xbeef);
            assert_eq!(m.load(addr), 0xbeef, "{:?}", addr);
        }
    }

    #[test]
    fn test_stores_dont_interfere() {
        let mut m = AddressSpace::new();
        for (i, addr) in every_kind_of_address().iter().enumerate() {
            m.store(*addr, i as Word + 1);
        }
        for (i, addr) in every_kind_of_address().iter().enumerate() {
            assert_eq!(m.load(*addr), i as Word + 1, "{:?}", addr);
        }
    }

    #[test]
    fn test_register_index_wraps() {
        let mut m = AddressSpace::new();
        m.store(Address::Register(9), 0x1234);
        assert_eq!(m.load(Address::Register(1)), 0x1234);
    }

    #[test]
    fn test_program_load_ok() {
        let mut m = AddressSpace::new();
        m.store(Address::Register(0), 7);
        m.store(Address::ProgramCounter, 3);
        m.load_program(&[0xa461, 0x7001, 0x8403]);
        assert_eq!(&m.ram()[..4], &[0xa461, 0x7001, 0x8403, 0x0000]);
        assert_eq!(m.load(Address::Register(0)), 7);
        assert_eq!(m.load(Address::ProgramCounter), 3);
    }

    #[test]
    fn test_program_load_overwrites() {
        let mut m = AddressSpace::new();
        m.store(Address::Ram(1), 0xffff);
        m.load_program(&[0x0001, 0x0002]);
        assert_eq!(m.load(Address::Ram(1)), 0x0002);
    }

    #[test]
    fn test_oversized_program_truncated() {
        let mut m = AddressSpace::new();
        let prog = vec![0x5555; RAM_SIZE_WORDS + 4];
        m.load_program(&prog);
        assert_eq!(m.load(Address::Ram(0xffff)), 0x5555);
        assert_eq!(m.load(Address::Ram(0x0000)), 0x5555);
    }
}
