//! # interpreter
//!
//! The DCPU-16 fetch/decode/execute loop. It's written once, against the
//! `Memory` trait, and holds no state of its own: PC, SP, O and the registers
//! all live behind `load`/`store`. Whatever the machine does, it does by
//! asking the memory it was handed, so whether a run is repeatable or drives
//! a screen is decided entirely by which memory that is.
//!
//! Each step:
//!  1. read PC
//!  2. read the instruction word at PC, decode it, fetching any next words
//!  3. write PC past the instruction and its next words
//!  4. resolve operands (a then b; this is where PUSH/POP move SP) and do it
//!
//! a word that doesn't decode stops the run before PC is written, so PC is
//! left pointing at the offending word. A store that fails (a screen that
//! has gone away, say) doesn't cut an instruction short: the rest of it still
//! happens and the failure comes back once the step is done.

use crate::error::{Error, Result};
use crate::instruction::{self, Instruction, Opcode, Operand};
use crate::memory::{Address, Memory, Word};
use tracing::{debug, trace};

/// where an operand reads from and writes to, once resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Cell(Address),
    /// writes to a literal fail silently
    Value(Word),
}

fn load<M: Memory + ?Sized>(mem: &M, target: Target) -> Word {
    match target {
        Target::Cell(addr) => mem.load(addr),
        Target::Value(v) => v,
    }
}

fn store<M: Memory + ?Sized>(mem: &mut M, target: Target, value: Word) -> Result<()> {
    match target {
        Target::Cell(addr) => mem.store(addr, value),
        Target::Value(_) => Ok(()),
    }
}

/// turn an operand into a location, doing any stack pointer movement it
/// implies
fn resolve<M: Memory + ?Sized>(mem: &mut M, operand: Operand) -> Result<Target> {
    let target = match operand {
        Operand::Register(r) => Target::Cell(Address::Register(r)),
        Operand::Indirect(r) => Target::Cell(Address::Ram(mem.load(Address::Register(r)))),
        Operand::Indexed { register, next } => {
            let base = mem.load(Address::Register(register));
            Target::Cell(Address::Ram(next.wrapping_add(base)))
        }
        Operand::Pop => {
            let sp = mem.load(Address::StackPointer);
            mem.store(Address::StackPointer, sp.wrapping_add(1))?;
            Target::Cell(Address::Ram(sp))
        }
        Operand::Peek => Target::Cell(Address::Ram(mem.load(Address::StackPointer))),
        Operand::Push => {
            let sp = mem.load(Address::StackPointer).wrapping_sub(1);
            mem.store(Address::StackPointer, sp)?;
            Target::Cell(Address::Ram(sp))
        }
        Operand::StackPointer => Target::Cell(Address::StackPointer),
        Operand::ProgramCounter => Target::Cell(Address::ProgramCounter),
        Operand::Overflow => Target::Cell(Address::Overflow),
        Operand::Direct(next) => Target::Cell(Address::Ram(next)),
        Operand::Literal(v) => Target::Value(v),
    };
    Ok(target)
}

/// the value written to `a` and the new O, if the opcode sets one
fn arithmetic(opcode: Opcode, a: Word, b: Word) -> (Word, Option<Word>) {
    let (a32, b32) = (a as u32, b as u32);
    match opcode {
        Opcode::Set => (b, None),
        Opcode::Add => {
            let (v, carry) = a.overflowing_add(b);
            (v, Some(carry as Word))
        }
        Opcode::Sub => {
            let (v, borrow) = a.overflowing_sub(b);
            (v, Some(if borrow { 0xffff } else { 0 }))
        }
        Opcode::Mul => {
            let v = a32 * b32;
            (v as Word, Some((v >> 16) as Word))
        }
        Opcode::Div => match b {
            0 => (0, Some(0)),
            _ => (a / b, Some(((a32 << 16) / b32) as Word)),
        },
        Opcode::Mod => match b {
            0 => (0, None),
            _ => (a % b, None),
        },
        Opcode::Shl => {
            let v = a32.checked_shl(b32).unwrap_or(0);
            (v as Word, Some((v >> 16) as Word))
        }
        Opcode::Shr => {
            let v = a32.checked_shr(b32).unwrap_or(0);
            let o = (a32 << 16).checked_shr(b32).unwrap_or(0);
            (v as Word, Some(o as Word))
        }
        Opcode::And => (a & b, None),
        Opcode::Bor => (a | b, None),
        Opcode::Xor => (a ^ b, None),
        Opcode::Ife | Opcode::Ifn | Opcode::Ifg | Opcode::Ifb | Opcode::Jsr => {
            unreachable!("{:?} doesn't write a result", opcode)
        }
    }
}

fn condition(opcode: Opcode, a: Word, b: Word) -> bool {
    match opcode {
        Opcode::Ife => a == b,
        Opcode::Ifn => a != b,
        Opcode::Ifg => a > b,
        Opcode::Ifb => a & b != 0,
        Opcode::Set
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Shl
        | Opcode::Shr
        | Opcode::And
        | Opcode::Bor
        | Opcode::Xor
        | Opcode::Jsr => unreachable!("{:?} isn't a test", opcode),
    }
}

/// decode the instruction at `pc` without touching anything
pub fn fetch<M: Memory + ?Sized>(mem: &M, pc: Word) -> Result<Instruction> {
    let word = mem.load(Address::Ram(pc));
    instruction::decode(word, |n| mem.load(Address::Ram(pc.wrapping_add(n))))
        .ok_or(Error::InvalidOpcode { pc, word })
}

/// move PC past the instruction it currently points at
fn skip<M: Memory + ?Sized>(mem: &mut M) -> Result<()> {
    let pc = mem.load(Address::ProgramCounter);
    let len = instruction::length(mem.load(Address::Ram(pc)));
    mem.store(Address::ProgramCounter, pc.wrapping_add(len))
}

/// Holds on to the first store error of an instruction and carries on, so an
/// instruction is never left half done. Only the memory's own follow-up
/// (e.g. telling a display) can fail; the write has happened regardless.
struct Deferred<'m, M: Memory + ?Sized> {
    mem: &'m mut M,
    error: Option<Error>,
}

impl<'m, M: Memory + ?Sized> Deferred<'m, M> {
    fn new(mem: &'m mut M) -> Self {
        Deferred { mem, error: None }
    }

    fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<M: Memory + ?Sized> Memory for Deferred<'_, M> {
    fn load(&self, addr: Address) -> Word {
        self.mem.load(addr)
    }

    fn store(&mut self, addr: Address, value: Word) -> Result<()> {
        if let Err(e) = self.mem.store(addr, value) {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
        Ok(())
    }
}

/// Run one instruction. If a store fails along the way, the rest of the
/// instruction still happens and the first failure is returned at the end.
pub fn step<M: Memory + ?Sized>(mem: &mut M) -> Result<()> {
    let mut deferred = Deferred::new(mem);
    execute(&mut deferred)?;
    deferred.finish()
}

fn execute<M: Memory + ?Sized>(mem: &mut M) -> Result<()> {
    let pc = mem.load(Address::ProgramCounter);
    let instruction = fetch(&*mem, pc)?;
    trace!(pc, ?instruction, "step");
    mem.store(Address::ProgramCounter, pc.wrapping_add(instruction.len))?;

    let a = resolve(mem, instruction.a)?;
    match (instruction.opcode, instruction.b) {
        (Opcode::Jsr, _) => {
            let target = load(&*mem, a);
            let ret = mem.load(Address::ProgramCounter);
            let sp = mem.load(Address::StackPointer).wrapping_sub(1);
            mem.store(Address::StackPointer, sp)?;
            mem.store(Address::Ram(sp), ret)?;
            mem.store(Address::ProgramCounter, target)
        }
        (opcode, Some(b)) => {
            let b = resolve(mem, b)?;
            let (av, bv) = (load(&*mem, a), load(&*mem, b));
            if opcode.is_conditional() {
                if condition(opcode, av, bv) {
                    Ok(())
                } else {
                    skip(mem)
                }
            } else {
                let (result, overflow) = arithmetic(opcode, av, bv);
                store(mem, a, result)?;
                match overflow {
                    Some(o) => mem.store(Address::Overflow, o),
                    None => Ok(()),
                }
            }
        }
        (opcode, None) => unreachable!("basic opcode {:?} decoded without b", opcode),
    }
}

/// Run up to `budget` instructions. Returns how many ran, or the first error;
/// on error everything done by earlier instructions stays done.
pub fn run<M: Memory + ?Sized>(mem: &mut M, budget: u64) -> Result<u64> {
    for n in 0..budget {
        if let Err(e) = step(mem) {
            debug!(steps = n, error = %e, "run stopped");
            return Err(e);
        }
    }
    Ok(budget)
}
