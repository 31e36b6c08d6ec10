//! DCPU-16 (1.1) instruction decoding.
//!
//! A basic instruction word is laid out `bbbbbbaaaaaaoooo`: a 4-bit opcode and
//! two 6-bit operands. Opcode 0 marks a non-basic instruction, where the `a`
//! bits hold a 6-bit extended opcode and the `b` bits hold its only operand.
//!
//! Decoding is pure; turning an [`Operand`] into an actual location (which
//! may move SP) is the interpreter's job.

use crate::memory::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    Bor,
    Xor,
    Ife,
    Ifn,
    Ifg,
    Ifb,
    /// non-basic: push the return address and jump
    Jsr,
}

impl Opcode {
    /// the IF* family skip the next instruction when their test fails
    pub fn is_conditional(&self) -> bool {
        matches!(self, Opcode::Ife | Opcode::Ifn | Opcode::Ifg | Opcode::Ifb)
    }
}

/// One operand, as written in the instruction. `next` fields are the extra
/// word that follows the instruction, already fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// 0x00-0x07: register
    Register(u8),
    /// 0x08-0x0f: [register]
    Indirect(u8),
    /// 0x10-0x17: [next word + register]
    Indexed { register: u8, next: Word },
    /// 0x18: [SP++]
    Pop,
    /// 0x19: [SP]
    Peek,
    /// 0x1a: [--SP]
    Push,
    /// 0x1b
    StackPointer,
    /// 0x1c
    ProgramCounter,
    /// 0x1d
    Overflow,
    /// 0x1e: [next word]
    Direct(Word),
    /// 0x1f: next word, and 0x20-0x3f: 0x00-0x1f
    Literal(Word),
}

impl Operand {
    /// does this operand code consume a word after the instruction
    pub fn needs_next_word(code: Word) -> bool {
        matches!(code, 0x10..=0x17 | 0x1e | 0x1f)
    }

    /// `next` is only looked at when `needs_next_word(code)`
    pub fn decode(code: Word, next: Word) -> Operand {
        let code = code & 0x3f;
        match code {
            0x00..=0x07 => Operand::Register(code as u8),
            0x08..=0x0f => Operand::Indirect((code - 0x08) as u8),
            0x10..=0x17 => Operand::Indexed {
                register: (code - 0x10) as u8,
                next,
            },
            0x18 => Operand::Pop,
            0x19 => Operand::Peek,
            0x1a => Operand::Push,
            0x1b => Operand::StackPointer,
            0x1c => Operand::ProgramCounter,
            0x1d => Operand::Overflow,
            0x1e => Operand::Direct(next),
            0x1f => Operand::Literal(next),
            _ => Operand::Literal(code - 0x20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a: Operand,
    /// absent for non-basic instructions
    pub b: Option<Operand>,
    /// instruction word plus any next words
    pub len: Word,
}

fn opcode_bits(word: Word) -> Word {
    word & 0xf
}

fn a_bits(word: Word) -> Word {
    (word >> 4) & 0x3f
}

fn b_bits(word: Word) -> Word {
    (word >> 10) & 0x3f
}

/// How many words the instruction starting with `word` occupies. Works for
/// any word, valid or not, so skipping never needs a full decode.
pub fn length(word: Word) -> Word {
    let next_words = |code| Operand::needs_next_word(code) as Word;
    if opcode_bits(word) == 0 {
        1 + next_words(b_bits(word))
    } else {
        1 + next_words(a_bits(word)) + next_words(b_bits(word))
    }
}

/// Decode the instruction starting with `word`. `next_word(i)` fetches the
/// i'th word after it and is called only for operands that need one, `a`'s
/// before `b`'s. Returns `None` for opcodes the DCPU-16 doesn't define.
pub fn decode(word: Word, mut next_word: impl FnMut(Word) -> Word) -> Option<Instruction> {
    let mut cursor: Word = 0;
    let mut operand = |code: Word| {
        let next = if Operand::needs_next_word(code) {
            cursor += 1;
            next_word(cursor)
        } else {
            0
        };
        Operand::decode(code, next)
    };

    let (opcode, a, b) = match opcode_bits(word) {
        0x0 => match a_bits(word) {
            0x01 => (Opcode::Jsr, operand(b_bits(word)), None),
            _ => return None,
        },
        op => {
            let opcode = match op {
                0x1 => Opcode::Set,
                0x2 => Opcode::Add,
                0x3 => Opcode::Sub,
                0x4 => Opcode::Mul,
                0x5 => Opcode::Div,
                0x6 => Opcode::Mod,
                0x7 => Opcode::Shl,
                0x8 => Opcode::Shr,
                0x9 => Opcode::And,
                0xa => Opcode::Bor,
                0xb => Opcode::Xor,
                0xc => Opcode::Ife,
                0xd => Opcode::Ifn,
                0xe => Opcode::Ifg,
                _ => Opcode::Ifb,
            };
            let a = operand(a_bits(word));
            let b = operand(b_bits(word));
            (opcode, a, Some(b))
        }
    };
    Some(Instruction {
        opcode,
        a,
        b,
        len: 1 + cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_next_word(_: Word) -> Word {
        panic!("didn't expect a next word")
    }

    #[test]
    fn test_decode_set_register_literal() {
        // SET I, 9
        let i = decode(0xa461, no_next_word).unwrap();
        assert_eq!(i.opcode, Opcode::Set);
        assert_eq!(i.a, Operand::Register(6));
        assert_eq!(i.b, Some(Operand::Literal(9)));
        assert_eq!(i.len, 1);
    }

    #[test]
    fn test_decode_set_from_pc() {
        // SET A, PC
        let i = decode(0x7001, no_next_word).unwrap();
        assert_eq!(i.a, Operand::Register(0));
        assert_eq!(i.b, Some(Operand::ProgramCounter));
    }

    #[test]
    fn test_decode_sub_literal() {
        // SUB A, 1
        let i = decode(0x8403, no_next_word).unwrap();
        assert_eq!(i.opcode, Opcode::Sub);
        assert_eq!(i.b, Some(Operand::Literal(1)));
    }

    #[test]
    fn test_decode_next_words_in_order() {
        // SET [0x1000], 0x20
        let words = [0x1000, 0x0020];
        let i = decode(0x7de1, |n| words[n as usize - 1]).unwrap();
        assert_eq!(i.a, Operand::Direct(0x1000));
        assert_eq!(i.b, Some(Operand::Literal(0x0020)));
        assert_eq!(i.len, 3);
        assert_eq!(length(0x7de1), 3);
    }

    #[test]
    fn test_decode_indexed() {
        // SET [0x2000+I], [A]
        let i = decode(0x2161, |_| 0x2000).unwrap();
        assert_eq!(
            i.a,
            Operand::Indexed {
                register: 6,
                next: 0x2000
            }
        );
        assert_eq!(i.b, Some(Operand::Indirect(0)));
        assert_eq!(i.len, 2);
    }

    #[test]
    fn test_decode_stack_operands() {
        // SET PUSH, POP
        let i = decode(0x61a1, no_next_word).unwrap();
        assert_eq!(i.a, Operand::Push);
        assert_eq!(i.b, Some(Operand::Pop));
        // SET SP, PEEK
        let i = decode(0x65b1, no_next_word).unwrap();
        assert_eq!(i.a, Operand::StackPointer);
        assert_eq!(i.b, Some(Operand::Peek));
    }

    #[test]
    fn test_decode_jsr() {
        // JSR 0x0018
        let i = decode(0x7c10, |_| 0x0018).unwrap();
        assert_eq!(i.opcode, Opcode::Jsr);
        assert_eq!(i.a, Operand::Literal(0x0018));
        assert_eq!(i.b, None);
        assert_eq!(i.len, 2);
    }

    #[test]
    fn test_reserved_opcodes_rejected() {
        assert_eq!(decode(0x0000, no_next_word), None);
        // non-basic 0x02
        assert_eq!(decode(0x0020, no_next_word), None);
        // non-basic 0x3f with a next-word operand: still nothing fetched
        assert_eq!(decode(0x7ff0, no_next_word), None);
    }

    #[test]
    fn test_length_of_invalid_word() {
        assert_eq!(length(0x0000), 1);
        assert_eq!(length(0x7ff0), 2);
    }

    #[test]
    fn test_conditionals() {
        assert!(Opcode::Ifb.is_conditional());
        assert!(!Opcode::Jsr.is_conditional());
    }
}
