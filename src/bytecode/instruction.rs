/*!
  Representation of machine instructions abstractly and as binary words.
*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::fault::{Fault, UvmResult};

// If you change this you must also change `encode_instruction` and
// `decode_instruction`.
pub type Word = u32;

/// A register selector. Decoding masks these to 3 bits, so a selector is
/// always in `0..8`.
pub type RegisterIndex = u8;

/// Width of the `LoadConstant` immediate field.
pub const IMMEDIATE_BITS: u32 = 25;
/// Mask selecting the `LoadConstant` immediate field.
pub const IMMEDIATE_MASK: Word = (1 << IMMEDIATE_BITS) - 1;

const OPCODE_SHIFT  : u32  = 28;
const REGISTER_MASK : Word = 0b111;

/**
  Opcodes of the machine.

  The numeric value of each variant is the 4 bit tag naming it in an encoded
  instruction, so the order the opcodes are listed below is significant.
  `LoadConstant` is the only operation with the immediate layout; every
  operation before it selects registers.
*/
#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,     Debug, Hash
)]
#[repr(u8)]
pub enum Operation {
  ConditionalMove,   // if R[C] != 0 then R[A] <- R[B]
  ArrayIndex,        // R[A] <- segment[R[B]][R[C]]
  ArrayAmend,        // segment[R[A]][R[B]] <- R[C]
  Add,               // R[A] <- R[B] + R[C]
  Multiply,          // R[A] <- R[B] * R[C]
  Divide,            // R[A] <- R[B] / R[C]
  NotAnd,            // R[A] <- !(R[B] & R[C])
  Halt,              // stop the machine
  Allocate,          // R[B] <- identifier of a fresh segment of R[C] words
  Abandon,           // free segment R[C]
  Output,            // emit the byte in R[C] to the host
  Input,             // R[C] <- one host byte, or all ones at end of stream
  LoadProgram,       // copy segment R[B] over the program; ip <- R[C]
  LoadConstant,      // R[A] <- 25 bit immediate
  // Opcode 14
}

impl Operation {

  /// Gives the 4-bit numeric value that tags the operation in an encoded
  /// word. The tag is padded with zeros to make a `Word`.
  pub fn code(&self) -> Word {
    let value: u8 = (*self).into();
    value as Word
  }

}

/// Holds the unencoded components of an instruction. As such, it enumerates
/// the two instruction layouts of the machine.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Instruction {
  /// [OpCode:4][Unused:19][A:3][B:3][C:3]
  Triple {
    opcode : Operation,
    a      : RegisterIndex,
    b      : RegisterIndex,
    c      : RegisterIndex
  },
  /// [OpCode:4][A:3][Immediate:25]
  Constant {
    a     : RegisterIndex,
    value : Word
  },
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Triple { opcode, a, b, c } => {
        write!(f, "{}(R{}, R{}, R{})", opcode, a, b, c)
      }

      Instruction::Constant { a, value } => {
        write!(f, "{}(R{}, {:#x})", Operation::LoadConstant, a, value)
      }

    }
  }
}

/**
  Decodes a single word. The operand fields decode totally, as every 3 bit
  pattern selects a register; the only way a word fails to decode is a tag
  past `LoadConstant`, which is the `IllegalInstruction` fault.
*/
pub fn decode_instruction(word: Word) -> UvmResult<Instruction> {
  let tag = (word >> OPCODE_SHIFT) as u8;
  let opcode = match Operation::try_from(tag) {
    Ok(opcode) => opcode,
    Err(_e)    => { return Err(Fault::IllegalInstruction(tag)); }
  };

  let instruction = match opcode {

    Operation::LoadConstant => {
      Instruction::Constant {
        a     : ((word >> IMMEDIATE_BITS) & REGISTER_MASK) as RegisterIndex,
        value : word & IMMEDIATE_MASK
      }
    }

    _ => {
      Instruction::Triple {
        opcode,
        a: ((word >> 6) & REGISTER_MASK) as RegisterIndex,
        b: ((word >> 3) & REGISTER_MASK) as RegisterIndex,
        c: ( word       & REGISTER_MASK) as RegisterIndex
      }
    }

  };

  Ok(instruction)
}

/**
  Encodes the instruction into a word. It is the caller's responsibility to
  use `Instruction::Constant` for `LoadConstant` and `Instruction::Triple`
  for every other opcode; operand fields wider than their slots are masked.
*/
pub fn encode_instruction(instruction: &Instruction) -> Word {
  match instruction {

    Instruction::Triple { opcode, a, b, c } => {
      (opcode.code() << OPCODE_SHIFT)
        + (((*a as Word) & REGISTER_MASK) << 6)
        + (((*b as Word) & REGISTER_MASK) << 3)
        + ( (*c as Word) & REGISTER_MASK)
    }

    Instruction::Constant { a, value } => {
      (Operation::LoadConstant.code() << OPCODE_SHIFT)
        + (((*a as Word) & REGISTER_MASK) << IMMEDIATE_BITS)
        + (value & IMMEDIATE_MASK)
    }

  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn opcode_tags_follow_declaration_order() {
    assert_eq!(Operation::ConditionalMove.code(), 0);
    assert_eq!(Operation::Divide.code(), 5);
    assert_eq!(Operation::Halt.code(), 7);
    assert_eq!(Operation::LoadProgram.code(), 12);
    assert_eq!(Operation::LoadConstant.code(), 13);
  }

  #[test]
  fn decodes_register_triple() {
    // Add with A=0, B=1, C=1.
    let instruction = decode_instruction(0x3000_0009).unwrap();
    assert_eq!(
      instruction,
      Instruction::Triple { opcode: Operation::Add, a: 0, b: 1, c: 1 }
    );
  }

  #[test]
  fn decodes_halt() {
    let instruction = decode_instruction(0x7000_0000).unwrap();
    assert_eq!(
      instruction,
      Instruction::Triple { opcode: Operation::Halt, a: 0, b: 0, c: 0 }
    );
  }

  #[test]
  fn decodes_load_constant() {
    let instruction = decode_instruction(0xD000_0041).unwrap();
    assert_eq!(instruction, Instruction::Constant { a: 0, value: 0x41 });

    // Selector bits sit directly above the immediate.
    let instruction = decode_instruction(0xD200_0004).unwrap();
    assert_eq!(instruction, Instruction::Constant { a: 1, value: 4 });
  }

  #[test]
  fn immediate_is_confined_to_25_bits() {
    let instruction = decode_instruction(0xDFFF_FFFF).unwrap();
    assert_eq!(instruction, Instruction::Constant { a: 7, value: IMMEDIATE_MASK });
  }

  #[test]
  fn rejects_unknown_opcodes() {
    assert_eq!(decode_instruction(0xE000_0007), Err(Fault::IllegalInstruction(14)));
    assert_eq!(decode_instruction(0xF000_0000), Err(Fault::IllegalInstruction(15)));
  }

  #[test]
  fn encode_is_inverse_of_decode() {
    let triple = Instruction::Triple { opcode: Operation::NotAnd, a: 3, b: 5, c: 7 };
    assert_eq!(decode_instruction(encode_instruction(&triple)).unwrap(), triple);

    let constant = Instruction::Constant { a: 6, value: 0x123_4567 };
    assert_eq!(decode_instruction(encode_instruction(&constant)).unwrap(), constant);
  }

  #[test]
  fn encode_masks_oversized_operands() {
    // An immediate wider than 25 bits loses its high bits, not its tag.
    let word = encode_instruction(&Instruction::Constant { a: 0, value: 0xFFFF_FFFF });
    assert_eq!(word >> 28, Operation::LoadConstant.code());
    assert_eq!(
      decode_instruction(word).unwrap(),
      Instruction::Constant { a: 0, value: IMMEDIATE_MASK }
    );
  }
}
