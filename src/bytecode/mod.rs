/*!

  The machine uses a 32 bit unsigned word as its unit of both code and data.
  Every instruction occupies exactly one word, and the top 4 bits name the
  operation. Operations 0 through 12 select three registers with the low nine
  bits; operation 13 packs a register selector and a 25 bit unsigned
  immediate. The sizes of the instruction components are as follows:

    Opcode:    4 bits
    Register:  3 bits
    Immediate: 25 bits

  and the two instruction layouts are

    [OpCode:4][Unused:19][A:3][B:3][C:3]     operations 0 through 12
    [OpCode:4][A:3][Immediate:25]            operation 13

  Images on disk store one word per 4 byte group in big-endian order; see
  `crate::image` for the loader. In memory a word is a plain `u32`, so
  decoding is a handful of shifts and masks per instruction.

*/

mod instruction;

pub use instruction::{
  decode_instruction, encode_instruction, Instruction, Operation, RegisterIndex, Word,
  IMMEDIATE_MASK,
};
