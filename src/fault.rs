/*!

  The fault taxonomy of the machine. Every fault is terminal: the machine
  transitions to its `Faulted` state, nothing is recovered inside the VM, and
  the fault is surfaced to the host together with the instruction pointer at
  the time it was raised.

  `HostIo` and `OutOfHostMemory` are the only faults not attributable to the
  guest program; every other variant indicates a guest bug or a malformed
  image.

*/

use thiserror::Error;

use crate::bytecode::Word;

/// The result type threaded through the machine, the memory store, and the
/// image loader.
pub type UvmResult<T> = Result<T, Fault>;

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum Fault {

  /// The image length is not a positive multiple of 4. Raised before
  /// execution begins.
  #[error("image length {0} is not a positive multiple of 4 bytes")]
  InvalidImageSize(u64),

  /// A fetch found the instruction pointer at or past the end of the
  /// program segment.
  #[error("instruction pointer {ip} is outside the program segment (length {length})")]
  InstructionPointerOutOfBounds { ip: Word, length: Word },

  /// The top four bits of the fetched word name no operation.
  #[error("illegal instruction: opcode {0}")]
  IllegalInstruction(u8),

  /// An identifier that names no live segment was dereferenced or
  /// abandoned.
  #[error("segment {0} is not live")]
  InvalidSegment(Word),

  /// An indexed access landed past the end of a live segment.
  #[error("offset {offset} is outside segment {id} (length {length})")]
  SegmentOffsetOutOfBounds { id: Word, offset: Word, length: Word },

  /// Abandon was asked to free the program segment.
  #[error("cannot abandon the program segment")]
  AbandonSegmentZero,

  #[error("division by zero")]
  DivideByZero,

  /// Output executed with a register value that does not fit in a byte.
  #[error("output value {0:#x} does not fit in a byte")]
  OutputOutOfRange(Word),

  /// The host byte reader or writer failed.
  #[error("host i/o error: {0}")]
  HostIo(String),

  /// The host allocator refused a segment allocation.
  #[error("host refused an allocation of {0} words")]
  OutOfHostMemory(Word),

}

impl From<std::io::Error> for Fault {
  fn from(error: std::io::Error) -> Fault {
    Fault::HostIo(error.to_string())
  }
}
