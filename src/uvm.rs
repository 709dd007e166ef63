//! Structures and functions for the Universal Virtual Machine, the register
//! machine this crate interprets.

use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

use prettytable::{format as TableFormat, Table};

use crate::bytecode::{decode_instruction, Instruction, Operation, RegisterIndex, Word};
use crate::fault::{Fault, UvmResult};
use crate::memory::{SegmentStore, PROGRAM_SEGMENT};

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// The value Input stores when the host byte stream is exhausted.
pub const END_OF_STREAM: Word = Word::MAX;

/// The observable execution states of the machine. The only transitions are
/// `Running` to `Halted` (a Halt instruction) and `Running` to `Faulted`
/// (any fault); both are terminal.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MachineState {
  Running,
  Halted,
  Faulted,
}

impl Display for MachineState {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      MachineState::Running => {
        write!(f, "Running")
      },
      MachineState::Halted => {
        write!(f, "Halted")
      },
      MachineState::Faulted => {
        write!(f, "Faulted")
      }
    }
  }
}

pub struct UVM<R: Read, W: Write> {

  // Machine state //
  registers : [Word; REGISTER_COUNT], // General purpose registers
  ip        : Word,                   // Offset of the next fetch into the program segment
  store     : SegmentStore,           // Owner of every live segment
  state     : MachineState,

  // Host collaborators //
  input  : R, // Byte reader consumed by Input
  output : W, // Byte writer fed by Output

  // For tracing computations //
  trace : bool,

}

impl<R: Read, W: Write> UVM<R, W> {

  // region Construction and accessors

  /**
    Boots a machine over `program` with every register and the instruction
    pointer zeroed. The host supplies the byte reader and writer behind the
    Input and Output operations; the machine performs exactly one host call
    per Input or Output and buffers nothing itself.
  */
  pub fn new(program: Vec<Word>, input: R, output: W) -> UVM<R, W> {
    UVM {
      registers : [0; REGISTER_COUNT],
      ip        : 0,
      store     : SegmentStore::new(program),
      state     : MachineState::Running,
      input,
      output,
      trace     : false,
    }
  }

  /// The offset of the next fetch into the program segment.
  pub fn ip(&self) -> Word {
    self.ip
  }

  pub fn state(&self) -> MachineState {
    self.state
  }

  /// A view of the register file, mostly useful to hosts that trace.
  pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
    &self.registers
  }

  /// Enables or disables per-instruction tracing to the host error stream.
  pub fn set_trace(&mut self, trace: bool) {
    self.trace = trace;
  }

  // endregion

  // region VM control methods

  /**
    Runs the dispatch loop until the program halts or a fault is raised. A
    fault is recorded in the machine state and returned; the caller owns
    surfacing it together with `ip()`.
  */
  pub fn run(&mut self) -> UvmResult<()> {
    while self.state == MachineState::Running {
      self.step()?;
    }
    Ok(())
  }

  /**
    Fetches, decodes, and executes a single instruction, returning the
    resulting machine state. Between any two calls the machine is quiescent:
    every effect of the previous instruction has been committed, which makes
    this the host's cooperative cancellation point. Stepping a terminal
    machine is a no-op.
  */
  pub fn step(&mut self) -> UvmResult<MachineState> {
    if self.state != MachineState::Running {
      return Ok(self.state);
    }

    match self.cycle() {
      Ok(())     => Ok(self.state),
      Err(fault) => {
        self.state = MachineState::Faulted;
        Err(fault)
      }
    }
  }

  /// One fetch-decode-execute cycle.
  fn cycle(&mut self) -> UvmResult<()> {
    let length = self.store.length(PROGRAM_SEGMENT)?;
    if self.ip >= length {
      return Err(Fault::InstructionPointerOutOfBounds { ip: self.ip, length });
    }

    let word = self.store.load(PROGRAM_SEGMENT, self.ip)?;
    // `ip` advances before execution so that Load-Program can overwrite it.
    self.ip += 1;

    let instruction = decode_instruction(word)?;

    if self.trace {
      eprintln!("[{:>10}] {}", self.ip - 1, instruction);
    }

    self.exec(&instruction)
  }

  /**
    Executes a single decoded instruction. Every effect is committed before
    this returns; a fault leaves the registers and store exactly as the
    faulting instruction found them.
  */
  fn exec(&mut self, instruction: &Instruction) -> UvmResult<()> {
    use Operation::*;

    match instruction {

      Instruction::Triple { opcode, a, b, c } => {
        match opcode {
          ConditionalMove => {
            if self.reg(*c) != 0 {
              self.set_reg(*a, self.reg(*b));
            }
          }
          ArrayIndex => {
            let word = self.store.load(self.reg(*b), self.reg(*c))?;
            self.set_reg(*a, word);
          }
          ArrayAmend => {
            // Amending the program segment is legal self-modification; the
            // next fetch sees the updated word.
            self.store.store(self.reg(*a), self.reg(*b), self.reg(*c))?;
          }
          Add => {
            self.set_reg(*a, self.reg(*b).wrapping_add(self.reg(*c)));
          }
          Multiply => {
            self.set_reg(*a, self.reg(*b).wrapping_mul(self.reg(*c)));
          }
          Divide => {
            match self.reg(*c) {
              0       => { return Err(Fault::DivideByZero); }
              divisor => { self.set_reg(*a, self.reg(*b) / divisor); }
            }
          }
          NotAnd => {
            self.set_reg(*a, !(self.reg(*b) & self.reg(*c)));
          }
          Halt => {
            self.state = MachineState::Halted;
          }
          Allocate => {
            let id = self.store.allocate(self.reg(*c))?;
            self.set_reg(*b, id);
          }
          Abandon => {
            self.store.abandon(self.reg(*c))?;
          }
          Output => {
            self.write_byte(self.reg(*c))?;
          }
          Input => {
            let value = self.read_byte()?;
            self.set_reg(*c, value);
          }
          LoadProgram => {
            self.load_program(self.reg(*b), self.reg(*c))?;
          }
          LoadConstant => {
            unreachable!("Error: {} was decoded as a register triple.", opcode);
          }
        }
      }

      Instruction::Constant { a, value } => {
        self.set_reg(*a, *value);
      }

    }

    Ok(())
  }

  // endregion

  // region VM instruction methods

  /**
    The Load-Program operation. A source of 0 is a plain jump, the machine's
    sole control flow mechanism, so no copy happens on that path. Any other
    source is copied wholesale over the program segment, which frees the old
    program and leaves the source live and independently mutable.
  */
  fn load_program(&mut self, source: Word, target: Word) -> UvmResult<()> {
    if source != PROGRAM_SEGMENT {
      let words = self.store.duplicate(source)?;
      self.store.install_program(words);
    }
    self.ip = target;
    Ok(())
  }

  /// Emits the byte in `value` to the host writer.
  fn write_byte(&mut self, value: Word) -> UvmResult<()> {
    if value > 0xFF {
      return Err(Fault::OutputOutOfRange(value));
    }
    let buffer = [value as u8];
    self.output.write_all(&buffer)?;
    Ok(())
  }

  /// Reads one byte from the host reader. End of stream becomes the
  /// all-ones sentinel; anything else the host reports is a fault.
  fn read_byte(&mut self) -> UvmResult<Word> {
    let mut buffer = [0u8; 1];
    match self.input.read(&mut buffer)? {
      0 => Ok(END_OF_STREAM),
      _ => Ok(buffer[0] as Word)
    }
  }

  // endregion

  // region Low-level utility methods

  /// The value of register `r`. Decoding confines `r` to `0..8`.
  fn reg(&self, r: RegisterIndex) -> Word {
    self.registers[r as usize]
  }

  fn set_reg(&mut self, r: RegisterIndex, value: Word) {
    self.registers[r as usize] = value;
  }

  // endregion

}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<R: Read, W: Write> Display for UVM<R, W> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, value) in self.registers.iter().enumerate() {
      table.add_row(row![r->format!("R[{}] =", i), format!("{:#010x}", value)]);
    }
    table.add_row(row![r->"ip =", format!("{}", self.ip)]);

    write!(f, "State: {}\n{}", self.state, table)
  }
}
