// Some of the machine's surface (the instruction encoder, the stepping API)
// exists for tests and embedding hosts rather than this binary.
#![allow(dead_code)]

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

mod bytecode;
mod fault;
mod image;
mod memory;
mod uvm;

use std::env;
use std::io;
use std::process::exit;

use crate::uvm::UVM;

/// `UVM_DEBUG` enables per-instruction tracing when set to anything other
/// than the empty string, `0`, or `false`.
fn trace_enabled() -> bool {
  match env::var("UVM_DEBUG") {
    Ok(value) => {
      !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
    }
    Err(_e) => false
  }
}

fn main() {
  let mut args = env::args();
  let program_name = args.next().unwrap_or_else(|| String::from("uvm"));

  let image_path = match args.next() {
    Some(path) => path,
    None => {
      eprintln!("usage: {} <image-path>", program_name);
      exit(2);
    }
  };

  let program = match image::read_image(&image_path) {
    Ok(words)  => words,
    Err(fault) => {
      eprintln!("{}: {}: {}", program_name, image_path, fault);
      exit(1);
    }
  };

  let trace  = trace_enabled();
  let stdin  = io::stdin();
  let stdout = io::stdout();

  let mut machine = UVM::new(program, stdin.lock(), stdout.lock());
  machine.set_trace(trace);

  match machine.run() {
    Ok(()) => {}

    Err(fault) => {
      eprintln!("{}: fault at ip {}: {}", program_name, machine.ip(), fault);
      if trace {
        eprintln!("{}", machine);
      }
      exit(1);
    }
  }
}
