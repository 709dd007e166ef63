/*!

  Loading of program images. An image is a flat binary file whose length is a
  positive multiple of 4; each consecutive 4 byte group is one program word,
  most significant byte first, regardless of host byte order. The decoded
  word sequence becomes the program segment at boot.

*/

use std::fs::File;
use std::io::Read;
use std::path::Path;

use nom::combinator::all_consuming;
use nom::multi::many1;
use nom::number::complete::be_u32;
use nom::IResult;

use crate::bytecode::Word;
use crate::fault::{Fault, UvmResult};

/// Parses the byte stream of an image into program words.
fn words(input: &[u8]) -> IResult<&[u8], Vec<Word>> {
  many1(be_u32)(input)
}

/**
  Converts the raw bytes of an image into program words. The length must be
  a positive multiple of 4; anything else is rejected as `InvalidImageSize`
  before the machine boots.
*/
pub fn decode_image(bytes: &[u8]) -> UvmResult<Vec<Word>> {
  if bytes.is_empty() || bytes.len() % 4 != 0 {
    return Err(Fault::InvalidImageSize(bytes.len() as u64));
  }

  match all_consuming(words)(bytes) {
    Ok((_rest, program)) => Ok(program),
    // Not reachable once the length check has passed.
    Err(_e)              => Err(Fault::InvalidImageSize(bytes.len() as u64))
  }
}

/// Reads an image file from disk and decodes it.
pub fn read_image<P: AsRef<Path>>(path: P) -> UvmResult<Vec<Word>> {
  let mut bytes = Vec::new();
  File::open(path)?.read_to_end(&mut bytes)?;
  decode_image(&bytes)
}
