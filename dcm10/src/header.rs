//! Low-level element and item header readers, per `spec.md` §4.4.
//!
//! Grounded in this project's `DataElementHeader`/`ValueLength` shapes, but
//! reworked for a blocking, seek-capable `Read` stream the way this
//! project's own synchronous-I/O sibling crate reads headers, rather than
//! the push-based streaming state machine this project's Part 10 reader
//! otherwise uses.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::dictionary;
use crate::error::Error;
use crate::log;
use crate::tag::{self, Tag};
use crate::vr::ValueRepresentation;

/// The 32-bit length sentinel meaning "undefined length", terminated by a
/// delimiter item/sequence tag instead of a byte count.
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// A decoded element header plus the number of bytes consumed reading it
/// (tag included), which callers use as the out-parameter `spec.md` §4.4
/// describes for tracking undefined-length consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementHeader {
  pub tag: Tag,
  pub vr: ValueRepresentation,
  pub length: u32,
  pub header_length: u32,
}

impl ElementHeader {
  pub fn is_undefined_length(&self) -> bool {
    self.length == UNDEFINED_LENGTH
  }
}

/// Reads two little-endian 16-bit words and composes the 32-bit tag.
pub fn read_tag<R: Read>(stream: &mut R) -> Result<Tag, Error> {
  let group = stream.read_u16::<LittleEndian>()?;
  let element = stream.read_u16::<LittleEndian>()?;
  Ok(Tag::new(group, element))
}

/// Reads one element header, dispatching on `implicit`.
pub fn read_element_header<R: Read>(
  stream: &mut R,
  implicit: bool,
) -> Result<ElementHeader, Error> {
  let tag = read_tag(stream)?;

  if !dictionary::is_valid_tag(tag) {
    log::error(&format!("rejecting element header: {tag} is not a valid tag"));
    return Err(Error::InvalidTag { tag });
  }

  if implicit {
    let length = stream.read_u32::<LittleEndian>()?;
    let vr = crate::dictionary::lookup_vr(tag);
    return Ok(ElementHeader { tag, vr, length, header_length: 8 });
  }

  let mut vr_bytes = [0u8; 2];
  stream.read_exact(&mut vr_bytes)?;
  let vr = ValueRepresentation::from_bytes(vr_bytes).map_err(|()| {
    log::error(&format!(
      "rejecting element header at {tag}: invalid VR bytes {:?}",
      String::from_utf8_lossy(&vr_bytes)
    ));
    Error::InvalidVR { bytes: vr_bytes }
  })?;

  if vr.has_short_header() {
    let length = stream.read_u16::<LittleEndian>()? as u32;
    Ok(ElementHeader { tag, vr, length, header_length: 8 })
  } else {
    let mut reserved = [0u8; 2];
    stream.read_exact(&mut reserved)?;
    if reserved != [0, 0] {
      log::error(&format!(
        "rejecting element header: non-zero reserved bytes after VR {vr} at tag {tag}"
      ));
      return Err(Error::MalformedHeader {
        details: format!("non-zero reserved bytes after VR {vr} at tag {tag}"),
      });
    }

    let length = stream.read_u32::<LittleEndian>()?;
    Ok(ElementHeader { tag, vr, length, header_length: 12 })
  }
}

/// Reads one Item/Item-Delimiter/Sequence-Delimiter header: tag plus a
/// 32-bit length. Any other tag is a malformed header.
pub fn read_item_header<R: Read>(stream: &mut R) -> Result<(Tag, u32), Error> {
  let tag = read_tag(stream)?;

  if tag != tag::ITEM && tag != tag::ITEM_DELIMITER && tag != tag::SEQUENCE_DELIMITER {
    log::error(&format!("rejecting item header: {tag} is not a valid item/delimiter tag"));
    return Err(Error::MalformedHeader { details: format!("invalid item tag {tag}") });
  }

  let length = stream.read_u32::<LittleEndian>()?;
  Ok((tag, length))
}
