//! VR-dispatched value decoder and recursive sequence/item reader — the
//! heart of the parser.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::data_set::DataSet;
use crate::error::Error;
use crate::header::{self, ElementHeader, UNDEFINED_LENGTH};
use crate::log;
use crate::sequence::Sequence;
use crate::tag;
use crate::value::{DataElementValue, Value};
use crate::vr::ValueRepresentation as VR;

/// Decodes the value that follows an already-read element header.
pub fn read_element<R: Read + Seek>(
  stream: &mut R,
  header: ElementHeader,
  implicit: bool,
) -> Result<DataElementValue, Error> {
  let vr = header.vr;

  let value = if vr.is_sequence() {
    Value::Sequence(read_sequence(stream, header.length, implicit)?)
  } else if vr.is_attribute_tag() {
    read_attribute_tag(stream, header.length)?
  } else if vr.is_numeric() {
    read_numeric(stream, vr, header.length)?
  } else if vr.is_character_string() {
    read_character_string(stream, vr, header.length)?
  } else if vr.is_binary_blob() {
    let mut bytes = vec![0u8; header.length as usize];
    stream.read_exact(&mut bytes)?;
    Value::Binary { vr, bytes: Rc::new(bytes) }
  } else {
    log::error(&format!("rejecting {}: unsupported VR {vr}", header.tag));
    return Err(Error::UnsupportedVR { vr: vr.name().to_string() });
  };

  Ok(DataElementValue::new(header.tag, value))
}

fn read_attribute_tag<R: Read>(stream: &mut R, length: u32) -> Result<Value, Error> {
  let count = length as usize / 4;
  let mut tags = Vec::with_capacity(count);
  for _ in 0..count {
    tags.push(header::read_tag(stream)?);
  }
  Ok(Value::AttributeTag(tags))
}

/// Character strings: read `length` bytes, strip a single trailing pad byte
/// (whitespace for most VRs, NUL for UI, matching how this project's own
/// value module pads on the write side), then split on `\`.
fn read_character_string<R: Read>(stream: &mut R, vr: VR, length: u32) -> Result<Value, Error> {
  let mut bytes = vec![0u8; length as usize];
  stream.read_exact(&mut bytes)?;

  match bytes.last() {
    Some(b' ') if vr != VR::UniqueIdentifier => {
      bytes.pop();
    }
    Some(0u8) if vr == VR::UniqueIdentifier => {
      bytes.pop();
    }
    _ => (),
  }

  let raw = String::from_utf8_lossy(&bytes).into_owned();
  Value::character_string(vr, &raw)
}

fn read_numeric<R: Read>(stream: &mut R, vr: VR, length: u32) -> Result<Value, Error> {
  let size = vr.numeric_element_size().unwrap();
  if length as usize % size != 0 {
    log::error(&format!(
      "rejecting {vr} value: length {length} is not a multiple of element size {size}"
    ));
    return Err(Error::MalformedValue {
      details: format!("{vr} length {length} is not a multiple of element size {size}"),
    });
  }
  let count = length as usize / size;

  Ok(match vr {
    VR::FloatingPointDouble => Value::FloatingPointDouble(
      (0..count)
        .map(|_| stream.read_f64::<LittleEndian>())
        .collect::<Result<Vec<f64>, std::io::Error>>()?,
    ),
    VR::FloatingPointSingle => Value::FloatingPointSingle(
      (0..count)
        .map(|_| stream.read_f32::<LittleEndian>())
        .collect::<Result<Vec<f32>, std::io::Error>>()?,
    ),
    VR::SignedShort => Value::SignedShort(
      (0..count)
        .map(|_| stream.read_i16::<LittleEndian>())
        .collect::<Result<Vec<i16>, std::io::Error>>()?,
    ),
    VR::SignedLong => Value::SignedLong(
      (0..count)
        .map(|_| stream.read_i32::<LittleEndian>())
        .collect::<Result<Vec<i32>, std::io::Error>>()?,
    ),
    VR::SignedVeryLong => Value::SignedVeryLong(
      (0..count)
        .map(|_| stream.read_i64::<LittleEndian>())
        .collect::<Result<Vec<i64>, std::io::Error>>()?,
    ),
    VR::UnsignedShort => Value::UnsignedShort(
      (0..count)
        .map(|_| stream.read_u16::<LittleEndian>())
        .collect::<Result<Vec<u16>, std::io::Error>>()?,
    ),
    VR::UnsignedLong => Value::UnsignedLong(
      (0..count)
        .map(|_| stream.read_u32::<LittleEndian>())
        .collect::<Result<Vec<u32>, std::io::Error>>()?,
    ),
    VR::UnsignedVeryLong => Value::UnsignedVeryLong(
      (0..count)
        .map(|_| stream.read_u64::<LittleEndian>())
        .collect::<Result<Vec<u64>, std::io::Error>>()?,
    ),
    _ => unreachable!("not a numeric VR: {vr}"),
  })
}

/// Reads a Sequence value: a defined-length regime consumes exactly
/// `length` bytes of items; an undefined-length regime consumes items
/// until a Sequence Delimiter is seen. Naturally recursive — `spec.md` §9
/// notes this MAY become an explicit work-stack on stack-constrained
/// targets, but semantics are unchanged either way.
fn read_sequence<R: Read + Seek>(
  stream: &mut R,
  length: u32,
  implicit: bool,
) -> Result<Sequence, Error> {
  let mut sequence = Sequence::create();

  if length != UNDEFINED_LENGTH {
    let end = stream.stream_position()? + length as u64;
    while stream.stream_position()? < end {
      match read_sequence_item(stream, implicit)? {
        Some(item) => sequence.append(item)?,
        None => break,
      }
    }
  } else {
    while let Some(item) = read_sequence_item(stream, implicit)? {
      sequence.append(item)?;
    }
  }

  sequence.lock();
  Ok(sequence)
}

/// Reads one Item, or `None` if a Sequence Delimiter was seen instead.
fn read_sequence_item<R: Read + Seek>(
  stream: &mut R,
  implicit: bool,
) -> Result<Option<DataSet>, Error> {
  let (item_tag, item_length) = header::read_item_header(stream)?;

  if item_tag == tag::SEQUENCE_DELIMITER {
    return Ok(None);
  }
  if item_tag != tag::ITEM {
    log::error(&format!("rejecting sequence body: expected Item, found {item_tag}"));
    return Err(Error::UnexpectedTag { expected: "Item".to_string(), tag: item_tag });
  }

  let mut item = DataSet::create();

  if item_length != UNDEFINED_LENGTH {
    // Defined-length items are byte-counted only: an Item Delimiter is
    // never checked for inside them (spec.md §9 Open Questions).
    let end = stream.stream_position()? + item_length as u64;
    while stream.stream_position()? < end {
      let header = header::read_element_header(stream, implicit)?;
      let element = read_element(stream, header, implicit)?;
      item.insert(element)?;
    }
  } else {
    loop {
      let next_tag = header::read_tag(stream)?;
      if next_tag == tag::ITEM_DELIMITER {
        stream.read_u32::<LittleEndian>()?; // delimiter's always-zero length
        break;
      }

      // Not a delimiter: rewind the 4 tag bytes just peeked and read the
      // element header properly from the start.
      stream.seek(SeekFrom::Current(-4))?;
      let header = header::read_element_header(stream, implicit)?;
      let element = read_element(stream, header, implicit)?;
      item.insert(element)?;
    }
  }

  item.lock();
  Ok(Some(item))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  fn explicit_short_header(group: u16, element: u16, vr: &[u8; 2], value: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(vr);
    bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
    bytes.extend_from_slice(value);
    bytes
  }

  #[test]
  fn decodes_multi_valued_code_string() {
    let bytes = explicit_short_header(0x0008, 0x0060, b"CS", b"A\\B\\C");
    let mut cursor = Cursor::new(bytes);
    let header = header::read_element_header(&mut cursor, false).unwrap();
    let element = read_element(&mut cursor, header, false).unwrap();

    assert_eq!(element.vm(), 3);
    assert_eq!(
      element.value.strings().unwrap(),
      &["A".to_string(), "B".to_string(), "C".to_string()]
    );
  }

  #[test]
  fn short_text_with_backslash_is_malformed_value() {
    let bytes = explicit_short_header(0x0008, 0x0104, b"ST", b"A\\B");
    let mut cursor = Cursor::new(bytes);
    let header = header::read_element_header(&mut cursor, false).unwrap();
    let err = read_element(&mut cursor, header, false).unwrap_err();
    assert!(matches!(err, Error::MalformedValue { .. }));
  }

  #[test]
  fn decodes_numeric_array() {
    let mut value = vec![];
    value.extend_from_slice(&1u16.to_le_bytes());
    value.extend_from_slice(&2u16.to_le_bytes());
    let bytes = explicit_short_header(0x0028, 0x0010, b"US", &value);

    let mut cursor = Cursor::new(bytes);
    let header = header::read_element_header(&mut cursor, false).unwrap();
    let element = read_element(&mut cursor, header, false).unwrap();

    match element.value {
      Value::UnsignedShort(values) => assert_eq!(values, vec![1, 2]),
      other => panic!("expected UnsignedShort, got {other:?}"),
    }
  }

  #[test]
  fn decodes_undefined_length_sequence_with_undefined_length_item() {
    let mut bytes = vec![];

    // SQ header, explicit VR, undefined length.
    bytes.extend_from_slice(&0x0008u16.to_le_bytes());
    bytes.extend_from_slice(&0x1140u16.to_le_bytes());
    bytes.extend_from_slice(b"SQ");
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&UNDEFINED_LENGTH.to_le_bytes());

    // Item, undefined length.
    bytes.extend_from_slice(&tag::ITEM.group.to_le_bytes());
    bytes.extend_from_slice(&tag::ITEM.element.to_le_bytes());
    bytes.extend_from_slice(&UNDEFINED_LENGTH.to_le_bytes());

    // One CS element inside the item.
    bytes.extend_from_slice(&explicit_short_header(0x0008, 0x0060, b"CS", b"OT"));

    // Item Delimiter.
    bytes.extend_from_slice(&tag::ITEM_DELIMITER.group.to_le_bytes());
    bytes.extend_from_slice(&tag::ITEM_DELIMITER.element.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    // Sequence Delimiter.
    bytes.extend_from_slice(&tag::SEQUENCE_DELIMITER.group.to_le_bytes());
    bytes.extend_from_slice(&tag::SEQUENCE_DELIMITER.element.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let mut cursor = Cursor::new(bytes);
    let header = header::read_element_header(&mut cursor, false).unwrap();
    let element = read_element(&mut cursor, header, false).unwrap();

    let seq = element.value.sequence().unwrap();
    assert_eq!(seq.count(), 1);
    let item = seq.get(0).unwrap();
    assert!(item.is_sealed());
    assert_eq!(item.get(tag::Tag::new(0x0008, 0x0060)).unwrap().value.string_at(0).unwrap(), "OT");
  }

  #[test]
  fn rejects_item_delimiter_where_an_item_is_required() {
    let mut bytes = vec![];
    bytes.extend_from_slice(&0x0008u16.to_le_bytes());
    bytes.extend_from_slice(&0x1140u16.to_le_bytes());
    bytes.extend_from_slice(b"SQ");
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&UNDEFINED_LENGTH.to_le_bytes());

    // An Item Delimiter is a recognised item-family tag, but not one that's
    // valid here: a sequence body expects either an Item or the Sequence
    // Delimiter.
    bytes.extend_from_slice(&tag::ITEM_DELIMITER.group.to_le_bytes());
    bytes.extend_from_slice(&tag::ITEM_DELIMITER.element.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let mut cursor = Cursor::new(bytes);
    let header = header::read_element_header(&mut cursor, false).unwrap();
    let err = read_element(&mut cursor, header, false).unwrap_err();
    assert!(matches!(err, Error::UnexpectedTag { .. }));
  }
}
