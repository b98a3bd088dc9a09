//! The typed container for a Data Element's value.
//!
//! A closed sum type with one variant per VR *category*, VR stored as a tag
//! field where a category covers more than one VR, rather than one variant
//! per individual VR. This mirrors the `RawDataElementValue` shape this
//! project's core value module uses, pared down to what a read-only parser
//! needs (no write-path padding/byte-swap concerns).

use std::rc::Rc;

use crate::error::Error;
use crate::sequence::Sequence;
use crate::tag::Tag;
use crate::vr::ValueRepresentation;

/// A Data Element's decoded value.
#[derive(Clone, Debug)]
pub enum Value {
  /// Any of the character-string VRs: owned substrings split on `\`.
  CharacterString {
    vr: ValueRepresentation,
    values: Vec<String>,
  },

  /// AT: an array of attribute tags.
  AttributeTag(Vec<Tag>),

  FloatingPointDouble(Vec<f64>),
  FloatingPointSingle(Vec<f32>),
  SignedShort(Vec<i16>),
  SignedLong(Vec<i32>),
  SignedVeryLong(Vec<i64>),
  UnsignedShort(Vec<u16>),
  UnsignedLong(Vec<u32>),
  UnsignedVeryLong(Vec<u64>),

  /// Any of the binary-blob VRs: an opaque owned byte buffer.
  Binary { vr: ValueRepresentation, bytes: Rc<Vec<u8>> },

  /// SQ: a nested sequence of Data Sets.
  Sequence(Sequence),
}

impl Value {
  pub fn vr(&self) -> ValueRepresentation {
    match self {
      Value::CharacterString { vr, .. } => *vr,
      Value::AttributeTag(_) => ValueRepresentation::AttributeTag,
      Value::FloatingPointDouble(_) => ValueRepresentation::FloatingPointDouble,
      Value::FloatingPointSingle(_) => ValueRepresentation::FloatingPointSingle,
      Value::SignedShort(_) => ValueRepresentation::SignedShort,
      Value::SignedLong(_) => ValueRepresentation::SignedLong,
      Value::SignedVeryLong(_) => ValueRepresentation::SignedVeryLong,
      Value::UnsignedShort(_) => ValueRepresentation::UnsignedShort,
      Value::UnsignedLong(_) => ValueRepresentation::UnsignedLong,
      Value::UnsignedVeryLong(_) => ValueRepresentation::UnsignedVeryLong,
      Value::Binary { vr, .. } => *vr,
      Value::Sequence(_) => ValueRepresentation::Sequence,
    }
  }

  /// Value multiplicity: the number of backslash-separated substrings for
  /// character strings; for everything else it is the element count.
  pub fn vm(&self) -> usize {
    match self {
      Value::CharacterString { values, .. } => values.len(),
      Value::AttributeTag(v) => v.len(),
      Value::FloatingPointDouble(v) => v.len(),
      Value::FloatingPointSingle(v) => v.len(),
      Value::SignedShort(v) => v.len(),
      Value::SignedLong(v) => v.len(),
      Value::SignedVeryLong(v) => v.len(),
      Value::UnsignedShort(v) => v.len(),
      Value::UnsignedLong(v) => v.len(),
      Value::UnsignedVeryLong(v) => v.len(),
      Value::Binary { bytes, .. } => bytes.len(),
      Value::Sequence(seq) => seq.count(),
    }
  }

  /// Builds a character-string value, splitting the already-trimmed raw
  /// string on `\`, and enforcing the VM=1 constraint ST/LT/UR/UT are held
  /// to.
  pub fn character_string(vr: ValueRepresentation, raw: &str) -> Result<Self, Error> {
    let values: Vec<String> = if raw.is_empty() {
      vec![String::new()]
    } else {
      raw.split('\\').map(str::to_string).collect()
    };

    if vr.is_singular_text() && values.len() != 1 {
      return Err(Error::MalformedValue {
        details: format!(
          "{vr} requires value multiplicity 1, got {} fields",
          values.len()
        ),
      });
    }

    Ok(Value::CharacterString { vr, values })
  }

  pub fn string_at(&self, index: usize) -> Result<&str, Error> {
    match self {
      Value::CharacterString { values, .. } => {
        values.get(index).map(String::as_str).ok_or(Error::InvalidIndex { index })
      }
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  pub fn strings(&self) -> Result<&[String], Error> {
    match self {
      Value::CharacterString { values, .. } => Ok(values),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  pub fn tags(&self) -> Result<&[Tag], Error> {
    match self {
      Value::AttributeTag(tags) => Ok(tags),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into an `AttributeTag` value, analogous to
  /// [`Value::string_at`].
  pub fn tag_at(&self, index: usize) -> Result<Tag, Error> {
    match self {
      Value::AttributeTag(tags) => tags.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  pub fn bytes(&self) -> Result<&Rc<Vec<u8>>, Error> {
    match self {
      Value::Binary { bytes, .. } => Ok(bytes),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a binary-blob value's bytes, analogous to
  /// [`Value::string_at`].
  pub fn byte_at(&self, index: usize) -> Result<u8, Error> {
    match self {
      Value::Binary { bytes, .. } => bytes.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a `FloatingPointDouble` (FD) value.
  pub fn float64_at(&self, index: usize) -> Result<f64, Error> {
    match self {
      Value::FloatingPointDouble(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a `FloatingPointSingle` (FL) value.
  pub fn float32_at(&self, index: usize) -> Result<f32, Error> {
    match self {
      Value::FloatingPointSingle(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a `SignedShort` (SS) value.
  pub fn int16_at(&self, index: usize) -> Result<i16, Error> {
    match self {
      Value::SignedShort(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a `SignedLong` (SL) value.
  pub fn int32_at(&self, index: usize) -> Result<i32, Error> {
    match self {
      Value::SignedLong(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into a `SignedVeryLong` (SV) value.
  pub fn int64_at(&self, index: usize) -> Result<i64, Error> {
    match self {
      Value::SignedVeryLong(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into an `UnsignedShort` (US) value.
  pub fn uint16_at(&self, index: usize) -> Result<u16, Error> {
    match self {
      Value::UnsignedShort(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into an `UnsignedLong` (UL) value.
  pub fn uint32_at(&self, index: usize) -> Result<u32, Error> {
    match self {
      Value::UnsignedLong(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// Indexed access into an `UnsignedVeryLong` (UV) value.
  pub fn uint64_at(&self, index: usize) -> Result<u64, Error> {
    match self {
      Value::UnsignedVeryLong(v) => v.get(index).copied().ok_or(Error::InvalidIndex { index }),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  pub fn sequence(&self) -> Result<&Sequence, Error> {
    match self {
      Value::Sequence(seq) => Ok(seq),
      _ => Err(Error::UnsupportedVR { vr: self.vr().name().to_string() }),
    }
  }

  /// A single-line rendering used by `DataSet::print`.
  pub fn preview(&self) -> String {
    match self {
      Value::CharacterString { values, .. } => values.join("\\"),
      Value::AttributeTag(tags) => tags
        .iter()
        .map(Tag::to_string)
        .collect::<Vec<_>>()
        .join(", "),
      Value::FloatingPointDouble(v) => format!("{v:?}"),
      Value::FloatingPointSingle(v) => format!("{v:?}"),
      Value::SignedShort(v) => format!("{v:?}"),
      Value::SignedLong(v) => format!("{v:?}"),
      Value::SignedVeryLong(v) => format!("{v:?}"),
      Value::UnsignedShort(v) => format!("{v:?}"),
      Value::UnsignedLong(v) => format!("{v:?}"),
      Value::UnsignedVeryLong(v) => format!("{v:?}"),
      Value::Binary { bytes, .. } => format!("<{} bytes>", bytes.len()),
      Value::Sequence(seq) => format!("<sequence, {} item(s)>", seq.count()),
    }
  }
}

/// A `(tag, VR, value)` Data Element. Once inserted into a sealed
/// [`crate::DataSet`] the element is immutable.
#[derive(Clone, Debug)]
pub struct DataElementValue {
  pub tag: Tag,
  pub value: Value,
}

impl DataElementValue {
  pub fn new(tag: Tag, value: Value) -> Self {
    DataElementValue { tag, value }
  }

  pub fn vr(&self) -> ValueRepresentation {
    self.value.vr()
  }

  pub fn vm(&self) -> usize {
    self.value.vm()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vr::ValueRepresentation as VR;

  #[test]
  fn splits_multi_valued_character_string() {
    let v = Value::character_string(VR::CodeString, "A\\B\\C").unwrap();
    assert_eq!(v.vm(), 3);
    assert_eq!(v.strings().unwrap(), &["A".to_string(), "B".to_string(), "C".to_string()]);
  }

  #[test]
  fn empty_raw_value_is_vm_one_empty_string() {
    let v = Value::character_string(VR::CodeString, "").unwrap();
    assert_eq!(v.vm(), 1);
    assert_eq!(v.string_at(0).unwrap(), "");
  }

  #[test]
  fn singular_text_vr_rejects_multiple_values() {
    let err = Value::character_string(VR::ShortText, "A\\B").unwrap_err();
    assert!(matches!(err, Error::MalformedValue { .. }));
  }

  #[test]
  fn out_of_range_index_fails() {
    let v = Value::character_string(VR::CodeString, "A").unwrap();
    assert!(matches!(v.string_at(5), Err(Error::InvalidIndex { index: 5 })));
  }

  #[test]
  fn numeric_vm_is_element_count() {
    let v = Value::UnsignedShort(vec![1, 2, 3, 4]);
    assert_eq!(v.vm(), 4);
  }

  #[test]
  fn numeric_indexed_accessors_round_trip() {
    assert_eq!(Value::UnsignedShort(vec![1, 2, 3]).uint16_at(1).unwrap(), 2);
    assert_eq!(Value::SignedLong(vec![-1, -2]).int32_at(0).unwrap(), -1);
    assert_eq!(Value::FloatingPointDouble(vec![1.5]).float64_at(0).unwrap(), 1.5);
  }

  #[test]
  fn numeric_indexed_accessor_out_of_range_fails() {
    let v = Value::UnsignedLong(vec![1]);
    assert!(matches!(v.uint32_at(5), Err(Error::InvalidIndex { index: 5 })));
  }

  #[test]
  fn numeric_indexed_accessor_wrong_variant_fails() {
    let v = Value::UnsignedShort(vec![1]);
    assert!(matches!(v.float64_at(0), Err(Error::UnsupportedVR { .. })));
  }

  #[test]
  fn tag_and_byte_indexed_accessors() {
    let tags = Value::AttributeTag(vec![Tag::new(0x0008, 0x0018)]);
    assert_eq!(tags.tag_at(0).unwrap(), Tag::new(0x0008, 0x0018));
    assert!(matches!(tags.tag_at(1), Err(Error::InvalidIndex { index: 1 })));

    let binary = Value::Binary { vr: VR::OtherByteString, bytes: Rc::new(vec![9, 8, 7]) };
    assert_eq!(binary.byte_at(1).unwrap(), 8);
    assert!(matches!(binary.byte_at(9), Err(Error::InvalidIndex { index: 9 })));
  }
}
