//! Value Representation: the two-letter type tag on every Data Element.

use std::fmt;

/// The full standard DICOM Value Representation alphabet.
///
/// `spec.md` describes this as "a fixed 27-member set" but then enumerates,
/// across its VR partitions, the full 34-member set below; this follows the
/// enumeration, since every header/decode dispatch table is keyed off it
/// (see `DESIGN.md`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueRepresentation {
  ApplicationEntity,
  AgeString,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  ShortText,
  Time,
  UnlimitedCharacters,
  UniqueIdentifier,
  UnsignedLong,
  Unknown,
  UniversalResourceIdentifier,
  UnsignedShort,
  UnlimitedText,
  UnsignedVeryLong,
}

use ValueRepresentation as VR;

impl ValueRepresentation {
  /// Parses the two raw ASCII bytes of an explicit VR, e.g. `b"CS"`.
  pub fn from_bytes(bytes: [u8; 2]) -> Result<Self, ()> {
    match &bytes {
      b"AE" => Ok(VR::ApplicationEntity),
      b"AS" => Ok(VR::AgeString),
      b"AT" => Ok(VR::AttributeTag),
      b"CS" => Ok(VR::CodeString),
      b"DA" => Ok(VR::Date),
      b"DT" => Ok(VR::DateTime),
      b"DS" => Ok(VR::DecimalString),
      b"FD" => Ok(VR::FloatingPointDouble),
      b"FL" => Ok(VR::FloatingPointSingle),
      b"IS" => Ok(VR::IntegerString),
      b"LO" => Ok(VR::LongString),
      b"LT" => Ok(VR::LongText),
      b"OB" => Ok(VR::OtherByteString),
      b"OD" => Ok(VR::OtherDoubleString),
      b"OF" => Ok(VR::OtherFloatString),
      b"OL" => Ok(VR::OtherLongString),
      b"OV" => Ok(VR::OtherVeryLongString),
      b"OW" => Ok(VR::OtherWordString),
      b"PN" => Ok(VR::PersonName),
      b"SQ" => Ok(VR::Sequence),
      b"SH" => Ok(VR::ShortString),
      b"SL" => Ok(VR::SignedLong),
      b"SS" => Ok(VR::SignedShort),
      b"SV" => Ok(VR::SignedVeryLong),
      b"ST" => Ok(VR::ShortText),
      b"TM" => Ok(VR::Time),
      b"UC" => Ok(VR::UnlimitedCharacters),
      b"UI" => Ok(VR::UniqueIdentifier),
      b"UL" => Ok(VR::UnsignedLong),
      b"UN" => Ok(VR::Unknown),
      b"UR" => Ok(VR::UniversalResourceIdentifier),
      b"US" => Ok(VR::UnsignedShort),
      b"UT" => Ok(VR::UnlimitedText),
      b"UV" => Ok(VR::UnsignedVeryLong),
      _ => Err(()),
    }
  }

  pub fn to_bytes(self) -> [u8; 2] {
    *self.name().as_bytes().first_chunk::<2>().unwrap()
  }

  pub fn name(self) -> &'static str {
    match self {
      VR::ApplicationEntity => "AE",
      VR::AgeString => "AS",
      VR::AttributeTag => "AT",
      VR::CodeString => "CS",
      VR::Date => "DA",
      VR::DateTime => "DT",
      VR::DecimalString => "DS",
      VR::FloatingPointDouble => "FD",
      VR::FloatingPointSingle => "FL",
      VR::IntegerString => "IS",
      VR::LongString => "LO",
      VR::LongText => "LT",
      VR::OtherByteString => "OB",
      VR::OtherDoubleString => "OD",
      VR::OtherFloatString => "OF",
      VR::OtherLongString => "OL",
      VR::OtherVeryLongString => "OV",
      VR::OtherWordString => "OW",
      VR::PersonName => "PN",
      VR::Sequence => "SQ",
      VR::ShortString => "SH",
      VR::SignedLong => "SL",
      VR::SignedShort => "SS",
      VR::SignedVeryLong => "SV",
      VR::ShortText => "ST",
      VR::Time => "TM",
      VR::UnlimitedCharacters => "UC",
      VR::UniqueIdentifier => "UI",
      VR::UnsignedLong => "UL",
      VR::Unknown => "UN",
      VR::UniversalResourceIdentifier => "UR",
      VR::UnsignedShort => "US",
      VR::UnlimitedText => "UT",
      VR::UnsignedVeryLong => "UV",
    }
  }

  /// `spec.md` §3's "Short-header string VRs": explicit encoding uses a
  /// 16-bit value length. All other VRs use the 4-byte long form.
  pub fn has_short_header(self) -> bool {
    matches!(
      self,
      VR::ApplicationEntity
        | VR::AgeString
        | VR::AttributeTag
        | VR::CodeString
        | VR::Date
        | VR::DateTime
        | VR::DecimalString
        | VR::FloatingPointSingle
        | VR::FloatingPointDouble
        | VR::IntegerString
        | VR::LongString
        | VR::LongText
        | VR::PersonName
        | VR::ShortString
        | VR::SignedLong
        | VR::SignedShort
        | VR::ShortText
        | VR::Time
        | VR::UniqueIdentifier
        | VR::UnsignedLong
        | VR::UnsignedShort
    )
  }

  /// `spec.md` §3's "Character-string VRs" partition (AT is parsed as a
  /// fixed-width tag array instead; see `DESIGN.md`). UC is listed under
  /// "Binary blob VRs" instead, despite its name — see `is_binary_blob`.
  pub fn is_character_string(self) -> bool {
    matches!(
      self,
      VR::ApplicationEntity
        | VR::AgeString
        | VR::CodeString
        | VR::Date
        | VR::DateTime
        | VR::DecimalString
        | VR::IntegerString
        | VR::LongString
        | VR::PersonName
        | VR::ShortString
        | VR::ShortText
        | VR::Time
        | VR::UniqueIdentifier
        | VR::UniversalResourceIdentifier
        | VR::UnlimitedText
        | VR::LongText
    )
  }

  /// ST, LT, UR, UT are constrained to value-multiplicity 1.
  pub fn is_singular_text(self) -> bool {
    matches!(
      self,
      VR::ShortText | VR::LongText | VR::UniversalResourceIdentifier | VR::UnlimitedText
    )
  }

  /// `spec.md` §3's "Numeric VRs": fixed-width element arrays.
  pub fn is_numeric(self) -> bool {
    matches!(
      self,
      VR::FloatingPointDouble
        | VR::FloatingPointSingle
        | VR::SignedShort
        | VR::SignedLong
        | VR::SignedVeryLong
        | VR::UnsignedLong
        | VR::UnsignedShort
        | VR::UnsignedVeryLong
    )
  }

  /// Byte width of a single numeric element, when this VR is numeric.
  pub fn numeric_element_size(self) -> Option<usize> {
    match self {
      VR::FloatingPointSingle | VR::SignedLong | VR::UnsignedLong => Some(4),
      VR::FloatingPointDouble | VR::SignedVeryLong | VR::UnsignedVeryLong => Some(8),
      VR::SignedShort | VR::UnsignedShort => Some(2),
      _ => None,
    }
  }

  /// `spec.md` §3's "Binary blob VRs": opaque byte buffers. UC sits here
  /// despite its name (Unlimited Characters) — `spec.md` §3 and §4.5 both
  /// place it in this partition, not the character-string one.
  pub fn is_binary_blob(self) -> bool {
    matches!(
      self,
      VR::OtherByteString
        | VR::OtherDoubleString
        | VR::OtherFloatString
        | VR::OtherLongString
        | VR::OtherVeryLongString
        | VR::OtherWordString
        | VR::UnlimitedCharacters
        | VR::Unknown
    )
  }

  pub fn is_sequence(self) -> bool {
    matches!(self, VR::Sequence)
  }

  pub fn is_attribute_tag(self) -> bool {
    matches!(self, VR::AttributeTag)
  }
}

impl fmt::Display for ValueRepresentation {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Recognizes any of the 34 standard VR codes (`spec.md` §4.1's
/// `is_valid_vr`; see the note in §F of `SPEC_FULL.md`).
pub fn is_valid_vr(bytes: [u8; 2]) -> bool {
  ValueRepresentation::from_bytes(bytes).is_ok()
}
