//! Static tag→VR and tag→keyword lookup, and tag/transfer-syntax validators.
//!
//! `spec.md` §1 treats the dictionary as an external, read-only collaborator;
//! this module is the minimal standalone implementation of that collaborator
//! the File driver and Element reader call into for implicit-VR decoding and
//! diagnostics.

use crate::tag::Tag;
use crate::vr::ValueRepresentation;

/// `1.2.840.10008.1.2` — Implicit VR Little Endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

/// `1.2.840.10008.1.2.1` — Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// `1.2.840.10008.1.2.1.99` — Deflated Explicit VR Little Endian.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";

/// `1.2.840.10008.1.2.2` — Explicit VR Big Endian (retired, recognised but
/// not supported for reading; see `DESIGN.md`).
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";

/// A `(tag, VR, keyword)` dictionary entry.
struct Entry {
  tag: Tag,
  vr: ValueRepresentation,
  keyword: &'static str,
}

use ValueRepresentation as VR;

/// Tags referenced directly by the File driver and Element reader, plus a
/// representative sample of commonly seen identification/image attributes.
/// Unlisted tags decode as VR::Unknown under implicit VR, with keyword
/// `"Unknown"`.
const ENTRIES: &[Entry] = &[
  Entry { tag: Tag::new(0x0002, 0x0000), vr: VR::UnsignedLong, keyword: "FileMetaInformationGroupLength" },
  Entry { tag: Tag::new(0x0002, 0x0001), vr: VR::OtherByteString, keyword: "FileMetaInformationVersion" },
  Entry { tag: Tag::new(0x0002, 0x0002), vr: VR::UniqueIdentifier, keyword: "MediaStorageSOPClassUID" },
  Entry { tag: Tag::new(0x0002, 0x0003), vr: VR::UniqueIdentifier, keyword: "MediaStorageSOPInstanceUID" },
  Entry { tag: Tag::new(0x0002, 0x0010), vr: VR::UniqueIdentifier, keyword: "TransferSyntaxUID" },
  Entry { tag: Tag::new(0x0002, 0x0012), vr: VR::UniqueIdentifier, keyword: "ImplementationClassUID" },
  Entry { tag: Tag::new(0x0002, 0x0013), vr: VR::ShortString, keyword: "ImplementationVersionName" },
  Entry { tag: Tag::new(0x0008, 0x0005), vr: VR::CodeString, keyword: "SpecificCharacterSet" },
  Entry { tag: Tag::new(0x0008, 0x0016), vr: VR::UniqueIdentifier, keyword: "SOPClassUID" },
  Entry { tag: Tag::new(0x0008, 0x0018), vr: VR::UniqueIdentifier, keyword: "SOPInstanceUID" },
  Entry { tag: Tag::new(0x0008, 0x0020), vr: VR::Date, keyword: "StudyDate" },
  Entry { tag: Tag::new(0x0008, 0x0060), vr: VR::CodeString, keyword: "Modality" },
  Entry { tag: Tag::new(0x0008, 0x0090), vr: VR::PersonName, keyword: "ReferringPhysicianName" },
  Entry { tag: Tag::new(0x0010, 0x0010), vr: VR::PersonName, keyword: "PatientName" },
  Entry { tag: Tag::new(0x0010, 0x0020), vr: VR::LongString, keyword: "PatientID" },
  Entry { tag: Tag::new(0x0020, 0x000D), vr: VR::UniqueIdentifier, keyword: "StudyInstanceUID" },
  Entry { tag: Tag::new(0x0020, 0x000E), vr: VR::UniqueIdentifier, keyword: "SeriesInstanceUID" },
  Entry { tag: Tag::new(0x0028, 0x0002), vr: VR::UnsignedShort, keyword: "SamplesPerPixel" },
  Entry { tag: Tag::new(0x0028, 0x0004), vr: VR::CodeString, keyword: "PhotometricInterpretation" },
  Entry { tag: Tag::new(0x0028, 0x0006), vr: VR::UnsignedShort, keyword: "PlanarConfiguration" },
  Entry { tag: Tag::new(0x0028, 0x0008), vr: VR::IntegerString, keyword: "NumberOfFrames" },
  Entry { tag: Tag::new(0x0028, 0x0010), vr: VR::UnsignedShort, keyword: "Rows" },
  Entry { tag: Tag::new(0x0028, 0x0011), vr: VR::UnsignedShort, keyword: "Columns" },
  Entry { tag: Tag::new(0x0028, 0x0100), vr: VR::UnsignedShort, keyword: "BitsAllocated" },
  Entry { tag: Tag::new(0x0028, 0x0101), vr: VR::UnsignedShort, keyword: "BitsStored" },
  Entry { tag: Tag::new(0x0028, 0x0102), vr: VR::UnsignedShort, keyword: "HighBit" },
  Entry { tag: Tag::new(0x0028, 0x0103), vr: VR::UnsignedShort, keyword: "PixelRepresentation" },
  Entry { tag: Tag::new(0x7FE0, 0x0001), vr: VR::OtherVeryLongString, keyword: "ExtendedOffsetTable" },
  Entry { tag: Tag::new(0x7FE0, 0x0002), vr: VR::OtherVeryLongString, keyword: "ExtendedOffsetTableLengths" },
  Entry { tag: Tag::new(0x7FE0, 0x0008), vr: VR::OtherDoubleString, keyword: "DoubleFloatPixelData" },
  Entry { tag: Tag::new(0x7FE0, 0x0009), vr: VR::OtherFloatString, keyword: "FloatPixelData" },
  Entry { tag: Tag::new(0x7FE0, 0x0010), vr: VR::OtherWordString, keyword: "PixelData" },
];

/// Returns the standard VR for `tag`, used to decode implicit-VR elements.
/// Unrecognised tags default to `VR::Unknown`, the same fallback the byte
/// layout uses for any VR it cannot otherwise determine.
pub fn lookup_vr(tag: Tag) -> ValueRepresentation {
  ENTRIES
    .iter()
    .find(|entry| entry.tag == tag)
    .map(|entry| entry.vr)
    .unwrap_or(VR::Unknown)
}

/// Returns a human-readable keyword for `tag`, for diagnostics only.
pub fn lookup_keyword(tag: Tag) -> &'static str {
  ENTRIES
    .iter()
    .find(|entry| entry.tag == tag)
    .map(|entry| entry.keyword)
    .unwrap_or("Unknown")
}

/// Rejects tags in DICOM's retired/reserved groups.
pub fn is_valid_tag(tag: Tag) -> bool {
  !matches!(tag.group, 0x0001 | 0x0003 | 0x0005 | 0x0007 | 0xFFFF)
}

pub use crate::vr::is_valid_vr;

/// True for every transfer syntax UID except the three uncompressed
/// little-endian syntaxes named in `spec.md` §4.1.
pub fn is_encapsulated_transfer_syntax(uid: &str) -> bool {
  !matches!(
    uid,
    IMPLICIT_VR_LITTLE_ENDIAN
      | EXPLICIT_VR_LITTLE_ENDIAN
      | DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN
  )
}
