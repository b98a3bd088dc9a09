//! Fixture-driven end-to-end tests for the `spec.md` §8 E1-E7 scenarios.
//! Each fixture is built by hand from raw bytes rather than shipping a
//! binary `.dcm` file in the repository.

use std::io::Cursor;

use dcm10::{DataSet, DicomFile, Error};

fn push_explicit_short(out: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
  out.extend_from_slice(&group.to_le_bytes());
  out.extend_from_slice(&element.to_le_bytes());
  out.extend_from_slice(vr);
  out.extend_from_slice(&(value.len() as u16).to_le_bytes());
  out.extend_from_slice(value);
}

fn push_explicit_long(out: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
  out.extend_from_slice(&group.to_le_bytes());
  out.extend_from_slice(&element.to_le_bytes());
  out.extend_from_slice(vr);
  out.extend_from_slice(&[0, 0]);
  out.extend_from_slice(&(value.len() as u32).to_le_bytes());
  out.extend_from_slice(value);
}

fn uid_bytes(uid: &str) -> Vec<u8> {
  let mut bytes = uid.as_bytes().to_vec();
  if bytes.len() % 2 == 1 {
    bytes.push(0);
  }
  bytes
}

fn minimal_fmi(transfer_syntax_uid: &str) -> Vec<u8> {
  let mut fmi_body = vec![];
  push_explicit_long(&mut fmi_body, 0x0002, 0x0001, b"OB", &[0, 1]);
  push_explicit_short(&mut fmi_body, 0x0002, 0x0010, b"UI", &uid_bytes(transfer_syntax_uid));

  let mut fmi = vec![];
  push_explicit_short(&mut fmi, 0x0002, 0x0000, b"UL", &(fmi_body.len() as u32).to_le_bytes());
  fmi.extend_from_slice(&fmi_body);
  fmi
}

fn wrap_file(fmi: &[u8], main: &[u8]) -> Vec<u8> {
  let mut bytes = vec![0u8; 128];
  bytes.extend_from_slice(b"DICM");
  bytes.extend_from_slice(fmi);
  bytes.extend_from_slice(main);
  bytes
}

/// E1: parse a single-frame native fixture; FMI carries the Transfer Syntax
/// UID, the main Data Set carries Number of Frames, and `read_frame` yields
/// a buffer of the expected length.
#[test]
fn e1_full_native_fixture_round_trip() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);

  let mut main = vec![];
  push_explicit_short(&mut main, 0x0028, 0x0002, b"US", &1u16.to_le_bytes());
  push_explicit_short(&mut main, 0x0028, 0x0004, b"CS", b"MONOCHROME2");
  push_explicit_short(&mut main, 0x0028, 0x0008, b"IS", b"1");
  push_explicit_short(&mut main, 0x0028, 0x0010, b"US", &2u16.to_le_bytes());
  push_explicit_short(&mut main, 0x0028, 0x0011, b"US", &2u16.to_le_bytes());
  push_explicit_short(&mut main, 0x0028, 0x0100, b"US", &8u16.to_le_bytes());
  push_explicit_short(&mut main, 0x0028, 0x0101, b"US", &8u16.to_le_bytes());
  push_explicit_short(&mut main, 0x0028, 0x0103, b"US", &0u16.to_le_bytes());
  push_explicit_long(&mut main, 0x7FE0, 0x0010, b"OW", &[10, 20, 30, 40]);

  let bytes = wrap_file(&fmi, &main);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));

  let file_meta = file.read_file_meta().unwrap();
  assert_eq!(
    file_meta
      .get(dcm10::tag::TRANSFER_SYNTAX_UID)
      .unwrap()
      .value
      .string_at(0)
      .unwrap(),
    dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN
  );

  let metadata = file.read_metadata().unwrap();
  assert!(metadata.contains(dcm10::tag::NUMBER_OF_FRAMES));

  let bot = file.build_bot(&metadata).unwrap();
  let frame = file.read_frame(&metadata, &bot, 1).unwrap();
  assert_eq!(frame.buffer.len(), 4);
  assert_eq!(frame.buffer, vec![10, 20, 30, 40]);
}

/// E2: a preamble shorter than 132 bytes total is not a DICOM file.
#[test]
fn e2_truncated_preamble_is_not_a_dicom_file() {
  let bytes = vec![0u8; 100];
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  assert!(matches!(file.read_file_meta(), Err(Error::NotADicomFile { .. })));
}

/// E3: wrong magic at offset 128 is not a DICOM file.
#[test]
fn e3_wrong_magic_is_not_a_dicom_file() {
  let mut bytes = vec![0u8; 128];
  bytes.extend_from_slice(b"XXIC");
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  assert!(matches!(file.read_file_meta(), Err(Error::NotADicomFile { .. })));
}

/// E4: an explicit-VR long header whose 2 reserved bytes are nonzero fails.
#[test]
fn e4_nonzero_reserved_bytes_is_malformed_header() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);

  let mut main = vec![];
  // Hand-build an OB element with reserved bytes set to 0xFF instead of 0.
  main.extend_from_slice(&0x7FE0u16.to_le_bytes());
  main.extend_from_slice(&0x0010u16.to_le_bytes());
  main.extend_from_slice(b"OB");
  main.extend_from_slice(&[0xFF, 0xFF]);
  main.extend_from_slice(&4u32.to_le_bytes());
  main.extend_from_slice(&[1, 2, 3, 4]);

  let bytes = wrap_file(&fmi, &main);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  file.read_file_meta().unwrap();
  assert!(matches!(file.read_metadata(), Err(Error::MalformedHeader { .. })));
}

/// E5: a sequence with undefined length, terminated by the Sequence
/// Delimiter, containing one item of undefined length terminated by the
/// Item Delimiter, containing a second level of nested sequence; all tags
/// round-trip through the parser.
#[test]
fn e5_nested_undefined_length_sequence_round_trips() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);

  // Innermost element inside the nested (level-2) sequence's sole item.
  let mut inner_item_body = vec![];
  push_explicit_short(&mut inner_item_body, 0x0010, 0x0010, b"PN", b"Doe^Jane");

  let mut inner_item = vec![];
  inner_item.extend_from_slice(&0xFFFEu16.to_le_bytes());
  inner_item.extend_from_slice(&0xE000u16.to_le_bytes());
  inner_item.extend_from_slice(&(inner_item_body.len() as u32).to_le_bytes());
  inner_item.extend_from_slice(&inner_item_body);

  // Level-2 sequence (0040,A730) with a defined length, holding the one item.
  let mut level2_sq_header = vec![];
  level2_sq_header.extend_from_slice(&0x0040u16.to_le_bytes());
  level2_sq_header.extend_from_slice(&0xA730u16.to_le_bytes());
  level2_sq_header.extend_from_slice(b"SQ");
  level2_sq_header.extend_from_slice(&[0, 0]);
  level2_sq_header.extend_from_slice(&(inner_item.len() as u32).to_le_bytes());

  let mut level1_item_body = vec![];
  level1_item_body.extend_from_slice(&level2_sq_header);
  level1_item_body.extend_from_slice(&inner_item);

  // Level-1 item, undefined length, terminated by the Item Delimiter.
  let mut level1_item = vec![];
  level1_item.extend_from_slice(&0xFFFEu16.to_le_bytes());
  level1_item.extend_from_slice(&0xE000u16.to_le_bytes());
  level1_item.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
  level1_item.extend_from_slice(&level1_item_body);
  level1_item.extend_from_slice(&0xFFFEu16.to_le_bytes());
  level1_item.extend_from_slice(&0xE00Du16.to_le_bytes());
  level1_item.extend_from_slice(&0u32.to_le_bytes());

  // Level-0 sequence (0040,A168), undefined length, terminated by the
  // Sequence Delimiter.
  let mut main = vec![];
  main.extend_from_slice(&0x0040u16.to_le_bytes());
  main.extend_from_slice(&0xA168u16.to_le_bytes());
  main.extend_from_slice(b"SQ");
  main.extend_from_slice(&[0, 0]);
  main.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
  main.extend_from_slice(&level1_item);
  main.extend_from_slice(&0xFFFEu16.to_le_bytes());
  main.extend_from_slice(&0xE0DDu16.to_le_bytes());
  main.extend_from_slice(&0u32.to_le_bytes());

  let bytes = wrap_file(&fmi, &main);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  file.read_file_meta().unwrap();
  let metadata = file.read_metadata().unwrap();

  let outer_sq = metadata.get(dcm10::Tag::new(0x0040, 0xA168)).unwrap();
  let level1_items = outer_sq.value.sequence().unwrap();
  assert_eq!(level1_items.count(), 1);

  let level1_data_set = level1_items.get(0).unwrap();
  let inner_sq = level1_data_set.get(dcm10::Tag::new(0x0040, 0xA730)).unwrap();
  let level2_items = inner_sq.value.sequence().unwrap();
  assert_eq!(level2_items.count(), 1);

  let level2_data_set = level2_items.get(0).unwrap();
  let name = level2_data_set.get(dcm10::Tag::new(0x0010, 0x0010)).unwrap();
  assert_eq!(name.value.string_at(0).unwrap(), "Doe^Jane");
}

/// E6: a multi-valued CS element splits on backslash into 3 values.
#[test]
fn e6_multi_valued_character_string_vm_three() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);

  let mut main = vec![];
  push_explicit_short(&mut main, 0x0018, 0x0020, b"CS", b"A\\B\\C");

  let bytes = wrap_file(&fmi, &main);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  file.read_file_meta().unwrap();
  let metadata = file.read_metadata().unwrap();

  let element = metadata.get(dcm10::Tag::new(0x0018, 0x0020)).unwrap();
  assert_eq!(element.value.vm(), 3);
  assert_eq!(
    element.value.strings().unwrap(),
    &["A".to_string(), "B".to_string(), "C".to_string()]
  );
}

/// E7: an ST element (VM must be 1) containing a backslash fails to parse.
#[test]
fn e7_singular_text_with_backslash_is_malformed_value() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);

  let mut main = vec![];
  push_explicit_short(&mut main, 0x0008, 0x2111, b"ST", b"A\\B");

  let bytes = wrap_file(&fmi, &main);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  file.read_file_meta().unwrap();
  assert!(matches!(file.read_metadata(), Err(Error::MalformedValue { .. })));
}

/// A sanity check that a sealed `DataSet` can still be read via the public
/// API even though its owning `DicomFile` has been closed.
#[test]
fn data_set_outlives_closed_file() {
  let fmi = minimal_fmi(dcm10::dictionary::EXPLICIT_VR_LITTLE_ENDIAN);
  let bytes = wrap_file(&fmi, &[]);
  let mut file = DicomFile::from_reader(Cursor::new(bytes));
  let file_meta: DataSet = file.read_file_meta().unwrap();
  file.close();
  assert!(file_meta.is_sealed());
}
