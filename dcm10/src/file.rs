//! The File driver: preamble/DICM handshake, File Meta Information read,
//! main metadata read, Basic Offset Table read/build, and frame read.
//!
//! Grounded in this project's `p10_read.rs` for the FMI-loop and
//! pixel-data-tag dispatch logic, reworked from its push-based streaming
//! state machine into a synchronous, seek-based reader the way this
//! project's other blocking-I/O sibling crate reads a file, since random
//! access to individual frames needs `Seek`.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use std::fs::File as StdFile;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::data_set::DataSet;
use crate::dictionary;
use crate::error::Error;
use crate::frame::{BasicOffsetTable, Frame};
use crate::header;
use crate::log;
use crate::reader;
use crate::tag;
use crate::value::Value;

/// Any stream the File driver can read and seek within: a plain file, or an
/// in-memory buffer (used for deflated transfer syntaxes and for tests).
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// An open DICOM Part 10 file. Holds stream position, the captured
/// Transfer Syntax UID, and the absolute offsets of the Pixel Data header
/// and the start of the main Data Set.
pub struct DicomFile {
  stream: Box<dyn ReadSeek>,
  transfer_syntax_uid: String,
  pixel_data_offset: Option<u64>,
  data_set_offset: u64,
  implicit_vr: bool,
}

impl DicomFile {
  /// Opens `path` for reading. Does not parse anything yet; call
  /// [`DicomFile::read_file_meta`] next.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
    let file = StdFile::open(path)?;
    Ok(Self::from_reader(BufReader::new(file)))
  }

  /// Wraps an already-open stream, e.g. an in-memory `Cursor<Vec<u8>>`.
  pub fn from_reader<R: Read + Seek + 'static>(stream: R) -> Self {
    DicomFile {
      stream: Box::new(stream),
      transfer_syntax_uid: String::new(),
      pixel_data_offset: None,
      data_set_offset: 0,
      implicit_vr: false,
    }
  }

  /// Closes the handle. The stream is dropped along with `self`.
  pub fn close(self) {}

  /// Reads the 128-byte preamble, the `DICM` magic, and the group-0x0002
  /// File Meta Information, returning it as a sealed [`DataSet`].
  pub fn read_file_meta(&mut self) -> Result<DataSet, Error> {
    self.stream.seek(SeekFrom::Start(0))?;

    let mut preamble = [0u8; 128];
    self.stream.read_exact(&mut preamble).map_err(|_| {
      log::error("rejecting file: truncated preamble");
      Error::NotADicomFile { details: "truncated preamble".to_string() }
    })?;

    let mut magic = [0u8; 4];
    self.stream.read_exact(&mut magic).map_err(|_| {
      log::error("rejecting file: truncated DICM magic");
      Error::NotADicomFile { details: "truncated DICM magic".to_string() }
    })?;
    if &magic != b"DICM" {
      let details = format!("expected DICM magic, found {:?}", String::from_utf8_lossy(&magic));
      log::error(&format!("rejecting file: {details}"));
      return Err(Error::NotADicomFile { details });
    }

    let mut fmi = DataSet::create();

    let group_length_header = header::read_element_header(&mut self.stream, false)?;
    if group_length_header.tag != tag::FILE_META_GROUP_LENGTH {
      log::error(&format!(
        "rejecting File Meta Information: first tag was {}, not {}",
        group_length_header.tag,
        tag::FILE_META_GROUP_LENGTH
      ));
      return Err(Error::MalformedHeader {
        details: "expected File Meta Information Group Length first".to_string(),
      });
    }
    let group_length_element =
      reader::read_element(&mut self.stream, group_length_header, false)?;
    let group_length = match &group_length_element.value {
      Value::UnsignedLong(values) if values.len() == 1 => values[0],
      _ => {
        log::error(&format!(
          "rejecting {}: File Meta Information Group Length must be a single UL",
          tag::FILE_META_GROUP_LENGTH
        ));
        return Err(Error::MalformedValue {
          details: "File Meta Information Group Length must be a single UL".to_string(),
        })
      }
    };
    fmi.insert(group_length_element)?;

    let fmi_body_start = self.stream.stream_position()?;

    loop {
      let consumed = self.stream.stream_position()? - fmi_body_start;
      if consumed >= group_length as u64 {
        break;
      }

      let position_before_header = self.stream.stream_position()?;
      let header = header::read_element_header(&mut self.stream, false)?;

      if !header.tag.is_file_meta() {
        // The FMI has ended; this header belongs to the main Data Set.
        // Rewind so `read_metadata` re-reads it from scratch.
        self.stream.seek(SeekFrom::Start(position_before_header))?;
        break;
      }

      let element = reader::read_element(&mut self.stream, header, false)?;
      fmi.insert(element)?;
    }

    self.data_set_offset = self.stream.stream_position()?;
    self.transfer_syntax_uid = fmi.get(tag::TRANSFER_SYNTAX_UID)?.value.string_at(0)?.to_string();

    log::debug(&format!(
      "File Meta Information read: {} bytes, transfer syntax {}",
      group_length, self.transfer_syntax_uid
    ));

    fmi.lock();
    Ok(fmi)
  }

  /// Reads the main Data Set, stopping at Trailing Padding or a Pixel Data
  /// tag (whose offset is recorded for later frame access).
  pub fn read_metadata(&mut self) -> Result<DataSet, Error> {
    self.stream.seek(SeekFrom::Start(self.data_set_offset))?;

    self.implicit_vr = self.transfer_syntax_uid == dictionary::IMPLICIT_VR_LITTLE_ENDIAN;

    if self.transfer_syntax_uid == dictionary::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN {
      let mut compressed = Vec::new();
      self.stream.read_to_end(&mut compressed)?;

      let mut decompressed = Vec::new();
      ZlibDecoder::new(Cursor::new(compressed))
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Io { details: format!("inflating deflated transfer syntax: {e}") })?;

      self.stream = Box::new(Cursor::new(decompressed));
    }

    let mut data_set = DataSet::create();

    loop {
      let mut probe = [0u8; 1];
      if self.stream.read(&mut probe)? == 0 {
        break;
      }
      self.stream.seek(SeekFrom::Current(-1))?;

      let position_before_header = self.stream.stream_position()?;
      let header = header::read_element_header(&mut self.stream, self.implicit_vr)?;

      if header.tag == tag::TRAILING_PADDING {
        break;
      }

      if tag::is_pixel_data_tag(header.tag) {
        self.stream.seek(SeekFrom::Start(position_before_header))?;
        self.pixel_data_offset = Some(position_before_header);
        break;
      }

      if header.tag.is_file_meta() {
        log::error(&format!(
          "rejecting main Data Set: {} is a File Meta Information tag",
          header.tag
        ));
        return Err(Error::UnexpectedTag {
          expected: "main Data Set tag".to_string(),
          tag: header.tag,
        });
      }

      let element = reader::read_element(&mut self.stream, header, self.implicit_vr)?;
      data_set.insert(element)?;
    }

    data_set.lock();
    Ok(data_set)
  }

  /// Reads the stored Basic Offset Table for an encapsulated Pixel Data
  /// element, falling back to the Extended Offset Table when the BOT item
  /// is empty.
  pub fn read_bot(&mut self, metadata: &DataSet) -> Result<BasicOffsetTable, Error> {
    let pixel_data_offset = self.pixel_data_offset()?;
    self.stream.seek(SeekFrom::Start(pixel_data_offset))?;

    let pixel_header = header::read_element_header(&mut self.stream, self.implicit_vr)?;
    if !tag::is_pixel_data_tag(pixel_header.tag) {
      log::error(&format!(
        "rejecting read_bot: expected a Pixel Data tag at {}, found {}",
        pixel_data_offset, pixel_header.tag
      ));
      return Err(Error::UnexpectedTag {
        expected: "Pixel Data".to_string(),
        tag: pixel_header.tag,
      });
    }

    let num_frames = read_number_of_frames(metadata)?;

    let (bot_tag, bot_length) = header::read_item_header(&mut self.stream)?;
    if bot_tag != tag::ITEM {
      log::error(&format!(
        "rejecting read_bot at {}: expected Basic Offset Table item, found {bot_tag}",
        pixel_header.tag
      ));
      return Err(Error::MalformedHeader {
        details: format!("expected Basic Offset Table item, found {bot_tag}"),
      });
    }

    if bot_length > 0 {
      let count = bot_length as usize / 4;
      let mut offsets = Vec::with_capacity(count);
      for _ in 0..count {
        let raw = self.stream.read_u32::<LittleEndian>()?;
        if raw == tag::ITEM.to_u32() {
          log::error(&format!(
            "rejecting read_bot at {}: a Basic Offset Table entry equals the Item tag",
            pixel_header.tag
          ));
          return Err(Error::MalformedValue {
            details: "Basic Offset Table entry equals the Item tag".to_string(),
          });
        }
        offsets.push(raw as u64);
      }
      return Ok(BasicOffsetTable::create(offsets));
    }

    // Empty BOT: fall back to the Extended Offset Table and return the
    // constructed table on success.
    match metadata.get(tag::EXTENDED_OFFSET_TABLE) {
      Ok(element) => {
        let bytes = element.value.bytes()?;
        let count = bytes.len() / 8;
        if count != num_frames as usize {
          log::error(&format!(
            "rejecting {}: Extended Offset Table entry count {count} does not match Number of Frames {num_frames}",
            tag::EXTENDED_OFFSET_TABLE
          ));
          return Err(Error::MalformedValue {
            details: "Extended Offset Table entry count does not match Number of Frames"
              .to_string(),
          });
        }

        let mut cursor = Cursor::new(bytes.as_slice());
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
          offsets.push(cursor.read_u64::<LittleEndian>()?);
        }
        Ok(BasicOffsetTable::create(offsets))
      }
      Err(_) => {
        log::error(&format!(
          "rejecting read_bot: Basic Offset Table at {} is empty and {} is absent",
          pixel_header.tag,
          tag::EXTENDED_OFFSET_TABLE
        ));
        Err(Error::NoOffsetTable)
      }
    }
  }

  /// Builds a Basic Offset Table by walking the Pixel Data payload (for
  /// encapsulated transfer syntaxes) or computing it from pixel geometry
  /// (for native transfer syntaxes), when the stored BOT is empty.
  pub fn build_bot(&mut self, metadata: &DataSet) -> Result<BasicOffsetTable, Error> {
    let pixel_data_offset = self.pixel_data_offset()?;
    let num_frames = read_number_of_frames(metadata)?;

    if dictionary::is_encapsulated_transfer_syntax(&self.transfer_syntax_uid) {
      self.stream.seek(SeekFrom::Start(pixel_data_offset))?;

      let pixel_header = header::read_element_header(&mut self.stream, self.implicit_vr)?;
      if !tag::is_pixel_data_tag(pixel_header.tag) {
        log::error(&format!(
          "rejecting build_bot: expected a Pixel Data tag at {}, found {}",
          pixel_data_offset, pixel_header.tag
        ));
        return Err(Error::UnexpectedTag {
          expected: "Pixel Data".to_string(),
          tag: pixel_header.tag,
        });
      }

      let (bot_tag, bot_length) = header::read_item_header(&mut self.stream)?;
      if bot_tag != tag::ITEM {
        log::error(&format!(
          "rejecting build_bot at {}: expected Basic Offset Table item, found {bot_tag}",
          pixel_header.tag
        ));
        return Err(Error::MalformedHeader {
          details: "expected Basic Offset Table item".to_string(),
        });
      }

      // Skip the BOT item's value relative to the current stream position,
      // not as an absolute seek to `bot_length` (which would teleport
      // rather than skip).
      self.stream.seek(SeekFrom::Current(bot_length as i64))?;

      let first_frame_item_value_start = self.stream.stream_position()?;
      let mut offsets = Vec::new();

      loop {
        let (item_tag, item_length) = header::read_item_header(&mut self.stream)?;
        if item_tag == tag::SEQUENCE_DELIMITER {
          break;
        }
        if item_tag != tag::ITEM {
          log::error(&format!(
            "rejecting build_bot at {}: expected a frame Item, found {item_tag}",
            pixel_header.tag
          ));
          return Err(Error::UnexpectedTag { expected: "Item".to_string(), tag: item_tag });
        }

        let value_start = self.stream.stream_position()?;
        offsets.push(value_start - first_frame_item_value_start);
        self.stream.seek(SeekFrom::Current(item_length as i64))?;
      }

      if offsets.len() != num_frames as usize {
        log::error(&format!(
          "rejecting build_bot at {}: expected {num_frames} frame item(s), found {}",
          pixel_header.tag,
          offsets.len()
        ));
        return Err(Error::MalformedValue {
          details: format!(
            "expected {num_frames} frame item(s), found {}",
            offsets.len()
          ),
        });
      }

      Ok(BasicOffsetTable::create(offsets))
    } else {
      let geometry = read_pixel_geometry(metadata)?;
      let bytes_per_sample = geometry.bits_allocated.div_ceil(8) as u64;
      let frame_size =
        geometry.rows as u64 * geometry.columns as u64 * geometry.samples_per_pixel as u64 * bytes_per_sample;

      let offsets = (0..num_frames as u64).map(|i| i * frame_size).collect();
      Ok(BasicOffsetTable::create(offsets))
    }
  }

  /// Reads the 1-based `number`th frame's pixel bytes.
  pub fn read_frame(
    &mut self,
    metadata: &DataSet,
    bot: &BasicOffsetTable,
    number: u32,
  ) -> Result<Frame, Error> {
    if number == 0 {
      log::error("rejecting read_frame: frame number must be >= 1");
      return Err(Error::BadArgument { details: "frame number must be >= 1".to_string() });
    }

    let pixel_data_offset = self.pixel_data_offset()?;
    let encapsulated = dictionary::is_encapsulated_transfer_syntax(&self.transfer_syntax_uid);

    let first_frame_offset: u64 = if encapsulated {
      12 + 8 + 4 * bot.len() as u64
    } else {
      self.stream.seek(SeekFrom::Start(pixel_data_offset))?;
      let pixel_header = header::read_element_header(&mut self.stream, self.implicit_vr)?;
      pixel_header.header_length as u64
    };

    let frame_offset = bot.offset(number)?;
    self
      .stream
      .seek(SeekFrom::Start(pixel_data_offset + first_frame_offset + frame_offset))?;

    let geometry = read_pixel_geometry(metadata)?;
    let bits_stored =
      read_optional_u16(metadata, Tag28::BITS_STORED).unwrap_or(geometry.bits_allocated);
    let pixel_representation = read_optional_u16(metadata, Tag28::PIXEL_REPRESENTATION).unwrap_or(0);
    let planar_configuration = read_optional_u16(metadata, Tag28::PLANAR_CONFIGURATION).unwrap_or(0);
    let photometric_interpretation = metadata
      .get(Tag28::PHOTOMETRIC_INTERPRETATION)
      .ok()
      .and_then(|e| e.value.string_at(0).ok())
      .unwrap_or("")
      .to_string();

    let length: u64 = if encapsulated {
      let (item_tag, item_length) = header::read_item_header(&mut self.stream)?;
      if item_tag != tag::ITEM {
        log::error(&format!(
          "rejecting read_frame #{number}: expected a frame Item, found {item_tag}"
        ));
        return Err(Error::UnexpectedTag { expected: "Item".to_string(), tag: item_tag });
      }
      item_length as u64
    } else {
      let bytes_per_sample = geometry.bits_allocated.div_ceil(8) as u64;
      geometry.rows as u64 * geometry.columns as u64 * geometry.samples_per_pixel as u64 * bytes_per_sample
    };

    let mut buffer = vec![0u8; length as usize];
    self.stream.read_exact(&mut buffer)?;

    Ok(Frame {
      frame_number: number,
      buffer,
      rows: geometry.rows,
      columns: geometry.columns,
      samples_per_pixel: geometry.samples_per_pixel,
      bits_allocated: geometry.bits_allocated,
      bits_stored,
      pixel_representation,
      planar_configuration,
      photometric_interpretation,
      transfer_syntax_uid: self.transfer_syntax_uid.clone(),
    })
  }

  fn pixel_data_offset(&self) -> Result<u64, Error> {
    self.pixel_data_offset.ok_or_else(|| {
      log::error(&format!(
        "rejecting lookup: {} not yet located; call read_metadata first",
        tag::PIXEL_DATA
      ));
      Error::MissingElement {
        tag: tag::PIXEL_DATA,
        context: "Pixel Data element not yet located; call read_metadata first".to_string(),
      }
    })
  }
}

struct PixelGeometry {
  rows: u16,
  columns: u16,
  samples_per_pixel: u16,
  bits_allocated: u16,
}

struct Tag28;
impl Tag28 {
  const ROWS: tag::Tag = tag::Tag::new(0x0028, 0x0010);
  const COLUMNS: tag::Tag = tag::Tag::new(0x0028, 0x0011);
  const SAMPLES_PER_PIXEL: tag::Tag = tag::Tag::new(0x0028, 0x0002);
  const BITS_ALLOCATED: tag::Tag = tag::Tag::new(0x0028, 0x0100);
  const BITS_STORED: tag::Tag = tag::Tag::new(0x0028, 0x0101);
  const PIXEL_REPRESENTATION: tag::Tag = tag::Tag::new(0x0028, 0x0103);
  const PLANAR_CONFIGURATION: tag::Tag = tag::Tag::new(0x0028, 0x0006);
  const PHOTOMETRIC_INTERPRETATION: tag::Tag = tag::Tag::new(0x0028, 0x0004);
}

fn read_required_u16(metadata: &DataSet, t: tag::Tag) -> Result<u16, Error> {
  let element = metadata.get(t)?;
  match &element.value {
    Value::UnsignedShort(values) if !values.is_empty() => Ok(values[0]),
    _ => Err(Error::MalformedValue { details: format!("{t} is not a single US value") }),
  }
}

fn read_optional_u16(metadata: &DataSet, t: tag::Tag) -> Option<u16> {
  read_required_u16(metadata, t).ok()
}

fn read_pixel_geometry(metadata: &DataSet) -> Result<PixelGeometry, Error> {
  let required = |t: tag::Tag| {
    read_required_u16(metadata, t).map_err(|e| {
      log::error(&format!("rejecting pixel geometry lookup of {t}: {e}"));
      e
    })
  };

  Ok(PixelGeometry {
    rows: required(Tag28::ROWS)?,
    columns: required(Tag28::COLUMNS)?,
    samples_per_pixel: required(Tag28::SAMPLES_PER_PIXEL)?,
    bits_allocated: required(Tag28::BITS_ALLOCATED)?,
  })
}

fn read_number_of_frames(metadata: &DataSet) -> Result<u32, Error> {
  let element = metadata.get(tag::NUMBER_OF_FRAMES).map_err(|e| {
    log::error(&format!("rejecting Number of Frames lookup: {e}"));
    e
  })?;
  let raw = element.value.string_at(0)?;
  let n: u32 = raw.trim().parse().map_err(|_| {
    log::error(&format!("rejecting Number of Frames: not numeric: {raw:?}"));
    Error::MalformedValue { details: format!("Number of Frames not numeric: {raw:?}") }
  })?;

  if n == 0 {
    log::error("rejecting Number of Frames: value is zero");
    return Err(Error::MalformedValue { details: "Number of Frames is zero".to_string() });
  }

  Ok(n)
}
