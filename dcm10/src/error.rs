//! The error taxonomy named in `spec.md` §7.
//!
//! Modeled on this project's own `P10Error`: a plain enum with manual
//! `Display`, a `kind_name()`, and an [`ErrorDetail`] impl that renders a
//! structured multi-line description, rather than reaching for `thiserror`
//! (which this project's own core crates don't use either).

use owo_colors::OwoColorize;

use crate::tag::Tag;

/// An error produced while reading a DICOM Part 10 file.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
  /// The underlying stream failed to read or seek, or hit premature EOF.
  Io { details: String },

  /// The 128-byte preamble wasn't followed by the `DICM` magic.
  NotADicomFile { details: String },

  /// Non-zero reserved bytes in an explicit-VR long header, or an invalid
  /// item tag.
  MalformedHeader { details: String },

  /// A tag appeared where it isn't valid, e.g. a non-Item tag inside a
  /// sequence body, or a group-0x0002 element in the main Data Set.
  UnexpectedTag { expected: String, tag: Tag },

  /// VR bytes that aren't in the recognised set.
  InvalidVR { bytes: [u8; 2] },

  /// A tag failing the dictionary validity check.
  InvalidTag { tag: Tag },

  /// A recognised but unhandled VR at decode time.
  UnsupportedVR { vr: String },

  /// `insert` into a Data Set where the tag already exists.
  DuplicateTag { tag: Tag },

  /// Mutation attempted on a locked Data Set or Sequence.
  Sealed,

  /// Allocation failure.
  OutOfMemory,

  /// A required element (e.g. Number of Frames) is absent.
  MissingElement { tag: Tag, context: String },

  /// A value couldn't be parsed per its VR (e.g. Number of Frames isn't
  /// numeric, or ST/LT/UR/UT has VM > 1).
  MalformedValue { details: String },

  /// An encapsulated file had an empty Basic Offset Table and no Extended
  /// Offset Table to fall back on.
  NoOffsetTable,

  /// An out-of-range index into a multi-valued element.
  InvalidIndex { index: usize },

  /// A programmer error: unknown file mode character, or frame number zero.
  BadArgument { details: String },
}

impl Error {
  pub fn kind_name(&self) -> &'static str {
    match self {
      Error::Io { .. } => "Io",
      Error::NotADicomFile { .. } => "NotADicomFile",
      Error::MalformedHeader { .. } => "MalformedHeader",
      Error::UnexpectedTag { .. } => "UnexpectedTag",
      Error::InvalidVR { .. } => "InvalidVR",
      Error::InvalidTag { .. } => "InvalidTag",
      Error::UnsupportedVR { .. } => "UnsupportedVR",
      Error::DuplicateTag { .. } => "DuplicateTag",
      Error::Sealed => "Sealed",
      Error::OutOfMemory => "OutOfMemory",
      Error::MissingElement { .. } => "MissingElement",
      Error::MalformedValue { .. } => "MalformedValue",
      Error::NoOffsetTable => "NoOffsetTable",
      Error::InvalidIndex { .. } => "InvalidIndex",
      Error::BadArgument { .. } => "BadArgument",
    }
  }
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Error::Io { details } => write!(f, "I/O error: {details}"),
      Error::NotADicomFile { details } => write!(f, "Not a DICOM file: {details}"),
      Error::MalformedHeader { details } => write!(f, "Malformed header: {details}"),
      Error::UnexpectedTag { expected, tag } => {
        write!(f, "Unexpected tag {tag}, expected {expected}")
      }
      Error::InvalidVR { bytes } => write!(
        f,
        "Invalid VR bytes: {:?}",
        String::from_utf8_lossy(bytes)
      ),
      Error::InvalidTag { tag } => write!(f, "Invalid tag: {tag}"),
      Error::UnsupportedVR { vr } => write!(f, "Unsupported VR: {vr}"),
      Error::DuplicateTag { tag } => write!(f, "Duplicate tag: {tag}"),
      Error::Sealed => write!(f, "Data set or sequence is sealed"),
      Error::OutOfMemory => write!(f, "Out of memory"),
      Error::MissingElement { tag, context } => {
        write!(f, "Missing required element {tag} ({context})")
      }
      Error::MalformedValue { details } => write!(f, "Malformed value: {details}"),
      Error::NoOffsetTable => write!(f, "No basic or extended offset table present"),
      Error::InvalidIndex { index } => write!(f, "Invalid value index: {index}"),
      Error::BadArgument { details } => write!(f, "Bad argument: {details}"),
    }
  }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Error::Io { details: e.to_string() }
  }
}

/// Renders an error as a structured, human-readable block, for use by
/// `dcm10-dump` and anywhere else errors reach a terminal.
pub trait ErrorDetail {
  fn to_lines(&self, task_description: &str) -> Vec<String>;

  fn print(&self, task_description: &str) {
    eprintln!("{}", "-----".red());
    for line in self.to_lines(task_description) {
      eprintln!("{}", line.red());
    }
    eprintln!("{}", "-----".red());
  }
}

impl ErrorDetail for Error {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    vec![
      format!("DICOM error {task_description}"),
      String::new(),
      format!("  Kind: {}", self.kind_name()),
      format!("  Details: {self}"),
    ]
  }
}
