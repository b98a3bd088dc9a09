//! Reader for DICOM Part 10 Media-Storage files.
//!
//! Parses a file into an in-memory metadata model and provides random
//! access to individual image frames of its pixel payload, without decoding
//! the pixel codecs themselves. See [`DicomFile`] for the entry point.

pub mod data_set;
pub mod dictionary;
pub mod error;
pub mod file;
pub mod frame;
pub mod header;
pub mod log;
pub mod reader;
pub mod sequence;
pub mod tag;
pub mod value;
pub mod vr;

pub use data_set::DataSet;
pub use error::{Error, ErrorDetail};
pub use file::DicomFile;
pub use frame::{BasicOffsetTable, Frame};
pub use log::LogLevel;
pub use sequence::Sequence;
pub use tag::Tag;
pub use value::{DataElementValue, Value};
pub use vr::ValueRepresentation;
