//! Ordered mapping from tag to Data Element, with lock/seal, per `spec.md`
//! §3 and §4.3.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::log;
use crate::tag::Tag;
use crate::value::DataElementValue;

/// A mutable-then-sealed collection of Data Elements, keyed by tag.
///
/// Iteration is always in ascending-tag order, since [`Tag`]'s `Ord` impl is
/// the natural integer order and the backing store is a [`BTreeMap`].
#[derive(Clone, Debug, Default)]
pub struct DataSet {
  elements: BTreeMap<Tag, DataElementValue>,
  sealed: bool,
}

impl DataSet {
  /// Creates a new, empty, mutable Data Set.
  pub fn create() -> Self {
    DataSet::default()
  }

  pub fn is_sealed(&self) -> bool {
    self.sealed
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }

  /// Inserts `element`. Fails with [`Error::Sealed`] if this set has been
  /// locked, or [`Error::DuplicateTag`] if the tag is already present.
  pub fn insert(&mut self, element: DataElementValue) -> Result<(), Error> {
    if self.sealed {
      log::error(&format!("rejecting insert of {}: data set is sealed", element.tag));
      return Err(Error::Sealed);
    }

    if self.elements.contains_key(&element.tag) {
      log::error(&format!("rejecting insert: {} is already present", element.tag));
      return Err(Error::DuplicateTag { tag: element.tag });
    }

    self.elements.insert(element.tag, element);
    Ok(())
  }

  /// Returns the element at `tag`, or [`Error::Io`]-free lookup failure.
  pub fn get(&self, tag: Tag) -> Result<&DataElementValue, Error> {
    self.elements.get(&tag).ok_or(Error::MissingElement {
      tag,
      context: "data set lookup".to_string(),
    })
  }

  pub fn contains(&self, tag: Tag) -> bool {
    self.elements.contains_key(&tag)
  }

  /// Iterates elements in ascending-tag order.
  pub fn iterate(&self) -> impl Iterator<Item = &DataElementValue> {
    self.elements.values()
  }

  /// Seals this Data Set. One-way: a sealed set can never become mutable
  /// again. Automatic at the end of each successful parse.
  pub fn lock(&mut self) {
    self.sealed = true;
  }

  /// Returns the `(0002,0010)` Transfer Syntax UID, if present.
  pub fn transfer_syntax_uid(&self) -> Result<&str, Error> {
    self.get(crate::tag::TRANSFER_SYNTAX_UID)?.value.string_at(0)
  }

  /// Writes a human-readable walk of this Data Set to the log sink at
  /// `info` level, per `spec.md` §4.3.
  pub fn print(&self, indent: usize) {
    let prefix = "  ".repeat(indent);
    for element in self.iterate() {
      let keyword = crate::dictionary::lookup_keyword(element.tag);
      log::info(&format!(
        "{prefix}{} {} {keyword} = {}",
        element.tag,
        element.vr(),
        element.value.preview()
      ));

      if let Ok(seq) = element.value.sequence() {
        for (index, item) in seq.iterate().enumerate() {
          log::info(&format!("{prefix}  Item #{index}"));
          item.print(indent + 2);
        }
      }
    }
  }
}
