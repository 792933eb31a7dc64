//! The mapping table: an immutable, validated set of `(from, to)` byte-sequence pairs,
//! produced by a single-threaded [`MappingBuilder`].

use std::thread::{self, ThreadId};

use crate::error::{Error, Result};
use crate::modutf8;

/// One `(from, to)` pair, already encoded to modified UTF-8 bytes.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub from: Vec<u8>,
    pub to: Vec<u8>,
}

/// An immutable, non-overlapping collection of mapping entries.
///
/// Cheap to clone (or share behind an `Arc`) and safe to use from many threads at once,
/// since nothing about it is mutable once built.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    min_from_length: usize,
}

impl MappingTable {
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn min_from_length(&self) -> usize {
        self.min_from_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a [`MappingTable`], rejecting empty or overlapping entries as they're added.
///
/// Bound to the thread that created it: calling `add` or `build` from any other thread
/// fails with [`Error::ThreadBindingViolation`]. `build` consumes the builder, so reuse
/// after building is a compile-time error rather than a checked runtime one.
pub struct MappingBuilder {
    owner: ThreadId,
    from_texts: Vec<String>,
    entries: Vec<MappingEntry>,
}

impl Default for MappingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingBuilder {
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            from_texts: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Adds a `(from_text, to_text)` pair, encoding both to modified UTF-8.
    ///
    /// Fails if either string is empty, if `from_text` overlaps (contains, or is
    /// contained by) any `from` already added, or if called off-thread.
    pub fn add(&mut self, from_text: &str, to_text: &str) -> Result<&mut Self> {
        self.check_thread()?;

        if from_text.is_empty() {
            return Err(Error::InvalidArgument("`from` text must not be empty".into()));
        }
        if to_text.is_empty() {
            return Err(Error::InvalidArgument("`to` text must not be empty".into()));
        }

        for existing in &self.from_texts {
            if existing.contains(from_text.as_str()) || from_text.contains(existing.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "`{from_text}` overlaps with an already-registered mapping `{existing}`"
                )));
            }
        }

        self.from_texts.push(from_text.to_string());
        self.entries.push(MappingEntry {
            from: modutf8::encode(from_text),
            to: modutf8::encode(to_text),
        });
        Ok(self)
    }

    /// Freezes the builder into an immutable [`MappingTable`].
    ///
    /// Fails if no entries were added. Consumes `self`: there is no way to call `build`
    /// twice on the same builder.
    pub fn build(self) -> Result<MappingTable> {
        self.check_thread()?;

        if self.entries.is_empty() {
            return Err(Error::IllegalState(
                "mapping table must have at least one entry",
            ));
        }

        let min_from_length = self
            .entries
            .iter()
            .map(|e| e.from.len())
            .min()
            .expect("checked non-empty above");

        Ok(MappingTable {
            entries: self.entries,
            min_from_length,
        })
    }

    fn check_thread(&self) -> Result<()> {
        if thread::current().id() != self.owner {
            return Err(Error::ThreadBindingViolation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_table_with_min_from_length() {
        let mut builder = MappingBuilder::new();
        builder.add("javax/", "jakarta/").unwrap();
        builder.add("foo", "barbaz").unwrap();
        let table = builder.build().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.min_from_length(), 3); // "foo" encodes to 3 bytes
    }

    #[test]
    fn rejects_empty_from_or_to() {
        let mut builder = MappingBuilder::new();
        assert!(matches!(
            builder.add("", "x").unwrap_err(),
            Error::InvalidArgument(_)
        ));
        assert!(matches!(
            builder.add("x", "").unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn rejects_overlapping_from_texts_either_direction() {
        let mut builder = MappingBuilder::new();
        builder.add("javax/persistence", "jakarta/persistence").unwrap();

        assert!(builder.add("javax/", "jakarta/").is_err()); // shorter, contained
        assert!(builder
            .add("javax/persistence/Entity", "jakarta/persistence/Entity")
            .is_err()); // longer, contains existing
    }

    #[test]
    fn build_fails_on_empty_table() {
        let builder = MappingBuilder::new();
        assert!(matches!(
            builder.build().unwrap_err(),
            Error::IllegalState(_)
        ));
    }

    #[test]
    fn cross_thread_use_is_rejected() {
        let mut builder = MappingBuilder::new();
        let err = std::thread::scope(|s| {
            s.spawn(|| builder.add("a", "b").unwrap_err())
                .join()
                .unwrap()
        });
        assert!(matches!(err, Error::ThreadBindingViolation));
    }
}
