use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the core: building a [`crate::MappingTable`] or
/// running [`crate::transform`] over a class file.
#[derive(Debug)]
pub enum Error {
    /// A [`crate::MappingBuilder::add`] call was given an empty `from`/`to`, or a `from`
    /// that overlaps (contains, or is contained by) one already registered.
    InvalidArgument(String),
    /// [`crate::MappingBuilder::build`] was called with no entries added.
    IllegalState(&'static str),
    /// A builder method was called from a thread other than the one that created it.
    ThreadBindingViolation,
    /// The constant pool contains a tag byte that isn't one of the recognized kinds.
    UnsupportedClassVersion { tag: u8, entry_index: u16 },
    /// The cursor would read past the end of the buffer, or a structural count is
    /// inconsistent (e.g. a Long/Double in the last pool slot).
    MalformedClassFile(&'static str),
    /// A patched Utf8 entry's length prefix would exceed 65535.
    LengthOverflow { entry_index: u16 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid mapping entry: {msg}"),
            Error::IllegalState(msg) => write!(f, "illegal builder state: {msg}"),
            Error::ThreadBindingViolation => {
                write!(f, "mapping builder used from a thread other than its owner")
            }
            Error::UnsupportedClassVersion { tag, entry_index } => write!(
                f,
                "unsupported constant pool tag {tag} at entry #{entry_index}"
            ),
            Error::MalformedClassFile(msg) => write!(f, "malformed class file: {msg}"),
            Error::LengthOverflow { entry_index } => write!(
                f,
                "patched Utf8 entry #{entry_index} would exceed 65535 bytes"
            ),
        }
    }
}

impl std::error::Error for Error {}
