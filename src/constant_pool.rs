//! A stateless, forward-only walk over a class file's constant pool.
//!
//! The walker never parses entry *values* (it doesn't decode a `Class` entry's name index
//! or a `Methodref`'s target). It only knows each tag's on-disk width, which is all the
//! rewriter needs to locate Utf8 payloads and to skip everything else verbatim.

use byteorder::{ByteOrder, BigEndian};

use crate::error::{Error, Result};

/// The recognized constant-pool tag bytes, per the class-file format (spec revision 13).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEntryKind {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
}

impl PoolEntryKind {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => PoolEntryKind::Utf8,
            3 => PoolEntryKind::Integer,
            4 => PoolEntryKind::Float,
            5 => PoolEntryKind::Long,
            6 => PoolEntryKind::Double,
            7 => PoolEntryKind::Class,
            8 => PoolEntryKind::String,
            9 => PoolEntryKind::FieldRef,
            10 => PoolEntryKind::MethodRef,
            11 => PoolEntryKind::InterfaceMethodRef,
            12 => PoolEntryKind::NameAndType,
            15 => PoolEntryKind::MethodHandle,
            16 => PoolEntryKind::MethodType,
            17 => PoolEntryKind::Dynamic,
            18 => PoolEntryKind::InvokeDynamic,
            19 => PoolEntryKind::Module,
            20 => PoolEntryKind::Package,
            _ => return None,
        })
    }

    /// Occupies two logical constant-pool slots (Long and Double only).
    fn is_wide(self) -> bool {
        matches!(self, PoolEntryKind::Long | PoolEntryKind::Double)
    }
}

/// One visited constant-pool entry, passed to the walker's consumer.
#[derive(Debug, Clone, Copy)]
pub struct PoolEntry {
    pub logical_index: u16,
    pub kind: PoolEntryKind,
    pub entry_offset: usize,
    pub payload_offset: usize,
    pub payload_length: usize,
}

/// Visits every logical entry of the constant pool starting at `start_offset`, in order,
/// calling `visit` for each one. Returns the byte offset immediately past the pool.
///
/// `pool_size` is the raw `constant_pool_count` field: entries are numbered `1..pool_size`.
pub fn walk(
    bytes: &[u8],
    pool_size: u16,
    start_offset: usize,
    mut visit: impl FnMut(PoolEntry) -> Result<()>,
) -> Result<usize> {
    let mut offset = start_offset;
    let mut index: u32 = 1;
    let limit = pool_size as u32;

    while index < limit {
        let entry_offset = offset;
        let tag = read_u1(bytes, offset)?;
        offset += 1;

        let kind = PoolEntryKind::from_tag(tag).ok_or(Error::UnsupportedClassVersion {
            tag,
            entry_index: index as u16,
        })?;

        let payload_offset;
        let payload_length;
        match kind {
            PoolEntryKind::Utf8 => {
                let len = read_u2(bytes, offset)? as usize;
                offset += 2;
                ensure_in_bounds(bytes, offset, len)?;
                payload_offset = offset;
                payload_length = len;
                offset += len;
            }
            PoolEntryKind::MethodHandle => {
                payload_offset = offset;
                payload_length = 3;
                advance(bytes, &mut offset, 3)?;
            }
            PoolEntryKind::Class
            | PoolEntryKind::String
            | PoolEntryKind::MethodType
            | PoolEntryKind::Module
            | PoolEntryKind::Package => {
                payload_offset = offset;
                payload_length = 2;
                advance(bytes, &mut offset, 2)?;
            }
            PoolEntryKind::Long | PoolEntryKind::Double => {
                payload_offset = offset;
                payload_length = 8;
                advance(bytes, &mut offset, 8)?;
            }
            _ => {
                payload_offset = offset;
                payload_length = 4;
                advance(bytes, &mut offset, 4)?;
            }
        };

        visit(PoolEntry {
            logical_index: index as u16,
            kind,
            entry_offset,
            payload_offset,
            payload_length,
        })?;

        index += if kind.is_wide() { 2 } else { 1 };
    }

    Ok(offset)
}

fn ensure_in_bounds(bytes: &[u8], offset: usize, len: usize) -> Result<()> {
    if offset.checked_add(len).map_or(true, |end| end > bytes.len()) {
        return Err(Error::MalformedClassFile(
            "constant pool entry runs past end of buffer",
        ));
    }
    Ok(())
}

fn advance(bytes: &[u8], offset: &mut usize, width: usize) -> Result<()> {
    ensure_in_bounds(bytes, *offset, width)?;
    *offset += width;
    Ok(())
}

fn read_u1(bytes: &[u8], offset: usize) -> Result<u8> {
    bytes
        .get(offset)
        .copied()
        .ok_or(Error::MalformedClassFile("unexpected end of buffer"))
}

fn read_u2(bytes: &[u8], offset: usize) -> Result<u16> {
    ensure_in_bounds(bytes, offset, 2)?;
    Ok(BigEndian::read_u16(&bytes[offset..]))
}
