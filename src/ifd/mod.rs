pub mod tags;

use std::borrow::Cow;

use crate::{
    endian::{EndianConverter, Primitive},
    types::{Long, SRational, Short, URational},
};

pub use tags::Tag;

/// Length of the entry count field in the IFD in bytes
pub(crate) const ENTRY_COUNT_LEN: usize = 2;
/// Length of the offset to the next IFD at the end of each IFD in bytes
pub(crate) const NEXT_IFD_OFFSET_LEN: usize = 4;
/// Length of the value-or-offset field of an entry in bytes
pub(crate) const VALUE_FIELD_LEN: usize = 4;

/// Returns the length of the IFD table
pub(crate) const fn get_len(fields: usize) -> usize {
    ENTRY_COUNT_LEN + fields * Entry::LEN + NEXT_IFD_OFFSET_LEN
}

/// Represents the id representing each ifd field type.
#[repr(u16)]
#[derive(strum::FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 8-bit unsigned integer.
    Byte = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be NUL (binary zero).
    Ascii = 2,
    /// 16-bit (2-byte) unsigned integer.
    Short = 3,
    /// 32-bit (4-byte) unsigned integer.
    Long = 4,
    /// Two LONGs: the first represents the numerator of a fraction; the second, the denominator.
    Rational = 5,
    SByte = 6,
    /// 8-bit byte that may contain anything.
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
}

impl FieldType {
    /// Size in bytes of one element of this type.
    pub const fn base_len(self) -> usize {
        match self {
            Self::Byte | Self::SByte | Self::Ascii | Self::Undefined => 1,
            Self::Short | Self::SShort => 2,
            Self::Long | Self::SLong | Self::Float => 4,
            Self::Rational | Self::SRational | Self::Double => 8,
        }
    }

    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// One tagged field of an IFD. `data` holds `count` elements in native
/// byte order.
///
/// A RATIONAL or SRATIONAL read from a file in the other byte order has each
/// 8 byte element reversed as a whole, so its denominator comes first. Such
/// entries report [`Entry::terms_swapped`] and are written back with the
/// numerator first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    tag: Short,
    field_type: FieldType,
    count: Long,
    data: Vec<u8>,
    terms_swapped: bool,
}

impl Entry {
    /// Length of each whole entry record in bytes
    pub(crate) const LEN: usize = 12;

    /// # Panics
    /// If `data` is not exactly `count` elements of `field_type`.
    pub fn new(tag: u16, field_type: FieldType, count: u32, data: Vec<u8>) -> Self {
        let expected = count as usize * field_type.base_len();
        if data.len() != expected {
            panic!(
                "Expected {count} {field_type:?} values ({expected} bytes) but got {} bytes",
                data.len()
            )
        }
        Self {
            tag,
            field_type,
            count,
            data,
            terms_swapped: false,
        }
    }

    /// Marks the terms of a rational payload as stored denominator first.
    /// No effect on other types.
    pub(crate) fn with_swapped_terms(mut self) -> Self {
        self.terms_swapped = self.is_rational();
        self
    }

    /// # Panics
    /// If there are more than `u32::MAX` values.
    fn from_values<T: Primitive>(tag: u16, field_type: FieldType, values: &[T]) -> Self {
        let data = EndianConverter::native().bytes_of(values);
        Self::new(tag, field_type, values.len().try_into().unwrap(), data)
    }

    pub fn bytes(tag: u16, bytes: &[u8]) -> Self {
        Self::from_values(tag, FieldType::Byte, bytes)
    }

    pub fn undefined(tag: u16, bytes: &[u8]) -> Self {
        Self::from_values(tag, FieldType::Undefined, bytes)
    }

    /// NUL terminated text
    pub fn ascii(tag: u16, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        Self::from_values(tag, FieldType::Ascii, &bytes)
    }

    pub fn shorts(tag: u16, values: &[u16]) -> Self {
        Self::from_values(tag, FieldType::Short, values)
    }

    pub fn longs(tag: u16, values: &[u32]) -> Self {
        Self::from_values(tag, FieldType::Long, values)
    }

    /// # Panics
    /// If there are more than `u32::MAX` values.
    pub fn rationals(tag: u16, values: &[URational]) -> Self {
        let terms: Vec<u32> = values
            .iter()
            .flat_map(|value| [value.numerator, value.denominator])
            .collect();
        let data = EndianConverter::native().bytes_of(&terms);
        Self::new(tag, FieldType::Rational, values.len().try_into().unwrap(), data)
    }

    pub fn srationals(tag: u16, values: &[SRational]) -> Self {
        let terms: Vec<i32> = values
            .iter()
            .flat_map(|value| [value.numerator, value.denominator])
            .collect();
        let data = EndianConverter::native().bytes_of(&terms);
        Self::new(tag, FieldType::SRational, values.len().try_into().unwrap(), data)
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Native-order payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether each rational element holds its denominator before its
    /// numerator.
    pub fn terms_swapped(&self) -> bool {
        self.terms_swapped
    }

    fn is_rational(&self) -> bool {
        matches!(self.field_type, FieldType::Rational | FieldType::SRational)
    }

    /// Payload as it belongs in a native order file, numerator first.
    pub(crate) fn file_data(&self) -> Cow<'_, [u8]> {
        if !self.terms_swapped {
            return Cow::Borrowed(self.data.as_slice());
        }
        let mut data = self.data.clone();
        for element in data.chunks_exact_mut(FieldType::Rational.base_len()) {
            element.rotate_left(element.len() / 2);
        }
        Cow::Owned(data)
    }

    /// Whether the payload fits in the entry record itself
    pub fn is_inline(&self) -> bool {
        self.data.len() <= VALUE_FIELD_LEN
    }

    /// Reads a SHORT or LONG entry as offsets or lengths. `None` for any
    /// other type.
    pub(crate) fn as_usizes(&self) -> Option<Vec<usize>> {
        let conv = EndianConverter::native();
        match self.field_type {
            FieldType::Short => self
                .data
                .chunks_exact(2)
                .map(|chunk| conv.to_u16(chunk, 0).ok().map(usize::from))
                .collect(),
            FieldType::Long => self
                .data
                .chunks_exact(4)
                .map(|chunk| conv.to_u32(chunk, 0).ok().map(|long| long as usize))
                .collect(),
            _ => None,
        }
    }
}

/// A table of entries plus the strips it references, linked to the next
/// table by file offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageFileDirectory {
    entries: Vec<Entry>,
    next_ifd_offset: Long,
    strips: Vec<Vec<u8>>,
}

impl ImageFileDirectory {
    pub fn new(entries: Vec<Entry>, strips: Vec<Vec<u8>>) -> Self {
        Self {
            entries,
            next_ifd_offset: 0,
            strips,
        }
    }

    pub(crate) fn with_next_offset(mut self, next_ifd_offset: Long) -> Self {
        self.next_ifd_offset = next_ifd_offset;
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    /// Offset of the next IFD as read from the file, 0 for the last one.
    pub fn next_ifd_offset(&self) -> u32 {
        self.next_ifd_offset
    }

    pub fn strips(&self) -> &[Vec<u8>] {
        &self.strips
    }

    pub fn strips_mut(&mut self) -> &mut Vec<Vec<u8>> {
        &mut self.strips
    }

    pub fn find(&self, tag: u16) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.tag() == tag)
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry)
    }

    /// Removes every entry with `tag`, returning how many were removed.
    pub fn remove(&mut self, tag: u16) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.tag() != tag);
        before - self.entries.len()
    }

    pub fn push_strip(&mut self, strip: Vec<u8>) {
        self.strips.push(strip)
    }
}
