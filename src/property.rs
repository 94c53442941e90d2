//! Tag-level interpretation of directory entries.
//!
//! The reader hands each entry of the 0th IFD to a [`PropertyDecoder`]
//! together with a [`DecodeContext`]. [`StandardDecoder`] turns the payload
//! into a typed [`Value`]; callers with their own tag tables can supply a
//! different decoder through [`crate::TiffFile::read_with`].

use crate::{
    endian::{ByteOrder, Primitive},
    ifd::{Entry, FieldType, Tag},
    types::{SRational, URational},
};

/// How ASCII fields are turned into text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// Invalid sequences become U+FFFD.
    #[default]
    Utf8,
    /// ISO 8859-1: every byte is the code point of the same value.
    Latin1,
    /// Bytes above 0x7F become U+FFFD.
    Ascii,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&byte| char::from(byte)).collect(),
            Self::Ascii => bytes
                .iter()
                .map(|&byte| {
                    if byte.is_ascii() {
                        char::from(byte)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
        }
    }
}

/// Options for [`crate::TiffFile::read_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub text_encoding: TextEncoding,
}

/// Where an entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeContext {
    /// Byte order of the source file. Entry payloads are already native,
    /// apart from rational terms (see [`Entry::terms_swapped`]).
    pub byte_order: ByteOrder,
    pub ifd_index: usize,
    pub text_encoding: TextEncoding,
}

/// Turns a raw entry into a named, typed property.
pub trait PropertyDecoder {
    fn decode(&self, entry: &Entry, context: &DecodeContext) -> Property;
}

/// A decoded entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub tag: u16,
    pub ifd_index: usize,
    pub value: Value,
}

impl Property {
    /// The well known tag, if this is one.
    pub fn known_tag(&self) -> Option<Tag> {
        Tag::from_repr(self.tag)
    }

    pub fn name(&self) -> Option<&'static str> {
        self.known_tag().map(Tag::name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bytes(Vec<u8>),
    Ascii(String),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Rationals(Vec<URational>),
    SBytes(Vec<i8>),
    Undefined(Vec<u8>),
    SShorts(Vec<i16>),
    SLongs(Vec<i32>),
    SRationals(Vec<SRational>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl Value {
    /// The value if it is a single unsigned integer.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Bytes(values) => single(values).map(u32::from),
            Value::Shorts(values) => single(values).map(u32::from),
            Value::Longs(values) => single(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ascii(text) => Some(text),
            _ => None,
        }
    }
}

fn single<T: Copy>(values: &[T]) -> Option<T> {
    match values {
        &[value] => Some(value),
        _ => None,
    }
}

/// Interprets every entry by its field type alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardDecoder;

impl PropertyDecoder for StandardDecoder {
    fn decode(&self, entry: &Entry, context: &DecodeContext) -> Property {
        let data = entry.data();
        let value = match entry.field_type() {
            FieldType::Byte => Value::Bytes(data.to_vec()),
            FieldType::Ascii => {
                let text = data.split(|&byte| byte == 0).next().unwrap_or_default();
                Value::Ascii(context.text_encoding.decode(text))
            }
            FieldType::Short => Value::Shorts(elements(data)),
            FieldType::Long => Value::Longs(elements(data)),
            FieldType::Rational => Value::Rationals(
                rational_terms::<u32>(data, entry.terms_swapped())
                    .map(|(numerator, denominator)| URational::new(numerator, denominator))
                    .collect(),
            ),
            FieldType::SByte => Value::SBytes(elements(data)),
            FieldType::Undefined => Value::Undefined(data.to_vec()),
            FieldType::SShort => Value::SShorts(elements(data)),
            FieldType::SLong => Value::SLongs(elements(data)),
            FieldType::SRational => Value::SRationals(
                rational_terms::<i32>(data, entry.terms_swapped())
                    .map(|(numerator, denominator)| SRational::new(numerator, denominator))
                    .collect(),
            ),
            FieldType::Float => Value::Floats(elements(data)),
            FieldType::Double => Value::Doubles(elements(data)),
        };
        Property {
            tag: entry.tag(),
            ifd_index: context.ifd_index,
            value,
        }
    }
}

fn elements<T: Primitive>(data: &[u8]) -> Vec<T> {
    data.chunks_exact(T::SIZE)
        .map(T::from_native_bytes)
        .collect()
}

/// Numerator and denominator of each 8 byte rational, `swapped` when the
/// denominator is stored first.
fn rational_terms<T: Primitive>(
    data: &[u8],
    swapped: bool,
) -> impl Iterator<Item = (T, T)> + '_ {
    data.chunks_exact(2 * T::SIZE).map(move |chunk| {
        let (first, second) = chunk.split_at(T::SIZE);
        let (first, second) = (T::from_native_bytes(first), T::from_native_bytes(second));
        if swapped {
            (second, first)
        } else {
            (first, second)
        }
    })
}
