use byteorder::NativeEndian;

use crate::error::TiffError;

/// Byte layout of multi-byte values in a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the running platform.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::LittleEndian
        } else {
            Self::BigEndian
        }
    }

    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::native()),
            (Self::LittleEndian, Self::LittleEndian) | (Self::BigEndian, Self::BigEndian)
        )
    }

    /// The two byte marker opening a TIFF header.
    pub const fn marker(self) -> [u8; 2] {
        match self {
            Self::LittleEndian => *b"II",
            Self::BigEndian => *b"MM",
        }
    }

    pub const fn from_marker(marker: [u8; 2]) -> Option<Self> {
        match &marker {
            b"II" => Some(Self::LittleEndian),
            b"MM" => Some(Self::BigEndian),
            _ => None,
        }
    }
}

impl From<ByteOrder> for byteordered::Endianness {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::LittleEndian => byteordered::Endianness::Little,
            ByteOrder::BigEndian => byteordered::Endianness::Big,
        }
    }
}

/// A numeric value with a fixed size that can be read from and written to
/// raw bytes in the platform's native layout.
pub trait Primitive: Copy {
    const SIZE: usize;

    /// # Panics
    /// If `bytes` is shorter than [`Self::SIZE`].
    fn from_native_bytes(bytes: &[u8]) -> Self;

    /// # Panics
    /// If `bytes` is shorter than [`Self::SIZE`].
    fn write_native_bytes(self, bytes: &mut [u8]);
}

impl Primitive for u8 {
    const SIZE: usize = 1;

    fn from_native_bytes(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_native_bytes(self, bytes: &mut [u8]) {
        bytes[0] = self
    }
}

impl Primitive for i8 {
    const SIZE: usize = 1;

    fn from_native_bytes(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_native_bytes(self, bytes: &mut [u8]) {
        bytes[0] = self as u8
    }
}

macro_rules! impl_primitive {
    ($ty:ty, $size:expr, $read:ident, $write:ident) => {
        impl Primitive for $ty {
            const SIZE: usize = $size;

            fn from_native_bytes(bytes: &[u8]) -> Self {
                <NativeEndian as byteorder::ByteOrder>::$read(bytes)
            }

            fn write_native_bytes(self, bytes: &mut [u8]) {
                <NativeEndian as byteorder::ByteOrder>::$write(bytes, self)
            }
        }
    };
}

impl_primitive!(u16, 2, read_u16, write_u16);
impl_primitive!(i16, 2, read_i16, write_i16);
impl_primitive!(u32, 4, read_u32, write_u32);
impl_primitive!(i32, 4, read_i32, write_i32);
impl_primitive!(u64, 8, read_u64, write_u64);
impl_primitive!(i64, 8, read_i64, write_i64);
impl_primitive!(f32, 4, read_f32, write_f32);
impl_primitive!(f64, 8, read_f64, write_f64);

/// Largest [`Primitive::SIZE`]
const MAX_PRIMITIVE_LEN: usize = 8;

/// Returns `len` bytes of `bytes` starting at `offset`.
pub(crate) fn slice_at(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], TiffError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| TiffError::out_of_range(offset, len, bytes.len()))
}

/// Reads a `T` stored in `from` order at `offset` and returns it as if it
/// had been stored in `to` order.
pub fn convert<T: Primitive>(
    bytes: &[u8],
    offset: usize,
    from: ByteOrder,
    to: ByteOrder,
) -> Result<T, TiffError> {
    let mut scratch = [0; MAX_PRIMITIVE_LEN];
    let scratch = &mut scratch[..T::SIZE];
    scratch.copy_from_slice(slice_at(bytes, offset, T::SIZE)?);
    if from != to {
        scratch.reverse();
    }
    Ok(T::from_native_bytes(scratch))
}

/// Inverse of [`convert`]: the native bytes of `value`, reversed when the
/// two orders differ.
pub fn get_bytes<T: Primitive>(value: T, from: ByteOrder, to: ByteOrder) -> Vec<u8> {
    let mut bytes = vec![0; T::SIZE];
    value.write_native_bytes(&mut bytes);
    if from != to {
        bytes.reverse();
    }
    bytes
}

/// Converts primitives between a fixed pair of byte orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndianConverter {
    from: ByteOrder,
    to: ByteOrder,
}

impl EndianConverter {
    pub const fn new(from: ByteOrder, to: ByteOrder) -> Self {
        Self { from, to }
    }

    pub const fn little_to_native() -> Self {
        Self::new(ByteOrder::LittleEndian, ByteOrder::native())
    }

    pub const fn big_to_native() -> Self {
        Self::new(ByteOrder::BigEndian, ByteOrder::native())
    }

    /// Performs no reordering.
    pub const fn native() -> Self {
        Self::new(ByteOrder::native(), ByteOrder::native())
    }

    /// Converts from `order` to the platform's order.
    pub const fn for_order(order: ByteOrder) -> Self {
        Self::new(order, ByteOrder::native())
    }

    pub const fn source(&self) -> ByteOrder {
        self.from
    }

    pub const fn target(&self) -> ByteOrder {
        self.to
    }

    pub fn read<T: Primitive>(&self, bytes: &[u8], offset: usize) -> Result<T, TiffError> {
        convert(bytes, offset, self.from, self.to)
    }

    pub fn to_u16(&self, bytes: &[u8], offset: usize) -> Result<u16, TiffError> {
        self.read(bytes, offset)
    }

    pub fn to_u32(&self, bytes: &[u8], offset: usize) -> Result<u32, TiffError> {
        self.read(bytes, offset)
    }

    /// Reads one UTF-16 code unit. A lone surrogate decodes as
    /// [`char::REPLACEMENT_CHARACTER`].
    pub fn to_char(&self, bytes: &[u8], offset: usize) -> Result<char, TiffError> {
        let unit: u16 = self.read(bytes, offset)?;
        Ok(char::decode_utf16([unit])
            .next()
            .and_then(Result::ok)
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    pub fn bytes<T: Primitive>(&self, value: T) -> Vec<u8> {
        get_bytes(value, self.from, self.to)
    }

    /// The leading UTF-16 code unit of `c`; characters outside the Basic
    /// Multilingual Plane keep only their high surrogate.
    pub fn char_bytes(&self, c: char) -> Vec<u8> {
        let mut units = [0; 2];
        self.bytes(c.encode_utf16(&mut units)[0])
    }

    /// Converts every `T::SIZE` element of `values` in sequence.
    pub fn bytes_of<T: Primitive>(&self, values: &[T]) -> Vec<u8> {
        values.iter().flat_map(|value| self.bytes(*value)).collect()
    }
}
