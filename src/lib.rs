//! Reading and re-serializing TIFF containers: the IFD chain, its tagged
//! entries and the image strips they reference.

use std::io::{Cursor, Read, Seek, Write};

pub mod endian;
pub mod error;
pub mod ifd;
pub mod property;
mod render;
pub mod types;

mod decode;
mod encode;

pub use endian::{ByteOrder, EndianConverter};
pub use error::TiffError;
pub use ifd::{Entry, FieldType, ImageFileDirectory, Tag};
pub use property::{
    DecodeContext, Property, PropertyDecoder, ReadOptions, StandardDecoder, TextEncoding, Value,
};
pub use types::{SRational, URational};

/// The fixed 8 byte start of every TIFF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// Format version constant, 42 for TIFF
    pub version: u16,
    pub first_ifd_offset: u32,
}

/// A TIFF held entirely in memory.
#[derive(Clone, Debug)]
pub struct TiffFile {
    header: TiffHeader,
    ifds: Vec<ImageFileDirectory>,
    properties: Vec<Property>,
}

impl TiffFile {
    /// Reads a whole TIFF from `reader`, decoding properties with
    /// [`StandardDecoder`] and UTF-8 text.
    pub fn read<R: Read>(reader: R) -> Result<Self, TiffError> {
        Self::read_with(reader, ReadOptions::default(), &StandardDecoder)
    }

    /// Reads a whole TIFF from `reader`. Only the entries of the first IFD
    /// are decoded into properties; every IFD is kept.
    pub fn read_with<R: Read, D: PropertyDecoder + ?Sized>(
        mut reader: R,
        options: ReadOptions,
        decoder: &D,
    ) -> Result<Self, TiffError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes_with(&bytes, options, decoder)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TiffError> {
        Self::from_bytes_with(bytes, ReadOptions::default(), &StandardDecoder)
    }

    pub fn from_bytes_with<D: PropertyDecoder + ?Sized>(
        bytes: &[u8],
        options: ReadOptions,
        decoder: &D,
    ) -> Result<Self, TiffError> {
        let header = decode::read_header(bytes)?;
        let ifds = decode::read_ifds(bytes, &header)?;
        let properties = decode_properties(&header, &ifds, options, decoder);
        Ok(Self {
            header,
            ifds,
            properties,
        })
    }

    /// Builds a native order file from directories assembled in memory.
    pub fn new(ifds: Vec<ImageFileDirectory>) -> Self {
        let header = TiffHeader {
            byte_order: ByteOrder::native(),
            version: decode::MAGIC,
            first_ifd_offset: decode::HEADER_LEN as u32,
        };
        let properties =
            decode_properties(&header, &ifds, ReadOptions::default(), &StandardDecoder);
        Self {
            header,
            ifds,
            properties,
        }
    }

    /// The header as read. Saving does not update it.
    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// Directories in file order.
    pub fn ifds(&self) -> &[ImageFileDirectory] {
        &self.ifds
    }

    pub fn ifds_mut(&mut self) -> &mut Vec<ImageFileDirectory> {
        &mut self.ifds
    }

    /// Properties decoded from the first IFD when the file was read or last
    /// refreshed.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Decodes the first IFD again, picking up edits and the strip entries
    /// rewritten by [`TiffFile::save`].
    pub fn refresh_properties<D: PropertyDecoder + ?Sized>(
        &mut self,
        options: ReadOptions,
        decoder: &D,
    ) {
        self.properties = decode_properties(&self.header, &self.ifds, options, decoder);
    }

    pub fn property(&self, tag: Tag) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.tag == tag as u16)
    }

    /// Writes the file in native byte order. The strip entries of every IFD
    /// are replaced by ones describing where the strips were written, so
    /// saving the same contents again produces the same bytes. Properties
    /// keep their decoded values until [`TiffFile::refresh_properties`].
    pub fn save<W: Write + Seek>(&mut self, mut stream: W) -> Result<(), TiffError> {
        encode::write_tiff(&mut self.ifds, &mut stream)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, TiffError> {
        let mut cursor = Cursor::new(Vec::new());
        self.save(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

fn decode_properties<D: PropertyDecoder + ?Sized>(
    header: &TiffHeader,
    ifds: &[ImageFileDirectory],
    options: ReadOptions,
    decoder: &D,
) -> Vec<Property> {
    // Only the 0th IFD describes the file; later IFDs are kept for saving.
    let Some(ifd0) = ifds.first() else {
        return Vec::new();
    };
    let context = DecodeContext {
        byte_order: header.byte_order,
        ifd_index: 0,
        text_encoding: options.text_encoding,
    };
    ifd0.entries()
        .iter()
        .map(|entry| decoder.decode(entry, &context))
        .collect()
}
