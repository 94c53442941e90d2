use std::io::{self, Seek, SeekFrom, Write};

use byteordered::{Endian, Endianness};
use log::debug;

use crate::{
    decode::{HEADER_LEN, MAGIC},
    endian::ByteOrder,
    error::TiffError,
    ifd::{self, Entry, ImageFileDirectory, Tag},
    types::Long,
};

/// Position of the first IFD offset within the header
const FIRST_IFD_OFFSET_INX: u64 = 4;

/// Writes the header and every IFD with its strips in native byte order.
///
/// StripOffsets and StripByteCounts are recomputed from where the strips
/// land and replace whatever the IFDs held before. Pointers to nested IFDs
/// are dropped since the nested IFDs are not written. Offsets are relative
/// to the stream position on entry.
pub(crate) fn write_tiff<W: Write + Seek>(
    ifds: &mut [ImageFileDirectory],
    stream: &mut W,
) -> Result<(), TiffError> {
    if ifds.is_empty() {
        return Err(TiffError::Malformed("no image file directories"));
    }

    let order = ByteOrder::native();
    let endianness = Endianness::from(order);
    let base = stream.stream_position()?;

    stream.write_all(&order.marker())?;
    endianness.write_u16(&mut *stream, MAGIC)?;
    // Byte offset of first IFD (immediately after the header). This is
    // overwritten once the strips preceding it are written.
    endianness.write_u32(&mut *stream, HEADER_LEN as Long)?;
    let mut pointer_inx = base + FIRST_IFD_OFFSET_INX;

    for (num, ifd) in ifds.iter_mut().enumerate() {
        ifd.remove(Tag::StripOffsets as u16);
        ifd.remove(Tag::StripByteCounts as u16);
        for pointer in Tag::SUB_IFD_POINTERS {
            if ifd.remove(pointer as u16) > 0 {
                debug!("dropped {} from IFD {num}", pointer.name());
            }
        }

        let mut strip_offsets = Vec::with_capacity(ifd.strips().len());
        let mut strip_byte_counts = Vec::with_capacity(ifd.strips().len());
        for strip in ifd.strips() {
            strip_offsets.push(offset32(stream.stream_position()? - base)?);
            strip_byte_counts.push(offset32(strip.len() as u64)?);
            stream.write_all(strip)?;
        }
        ifd.push(Entry::longs(Tag::StripOffsets as u16, &strip_offsets));
        ifd.push(Entry::longs(Tag::StripByteCounts as u16, &strip_byte_counts));

        let ifd_inx = align_and_get_pos(stream, base)?;
        write_at(stream, pointer_inx, offset32(ifd_inx - base)?, endianness)?;
        pointer_inx = write_ifd(stream, base, ifd.entries(), endianness)?;

        debug!(
            "wrote IFD {num} at {} with {} entries after {} strips",
            ifd_inx - base,
            ifd.entries().len(),
            strip_offsets.len()
        );
    }

    Ok(())
}

/// Writes the entry table, a zero next IFD offset and the payloads that do
/// not fit inline. Returns the position of the next IFD offset field.
fn write_ifd<W: Write + Seek>(
    stream: &mut W,
    base: u64,
    entries: &[Entry],
    endianness: Endianness,
) -> Result<u64, TiffError> {
    let entry_count = u16::try_from(entries.len())
        .map_err(|_| TiffError::Malformed("more than 65535 entries in one IFD"))?;
    let ifd_inx = stream.stream_position()?;
    // Out of line payloads follow the table; the table starts on a word
    // boundary and has an even length, so padding `extra` keeps them aligned.
    let extra_inx = ifd_inx + ifd::get_len(entries.len()) as u64;
    let mut extra = Vec::new();

    endianness.write_u16(&mut *stream, entry_count)?;
    for entry in entries {
        endianness.write_u16(&mut *stream, entry.tag())?;
        endianness.write_u16(&mut *stream, entry.field_type().code())?;
        endianness.write_u32(&mut *stream, entry.count())?;
        let data = entry.file_data();
        if entry.is_inline() {
            let mut value = [0; ifd::VALUE_FIELD_LEN];
            value[..data.len()].copy_from_slice(&data);
            stream.write_all(&value)?;
        } else {
            if extra.len() % 2 == 1 {
                extra.push(0);
            }
            let value_offset = offset32(extra_inx + extra.len() as u64 - base)?;
            endianness.write_u32(&mut *stream, value_offset)?;
            extra.extend_from_slice(&data);
        }
    }

    let next_ifd_offset_inx = stream.stream_position()?;
    endianness.write_u32(&mut *stream, 0)?;
    stream.write_all(&extra)?;

    Ok(next_ifd_offset_inx)
}

fn offset32(offset: u64) -> Result<Long, TiffError> {
    Long::try_from(offset).map_err(|_| TiffError::Malformed("offset exceeds the 32-bit range"))
}

/// Pads with a zero byte if the stream is not on a word boundary relative
/// to `base`, then returns the position.
fn align_and_get_pos<W: Write + Seek>(stream: &mut W, base: u64) -> io::Result<u64> {
    let pos = stream.stream_position()?;
    if (pos - base) % 2 == 1 {
        stream.write_all(&[0])?;
        return Ok(pos + 1);
    }
    Ok(pos)
}

/// Overwrites the LONG at `inx` and returns to the current position.
fn write_at<W: Write + Seek>(
    stream: &mut W,
    inx: u64,
    value: Long,
    endianness: Endianness,
) -> io::Result<()> {
    let orig = stream.stream_position()?;
    stream.seek(SeekFrom::Start(inx))?;
    endianness.write_u32(&mut *stream, value)?;
    stream.seek(SeekFrom::Start(orig))?;
    Ok(())
}
