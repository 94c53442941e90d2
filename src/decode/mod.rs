mod entry;

use log::debug;

use crate::{
    endian::{slice_at, ByteOrder, EndianConverter},
    error::TiffError,
    ifd::{self, Entry, ImageFileDirectory, Tag},
    TiffHeader,
};

/// Length of the TIFF header in bytes
pub(crate) const HEADER_LEN: usize = 8;
/// Format version constant following the byte order marker
pub(crate) const MAGIC: u16 = 42;

/// Parses the 8 byte header. A zero first IFD offset is rejected only after
/// every header field has been read.
pub(crate) fn read_header(bytes: &[u8]) -> Result<TiffHeader, TiffError> {
    let marker = slice_at(bytes, 0, 2)?;
    let byte_order = ByteOrder::from_marker([marker[0], marker[1]])
        .ok_or(TiffError::Malformed("unknown byte order marker"))?;
    let conv = EndianConverter::for_order(byte_order);
    let version = conv.to_u16(bytes, 2)?;
    let first_ifd_offset = conv.to_u32(bytes, 4)?;

    if first_ifd_offset == 0 {
        return Err(TiffError::Malformed("first IFD offset is zero"));
    }
    debug!("{byte_order:?} TIFF, version {version}, first IFD at {first_ifd_offset}");

    Ok(TiffHeader {
        byte_order,
        version,
        first_ifd_offset,
    })
}

/// Reads every IFD linked from the header, in file order.
pub(crate) fn read_ifds(
    bytes: &[u8],
    header: &TiffHeader,
) -> Result<Vec<ImageFileDirectory>, TiffError> {
    let mut ifds = Vec::new();
    let mut ifd_indices = Vec::new();

    let mut ifd_index = header.first_ifd_offset as usize;
    // The final IFD will have an offset of 0 for the next IFD
    while ifd_index != 0 {
        // Make sure we don't get stuck in an infinite loop if an IFD lists a
        // previous IFD as the next one
        if ifd_indices.contains(&ifd_index) {
            return Err(TiffError::Malformed("IFD chain loops"));
        }
        ifd_indices.push(ifd_index);

        let ifd = read_ifd(bytes, ifd_index, header.byte_order)?;
        debug!(
            "IFD {} at {ifd_index}: {} entries, {} strips",
            ifds.len(),
            ifd.entries().len(),
            ifd.strips().len()
        );
        ifd_index = ifd.next_ifd_offset() as usize;
        ifds.push(ifd);
    }

    Ok(ifds)
}

fn read_ifd(
    bytes: &[u8],
    ifd_index: usize,
    order: ByteOrder,
) -> Result<ImageFileDirectory, TiffError> {
    let conv = EndianConverter::for_order(order);
    let entry_count = conv.to_u16(bytes, ifd_index)? as usize;
    let entries_start_inx = ifd_index + ifd::ENTRY_COUNT_LEN;

    let entries = (0..entry_count)
        .map(|entry_num| Entry::read(bytes, entries_start_inx + entry_num * Entry::LEN, order))
        .collect::<Result<Vec<_>, _>>()?;

    let next_ifd_offset = conv.to_u32(bytes, entries_start_inx + entry_count * Entry::LEN)?;
    let strips = read_strips(bytes, &entries)?;

    Ok(ImageFileDirectory::new(entries, strips).with_next_offset(next_ifd_offset))
}

/// Copies the strips referenced by the StripOffsets and StripByteCounts
/// entries. An IFD missing either entry has no strips.
fn read_strips(bytes: &[u8], entries: &[Entry]) -> Result<Vec<Vec<u8>>, TiffError> {
    let find = |tag: Tag| entries.iter().find(|entry| entry.tag() == tag as u16);
    let (offsets, byte_counts) = match (find(Tag::StripOffsets), find(Tag::StripByteCounts)) {
        (Some(offsets), Some(byte_counts)) => (offsets, byte_counts),
        _ => return Ok(Vec::new()),
    };

    let (offsets, byte_counts) = offsets
        .as_usizes()
        .zip(byte_counts.as_usizes())
        .ok_or(TiffError::Malformed("strip offsets or byte counts are not integers"))?;
    if offsets.len() != byte_counts.len() {
        return Err(TiffError::Malformed(
            "strip offsets and byte counts differ in length",
        ));
    }

    offsets
        .into_iter()
        .zip(byte_counts)
        .map(|(offset, byte_count)| slice_at(bytes, offset, byte_count).map(<[u8]>::to_vec))
        .collect()
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

    use super::*;

    /// Writes a TIFF by hand: each IFD is a list of (tag, type, count,
    /// value field) records, placed back to back after the header.
    fn build<E: byteorder::ByteOrder>(
        marker: &[u8; 2],
        ifds: &[Vec<(u16, u16, u32, [u8; 4])>],
        trailer: &[u8],
    ) -> Vec<u8> {
        let mut bytes = marker.to_vec();
        bytes.write_u16::<E>(MAGIC).unwrap();
        bytes.write_u32::<E>(HEADER_LEN as u32).unwrap();
        let mut ifd_inx = HEADER_LEN;
        for (num, records) in ifds.iter().enumerate() {
            bytes.write_u16::<E>(records.len() as u16).unwrap();
            for (tag, field_type, count, value) in records {
                bytes.write_u16::<E>(*tag).unwrap();
                bytes.write_u16::<E>(*field_type).unwrap();
                bytes.write_u32::<E>(*count).unwrap();
                bytes.extend(value);
            }
            ifd_inx += ifd::get_len(records.len());
            let next = if num + 1 == ifds.len() { 0 } else { ifd_inx };
            bytes.write_u32::<E>(next as u32).unwrap();
        }
        bytes.extend(trailer);
        bytes
    }

    fn be_short(value: u16) -> [u8; 4] {
        let [a, b] = value.to_be_bytes();
        [a, b, 0, 0]
    }

    #[test]
    fn zero_first_offset_is_malformed_after_header_is_read() {
        let bytes = [b'I', b'I', 42, 0, 0, 0, 0, 0];
        assert!(matches!(
            read_header(&bytes),
            Err(TiffError::Malformed("first IFD offset is zero"))
        ));
        let bytes = [b'M', b'M', 0, 42, 0, 0, 0, 0];
        assert!(matches!(read_header(&bytes), Err(TiffError::Malformed(_))));
    }

    #[test]
    fn header_fields() {
        let bytes = [b'M', b'M', 0, 42, 0, 0, 0, 8];
        let header = read_header(&bytes).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert_eq!(header.version, 42);
        assert_eq!(header.first_ifd_offset, 8);
    }

    #[test]
    fn bad_marker_and_short_header() {
        assert!(matches!(
            read_header(b"XX\0*\x08\0\0\0"),
            Err(TiffError::Malformed("unknown byte order marker"))
        ));
        assert!(matches!(
            read_header(b"II*\0"),
            Err(TiffError::OutOfRange { .. })
        ));
    }

    #[test]
    fn three_ifds_in_file_order() {
        let bytes = build::<BigEndian>(
            b"MM",
            &[
                vec![(256, 3, 1, be_short(1))],
                vec![(256, 3, 1, be_short(2)), (257, 3, 1, be_short(2))],
                vec![(256, 3, 1, be_short(3))],
            ],
            &[],
        );
        let header = read_header(&bytes).unwrap();
        let ifds = read_ifds(&bytes, &header).unwrap();

        assert_eq!(ifds.len(), 3);
        let widths: Vec<_> = ifds
            .iter()
            .map(|ifd| ifd.find(256).and_then(Entry::as_usizes).unwrap()[0])
            .collect();
        assert_eq!(widths, [1, 2, 3]);
        assert_ne!(ifds[0].next_ifd_offset(), 0);
        assert_ne!(ifds[1].next_ifd_offset(), 0);
        assert_eq!(ifds[2].next_ifd_offset(), 0);
    }

    #[test]
    fn looping_chain_is_malformed() {
        let mut bytes = build::<LittleEndian>(b"II", &[vec![]], &[]);
        // Point the only IFD back at itself
        bytes[10..14].copy_from_slice(&8u32.to_le_bytes());
        let header = read_header(&bytes).unwrap();
        assert!(matches!(
            read_ifds(&bytes, &header),
            Err(TiffError::Malformed("IFD chain loops"))
        ));
    }

    #[test]
    fn strips_are_loaded() {
        // header 8 + ifd (2 + 2 * 12 + 4) = 38
        let mut offsets = [0; 4];
        (&mut offsets[..]).write_u16::<LittleEndian>(38).unwrap();
        (&mut offsets[2..]).write_u16::<LittleEndian>(41).unwrap();
        let mut counts = [0; 4];
        (&mut counts[..]).write_u16::<LittleEndian>(3).unwrap();
        (&mut counts[2..]).write_u16::<LittleEndian>(2).unwrap();
        let bytes = build::<LittleEndian>(
            b"II",
            &[vec![(273, 3, 2, offsets), (279, 3, 2, counts)]],
            &[1, 2, 3, 4, 5],
        );

        let header = read_header(&bytes).unwrap();
        let ifds = read_ifds(&bytes, &header).unwrap();
        assert_eq!(ifds[0].strips(), [vec![1u8, 2, 3], vec![4u8, 5]]);
    }

    #[test]
    fn strip_past_end_is_out_of_range() {
        let bytes = build::<LittleEndian>(
            b"II",
            &[vec![(273, 4, 1, 38u32.to_le_bytes()), (279, 4, 1, 10u32.to_le_bytes())]],
            &[1, 2, 3],
        );
        let header = read_header(&bytes).unwrap();
        assert!(matches!(
            read_ifds(&bytes, &header),
            Err(TiffError::OutOfRange { offset: 38, len: 10, size: 41 })
        ));
    }

    #[test]
    fn unknown_type_aborts_the_read() {
        let bytes = build::<BigEndian>(b"MM", &[vec![(256, 99, 1, [0; 4])]], &[]);
        let header = read_header(&bytes).unwrap();
        assert!(matches!(
            read_ifds(&bytes, &header),
            Err(TiffError::UnsupportedType(99))
        ));
    }
}
