use log::trace;

use crate::{
    endian::{slice_at, ByteOrder, EndianConverter},
    error::TiffError,
    ifd::{self, FieldType},
};

const TAG_INX: usize = 0;
const FIELD_TYPE_INX: usize = 2;
const COUNT_INX: usize = 4;
const VALUE_OFFSET_INX: usize = 8;

impl ifd::Entry {
    /// Parses the 12 byte entry record at `offset` of a file stored in
    /// `order`, following the value offset when the payload does not fit
    /// inline.
    pub fn read(bytes: &[u8], offset: usize, order: ByteOrder) -> Result<Self, TiffError> {
        let conv = EndianConverter::for_order(order);
        let tag = conv.to_u16(bytes, offset + TAG_INX)?;
        let raw_type = conv.to_u16(bytes, offset + FIELD_TYPE_INX)?;
        let count = conv.to_u32(bytes, offset + COUNT_INX)?;
        let value_field = slice_at(bytes, offset + VALUE_OFFSET_INX, ifd::VALUE_FIELD_LEN)?;

        let field_type = FieldType::from_repr(raw_type).ok_or(TiffError::UnsupportedType(raw_type))?;
        let base_len = field_type.base_len();
        let total_len = (count as usize)
            .checked_mul(base_len)
            .ok_or_else(|| TiffError::out_of_range(offset, usize::MAX, bytes.len()))?;

        let mut data = if total_len <= ifd::VALUE_FIELD_LEN {
            value_field[..total_len].to_vec()
        } else {
            let value_offset = conv.to_u32(value_field, 0)? as usize;
            slice_at(bytes, value_offset, total_len)?.to_vec()
        };

        // Each element is reordered on its own; reversing the whole payload
        // would also reverse the order of the elements.
        let foreign = !order.is_native() && base_len > 1;
        if foreign {
            data.chunks_exact_mut(base_len).for_each(<[u8]>::reverse);
        }

        trace!("entry tag={tag} type={field_type:?} count={count} at {offset}");
        let entry = Self::new(tag, field_type, count, data);
        Ok(if foreign {
            entry.with_swapped_terms()
        } else {
            entry
        })
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

    use super::*;
    use crate::ifd::Entry;

    /// Order that differs from the platform's
    fn foreign() -> ByteOrder {
        match ByteOrder::native() {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        }
    }

    fn record_be(tag: u16, field_type: u16, count: u32, value: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u16::<BigEndian>(tag).unwrap();
        bytes.write_u16::<BigEndian>(field_type).unwrap();
        bytes.write_u32::<BigEndian>(count).unwrap();
        bytes.extend(value);
        bytes
    }

    #[test]
    fn shorts_are_reversed_per_element() {
        // Three SHORTs 0x0102, 0x0304, 0x0506 stored big endian at offset 12
        let mut bytes = record_be(258, 3, 3, [0, 0, 0, 12]);
        bytes.extend([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        let entry = Entry::read(&bytes, 0, ByteOrder::BigEndian).unwrap();
        assert_eq!(entry.tag(), 258);
        assert_eq!(entry.field_type(), FieldType::Short);
        assert_eq!(entry.count(), 3);
        assert_eq!(entry.as_usizes(), Some(vec![0x0102, 0x0304, 0x0506]));

        if ByteOrder::BigEndian != foreign() {
            return;
        }
        // Per element: 02 01 04 03 06 05. Whole buffer would give 06 05 04 03 02 01.
        assert_eq!(entry.data(), [0x02, 0x01, 0x04, 0x03, 0x06, 0x05]);
        assert_ne!(entry.data(), [0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn foreign_rationals_are_flagged() {
        // 72/1 as one RATIONAL at offset 12
        let mut bytes = record_be(282, 5, 1, [0, 0, 0, 12]);
        bytes.extend([0, 0, 0, 72, 0, 0, 0, 1]);

        let entry = Entry::read(&bytes, 0, ByteOrder::BigEndian).unwrap();
        assert_eq!(entry.terms_swapped(), ByteOrder::BigEndian == foreign());
        assert_eq!(
            &*entry.file_data(),
            Entry::rationals(282, &[crate::URational::new(72, 1)]).data()
        );
    }

    #[test]
    fn native_order_is_left_untouched() {
        let mut bytes = Vec::new();
        let order = ByteOrder::native();
        let conv = EndianConverter::native();
        bytes.extend(conv.bytes(258_u16));
        bytes.extend(conv.bytes(3_u16));
        bytes.extend(conv.bytes(3_u32));
        bytes.extend(conv.bytes(12_u32));
        let payload = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        bytes.extend(payload);

        let entry = Entry::read(&bytes, 0, order).unwrap();
        assert_eq!(entry.data(), payload);
    }

    #[test]
    fn four_bytes_or_less_are_inline() {
        // Two SHORTs fill the value field exactly; 0xFFFF would be an
        // out of range offset if it were followed.
        let bytes = record_be(256, 3, 2, [0xFF, 0xFF, 0x00, 0x07]);
        let entry = Entry::read(&bytes, 0, ByteOrder::BigEndian).unwrap();
        assert_eq!(entry.as_usizes(), Some(vec![0xFFFF, 7]));

        // A single BYTE keeps only its own byte.
        let bytes = record_be(256, 1, 1, [9, 8, 7, 6]);
        let entry = Entry::read(&bytes, 0, ByteOrder::BigEndian).unwrap();
        assert_eq!(entry.data(), [9]);
    }

    #[test]
    fn more_than_four_bytes_are_dereferenced() {
        let mut bytes = Vec::new();
        bytes.write_u16::<LittleEndian>(271).unwrap();
        bytes.write_u16::<LittleEndian>(2).unwrap();
        bytes.write_u32::<LittleEndian>(5).unwrap();
        bytes.write_u32::<LittleEndian>(16).unwrap();
        bytes.extend([0xAA; 4]);
        bytes.extend(b"abcd\0");

        let entry = Entry::read(&bytes, 0, ByteOrder::LittleEndian).unwrap();
        assert_eq!(entry.data(), b"abcd\0");
    }

    #[test]
    fn dangling_offset_is_out_of_range() {
        let bytes = record_be(273, 4, 2, [0, 0, 1, 0]);
        assert!(matches!(
            Entry::read(&bytes, 0, ByteOrder::BigEndian),
            Err(TiffError::OutOfRange { offset: 256, len: 8, .. })
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let bytes = record_be(256, 99, 1, [0; 4]);
        assert!(matches!(
            Entry::read(&bytes, 0, ByteOrder::BigEndian),
            Err(TiffError::UnsupportedType(99))
        ));
    }

    #[test]
    fn truncated_record_is_out_of_range() {
        let bytes = record_be(256, 3, 1, [0; 4]);
        assert!(matches!(
            Entry::read(&bytes[..10], 0, ByteOrder::BigEndian),
            Err(TiffError::OutOfRange { .. })
        ));
    }
}
