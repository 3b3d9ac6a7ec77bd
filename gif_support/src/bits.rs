use crate::common::{ByteSink, GIFWriterError};

/// Packs variable-width codes into bytes, least significant bit first, and forwards every
/// completed byte to the sink.
pub struct BitPacker<S: ByteSink> {
    sink: S,
    buffer: u32, // holds at most 7 leftover bits plus one 16-bit insertion
    bits_in_buffer: u8,
}

impl<S: ByteSink> BitPacker<S> {

    pub fn new(sink: S) -> Self {
        BitPacker {
            sink,
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Appends the `width` least significant bits of `value`.
    pub fn insert(&mut self, width: u8, value: u16) -> Result<(), GIFWriterError> {
        assert!(width >= 1 && width <= 16, "bit width must be in 1..=16, got {}", width);

        let value = (value as u32) & ((1u32 << width) - 1);
        self.buffer |= value << self.bits_in_buffer;
        self.bits_in_buffer += width;

        while self.bits_in_buffer >= 8 {
            self.sink.push((self.buffer & 0xFF) as u8)?;
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }

        Ok(())
    }

    /// Writes out a final partial byte (zero padded in the high bits) if any bits remain,
    /// then flushes the sink.
    pub fn finish(mut self) -> Result<S, GIFWriterError> {
        if self.bits_in_buffer > 0 {
            self.sink.push((self.buffer & 0xFF) as u8)?;
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }

        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{bit_vec_for_source_bytes, read_bits};

    use super::*;

    #[test]
    fn test_lsb_first_packing() {
        let mut packer = BitPacker::new(Vec::<u8>::new());
        packer.insert(3, 0b101).expect("failed to insert");
        packer.insert(3, 0b011).expect("failed to insert");
        packer.insert(4, 0b1111).expect("failed to insert");

        let bytes = packer.finish().expect("failed to finish");
        assert_eq!(bytes, vec![0b1101_1101, 0b0000_0011]);
    }

    #[test]
    fn test_high_bits_are_masked() {
        let mut packer = BitPacker::new(Vec::<u8>::new());
        packer.insert(4, 0xFFF3).expect("failed to insert");
        packer.insert(4, 0x0000).expect("failed to insert");

        let bytes = packer.finish().expect("failed to finish");
        assert_eq!(bytes, vec![0x03]);
    }

    #[test]
    fn test_finish_without_data() {
        let packer = BitPacker::new(Vec::<u8>::new());
        let bytes = packer.finish().expect("failed to finish");
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_all_widths_round_trip() {
        let mut expected = Vec::new();
        let mut packer = BitPacker::new(Vec::<u8>::new());

        let mut value: u32 = 0x9E37;
        for _ in 0..4 {
            for width in 1..=16u8 {
                value = value.wrapping_mul(1103515245).wrapping_add(12345);
                let code = (value >> 8) as u16;

                packer.insert(width, code).expect("failed to insert");
                expected.push((width, code & (((1u32 << width) - 1) as u16)));
            }
        }

        let bytes = packer.finish().expect("failed to finish");
        let total_bits: usize = expected.iter().map(|(width, _)| *width as usize).sum();
        assert_eq!(bytes.len(), (total_bits + 7) / 8);

        let bits = bit_vec_for_source_bytes(&bytes);
        let mut offset = 0;
        for (width, code) in expected {
            assert_eq!(read_bits(&bits, offset, width), code, "mismatch for width {} at offset {}", width, offset);
            offset += width as usize;
        }

        for i in offset..bits.len() {
            assert!(!bits[i], "padding bit {} should be zero", i);
        }
    }

    #[test]
    fn test_two_full_width_insertions() {
        let mut packer = BitPacker::new(Vec::<u8>::new());
        packer.insert(7, 0x7F).expect("failed to insert");
        packer.insert(16, 0xABCD).expect("failed to insert");
        packer.insert(16, 0x1234).expect("failed to insert");

        let bytes = packer.finish().expect("failed to finish");
        let bits = bit_vec_for_source_bytes(&bytes);

        assert_eq!(read_bits(&bits, 0, 7), 0x7F);
        assert_eq!(read_bits(&bits, 7, 16), 0xABCD);
        assert_eq!(read_bits(&bits, 23, 16), 0x1234);
    }

    #[test]
    #[should_panic]
    fn test_zero_width_is_rejected() {
        let mut packer = BitPacker::new(Vec::<u8>::new());
        let _ = packer.insert(0, 1);
    }
}
