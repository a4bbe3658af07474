/// Packs bits, most significant first, into a growable byte buffer.
///
/// Mostly useful for building bitstream fixtures such as parameter sets.
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct BitWriter {
    bytes: Vec<u8>,
    pending: u8,
    pending_bits: u8,
}

impl BitWriter {
    /// Creates an empty writer.
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            pending: 0,
            pending_bits: 0,
        }
    }

    /// Appends one bit.
    pub fn write_bit(&mut self, bit: bool) {
        self.pending = (self.pending << 1) | bit as u8;
        self.pending_bits += 1;
        if self.pending_bits == 8 {
            self.bytes.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    /// Appends the low `count` bits of `value` (at most 64).
    pub fn write_bits(&mut self, value: u64, count: u8) {
        for shift in (0..count.min(64)).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Whether the next bit starts a fresh byte.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.pending_bits == 0
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align(&mut self) {
        while !self.is_aligned() {
            self.write_bit(false);
        }
    }

    /// Pads to a byte boundary and hands back the bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::BitReader;

    #[test]
    fn test_write_then_read_back() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b011, 3);
        writer.write_bits(0xABCD, 16);

        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b1011_1010, 0b1011_1100, 0b1101_0000]);

        let mut reader = BitReader::new(bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
        assert_eq!(reader.read_bits(16).unwrap(), 0xABCD);
    }

    #[test]
    fn test_align() {
        let mut writer = BitWriter::default();
        assert!(writer.is_aligned());
        writer.write_bit(true);
        assert!(!writer.is_aligned());
        writer.align();
        assert!(writer.is_aligned());
        assert_eq!(writer.finish(), vec![0x80]);
    }
}
