use std::io;

use bytes_util::BitReader;

// Table E-1, indexed by aspect_ratio_idc - 1
const SAR_WIDTH: [u16; 16] = [1, 12, 10, 16, 40, 24, 20, 32, 80, 18, 15, 64, 160, 4, 3, 2];
const SAR_HEIGHT: [u16; 16] = [1, 11, 11, 11, 33, 11, 11, 11, 33, 11, 11, 33, 99, 3, 2, 1];

const EXTENDED_SAR: u8 = 255;

/// The sample aspect ratio of the luma samples.
///
/// ISO/IEC-14496-10-2022 - E.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarDimensions {
    /// The raw `aspect_ratio_idc`.
    pub aspect_ratio_idc: u8,
    /// Horizontal part of the ratio.
    pub sar_width: u16,
    /// Vertical part of the ratio.
    pub sar_height: u16,
}

impl Default for SarDimensions {
    fn default() -> Self {
        Self {
            aspect_ratio_idc: 0,
            sar_width: 1,
            sar_height: 1,
        }
    }
}

impl SarDimensions {
    /// Parses `aspect_ratio_idc` and, for the extended form, the explicit
    /// `sar_width` / `sar_height` pair.
    ///
    /// Unspecified and reserved indices leave the ratio at 1:1.
    pub fn parse<B: AsRef<[u8]>>(reader: &mut BitReader<B>) -> io::Result<Self> {
        let aspect_ratio_idc = reader.read_u8()?;

        let (sar_width, sar_height) = match aspect_ratio_idc {
            1..=16 => {
                let index = aspect_ratio_idc as usize - 1;
                (SAR_WIDTH[index], SAR_HEIGHT[index])
            }
            EXTENDED_SAR => (reader.read_bits(16)? as u16, reader.read_bits(16)? as u16),
            _ => (1, 1),
        };

        Ok(Self {
            aspect_ratio_idc,
            sar_width,
            sar_height,
        })
    }

    /// Whether both parts are non-zero.
    pub const fn is_specified(&self) -> bool {
        self.sar_width != 0 && self.sar_height != 0
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;

    use super::*;

    fn parse(bytes: &[u8]) -> SarDimensions {
        SarDimensions::parse(&mut BitReader::new(bytes)).unwrap()
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(parse(&[1]), SarDimensions { aspect_ratio_idc: 1, sar_width: 1, sar_height: 1 });
        assert_eq!(parse(&[4]), SarDimensions { aspect_ratio_idc: 4, sar_width: 16, sar_height: 11 });
        assert_eq!(parse(&[14]), SarDimensions { aspect_ratio_idc: 14, sar_width: 4, sar_height: 3 });
        assert_eq!(parse(&[16]), SarDimensions { aspect_ratio_idc: 16, sar_width: 2, sar_height: 1 });
    }

    #[test]
    fn test_reserved_is_square() {
        assert_eq!(parse(&[0]).sar_width, 1);
        assert_eq!(parse(&[100]).sar_height, 1);
    }

    #[test]
    fn test_extended() {
        let mut writer = BitWriter::new();
        writer.write_bits(255, 8);
        writer.write_bits(64, 16);
        writer.write_bits(45, 16);

        let sar = parse(&writer.finish());
        assert_eq!((sar.sar_width, sar.sar_height), (64, 45));
        assert!(sar.is_specified());
    }

    #[test]
    fn test_extended_truncated() {
        let result = SarDimensions::parse(&mut BitReader::new([255u8, 0x00]));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
