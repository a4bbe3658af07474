use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

/// The chroma and bit depth fields of a High-family SPS.
///
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpsExtended {
    /// `chroma_format_idc`, 0 (monochrome) to 3 (4:4:4).
    pub chroma_format_idc: u32,
    /// `separate_colour_plane_flag`, only present for 4:4:4.
    pub separate_color_plane_flag: bool,
    /// `bit_depth_luma_minus8`
    pub bit_depth_luma_minus8: u32,
    /// `bit_depth_chroma_minus8`
    pub bit_depth_chroma_minus8: u32,
    /// `qpprime_y_zero_transform_bypass_flag`
    pub qpprime_y_zero_transform_bypass_flag: bool,
    /// `seq_scaling_matrix_present_flag`. The lists themselves are skipped.
    pub seq_scaling_matrix_present_flag: bool,
}

impl Default for SpsExtended {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SpsExtended {
    // inferred values when the fields are absent, 7.4.2.1.1
    const DEFAULT: SpsExtended = SpsExtended {
        chroma_format_idc: 1,
        separate_color_plane_flag: false,
        bit_depth_luma_minus8: 0,
        bit_depth_chroma_minus8: 0,
        qpprime_y_zero_transform_bypass_flag: false,
        seq_scaling_matrix_present_flag: false,
    };

    /// Parses the extension fields from a bitstream.
    pub fn parse<B: AsRef<[u8]>>(reader: &mut BitReader<B>) -> io::Result<Self> {
        let chroma_format_idc = reader.read_exp_golomb()?;
        let mut separate_color_plane_flag = false;
        if chroma_format_idc == 3 {
            separate_color_plane_flag = reader.read_bit()?;
        }

        let bit_depth_luma_minus8 = reader.read_exp_golomb()?;
        let bit_depth_chroma_minus8 = reader.read_exp_golomb()?;
        let qpprime_y_zero_transform_bypass_flag = reader.read_bit()?;
        let seq_scaling_matrix_present_flag = reader.read_bit()?;

        if seq_scaling_matrix_present_flag {
            let count = if chroma_format_idc != 3 { 8 } else { 12 };
            for i in 0..count {
                if reader.read_bit()? {
                    skip_scaling_list(reader, if i < 6 { 16 } else { 64 })?;
                }
            }
        }

        Ok(Self {
            chroma_format_idc,
            separate_color_plane_flag,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
            qpprime_y_zero_transform_bypass_flag,
            seq_scaling_matrix_present_flag,
        })
    }

    /// Luma bit depth.
    pub const fn bit_depth_luma(&self) -> u32 {
        self.bit_depth_luma_minus8.saturating_add(8)
    }

    /// Chroma bit depth.
    pub const fn bit_depth_chroma(&self) -> u32 {
        self.bit_depth_chroma_minus8.saturating_add(8)
    }
}

/// Reads past one `scaling_list()`, 7.3.2.1.1.1.
fn skip_scaling_list<B: AsRef<[u8]>>(reader: &mut BitReader<B>, size: usize) -> io::Result<()> {
    let mut last_scale = 8i64;
    let mut next_scale = 8i64;

    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = reader.read_signed_exp_golomb()? as i64;
            next_scale = (last_scale + delta_scale + 256).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;

    #[test]
    fn test_parse_without_scaling_matrix() {
        let mut writer = BitWriter::new();
        writer.write_exp_golomb(1); // chroma_format_idc
        writer.write_exp_golomb(2); // bit_depth_luma_minus8
        writer.write_exp_golomb(2); // bit_depth_chroma_minus8
        writer.write_bit(false);
        writer.write_bit(false);
        writer.write_bits(0b1, 1); // trailing marker

        let mut reader = BitReader::new(writer.finish());
        let ext = SpsExtended::parse(&mut reader).unwrap();

        assert_eq!(ext.chroma_format_idc, 1);
        assert_eq!(ext.bit_depth_luma(), 10);
        assert_eq!(ext.bit_depth_chroma(), 10);
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn test_parse_skips_scaling_lists() {
        let mut writer = BitWriter::new();
        writer.write_exp_golomb(3); // chroma_format_idc
        writer.write_bit(true); // separate_colour_plane_flag
        writer.write_exp_golomb(0);
        writer.write_exp_golomb(0);
        writer.write_bit(false);
        writer.write_bit(true); // seq_scaling_matrix_present_flag

        // 12 lists, only the first and the seventh are present
        for i in 0..12 {
            let present = i == 0 || i == 6;
            writer.write_bit(present);
            if i == 0 {
                // delta -8 makes next_scale 0 and ends the list early
                writer.write_signed_exp_golomb(-8);
            } else if i == 6 {
                for _ in 0..64 {
                    writer.write_signed_exp_golomb(1);
                }
            }
        }
        writer.write_bits(0b101, 3);

        let mut reader = BitReader::new(writer.finish());
        let ext = SpsExtended::parse(&mut reader).unwrap();

        assert!(ext.separate_color_plane_flag);
        assert!(ext.seq_scaling_matrix_present_flag);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    }

    #[test]
    fn test_default() {
        let ext = SpsExtended::default();
        assert_eq!(ext.chroma_format_idc, 1);
        assert_eq!(ext.bit_depth_luma(), 8);
    }
}
