use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

/// `FrameCropInfo` contains the frame cropping offsets, read when
/// `frame_cropping_flag == 1`.
///
/// The offsets are in crop units, which depend on the chroma format and on
/// `frame_mbs_only_flag`. See [`FrameCropInfo::crop_units`].
///
/// ISO/IEC-14496-10-2022 - 7.4.2.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCropInfo {
    /// `frame_crop_left_offset`
    pub frame_crop_left_offset: u32,
    /// `frame_crop_right_offset`
    pub frame_crop_right_offset: u32,
    /// `frame_crop_top_offset`
    pub frame_crop_top_offset: u32,
    /// `frame_crop_bottom_offset`
    pub frame_crop_bottom_offset: u32,
}

impl FrameCropInfo {
    /// Parses the four offsets from a bitstream.
    pub fn parse<B: AsRef<[u8]>>(reader: &mut BitReader<B>) -> io::Result<Self> {
        let frame_crop_left_offset = reader.read_exp_golomb()?;
        let frame_crop_right_offset = reader.read_exp_golomb()?;
        let frame_crop_top_offset = reader.read_exp_golomb()?;
        let frame_crop_bottom_offset = reader.read_exp_golomb()?;

        Ok(Self {
            frame_crop_left_offset,
            frame_crop_right_offset,
            frame_crop_top_offset,
            frame_crop_bottom_offset,
        })
    }

    /// `(CropUnitX, CropUnitY)` for the given chroma format.
    pub const fn crop_units(chroma_format_idc: u32, frame_mbs_only_flag: bool) -> (u64, u64) {
        let field_factor = 2 - frame_mbs_only_flag as u64;

        match chroma_format_idc {
            0 => (1, field_factor),
            idc => {
                let sub_width = if idc == 3 { 1 } else { 2 };
                let sub_height = if idc == 1 { 2 } else { 1 };
                (sub_width, sub_height * field_factor)
            }
        }
    }

    /// Luma samples removed horizontally.
    pub fn horizontal(&self, unit_x: u64) -> u64 {
        (self.frame_crop_left_offset as u64 + self.frame_crop_right_offset as u64) * unit_x
    }

    /// Luma samples removed vertically.
    pub fn vertical(&self, unit_y: u64) -> u64 {
        (self.frame_crop_top_offset as u64 + self.frame_crop_bottom_offset as u64) * unit_y
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;

    #[test]
    fn test_parse_frame_crop_info() {
        let mut writer = BitWriter::new();
        writer.write_exp_golomb(1);
        writer.write_exp_golomb(2);
        writer.write_exp_golomb(3);
        writer.write_exp_golomb(4);

        let crop = FrameCropInfo::parse(&mut BitReader::new(writer.finish())).unwrap();
        assert_eq!(
            crop,
            FrameCropInfo {
                frame_crop_left_offset: 1,
                frame_crop_right_offset: 2,
                frame_crop_top_offset: 3,
                frame_crop_bottom_offset: 4,
            }
        );
        assert_eq!(crop.horizontal(2), 6);
        assert_eq!(crop.vertical(2), 14);
    }

    #[test]
    fn test_crop_units() {
        assert_eq!(FrameCropInfo::crop_units(0, true), (1, 1));
        assert_eq!(FrameCropInfo::crop_units(0, false), (1, 2));
        assert_eq!(FrameCropInfo::crop_units(1, true), (2, 2));
        assert_eq!(FrameCropInfo::crop_units(1, false), (2, 4));
        assert_eq!(FrameCropInfo::crop_units(2, true), (2, 1));
        assert_eq!(FrameCropInfo::crop_units(3, true), (1, 1));
    }
}
